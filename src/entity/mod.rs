//! Database entity models for user-session-seaorm-store.
//!
//! This module contains the Sea-ORM entity definitions backing the user
//! session aggregate. The tables are created by the crate's migrations; the
//! generated columns declared here are computed by the database from the JSON
//! `metadata` column and are never written by the store.
//!
//! The aggregate is a tree:
//!
//! ```text
//! kc_user_session
//! ├── kc_user_session_note
//! └── kc_client_session
//!     └── kc_client_session_note
//! ```

/// Client session rows, one per authenticated client of a user session.
pub mod client_session;

/// Notes attached to a client session.
pub mod client_session_note;

/// Root user session rows.
pub mod user_session;

/// Notes attached to a user session.
pub mod user_session_note;
