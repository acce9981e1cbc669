//! Metadata payloads stored in the JSON `metadata` columns.
//!
//! Every attribute that may change shape between releases lives here rather
//! than in its own column. The database derives the indexable columns from
//! these payloads, so the serialized key names are part of the storage
//! contract and must match the generated column expressions in the migration.

use serde::{Deserialize, Serialize};

/// Payload shape understood by this build for user sessions.
pub const CURRENT_SCHEMA_VERSION_USER_SESSION: i32 = 1;

/// Payload shape understood by this build for client sessions.
pub const CURRENT_SCHEMA_VERSION_CLIENT_SESSION: i32 = 1;

/// Lifecycle state of a user session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    LoggedIn,
    /// Logout has started and clients are being notified.
    LoggingOut,
    LoggedOut,
    /// Logged out, but at least one client did not confirm its logout.
    LoggedOutUnconfirmed,
}

/// Whether a session lives in storage or only in memory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersistenceState {
    /// Stored in the database. Every record of this crate is persistent.
    #[default]
    Persistent,
    /// Held in memory only, e.g. before promotion.
    Transient,
}

/// Metadata payload of a user session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSessionMetadata {
    /// Shape version of this payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_version: Option<i32>,
    /// Realm the session belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_id: Option<String>,
    /// Authenticated user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Username as typed at login, before any lookup normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_username: Option<String>,
    /// Client address the session was started from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Protocol used to authenticate, e.g. `openid-connect`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_method: Option<String>,
    /// Offline sessions back long-lived refresh tokens and are stored
    /// separately from online ones by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline: Option<bool>,
    /// Set when the user asked to stay signed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remember_me: Option<bool>,
    /// Creation time in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Last refresh time in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_session_refresh: Option<i64>,
    /// Expiration time in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<i64>,
    /// Session id at the upstream identity provider, for brokered logins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broker_session_id: Option<String>,
    /// User id at the upstream identity provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broker_user_id: Option<String>,
    /// Lifecycle state, `None` until login completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<SessionState>,
}

/// Metadata payload of an authenticated client session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSessionMetadata {
    /// Shape version of this payload, stamped from the owning user session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_version: Option<i32>,
    /// Realm of the client, same as the owner's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_id: Option<String>,
    /// Client this session was authenticated for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Protocol the client authenticated with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_method: Option<String>,
    /// Where the client asked to be sent after login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    /// Pending protocol action, such as a logout in progress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Authentication time in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Expiration time in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<i64>,
    /// Whether this client holds an offline token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline: Option<bool>,
    /// Refresh token currently issued to the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_refresh_token: Option<String>,
    /// How often the current refresh token was redeemed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_refresh_token_use_count: Option<i32>,
}

/// Read-only mirrors of payload fields, as computed by the database.
///
/// These are only populated when a record is loaded without its payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DerivedColumns {
    /// `metadata.entityVersion`
    pub entity_version: Option<i32>,
    /// `metadata.realmId`
    pub realm_id: Option<String>,
    /// `metadata.userId`
    pub user_id: Option<String>,
    /// `metadata.brokerSessionId`
    pub broker_session_id: Option<String>,
    /// `metadata.brokerUserId`
    pub broker_user_id: Option<String>,
    /// `metadata.offline`
    pub offline: Option<bool>,
    /// `metadata.lastSessionRefresh`, epoch milliseconds.
    pub last_session_refresh: Option<i64>,
    /// `metadata.expiration`, epoch milliseconds.
    pub expiration: Option<i64>,
}

impl From<&DerivedColumns> for UserSessionMetadata {
    fn from(derived: &DerivedColumns) -> Self {
        Self {
            entity_version: derived.entity_version,
            realm_id: derived.realm_id.clone(),
            user_id: derived.user_id.clone(),
            broker_session_id: derived.broker_session_id.clone(),
            broker_user_id: derived.broker_user_id.clone(),
            offline: derived.offline,
            last_session_refresh: derived.last_session_refresh,
            expiration: derived.expiration,
            ..Self::default()
        }
    }
}
