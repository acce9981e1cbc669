//! Deep copies between in-memory session representations and the persisted
//! record model.
//!
//! Anything implementing [`UserSessionView`] or [`ClientSessionView`] can be
//! turned into a native record. The copy never shares state with its source.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::client_session::ClientSessionEntity;
use crate::error::Result;
use crate::id;
use crate::metadata::{ClientSessionMetadata, UserSessionMetadata};
use crate::user_session::UserSessionEntity;

/// Read access to an authenticated client session, whatever its backing.
pub trait ClientSessionView {
    fn client_session_id(&self) -> Option<Uuid>;
    fn client_session_metadata(&self) -> ClientSessionMetadata;
    fn client_session_notes(&self) -> BTreeMap<String, String>;

    /// User session the source is attached to, if it is persisted under one.
    fn client_session_root(&self) -> Option<Uuid> {
        None
    }
}

/// Read access to a user session, whatever its backing.
pub trait UserSessionView {
    fn user_session_id(&self) -> Option<Uuid>;
    fn user_session_metadata(&self) -> UserSessionMetadata;
    fn user_session_notes(&self) -> BTreeMap<String, String>;
    fn user_session_client_sessions(&self) -> Vec<&dyn ClientSessionView>;
}

/// A client session that only exists in memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransientClientSession {
    pub id: Option<Uuid>,
    pub metadata: ClientSessionMetadata,
    pub notes: BTreeMap<String, String>,
}

impl TransientClientSession {
    /// Creates a client session for `client_id` without an identifier.
    pub fn for_client(client_id: impl Into<String>) -> Self {
        Self {
            metadata: ClientSessionMetadata {
                client_id: Some(client_id.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Assigns an identifier, normalizing it first.
    pub fn with_id(mut self, id: &str) -> Result<Self> {
        self.id = Some(id::parse(id)?);
        Ok(self)
    }
}

impl ClientSessionView for TransientClientSession {
    fn client_session_id(&self) -> Option<Uuid> {
        self.id
    }

    fn client_session_metadata(&self) -> ClientSessionMetadata {
        self.metadata.clone()
    }

    fn client_session_notes(&self) -> BTreeMap<String, String> {
        self.notes.clone()
    }
}

/// A user session that only exists in memory, before promotion to storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransientUserSession {
    pub id: Option<Uuid>,
    pub metadata: UserSessionMetadata,
    pub notes: BTreeMap<String, String>,
    pub client_sessions: Vec<TransientClientSession>,
}

impl TransientUserSession {
    /// Assigns an identifier, normalizing it first.
    pub fn with_id(mut self, id: &str) -> Result<Self> {
        self.id = Some(id::parse(id)?);
        Ok(self)
    }
}

impl UserSessionView for TransientUserSession {
    fn user_session_id(&self) -> Option<Uuid> {
        self.id
    }

    fn user_session_metadata(&self) -> UserSessionMetadata {
        self.metadata.clone()
    }

    fn user_session_notes(&self) -> BTreeMap<String, String> {
        self.notes.clone()
    }

    fn user_session_client_sessions(&self) -> Vec<&dyn ClientSessionView> {
        self.client_sessions
            .iter()
            .map(|cs| cs as &dyn ClientSessionView)
            .collect()
    }
}

/// Copies any client session into a detached [`ClientSessionEntity`].
///
/// The result has no parent; attaching it is up to
/// [`UserSessionEntity::add_authenticated_client_session`].
pub fn client_session_from(source: &dyn ClientSessionView) -> ClientSessionEntity {
    let mut entity =
        ClientSessionEntity::from_parts(source.client_session_id(), source.client_session_metadata());
    entity.set_notes(source.client_session_notes());
    entity
}

/// Copies any user session, including its notes and client sessions, into a
/// new [`UserSessionEntity`].
pub fn user_session_from(source: &dyn UserSessionView) -> UserSessionEntity {
    let mut entity =
        UserSessionEntity::from_parts(source.user_session_id(), source.user_session_metadata());
    entity.set_notes(source.user_session_notes());
    for client_session in source.user_session_client_sessions() {
        entity.add_authenticated_client_session(client_session);
    }
    entity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_session_copy_is_detached() {
        let mut source = TransientUserSession {
            id: Some(Uuid::new_v4()),
            metadata: UserSessionMetadata {
                realm_id: Some("realm".into()),
                entity_version: Some(1),
                ..Default::default()
            },
            ..Default::default()
        };
        source.notes.insert("k".into(), "v".into());
        source
            .client_sessions
            .push(TransientClientSession::for_client("app"));

        let copy = user_session_from(&source);
        source.notes.insert("k".into(), "changed".into());
        source.client_sessions[0].metadata.action = Some("LOGOUT".into());

        assert_eq!(copy.id(), source.id.map(|id| id.to_string()));
        assert_eq!(copy.realm_id(), Some("realm"));
        assert_eq!(copy.note("k"), Some("v"));
        let cs = copy.authenticated_client_session("app").unwrap();
        assert_eq!(cs.action(), None);
        assert_eq!(cs.root(), source.id);
    }

    #[test]
    fn with_id_normalizes() {
        let cs = TransientClientSession::for_client("app")
            .with_id("6F1C2A4E8B0D4F3A9C5E1D2B3A4C5D6E")
            .unwrap();
        assert_eq!(
            cs.id.map(|id| id.to_string()).as_deref(),
            Some("6f1c2a4e-8b0d-4f3a-9c5e-1d2b3a4c5d6e")
        );
        assert!(TransientUserSession::default().with_id("nope").is_err());
    }
}
