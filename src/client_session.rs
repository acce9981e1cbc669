//! Authenticated client sessions owned by a user session.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::cloner::ClientSessionView;
use crate::metadata::{ClientSessionMetadata, CURRENT_SCHEMA_VERSION_CLIENT_SESSION};
use crate::note::NoteSet;

/// Per-client authentication sub-session.
///
/// Instances are owned by exactly one [`UserSessionEntity`](crate::UserSessionEntity)
/// and are created by deep copy when attached. Equality is by identifier.
#[derive(Clone, Debug)]
pub struct ClientSessionEntity {
    id: Option<Uuid>,
    root: Option<Uuid>,
    metadata: ClientSessionMetadata,
    notes: NoteSet,
}

impl ClientSessionEntity {
    pub(crate) fn from_parts(id: Option<Uuid>, metadata: ClientSessionMetadata) -> Self {
        Self {
            id,
            root: None,
            metadata,
            notes: NoteSet::default(),
        }
    }

    pub(crate) fn from_stored(
        id: Uuid,
        root: Uuid,
        metadata: ClientSessionMetadata,
        notes: NoteSet,
    ) -> Self {
        Self {
            id: Some(id),
            root: Some(root),
            metadata,
            notes,
        }
    }

    /// Identifier in lowercase hyphenated form, `None` until the store
    /// assigns one.
    pub fn id(&self) -> Option<String> {
        self.id.map(|id| id.to_string())
    }

    pub(crate) fn uuid(&self) -> Option<Uuid> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: Uuid) {
        self.id = Some(id);
        self.notes.reparent(Some(id));
    }

    /// Identifier of the owning user session.
    pub fn root(&self) -> Option<Uuid> {
        self.root
    }

    pub(crate) fn set_parent(&mut self, root: Option<Uuid>) {
        self.root = root;
    }

    /// The JSON payload.
    pub fn metadata(&self) -> &ClientSessionMetadata {
        &self.metadata
    }

    /// Payload shape understood by this build.
    pub fn current_schema_version() -> i32 {
        CURRENT_SCHEMA_VERSION_CLIENT_SESSION
    }

    /// Payload shape this record was written with.
    pub fn entity_version(&self) -> Option<i32> {
        self.metadata.entity_version
    }

    pub fn set_entity_version(&mut self, entity_version: Option<i32>) {
        self.metadata.entity_version = entity_version;
    }

    pub fn realm_id(&self) -> Option<&str> {
        self.metadata.realm_id.as_deref()
    }

    pub fn set_realm_id(&mut self, realm_id: Option<String>) {
        self.metadata.realm_id = realm_id;
    }

    /// Client this session belongs to. Also mirrored into a generated
    /// column.
    pub fn client_id(&self) -> Option<&str> {
        self.metadata.client_id.as_deref()
    }

    pub fn set_client_id(&mut self, client_id: Option<String>) {
        self.metadata.client_id = client_id;
    }

    pub fn auth_method(&self) -> Option<&str> {
        self.metadata.auth_method.as_deref()
    }

    pub fn set_auth_method(&mut self, auth_method: Option<String>) {
        self.metadata.auth_method = auth_method;
    }

    pub fn redirect_uri(&self) -> Option<&str> {
        self.metadata.redirect_uri.as_deref()
    }

    pub fn set_redirect_uri(&mut self, redirect_uri: Option<String>) {
        self.metadata.redirect_uri = redirect_uri;
    }

    /// Pending protocol action.
    pub fn action(&self) -> Option<&str> {
        self.metadata.action.as_deref()
    }

    pub fn set_action(&mut self, action: Option<String>) {
        self.metadata.action = action;
    }

    /// Epoch milliseconds.
    pub fn timestamp(&self) -> Option<i64> {
        self.metadata.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: Option<i64>) {
        self.metadata.timestamp = timestamp;
    }

    /// Epoch milliseconds.
    pub fn expiration(&self) -> Option<i64> {
        self.metadata.expiration
    }

    pub fn set_expiration(&mut self, expiration: Option<i64>) {
        self.metadata.expiration = expiration;
    }

    pub fn is_offline(&self) -> Option<bool> {
        self.metadata.offline
    }

    pub fn set_offline(&mut self, offline: Option<bool>) {
        self.metadata.offline = offline;
    }

    pub fn current_refresh_token(&self) -> Option<&str> {
        self.metadata.current_refresh_token.as_deref()
    }

    pub fn set_current_refresh_token(&mut self, token: Option<String>) {
        self.metadata.current_refresh_token = token;
    }

    /// Redemptions of [`current_refresh_token`](Self::current_refresh_token).
    pub fn current_refresh_token_use_count(&self) -> Option<i32> {
        self.metadata.current_refresh_token_use_count
    }

    pub fn set_current_refresh_token_use_count(&mut self, count: Option<i32>) {
        self.metadata.current_refresh_token_use_count = count;
    }

    /// Detached copy of the notes; changing it does not change the record.
    pub fn notes(&self) -> BTreeMap<String, String> {
        self.notes.snapshot()
    }

    pub(crate) fn note_set(&self) -> &NoteSet {
        &self.notes
    }

    /// Value of a single note.
    pub fn note(&self, name: &str) -> Option<&str> {
        self.notes.get(name)
    }

    /// Replaces all notes. Entries with a blank name or value are skipped.
    pub fn set_notes<I, K, V>(&mut self, notes: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.notes.replace_all(self.id, notes);
    }

    /// Sets a note. A `None` or blank value removes it.
    pub fn set_note(&mut self, name: &str, value: Option<&str>) {
        self.notes.set(self.id, name, value);
    }

    /// Removes a note. Returns whether it existed.
    pub fn remove_note(&mut self, name: &str) -> bool {
        self.notes.remove(name)
    }
}

impl PartialEq for ClientSessionEntity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ClientSessionEntity {}

impl ClientSessionView for ClientSessionEntity {
    fn client_session_id(&self) -> Option<Uuid> {
        self.id
    }

    fn client_session_metadata(&self) -> ClientSessionMetadata {
        self.metadata.clone()
    }

    fn client_session_notes(&self) -> BTreeMap<String, String> {
        self.notes.snapshot()
    }

    fn client_session_root(&self) -> Option<Uuid> {
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_attributes() {
        let id = Uuid::new_v4();
        let mut a = ClientSessionEntity::from_parts(Some(id), ClientSessionMetadata::default());
        let b = ClientSessionEntity::from_parts(Some(id), ClientSessionMetadata::default());
        a.set_action(Some("LOGOUT".into()));
        assert_eq!(a, b);

        let c = ClientSessionEntity::from_parts(Some(Uuid::new_v4()), a.metadata().clone());
        assert_ne!(a, c);
    }

    #[test]
    fn notes_follow_identifier() {
        let mut cs = ClientSessionEntity::from_parts(None, ClientSessionMetadata::default());
        cs.set_note("k", Some("v"));
        let id = Uuid::new_v4();
        cs.assign_id(id);
        assert!(cs.note_set().iter().all(|n| n.root() == Some(id)));
    }
}
