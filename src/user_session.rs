//! The persisted user session record.
//!
//! A [`UserSessionEntity`] is the root of an aggregate: it owns its notes and
//! its authenticated client sessions. All evolvable attributes live in a JSON
//! metadata payload; the database mirrors a handful of them into generated
//! columns so they can be indexed. A record loaded for an indexed lookup may
//! carry only those generated columns, which is modelled by [`Payload`].

use std::any::TypeId;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use uuid::Uuid;

use crate::client_session::ClientSessionEntity;
use crate::cloner::{self, ClientSessionView, UserSessionView};
use crate::error::{Error, Result};
use crate::id;
use crate::metadata::{
    DerivedColumns, PersistenceState, SessionState, UserSessionMetadata,
    CURRENT_SCHEMA_VERSION_USER_SESSION,
};
use crate::note::NoteSet;

/// What a record was loaded with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// The metadata payload is materialized and is the source of truth.
    Full(UserSessionMetadata),
    /// Only the generated columns were read.
    Partial(DerivedColumns),
}

/// A user session as stored in `kc_user_session`.
///
/// Getters for attributes that have a generated column read the payload when
/// it is present and fall back to the column otherwise. Setters always write
/// the payload.
///
/// Two records are equal when their identifiers are equal, regardless of
/// their attributes. The hash only depends on the type, so a record stays
/// usable as a set member while it is being mutated.
#[derive(Clone, Debug)]
pub struct UserSessionEntity {
    id: Option<Uuid>,
    version: i32,
    payload: Payload,
    materialized_from_partial: bool,
    notes: NoteSet,
    client_sessions: Vec<ClientSessionEntity>,
}

impl Default for UserSessionEntity {
    fn default() -> Self {
        Self::new()
    }
}

impl UserSessionEntity {
    /// Creates a blank record stamped with the current schema version.
    pub fn new() -> Self {
        Self::from_parts(
            None,
            UserSessionMetadata {
                entity_version: Some(CURRENT_SCHEMA_VERSION_USER_SESSION),
                ..Default::default()
            },
        )
    }

    pub(crate) fn from_parts(id: Option<Uuid>, metadata: UserSessionMetadata) -> Self {
        Self {
            id,
            version: 0,
            payload: Payload::Full(metadata),
            materialized_from_partial: false,
            notes: NoteSet::default(),
            client_sessions: Vec::new(),
        }
    }

    pub(crate) fn from_stored(
        id: Uuid,
        version: i32,
        metadata: UserSessionMetadata,
        notes: NoteSet,
        client_sessions: Vec<ClientSessionEntity>,
    ) -> Self {
        Self {
            id: Some(id),
            version,
            payload: Payload::Full(metadata),
            materialized_from_partial: false,
            notes,
            client_sessions,
        }
    }

    pub(crate) fn from_derived(id: Uuid, version: i32, derived: DerivedColumns) -> Self {
        Self {
            id: Some(id),
            version,
            payload: Payload::Partial(derived),
            materialized_from_partial: false,
            notes: NoteSet::default(),
            client_sessions: Vec::new(),
        }
    }

    /// What this record was loaded with.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// `true` once the JSON payload is materialized, either because it was
    /// loaded or because a setter ran on a partial record.
    pub fn is_metadata_initialized(&self) -> bool {
        matches!(self.payload, Payload::Full(_))
    }

    /// Metadata payload, if this record was fully loaded.
    pub fn metadata(&self) -> Option<&UserSessionMetadata> {
        match &self.payload {
            Payload::Full(metadata) => Some(metadata),
            Payload::Partial(_) => None,
        }
    }

    /// Applies `change` to the payload. A partially loaded record first gets
    /// a payload seeded from its generated columns and can no longer be
    /// written back.
    fn update_metadata(&mut self, change: impl FnOnce(&mut UserSessionMetadata)) {
        match &mut self.payload {
            Payload::Full(metadata) => change(metadata),
            Payload::Partial(derived) => {
                let mut metadata = UserSessionMetadata::from(&*derived);
                change(&mut metadata);
                self.payload = Payload::Full(metadata);
                self.materialized_from_partial = true;
            }
        }
    }

    /// Fails unless the payload was loaded in full.
    pub(crate) fn ensure_writable(&self) -> Result<()> {
        if self.materialized_from_partial || !self.is_metadata_initialized() {
            return Err(Error::PartialRecord(self.id().unwrap_or_default()));
        }
        Ok(())
    }

    /// Identifier in lowercase hyphenated form, `None` until assigned.
    pub fn id(&self) -> Option<String> {
        self.id.map(|id| id.to_string())
    }

    pub(crate) fn uuid(&self) -> Option<Uuid> {
        self.id
    }

    /// Normalizes and assigns the identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] if `id` is not a UUID.
    pub fn set_id(&mut self, id: &str) -> Result<()> {
        let id = id::parse(id)?;
        self.assign_id(id);
        Ok(())
    }

    pub(crate) fn assign_id(&mut self, id: Uuid) {
        self.id = Some(id);
        self.notes.reparent(self.id);
        for client_session in &mut self.client_sessions {
            client_session.set_parent(self.id);
        }
    }

    /// Optimistic lock version, owned by the store.
    pub fn version(&self) -> i32 {
        self.version
    }

    pub(crate) fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    /// Payload shape understood by this build.
    pub fn current_schema_version() -> i32 {
        CURRENT_SCHEMA_VERSION_USER_SESSION
    }

    /// Payload shape this record was written with.
    pub fn entity_version(&self) -> Option<i32> {
        match &self.payload {
            Payload::Full(metadata) => metadata.entity_version,
            Payload::Partial(derived) => derived.entity_version,
        }
    }

    pub fn set_entity_version(&mut self, entity_version: Option<i32>) {
        self.update_metadata(|metadata| metadata.entity_version = entity_version);
    }

    /// `true` when the payload was written by an older shape and should go
    /// through migration before being trusted.
    pub fn needs_migration(&self) -> bool {
        self.entity_version()
            .is_some_and(|version| version < CURRENT_SCHEMA_VERSION_USER_SESSION)
    }

    /// Realm of the session. Mirrored into a generated column.
    pub fn realm_id(&self) -> Option<&str> {
        match &self.payload {
            Payload::Full(metadata) => metadata.realm_id.as_deref(),
            Payload::Partial(derived) => derived.realm_id.as_deref(),
        }
    }

    pub fn set_realm_id(&mut self, realm_id: Option<String>) {
        self.update_metadata(|metadata| metadata.realm_id = realm_id);
    }

    /// Authenticated user. Mirrored into a generated column.
    pub fn user_id(&self) -> Option<&str> {
        match &self.payload {
            Payload::Full(metadata) => metadata.user_id.as_deref(),
            Payload::Partial(derived) => derived.user_id.as_deref(),
        }
    }

    pub fn set_user_id(&mut self, user_id: Option<String>) {
        self.update_metadata(|metadata| metadata.user_id = user_id);
    }

    /// Username entered at login. Payload only, so `None` on partial loads.
    pub fn login_username(&self) -> Option<&str> {
        self.metadata()?.login_username.as_deref()
    }

    pub fn set_login_username(&mut self, login_username: Option<String>) {
        self.update_metadata(|metadata| metadata.login_username = login_username);
    }

    /// Client address the session started from.
    pub fn ip_address(&self) -> Option<&str> {
        self.metadata()?.ip_address.as_deref()
    }

    pub fn set_ip_address(&mut self, ip_address: Option<String>) {
        self.update_metadata(|metadata| metadata.ip_address = ip_address);
    }

    /// Authentication protocol.
    pub fn auth_method(&self) -> Option<&str> {
        self.metadata()?.auth_method.as_deref()
    }

    pub fn set_auth_method(&mut self, auth_method: Option<String>) {
        self.update_metadata(|metadata| metadata.auth_method = auth_method);
    }

    /// Whether this is an offline session. Mirrored into a generated column.
    pub fn is_offline(&self) -> Option<bool> {
        match &self.payload {
            Payload::Full(metadata) => metadata.offline,
            Payload::Partial(derived) => derived.offline,
        }
    }

    pub fn set_offline(&mut self, offline: Option<bool>) {
        self.update_metadata(|metadata| metadata.offline = offline);
    }

    /// Whether the user asked to stay signed in.
    pub fn is_remember_me(&self) -> Option<bool> {
        self.metadata()?.remember_me
    }

    pub fn set_remember_me(&mut self, remember_me: Option<bool>) {
        self.update_metadata(|metadata| metadata.remember_me = remember_me);
    }

    /// Creation time, epoch milliseconds.
    pub fn timestamp(&self) -> Option<i64> {
        self.metadata()?.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: Option<i64>) {
        self.update_metadata(|metadata| metadata.timestamp = timestamp);
    }

    /// Last refresh time, epoch milliseconds. Mirrored into a generated
    /// column.
    pub fn last_session_refresh(&self) -> Option<i64> {
        match &self.payload {
            Payload::Full(metadata) => metadata.last_session_refresh,
            Payload::Partial(derived) => derived.last_session_refresh,
        }
    }

    pub fn set_last_session_refresh(&mut self, last_session_refresh: Option<i64>) {
        self.update_metadata(|metadata| metadata.last_session_refresh = last_session_refresh);
    }

    /// Expiration time, epoch milliseconds. Mirrored into a generated column
    /// and used by [`UserSessionStore::delete_expired`](crate::UserSessionStore::delete_expired).
    pub fn expiration(&self) -> Option<i64> {
        match &self.payload {
            Payload::Full(metadata) => metadata.expiration,
            Payload::Partial(derived) => derived.expiration,
        }
    }

    pub fn set_expiration(&mut self, expiration: Option<i64>) {
        self.update_metadata(|metadata| metadata.expiration = expiration);
    }

    /// Session id at the upstream identity provider.
    pub fn broker_session_id(&self) -> Option<&str> {
        match &self.payload {
            Payload::Full(metadata) => metadata.broker_session_id.as_deref(),
            Payload::Partial(derived) => derived.broker_session_id.as_deref(),
        }
    }

    pub fn set_broker_session_id(&mut self, broker_session_id: Option<String>) {
        self.update_metadata(|metadata| metadata.broker_session_id = broker_session_id);
    }

    /// User id at the upstream identity provider.
    pub fn broker_user_id(&self) -> Option<&str> {
        match &self.payload {
            Payload::Full(metadata) => metadata.broker_user_id.as_deref(),
            Payload::Partial(derived) => derived.broker_user_id.as_deref(),
        }
    }

    pub fn set_broker_user_id(&mut self, broker_user_id: Option<String>) {
        self.update_metadata(|metadata| metadata.broker_user_id = broker_user_id);
    }

    /// Lifecycle state. Payload only.
    pub fn state(&self) -> Option<SessionState> {
        self.metadata()?.state
    }

    pub fn set_state(&mut self, state: Option<SessionState>) {
        self.update_metadata(|metadata| metadata.state = state);
    }

    /// Stored sessions are always persistent.
    pub fn persistence_state(&self) -> PersistenceState {
        PersistenceState::Persistent
    }

    /// Does nothing: a record in storage is persistent by definition, and
    /// callers switching state on a loaded session must not get an error.
    pub fn set_persistence_state(&mut self, _persistence_state: PersistenceState) {}

    /// Detached copy of the notes.
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

    /// Replaces every note. Blank entries are skipped.
    pub fn set_notes<I, K, V>(&mut self, notes: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.notes.replace_all(self.id, notes);
    }

    /// Replaces the note `name`; a blank or absent `value` removes it.
    pub fn set_note(&mut self, name: &str, value: Option<&str>) {
        self.notes.set(self.id, name, value);
    }

    /// Removes a note. Returns whether it existed.
    pub fn remove_note(&mut self, name: &str) -> bool {
        self.notes.remove(name)
    }

    /// Client sessions owned by this record, empty on partial loads.
    pub fn authenticated_client_sessions(&self) -> &[ClientSessionEntity] {
        &self.client_sessions
    }

    pub(crate) fn client_sessions_mut(&mut self) -> &mut [ClientSessionEntity] {
        &mut self.client_sessions
    }

    /// First client session for `client_id`.
    pub fn authenticated_client_session(&self, client_id: &str) -> Option<&ClientSessionEntity> {
        self.client_sessions
            .iter()
            .find(|cs| cs.client_id() == Some(client_id))
    }

    /// Mutable access to the first client session for `client_id`.
    pub fn authenticated_client_session_mut(
        &mut self,
        client_id: &str,
    ) -> Option<&mut ClientSessionEntity> {
        self.client_sessions
            .iter_mut()
            .find(|cs| cs.client_id() == Some(client_id))
    }

    /// Deep-copies `client_session` into this record.
    ///
    /// The copy is parented to this record and stamped with this record's
    /// entity version. A client session that belongs to another user session
    /// is copied under a fresh identifier. An existing entry with the same client id is not
    /// replaced; remove it first. Returns `false` when an entry with the same
    /// identifier is already present.
    pub fn add_authenticated_client_session(&mut self, client_session: &dyn ClientSessionView) -> bool {
        let mut copy = cloner::client_session_from(client_session);
        if client_session
            .client_session_root()
            .is_some_and(|root| Some(root) != self.id)
        {
            // Still owned by another user session.
            copy.assign_id(id::generate());
        }
        copy.set_parent(self.id);
        copy.set_entity_version(self.entity_version());

        if copy.uuid().is_some() && self.client_sessions.contains(&copy) {
            return false;
        }
        self.client_sessions.push(copy);
        true
    }

    /// Removes every client session for `client_id`. Returns whether any
    /// was removed.
    pub fn remove_authenticated_client_session(&mut self, client_id: &str) -> bool {
        let before = self.client_sessions.len();
        self.client_sessions
            .retain(|cs| cs.client_id() != Some(client_id));
        self.client_sessions.len() != before
    }

    /// Detaches every client session. The rows go on the next update.
    pub fn clear_authenticated_client_sessions(&mut self) {
        self.client_sessions.clear();
    }
}

impl PartialEq for UserSessionEntity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for UserSessionEntity {}

impl Hash for UserSessionEntity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        TypeId::of::<Self>().hash(state);
    }
}

impl UserSessionView for UserSessionEntity {
    fn user_session_id(&self) -> Option<Uuid> {
        self.id
    }

    fn user_session_metadata(&self) -> UserSessionMetadata {
        match &self.payload {
            Payload::Full(metadata) => metadata.clone(),
            Payload::Partial(derived) => UserSessionMetadata::from(derived),
        }
    }

    fn user_session_notes(&self) -> BTreeMap<String, String> {
        self.notes.snapshot()
    }

    fn user_session_client_sessions(&self) -> Vec<&dyn ClientSessionView> {
        self.client_sessions
            .iter()
            .map(|cs| cs as &dyn ClientSessionView)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::cloner::TransientClientSession;

    fn partial(derived: DerivedColumns) -> UserSessionEntity {
        UserSessionEntity::from_derived(Uuid::new_v4(), 3, derived)
    }

    #[test]
    fn new_record_is_current_and_persistent() {
        let mut session = UserSessionEntity::new();
        assert_eq!(session.entity_version(), Some(UserSessionEntity::current_schema_version()));
        assert!(!session.needs_migration());
        assert_eq!(session.version(), 0);

        session.set_persistence_state(PersistenceState::Transient);
        assert_eq!(session.persistence_state(), PersistenceState::Persistent);
    }

    #[test]
    fn set_id_normalizes_and_rejects() {
        let mut session = UserSessionEntity::new();
        session.set_id("{6F1C2A4E-8B0D-4F3A-9C5E-1D2B3A4C5D6E}").unwrap();
        assert_eq!(session.id().as_deref(), Some("6f1c2a4e-8b0d-4f3a-9c5e-1d2b3a4c5d6e"));

        let err = session.set_id("definitely not a uuid").unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier(_)));
        assert_eq!(session.id().as_deref(), Some("6f1c2a4e-8b0d-4f3a-9c5e-1d2b3a4c5d6e"));
    }

    #[test]
    fn set_id_reparents_children() {
        let mut session = UserSessionEntity::new();
        session.set_note("k", Some("v"));
        session.add_authenticated_client_session(&TransientClientSession::for_client("app"));

        let id = Uuid::new_v4();
        session.set_id(&id.to_string()).unwrap();

        assert!(session.note_set().iter().all(|n| n.root() == Some(id)));
        assert!(session
            .authenticated_client_sessions()
            .iter()
            .all(|cs| cs.root() == Some(id)));
    }

    #[test]
    fn note_uniqueness_and_blank_deletion() {
        let mut session = UserSessionEntity::new();
        session.set_note("k", Some("v1"));
        session.set_note("k", Some("v2"));
        assert_eq!(session.notes().len(), 1);
        assert_eq!(session.note("k"), Some("v2"));

        session.set_note("k", Some(""));
        assert_eq!(session.note("k"), None);

        session.set_note("k", Some("v3"));
        session.set_note("k", None);
        assert_eq!(session.note("k"), None);
        assert!(!session.remove_note("k"));
    }

    #[test]
    fn notes_view_is_a_snapshot() {
        let mut session = UserSessionEntity::new();
        session.set_notes([("a", "1"), ("b", "2")]);
        let mut view = session.notes();
        view.clear();
        assert_eq!(session.notes().len(), 2);
    }

    #[test]
    fn partial_record_reads_derived_columns() {
        let session = partial(DerivedColumns {
            entity_version: Some(1),
            realm_id: Some("realm".into()),
            user_id: Some("user".into()),
            broker_session_id: Some("broker-session".into()),
            broker_user_id: Some("broker-user".into()),
            offline: Some(true),
            last_session_refresh: Some(10),
            expiration: Some(20),
        });

        assert!(!session.is_metadata_initialized());
        assert_eq!(session.entity_version(), Some(1));
        assert_eq!(session.realm_id(), Some("realm"));
        assert_eq!(session.user_id(), Some("user"));
        assert_eq!(session.broker_session_id(), Some("broker-session"));
        assert_eq!(session.broker_user_id(), Some("broker-user"));
        assert_eq!(session.is_offline(), Some(true));
        assert_eq!(session.last_session_refresh(), Some(10));
        assert_eq!(session.expiration(), Some(20));
        assert_eq!(session.login_username(), None);
        assert_eq!(session.state(), None);
        assert_eq!(session.version(), 3);
    }

    #[test]
    fn payload_wins_over_stale_derived_columns() {
        let mut session = partial(DerivedColumns {
            realm_id: Some("stale".into()),
            expiration: Some(1),
            ..Default::default()
        });
        session.set_realm_id(Some("fresh".into()));

        assert!(session.is_metadata_initialized());
        assert_eq!(session.realm_id(), Some("fresh"));
        // seeded from the generated column until overwritten
        assert_eq!(session.expiration(), Some(1));
        assert!(matches!(session.ensure_writable(), Err(Error::PartialRecord(_))));
    }

    #[test]
    fn untouched_partial_record_is_not_writable() {
        let session = partial(DerivedColumns::default());
        assert!(matches!(session.ensure_writable(), Err(Error::PartialRecord(_))));
        assert!(UserSessionEntity::new().ensure_writable().is_ok());
    }

    #[test]
    fn old_entity_version_needs_migration() {
        let session = partial(DerivedColumns {
            entity_version: Some(0),
            ..Default::default()
        });
        assert!(session.needs_migration());
    }

    #[test]
    fn added_client_session_is_stamped_and_parented() {
        let mut session = UserSessionEntity::new();
        let id = Uuid::new_v4();
        session.set_id(&id.to_string()).unwrap();
        session.set_entity_version(Some(5));

        let mut source = TransientClientSession::for_client("app");
        source.metadata.entity_version = Some(1);
        assert!(session.add_authenticated_client_session(&source));

        let cs = session.authenticated_client_session("app").unwrap();
        assert_eq!(cs.entity_version(), Some(5));
        assert_eq!(cs.root(), Some(id));
        assert!(session.authenticated_client_session("other").is_none());
    }

    #[test]
    fn adding_same_identifier_twice_is_rejected() {
        let mut session = UserSessionEntity::new();
        let mut source = TransientClientSession::for_client("app");
        source.id = Some(Uuid::new_v4());

        assert!(session.add_authenticated_client_session(&source));
        assert!(!session.add_authenticated_client_session(&source));
        assert_eq!(session.authenticated_client_sessions().len(), 1);
    }

    #[test]
    fn client_session_owned_elsewhere_gets_fresh_identifier() {
        let mut owner = UserSessionEntity::new();
        owner.set_id(&Uuid::new_v4().to_string()).unwrap();
        let mut source = TransientClientSession::for_client("app");
        source.id = Some(Uuid::new_v4());
        owner.add_authenticated_client_session(&source);
        let owned = owner.authenticated_client_session("app").unwrap();
        assert_eq!(owned.uuid(), source.id);

        let mut other = UserSessionEntity::new();
        assert!(other.add_authenticated_client_session(owned));
        let copy = other.authenticated_client_session("app").unwrap();
        assert!(copy.uuid().is_some());
        assert_ne!(copy.uuid(), owned.uuid());
        assert!(copy.note_set().iter().all(|n| n.root() == copy.uuid()));

        // re-adding under the same owner keeps the identifier
        let mut reloaded = owner.clone();
        reloaded.clear_authenticated_client_sessions();
        reloaded.add_authenticated_client_session(owned);
        assert_eq!(reloaded.authenticated_client_session("app").unwrap().uuid(), source.id);
    }

    #[test]
    fn remove_client_session_removes_every_match() {
        let mut session = UserSessionEntity::new();
        session.add_authenticated_client_session(&TransientClientSession::for_client("app"));
        session.add_authenticated_client_session(&TransientClientSession::for_client("app"));
        session.add_authenticated_client_session(&TransientClientSession::for_client("other"));

        assert!(session.remove_authenticated_client_session("app"));
        assert_eq!(session.authenticated_client_sessions().len(), 1);
        assert!(!session.remove_authenticated_client_session("app"));

        session.clear_authenticated_client_sessions();
        assert!(session.authenticated_client_sessions().is_empty());
    }

    #[test]
    fn client_sessions_are_isolated_between_records() {
        let source = TransientClientSession::for_client("app");
        let mut a = UserSessionEntity::new();
        let mut b = UserSessionEntity::new();
        a.add_authenticated_client_session(&source);
        b.add_authenticated_client_session(&source);

        a.authenticated_client_session_mut("app")
            .unwrap()
            .set_action(Some("LOGOUT".into()));

        assert_eq!(a.authenticated_client_session("app").unwrap().action(), Some("LOGOUT"));
        assert_eq!(b.authenticated_client_session("app").unwrap().action(), None);
    }

    #[test]
    fn equality_is_by_identifier() {
        let id = Uuid::new_v4().to_string();
        let mut a = UserSessionEntity::new();
        let mut b = UserSessionEntity::new();
        a.set_id(&id).unwrap();
        b.set_id(&id).unwrap();
        a.set_realm_id(Some("one".into()));
        b.set_realm_id(Some("two".into()));
        assert_eq!(a, b);

        let mut c = UserSessionEntity::new();
        c.set_id(&Uuid::new_v4().to_string()).unwrap();
        c.set_realm_id(Some("one".into()));
        assert_ne!(a, c);
    }

    #[test]
    fn hash_survives_mutation() {
        let mut session = UserSessionEntity::new();
        session.set_id(&Uuid::new_v4().to_string()).unwrap();

        let mut set = HashSet::new();
        set.insert(session.clone());
        session.set_realm_id(Some("changed".into()));
        session.set_note("k", Some("v"));
        assert!(set.contains(&session));
    }
}
