//! Sea-ORM entity for the `kc_user_session` table.

use sea_orm::entity::prelude::*;

/// Sea-ORM entity model representing the root of a user session aggregate.
///
/// # Database Schema
///
/// | Column               | Type                 | Description                                    |
/// |----------------------|----------------------|------------------------------------------------|
/// | id                   | UUID (Primary Key)   | Session ID                                     |
/// | version              | INTEGER              | Optimistic lock counter                        |
/// | metadata             | JSONB                | Versioned session payload                      |
/// | entity_version       | INTEGER (generated)  | `metadata.entityVersion`                       |
/// | realm_id             | TEXT (generated)     | `metadata.realmId`                             |
/// | user_id              | TEXT (generated)     | `metadata.userId`                              |
/// | broker_session_id    | TEXT (generated)     | `metadata.brokerSessionId`                     |
/// | broker_user_id       | TEXT (generated)     | `metadata.brokerUserId`                        |
/// | offline              | BOOLEAN (generated)  | `metadata.offline`                             |
/// | last_session_refresh | BIGINT (generated)   | `metadata.lastSessionRefresh`                  |
/// | expiration           | BIGINT (generated)   | `metadata.expiration`                          |
///
/// Generated columns are read-only. The store leaves them `NotSet` on every
/// insert and update so the database can compute them.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "kc_user_session")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Incremented on every successful update; compared on commit.
    pub version: i32,

    #[sea_orm(column_type = "JsonBinary")]
    pub metadata: Json,

    pub entity_version: Option<i32>,
    pub realm_id: Option<String>,
    pub user_id: Option<String>,
    pub broker_session_id: Option<String>,
    pub broker_user_id: Option<String>,
    pub offline: Option<bool>,
    pub last_session_refresh: Option<i64>,
    pub expiration: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_session_note::Entity")]
    Notes,
    #[sea_orm(has_many = "super::client_session::Entity")]
    ClientSessions,
}

impl Related<super::user_session_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notes.def()
    }
}

impl Related<super::client_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClientSessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
