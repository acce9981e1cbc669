//! Sea-ORM entity for the `kc_client_session` table.

use sea_orm::entity::prelude::*;

/// An authenticated client session owned by one user session.
///
/// `entity_version` and `client_id` are generated from `metadata`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "kc_client_session")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub fk_root: Uuid,
    #[sea_orm(column_type = "JsonBinary")]
    pub metadata: Json,
    pub entity_version: Option<i32>,
    pub client_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user_session::Entity",
        from = "Column::FkRoot",
        to = "super::user_session::Column::Id",
        on_delete = "Cascade"
    )]
    UserSession,
    #[sea_orm(has_many = "super::client_session_note::Entity")]
    Notes,
}

impl Related<super::user_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserSession.def()
    }
}

impl Related<super::client_session_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
