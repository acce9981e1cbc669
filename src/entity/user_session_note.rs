//! Sea-ORM entity for the `kc_user_session_note` table.

use sea_orm::entity::prelude::*;

/// A single note of a user session. Names are unique per session, enforced
/// by the composite primary key.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "kc_user_session_note")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub fk_root: Uuid,
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub value: String,
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
}

impl Related<super::user_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserSession.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
