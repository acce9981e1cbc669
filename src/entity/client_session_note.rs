//! Sea-ORM entity for the `kc_client_session_note` table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "kc_client_session_note")]
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
        belongs_to = "super::client_session::Entity",
        from = "Column::FkRoot",
        to = "super::client_session::Column::Id",
        on_delete = "Cascade"
    )]
    ClientSession,
}

impl Related<super::client_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClientSession.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
