//! Book entity

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    /// numeric(7,2); serialized as a decimal string
    #[sea_orm(column_type = "Decimal(Some((7, 2)))")]
    pub price: Decimal,

    #[sea_orm(column_type = "Text")]
    pub author_name: String,

    /// Set to NULL when the owning user is deleted
    pub owner_id: Option<i64>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id"
    )]
    Owner,

    #[sea_orm(has_many = "super::user_book_relation::Entity")]
    ReaderRelations,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::user_book_relation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReaderRelations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
