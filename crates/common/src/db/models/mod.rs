//! SeaORM entity models
//!
//! Database entities for the Shelfmark catalog

mod book;
mod user;
mod user_book_relation;

pub use book::{
    ActiveModel as BookActiveModel, Column as BookColumn, Entity as BookEntity, Model as Book,
};

pub use user::{
    ActiveModel as UserActiveModel, Column as UserColumn, Entity as UserEntity, Model as User,
};

pub use user_book_relation::{
    ActiveModel as UserBookRelationActiveModel, Column as UserBookRelationColumn,
    Entity as UserBookRelationEntity, Model as UserBookRelation, Rate,
};
