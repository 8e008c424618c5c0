//! Per-(user, book) relation entity holding like/bookmark/rating state

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Enumerated rating choices
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rate {
    Ok = 1,
    Good = 2,
    Fine = 3,
    Amazing = 4,
    Awesome = 5,
}

impl Rate {
    /// Map a stored value back to a choice; anything outside 1..=5 is invalid
    pub fn from_value(value: i16) -> Option<Rate> {
        match value {
            1 => Some(Rate::Ok),
            2 => Some(Rate::Good),
            3 => Some(Rate::Fine),
            4 => Some(Rate::Amazing),
            5 => Some(Rate::Awesome),
            _ => None,
        }
    }

    /// Human-readable label for the choice
    pub fn label(&self) -> &'static str {
        match self {
            Rate::Ok => "Ok",
            Rate::Good => "Good",
            Rate::Fine => "Fine",
            Rate::Amazing => "Amazing",
            Rate::Awesome => "Awesome",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_book_relations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub user_id: i64,

    pub book_id: i64,

    pub like: bool,

    pub in_bookmarks: bool,

    /// Nullable rating, one of the enumerated choices when set
    pub rate: Option<i16>,
}

impl Model {
    /// The rating as an enumerated choice, if one is set
    pub fn rate_choice(&self) -> Option<Rate> {
        self.rate.and_then(Rate::from_value)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::book::Entity",
        from = "Column::BookId",
        to = "super::book::Column::Id"
    )]
    Book,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Book.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_choices() {
        assert_eq!(Rate::from_value(1), Some(Rate::Ok));
        assert_eq!(Rate::from_value(5), Some(Rate::Awesome));
        assert_eq!(Rate::from_value(0), None);
        assert_eq!(Rate::from_value(8), None);
        assert_eq!(Rate::Amazing.label(), "Amazing");
    }
}
