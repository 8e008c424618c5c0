//! User-book relation handlers
//!
//! The relation resource is addressed by book id: the row for
//! (current user, book) is created lazily on first interaction and only
//! ever updated afterwards.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use shelfmark_common::{
    auth::AuthContext,
    db::{models::Rate, Repository},
    errors::{AppError, Result},
    metrics::record_catalog_event,
};

/// Partial update payload; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct RelationPatch {
    pub like: Option<bool>,
    pub in_bookmarks: Option<bool>,
    pub rate: Option<i16>,
}

/// Serialized relation; `book` is the book id
#[derive(Debug, Serialize)]
pub struct RelationResponse {
    pub book: i64,
    pub like: bool,
    pub in_bookmarks: bool,
    pub rate: Option<i16>,
}

/// Update the (current user, book) relation, creating it on first access
pub async fn update_relation(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(book_id): Path<i64>,
    Json(patch): Json<RelationPatch>,
) -> Result<Json<RelationResponse>> {
    let repo = Repository::new(state.db.clone());

    if repo.find_book_by_id(book_id).await?.is_none() {
        return Err(AppError::BookNotFound { id: book_id });
    }

    // The row is created before validation; an invalid rate still leaves a
    // fresh row with default falsy fields behind.
    let relation = repo.get_or_create_relation(auth.user_id, book_id).await?;

    if let Some(rate) = patch.rate {
        if Rate::from_value(rate).is_none() {
            return Err(AppError::InvalidChoice {
                field: "rate".to_string(),
                value: rate.to_string(),
            });
        }
    }

    let relation = repo
        .update_relation(relation, patch.like, patch.in_bookmarks, patch.rate)
        .await?;

    record_catalog_event("relation_updated");
    tracing::info!(
        user_id = auth.user_id,
        book_id,
        "Relation updated"
    );

    Ok(Json(RelationResponse {
        book: relation.book_id,
        like: relation.like,
        in_bookmarks: relation.in_bookmarks,
        rate: relation.rate,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_response_shape() {
        let response = RelationResponse {
            book: 7,
            like: true,
            in_bookmarks: false,
            rate: Some(5),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "book": 7,
                "like": true,
                "in_bookmarks": false,
                "rate": 5,
            })
        );
    }

    #[test]
    fn test_patch_accepts_field_subsets() {
        let patch: RelationPatch = serde_json::from_str(r#"{"like": true}"#).unwrap();
        assert_eq!(patch.like, Some(true));
        assert_eq!(patch.in_bookmarks, None);
        assert_eq!(patch.rate, None);

        let patch: RelationPatch = serde_json::from_str(r#"{"rate": 8}"#).unwrap();
        assert_eq!(patch.rate, Some(8));
        assert!(Rate::from_value(8).is_none());
    }
}
