//! Book catalog handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use shelfmark_common::{
    auth::AuthContext,
    db::{BookFilter, BookOrdering, BookWithLikes, Repository},
    errors::{AppError, Result},
    metrics::record_catalog_event,
    policy,
};

/// Query parameters accepted by the book list
#[derive(Debug, Default, Deserialize)]
pub struct ListBooksQuery {
    /// Exact price match
    pub price: Option<Decimal>,

    /// Exact name match
    pub name: Option<String>,

    /// Substring search over name and author_name
    pub search: Option<String>,

    /// `price` | `author_name`, `-`-prefixed for descending
    pub ordering: Option<String>,
}

impl ListBooksQuery {
    fn into_filter(self) -> BookFilter {
        BookFilter {
            price: self.price,
            name: self.name,
            search: self.search,
            ordering: self.ordering.as_deref().and_then(BookOrdering::parse),
        }
    }
}

/// Full book payload (create, and PUT replacement)
#[derive(Debug, Deserialize, Validate)]
pub struct BookPayload {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    pub price: Decimal,

    #[validate(length(min = 1, max = 255))]
    pub author_name: String,
}

/// Partial update payload
#[derive(Debug, Default, Deserialize, Validate)]
pub struct BookPatch {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    pub price: Option<Decimal>,

    #[validate(length(min = 1, max = 255))]
    pub author_name: Option<String>,
}

/// Serialized book, carrying both the query-time aggregate and the
/// independently recomputed like count
#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub author_name: String,
    pub likes_count: i64,
    pub annotated_likes: i64,
}

impl BookResponse {
    fn from_parts(book: BookWithLikes, likes_count: i64) -> Self {
        Self {
            id: book.id,
            name: book.name,
            price: book.price,
            author_name: book.author_name,
            likes_count,
            annotated_likes: book.annotated_likes,
        }
    }
}

/// The price column is numeric(7,2) and negative prices are rejected
fn validate_price(price: Decimal) -> Result<Decimal> {
    if price < Decimal::ZERO {
        return Err(AppError::validation(
            "price",
            "Ensure this value is greater than or equal to 0.",
        ));
    }

    let normalized = price.normalize();
    if normalized.scale() > 2 {
        return Err(AppError::validation(
            "price",
            "Ensure that there are no more than 2 decimal places.",
        ));
    }
    if normalized >= Decimal::new(100_000, 0) {
        return Err(AppError::validation(
            "price",
            "Ensure that there are no more than 7 digits in total.",
        ));
    }

    Ok(normalized.round_dp(2))
}

/// List books with filtering, search, and ordering
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<ListBooksQuery>,
) -> Result<Json<Vec<BookResponse>>> {
    let repo = Repository::new(state.db.clone());

    let books = repo.list_books(&query.into_filter()).await?;

    let mut response = Vec::with_capacity(books.len());
    for book in books {
        let likes_count = repo.count_likes(book.id).await?;
        response.push(BookResponse::from_parts(book, likes_count));
    }

    Ok(Json(response))
}

/// Get a single book by ID
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BookResponse>> {
    let repo = Repository::new(state.db.clone());

    let book = repo
        .find_book_with_likes(id)
        .await?
        .ok_or(AppError::BookNotFound { id })?;

    let likes_count = repo.count_likes(id).await?;

    Ok(Json(BookResponse::from_parts(book, likes_count)))
}

/// Create a book; the requesting identity becomes the owner
pub async fn create_book(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(payload): Json<BookPayload>,
) -> Result<(StatusCode, Json<BookResponse>)> {
    payload.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;
    let price = validate_price(payload.price)?;

    let repo = Repository::new(state.db.clone());
    let book = repo
        .create_book(payload.name, price, payload.author_name, auth.user_id)
        .await?;

    record_catalog_event("book_created");
    tracing::info!(
        book_id = book.id,
        owner_id = auth.user_id,
        name = %book.name,
        "Book created"
    );

    let response = BookResponse {
        id: book.id,
        name: book.name,
        price: book.price,
        author_name: book.author_name,
        likes_count: 0,
        annotated_likes: 0,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Full update; only the owner or staff may mutate
pub async fn update_book(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(payload): Json<BookPayload>,
) -> Result<Json<BookResponse>> {
    let repo = Repository::new(state.db.clone());

    let book = repo
        .find_book_by_id(id)
        .await?
        .ok_or(AppError::BookNotFound { id })?;

    policy::authorize_mutation(&auth, book.owner_id)?;

    payload.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;
    let price = validate_price(payload.price)?;

    repo.update_book(
        book,
        Some(payload.name),
        Some(price),
        Some(payload.author_name),
    )
    .await?;

    serialize_book(&repo, id).await.map(Json)
}

/// Partial update; same permission rule as full update
pub async fn partial_update_book(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(patch): Json<BookPatch>,
) -> Result<Json<BookResponse>> {
    let repo = Repository::new(state.db.clone());

    let book = repo
        .find_book_by_id(id)
        .await?
        .ok_or(AppError::BookNotFound { id })?;

    policy::authorize_mutation(&auth, book.owner_id)?;

    patch.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;
    let price = match patch.price {
        Some(price) => Some(validate_price(price)?),
        None => None,
    };

    repo.update_book(book, patch.name, price, patch.author_name)
        .await?;

    serialize_book(&repo, id).await.map(Json)
}

/// Delete a book; only the owner or staff may delete
pub async fn delete_book(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let repo = Repository::new(state.db.clone());

    let book = repo
        .find_book_by_id(id)
        .await?
        .ok_or(AppError::BookNotFound { id })?;

    policy::authorize_mutation(&auth, book.owner_id)?;

    repo.delete_book(id).await?;

    record_catalog_event("book_deleted");
    tracing::info!(book_id = id, user_id = auth.user_id, "Book deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Re-read a book with both like counts after a mutation
async fn serialize_book(repo: &Repository, id: i64) -> Result<BookResponse> {
    let book = repo
        .find_book_with_likes(id)
        .await?
        .ok_or(AppError::BookNotFound { id })?;

    let likes_count = repo.count_likes(id).await?;

    Ok(BookResponse::from_parts(book, likes_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_into_filter_parses_ordering() {
        let query = ListBooksQuery {
            ordering: Some("-price".to_string()),
            ..Default::default()
        };
        let filter = query.into_filter();
        assert_eq!(filter.ordering, Some(BookOrdering::PriceDesc));

        // Unknown ordering fields are dropped, not rejected
        let query = ListBooksQuery {
            ordering: Some("owner".to_string()),
            ..Default::default()
        };
        assert_eq!(query.into_filter().ordering, None);
    }

    #[test]
    fn test_validate_price_accepts_two_decimals() {
        assert_eq!(
            validate_price(Decimal::new(149995, 2)).unwrap(),
            Decimal::new(149995, 2)
        );
        assert_eq!(validate_price(Decimal::new(55, 0)).unwrap(), Decimal::new(55, 0));
    }

    #[test]
    fn test_validate_price_rejects_negative() {
        let err = validate_price(Decimal::new(-100, 2)).unwrap_err();
        assert_eq!(
            err.field_errors(),
            Some(serde_json::json!({
                "price": ["Ensure this value is greater than or equal to 0."]
            }))
        );
    }

    #[test]
    fn test_validate_price_rejects_excess_precision() {
        assert!(validate_price(Decimal::new(12345, 3)).is_err()); // 12.345
        assert!(validate_price(Decimal::new(100_000, 0)).is_err());
        assert!(validate_price(Decimal::new(9_999_999, 2)).is_ok()); // 99999.99
    }

    #[test]
    fn test_book_response_shape() {
        let book = BookWithLikes {
            id: 1,
            name: "Test Book 1".to_string(),
            price: Decimal::new(5595, 2),
            author_name: "Author 1".to_string(),
            annotated_likes: 3,
        };
        let response = BookResponse::from_parts(book, 3);
        let json = serde_json::to_value(&response).unwrap();

        // price serializes as a decimal string, both counts are present
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "name": "Test Book 1",
                "price": "55.95",
                "author_name": "Author 1",
                "likes_count": 3,
                "annotated_likes": 3,
            })
        );
    }
}
