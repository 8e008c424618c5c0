//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, Set, SqlErr, Statement, Value,
};
use serde::{Deserialize, Serialize};

/// A book row joined with its query-time like aggregate
#[derive(Debug, Clone, FromQueryResult, Serialize, Deserialize)]
pub struct BookWithLikes {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub author_name: String,
    pub annotated_likes: i64,
}

/// Whitelisted ordering keys for the book list; a leading `-` flips direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookOrdering {
    PriceAsc,
    PriceDesc,
    AuthorNameAsc,
    AuthorNameDesc,
}

impl BookOrdering {
    /// Parse the sign-prefixed ordering parameter. Unknown fields are ignored,
    /// which leaves the list in default (insertion) order.
    pub fn parse(raw: &str) -> Option<BookOrdering> {
        match raw {
            "price" => Some(BookOrdering::PriceAsc),
            "-price" => Some(BookOrdering::PriceDesc),
            "author_name" => Some(BookOrdering::AuthorNameAsc),
            "-author_name" => Some(BookOrdering::AuthorNameDesc),
            _ => None,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            BookOrdering::PriceAsc => "b.price ASC",
            BookOrdering::PriceDesc => "b.price DESC",
            BookOrdering::AuthorNameAsc => "b.author_name ASC",
            BookOrdering::AuthorNameDesc => "b.author_name DESC",
        }
    }
}

/// Filter, search, and ordering options for the book list
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    /// Exact price match
    pub price: Option<Decimal>,

    /// Exact name match
    pub name: Option<String>,

    /// Case-insensitive substring over name OR author_name
    pub search: Option<String>,

    pub ordering: Option<BookOrdering>,
}

const BOOK_LIST_SELECT: &str = r#"
SELECT
    b.id,
    b.name,
    b.price,
    b.author_name,
    COUNT(r.id) FILTER (WHERE r."like") AS annotated_likes
FROM books b
LEFT JOIN user_book_relations r ON r.book_id = b.id
"#;

/// Escape LIKE wildcards in user-supplied search text
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Build the annotated book list query. The id tie-break keeps equal-price
/// rows in insertion order.
fn build_book_list_sql(filter: &BookFilter) -> (String, Vec<Value>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(price) = filter.price {
        values.push(price.into());
        conditions.push(format!("b.price = ${}", values.len()));
    }

    if let Some(ref name) = filter.name {
        values.push(name.clone().into());
        conditions.push(format!("b.name = ${}", values.len()));
    }

    if let Some(ref search) = filter.search {
        if !search.is_empty() {
            values.push(like_pattern(search).into());
            conditions.push(format!(
                "(b.name ILIKE ${0} ESCAPE '\\' OR b.author_name ILIKE ${0} ESCAPE '\\')",
                values.len()
            ));
        }
    }

    let mut sql = String::from(BOOK_LIST_SELECT);
    if !conditions.is_empty() {
        sql.push_str("WHERE ");
        sql.push_str(&conditions.join(" AND "));
        sql.push('\n');
    }
    sql.push_str("GROUP BY b.id\n");
    match filter.ordering {
        Some(ordering) => sql.push_str(&format!("ORDER BY {}, b.id ASC", ordering.sql())),
        None => sql.push_str("ORDER BY b.id ASC"),
    }

    (sql, values)
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Create a new user. Duplicate usernames surface as a conflict.
    pub async fn create_user(
        &self,
        username: String,
        password_hash: String,
        is_staff: bool,
    ) -> Result<User> {
        let now = chrono::Utc::now();

        let user = UserActiveModel {
            username: Set(username.clone()),
            password_hash: Set(password_hash),
            is_staff: Set(is_staff),
            created_at: Set(now.into()),
            ..Default::default()
        };

        match user.insert(self.write_conn()).await {
            Ok(user) => Ok(user),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(AppError::Duplicate {
                    message: format!("username \"{}\" is already taken", username),
                }),
                _ => Err(e.into()),
            },
        }
    }

    /// Find user by username
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Username.eq(username))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find user by ID
    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Book Operations
    // ========================================================================

    /// List books with the annotated like count, honoring filter/search/ordering
    pub async fn list_books(&self, filter: &BookFilter) -> Result<Vec<BookWithLikes>> {
        let (sql, values) = build_book_list_sql(filter);
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, &sql, values);

        BookWithLikes::find_by_statement(stmt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find one book with its annotated like count
    pub async fn find_book_with_likes(&self, id: i64) -> Result<Option<BookWithLikes>> {
        let sql = format!("{}WHERE b.id = $1\nGROUP BY b.id", BOOK_LIST_SELECT);
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, &sql, vec![id.into()]);

        BookWithLikes::find_by_statement(stmt)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find a book row (no aggregate), used for ownership checks and updates
    pub async fn find_book_by_id(&self, id: i64) -> Result<Option<Book>> {
        BookEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Create a new book owned by the given user
    pub async fn create_book(
        &self,
        name: String,
        price: Decimal,
        author_name: String,
        owner_id: i64,
    ) -> Result<Book> {
        let now = chrono::Utc::now();

        let book = BookActiveModel {
            name: Set(name),
            price: Set(price),
            author_name: Set(author_name),
            owner_id: Set(Some(owner_id)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        book.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Apply field changes to a book; absent fields are left untouched
    pub async fn update_book(
        &self,
        book: Book,
        name: Option<String>,
        price: Option<Decimal>,
        author_name: Option<String>,
    ) -> Result<Book> {
        let mut active: BookActiveModel = book.into();

        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(price) = price {
            active.price = Set(price);
        }
        if let Some(author_name) = author_name {
            active.author_name = Set(author_name);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Delete a book by ID
    pub async fn delete_book(&self, id: i64) -> Result<bool> {
        let result = BookEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Per-book count of liking relation rows. Recomputed independently of
    /// the list aggregate as a cross-check.
    pub async fn count_likes(&self, book_id: i64) -> Result<i64> {
        let count = UserBookRelationEntity::find()
            .filter(UserBookRelationColumn::BookId.eq(book_id))
            .filter(UserBookRelationColumn::Like.eq(true))
            .count(self.read_conn())
            .await?;

        Ok(count as i64)
    }

    // ========================================================================
    // Relation Operations
    // ========================================================================

    /// Fetch the (user, book) relation row, creating it with default falsy
    /// fields on first interaction. The unique constraint makes the lazy
    /// create race-free.
    pub async fn get_or_create_relation(
        &self,
        user_id: i64,
        book_id: i64,
    ) -> Result<UserBookRelation> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            INSERT INTO user_book_relations (user_id, book_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, book_id) DO NOTHING
            "#,
            vec![user_id.into(), book_id.into()],
        );

        self.write_conn().execute(stmt).await?;

        UserBookRelationEntity::find()
            .filter(UserBookRelationColumn::UserId.eq(user_id))
            .filter(UserBookRelationColumn::BookId.eq(book_id))
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::Internal {
                message: format!(
                    "relation row missing after upsert (user {}, book {})",
                    user_id, book_id
                ),
            })
    }

    /// Apply a partial update to a relation row; absent fields stay untouched
    pub async fn update_relation(
        &self,
        relation: UserBookRelation,
        like: Option<bool>,
        in_bookmarks: Option<bool>,
        rate: Option<i16>,
    ) -> Result<UserBookRelation> {
        if like.is_none() && in_bookmarks.is_none() && rate.is_none() {
            return Ok(relation);
        }

        let mut active: UserBookRelationActiveModel = relation.into();

        if let Some(like) = like {
            active.like = Set(like);
        }
        if let Some(in_bookmarks) = in_bookmarks {
            active.in_bookmarks = Set(in_bookmarks);
        }
        if let Some(rate) = rate {
            active.rate = Set(Some(rate));
        }

        active.update(self.write_conn()).await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_defaults_to_insertion_order() {
        let (sql, values) = build_book_list_sql(&BookFilter::default());
        assert!(values.is_empty());
        assert!(!sql.contains("WHERE"));
        assert!(sql.trim_end().ends_with("ORDER BY b.id ASC"));
    }

    #[test]
    fn test_price_and_name_filters_bind_in_order() {
        let filter = BookFilter {
            price: Some(Decimal::new(100, 0)),
            name: Some("Test Book 2".to_string()),
            ..Default::default()
        };
        let (sql, values) = build_book_list_sql(&filter);
        assert_eq!(values.len(), 2);
        assert!(sql.contains("b.price = $1"));
        assert!(sql.contains("b.name = $2"));
        assert!(sql.contains("WHERE b.price = $1 AND b.name = $2"));
    }

    #[test]
    fn test_search_matches_both_columns_case_insensitively() {
        let filter = BookFilter {
            search: Some("Author 3".to_string()),
            ..Default::default()
        };
        let (sql, values) = build_book_list_sql(&filter);
        assert_eq!(values.len(), 1);
        assert!(sql.contains("b.name ILIKE $1"));
        assert!(sql.contains("b.author_name ILIKE $1"));
        assert!(sql.contains(" OR "));
    }

    #[test]
    fn test_empty_search_is_ignored() {
        let filter = BookFilter {
            search: Some(String::new()),
            ..Default::default()
        };
        let (sql, values) = build_book_list_sql(&filter);
        assert!(values.is_empty());
        assert!(!sql.contains("WHERE"));
    }

    #[test]
    fn test_ordering_keeps_id_tie_break() {
        let filter = BookFilter {
            ordering: Some(BookOrdering::PriceAsc),
            ..Default::default()
        };
        let (sql, _) = build_book_list_sql(&filter);
        assert!(sql.trim_end().ends_with("ORDER BY b.price ASC, b.id ASC"));

        let filter = BookFilter {
            ordering: Some(BookOrdering::AuthorNameDesc),
            ..Default::default()
        };
        let (sql, _) = build_book_list_sql(&filter);
        assert!(sql
            .trim_end()
            .ends_with("ORDER BY b.author_name DESC, b.id ASC"));
    }

    #[test]
    fn test_ordering_parse() {
        assert_eq!(BookOrdering::parse("price"), Some(BookOrdering::PriceAsc));
        assert_eq!(BookOrdering::parse("-price"), Some(BookOrdering::PriceDesc));
        assert_eq!(
            BookOrdering::parse("author_name"),
            Some(BookOrdering::AuthorNameAsc)
        );
        assert_eq!(
            BookOrdering::parse("-author_name"),
            Some(BookOrdering::AuthorNameDesc)
        );
        // Unknown fields are ignored rather than rejected
        assert_eq!(BookOrdering::parse("rating"), None);
        assert_eq!(BookOrdering::parse(""), None);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Author 3"), "%Author 3%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("back\\slash"), "%back\\\\slash%");
    }
}
