//! Authentication handlers

use axum::{extract::State, http::StatusCode, response::Html, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::AppState;
use shelfmark_common::{
    auth::{self, JwtManager},
    db::Repository,
    errors::{AppError, Result},
    metrics::record_catalog_event,
};

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Register response
#[derive(Serialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub username: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let password_hash = auth::hash_password(&request.password)?;

    let repo = Repository::new(state.db.clone());
    let user = repo
        .create_user(request.username, password_hash, false)
        .await?;

    record_catalog_event("user_registered");
    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            username: user.username,
        }),
    ))
}

/// Exchange credentials for a JWT
pub async fn login(
    State(state): State<AppState>,
    Extension(jwt): Extension<Arc<JwtManager>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let repo = Repository::new(state.db.clone());

    let user = repo
        .find_user_by_username(&request.username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    auth::verify_password(&request.password, &user.password_hash)?;

    let token = jwt.generate_token(user.id, &user.username, user.is_staff)?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse { token }))
}

/// Static login page; the identity provider integration happens client-side
pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Shelfmark - Sign in</title>
</head>
<body>
    <h1>Sign in to Shelfmark</h1>
    <form method="post" action="/auth/login">
        <label>Username <input type="text" name="username" autocomplete="username"></label>
        <label>Password <input type="password" name="password" autocomplete="current-password"></label>
        <button type="submit">Sign in</button>
    </form>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let request = RegisterRequest {
            username: "reader".to_string(),
            password: "short".to_string(),
        };
        assert!(request.validate().is_err());

        let request = RegisterRequest {
            username: "reader".to_string(),
            password: "a sufficiently long password".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_login_page_renders_form() {
        assert!(LOGIN_PAGE.contains("<form"));
        assert!(LOGIN_PAGE.contains("name=\"username\""));
    }
}
