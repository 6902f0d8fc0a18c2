//! Axum handlers, auth middleware, and router for the identity slice.
//!
//! Registration and login run at root database privilege (the user doesn't
//! have a scoped session yet); every other slice's handlers run under
//! [`keeper_database::Database::authenticate`] once [`auth_middleware`] has
//! validated the `gophkeeper-auth` cookie and injected the caller's user id.

use crate::error::{IdentityError, IdentityErrorExt};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::{StatusCode, request::Parts};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use getrandom::fill;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use keeper_domain::config::{ApiConfig, JwtConfig};
use keeper_domain::constants::SESSION_COOKIE_NAME;
use keeper_kernel::prelude::ApiState;
use serde::{Deserialize, Serialize};
use surrealdb::types::SurrealValue;

use crate::Identity;

#[derive(Debug, Deserialize)]
struct Credentials {
    login: String,
    password: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(rename = "userID")]
    user_id: String,
    exp: i64,
    iss: String,
}

#[derive(Debug, SurrealValue)]
struct UserId {
    user_id: String,
}

#[derive(Debug, SurrealValue)]
struct UserIdAndHash {
    user_id: String,
    hash: String,
}

/// The authenticated caller, injected into request extensions by
/// [`auth_middleware`] and extractable by any downstream handler.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or((StatusCode::UNAUTHORIZED, "missing authentication"))
    }
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NameTaken { .. } => StatusCode::CONFLICT,
            Self::WrongCredentials { .. } => StatusCode::UNAUTHORIZED,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Mounts `/api/user/register` and `/api/user/login`. Unauthenticated by
/// design — this is the only part of the API that doesn't sit behind
/// [`auth_middleware`].
pub fn router() -> Router<ApiState> {
    Router::new().route("/api/user/register", post(register)).route("/api/user/login", post(login))
}

/// Validates the `gophkeeper-auth` cookie and injects [`AuthUser`] into the
/// request. Returns 401 on a missing, malformed, or expired cookie, with no
/// side effects — the request never reaches the inner handler.
pub async fn auth_middleware(
    State(state): State<ApiState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let slice = state.get_slice::<Identity>().ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;
    let jwt = &slice.config.security.identity.jwt;

    let token = jar.get(SESSION_COOKIE_NAME).map(Cookie::value).ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = verify_token(token, jwt).map_err(|_| StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(AuthUser(claims.user_id));
    Ok(next.run(request).await)
}

/// Registers a new account: inserts `users`/`passwords` rows, then issues
/// the session cookie exactly as a fresh login would.
///
/// # Errors
/// [`IdentityError::Validation`] (→ 400) on an empty login/password,
/// [`IdentityError::NameTaken`] (→ 409) if the login is taken, or
/// [`IdentityError::Database`]/[`IdentityError::Hash`] (→ 500) otherwise.
async fn register(
    State(state): State<ApiState>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> Result<(CookieJar, StatusCode), IdentityError> {
    validate_credentials(&credentials)?;

    let slice = state
        .get_slice::<Identity>()
        .ok_or_else(|| IdentityError::Internal { message: "identity slice not registered".into(), context: None })?;

    let password_hash = hash_password(&credentials.password)?;

    let created: Option<UserId> = slice
        .database
        .query("SELECT id[0].id() AS user_id FROM (CREATE users SET login = $login)")
        .bind(("login", credentials.login.clone()))
        .await
        .map_err(|source| IdentityError::Database { source: source.into(), context: Some("reading created user id".into()) })?
        .take(0)
        .map_err(surrealdb::Error::from)
        .map_err(unique_violation_to_name_taken)?;

    let user_id = created
        .ok_or_else(|| IdentityError::Internal { message: "user creation returned no row".into(), context: None })?
        .user_id;

    slice
        .database
        .query("CREATE passwords SET user = type::thing('users', $user_id), hash = $hash")
        .bind(("user_id", user_id.clone()))
        .bind(("hash", password_hash))
        .await
        .map_err(|source| IdentityError::Database { source: source.into(), context: Some("inserting password hash".into()) })?
        .check()
        .map_err(surrealdb::Error::from)
        .map_err(|source| IdentityError::Database { source: source.into(), context: Some("inserting password hash".into()) })?;

    let cookie = issue_cookie(&slice.config.security.identity.jwt, &user_id)?;
    Ok((jar.add(cookie), StatusCode::OK))
}

/// Verifies login/password against the `passwords` table and, on success,
/// issues the same session cookie [`register`] does.
///
/// # Errors
/// [`IdentityError::Validation`] (→ 400) on an empty login/password,
/// [`IdentityError::WrongCredentials`] (→ 401) on a missing user or a failed
/// Argon2id verification, or [`IdentityError::Database`]/[`IdentityError::Hash`] (→ 500).
async fn login(
    State(state): State<ApiState>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> Result<(CookieJar, StatusCode), IdentityError> {
    validate_credentials(&credentials)?;

    let slice = state
        .get_slice::<Identity>()
        .ok_or_else(|| IdentityError::Internal { message: "identity slice not registered".into(), context: None })?;

    let found: Option<UserIdAndHash> = slice
        .database
        .query(
            "SELECT user.id[0].id() AS user_id, hash FROM passwords WHERE user.login = $login LIMIT 1",
        )
        .bind(("login", credentials.login.clone()))
        .await
        .map_err(|source| IdentityError::Database { source: source.into(), context: Some("looking up user".into()) })?
        .take(0)
        .map_err(|source| IdentityError::Database { source: source.into(), context: Some("parsing user lookup".into()) })?;

    let Some(found) = found else {
        return Err(IdentityError::WrongCredentials { context: None });
    };

    if !verify_password(&found.hash, &credentials.password)? {
        return Err(IdentityError::WrongCredentials { context: None });
    }

    let cookie = issue_cookie(&slice.config.security.identity.jwt, &found.user_id)?;
    Ok((jar.add(cookie), StatusCode::OK))
}

fn validate_credentials(credentials: &Credentials) -> Result<(), IdentityError> {
    if credentials.login.trim().is_empty() || credentials.password.is_empty() {
        return Err(IdentityError::Validation {
            message: "login and password must not be empty".into(),
            context: None,
        });
    }
    Ok(())
}

fn issue_cookie(jwt: &JwtConfig, user_id: &str) -> Result<Cookie<'static>, IdentityError> {
    let exp = chrono::Utc::now().timestamp() + jwt.ttl_seconds.cast_signed();
    let claims = Claims { user_id: user_id.to_owned(), exp, iss: jwt.issuer.clone() };

    let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(jwt.secret.as_bytes()))
        .map_err(|e| IdentityError::Token { message: e.to_string().into(), context: None })?;

    Ok(Cookie::build((SESSION_COOKIE_NAME, token)).path("/").http_only(true).build())
}

fn verify_token(token: &str, jwt: &JwtConfig) -> Result<Claims, IdentityError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[jwt.issuer.clone()]);
    validation.leeway = jwt.clock_skew_seconds;
    if let Some(audience) = &jwt.audience {
        validation.set_audience(&[audience.clone()]);
    } else {
        validation.validate_aud = false;
    }

    decode::<Claims>(token, &DecodingKey::from_secret(jwt.secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| IdentityError::Token { message: e.to_string().into(), context: None })
}

fn hash_password(password: &str) -> Result<String, IdentityError> {
    let mut salt_bytes = [0u8; 16];
    fill(&mut salt_bytes).map_err(|e| IdentityError::Hash { message: e.to_string().into(), context: None })?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| IdentityError::Hash { message: e.to_string().into(), context: None })?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::Hash { message: e.to_string().into(), context: None })
}

fn verify_password(stored: &str, password: &str) -> Result<bool, IdentityError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| IdentityError::Hash { message: e.to_string().into(), context: None })?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// `CREATE`/`INSERT` against `users.login_unique` surfaces as a generic
/// `surrealdb::Error` with no dedicated variant for a unique-index hit; this
/// pattern-matches on the engine's own wording rather than inventing a typed
/// error the driver doesn't provide.
fn unique_violation_to_name_taken(source: surrealdb::Error) -> IdentityError {
    let message = source.to_string();
    if message.contains("already contains") || message.contains("already exists") {
        IdentityError::NameTaken { context: None }
    } else {
        IdentityError::Database { source: source.into(), context: Some("creating user".into()) }
    }
}
