use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use vent_db::Database;
use vent_types::api::{
    AuthResponse, LoginRequest, MeResponse, MeUser, MessageResponse, RegisterRequest, UserSummary,
};

use crate::error::{ApiError, ApiResult};
use crate::extract::cookie_value;
use crate::project::parse_timestamp;
use crate::token;
use crate::notify;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub config: AuthConfig,
}

/// All the request-handling context: no signing secret or cookie policy is
/// ever read from ambient/global state.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub secure_cookies: bool,
}

// -- Cookie transport --

pub const AUTH_COOKIE: &str = "authToken";

/// Cookie lifetime tracks the token lifetime exactly.
pub(crate) fn session_cookie(token: &str, secure: bool) -> String {
    let max_age_secs = token::TOKEN_TTL_DAYS * 24 * 3600;
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        AUTH_COOKIE, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub(crate) fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", AUTH_COOKIE);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

// -- Handlers --

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Response> {
    let email = req.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(ApiError::Validation("A valid email is required.".into()));
    }
    if req.password.len() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters.".into(),
        ));
    }

    // Fast-path duplicate check; the UNIQUE constraint below is authoritative
    let db = state.clone();
    let lookup = email.clone();
    let existing =
        tokio::task::spawn_blocking(move || db.db.get_user_by_email(&lookup)).await??;
    if existing.is_some() {
        return Err(ApiError::Conflict("Email already registered.".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hash failed: {e}")))?
        .to_string();

    let user_id = Uuid::new_v4();
    let created_at = chrono::Utc::now().to_rfc3339();

    let db = state.clone();
    let insert_email = email.clone();
    let result = tokio::task::spawn_blocking(move || {
        db.db
            .create_user(&user_id.to_string(), &insert_email, &password_hash, &created_at)
    })
    .await?;

    if let Err(err) = result {
        if vent_db::is_unique_violation(&err) {
            return Err(ApiError::Conflict("Email already registered.".into()));
        }
        return Err(err.into());
    }

    // Best-effort: the account stays committed even if this write fails
    notify::welcome(&state, user_id).await?;

    let jwt = token::issue(&state.config.jwt_secret, user_id, &email)?;
    let cookie = session_cookie(&jwt, state.config.secure_cookies);

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            user: UserSummary { id: user_id, email },
            message: "Registration successful".into(),
        }),
    )
        .into_response())
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Response> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required.".into(),
        ));
    }

    let email = req.email.trim().to_lowercase();

    let db = state.clone();
    let lookup = email.clone();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_email(&lookup))
        .await??
        // Unknown email and wrong password must be indistinguishable
        .ok_or(ApiError::Unauthorized)?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash unparseable: {e}")))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored user id unparseable: {e}")))?;

    let jwt = token::issue(&state.config.jwt_secret, user_id, &user.email)?;
    let cookie = session_cookie(&jwt, state.config.secure_cookies);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            user: UserSummary {
                id: user_id,
                email: user.email,
            },
            message: "Login successful".into(),
        }),
    )
        .into_response())
}

/// Never errors for "not logged in" — an anonymous caller just gets
/// `user: null`. An invalid token additionally gets its cookie cleared.
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let Some(raw) = cookie_value(&headers, AUTH_COOKIE) else {
        return Ok(Json(MeResponse { user: None }).into_response());
    };

    let Some(claims) = token::verify(&state.config.jwt_secret, raw) else {
        let cookie = clear_session_cookie(state.config.secure_cookies);
        return Ok((
            [(header::SET_COOKIE, cookie)],
            Json(MeResponse { user: None }),
        )
            .into_response());
    };

    let db = state.clone();
    let id = claims.sub.to_string();
    let row = tokio::task::spawn_blocking(move || db.db.get_user_by_id(&id)).await??;

    let user = match row {
        Some(row) => Some(MeUser {
            id: claims.sub,
            email: row.email,
            created_at: parse_timestamp(&row.created_at)?,
        }),
        None => None,
    };

    Ok(Json(MeResponse { user }).into_response())
}

/// Stateless sessions: there is nothing to revoke server-side, clearing the
/// cookie is the whole logout.
pub async fn logout(State(state): State<AppState>) -> ApiResult<Response> {
    let cookie = clear_session_cookie(state.config.secure_cookies);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "Logged out".into(),
        }),
    )
        .into_response())
}
