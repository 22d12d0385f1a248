use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use uuid::Uuid;

use crate::auth::{AUTH_COOKIE, AppState};
use crate::error::ApiError;
use crate::token;

/// The authenticated caller, resolved from the session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
}

/// Extractor that requires a valid session. Fails closed with 401 when the
/// cookie is absent, malformed, forged, or expired.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = cookie_value(&parts.headers, AUTH_COOKIE).ok_or(ApiError::Unauthorized)?;
        let claims =
            token::verify(&state.config.jwt_secret, raw).ok_or(ApiError::Unauthorized)?;

        Ok(CurrentUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}

/// Optional caller — an absent or invalid session yields `None` instead of
/// 401. Used where anonymous viewers are first-class (the feed, `me`).
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(_) => Ok(MaybeUser(None)),
        }
    }
}

pub(crate) fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name { Some(val) } else { None }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_value_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("other=1; authToken=abc.def.ghi; more=2"),
        );

        assert_eq!(cookie_value(&headers, "authToken"), Some("abc.def.ghi"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn cookie_value_handles_absent_header() {
        let headers = HeaderMap::new();
        assert_eq!(cookie_value(&headers, "authToken"), None);
    }
}
