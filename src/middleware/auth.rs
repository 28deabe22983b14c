use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{validate_jwt, AuthError};
use crate::database::UserRepository;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller, resolved from a bearer token and the user store
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
}

impl std::fmt::Display for AuthUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.username)
    }
}

/// JWT authentication middleware.
///
/// Validates the bearer token, confirms the user still exists, and injects
/// `AuthUser` into the request extensions. The same value is copied onto the
/// response so outer layers can report who made the request.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = authenticate(&state, request.headers()).await.map_err(|e| {
        tracing::debug!("Authentication failed: {}", e);
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(auth_user.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(auth_user);
    Ok(response)
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
    let token = extract_bearer_token(headers)?;
    let claims = validate_jwt(token, &state.config.security)?;

    let user = state
        .store
        .user_by_id(claims.sub)
        .await
        .map_err(|e| {
            tracing::error!("User lookup failed during authentication: {}", e);
            AuthError::UnknownUser
        })?
        .ok_or(AuthError::UnknownUser)?;

    Ok(AuthUser {
        user_id: user.id,
        username: user.username,
    })
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err(AuthError::MissingCredentials),
        None => Err(AuthError::MalformedHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        let h = headers("Bearer abc.def.ghi");
        assert_eq!(extract_bearer_token(&h).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn rejects_missing_and_malformed_headers() {
        assert!(matches!(
            extract_bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            extract_bearer_token(&headers("Basic dXNlcjpwYXNz")),
            Err(AuthError::MalformedHeader)
        ));
        assert!(matches!(
            extract_bearer_token(&headers("Bearer   ")),
            Err(AuthError::MissingCredentials)
        ));
    }
}
