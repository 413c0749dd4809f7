use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Identity resolved from a verified bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl AuthUser {
    /// Rejects a client-supplied user id that disagrees with the token.
    pub fn ensure_matches(&self, claimed: Option<Uuid>) -> Result<()> {
        match claimed {
            Some(id) if id != self.user_id => Err(Error::Forbidden(
                "user_id does not match the authenticated user".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

pub fn verify_token(token: &str, secret: &str) -> Result<AuthUser> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| Error::Unauthorized("Invalid or expired session".to_string()))?;

    let user_id = Uuid::parse_str(&data.claims.sub)
        .map_err(|_| Error::Unauthorized("Invalid or expired session".to_string()))?;
    Ok(AuthUser { user_id })
}

fn bearer_token(req: &Request) -> Result<&str> {
    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("Missing Authorization Token".to_string()))?;
    let value = header
        .to_str()
        .map_err(|_| Error::Unauthorized("Malformed Authorization header".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Unauthorized("Unsupported authorization scheme".to_string()))
}

pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let user = match bearer_token(&req).and_then(|t| verify_token(t, &state.config.jwt_secret)) {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };
    req.extensions_mut().insert(user);
    next.run(req).await
}
