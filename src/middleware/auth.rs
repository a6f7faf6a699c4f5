use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// The authenticated caller, passed explicitly into operations that need it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
}

pub fn decode_identity(token: &str, secret: &str) -> Option<Identity> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .ok()?;
    let user_id = Uuid::parse_str(&data.claims.sub).ok()?;
    Some(Identity { user_id })
}

pub fn issue_token(identity: Identity, secret: &str, ttl_secs: i64) -> Result<String> {
    let exp = (chrono::Utc::now() + chrono::Duration::seconds(ttl_secs)).timestamp();
    let claims = Claims {
        sub: identity.user_id.to_string(),
        exp: exp.max(0) as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
}

/// `Ok(None)` when there is no Authorization header at all.
fn bearer_token(req: &Request) -> std::result::Result<Option<&str>, Error> {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(Error::Unauthorized("bad_authorization".to_string()));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(Error::Unauthorized("unsupported_scheme".to_string()));
    };
    Ok(Some(token))
}

fn resolve_identity(req: &Request, secret: &str) -> std::result::Result<Option<Identity>, Error> {
    match bearer_token(req)? {
        None => Ok(None),
        Some(token) => decode_identity(token, secret)
            .map(Some)
            .ok_or_else(|| Error::Unauthorized("invalid_token".to_string())),
    }
}

pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match resolve_identity(&req, &state.config.jwt_secret) {
        Ok(Some(identity)) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Ok(None) => Error::Unauthorized("missing_authorization".to_string()).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Anonymous callers pass through; a token that is present must be valid.
pub async fn optional_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match resolve_identity(&req, &state.config.jwt_secret) {
        Ok(identity) => {
            if let Some(identity) = identity {
                req.extensions_mut().insert(identity);
            }
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}
