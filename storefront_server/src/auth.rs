//! Bearer-token authentication for the shopping API.
//!
//! Tokens are HS256 JWTs carrying the user id and role list. [`JwtClaims`] implements
//! [`FromRequest`], so any handler that takes a `JwtClaims` parameter is authenticated
//! automatically and rejects the request with a 401 before the handler body runs.

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use storefront_engine::db_types::Role;

use crate::{config::AuthConfig, errors::ServerError};

/// How long issued access tokens stay valid.
pub const TOKEN_LIFETIME: Duration = Duration::hours(24);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub user_id: i64,
    pub roles: Vec<Role>,
    /// Expiry as a unix timestamp. Checked by the validator on every request.
    pub exp: i64,
}

impl JwtClaims {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// The claims may act on the given user's records iff they belong to that user or carry
    /// the admin role.
    pub fn check_access_for(&self, user_id: i64) -> Result<(), ServerError> {
        if self.user_id == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(ServerError::InsufficientPermissions)
        }
    }

    pub fn require_admin(&self) -> Result<(), ServerError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ServerError::InsufficientPermissions)
        }
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let config = req
        .app_data::<web::Data<AuthConfig>>()
        .ok_or_else(|| ServerError::InitializeError("AuthConfig is not registered with the app".to_string()))?;
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ServerError::AuthenticationError("Missing Authorization header".to_string()))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ServerError::AuthenticationError("Authorization header is not a Bearer token".to_string()))?;
    let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
    let data = decode::<JwtClaims>(token, &key, &Validation::new(Algorithm::HS256))
        .map_err(|e| ServerError::AuthenticationError(format!("Invalid access token. {e}")))?;
    Ok(data.claims)
}

//--------------------------------------    TokenIssuer     ----------------------------------------------------------
/// Issues access tokens signed with the server's JWT secret.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    secret: sfg_common::Secret<String>,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { secret: config.jwt_secret.clone() }
    }

    pub fn issue(&self, user_id: i64, roles: Vec<Role>) -> Result<String, ServerError> {
        let claims = JwtClaims { user_id, roles, exp: (Utc::now() + TOKEN_LIFETIME).timestamp() };
        let key = EncodingKey::from_secret(self.secret.reveal().as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &key)
            .map_err(|e| ServerError::InitializeError(format!("Could not sign access token. {e}")))
    }
}
