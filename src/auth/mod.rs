use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::config::config_loader;

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub exp: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerClaims {
    pub sub: String,
    pub exp: usize,
}

/// Staff caller identified by an HS256 token signed with the admin secret.
/// Holding a valid token is necessary but not sufficient; routers still run
/// the subject through the admin registry.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub subject: String,
}

/// Customer caller identified by an HS256 token signed with the customer
/// secret. `customer_id` is the chat platform user id.
#[derive(Debug, Clone)]
pub struct CustomerUser {
    pub customer_id: String,
}

pub fn validate_admin_jwt(token: &str) -> Result<AdminClaims, anyhow::Error> {
    let secret = config_loader::get_admin_secret()?;
    decode_hs256::<AdminClaims>(token, &secret.secret)
}

pub fn validate_customer_jwt(token: &str) -> Result<CustomerClaims, anyhow::Error> {
    let secret = config_loader::get_customer_secret()?;
    decode_hs256::<CustomerClaims>(token, &secret.secret)
}

fn decode_hs256<C: serde::de::DeserializeOwned>(
    token: &str,
    secret: &str,
) -> Result<C, anyhow::Error> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<C>(token, &decoding_key, &validation)
        .map_err(|e| anyhow::anyhow!("JWT validation failed: {}", e))?;

    Ok(token_data.claims)
}

fn bearer_token(parts: &Parts) -> Result<&str, (StatusCode, String)> {
    let auth_header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing Authorization header".to_string(),
        ))?;

    let auth_str = auth_header.to_str().map_err(|_| {
        (
            StatusCode::UNAUTHORIZED,
            "Invalid Authorization header".to_string(),
        )
    })?;

    auth_str.strip_prefix("Bearer ").ok_or((
        StatusCode::UNAUTHORIZED,
        "Invalid Authorization header format".to_string(),
    ))
}

/// Either side of the auth split, for routes open to both. The admin arm is
/// tried first; a token that validates under neither secret is rejected.
#[derive(Debug, Clone)]
pub enum CallerIdentity {
    Admin(AdminUser),
    Customer(CustomerUser),
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        if let Ok(claims) = validate_admin_jwt(token) {
            return Ok(CallerIdentity::Admin(AdminUser {
                subject: claims.sub,
            }));
        }

        let claims = validate_customer_jwt(token)
            .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

        Ok(CallerIdentity::Customer(CustomerUser {
            customer_id: claims.sub,
        }))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let claims = validate_admin_jwt(token)
            .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

        Ok(AdminUser {
            subject: claims.sub,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CustomerUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let claims = validate_customer_jwt(token)
            .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

        Ok(CustomerUser {
            customer_id: claims.sub,
        })
    }
}
