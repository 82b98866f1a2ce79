/// Principal resolver - who is making this request
///
/// A token may arrive in the `Authorization: Bearer` header or, on routes
/// that allow it, in a `token` query parameter (media elements and
/// EventSource cannot set headers). Both carriers go through the same
/// verifier, so a query token is never trusted more than a header token.
use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::web;
use serde::Deserialize;
use uuid::Uuid;
use video_core::{Principal, Role};

use crate::error::{AppError, Result};

/// Where a route accepts its token from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCarriers {
    HeaderOnly,
    /// Header first; the query parameter is consulted only without a header
    HeaderOrQuery,
}

/// Checks a raw token and yields the principal it names
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Principal>;
}

/// RS256 verification through the process-wide keys in `crypto_core::jwt`
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtVerifier;

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Principal> {
        let claims = crypto_core::jwt::validate_token(token)
            .map_err(|e| AppError::InvalidToken(e.to_string()))?
            .claims;

        if claims.token_type != crypto_core::jwt::ACCESS_TOKEN_TYPE {
            return Err(AppError::InvalidToken(format!(
                "unexpected token type {}",
                claims.token_type
            )));
        }

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::InvalidToken("subject is not a user id".to_string()))?;
        let role = Role::from_str(&claims.role)
            .ok_or_else(|| AppError::InvalidToken(format!("unknown role {}", claims.role)))?;

        Ok(Principal::new(user_id, role))
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Pull the raw token out of whichever carrier supplied it.
///
/// `Ok(None)` means no carrier supplied anything. A header that is present but
/// unusable is an invalid token, not a missing one, and does not fall through
/// to the query.
pub fn extract_token(
    headers: &HeaderMap,
    query_string: &str,
    carriers: TokenCarriers,
) -> Result<Option<String>> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| AppError::InvalidToken("malformed Authorization header".to_string()))?;
        // Scheme names are case-insensitive
        let token = value
            .split_once(' ')
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("Bearer"))
            .map(|(_, token)| token.trim())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::InvalidToken("expected a Bearer token".to_string()))?;
        return Ok(Some(token.to_string()));
    }

    if carriers == TokenCarriers::HeaderOrQuery {
        let token = web::Query::<TokenQuery>::from_query(query_string)
            .ok()
            .and_then(|q| q.into_inner().token)
            .filter(|t| !t.is_empty());
        return Ok(token);
    }

    Ok(None)
}

/// Resolve the request's principal, or fail with 401.
pub fn resolve_principal(
    headers: &HeaderMap,
    query_string: &str,
    carriers: TokenCarriers,
    verifier: &dyn TokenVerifier,
) -> Result<Principal> {
    let token = extract_token(headers, query_string, carriers)?.ok_or(AppError::Unauthenticated)?;
    verifier.verify(&token)
}
