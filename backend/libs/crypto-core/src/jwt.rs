/// Shared JWT module for the video library services
///
/// Access tokens are RS256-signed. The same `validate_token` call backs every
/// token carrier (Authorization header, `token` query parameter), so a token
/// lifted out of a URL is held to exactly the same checks as a header token.
///
/// ## Security Design
///
/// - **RS256 ONLY**: No symmetric algorithms (HS256) to prevent confusion attacks
/// - **No hardcoded keys**: All keys loaded from environment variables
/// - **Thread-safe**: Keys loaded once at startup, immutable thereafter
///
/// ## Usage
///
/// ```rust,ignore
/// use crypto_core::jwt;
///
/// let public_key = std::env::var("JWT_PUBLIC_KEY_PEM")?;
/// jwt::initialize_jwt_validation_only(&public_key)?;
///
/// let data = jwt::validate_token(raw_token)?;
/// println!("user {} has role {}", data.claims.sub, data.claims.role);
/// ```
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

const ACCESS_TOKEN_EXPIRY_HOURS: i64 = 24;

const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

/// `token_type` claim carried by access tokens
pub const ACCESS_TOKEN_TYPE: &str = "access";

// ============================================================================
// Data Structures
// ============================================================================

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Account role at issue time ("Admin", "Editor" or "Viewer")
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token type, always "access" for tokens minted here
    pub token_type: String,
}

// ============================================================================
// Key Storage
// ============================================================================

static JWT_ENCODING_KEY: OnceCell<EncodingKey> = OnceCell::new();
static JWT_DECODING_KEY: OnceCell<DecodingKey> = OnceCell::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize both signing and verification keys from PEM strings.
///
/// Can only be called once per process.
pub fn initialize_jwt_keys(private_key_pem: &str, public_key_pem: &str) -> Result<()> {
    let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA private key: {e}"))?;

    let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA public key: {e}"))?;

    JWT_ENCODING_KEY
        .set(encoding_key)
        .map_err(|_| anyhow!("JWT encoding key already initialized"))?;

    JWT_DECODING_KEY
        .set(decoding_key)
        .map_err(|_| anyhow!("JWT decoding key already initialized"))?;

    Ok(())
}

/// Initialize the verification key only.
///
/// The library service never issues tokens, so this is what it calls at startup.
pub fn initialize_jwt_validation_only(public_key_pem: &str) -> Result<()> {
    let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA public key: {e}"))?;

    JWT_DECODING_KEY
        .set(decoding_key)
        .map_err(|_| anyhow!("JWT decoding key already initialized"))?;

    Ok(())
}

fn get_encoding_key() -> Result<&'static EncodingKey> {
    JWT_ENCODING_KEY.get().ok_or_else(|| {
        anyhow!("JWT keys not initialized. Call initialize_jwt_keys() during startup.")
    })
}

fn get_decoding_key() -> Result<&'static DecodingKey> {
    JWT_DECODING_KEY
        .get()
        .ok_or_else(|| anyhow!("JWT keys not initialized. Call initialize_jwt_keys() or initialize_jwt_validation_only() during startup."))
}

// ============================================================================
// Token Generation
// ============================================================================

/// Sign an arbitrary claim set with the installed private key
pub fn sign_claims(claims: &Claims) -> Result<String> {
    let encoding_key = get_encoding_key()?;
    encode(&Header::new(JWT_ALGORITHM), claims, encoding_key)
        .map_err(|e| anyhow!("Failed to sign token: {e}"))
}

/// Generate a new access token for `user_id` acting as `role`
pub fn generate_access_token(user_id: Uuid, role: &str) -> Result<String> {
    let now = Utc::now();
    let expiry = now + Duration::hours(ACCESS_TOKEN_EXPIRY_HOURS);

    sign_claims(&Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        iat: now.timestamp(),
        exp: expiry.timestamp(),
        token_type: ACCESS_TOKEN_TYPE.to_string(),
    })
}

// ============================================================================
// Token Validation
// ============================================================================

/// Validate and decode a JWT token
///
/// Verifies the RS256 signature and expiry. No fallback to weaker algorithms.
///
/// ## Errors
///
/// Returns error if the signature is invalid, the token is expired or
/// malformed, or keys were never initialized.
pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    let decoding_key = get_decoding_key()?;

    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;

    decode::<Claims>(token, decoding_key, &validation)
        .map_err(|e| anyhow!("Token validation failed: {e}"))
}

// ============================================================================
// Tests
// ============================================================================
