use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared_error::AppError;
use uuid::Uuid;

/// JWT Claims for access and refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,

    /// Building the user is scoped to. `None` for super_admin, who isn't
    /// bound to a single building.
    pub building_id: Option<Uuid>,

    /// User role
    pub role: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Token type: "access" or "refresh"
    pub token_type: String,
}

impl Claims {
    /// Create new access token claims
    pub fn new_access(
        user_id: Uuid,
        building_id: Option<Uuid>,
        role: String,
        expiration: i64,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id,
            building_id,
            role,
            iat: now,
            exp: now + expiration,
            token_type: "access".to_string(),
        }
    }

    /// Create new refresh token claims
    pub fn new_refresh(
        user_id: Uuid,
        building_id: Option<Uuid>,
        role: String,
        expiration: i64,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id,
            building_id,
            role,
            iat: now,
            exp: now + expiration,
            token_type: "refresh".to_string(),
        }
    }

    pub fn is_refresh(&self) -> bool {
        self.token_type == "refresh"
    }

    pub fn is_access(&self) -> bool {
        self.token_type == "access"
    }
}

/// Encode claims into a JWT token
pub fn encode_jwt(claims: &Claims, secret: &str) -> Result<String, AppError> {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| AppError::Internal(format!("failed to encode JWT: {}", e)))
}

/// Decode and validate a JWT token
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| AppError::Authentication(format!("invalid token: {}", e)))
}
