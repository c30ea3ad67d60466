use crate::core::errors::SantaError;
use crate::core::session::{Language, Session};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

const TOKEN_TTL_SECS: u64 = 3600;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // actor id issued by the identity provider
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>, // persisted language preference
}

impl Claims {
    /// Builds the caller's session from the token and the request locale.
    pub fn session(&self, environment_locale: Option<&str>, default: Language) -> Session {
        Session::initialize(
            Some(self.sub.clone()),
            self.lang.as_deref(),
            environment_locale,
            default,
        )
    }
}

/// Turns bearer tokens into actor ids. Issuing is only used by tooling and
/// tests; production tokens come from the identity provider.
pub struct JwtService {
    secret: String,
}

impl JwtService {
    pub fn new(secret: String) -> Self {
        JwtService { secret }
    }

    pub fn generate_token(&self, user_id: &str, language: Option<Language>) -> Result<String, SantaError> {
        let expiration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| (d.as_secs() + TOKEN_TTL_SECS) as usize)
            .map_err(|e| SantaError::InternalServerError(format!("Time error: {}", e)))?;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiration,
            lang: language.map(|l| l.as_str().to_string()),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| SantaError::InternalServerError(format!("JWT encoding error: {}", e)))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, SantaError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            SantaError::InvalidCredentials
        })?;

        if token_data.claims.sub.trim().is_empty() {
            return Err(SantaError::MissingActor);
        }
        Ok(token_data.claims)
    }
}
