//! Servicio JWT
//!
//! Emite y valida los tokens HS256 del proveedor de identidad local.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::models::auth::{Claims, IssuedToken};
use crate::utils::errors::{AppError, AppResult};

/// Configuración JWT
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub access_token_duration: Duration,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, expiration_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            algorithm: Algorithm::HS256,
            access_token_duration: Duration::seconds(expiration_secs as i64),
        }
    }
}

/// Servicio JWT
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Genera un token de acceso para una cuenta
    pub fn generate_access_token(&self, account_id: Uuid, email: &str) -> AppResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + self.config.access_token_duration;

        let claims = Claims {
            sub: account_id.to_string(),
            email: email.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(self.config.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::Jwt(format!("Error generating access token: {}", e)))?;

        Ok(IssuedToken {
            token,
            token_type: "Bearer".to_string(),
            expires_at,
            account_id,
        })
    }

    /// Valida y decodifica un token
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(self.config.algorithm);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_validates_back_to_account() {
        let service = JwtService::new(JwtConfig::new("test-secret", 3600));
        let id = Uuid::new_v4();
        let issued = service.generate_access_token(id, "a@example.com").unwrap();

        let claims = service.validate_token(&issued.token).unwrap();
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.email, "a@example.com");
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let issuer = JwtService::new(JwtConfig::new("secret-a", 3600));
        let verifier = JwtService::new(JwtConfig::new("secret-b", 3600));
        let issued = issuer.generate_access_token(Uuid::new_v4(), "a@example.com").unwrap();

        assert!(matches!(
            verifier.validate_token(&issued.token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        let service = JwtService::new(JwtConfig::new("s", 60));
        assert!(service.validate_token("not-a-jwt").is_err());
    }
}
