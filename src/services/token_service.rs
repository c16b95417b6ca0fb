// src/services/token_service.rs

use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{Claims, TokenType},
};

/// Emite e valida os tokens próprios da API (access + refresh).
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    algorithm: Algorithm,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenService {
    pub fn new(secret: String, algorithm: &str, access_minutes: i64, refresh_days: i64) -> anyhow::Result<Self> {
        let algorithm = Algorithm::from_str(algorithm)
            .map_err(|_| anyhow::anyhow!("JWT_ALGORITHM inválido: {}", algorithm))?;
        // Só algoritmos de segredo compartilhado fazem sentido aqui.
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            anyhow::bail!("JWT_ALGORITHM precisa ser HS256, HS384 ou HS512");
        }
        Ok(Self {
            secret,
            algorithm,
            access_ttl: Duration::minutes(access_minutes),
            refresh_ttl: Duration::days(refresh_days),
        })
    }

    /// Access carrega sub + email; refresh carrega só o sub.
    pub fn issue_pair(&self, user_id: Uuid, email: Option<&str>) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.sign(user_id, email, TokenType::Access)?,
            refresh_token: self.sign(user_id, None, TokenType::Refresh)?,
        })
    }

    fn sign(&self, user_id: Uuid, email: Option<&str>, token_type: TokenType) -> Result<String, AppError> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            sub: Some(user_id),
            email: email.map(str::to_string),
            token_type,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        Ok(encode(
            &Header::new(self.algorithm),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?)
    }

    /// Assinatura, validade e tipo. Qualquer falha é `InvalidToken`.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<(Uuid, Claims), AppError> {
        let validation = Validation::new(self.algorithm);
        let data = decode::<Claims>(token, &DecodingKey::from_secret(self.secret.as_ref()), &validation)
            .map_err(|_| AppError::InvalidToken)?;

        if data.claims.token_type != expected {
            return Err(AppError::InvalidToken);
        }
        let sub = data.claims.sub.ok_or(AppError::InvalidToken)?;
        Ok((sub, data.claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret".into(), "HS256", 30, 7).unwrap()
    }

    #[test]
    fn access_token_is_not_a_refresh_token() {
        let svc = service();
        let id = Uuid::new_v4();
        let pair = svc.issue_pair(id, Some("a@x.com")).unwrap();

        let (sub, claims) = svc.verify(&pair.access_token, TokenType::Access).unwrap();
        assert_eq!(sub, id);
        assert_eq!(claims.email.as_deref(), Some("a@x.com"));

        assert!(matches!(svc.verify(&pair.access_token, TokenType::Refresh), Err(AppError::InvalidToken)));
        let (_, refresh_claims) = svc.verify(&pair.refresh_token, TokenType::Refresh).unwrap();
        assert!(refresh_claims.email.is_none());
    }

    #[test]
    fn rejects_foreign_signature_and_expired_tokens() {
        let svc = service();
        let other = TokenService::new("other-secret".into(), "HS256", 30, 7).unwrap();
        let pair = other.issue_pair(Uuid::new_v4(), None).unwrap();
        assert!(svc.verify(&pair.access_token, TokenType::Access).is_err());

        let expired = TokenService::new("test-secret".into(), "HS256", -10, 7).unwrap();
        let pair = expired.issue_pair(Uuid::new_v4(), None).unwrap();
        assert!(matches!(svc.verify(&pair.access_token, TokenType::Access), Err(AppError::InvalidToken)));
    }

    #[test]
    fn token_without_subject_is_rejected() {
        let svc = service();
        let now = Utc::now().timestamp();
        let claims = Claims { sub: None, email: None, token_type: TokenType::Refresh, iat: now, exp: now + 600 };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-secret")).unwrap();
        assert!(matches!(svc.verify(&token, TokenType::Refresh), Err(AppError::InvalidToken)));
    }

    #[test]
    fn rejects_asymmetric_algorithm_config() {
        assert!(TokenService::new("s".into(), "RS256", 30, 7).is_err());
        assert!(TokenService::new("s".into(), "nope", 30, 7).is_err());
    }
}
