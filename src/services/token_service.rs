use std::str::FromStr;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::JwtConfig,
    error::{Error, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub subject_id: Uuid,
    pub kind: TokenKind,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and verifies stateless, asymmetrically signed JWTs.
///
/// There is no revocation: a token stays valid until `exp`.
#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(
        algorithm: Algorithm,
        private_pem: &[u8],
        public_pem: &[u8],
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self> {
        let key_error = |e: jsonwebtoken::errors::Error| Error::Config(format!("Invalid JWT key: {}", e));

        let (encoding_key, decoding_key) = match algorithm {
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => (
                EncodingKey::from_rsa_pem(private_pem).map_err(key_error)?,
                DecodingKey::from_rsa_pem(public_pem).map_err(key_error)?,
            ),
            Algorithm::ES256 | Algorithm::ES384 => (
                EncodingKey::from_ec_pem(private_pem).map_err(key_error)?,
                DecodingKey::from_ec_pem(public_pem).map_err(key_error)?,
            ),
            Algorithm::EdDSA => (
                EncodingKey::from_ed_pem(private_pem).map_err(key_error)?,
                DecodingKey::from_ed_pem(public_pem).map_err(key_error)?,
            ),
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                return Err(Error::Config(format!(
                    "JWT_ALGORITHM {:?} is symmetric; an asymmetric key pair is required",
                    algorithm
                )))
            }
        };

        if access_ttl <= Duration::zero() || refresh_ttl <= Duration::zero() {
            return Err(Error::Config("Token lifetimes must be positive".to_string()));
        }

        Ok(Self {
            algorithm,
            encoding_key,
            decoding_key,
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn from_config(config: &JwtConfig) -> Result<Self> {
        let algorithm = Algorithm::from_str(config.algorithm.trim()).map_err(|_| {
            Error::Config(format!("Unsupported JWT_ALGORITHM: {}", config.algorithm))
        })?;
        let private_pem = read_key(&config.private_key_path)?;
        let public_pem = read_key(&config.public_key_path)?;

        Self::new(
            algorithm,
            &private_pem,
            &public_pem,
            Duration::minutes(config.access_token_expire_minutes),
            Duration::minutes(config.refresh_token_expire_minutes),
        )
    }

    pub fn lifetime(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    pub fn issue(&self, kind: TokenKind, subject_id: Uuid) -> Result<String> {
        self.issue_at(kind, subject_id, Utc::now())
    }

    pub fn issue_at(&self, kind: TokenKind, subject_id: Uuid, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            sub: subject_id.to_string(),
            kind,
            iat: now.timestamp(),
            exp: (now + self.lifetime(kind)).timestamp(),
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)?;
        Ok(token)
    }

    pub fn issue_pair(&self, subject_id: Uuid) -> Result<TokenPair> {
        let now = Utc::now();
        Ok(TokenPair {
            access_token: self.issue_at(TokenKind::Access, subject_id, now)?,
            refresh_token: self.issue_at(TokenKind::Refresh, subject_id, now)?,
        })
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedToken> {
        self.verify_at(token, Utc::now())
    }

    /// Expiry is checked here rather than by `jsonwebtoken` so the boundary is
    /// exact: a token is rejected at `exp` itself, with no leeway.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedToken> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| Error::InvalidToken)?
            .claims;

        if now.timestamp() >= claims.exp {
            return Err(Error::ExpiredToken);
        }

        let subject_id = Uuid::parse_str(&claims.sub).map_err(|_| Error::InvalidToken)?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(Error::InvalidToken)?;

        Ok(VerifiedToken {
            subject_id,
            kind: claims.kind,
            expires_at,
        })
    }
}

fn read_key(path: &std::path::Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| Error::Config(format!("Cannot read key file {}: {}", path.display(), e)))
}
