//! Authentication service: password login and JWT issuance

use std::sync::Arc;

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::{Actor, AuditAction, AuditEvent, LoginInput, Role, User};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::audit::AuditSink;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub name: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

/// Public profile returned after login
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserProfile,
}

pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST).map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Decode and validate an access token.
pub fn decode_claims(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::InvalidToken,
    })
}

#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    audit: Arc<dyn AuditSink>,
    jwt_secret: String,
    access_token_expiry: i64,
}

impl AuthService {
    pub fn new(db: PgPool, audit: Arc<dyn AuditSink>, config: &Config) -> Self {
        Self {
            db,
            audit,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
        }
    }

    /// Authenticate with username and password.
    pub async fn login(
        &self,
        input: LoginInput,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> AppResult<AuthTokens> {
        input.validate()?;

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, role, password_hash, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(input.username.trim())
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        let valid = verify(&input.password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let tokens = self.generate_tokens(&user)?;

        let actor = Actor::new(user.id, user.name.clone(), user.role).with_origin(ip_address, user_agent);
        tracing::info!(user_id = %user.id, role = %user.role, "User logged in");
        self.audit
            .record(AuditEvent::by(
                &actor,
                AuditAction::Login,
                "users",
                format!("User logged in: {}", user.username),
            ))
            .await;

        Ok(tokens)
    }

    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        decode_claims(token, &self.jwt_secret)
    }

    fn generate_tokens(&self, user: &User) -> AppResult<AuthTokens> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            role: user.role,
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AuthTokens {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            user: UserProfile {
                id: user.id,
                name: user.name.clone(),
                username: user.username.clone(),
                role: user.role,
            },
        })
    }

    /// Create the first administrator when no users exist yet.
    pub async fn ensure_bootstrap_admin(&self, username: &str, password: &str) -> AppResult<bool> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        if existing > 0 {
            return Ok(false);
        }

        shared::validation::validate_new_password(Some(password))?;
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO users (id, name, username, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, NULL, $4, $5, $6, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind("Administrator")
        .bind(username)
        .bind(hash_password(password)?)
        .bind(Role::Admin)
        .bind(now)
        .execute(&self.db)
        .await?;

        tracing::info!(username = %username, "Bootstrap administrator created");
        Ok(true)
    }
}
