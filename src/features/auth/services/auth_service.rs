use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sqlx::PgPool;
use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{AuthResponseDto, LoginRequestDto, RegisterRequestDto};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::models::User;
use crate::features::auth::services::TokenService;
use crate::modules::mailer::Mailer;
use crate::modules::metrics;

/// Service for registration, login and current-user lookup
pub struct AuthService {
    pool: PgPool,
    tokens: Arc<TokenService>,
    mailer: Arc<Mailer>,
}

impl AuthService {
    pub fn new(pool: PgPool, tokens: Arc<TokenService>, mailer: Arc<Mailer>) -> Self {
        Self {
            pool,
            tokens,
            mailer,
        }
    }

    /// Register a new user. The welcome e-mail is best-effort: a send
    /// failure is logged and the registration still succeeds.
    pub async fn register(&self, dto: RegisterRequestDto) -> Result<AuthResponseDto> {
        let email = dto.email.trim().to_lowercase();

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(dto.password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?
            .to_string();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, name, created_at
            "#,
        )
        .bind(&email)
        .bind(&password_hash)
        .bind(dto.name.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Email already registered".to_string())
            }
            _ => {
                tracing::error!("Failed to insert user: {:?}", e);
                AppError::Database(e)
            }
        })?;

        metrics::record_user_registration();
        tracing::info!(user_id = user.id, "User registered");

        if let Err(e) = self.mailer.send_welcome(&user.email, &user.name).await {
            tracing::warn!(user_id = user.id, error = %e, "Welcome email failed");
        }

        let token = self.tokens.generate(user.id, &user.email, &user.name)?;
        Ok(AuthResponseDto {
            token,
            user: user.into(),
        })
    }

    /// Login with email and password. Bad credentials are indistinguishable
    /// from an unknown email in the response.
    pub async fn login(&self, dto: LoginRequestDto) -> Result<AuthResponseDto> {
        let email = dto.email.trim().to_lowercase();

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch user by email: {:?}", e);
            AppError::Database(e)
        })?;

        let Some(user) = user else {
            metrics::record_user_login("failure");
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        };

        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| AppError::Internal(format!("Corrupt password hash: {}", e)))?;

        if Argon2::default()
            .verify_password(dto.password.as_bytes(), &parsed_hash)
            .is_err()
        {
            metrics::record_user_login("failure");
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        metrics::record_user_login("success");

        let token = self.tokens.generate(user.id, &user.email, &user.name)?;
        Ok(AuthResponseDto {
            token,
            user: user.into(),
        })
    }

    /// Fetch the current user's row for `GET /api/auth/me`
    pub async fn get_current_user(&self, user: AuthenticatedUser) -> Result<User> {
        let row = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch user: {:?}", e);
            AppError::Database(e)
        })?;

        row.ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
