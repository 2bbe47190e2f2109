use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::auth_dto::RegisterRequest,
    error::{pg_error_code, Error, Result, PG_CHECK_VIOLATION, PG_UNIQUE_VIOLATION},
    models::user::{NewUser, User},
    repositories::UserRepository,
    services::token_service::{TokenKind, TokenPair, TokenService},
    utils::crypto::{hash_password_blocking, verify_dummy_password_blocking, verify_password_blocking},
};

#[derive(Clone)]
pub struct AccountService {
    pool: PgPool,
    tokens: TokenService,
}

impl AccountService {
    pub fn new(pool: PgPool, tokens: TokenService) -> Self {
        Self { pool, tokens }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(UserRepository::get_one(&self.pool, id).await?)
    }

    /// The lookup is only a fast path; the unique constraint on `username`
    /// is what rejects a concurrent duplicate.
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        if UserRepository::get_one_by_username(&self.pool, &request.username)
            .await?
            .is_some()
        {
            return Err(Error::UsernameTaken);
        }

        let new_user = NewUser {
            hashed_password: hash_password_blocking(request.password).await?,
            username: request.username,
            first_name: request.first_name,
            last_name: request.last_name,
            phone: request.phone,
            email: request.email,
        };

        let user = match UserRepository::create(&self.pool, &new_user).await {
            Ok(user) => user,
            Err(e) if pg_error_code(&e).as_deref() == Some(PG_UNIQUE_VIOLATION) => {
                return Err(Error::UsernameTaken)
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    /// Unknown usernames and wrong passwords produce the same error and cost
    /// the same Argon2 work.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<TokenPair> {
        let Some(user) = UserRepository::get_one_by_username(&self.pool, username).await? else {
            verify_dummy_password_blocking(password.to_string()).await?;
            warn!(username = %username, "Authorization failed");
            return Err(Error::InvalidCredentials);
        };

        let valid =
            verify_password_blocking(password.to_string(), user.hashed_password.clone()).await?;
        if !valid {
            warn!(username = %username, "Authorization failed");
            return Err(Error::InvalidCredentials);
        }

        self.tokens.issue_pair(user.id)
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let verified = self.tokens.verify(refresh_token)?;
        if verified.kind != TokenKind::Refresh {
            return Err(Error::InvalidToken);
        }
        let user = self
            .get_user(verified.subject_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("User {} not found.", verified.subject_id)))?;
        self.tokens.issue_pair(user.id)
    }

    pub async fn set_superuser(&self, actor: &User, target_id: Uuid, flag: bool) -> Result<User> {
        if actor.id == target_id {
            return Err(Error::SelfModificationForbidden);
        }

        let user = UserRepository::set_superuser_status_by_id(&self.pool, target_id, flag)
            .await?
            .ok_or_else(|| Error::NotFound(format!("User {} not found.", target_id)))?;

        info!(
            actor_id = %actor.id,
            target_id = %target_id,
            is_superuser = flag,
            "Superuser status changed"
        );
        Ok(user)
    }

    pub async fn set_superuser_by_username(&self, username: &str, flag: bool) -> Result<Option<User>> {
        Ok(UserRepository::set_superuser_status_by_username(&self.pool, username, flag).await?)
    }

    /// Runs on the caller's connection so it joins the caller's transaction.
    /// Callers are expected to hold the user's row lock and to have checked
    /// funds; the balance CHECK constraint is the last line.
    pub async fn debit(&self, conn: &mut PgConnection, user_id: Uuid, amount: Decimal) -> Result<User> {
        match UserRepository::debit(conn, user_id, amount).await {
            Ok(user) => Ok(user),
            Err(e) if pg_error_code(&e).as_deref() == Some(PG_CHECK_VIOLATION) => {
                Err(Error::InsufficientBalance)
            }
            Err(sqlx::Error::RowNotFound) => Err(Error::NotFound(format!("User {} not found.", user_id))),
            Err(e) => Err(e.into()),
        }
    }
}
