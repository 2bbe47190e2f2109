use rust_decimal::Decimal;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::user::{NewUser, User};

pub struct UserRepository;

impl UserRepository {
    pub async fn get_one<'e, E>(executor: E, id: Uuid) -> sqlx::Result<Option<User>>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, hashed_password, is_superuser, first_name, last_name,
                   phone, email, balance, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Row-locks the user until the surrounding transaction ends. Concurrent
    /// balance mutations for the same user queue up behind this lock.
    pub async fn get_one_for_update<'e, E>(executor: E, id: Uuid) -> sqlx::Result<Option<User>>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, hashed_password, is_superuser, first_name, last_name,
                   phone, email, balance, created_at
            FROM users
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn get_one_by_username<'e, E>(
        executor: E,
        username: &str,
    ) -> sqlx::Result<Option<User>>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, hashed_password, is_superuser, first_name, last_name,
                   phone, email, balance, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(executor)
        .await
    }

    pub async fn create<'e, E>(executor: E, new_user: &NewUser) -> sqlx::Result<User>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, hashed_password, first_name, last_name, phone, email)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, username, hashed_password, is_superuser, first_name, last_name,
                      phone, email, balance, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.hashed_password)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.phone)
        .bind(&new_user.email)
        .fetch_one(executor)
        .await
    }

    pub async fn set_superuser_status_by_id<'e, E>(
        executor: E,
        id: Uuid,
        status: bool,
    ) -> sqlx::Result<Option<User>>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_superuser = $1
            WHERE id = $2
            RETURNING id, username, hashed_password, is_superuser, first_name, last_name,
                      phone, email, balance, created_at
            "#,
        )
        .bind(status)
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn set_superuser_status_by_username<'e, E>(
        executor: E,
        username: &str,
        status: bool,
    ) -> sqlx::Result<Option<User>>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_superuser = $1
            WHERE username = $2
            RETURNING id, username, hashed_password, is_superuser, first_name, last_name,
                      phone, email, balance, created_at
            "#,
        )
        .bind(status)
        .bind(username)
        .fetch_optional(executor)
        .await
    }

    /// Fails with a check violation (SQLSTATE 23514) if the balance would go
    /// below zero, and with `RowNotFound` if the user does not exist.
    pub async fn debit<'e, E>(executor: E, id: Uuid, amount: Decimal) -> sqlx::Result<User>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET balance = balance - $1
            WHERE id = $2
            RETURNING id, username, hashed_password, is_superuser, first_name, last_name,
                      phone, email, balance, created_at
            "#,
        )
        .bind(amount)
        .bind(id)
        .fetch_one(executor)
        .await
    }
}
