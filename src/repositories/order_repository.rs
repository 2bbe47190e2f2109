use rust_decimal::Decimal;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::order::Order;

pub struct OrderRepository;

impl OrderRepository {
    pub async fn create<'e, E>(executor: E, user_id: Uuid, amount: Decimal) -> sqlx::Result<Order>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (id, user_id, amount)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, amount, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(amount)
        .fetch_one(executor)
        .await
    }

    pub async fn list_by_user<'e, E>(executor: E, user_id: Uuid) -> sqlx::Result<Vec<Order>>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, amount, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }

    pub async fn count_by_user<'e, E>(executor: E, user_id: Uuid) -> sqlx::Result<i64>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(executor)
            .await
    }
}
