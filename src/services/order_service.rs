use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    dto::order_dto::OrderRequest,
    error::{Error, Result},
    models::{order::Order, user::User},
    repositories::{OrderRepository, UserRepository},
    services::{account_service::AccountService, tap_bank_service::TapBankService},
};

#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub order: Order,
    pub gateway_response: JsonValue,
}

#[derive(Clone)]
pub struct OrderService {
    pool: PgPool,
    accounts: AccountService,
    gateway: TapBankService,
}

impl OrderService {
    pub fn new(pool: PgPool, accounts: AccountService, gateway: TapBankService) -> Self {
        Self {
            pool,
            accounts,
            gateway,
        }
    }

    /// Debits locally, then registers the order with the provider.
    ///
    /// The provider call happens after commit. If it fails the caller gets the
    /// gateway error but the order row and the debit stay in place.
    pub async fn create_order(&self, current_user: &User, request: &OrderRequest) -> Result<CreatedOrder> {
        let order = self.place_order(current_user.id, request.amount).await?;

        let gateway_response = self
            .gateway
            .sync_order(&order, current_user, &request.currency, &request.payment)
            .await
            .map_err(|e| {
                error!(
                    order_id = %order.id,
                    user_id = %current_user.id,
                    error = %e,
                    "Tap Bank sync failed after local debit"
                );
                e
            })?;

        Ok(CreatedOrder {
            order,
            gateway_response,
        })
    }

    /// Balance check, order insert and debit in one transaction. The user row
    /// is locked first, so concurrent orders for one user are serialized.
    pub async fn place_order(&self, user_id: Uuid, amount: Decimal) -> Result<Order> {
        validate_amount(amount)?;

        let mut tx = self.pool.begin().await?;

        let user = UserRepository::get_one_for_update(&mut *tx, user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("User {} not found.", user_id)))?;

        if user.balance < amount {
            return Err(Error::InsufficientBalance);
        }

        let order = OrderRepository::create(&mut *tx, user.id, amount).await?;
        let debited = self.accounts.debit(&mut tx, user.id, amount).await?;

        tx.commit().await?;

        info!(
            order_id = %order.id,
            user_id = %user.id,
            amount = %amount,
            balance = %debited.balance,
            "Order created"
        );
        Ok(order)
    }

    pub async fn list_orders(&self, user_id: Uuid) -> Result<Vec<Order>> {
        Ok(OrderRepository::list_by_user(&self.pool, user_id).await?)
    }
}

/// The provider only takes whole currency units, so the local debit must be
/// whole too or the ledger and the provider would disagree.
pub fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::BadRequest("Order amount must be positive".to_string()));
    }
    if !amount.fract().is_zero() {
        return Err(Error::BadRequest(
            "Order amount must be a whole number of currency units".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_must_be_positive() {
        assert!(matches!(validate_amount(Decimal::ZERO), Err(Error::BadRequest(_))));
        assert!(matches!(
            validate_amount(Decimal::new(-5, 0)),
            Err(Error::BadRequest(_))
        ));
        assert!(validate_amount(Decimal::new(10, 0)).is_ok());
    }

    #[test]
    fn fractional_amounts_are_rejected() {
        for amount in [Decimal::new(50, 2), Decimal::new(1099, 2), Decimal::new(10001, 3)] {
            assert!(
                matches!(validate_amount(amount), Err(Error::BadRequest(_))),
                "{}",
                amount
            );
        }
        // 10.00 carries a scale but no fraction
        assert!(validate_amount(Decimal::new(1000, 2)).is_ok());
        assert!(validate_amount(Decimal::ONE).is_ok());
    }
}
