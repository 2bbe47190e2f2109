pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    account_service::AccountService, order_service::OrderService,
    tap_bank_service::TapBankService, token_service::TokenService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub account_service: AccountService,
    pub order_service: OrderService,
    pub tap_bank_service: TapBankService,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Result<Self> {
        let token_service = TokenService::from_config(&config.jwt)?;
        let tap_bank_service = TapBankService::new(&config.tap_bank)?;
        let account_service = AccountService::new(pool.clone(), token_service);
        let order_service =
            OrderService::new(pool.clone(), account_service.clone(), tap_bank_service.clone());

        Ok(Self {
            pool,
            account_service,
            order_service,
            tap_bank_service,
        })
    }
}
