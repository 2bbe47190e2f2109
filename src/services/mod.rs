pub mod account_service;
pub mod order_service;
pub mod tap_bank_service;
pub mod token_service;
