//! Persistence for the account and order tables.
//!
//! Every function takes any Postgres executor, so the same query runs against
//! the pool or inside a caller-owned transaction (`&mut *tx`).

pub mod order_repository;
pub mod user_repository;

pub use order_repository::OrderRepository;
pub use user_repository::UserRepository;
