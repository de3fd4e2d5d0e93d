//! PostgreSQL implementations of the Stagepass store traits.
//!
//! One [`PgStore`] over a shared [`sqlx::PgPool`] implements every store
//! seam. All queries use the runtime `sqlx` API so the workspace builds
//! without a live database.
//!
//! Concurrency discipline:
//! - the `sold` counter moves only through single conditional `UPDATE`
//!   statements arbitrated by `rows_affected`;
//! - order payment and payout resolution are compare-and-swap updates on
//!   the status column;
//! - ticket issuance inserts inside one transaction, arbitrated by the
//!   `(order_id, seat_index)` uniqueness constraint;
//! - payout creation serializes per owner with a transaction-scoped
//!   advisory lock around the balance check and insert.

pub mod catalog;
pub mod inventory;
pub mod orders;
pub mod payouts;
pub mod pool;
pub mod store;
pub mod tickets;

pub use pool::connect;
pub use store::PgStore;
