//! Domain core for the Stagepass ticketing pipeline.
//!
//! This crate holds everything that must stay true regardless of transport or
//! storage backend: the data model, the error taxonomy, the store and gateway
//! seams, and the four services that make up the money path:
//!
//! - [`orders::OrderManager`] — creates pending orders against a quoted price
//!   and absorbs duplicate payment confirmations.
//! - [`tickets::TicketIssuer`] — issues tickets exactly once per paid order
//!   and is the only caller of the inventory ledger's reserve/release.
//! - [`payouts::PayoutLedger`] — computes available balances and reserves
//!   withdrawals against them without overdraw.
//! - [`notify::Dispatcher`] — fires user-visible side effects strictly after
//!   the owning state change committed.
//!
//! All cross-request coordination is pushed into the store traits: every
//! invariant (no oversell, no double-issue, no overdraw) is expressed as a
//! single conditional update or a serialized check-then-insert, never as
//! read-then-write in application code.

pub mod error;
pub mod gateway;
pub mod notify;
pub mod orders;
pub mod payouts;
pub mod store;
pub mod tickets;
pub mod types;

pub use error::{Error, Result};
