//! HTTP handlers, one module per surface.

pub mod checkout;
pub mod health;
pub mod orders;
pub mod payouts;
pub mod webhooks;
