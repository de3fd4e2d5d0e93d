//! HTTP surface for the Stagepass ticketing pipeline.
//!
//! Hosts the four inbound seams from the specification:
//!
//! - `POST /api/checkout` — create a pending order and a hosted-checkout
//!   redirect;
//! - `POST /api/webhooks/gateway` — authenticated, idempotent payment and
//!   transfer notifications (raw bytes verified before parsing);
//! - `GET /api/payouts/balance`, `POST /api/payouts`,
//!   `POST /api/payouts/:id/resolve` — organizer withdrawals and their
//!   admin resolution;
//! - `POST /api/orders/:id/remind` — send-once abandoned-cart reminders.
//!
//! Caller identity arrives from the out-of-scope auth proxy as the
//! `X-Owner-Id` header; admin endpoints check `X-Admin-Token` in constant
//! time.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use routes::build_router;
pub use state::AppState;
