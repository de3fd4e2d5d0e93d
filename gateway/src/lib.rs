//! Payment Gateway Adapter.
//!
//! Implements the [`stagepass_core::gateway::GatewayClient`] seam against an
//! external hosted-checkout processor, and authenticates its inbound
//! webhooks:
//!
//! - [`http::HttpGateway`] — checkout-session and transfer calls over HTTPS,
//!   idempotency-keyed by the references embedded in orders/payouts, with
//!   exponential backoff on transient transport failures.
//! - [`webhook::WebhookVerifier`] — HMAC-SHA-512 over the exact raw request
//!   bytes, compared in constant time, rejecting before anything is parsed.
//! - [`webhook::GatewayEvent`] — strict tagged decoding of the known event
//!   types with an explicit `Unknown` variant.

pub mod http;
pub mod retry;
pub mod webhook;

pub use http::HttpGateway;
pub use retry::RetryPolicy;
pub use webhook::{GatewayEvent, WebhookVerifier};
