//! HTTPS client for the payment gateway.
//!
//! Two outbound calls exist: hosted-checkout initialization and transfer
//! initiation. Both carry a locally generated reference embedding the
//! order/payout id, which the gateway treats as an idempotency key — a
//! retried call can never create a duplicate gateway-side transaction.
//!
//! Transport failures (connect errors, timeouts) are retried with
//! exponential backoff; an HTTP rejection from the gateway is final and
//! surfaces as [`Error::UpstreamGateway`].

use crate::retry::RetryPolicy;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use stagepass_core::gateway::{CheckoutSession, GatewayClient, TransferReceipt};
use stagepass_core::types::{Order, PayoutRequest};
use stagepass_core::{Error, Result};
use std::time::Duration;
use uuid::Uuid;

/// Gateway client over HTTPS.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct InitializeRequest<'a> {
    reference: &'a str,
    amount: u64,
    currency: &'a str,
    email: &'a str,
    metadata: InitializeMetadata,
}

#[derive(Serialize)]
struct InitializeMetadata {
    order_id: Uuid,
}

#[derive(serde::Deserialize)]
struct InitializeResponse {
    data: InitializeData,
}

#[derive(serde::Deserialize)]
struct InitializeData {
    authorization_url: String,
}

#[derive(Serialize)]
struct TransferRequest<'a> {
    reference: &'a str,
    amount: u64,
    currency: &'a str,
    recipient: Uuid,
}

#[derive(serde::Deserialize)]
struct TransferResponse {
    data: TransferData,
}

#[derive(serde::Deserialize)]
struct TransferData {
    transfer_code: String,
}

impl HttpGateway {
    /// Create a client for the gateway at `base_url`, authenticating with
    /// the platform's secret key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UpstreamGateway`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| Error::gateway(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            secret_key: secret_key.into(),
            retry: RetryPolicy::default(),
        })
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let mut attempt = 0;
        loop {
            let sent = self
                .client
                .post(&url)
                .bearer_auth(&self.secret_key)
                .json(body)
                .send()
                .await;
            match sent {
                Ok(response) if response.status().is_success() => {
                    return response.json::<T>().await.map_err(|err| {
                        Error::gateway(format!("malformed gateway response: {err}"))
                    });
                }
                Ok(response) => {
                    // The gateway answered; its verdict is final.
                    let status = response.status();
                    let detail = response.text().await.unwrap_or_default();
                    return Err(Error::gateway(format!(
                        "gateway rejected {path}: {status} {detail}"
                    )));
                }
                Err(err) if is_transient(&err) && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    attempt += 1;
                    tracing::warn!(
                        path,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        %err,
                        "transient gateway failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    return Err(Error::gateway(format!("gateway unreachable: {err}")));
                }
            }
        }
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

#[async_trait]
impl GatewayClient for HttpGateway {
    async fn create_checkout_session(&self, order: &Order) -> Result<CheckoutSession> {
        let request = InitializeRequest {
            reference: &order.payment_reference,
            amount: order.total_amount.minor(),
            currency: order.currency.as_str(),
            email: &order.buyer.email,
            metadata: InitializeMetadata { order_id: *order.id.as_uuid() },
        };
        let response: InitializeResponse = self.post("transaction/initialize", &request).await?;
        tracing::debug!(
            order_id = %order.id,
            reference = %order.payment_reference,
            "checkout session created"
        );
        Ok(CheckoutSession { redirect_url: response.data.authorization_url })
    }

    async fn initiate_transfer(&self, payout: &PayoutRequest) -> Result<TransferReceipt> {
        let request = TransferRequest {
            reference: &payout.reference,
            amount: payout.amount.minor(),
            currency: payout.currency.as_str(),
            recipient: *payout.owner_id.as_uuid(),
        };
        let response: TransferResponse = self.post("transfer", &request).await?;
        tracing::debug!(
            payout_id = %payout.id,
            reference = %payout.reference,
            transfer_code = %response.data.transfer_code,
            "transfer initiated"
        );
        Ok(TransferReceipt { gateway_reference: response.data.transfer_code })
    }
}
