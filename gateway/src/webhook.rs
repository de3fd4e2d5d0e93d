//! Webhook authentication and event decoding.
//!
//! Inbound webhook deliveries are untrusted, possibly duplicated, possibly
//! out of order. Nothing in the payload may be believed before the
//! signature check passes: the verifier recomputes an HMAC-SHA-512 over the
//! *exact raw bytes* of the request body and compares it to the signature
//! header in constant time. A missing or malformed header rejects the same
//! way a wrong signature does.
//!
//! The payload itself is decoded into a closed set of known event-type
//! variants, with an explicit [`GatewayEvent::Unknown`] for everything the
//! gateway may add later — unknown events are acknowledged without side
//! effects, never guessed at.

use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha512;
use stagepass_core::gateway::order_id_from_reference;
use stagepass_core::types::OrderId;
use stagepass_core::{Error, Result};
use uuid::Uuid;

type HmacSha512 = Hmac<Sha512>;

/// HTTP header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-gateway-signature";

/// Authenticates webhook payloads against the shared secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Vec<u8>,
}

impl WebhookVerifier {
    /// Create a verifier for the given shared secret.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self { secret: secret.into() }
    }

    /// Verify a signature over the raw request body.
    ///
    /// # Errors
    ///
    /// [`Error::Authentication`] if the header is missing or the signature
    /// does not match. The payload must not be parsed before this returns
    /// `Ok`.
    pub fn verify(&self, raw_body: &[u8], signature: Option<&str>) -> Result<()> {
        let provided = signature
            .ok_or_else(|| Error::authentication("missing signature header"))?;
        let expected = self.sign(raw_body)?;
        if !constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
            return Err(Error::authentication("signature mismatch"));
        }
        Ok(())
    }

    /// Hex-encoded HMAC-SHA-512 of a payload under the shared secret.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] if the secret is unusable as an
    /// HMAC key.
    pub fn sign(&self, raw_body: &[u8]) -> Result<String> {
        let mut mac = HmacSha512::new_from_slice(&self.secret)
            .map_err(|_| Error::authentication("invalid webhook secret"))?;
        mac.update(raw_body);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

/// Opaque metadata we attached when initializing the checkout session; it
/// round-trips through the gateway.
#[derive(Clone, Debug, Deserialize)]
pub struct ChargeMetadata {
    /// The order this charge pays for
    pub order_id: Option<Uuid>,
}

/// Charge fields of a `charge.success` event.
#[derive(Clone, Debug, Deserialize)]
pub struct ChargeData {
    /// Gateway-side transaction identifier
    pub id: Option<i64>,
    /// Our payment reference, round-tripped
    pub reference: String,
    /// Charged amount in minor units
    pub amount: Option<u64>,
    /// Metadata embedded at session initialization
    pub metadata: Option<ChargeMetadata>,
}

impl ChargeData {
    /// The order this charge belongs to: the metadata id when present,
    /// otherwise recovered from the embedded reference.
    #[must_use]
    pub fn order_id(&self) -> Option<OrderId> {
        self.metadata
            .as_ref()
            .and_then(|meta| meta.order_id)
            .map(OrderId::from_uuid)
            .or_else(|| order_id_from_reference(&self.reference))
    }

    /// Gateway-side reference for the audit trail.
    #[must_use]
    pub fn gateway_reference(&self) -> String {
        self.id
            .map_or_else(|| self.reference.clone(), |id| id.to_string())
    }
}

/// Transfer fields of a `transfer.*` event.
#[derive(Clone, Debug, Deserialize)]
pub struct TransferData {
    /// Our transfer reference, round-tripped
    pub reference: String,
}

/// The closed set of gateway webhook events this system reacts to.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "event")]
pub enum GatewayEvent {
    /// A checkout charge succeeded; the order it references is paid.
    #[serde(rename = "charge.success")]
    ChargeSucceeded {
        /// Charge payload
        data: ChargeData,
    },
    /// A payout transfer settled.
    #[serde(rename = "transfer.success")]
    TransferSucceeded {
        /// Transfer payload
        data: TransferData,
    },
    /// A payout transfer failed after being accepted.
    #[serde(rename = "transfer.failed")]
    TransferFailed {
        /// Transfer payload
        data: TransferData,
    },
    /// Any event type this system does not handle; acknowledged without
    /// side effects.
    #[serde(other)]
    Unknown,
}

impl GatewayEvent {
    /// Decode an authenticated payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the body is not a well-formed event
    /// envelope. Unrecognized event *types* are not an error — they decode
    /// to [`GatewayEvent::Unknown`].
    pub fn parse(raw_body: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw_body)
            .map_err(|err| Error::validation(format!("malformed webhook payload: {err}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use stagepass_core::gateway::order_reference;

    const SECRET: &[u8] = b"whsec_test_secret";

    #[test]
    fn verifies_a_correctly_signed_payload() {
        let verifier = WebhookVerifier::new(SECRET);
        let body = br#"{"event":"charge.success"}"#;
        let signature = verifier.sign(body).unwrap();
        assert!(verifier.verify(body, Some(&signature)).is_ok());
    }

    #[test]
    fn rejects_a_signature_from_the_wrong_key() {
        let verifier = WebhookVerifier::new(SECRET);
        let body = br#"{"event":"charge.success"}"#;
        let forged = WebhookVerifier::new(b"some-other-secret".to_vec())
            .sign(body)
            .unwrap();
        assert_eq!(
            verifier.verify(body, Some(&forged)),
            Err(Error::authentication("signature mismatch"))
        );
    }

    #[test]
    fn rejects_a_missing_header() {
        let verifier = WebhookVerifier::new(SECRET);
        assert_eq!(
            verifier.verify(b"{}", None),
            Err(Error::authentication("missing signature header"))
        );
    }

    #[test]
    fn rejects_a_tampered_body() {
        let verifier = WebhookVerifier::new(SECRET);
        let signature = verifier.sign(br#"{"amount":1000}"#).unwrap();
        assert!(verifier.verify(br#"{"amount":9000}"#, Some(&signature)).is_err());
    }

    #[test]
    fn decodes_charge_success_with_metadata() {
        let order_id = OrderId::new();
        let body = format!(
            r#"{{"event":"charge.success","data":{{"id":302961,"reference":"{}","amount":10000,"currency":"NGN","metadata":{{"order_id":"{}"}}}}}}"#,
            order_reference(order_id),
            order_id.as_uuid(),
        );
        let event = GatewayEvent::parse(body.as_bytes()).unwrap();
        match event {
            GatewayEvent::ChargeSucceeded { data } => {
                assert_eq!(data.order_id().unwrap(), order_id);
                assert_eq!(data.amount, Some(10_000));
                assert_eq!(data.gateway_reference(), "302961");
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn recovers_the_order_id_from_the_reference_when_metadata_is_absent() {
        let order_id = OrderId::new();
        let body = format!(
            r#"{{"event":"charge.success","data":{{"reference":"{}"}}}}"#,
            order_reference(order_id),
        );
        let event = GatewayEvent::parse(body.as_bytes()).unwrap();
        match event {
            GatewayEvent::ChargeSucceeded { data } => {
                assert_eq!(data.order_id().unwrap(), order_id);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn unrecognized_event_types_decode_to_unknown() {
        let event =
            GatewayEvent::parse(br#"{"event":"subscription.create","data":{"code":"SUB_x"}}"#)
                .unwrap();
        assert!(matches!(event, GatewayEvent::Unknown));
    }

    #[test]
    fn garbage_is_a_validation_error() {
        assert!(matches!(
            GatewayEvent::parse(b"not json"),
            Err(Error::Validation { .. })
        ));
    }
}
