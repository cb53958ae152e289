//! Hosted-checkout gateway client.
//!
//! Creates checkout sessions for order payments and verifies webhook
//! signatures on the reconciliation path.

use crate::config::GatewayConfig;
use anyhow::{Result, anyhow};
use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Gateway client for the hosted checkout API.
#[derive(Clone)]
pub struct CheckoutClient {
    client: Client,
    config: GatewayConfig,
}

/// Request to create a checkout session.
#[derive(Debug, Serialize)]
pub struct CreateSessionRequest {
    /// Amount in the smallest currency unit.
    pub amount: u64,
    /// ISO currency code.
    pub currency: String,
    /// Marketplace order this session pays for.
    pub reference: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// A checkout session as reported by the gateway.
#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    /// Gateway session ID.
    pub id: String,
    /// Hosted payment page for the customer.
    pub url: String,
    /// Session status (e.g. "open", "complete", "expired").
    pub status: String,
    /// Whether the session's payment has been collected.
    #[serde(default)]
    pub paid: bool,
    pub amount: u64,
    pub currency: String,
    pub reference: Option<String>,
}

/// Gateway API error response.
#[derive(Debug, Deserialize)]
pub struct GatewayApiError {
    pub error: GatewayErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct GatewayErrorDetail {
    pub code: String,
    pub message: String,
}

/// Webhook event envelope.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub session_id: String,
    pub reference: Option<String>,
}

/// Convert a decimal major-unit amount to the gateway's minor units.
/// Rejects negative and fractional-cent amounts instead of rounding.
pub fn to_minor_units(amount: Decimal) -> Result<u64> {
    let cents = amount * Decimal::from(100);
    if cents.is_sign_negative() || !cents.fract().is_zero() {
        return Err(anyhow!("amount {} is not a whole number of cents", amount));
    }
    cents
        .to_u64()
        .ok_or_else(|| anyhow!("amount {} out of range", amount))
}

impl CheckoutClient {
    /// Create a new gateway client.
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Check if the gateway is configured (credentials are set).
    pub fn is_configured(&self) -> bool {
        !self.config.key_id.is_empty() && !self.config.key_secret.expose_secret().is_empty()
    }

    /// Create a checkout session for an order.
    pub async fn create_checkout_session(
        &self,
        order_id: Uuid,
        amount: Decimal,
        currency: &str,
    ) -> Result<CheckoutSession> {
        if !self.is_configured() {
            return Err(anyhow!("checkout gateway credentials not configured"));
        }

        let request = CreateSessionRequest {
            amount: to_minor_units(amount)?,
            currency: currency.to_string(),
            reference: order_id.to_string(),
            success_url: format!("{}?session_id={{CHECKOUT_SESSION_ID}}", self.config.success_url),
            cancel_url: self.config.cancel_url.clone(),
        };

        let url = format!("{}/checkout/sessions", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .basic_auth(
                &self.config.key_id,
                Some(self.config.key_secret.expose_secret()),
            )
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, "Gateway create session response");

        if status.is_success() {
            let session: CheckoutSession = serde_json::from_str(&body)?;
            tracing::info!(
                session_id = %session.id,
                order_id = %order_id,
                amount = session.amount,
                currency = %session.currency,
                "Checkout session created"
            );
            Ok(session)
        } else {
            let error: GatewayApiError =
                serde_json::from_str(&body).unwrap_or_else(|_| GatewayApiError {
                    error: GatewayErrorDetail {
                        code: "UNKNOWN".to_string(),
                        message: body.clone(),
                    },
                });
            tracing::error!(
                code = %error.error.code,
                message = %error.error.message,
                "Checkout session creation failed"
            );
            Err(anyhow!(
                "gateway error: {} - {}",
                error.error.code,
                error.error.message
            ))
        }
    }

    /// Fetch an existing session by ID.
    pub async fn get_session(&self, session_id: &str) -> Result<CheckoutSession> {
        if !self.is_configured() {
            return Err(anyhow!("checkout gateway credentials not configured"));
        }

        let url = format!("{}/checkout/sessions/{}", self.config.api_base_url, session_id);

        let response = self
            .client
            .get(&url)
            .basic_auth(
                &self.config.key_id,
                Some(self.config.key_secret.expose_secret()),
            )
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            let session: CheckoutSession = serde_json::from_str(&body)?;
            Ok(session)
        } else {
            Err(anyhow!("failed to fetch checkout session: {}", body))
        }
    }

    /// Verify a webhook signature.
    ///
    /// The signature is `HMAC-SHA256(request_body, webhook_secret)`, hex
    /// encoded, compared in constant time.
    pub fn verify_webhook_signature(&self, body: &str, signature: &str) -> Result<bool> {
        let expected =
            compute_signature(body, self.config.webhook_secret.expose_secret())?;

        let is_valid: bool = expected.as_bytes().ct_eq(signature.as_bytes()).into();

        if !is_valid {
            tracing::warn!("Webhook signature verification failed");
        }

        Ok(is_valid)
    }

    /// Parse a webhook event from the raw request body.
    pub fn parse_webhook_event(&self, body: &str) -> Result<WebhookEvent> {
        let event: WebhookEvent = serde_json::from_str(body)?;
        Ok(event)
    }
}

/// Compute a hex-encoded HMAC-SHA256 signature.
fn compute_signature(payload: &str, secret: &str) -> Result<String> {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| anyhow!("invalid key length"))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
