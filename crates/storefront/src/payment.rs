//! Wompi checkout hand-off.
//!
//! The storefront never touches card data. It signs the checkout parameters,
//! renders the Wompi widget, and after the redirect reads the transaction
//! back from Wompi to show the result. The backend receives Wompi's webhook
//! and owns the authoritative order status.

use std::time::Duration;

use climatech_core::{CurrencyCode, PaymentStatus, Price};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::instrument;

use crate::config::WompiConfig;

/// Script URL of the Wompi widget.
pub const WIDGET_SCRIPT_URL: &str = "https://checkout.wompi.co/widget.js";

/// Errors from the payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Wompi returned {0}")]
    Status(u16),

    #[error("Transaction not found: {0}")]
    NotFound(String),

    #[error("Amount cannot be expressed in cents: {0}")]
    InvalidAmount(Decimal),
}

/// Integrity signature required by the widget:
/// `hex(sha256(reference ‖ amount_in_cents ‖ currency ‖ secret))`.
#[must_use]
pub fn integrity_signature(
    reference: &str,
    amount_in_cents: i64,
    currency: CurrencyCode,
    secret: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(reference.as_bytes());
    hasher.update(amount_in_cents.to_string().as_bytes());
    hasher.update(currency.code().as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Everything the widget `<script>` tag needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetCheckout {
    pub public_key: String,
    pub currency: &'static str,
    pub amount_in_cents: i64,
    pub reference: String,
    pub signature: String,
    pub redirect_url: String,
    pub customer_email: String,
    pub customer_name: String,
    pub customer_phone: String,
}

impl WidgetCheckout {
    /// Sign a checkout for `total` under `reference`.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidAmount` if the total is negative or
    /// does not fit in cents.
    pub fn new(
        config: &WompiConfig,
        reference: &str,
        total: Decimal,
        redirect_url: String,
        customer: &climatech_core::records::CustomerInfo,
    ) -> Result<Self, PaymentError> {
        let amount_in_cents = Price::new(total, config.currency)
            .amount_in_cents()
            .filter(|c| *c > 0)
            .ok_or(PaymentError::InvalidAmount(total))?;
        let signature = integrity_signature(
            reference,
            amount_in_cents,
            config.currency,
            config.integrity_secret.expose_secret(),
        );

        Ok(Self {
            public_key: config.public_key.clone(),
            currency: config.currency.code(),
            amount_in_cents,
            reference: reference.to_string(),
            signature,
            redirect_url,
            customer_email: customer.email.to_string(),
            customer_name: customer.name.clone(),
            customer_phone: customer.phone.clone(),
        })
    }
}

/// A Wompi transaction as reported after the redirect.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub reference: String,
    pub status: PaymentStatus,
    pub amount_in_cents: i64,
    #[serde(default)]
    pub status_message: Option<String>,
}

#[derive(Deserialize)]
struct TransactionEnvelope {
    data: Transaction,
}

/// Read-only client for the Wompi REST API.
#[derive(Clone)]
pub struct WompiClient {
    client: reqwest::Client,
    api_base: String,
}

impl WompiClient {
    #[must_use]
    pub fn new(config: &WompiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_base: config.api_base().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch a transaction by id (`GET /transactions/{id}`).
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::NotFound` for unknown ids and
    /// `PaymentError::Status` for other non-success responses.
    #[instrument(skip(self))]
    pub async fn transaction(&self, id: &str) -> Result<Transaction, PaymentError> {
        let response = self
            .client
            .get(format!("{}/transactions/{id}", self.api_base))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PaymentError::NotFound(id.to_string()));
        }
        if !status.is_success() {
            tracing::warn!(status = %status, "Wompi transaction lookup failed");
            return Err(PaymentError::Status(status.as_u16()));
        }

        let envelope: TransactionEnvelope = response.json().await?;
        Ok(envelope.data)
    }
}
