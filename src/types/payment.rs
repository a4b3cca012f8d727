use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use super::{decimal_string, EntityId};

/// Lifecycle of a payment as reported by the verify endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    /// Any status string this client does not know; treated as still pending.
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    /// Whether polling should stop at this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Azampay,
    Mpesa,
    Card,
}

/// A payment as returned by the initiate and verify endpoints.
///
/// Only `status` is guaranteed. The backend may send its own primary key
/// (`id`), the gateway reference (`payment_id`), both, or neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub payment_id: Option<EntityId>,
    pub status: PaymentStatus,
    #[serde(default, deserialize_with = "decimal_string")]
    pub amount: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    /// Hosted checkout page, returned when a payment is initiated.
    #[serde(default)]
    pub checkout_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PaymentRecord {
    /// The id to verify this payment by: the gateway reference when present,
    /// otherwise the record's primary key.
    pub fn tracking_id(&self) -> Option<&EntityId> {
        self.payment_id.as_ref().or(self.id.as_ref())
    }
}

/// RFC 3339 timestamps, or naive `YYYY-MM-DDTHH:MM:SS[.f]` read as UTC.
/// Anything unparseable becomes `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    Ok(["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&raw, format).ok())
        .map(|naive| naive.and_utc()))
}

/// Body of `POST /product/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPaymentRequest {
    pub product_id: EntityId,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Body of `POST /subscription/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionPaymentRequest {
    pub plan: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Body of `POST /verify-payment/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    pub payment_id: EntityId,
}
