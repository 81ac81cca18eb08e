//! Payment Model

use serde::{Deserialize, Serialize};

/// Payment lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PaymentStatus {
    /// Created by checkout, no proof yet
    Pending,
    /// Proof uploaded, waiting for finance
    PendingVerification,
    Paid,
    Failed,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::PendingVerification => "PENDING_VERIFICATION",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Cancelled => "CANCELLED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub amount: f64,
    pub method: Option<String>,
    pub status: PaymentStatus,
    /// Durable URL of the uploaded proof
    pub payment_proof: Option<String>,
    /// Storage identifier of the uploaded proof
    pub proof_key: Option<String>,
    /// Amount the customer claims to have transferred
    pub claimed_amount: Option<f64>,
    pub submitted_at: Option<i64>,
    pub verified_at: Option<i64>,
    pub verifier_id: Option<i64>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Verify payload (`PATCH /api/payments/{id}/verify`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentVerify {
    pub status: PaymentStatus,
    pub notes: Option<String>,
}

/// Response of `POST /api/payments/confirm`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub payment_id: i64,
    pub order_id: i64,
    pub order_number: String,
    pub status: PaymentStatus,
    pub amount: f64,
    pub claimed_amount: Option<f64>,
    pub payment_proof: Option<String>,
    pub submitted_at: Option<i64>,
}
