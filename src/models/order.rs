use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Recibido,
    EnProceso,
    Entregado,
    Cancelado,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Recibido,
        OrderStatus::EnProceso,
        OrderStatus::Entregado,
        OrderStatus::Cancelado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Recibido => "recibido",
            OrderStatus::EnProceso => "en_proceso",
            OrderStatus::Entregado => "entregado",
            OrderStatus::Cancelado => "cancelado",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown order status '{}'", s))
    }
}

// DB models

/// Point-in-time copy of a product as it was when the order was submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineSnapshot {
    pub name_snapshot: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_snapshot: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub ordered_products: Vec<OrderLineSnapshot>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A fully validated order ready to be persisted in one step.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub ordered_products: Vec<OrderLineSnapshot>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
}

/// Field values to overwrite on a stored order. Absent fields are left as-is.
#[derive(Debug, Clone, Default)]
pub struct OrderChanges {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<Option<String>>,
    pub quantities: Option<Vec<i32>>,
    pub total_amount: Option<Decimal>,
    pub status: Option<OrderStatus>,
    pub admin_notes: Option<Option<String>>,
}

impl OrderChanges {
    pub fn is_empty(&self) -> bool {
        self.customer_name.is_none()
            && self.customer_email.is_none()
            && self.customer_phone.is_none()
            && self.quantities.is_none()
            && self.total_amount.is_none()
            && self.status.is_none()
            && self.admin_notes.is_none()
    }
}

impl Order {
    /// Overwrites the changed fields. Snapshot names and prices are never touched.
    pub fn apply(&mut self, changes: &OrderChanges) {
        if let Some(name) = &changes.customer_name {
            self.customer_name = name.clone();
        }
        if let Some(email) = &changes.customer_email {
            self.customer_email = email.clone();
        }
        if let Some(phone) = &changes.customer_phone {
            self.customer_phone = phone.clone();
        }
        if let Some(quantities) = &changes.quantities {
            for (line, quantity) in self.ordered_products.iter_mut().zip(quantities) {
                line.quantity = *quantity;
            }
        }
        if let Some(total) = changes.total_amount {
            self.total_amount = total;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(notes) = &changes.admin_notes {
            self.admin_notes = notes.clone();
        }
    }
}

// Request types

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    pub product_id: String,
    /// Kept as the raw JSON number; range and integrality are checked when snapshots are built.
    #[serde(default)]
    pub quantity: Option<serde_json::Number>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmission {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub ordered_products: Vec<OrderLineInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLinePatch {
    pub quantity: Option<serde_json::Number>,
    pub name_snapshot: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price_snapshot: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub ordered_products: Option<Vec<OrderLinePatch>>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_amount: Option<Decimal>,
    pub status: Option<OrderStatus>,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip_through_serde() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("enviado".parse::<OrderStatus>().is_err());
        assert!(serde_json::from_str::<OrderStatus>("\"pending\"").is_err());
    }

    #[test]
    fn default_status_is_recibido() {
        assert_eq!(OrderStatus::default(), OrderStatus::Recibido);
    }

    #[test]
    fn submission_tolerates_missing_fields() {
        let submission: OrderSubmission = serde_json::from_str("{}").unwrap();
        assert!(submission.customer_email.is_none());
        assert!(submission.ordered_products.is_empty());
    }

    #[test]
    fn line_quantity_keeps_the_raw_number() {
        let line: OrderLineInput =
            serde_json::from_str(r#"{"productId": "p-1", "quantity": 1.5}"#).unwrap();
        assert_eq!(line.quantity.map(|q| q.to_string()), Some("1.5".to_string()));

        let line: OrderLineInput = serde_json::from_str(r#"{"productId": "p-1"}"#).unwrap();
        assert!(line.quantity.is_none());
    }
}
