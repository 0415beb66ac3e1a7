//! Turns `{productId, quantity}` lines into immutable order line snapshots.
//!
//! Validation and pricing are pure; only product resolution touches the
//! catalog. Lines are resolved one after another without a shared transaction,
//! so concurrent catalog edits may land between two lines of the same order.

use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Number;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{OrderLineInput, OrderLineSnapshot, Product},
    store::CatalogStore,
};

/// Currency precision for order totals.
pub const CURRENCY_DECIMAL_PLACES: u32 = 2;

/// Maximum catalog price per unit (1,000,000.00)
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
/// Maximum quantity per order line
pub const MAX_QUANTITY: i32 = 9999;
/// Largest total the `orders.total_amount` column holds (999,999,999,999.99)
pub const MAX_ORDER_TOTAL: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("Order must contain at least one product")]
    EmptyOrder,
    #[error("Missing quantity on line {index}")]
    MissingQuantity { index: usize },
    #[error("Invalid quantity {quantity} on line {index}: must be a whole number from 1 to {max}", max = MAX_QUANTITY)]
    InvalidQuantity { index: usize, quantity: String },
    #[error("Product {0} not found")]
    ProductNotFound(String),
    #[error("Order total exceeds the maximum of {max}", max = MAX_ORDER_TOTAL)]
    TotalOutOfRange,
}

impl SnapshotError {
    pub fn code(&self) -> &'static str {
        match self {
            SnapshotError::EmptyOrder => "empty_order",
            SnapshotError::MissingQuantity { .. } => "missing_quantity",
            SnapshotError::InvalidQuantity { .. } => "invalid_quantity",
            SnapshotError::ProductNotFound(_) => "product_not_found",
            SnapshotError::TotalOutOfRange => "total_out_of_range",
        }
    }

    pub fn field(&self) -> Option<String> {
        match self {
            SnapshotError::EmptyOrder => Some("orderedProducts".to_string()),
            SnapshotError::MissingQuantity { index } | SnapshotError::InvalidQuantity { index, .. } => {
                Some(format!("orderedProducts.{}.quantity", index))
            }
            SnapshotError::ProductNotFound(_) => None,
            SnapshotError::TotalOutOfRange => Some("totalAmount".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuiltSnapshots {
    pub lines: Vec<OrderLineSnapshot>,
    pub total_amount: Decimal,
}

/// Rounds half-up to currency precision.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Accepts whole numbers from 1 up to `MAX_QUANTITY`.
pub fn validate_quantity(
    index: usize,
    quantity: Option<&Number>,
) -> std::result::Result<i32, SnapshotError> {
    let Some(quantity) = quantity else {
        return Err(SnapshotError::MissingQuantity { index });
    };

    match quantity.as_i64().and_then(|q| i32::try_from(q).ok()) {
        Some(q) if (1..=MAX_QUANTITY).contains(&q) => Ok(q),
        _ => Err(SnapshotError::InvalidQuantity {
            index,
            quantity: quantity.to_string(),
        }),
    }
}

/// Checks the shape of the request before any product is looked up.
pub fn validate_lines(lines: &[OrderLineInput]) -> std::result::Result<Vec<i32>, SnapshotError> {
    if lines.is_empty() {
        return Err(SnapshotError::EmptyOrder);
    }

    lines
        .iter()
        .enumerate()
        .map(|(index, line)| validate_quantity(index, line.quantity.as_ref()))
        .collect()
}

pub fn snapshot_line(product: &Product, quantity: i32) -> OrderLineSnapshot {
    OrderLineSnapshot {
        name_snapshot: product.name.clone(),
        price_snapshot: product.price,
        quantity,
    }
}

/// Sums `price * quantity` over the lines, rounded to cents.
///
/// Fails instead of overflowing, and when the result would not fit `MAX_ORDER_TOTAL`.
pub fn total_amount(lines: &[OrderLineSnapshot]) -> std::result::Result<Decimal, SnapshotError> {
    let sum = lines
        .iter()
        .try_fold(Decimal::ZERO, |acc, line| {
            line.price_snapshot
                .checked_mul(Decimal::from(line.quantity))
                .and_then(|subtotal| acc.checked_add(subtotal))
        })
        .ok_or(SnapshotError::TotalOutOfRange)?;

    let total = round_currency(sum);
    if total > MAX_ORDER_TOTAL {
        return Err(SnapshotError::TotalOutOfRange);
    }

    Ok(total)
}

pub async fn build_snapshots(
    catalog: &dyn CatalogStore,
    lines: &[OrderLineInput],
) -> Result<BuiltSnapshots> {
    let quantities = validate_lines(lines)?;

    let mut snapshots = Vec::with_capacity(lines.len());
    for (line, quantity) in lines.iter().zip(quantities) {
        let product_ref = line.product_id.trim();
        let product_id = Uuid::parse_str(product_ref)
            .map_err(|_| SnapshotError::ProductNotFound(product_ref.to_string()))?;

        let product = catalog
            .find_product(product_id)
            .await?
            .ok_or_else(|| SnapshotError::ProductNotFound(product_ref.to_string()))?;

        snapshots.push(snapshot_line(&product, quantity));
    }

    let total_amount = total_amount(&snapshots)?;

    Ok(BuiltSnapshots {
        lines: snapshots,
        total_amount,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;
    use crate::{
        error::AppError,
        models::NewProduct,
        store::{CatalogStore, MemoryStore},
    };

    async fn seed(store: &MemoryStore, name: &str, price: Decimal) -> Product {
        store
            .insert_product(NewProduct {
                name: name.to_string(),
                description: None,
                price,
                image_ref: format!("media/{}.jpg", name),
                stock: 3,
            })
            .await
            .unwrap()
    }

    fn line(product_id: impl ToString, quantity: i64) -> OrderLineInput {
        OrderLineInput {
            product_id: product_id.to_string(),
            quantity: Some(quantity.into()),
        }
    }

    #[tokio::test]
    async fn builds_snapshots_and_total() {
        let store = MemoryStore::new();
        let p1 = seed(&store, "Camiseta", dec!(10.00)).await;
        let p2 = seed(&store, "Gorra", dec!(5.50)).await;

        let built = build_snapshots(&store, &[line(p1.id, 2), line(p2.id, 1)])
            .await
            .unwrap();

        assert_eq!(built.total_amount, dec!(25.50));
        assert_eq!(built.lines.len(), 2);
        assert_eq!(built.lines[0].name_snapshot, "Camiseta");
        assert_eq!(built.lines[0].price_snapshot, dec!(10.00));
        assert_eq!(built.lines[0].quantity, 2);
        assert_eq!(built.lines[1].quantity, 1);
    }

    #[tokio::test]
    async fn rejects_empty_order() {
        let store = MemoryStore::new();
        let err = build_snapshots(&store, &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Snapshot(SnapshotError::EmptyOrder)));
    }

    #[tokio::test]
    async fn rejects_zero_quantity_before_lookup() {
        let store = MemoryStore::new();
        let p1 = seed(&store, "Camiseta", dec!(10.00)).await;

        // the unknown product on line 1 is never reached
        let err = build_snapshots(&store, &[line(p1.id, 0), line(Uuid::new_v4(), 1)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Snapshot(SnapshotError::InvalidQuantity { index: 0, ref quantity })
                if quantity == "0"
        ));
    }

    #[tokio::test]
    async fn rejects_unknown_and_malformed_product_refs() {
        let store = MemoryStore::new();
        let missing = Uuid::new_v4();

        let err = build_snapshots(&store, &[line(missing, 1)]).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Snapshot(SnapshotError::ProductNotFound(ref id)) if *id == missing.to_string()
        ));

        let err = build_snapshots(&store, &[line("not-a-uuid", 1)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Snapshot(SnapshotError::ProductNotFound(_))
        ));
    }

    fn number(raw: &str) -> Number {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn quantity_bounds() {
        assert_eq!(validate_quantity(0, Some(&number("1"))), Ok(1));
        assert_eq!(validate_quantity(0, Some(&number("9999"))), Ok(MAX_QUANTITY));
        for bad in ["-1", "10000", "2000000000", "1.5", "18446744073709551615"] {
            assert!(
                matches!(
                    validate_quantity(2, Some(&number(bad))),
                    Err(SnapshotError::InvalidQuantity { index: 2, .. })
                ),
                "{}",
                bad
            );
        }
        let missing = validate_quantity(3, None).unwrap_err();
        assert_eq!(missing, SnapshotError::MissingQuantity { index: 3 });
        assert_eq!(missing.field().as_deref(), Some("orderedProducts.3.quantity"));
    }

    #[tokio::test]
    async fn missing_quantity_is_reported_per_line() {
        let store = MemoryStore::new();
        let p1 = seed(&store, "Camiseta", dec!(10.00)).await;
        let lines = [
            line(p1.id, 1),
            OrderLineInput {
                product_id: p1.id.to_string(),
                quantity: None,
            },
        ];

        let err = build_snapshots(&store, &lines).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Snapshot(SnapshotError::MissingQuantity { index: 1 })
        ));
        assert_eq!(err.kind(), "validation_error");
    }

    #[tokio::test]
    async fn oversized_totals_are_rejected_instead_of_overflowing() {
        let store = MemoryStore::new();
        // stored directly; the catalog service would refuse this price
        let pricey = seed(&store, "Yate", dec!(50000000000000000000)).await;

        let err = build_snapshots(&store, &[line(pricey.id, MAX_QUANTITY.into())])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Snapshot(SnapshotError::TotalOutOfRange)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);

        let overflowing = vec![OrderLineSnapshot {
            name_snapshot: "Max".to_string(),
            price_snapshot: Decimal::MAX,
            quantity: 2,
        }];
        assert_eq!(total_amount(&overflowing), Err(SnapshotError::TotalOutOfRange));
    }

    #[test]
    fn largest_storable_total_is_accepted() {
        assert_eq!(MAX_ORDER_TOTAL, dec!(999999999999.99));

        // 100 lines at the price and quantity caps: 999,900,000,000.00
        let lines = vec![
            OrderLineSnapshot {
                name_snapshot: "Max".to_string(),
                price_snapshot: MAX_PRICE,
                quantity: MAX_QUANTITY,
            };
            100
        ];
        assert_eq!(total_amount(&lines), Ok(dec!(999900000000.00)));

        let mut over = lines.clone();
        over.push(lines[0].clone());
        assert_eq!(total_amount(&over), Err(SnapshotError::TotalOutOfRange));
    }

    #[test]
    fn total_rounds_half_up_to_cents() {
        let lines = vec![
            OrderLineSnapshot {
                name_snapshot: "A".to_string(),
                price_snapshot: dec!(0.335),
                quantity: 1,
            },
            OrderLineSnapshot {
                name_snapshot: "B".to_string(),
                price_snapshot: dec!(1.10),
                quantity: 3,
            },
        ];

        // 0.335 + 3.30 = 3.635
        assert_eq!(total_amount(&lines), Ok(dec!(3.64)));
        assert_eq!(round_currency(dec!(0.004)), dec!(0.00));
        assert_eq!(round_currency(dec!(0.005)), dec!(0.01));
    }

    #[tokio::test]
    async fn snapshot_is_independent_of_later_catalog_changes() {
        let store = MemoryStore::new();
        let product = seed(&store, "Taza", dec!(7.25)).await;

        let built = build_snapshots(&store, &[line(product.id, 4)]).await.unwrap();

        let changes = crate::models::ProductChanges {
            name: Some("Taza grande".to_string()),
            price: Some(dec!(9.99)),
            ..Default::default()
        };
        store.update_product(product.id, &changes).await.unwrap();

        assert_eq!(built.lines[0].name_snapshot, "Taza");
        assert_eq!(built.lines[0].price_snapshot, dec!(7.25));
        assert_eq!(built.total_amount, dec!(29.00));
    }
}
