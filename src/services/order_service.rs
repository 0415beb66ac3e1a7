use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        Caller, NewOrder, Order, OrderChanges, OrderPatch, OrderQuery, OrderStatus,
        OrderSubmission,
    },
    services::{
        access_policy::{self, Collection, Field, Operation},
        snapshot_builder::{self, MAX_ORDER_TOTAL, round_currency, validate_quantity},
        status_guard,
    },
    store::{CatalogStore, OrderStore},
    utils::validation::{bounded_amount, optional_text, required_text, validate_email},
};

#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self { orders, catalog }
    }

    /// Public checkout. Everything is validated and priced before the single
    /// insert, so a failed submission leaves nothing behind.
    pub async fn submit(&self, caller: &Caller, submission: OrderSubmission) -> Result<Order> {
        access_policy::authorize(caller, Collection::Orders, Operation::Create)?;

        let customer_name = required_text("customerName", submission.customer_name.as_deref())?;
        let customer_email = validate_email("customerEmail", submission.customer_email.as_deref())?;
        let customer_phone = optional_text(submission.customer_phone.as_deref());

        let built =
            snapshot_builder::build_snapshots(self.catalog.as_ref(), &submission.ordered_products)
                .await?;

        let order = self
            .orders
            .insert_order(NewOrder {
                customer_name,
                customer_email,
                customer_phone,
                ordered_products: built.lines,
                total_amount: built.total_amount,
                status: OrderStatus::default(),
            })
            .await?;

        tracing::info!(
            order_id = %order.id,
            total_amount = %order.total_amount,
            lines = order.ordered_products.len(),
            "Order submitted"
        );

        Ok(order)
    }

    pub async fn get(&self, caller: &Caller, id: Uuid) -> Result<Order> {
        access_policy::authorize(caller, Collection::Orders, Operation::Read)?;

        self.orders
            .find_order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))
    }

    pub async fn list(&self, caller: &Caller, query: &OrderQuery) -> Result<Vec<Order>> {
        access_policy::authorize(caller, Collection::Orders, Operation::Read)?;

        self.orders.list_orders(query).await
    }

    pub async fn update(&self, caller: &Caller, id: Uuid, patch: OrderPatch) -> Result<Order> {
        access_policy::authorize(caller, Collection::Orders, Operation::Update)?;

        let current = self
            .orders
            .find_order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))?;

        let (changes, fields) = order_changes(&current, patch)?;
        access_policy::authorize_fields(caller, Collection::Orders, Operation::Update, &fields)?;

        if let Some(status) = changes.status {
            status_guard::check_transition(caller, current.status, status)?;
        }

        // last write wins; a concurrent delete surfaces as not found
        let updated = self
            .orders
            .update_order(id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))?;

        if updated.status != current.status {
            tracing::info!(
                order_id = %id,
                from = current.status.as_str(),
                to = updated.status.as_str(),
                by = caller.identity.as_deref().unwrap_or("unknown"),
                "Order status changed"
            );
        }

        Ok(updated)
    }

    pub async fn delete(&self, caller: &Caller, id: Uuid) -> Result<()> {
        access_policy::authorize(caller, Collection::Orders, Operation::Delete)?;

        if !self.orders.delete_order(id).await? {
            return Err(AppError::NotFound(format!("Order {} not found", id)));
        }

        tracing::info!(order_id = %id, "Order deleted");

        Ok(())
    }
}

/// Validates a patch against the stored order and lists every field it touches.
fn order_changes(current: &Order, patch: OrderPatch) -> Result<(OrderChanges, Vec<Field>)> {
    let mut changes = OrderChanges::default();
    let mut fields = Vec::new();

    if let Some(ref name) = patch.customer_name {
        changes.customer_name = Some(required_text("customerName", Some(name))?);
        fields.push(Field::CustomerName);
    }

    if let Some(ref email) = patch.customer_email {
        changes.customer_email = Some(validate_email("customerEmail", Some(email))?);
        fields.push(Field::CustomerEmail);
    }

    if let Some(ref phone) = patch.customer_phone {
        changes.customer_phone = Some(optional_text(Some(phone)));
        fields.push(Field::CustomerPhone);
    }

    if let Some(lines) = patch.ordered_products {
        if lines.len() != current.ordered_products.len() {
            return Err(AppError::validation(
                "orderedProducts",
                format!(
                    "Order has {} lines; lines cannot be added or removed after submission",
                    current.ordered_products.len()
                ),
            ));
        }

        let mut quantities = Vec::with_capacity(lines.len());
        for (index, (line, stored)) in lines.iter().zip(&current.ordered_products).enumerate() {
            if line
                .name_snapshot
                .as_ref()
                .is_some_and(|name| *name != stored.name_snapshot)
                && !fields.contains(&Field::LineNameSnapshot)
            {
                fields.push(Field::LineNameSnapshot);
            }

            if line
                .price_snapshot
                .is_some_and(|price| price != stored.price_snapshot)
                && !fields.contains(&Field::LinePriceSnapshot)
            {
                fields.push(Field::LinePriceSnapshot);
            }

            let quantity = match line.quantity {
                Some(ref quantity) => validate_quantity(index, Some(quantity))?,
                None => stored.quantity,
            };
            quantities.push(quantity);
        }

        changes.quantities = Some(quantities);
        fields.push(Field::LineQuantity);
    }

    if let Some(total) = patch.total_amount {
        let total = bounded_amount("totalAmount", round_currency(total), MAX_ORDER_TOTAL)?;
        changes.total_amount = Some(total);
        fields.push(Field::TotalAmount);
    }

    if let Some(status) = patch.status {
        changes.status = Some(status);
        fields.push(Field::Status);
    }

    if let Some(ref notes) = patch.admin_notes {
        changes.admin_notes = Some(optional_text(Some(notes)));
        fields.push(Field::AdminNotes);
    }

    Ok((changes, fields))
}
