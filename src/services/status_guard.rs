use crate::{
    error::{AppError, Result},
    models::{Caller, OrderStatus},
    services::access_policy::{self, Collection, Field, Operation},
};

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Entregado | OrderStatus::Cancelado)
    }

    /// Statuses the business process expects to follow this one.
    ///
    /// Informational only: `check_transition` does not consult it.
    pub fn expected_next(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Recibido => &[OrderStatus::EnProceso, OrderStatus::Cancelado],
            OrderStatus::EnProceso => &[OrderStatus::Entregado, OrderStatus::Cancelado],
            OrderStatus::Entregado | OrderStatus::Cancelado => &[],
        }
    }
}

/// Validates a status change requested by `caller`.
///
/// Any authenticated caller may move an order to any status, including out of
/// a terminal one. Enum membership is already guaranteed by `OrderStatus`.
pub fn check_transition(caller: &Caller, from: OrderStatus, to: OrderStatus) -> Result<()> {
    if !access_policy::is_allowed(caller, Collection::Orders, Operation::Update, Some(Field::Status))
    {
        return Err(AppError::Forbidden(
            "You are not allowed to change the order status".to_string(),
        ));
    }

    if let Some(reason) = unexpected_move(from, to) {
        tracing::warn!(from = from.as_str(), to = to.as_str(), "{}", reason);
    }

    Ok(())
}

/// Why a permitted move is worth a warning, if it is.
fn unexpected_move(from: OrderStatus, to: OrderStatus) -> Option<&'static str> {
    if from == to {
        None
    } else if from.is_terminal() {
        Some("Order left a terminal status")
    } else if !from.expected_next().contains(&to) {
        Some("Order status moved outside the expected flow")
    } else {
        None
    }
}
