use crate::{
    error::{AppError, Result},
    models::Caller,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Products,
    Orders,
}

impl Collection {
    pub fn slug(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Orders => "orders",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    // products
    Name,
    Description,
    Price,
    ImageRef,
    Stock,
    // orders
    CustomerName,
    CustomerEmail,
    CustomerPhone,
    LineQuantity,
    LineNameSnapshot,
    LinePriceSnapshot,
    TotalAmount,
    Status,
    AdminNotes,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Description => "description",
            Field::Price => "price",
            Field::ImageRef => "imageRef",
            Field::Stock => "stock",
            Field::CustomerName => "customerName",
            Field::CustomerEmail => "customerEmail",
            Field::CustomerPhone => "customerPhone",
            Field::LineQuantity => "orderedProducts.quantity",
            Field::LineNameSnapshot => "orderedProducts.nameSnapshot",
            Field::LinePriceSnapshot => "orderedProducts.priceSnapshot",
            Field::TotalAmount => "totalAmount",
            Field::Status => "status",
            Field::AdminNotes => "adminNotes",
        }
    }
}

fn anyone(_: &Caller) -> bool {
    true
}

fn staff(caller: &Caller) -> bool {
    caller.is_authenticated()
}

fn nobody(_: &Caller) -> bool {
    false
}

/// Row-level rule for an operation on a whole collection.
fn row_rule(collection: Collection, operation: Operation) -> fn(&Caller) -> bool {
    match (collection, operation) {
        (Collection::Products, Operation::Read) => anyone,
        (Collection::Products, _) => staff,
        (Collection::Orders, Operation::Create) => anyone,
        (Collection::Orders, _) => staff,
    }
}

/// Field-level rules. `None` means the field has no rule of its own.
fn field_rule(
    collection: Collection,
    operation: Operation,
    field: Field,
) -> Option<fn(&Caller) -> bool> {
    match (collection, operation, field) {
        (Collection::Orders, Operation::Update, Field::Status) => Some(staff),
        (Collection::Orders, Operation::Update, Field::LineNameSnapshot)
        | (Collection::Orders, Operation::Update, Field::LinePriceSnapshot) => Some(nobody),
        _ => None,
    }
}

/// Decides whether `caller` may perform `operation` on `collection`, and on
/// `field` when one is given.
///
/// Row and field rules are separate layers: a field with its own rule is
/// judged by that rule alone, any other field inherits the row rule.
pub fn is_allowed(
    caller: &Caller,
    collection: Collection,
    operation: Operation,
    field: Option<Field>,
) -> bool {
    match field.and_then(|field| field_rule(collection, operation, field)) {
        Some(rule) => rule(caller),
        None => row_rule(collection, operation)(caller),
    }
}

pub fn authorize(caller: &Caller, collection: Collection, operation: Operation) -> Result<()> {
    if is_allowed(caller, collection, operation, None) {
        return Ok(());
    }

    tracing::debug!(
        collection = collection.slug(),
        operation = operation.as_str(),
        authenticated = caller.is_authenticated(),
        "Access denied"
    );

    Err(AppError::Forbidden(format!(
        "You are not allowed to {} {}",
        operation.as_str(),
        collection.slug()
    )))
}

/// Checks the row rule, then every touched field.
pub fn authorize_fields(
    caller: &Caller,
    collection: Collection,
    operation: Operation,
    fields: &[Field],
) -> Result<()> {
    authorize(caller, collection, operation)?;

    match fields
        .iter()
        .find(|field| !is_allowed(caller, collection, operation, Some(**field)))
    {
        Some(field) => Err(AppError::Forbidden(format!(
            "You are not allowed to {} field {} on {}",
            operation.as_str(),
            field.as_str(),
            collection.slug()
        ))),
        None => Ok(()),
    }
}
