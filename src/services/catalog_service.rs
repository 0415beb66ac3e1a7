use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        Caller, NewProduct, Product, ProductChanges, ProductPatch, ProductQuery, ProductRequest,
    },
    services::{
        access_policy::{self, Collection, Field, Operation},
        snapshot_builder::MAX_PRICE,
    },
    store::CatalogStore,
    utils::validation::{bounded_amount, non_negative_count, optional_text, required_text},
};

/// Product catalog operations, gated by the access policy.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, caller: &Caller, id: Uuid) -> Result<Product> {
        access_policy::authorize(caller, Collection::Products, Operation::Read)?;

        self.store
            .find_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))
    }

    pub async fn list(&self, caller: &Caller, query: &ProductQuery) -> Result<Vec<Product>> {
        access_policy::authorize(caller, Collection::Products, Operation::Read)?;

        self.store.list_products(query).await
    }

    pub async fn create(&self, caller: &Caller, req: ProductRequest) -> Result<Product> {
        access_policy::authorize(caller, Collection::Products, Operation::Create)?;

        let product = NewProduct {
            name: required_text("name", Some(&req.name))?,
            description: optional_text(req.description.as_deref()),
            price: bounded_amount("price", req.price, MAX_PRICE)?,
            image_ref: required_text("imageRef", Some(&req.image_ref))?,
            stock: non_negative_count("stock", req.stock.unwrap_or(0))?,
        };

        let product = self.store.insert_product(product).await?;

        tracing::info!(product_id = %product.id, "Product created");

        Ok(product)
    }

    pub async fn update(&self, caller: &Caller, id: Uuid, patch: ProductPatch) -> Result<Product> {
        access_policy::authorize(caller, Collection::Products, Operation::Update)?;

        let changes = product_changes(patch)?;
        access_policy::authorize_fields(
            caller,
            Collection::Products,
            Operation::Update,
            &touched_fields(&changes),
        )?;

        let product = self
            .store
            .update_product(id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))?;

        tracing::info!(product_id = %product.id, "Product updated");

        Ok(product)
    }

    /// Removes the product. Orders keep their own copies of its name and price.
    pub async fn delete(&self, caller: &Caller, id: Uuid) -> Result<()> {
        access_policy::authorize(caller, Collection::Products, Operation::Delete)?;

        if !self.store.delete_product(id).await? {
            return Err(AppError::NotFound(format!("Product {} not found", id)));
        }

        tracing::info!(product_id = %id, "Product deleted");

        Ok(())
    }
}

fn product_changes(patch: ProductPatch) -> Result<ProductChanges> {
    Ok(ProductChanges {
        name: patch
            .name
            .as_deref()
            .map(|name| required_text("name", Some(name)))
            .transpose()?,
        description: patch
            .description
            .as_deref()
            .map(|text| optional_text(Some(text))),
        price: patch
            .price
            .map(|price| bounded_amount("price", price, MAX_PRICE))
            .transpose()?,
        image_ref: patch
            .image_ref
            .as_deref()
            .map(|image_ref| required_text("imageRef", Some(image_ref)))
            .transpose()?,
        stock: patch
            .stock
            .map(|stock| non_negative_count("stock", stock))
            .transpose()?,
    })
}

fn touched_fields(changes: &ProductChanges) -> Vec<Field> {
    let mut fields = Vec::new();
    if changes.name.is_some() {
        fields.push(Field::Name);
    }
    if changes.description.is_some() {
        fields.push(Field::Description);
    }
    if changes.price.is_some() {
        fields.push(Field::Price);
    }
    if changes.image_ref.is_some() {
        fields.push(Field::ImageRef);
    }
    if changes.stock.is_some() {
        fields.push(Field::Stock);
    }
    fields
}
