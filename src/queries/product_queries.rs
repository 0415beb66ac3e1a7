use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    error::Result,
    models::{NewProduct, Product, ProductChanges, ProductQuery},
    store::page_bounds,
};

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(product)
}

pub async fn search_products(pool: &PgPool, params: &ProductQuery) -> Result<Vec<Product>> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM products WHERE 1=1");

    if let Some(ref q) = params.search {
        query.push(" AND name ILIKE ");
        query.push_bind(format!("%{}%", q));
    }

    let (limit, offset) = page_bounds(params.limit, params.offset);

    query.push(" ORDER BY created_at DESC LIMIT ");
    query.push_bind(limit);
    query.push(" OFFSET ");
    query.push_bind(offset);

    let products = query.build_query_as::<Product>().fetch_all(pool).await?;

    Ok(products)
}

pub async fn create_product(pool: &PgPool, product: &NewProduct) -> Result<Product> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (id, name, description, price, image_ref, stock)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(&product.image_ref)
    .bind(product.stock)
    .fetch_one(pool)
    .await?;

    Ok(product)
}

pub async fn update_product(
    pool: &PgPool,
    id: Uuid,
    changes: &ProductChanges,
) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET
            name = COALESCE($1, name),
            description = CASE WHEN $2 THEN $3 ELSE description END,
            price = COALESCE($4, price),
            image_ref = COALESCE($5, image_ref),
            stock = COALESCE($6, stock),
            updated_at = NOW()
        WHERE id = $7
        RETURNING *
        "#,
    )
    .bind(&changes.name)
    .bind(changes.description.is_some())
    .bind(changes.description.clone().flatten())
    .bind(changes.price)
    .bind(&changes.image_ref)
    .bind(changes.stock)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

pub async fn delete_product(pool: &PgPool, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
