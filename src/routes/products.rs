use axum::{Extension, Json, extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{
    AppState,
    error::Result,
    models::{Caller, Product, ProductPatch, ProductQuery, ProductRequest, ProductResponse},
    utils::extractors::{ApiJson, ApiPath, ApiQuery},
};

fn respond(state: &AppState, product: Product) -> ProductResponse {
    let image_url = state.media.public_url(&product.image_ref);
    ProductResponse { product, image_url }
}

pub async fn list_products(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiQuery(params): ApiQuery<ProductQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    let products = state.catalog.list(&caller, &params).await?;

    Ok(Json(
        products
            .into_iter()
            .map(|product| respond(&state, product))
            .collect(),
    ))
}

pub async fn get_product(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ProductResponse>> {
    let product = state.catalog.get(&caller, id).await?;

    Ok(Json(respond(&state, product)))
}

//STAFF ROUTES
pub async fn create_product(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(payload): ApiJson<ProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let product = state.catalog.create(&caller, payload).await?;

    Ok((StatusCode::CREATED, Json(respond(&state, product))))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ProductPatch>,
) -> Result<Json<ProductResponse>> {
    let product = state.catalog.update(&caller, id, payload).await?;

    Ok(Json(respond(&state, product)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode> {
    state.catalog.delete(&caller, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
