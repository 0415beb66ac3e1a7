use axum::{Extension, Json, extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{
    AppState,
    error::Result,
    models::{Caller, Order, OrderPatch, OrderQuery, OrderSubmission},
    utils::extractors::{ApiJson, ApiPath, ApiQuery},
};

pub async fn submit_order(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(payload): ApiJson<OrderSubmission>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = state.orders.submit(&caller, payload).await?;

    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_orders(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiQuery(params): ApiQuery<OrderQuery>,
) -> Result<Json<Vec<Order>>> {
    let orders = state.orders.list(&caller, &params).await?;

    Ok(Json(orders))
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Order>> {
    let order = state.orders.get(&caller, id).await?;

    Ok(Json(order))
}

pub async fn update_order(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<OrderPatch>,
) -> Result<Json<Order>> {
    let order = state.orders.update(&caller, id, payload).await?;

    Ok(Json(order))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode> {
    state.orders.delete(&caller, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
