use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Path, Query, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::{error::AppError, models::Caller, utils::jwt::Claims};

const JSON_DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

pub fn caller_from_claims(claims: Claims) -> Caller {
    Caller::staff(claims.sub, claims.roles)
}

/// `Json` whose rejections are reported as `AppError::Validation`.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

/// `Path` parameters; a value that does not parse is a validation error on `id`.
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| Self(value))
            .map_err(|rejection: PathRejection| AppError::validation("id", rejection.body_text()))
    }
}

pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection: QueryRejection| {
                AppError::validation("query", rejection.body_text())
            })
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let text = err.body_text();
            let detail = text.strip_prefix(JSON_DATA_ERROR_PREFIX).unwrap_or(&text);
            let (field, message) = deserialize_failure(detail);
            AppError::validation(field, message)
        }
        JsonRejection::JsonSyntaxError(_) => {
            AppError::validation("body", "Request body is not valid JSON")
        }
        JsonRejection::MissingJsonContentType(_) => {
            AppError::validation("body", "Expected Content-Type: application/json")
        }
        other => AppError::validation("body", other.body_text()),
    }
}

/// Splits serde's `path: message` detail into a dotted field path and a message.
/// A missing field is appended to the path, so a line without its product id
/// reports `orderedProducts.0.productId`.
fn deserialize_failure(detail: &str) -> (String, String) {
    let (path, message) = match detail.split_once(": ") {
        Some((path, message)) if !path.contains(' ') => (path, message),
        _ => ("", detail),
    };
    let message = message.split(" at line ").next().unwrap_or(message);

    let mut field = path.replace('[', ".").replace(']', "");
    let missing = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next());
    if let Some(name) = missing {
        if !field.is_empty() {
            field.push('.');
        }
        field.push_str(name);
    }

    if field.is_empty() {
        field.push_str("body");
    }

    (field, message.to_string())
}
