use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    AppState,
    error::AppError,
    models::Caller,
    utils::{extractors::caller_from_claims, jwt},
};

/// Resolves the request's `Caller` and stores it in the request extensions.
///
/// No `Authorization` header means an anonymous caller. A header that is
/// present but unusable is rejected instead of being downgraded.
pub async fn caller_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = match req.headers().get(http::header::AUTHORIZATION) {
        None => Caller::anonymous(),
        Some(value) => {
            let token = value
                .to_str()
                .ok()
                .and_then(|header| header.strip_prefix("Bearer "))
                .ok_or_else(|| AppError::Unauthorized("Invalid token format".to_string()))?;

            let claims = jwt::verify_token(&state.jwt_secret, token.trim()).inspect_err(|e| {
                tracing::warn!("Rejected bearer token: {}", e);
            })?;

            caller_from_claims(claims)
        }
    };

    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}
