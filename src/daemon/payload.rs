//! Request body extractor shared by the JSON API handlers.

use axum::{
    extract::{Form, FromRequest, Json, Request},
    http::header,
};
use serde::de::DeserializeOwned;

use crate::error::ReachPosterError;

/// Deserializes a urlencoded form or a JSON body, chosen by `Content-Type`.
///
/// A request with no body and no content type yields `T::default()`, so the
/// handler reports the missing field itself. Every other rejection becomes a
/// `Validation` error and renders as the usual JSON error body.
pub(crate) struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = ReachPosterError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_ascii_lowercase);

        match content_type.as_deref() {
            Some(kind) if kind.starts_with("application/x-www-form-urlencoded") => {
                let Form(value) = Form::<T>::from_request(req, state)
                    .await
                    .map_err(|rejection| ReachPosterError::Validation(rejection.body_text()))?;
                Ok(Payload(value))
            }
            Some(_) => {
                let Json(value) = Json::<T>::from_request(req, state)
                    .await
                    .map_err(|rejection| ReachPosterError::Validation(rejection.body_text()))?;
                Ok(Payload(value))
            }
            None => {
                let body = axum::body::Bytes::from_request(req, state)
                    .await
                    .map_err(|rejection| ReachPosterError::Validation(rejection.body_text()))?;
                if body.iter().all(u8::is_ascii_whitespace) {
                    return Ok(Payload(T::default()));
                }
                let Json(value) = Json::<T>::from_bytes(&body)
                    .map_err(|rejection| ReachPosterError::Validation(rejection.body_text()))?;
                Ok(Payload(value))
            }
        }
    }
}
