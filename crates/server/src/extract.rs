use axum::async_trait;
use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;

use crate::errors::ApiError;

/// JSON body extractor whose rejections render as `{"detail": ...}`.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
