use axum::extract::{Form, FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// `Form<T>` with every decode failure mapped to a plain 400.
///
/// Validation problems are not decode failures: forms use `#[serde(default)]`
/// so missing fields arrive empty and are reported by `validate()` instead.
pub struct PostForm<T>(pub T);

impl<T, S> FromRequest<S> for PostForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Form::<T>::from_request(req, state).await {
            Ok(Form(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection, "form decode failed");
                Err(AppError::BadRequest)
            }
        }
    }
}
