use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::session::{Session, SessionUser};

/// The logged-in user of the current session. Rejects with 401 when the
/// session carries no user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        match session.user() {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                tracing::debug!("Rejected request without a session user");
                Err(AppError::Unauthorized)
            }
        }
    }
}
