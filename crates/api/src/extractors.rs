//! Request extractors.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use gateway_core::Principal;

use crate::response::ApiError;

/// Header carrying the verified group id.
pub const GROUP_ID_HEADER: &str = "X-Group-Id";
/// Header carrying the verified user id.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Publishing principal taken from the identity headers.
///
/// The authenticating proxy in front of the gateway has already verified
/// both ids.
#[derive(Debug, Clone)]
pub struct Publisher(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for Publisher
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let group_id = parts
            .headers
            .get(GROUP_ID_HEADER)
            .and_then(|h| h.to_str().ok());
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok());

        Ok(Publisher(Principal::from_headers(group_id, user_id)?))
    }
}
