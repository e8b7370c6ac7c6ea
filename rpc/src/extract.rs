//! Request extractors.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use runoff_types::Identity;

use crate::error::RpcError;

pub const IDENTITY_HEADER: &str = "x-identity";

/// The authenticated caller, taken from the `x-identity` header.
#[derive(Clone, Debug)]
pub struct Caller(pub Identity);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = RpcError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(IDENTITY_HEADER)
            .ok_or(RpcError::MissingIdentity)?
            .to_str()
            .map_err(|_| RpcError::InvalidRequest("identity header is not visible ASCII".into()))?;
        Identity::new(raw)
            .map(Caller)
            .map_err(|e| RpcError::InvalidRequest(e.to_string()))
    }
}
