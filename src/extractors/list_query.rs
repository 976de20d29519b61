//! Extract the full request path and decoded query pairs for list endpoints.

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
};

/// Path as the client sent it (before any `nest` prefix stripping) plus query pairs in order.
/// Repeated keys are kept; the filter parser decides what they mean.
#[derive(Clone, Debug, Default)]
pub struct ListParams {
    pub path: String,
    pub query: Vec<(String, String)>,
}

#[async_trait]
impl<S> FromRequestParts<S> for ListParams
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|original| original.0.clone())
            .unwrap_or_else(|| parts.uri.clone());
        let query = uri
            .query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(ListParams {
            path: uri.path().to_string(),
            query,
        })
    }
}
