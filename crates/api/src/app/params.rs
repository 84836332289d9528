//! `RequestParams` extractor: query string plus JSON or form body as one bag.

use axum::async_trait;
use axum::extract::{FromRequest, Query, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Form;
use axum::body::Bytes;
use serde_json::Value;

use stockroom_core::Params;

use crate::app::errors::ApiError;

/// Every parameter of a request. Keys in the query string win over the body.
///
/// Consumes the body, so it must be the last extractor of a handler.
#[derive(Debug, Clone, Default)]
pub struct RequestParams(pub Params);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    None,
}

fn body_kind(req: &Request) -> BodyKind {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("application/json") {
        BodyKind::Json
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        BodyKind::Form
    } else {
        BodyKind::None
    }
}

/// An empty JSON body is an empty bag; a non-object body carries no fields.
fn json_params(bytes: &[u8]) -> Result<Params, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Params::new());
    }
    let body: Value = serde_json::from_slice(bytes).map_err(|e| {
        ApiError::BadRequest(format!("Failed to parse the request body as JSON: {e}"))
    })?;
    Ok(match body {
        Value::Object(map) => Params::from_map(map),
        _ => Params::new(),
    })
}

#[async_trait]
impl<S> FromRequest<S> for RequestParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
            .map(|Query(pairs)| Params::from_pairs(pairs))
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let mut params = match body_kind(&req) {
            BodyKind::Json => {
                let bytes = Bytes::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                json_params(&bytes)?
            }
            BodyKind::Form => {
                let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                Params::from_pairs(pairs)
            }
            BodyKind::None => Params::new(),
        };

        params.merge(query);
        Ok(Self(params))
    }
}
