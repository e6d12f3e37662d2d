//! Request-body capture for webhook deliveries.
//!
//! Senders differ in how they encode events: most post JSON, some post
//! url-encoded forms, and a few put parameters in the query string. The
//! extractor folds all of these into one untyped [`serde_json::Value`]
//! without looking at its shape.

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, FormRejection, QueryRejection},
        FromRequest, Query, Request,
    },
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde_json::{json, Map, Value};
use tracing::warn;

type Pairs = Vec<(String, String)>;

/// The full inbound payload: body fields merged with query parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookPayload(pub Value);

#[derive(Debug, thiserror::Error)]
pub enum PayloadRejection {
    #[error("{reason}")]
    Malformed { status: StatusCode, reason: String },
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("payload must not be null")]
    Null,
    #[error("unsupported content type")]
    UnsupportedMediaType,
}

impl IntoResponse for PayloadRejection {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Malformed { status, .. } => *status,
            Self::InvalidJson(_) | Self::Null => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        };
        warn!(%status, error = %self, "webhook payload rejected");
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

impl From<BytesRejection> for PayloadRejection {
    fn from(r: BytesRejection) -> Self {
        Self::Malformed {
            status: r.status(),
            reason: r.body_text(),
        }
    }
}

impl From<FormRejection> for PayloadRejection {
    fn from(r: FormRejection) -> Self {
        Self::Malformed {
            status: r.status(),
            reason: r.body_text(),
        }
    }
}

impl From<QueryRejection> for PayloadRejection {
    fn from(r: QueryRejection) -> Self {
        Self::Malformed {
            status: r.status(),
            reason: r.body_text(),
        }
    }
}

#[derive(Debug, PartialEq)]
enum BodyKind {
    Json,
    Form,
    Unsupported,
}

fn body_kind(headers: &HeaderMap) -> BodyKind {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return BodyKind::Json;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if mime == "application/json" || mime.ends_with("+json") {
        BodyKind::Json
    } else if mime == "application/x-www-form-urlencoded" {
        BodyKind::Form
    } else {
        BodyKind::Unsupported
    }
}

impl<S> FromRequest<S> for WebhookPayload
where
    S: Send + Sync,
{
    type Rejection = PayloadRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<Pairs>::try_from_uri(req.uri())?;

        let payload = match body_kind(req.headers()) {
            BodyKind::Json => {
                let bytes = Bytes::from_request(req, state).await?;
                parse_json(&bytes)?
            }
            BodyKind::Form => {
                let Form(pairs) = Form::<Pairs>::from_request(req, state).await?;
                pairs_to_object(pairs)
            }
            BodyKind::Unsupported => return Err(PayloadRejection::UnsupportedMediaType),
        };

        Ok(Self(merge_query(payload, query)))
    }
}

/// An empty body is an empty object; a literal `null` is refused.
fn parse_json(bytes: &[u8]) -> Result<Value, PayloadRejection> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    match serde_json::from_slice(bytes)? {
        Value::Null => Err(PayloadRejection::Null),
        value => Ok(value),
    }
}

fn pairs_to_object(pairs: Pairs) -> Value {
    let map: Map<String, Value> = pairs
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    Value::Object(map)
}

/// Query parameters fill in keys the body did not set. Non-object payloads
/// are kept as sent.
fn merge_query(payload: Value, query: Pairs) -> Value {
    match payload {
        Value::Object(mut map) => {
            for (k, v) in query {
                map.entry(k).or_insert(Value::String(v));
            }
            Value::Object(map)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers_with(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    fn pairs(list: &[(&str, &str)]) -> Pairs {
        list.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn body_kind_by_content_type() {
        assert_eq!(body_kind(&HeaderMap::new()), BodyKind::Json);
        assert_eq!(body_kind(&headers_with("application/json")), BodyKind::Json);
        assert_eq!(
            body_kind(&headers_with("Application/JSON; charset=utf-8")),
            BodyKind::Json
        );
        assert_eq!(
            body_kind(&headers_with("application/vnd.github+json")),
            BodyKind::Json
        );
        assert_eq!(
            body_kind(&headers_with("application/x-www-form-urlencoded")),
            BodyKind::Form
        );
        assert_eq!(body_kind(&headers_with("text/plain")), BodyKind::Unsupported);
    }

    #[test]
    fn empty_body_is_empty_object() {
        assert_eq!(parse_json(b"").unwrap(), json!({}));
        assert_eq!(parse_json(b"  \n").unwrap(), json!({}));
    }

    #[test]
    fn null_body_is_refused() {
        assert!(matches!(parse_json(b"null"), Err(PayloadRejection::Null)));
    }

    #[test]
    fn malformed_json_is_refused() {
        assert!(matches!(
            parse_json(b"{\"event\":"),
            Err(PayloadRejection::InvalidJson(_))
        ));
    }

    #[test]
    fn scalars_and_arrays_pass_through() {
        assert_eq!(parse_json(b"42").unwrap(), json!(42));
        assert_eq!(parse_json(b"[1,\"a\"]").unwrap(), json!([1, "a"]));
    }

    #[test]
    fn form_pairs_become_strings_last_wins() {
        let value = pairs_to_object(pairs(&[("event", "ping"), ("n", "1"), ("n", "2")]));
        assert_eq!(value, json!({"event": "ping", "n": "2"}));
    }

    #[test]
    fn body_keys_win_over_query() {
        let merged = merge_query(
            json!({"event": "ping"}),
            pairs(&[("event", "query"), ("source", "github")]),
        );
        assert_eq!(merged, json!({"event": "ping", "source": "github"}));
    }

    #[test]
    fn query_is_ignored_for_non_objects() {
        let merged = merge_query(json!([1, 2]), pairs(&[("source", "github")]));
        assert_eq!(merged, json!([1, 2]));
    }
}
