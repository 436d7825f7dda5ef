use crate::blocks::Block;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::{Display, Formatter};

/// The remote block store: something that can append children to a parent block or page.
///
/// Each call is one request. Implementations return the reply body as-is. A store that answers with an in-band error
/// object (`{"object": "error", ...}`) should return it as `Ok`; the publisher inspects it. Transport failures go in
/// [`TransportError`], with the reply body attached if there was one.
///
/// Any `FnMut(&str, &[Block]) -> Result<Value, TransportError>` closure is a store.
pub trait BlockStore {
    fn append_children(&mut self, parent_id: &str, children: &[Block]) -> Result<Value, TransportError>;
}

impl<F> BlockStore for F
where
    F: FnMut(&str, &[Block]) -> Result<Value, TransportError>,
{
    fn append_children(&mut self, parent_id: &str, children: &[Block]) -> Result<Value, TransportError> {
        self(parent_id, children)
    }
}

/// A failed request.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportError {
    pub message: String,
    /// The reply body, if the failure came with one.
    pub body: Option<Value>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            body: None,
        }
    }

    /// Attaches a reply body. A string body that holds JSON is parsed.
    pub fn with_body(mut self, body: Value) -> Self {
        let body = match body {
            Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
            other => other,
        };
        self.body = Some(body);
        self
    }

    /// The structured error carried in the body, if there is one.
    pub fn api_error(&self) -> Option<ApiError> {
        self.body.as_ref().and_then(ApiError::from_body)
    }
}

impl std::error::Error for TransportError {}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// A structured error from the remote store: `{"object": "error", "status": 400, "code": "...", "message": "..."}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ApiError {
    pub status: Option<u16>,
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Reads an error body. Anything that's a JSON object counts; missing fields get placeholder values.
    pub fn from_body(body: &Value) -> Option<Self> {
        let obj = body.as_object()?;
        let field = |name: &str| obj.get(name).and_then(Value::as_str).filter(|s| !s.is_empty());
        Some(Self {
            status: obj
                .get("status")
                .and_then(Value::as_u64)
                .and_then(|s| u16::try_from(s).ok()),
            code: field("code").unwrap_or("unknown_error").to_string(),
            message: field("message").unwrap_or("No error message provided").to_string(),
        })
    }

    /// Reads a reply that may be an in-band error; `None` if it isn't one.
    pub fn from_reply(reply: &Value) -> Option<Self> {
        match reply.get("object").and_then(Value::as_str) {
            Some("error") => Self::from_body(reply),
            _ => None,
        }
    }

    /// A human-readable description, with advice for the codes that have an obvious fix.
    pub fn describe(&self) -> String {
        let m = &self.message;
        match self.code.as_str() {
            "validation_error" => format!("Validation Error: {m}"),
            "invalid_request_url" => format!("Invalid Request URL: {m}"),
            "invalid_request" => format!("Invalid Request: {m}"),
            "unauthorized" => format!("Unauthorized: {m}. Please check your Notion API key."),
            "restricted_resource" => {
                format!("Restricted Resource: {m}. The integration may not have access to this page.")
            }
            "object_not_found" => format!(
                "Object Not Found: {m}. The page may not exist or the integration doesn't have access."
            ),
            "rate_limited" => format!("Rate Limited: {m}. Please try again later."),
            "internal_server_error" => format!("Internal Server Error: {m}. This is a Notion API issue."),
            "service_unavailable" => {
                format!("Service Unavailable: {m}. Notion API is temporarily unavailable.")
            }
            code => format!("{code}: {m}"),
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Describes any error body, including ones that aren't objects.
pub fn describe_error_body(body: &Value) -> String {
    match ApiError::from_body(body) {
        Some(err) => err.describe(),
        None => "Unknown error format".to_string(),
    }
}

/// How a reply to one request reads.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Reply {
    /// The store created blocks; `ids` are the ids it reported, in order.
    Created { count: usize, ids: Vec<String> },
    Rejected(ApiError),
    /// Not a JSON object at all.
    Unrecognized,
}

impl Reply {
    pub(crate) fn read(reply: &Value) -> Self {
        if !reply.is_object() {
            return Reply::Unrecognized;
        }
        if let Some(err) = ApiError::from_reply(reply) {
            return Reply::Rejected(err);
        }
        let results = reply.get("results").and_then(Value::as_array);
        let ids = results
            .into_iter()
            .flatten()
            .filter_map(|result| result.get("id").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        Reply::Created {
            count: results.map_or(0, Vec::len),
            ids,
        }
    }
}

/// A store that accepts everything and remembers what it was asked to do.
///
/// Each created block gets an id `dry-run-<n>`, counting from 1 across the store's lifetime.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct DryRunStore {
    next_id: usize,
    requests: Vec<DryRunRequest>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunRequest {
    pub parent_id: String,
    pub child_count: usize,
}

impl DryRunStore {
    pub fn requests(&self) -> &[DryRunRequest] {
        &self.requests
    }
}

impl BlockStore for DryRunStore {
    fn append_children(&mut self, parent_id: &str, children: &[Block]) -> Result<Value, TransportError> {
        self.requests.push(DryRunRequest {
            parent_id: parent_id.to_string(),
            child_count: children.len(),
        });
        let results: Vec<_> = children
            .iter()
            .map(|child| {
                self.next_id += 1;
                json!({"object": "block", "id": format!("dry-run-{}", self.next_id), "type": child.type_name()})
            })
            .collect();
        Ok(json!({"object": "list", "results": results}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::*;
    use crate::util::utils_for_test::*;

    mod describe {
        use super::*;

        #[test]
        fn known_codes() {
            let cases = [
                ("validation_error", "Validation Error: m"),
                ("invalid_request_url", "Invalid Request URL: m"),
                ("invalid_request", "Invalid Request: m"),
                ("unauthorized", "Unauthorized: m. Please check your Notion API key."),
                (
                    "restricted_resource",
                    "Restricted Resource: m. The integration may not have access to this page.",
                ),
                (
                    "object_not_found",
                    "Object Not Found: m. The page may not exist or the integration doesn't have access.",
                ),
                ("rate_limited", "Rate Limited: m. Please try again later."),
                ("internal_server_error", "Internal Server Error: m. This is a Notion API issue."),
                (
                    "service_unavailable",
                    "Service Unavailable: m. Notion API is temporarily unavailable.",
                ),
            ];
            for (code, expect) in cases {
                let body = json!({"object": "error", "status": 400, "code": code, "message": "m"});
                assert_eq!(describe_error_body(&body), expect);
            }
        }

        #[test]
        fn unknown_code_passes_through() {
            let body = json!({"object": "error", "code": "conflict_error", "message": "try again"});
            assert_eq!(describe_error_body(&body), "conflict_error: try again");
        }

        #[test]
        fn missing_fields() {
            assert_eq!(describe_error_body(&json!({})), "unknown_error: No error message provided");
        }

        #[test]
        fn not_an_object() {
            assert_eq!(describe_error_body(&json!("oops")), "Unknown error format");
            assert_eq!(describe_error_body(&json!(null)), "Unknown error format");
        }
    }

    #[test]
    fn transport_error_parses_string_body() {
        let err = TransportError::new("400 Bad Request")
            .with_body(json!(r#"{"object":"error","status":400,"code":"validation_error","message":"bad"}"#));
        unwrap!(err.api_error(), Some(api));
        assert_eq!(
            api,
            ApiError {
                status: Some(400),
                code: "validation_error".to_string(),
                message: "bad".to_string(),
            }
        );
    }

    #[test]
    fn transport_error_without_body() {
        let err = TransportError::new("connection reset");
        assert_eq!(err.api_error(), None);
        assert_eq!(err.to_string(), "connection reset");
    }

    #[test]
    fn transport_error_with_non_json_string_body() {
        let err = TransportError::new("502").with_body(json!("<html>bad gateway</html>"));
        assert_eq!(err.api_error(), None);
    }

    #[test]
    fn read_replies() {
        assert_eq!(
            Reply::read(&json!({"object": "list", "results": [{"id": "a"}, {"id": "b"}]})),
            Reply::Created {
                count: 2,
                ids: vec!["a".to_string(), "b".to_string()]
            }
        );
        assert_eq!(
            Reply::read(&json!({"object": "list"})),
            Reply::Created { count: 0, ids: vec![] }
        );
        unwrap!(
            Reply::read(&json!({"object": "error", "code": "validation_error", "message": "x"})),
            Reply::Rejected(err)
        );
        assert_eq!(err.code, "validation_error");
        assert_eq!(Reply::read(&json!([1, 2])), Reply::Unrecognized);
    }

    #[test]
    fn closures_are_stores() {
        let mut calls = 0;
        let mut store = |_: &str, children: &[Block]| -> Result<Value, TransportError> {
            calls += 1;
            Ok(json!({"results": vec![json!({}); children.len()]}))
        };
        let reply = store.append_children("page", &[Block::Divider]).unwrap();
        assert_eq!(reply["results"].as_array().map(Vec::len), Some(1));
        assert_eq!(calls, 1);
    }

    #[test]
    fn dry_run_assigns_ids() {
        let mut store = DryRunStore::default();
        let first = store.append_children("page", &[paragraph!("a"), Block::Divider]).unwrap();
        let second = store.append_children("dry-run-1", &[paragraph!("b")]).unwrap();
        assert_eq!(first["results"][1]["id"], "dry-run-2");
        assert_eq!(first["results"][1]["type"], "divider");
        assert_eq!(second["results"][0]["id"], "dry-run-3");
        assert_eq!(
            store.requests(),
            [
                DryRunRequest {
                    parent_id: "page".to_string(),
                    child_count: 2
                },
                DryRunRequest {
                    parent_id: "dry-run-1".to_string(),
                    child_count: 1
                },
            ]
        );
    }
}
