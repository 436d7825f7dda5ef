//! Sending blocks to the remote store.
//!
//! The store itself is abstract ([`BlockStore`]); this module owns the protocol on top of it: chunking, bisecting
//! rejected chunks, and the heading-by-heading order of collapsible-outline publishing.
mod batch;
mod outline;
mod store;

pub use batch::*;
pub use outline::*;
pub use store::{describe_error_body, ApiError, BlockStore, DryRunRequest, DryRunStore, TransportError};

use serde_json::Value;
use std::fmt::{Display, Formatter};

/// What a publish did.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct PublishReport {
    /// Blocks the store reported creating.
    pub added_count: usize,
    /// Top-level requests: one per chunk, not counting bisection retries.
    pub chunk_count: usize,
    pub warnings: Vec<String>,
    /// Every successful reply, bisection retries included.
    pub raw_responses: Vec<Value>,
    /// Ids of the created blocks, in order, where the store reported them.
    pub created_ids: Vec<String>,
}

impl PublishReport {
    /// Folds a later publish's report into this one.
    pub fn absorb(&mut self, other: PublishReport) {
        self.added_count += other.added_count;
        self.chunk_count += other.chunk_count;
        self.warnings.extend(other.warnings);
        self.raw_responses.extend(other.raw_responses);
        self.created_ids.extend(other.created_ids);
    }
}

/// A failure that aborts the rest of a publish. Blocks already sent stay sent.
#[derive(Debug)]
pub enum PublishError {
    /// A request failed without a structured error body, so there's nothing to bisect on.
    Transport { chunk: usize, error: TransportError },
    /// The store replied with something other than a JSON object.
    UnexpectedResponse { chunk: usize, response: Value },
}

impl std::error::Error for PublishError {}

impl Display for PublishError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishError::Transport { chunk, error } => write!(f, "Failed to send chunk {chunk}: {error}"),
            PublishError::UnexpectedResponse { chunk, response } => {
                write!(f, "Unexpected response for chunk {chunk}: {response}")
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_store {
    use super::*;
    use crate::blocks::Block;
    use serde_json::json;
    use std::collections::HashSet;

    /// An in-memory store that rejects any request containing a block whose text is in `reject`.
    #[derive(Default)]
    pub(crate) struct ScriptedStore {
        pub reject: HashSet<String>,
        pub transport_errors: bool,
        pub omit_ids: bool,
        /// 1-based request number that fails with a transport error and no body.
        pub disconnect_at: Option<usize>,
        /// `(parent id, plain text of each child)` for every request, in order.
        pub requests: Vec<(String, Vec<String>)>,
        /// `(parent id, plain text)` for every block that landed, in order.
        pub landed: Vec<(String, String)>,
    }

    impl ScriptedStore {
        pub fn rejecting<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
            Self {
                reject: texts.into_iter().map(str::to_string).collect(),
                ..Self::default()
            }
        }

        /// Rejections come back as transport errors carrying the error body as a JSON string.
        pub fn as_transport_errors(mut self) -> Self {
            self.transport_errors = true;
            self
        }

        pub fn disconnecting_at(mut self, request: usize) -> Self {
            self.disconnect_at = Some(request);
            self
        }

        pub fn request_sizes(&self) -> Vec<usize> {
            self.requests.iter().map(|(_, texts)| texts.len()).collect()
        }

        pub fn request_texts(&self) -> Vec<Vec<String>> {
            self.requests.iter().map(|(_, texts)| texts.clone()).collect()
        }

        pub fn landed_texts(&self) -> Vec<String> {
            self.landed.iter().map(|(_, text)| text.clone()).collect()
        }
    }

    impl BlockStore for ScriptedStore {
        fn append_children(&mut self, parent_id: &str, children: &[Block]) -> Result<Value, TransportError> {
            let texts: Vec<String> = children.iter().map(Block::plain_text).collect();
            self.requests.push((parent_id.to_string(), texts.clone()));

            if self.disconnect_at == Some(self.requests.len()) {
                return Err(TransportError::new("connection reset"));
            }

            if let Some(bad) = texts.iter().find(|text| self.reject.contains(*text)) {
                let body = json!({
                    "object": "error",
                    "status": 400,
                    "code": "validation_error",
                    "message": format!("{bad} is invalid"),
                });
                if self.transport_errors {
                    return Err(TransportError::new("400 Bad Request").with_body(Value::String(body.to_string())));
                }
                return Ok(body);
            }

            let mut results = Vec::with_capacity(texts.len());
            for text in texts {
                self.landed.push((parent_id.to_string(), text));
                if self.omit_ids {
                    results.push(json!({"object": "block"}));
                } else {
                    results.push(json!({"object": "block", "id": format!("block-{}", self.landed.len())}));
                }
            }
            Ok(json!({"object": "list", "results": results}))
        }
    }
}
