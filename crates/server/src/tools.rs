//! Tool registry and dispatch.
//!
//! Incoming `{name, arguments}` pairs are turned into a typed [`ToolCall`]
//! once, at the boundary; handlers only ever see validated arguments.
//! Every failure past that point is a [`ToolError`], which the protocol
//! reports as data inside a successful response rather than as an HTTP error.

use corpus::{CorpusError, Document, Query, SearchEngine, SearchResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::ServerError;

pub const SEARCH_TOOL: &str = "search";
pub const FETCH_TOOL: &str = "fetch";

/// Tool-level failures, returned to the caller as `{error: {kind, message}}`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: &'static str, message: String },

    #[error("document with id '{0}' not found")]
    NotFound(String),
}

impl ToolError {
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::UnknownTool(_) => "unknown_tool",
            ToolError::InvalidArguments { .. } => "invalid_arguments",
            ToolError::NotFound(_) => "not_found",
        }
    }

    pub fn body(&self) -> ToolErrorBody {
        ToolErrorBody {
            kind: self.kind().to_string(),
            message: self.to_string(),
        }
    }
}

impl From<CorpusError> for ToolError {
    fn from(err: CorpusError) -> Self {
        match err {
            CorpusError::NotFound(id) => ToolError::NotFound(id),
            other => ToolError::InvalidArguments {
                tool: FETCH_TOOL,
                message: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolErrorBody {
    pub kind: String,
    pub message: String,
}

/// Entry of the `tools/list` registry.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    pub output_schema: Value,
}

/// The fixed set of tools this gateway serves.
pub fn registry() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: SEARCH_TOOL,
            description: "Searches for resources using the provided query string and returns matching results.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search query."}
                },
                "required": ["query"]
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "results": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": {"type": "string", "description": "ID of the resource."},
                                "title": {"type": "string", "description": "Title or headline of the resource."},
                                "text": {"type": "string", "description": "Text snippet or summary from the resource."},
                                "url": {"type": ["string", "null"], "description": "URL of the resource. Optional but needed for citations to work."},
                                "score": {"type": "integer", "description": "Relevance score; higher ranks first."}
                            },
                            "required": ["id", "title", "text"]
                        }
                    }
                },
                "required": ["results"]
            }),
        },
        ToolDescriptor {
            name: FETCH_TOOL,
            description: "Retrieves detailed content for a specific resource identified by the given ID.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": {"type": "string", "description": "ID of the resource to fetch."}
                },
                "required": ["id"]
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "id": {"type": "string", "description": "ID of the resource."},
                    "title": {"type": "string", "description": "Title or headline of the fetched resource."},
                    "text": {"type": "string", "description": "Complete textual content of the resource."},
                    "url": {"type": ["string", "null"], "description": "URL of the resource. Optional but needed for citations to work."},
                    "metadata": {
                        "type": ["object", "null"],
                        "additionalProperties": {"type": "string"},
                        "description": "Optional metadata providing additional context."
                    }
                },
                "required": ["id", "title", "text"]
            }),
        },
    ]
}

/// Body of `POST /mcp/tools/call`.
#[derive(Debug, Clone, Deserialize)]
pub struct CallRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Map<String, Value>>,
}

impl CallRequest {
    /// Parse the envelope; anything that is not `{name: string, arguments?:
    /// object}` is a transport-level error.
    pub fn from_slice(body: &[u8]) -> Result<Self, ServerError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ServerError::MalformedEnvelope(
                "request body is empty".to_string(),
            ));
        }
        Ok(serde_json::from_slice(body)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchArgs {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FetchArgs {
    pub id: String,
}

/// A validated tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    Search(SearchArgs),
    Fetch(FetchArgs),
}

impl ToolCall {
    pub fn parse(name: &str, arguments: Map<String, Value>) -> Result<Self, ToolError> {
        match name {
            SEARCH_TOOL => Ok(ToolCall::Search(typed_args(SEARCH_TOOL, arguments)?)),
            FETCH_TOOL => {
                let args: FetchArgs = typed_args(FETCH_TOOL, arguments)?;
                if args.id.trim().is_empty() {
                    return Err(ToolError::InvalidArguments {
                        tool: FETCH_TOOL,
                        message: "document id is required".to_string(),
                    });
                }
                Ok(ToolCall::Fetch(args))
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    pub fn tool_name(&self) -> &'static str {
        match self {
            ToolCall::Search(_) => SEARCH_TOOL,
            ToolCall::Fetch(_) => FETCH_TOOL,
        }
    }
}

fn typed_args<T: for<'de> Deserialize<'de>>(
    tool: &'static str,
    arguments: Map<String, Value>,
) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(arguments)).map_err(|err| ToolError::InvalidArguments {
        tool,
        message: err.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchOutput {
    pub results: Vec<SearchResult>,
}

/// Successful tool result, serialized as the tool's output schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Search(SearchOutput),
    Fetch(Document),
}

/// Executes tool calls against the corpus.
#[derive(Debug, Clone)]
pub struct ToolRouter {
    engine: SearchEngine,
}

impl ToolRouter {
    pub fn new(engine: SearchEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    /// Validate and run `name` with raw JSON arguments.
    pub fn call(&self, name: &str, arguments: Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let outcome = ToolCall::parse(name, arguments).and_then(|call| self.dispatch(&call));

        let tool_label = match name {
            SEARCH_TOOL | FETCH_TOOL => name.to_string(),
            _ => "unknown".to_string(),
        };
        let status = match &outcome {
            Ok(_) => "ok",
            Err(err) => err.kind(),
        };
        metrics::counter!("kb_gateway_tool_calls_total", "tool" => tool_label, "status" => status)
            .increment(1);

        if let Err(err) = &outcome {
            tracing::info!(tool = name, kind = err.kind(), error = %err, "tool call failed");
        }
        outcome
    }

    pub fn dispatch(&self, call: &ToolCall) -> Result<ToolOutput, ToolError> {
        match call {
            ToolCall::Search(args) => {
                let results = self.engine.search(&Query::new(args.query.as_str()));
                tracing::info!(query = %args.query, hits = results.len(), "search executed");
                Ok(ToolOutput::Search(SearchOutput { results }))
            }
            ToolCall::Fetch(args) => {
                let doc = self.engine.store().get(&args.id)?;
                tracing::info!(id = %doc.id, title = %doc.title, "document fetched");
                Ok(ToolOutput::Fetch(doc.clone()))
            }
        }
    }
}
