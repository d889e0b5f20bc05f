//! OpenAI-compatible chat-completions client.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::core::catalog::ToolDefinition;
use crate::core::types::{Message, Role, ToolCallRequest};
use crate::io::provider::{ChatProvider, ChatRequest};

/// Provider speaking the `/chat/completions` protocol over HTTPS.
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    http: HttpClient,
}

impl OpenAiProvider {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            http,
        })
    }
}

impl ChatProvider for OpenAiProvider {
    #[instrument(skip_all, fields(model = request.model, messages = request.messages.len(), tools = request.tools.is_some()))]
    fn complete(&self, request: &ChatRequest<'_>) -> Result<Message> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = WireRequest::from_request(request);
        debug!("sending chat completion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .with_context(|| format!("send chat completion to {}", self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            bail!("chat completion failed ({status}): {body}");
        }

        let parsed: WireResponse = response.json().context("parse chat completion response")?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("chat completion returned no choices"))?;
        Ok(choice.message.into_message())
    }
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

impl<'a> WireRequest<'a> {
    fn from_request(request: &ChatRequest<'a>) -> Self {
        Self {
            model: request.model,
            messages: request.messages.iter().map(WireMessage::from_message).collect(),
            tools: request.tools,
            tool_choice: request.tools.map(|_| "auto"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: Role,
    #[serde(default)]
    content: Option<String>,
    /// Absent or `null` on text turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded argument object.
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

impl WireMessage {
    fn from_message(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
            tool_calls: (!message.tool_calls.is_empty()).then(|| {
                message
                    .tool_calls
                    .iter()
                    .map(|call| WireToolCall {
                        id: call.id.clone(),
                        call_type: function_type(),
                        function: WireFunctionCall {
                            name: call.name.clone(),
                            arguments: Value::Object(call.arguments.clone()).to_string(),
                        },
                    })
                    .collect()
            }),
            tool_call_id: message.tool_call_id.clone(),
        }
    }

    fn into_message(self) -> Message {
        Message {
            role: self.role,
            content: self.content,
            tool_calls: self
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(|call| {
                    let arguments = decode_arguments(&call.function.name, &call.function.arguments);
                    ToolCallRequest::new(call.id, call.function.name, arguments)
                })
                .collect(),
            tool_call_id: self.tool_call_id,
        }
    }
}

/// Decode the JSON-encoded argument object of a tool call.
///
/// Undecodable arguments become an empty object; argument validation in the
/// dispatcher then decides whether the call can run.
fn decode_arguments(tool: &str, raw: &str) -> Map<String, Value> {
    if raw.trim().is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            warn!(tool, kind = ?other, "tool arguments are not an object");
            Map::new()
        }
        Err(err) => {
            warn!(tool, err = %err, "tool arguments are not valid JSON");
            Map::new()
        }
    }
}
