use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{ModelIntelError, Result};
use crate::pricing::{validate_region, PricingPage};
use crate::source::{DocumentSource, PricingSource};

const SESSION_HEADER: &str = "mcp-session-id";
const PROTOCOL_VERSION: &str = "2025-03-26";
const DOCS_FETCH_TOOL: &str = "microsoft_docs_fetch";
const OPENAI_FILTER: &str = "contains(productName, 'OpenAI')";

fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(ModelIntelError::from)
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(ModelIntelError::Api { status, body })
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
    #[serde(default)]
    id: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Pick the response for request `id` out of a reply body, which is either
/// plain JSON or a server-sent event stream of JSON messages.
fn parse_rpc_body(content_type: &str, body: &str, id: u64) -> Result<Value> {
    let messages: Vec<JsonRpcResponse> = if content_type.contains("text/event-stream") {
        body.lines()
            .filter_map(|l| l.strip_prefix("data:"))
            .filter_map(|d| serde_json::from_str(d.trim()).ok())
            .collect()
    } else {
        vec![serde_json::from_str(body)?]
    };

    let resp = messages
        .into_iter()
        .find(|m| m.id.as_ref().and_then(Value::as_u64) == Some(id))
        .ok_or_else(|| ModelIntelError::Other(format!("no response for MCP request {id}")))?;

    if let Some(err) = resp.error {
        return Err(ModelIntelError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    resp.result
        .ok_or_else(|| ModelIntelError::Other("MCP response has neither result nor error".into()))
}

/// The document text inside a `tools/call` result.
fn document_text(result: &Value) -> Result<String> {
    let text = result
        .get("content")
        .and_then(Value::as_array)
        .and_then(|items| {
            items.iter().find_map(|c| {
                (c.get("type").and_then(Value::as_str) == Some("text"))
                    .then(|| c.get("text").and_then(Value::as_str))
                    .flatten()
            })
        });

    if result.get("isError").and_then(Value::as_bool) == Some(true) {
        return Err(ModelIntelError::Other(format!(
            "docs fetch failed: {}",
            text.unwrap_or("unknown error")
        )));
    }
    text.map(String::from)
        .ok_or_else(|| ModelIntelError::InvalidInput("docs fetch returned no text content".into()))
}

/// Fetches Learn pages as Markdown through the Microsoft Learn MCP server.
pub struct LearnClient {
    http: Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl LearnClient {
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout_secs)?,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.learn_mcp_url.clone(), config.http_timeout_secs)
    }

    /// POST one JSON-RPC message. Notifications (no id) return `Value::Null`.
    async fn post(
        &self,
        session: Option<&str>,
        method: &str,
        params: Value,
        notify: bool,
    ) -> Result<(Option<String>, Value)> {
        let id = (!notify).then(|| self.next_id.fetch_add(1, Ordering::Relaxed));
        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        let mut req = self
            .http
            .post(&self.endpoint)
            .header(ACCEPT, "application/json, text/event-stream")
            .json(&body);
        if let Some(s) = session {
            req = req.header(SESSION_HEADER, s);
        }
        let resp = check_status(req.send().await?).await?;

        let session = resp
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let text = resp.text().await?;

        match id {
            Some(id) => Ok((session, parse_rpc_body(&content_type, &text, id)?)),
            None => Ok((session, Value::Null)),
        }
    }
}

impl DocumentSource for LearnClient {
    async fn fetch_document(&self, url: &str) -> Result<String> {
        tracing::debug!(url, "fetching document");
        let (session, _) = self
            .post(
                None,
                "initialize",
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {"name": "model-intel", "version": env!("CARGO_PKG_VERSION")},
                }),
                false,
            )
            .await?;
        let session = session.as_deref();

        self.post(session, "notifications/initialized", json!({}), true)
            .await?;

        let (_, result) = self
            .post(
                session,
                "tools/call",
                json!({"name": DOCS_FETCH_TOOL, "arguments": {"url": url}}),
                false,
            )
            .await?;
        document_text(&result)
    }
}

/// Client for the Azure Retail Prices API, restricted to OpenAI products.
pub struct RetailPricesClient {
    http: Client,
    base_url: String,
}

impl RetailPricesClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout_secs)?,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.retail_prices_url.clone(), config.http_timeout_secs)
    }

    /// First-page URL for a region, or for all regions.
    pub fn page_url(&self, region: Option<&str>) -> Result<String> {
        match region {
            Some(r) => {
                validate_region(r)?;
                let filter = format!("{OPENAI_FILTER} and armRegionName eq '{r}'");
                Ok(format!("{}?$filter={}", self.base_url, urlencoding::encode(&filter)))
            }
            None => Ok(format!(
                "{}?$filter={}&$top=100",
                self.base_url,
                urlencoding::encode(OPENAI_FILTER)
            )),
        }
    }
}

impl PricingSource for RetailPricesClient {
    async fn pricing_page(&self, region: Option<&str>, cursor: Option<&str>) -> Result<PricingPage> {
        let url = match cursor {
            Some(c) => c.to_string(),
            None => self.page_url(region)?,
        };
        tracing::debug!(url = %url, "fetching pricing page");
        let resp = check_status(self.http.get(&url).send().await?).await?;
        Ok(resp.json().await?)
    }
}
