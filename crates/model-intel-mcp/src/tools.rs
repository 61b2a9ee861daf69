use serde_json::{json, Value};

use model_intel_core::{
    availability::{extract_availability, AvailabilityTable, DeploymentType},
    error::{ModelIntelError, Result},
    pricing::{discover_regions, fetch_pricing, normalize_pricing, render_pricing_text, validate_region},
    retirement::extract_retirements,
    Config, Document, DocumentSource, PricingSource,
};

use crate::protocol::{
    text_result, RpcError, Request, Response, Tool, INVALID_PARAMS, METHOD_NOT_FOUND, PARSE_ERROR,
    PROTOCOL_VERSION,
};

fn no_args() -> Value {
    json!({"type": "object", "properties": {}})
}

fn string_arg_schema(name: &str, description: &str, required: bool) -> Value {
    let required: Vec<&str> = if required { vec![name] } else { Vec::new() };
    json!({
        "type": "object",
        "properties": {name: {"type": "string", "description": description}},
        "required": required,
    })
}

pub fn tool_list() -> Vec<Tool> {
    vec![
        Tool {
            name: "hello_checker",
            description: "Check that the server is running.",
            input_schema: no_args(),
        },
        Tool {
            name: "get_model_summary",
            description: "Model lifecycle and retirement page for a provider (only \"azure\").",
            input_schema: string_arg_schema("provider", "Provider name, e.g. azure", true),
        },
        Tool {
            name: "get_model_retirements",
            description: "Parsed Azure OpenAI retirement rows as JSON.",
            input_schema: no_args(),
        },
        Tool {
            name: "get_model_pricing",
            description: "Azure OpenAI retail prices for a region, as a text table.",
            input_schema: string_arg_schema("region", "ARM region name, e.g. swedencentral", true),
        },
        Tool {
            name: "get_model_availability",
            description: "Azure OpenAI model availability page as Markdown.",
            input_schema: no_args(),
        },
        Tool {
            name: "get_availability_tables",
            description: "Parsed region availability tables as JSON, optionally for one deployment type.",
            input_schema: string_arg_schema(
                "deployment_type",
                "e.g. \"Global Standard\" or global-batch",
                false,
            ),
        },
        Tool {
            name: "get_pricing_regions",
            description: "Regions that have Azure OpenAI pricing.",
            input_schema: no_args(),
        },
        Tool {
            name: "get_whats_new",
            description: "Latest Azure OpenAI announcements as Markdown.",
            input_schema: no_args(),
        },
    ]
}

fn optional_str<'a>(args: &'a Value, name: &str) -> Result<Option<&'a str>> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ModelIntelError::InvalidInput(format!("argument {name} must be a string"))),
    }
}

fn required_str<'a>(args: &'a Value, name: &str) -> Result<&'a str> {
    optional_str(args, name)?
        .ok_or_else(|| ModelIntelError::InvalidInput(format!("missing argument: {name}")))
}

/// A tool call whose arguments have been checked.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall<'a> {
    Hello,
    Summary { provider: &'a str },
    Retirements,
    Pricing { region: &'a str },
    Availability,
    AvailabilityTables { deployment_type: Option<DeploymentType> },
    Regions,
    WhatsNew,
}

impl<'a> ToolCall<'a> {
    /// Every error here is `InvalidInput`: an unknown tool or a bad argument.
    pub fn parse(name: &str, args: &'a Value) -> Result<Self> {
        Ok(match name {
            "hello_checker" => Self::Hello,
            "get_model_summary" => Self::Summary {
                provider: required_str(args, "provider")?,
            },
            "get_model_retirements" => Self::Retirements,
            "get_model_pricing" => {
                let region = required_str(args, "region")?;
                validate_region(region)?;
                Self::Pricing { region }
            }
            "get_model_availability" => Self::Availability,
            "get_availability_tables" => Self::AvailabilityTables {
                deployment_type: optional_str(args, "deployment_type")?
                    .map(str::parse::<DeploymentType>)
                    .transpose()
                    .map_err(ModelIntelError::InvalidInput)?,
            },
            "get_pricing_regions" => Self::Regions,
            "get_whats_new" => Self::WhatsNew,
            other => return Err(ModelIntelError::InvalidInput(format!("unknown tool: {other}"))),
        })
    }
}

/// Answers MCP requests with data from the injected sources.
pub struct ToolServer<D, P> {
    docs: D,
    prices: P,
    config: Config,
}

impl<D: DocumentSource, P: PricingSource> ToolServer<D, P> {
    pub fn new(docs: D, prices: P, config: Config) -> Self {
        Self {
            docs,
            prices,
            config,
        }
    }

    /// Handle one line of input. `None` when no reply is due.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let response = match serde_json::from_str::<Request>(line) {
            Ok(req) => self.handle(req).await?,
            Err(e) => Response::err(Value::Null, RpcError::new(PARSE_ERROR, format!("parse error: {e}"))),
        };
        match serde_json::to_string(&response) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::error!(error = %e, "could not serialize response");
                None
            }
        }
    }

    pub async fn handle(&self, req: Request) -> Option<Response> {
        let Some(id) = req.id else {
            tracing::debug!(method = %req.method, "notification");
            return None;
        };

        let result = match req.method.as_str() {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {"tools": {}},
                "serverInfo": {"name": "model-intel", "version": env!("CARGO_PKG_VERSION")},
            })),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({"tools": tool_list()})),
            "tools/call" => self.call(&req.params).await,
            other => Err(RpcError::new(METHOD_NOT_FOUND, format!("method not found: {other}"))),
        };

        Some(match result {
            Ok(v) => Response::ok(id, v),
            Err(e) => Response::err(id, e),
        })
    }

    /// Bad arguments are protocol errors; anything that fails while running
    /// the tool is a result flagged `isError`.
    async fn call(&self, params: &Value) -> std::result::Result<Value, RpcError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::new(INVALID_PARAMS, "missing tool name"))?;
        let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
        tracing::info!(tool = name, "tool call");

        let call = ToolCall::parse(name, &args).map_err(|e| match e {
            ModelIntelError::InvalidInput(msg) => RpcError::new(INVALID_PARAMS, msg),
            other => RpcError::new(INVALID_PARAMS, other.to_string()),
        })?;

        match self.run(call).await {
            Ok(text) => Ok(text_result(text, false)),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool failed");
                Ok(text_result(e.to_string(), true))
            }
        }
    }

    async fn document(&self, doc: Document) -> Result<String> {
        self.docs.fetch_document(doc.url(&self.config)).await
    }

    async fn run(&self, call: ToolCall<'_>) -> Result<String> {
        match call {
            ToolCall::Hello => Ok("Welcome to the MCP server.".to_string()),
            ToolCall::Summary { provider } => {
                if provider.eq_ignore_ascii_case("azure") {
                    self.document(Document::Retirements).await
                } else {
                    Ok(format!("Provider '{provider}' is not supported. Please use 'azure'."))
                }
            }
            ToolCall::Retirements => {
                let raw = self.document(Document::Retirements).await?;
                Ok(serde_json::to_string_pretty(&extract_retirements(&raw))?)
            }
            ToolCall::Pricing { region } => {
                let items = fetch_pricing(&self.prices, region, self.config.max_pricing_pages).await?;
                Ok(render_pricing_text(&normalize_pricing(items)))
            }
            ToolCall::Availability => self.document(Document::Availability).await,
            ToolCall::AvailabilityTables { deployment_type } => {
                let raw = self.document(Document::Availability).await?;
                let tables: Vec<AvailabilityTable> = extract_availability(&raw)
                    .into_values()
                    .filter(|t| deployment_type.map_or(true, |w| t.deployment_type == w))
                    .collect();
                Ok(serde_json::to_string_pretty(&tables)?)
            }
            ToolCall::Regions => {
                let regions = discover_regions(&self.prices, self.config.region_discovery_pages).await;
                Ok(serde_json::to_string_pretty(&regions)?)
            }
            ToolCall::WhatsNew => self.document(Document::WhatsNew).await,
        }
    }
}
