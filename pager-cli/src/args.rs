use clap::{Args, Parser, Subcommand};
use pager_engine::{Fields, PagerError, RequestBuilder, RequestContext, Select};
use serde_json::Value;

/// Invoke cloud API operations and page through their results.
///
/// Results are written to stdout as JSON lines.
#[derive(Debug, Parser)]
#[command(name = "pager", version)]
pub struct Cli {
    /// Endpoint URL, overriding PAGER_ENDPOINT__URL
    #[arg(long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    /// What to print: `items`, `*` for whole responses, or a response field.
    /// `items` is always the keyword, so a response field named `items`
    /// cannot be selected
    #[arg(long, global = true, default_value = "items", value_name = "SELECT")]
    pub select: Select,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a one-shot operation (create, modify, associate, ...)
    Invoke(OperationArgs),
    /// Run a describe/list operation, following continuation tokens
    Describe(DescribeArgs),
}

#[derive(Debug, Args)]
pub struct OperationArgs {
    /// Operation name, e.g. DescribeInstances
    pub operation: String,

    /// Request field; the value is parsed as JSON, or taken as a string
    #[arg(short = 'f', long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, Value)>,

    /// Request fields as a JSON object, applied before --field
    #[arg(long, value_name = "JSON", value_parser = parse_input)]
    pub input: Option<Fields>,
}

#[derive(Debug, Args)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub operation: OperationArgs,

    /// Fetch only the page at this token and print the next one
    #[arg(long, value_name = "TOKEN")]
    pub next_token: Option<String>,

    /// Page size requested from the service
    #[arg(long, value_name = "N")]
    pub max_results: Option<u32>,

    /// Stop after the page that brings the total to at least K items
    #[arg(long, value_name = "K")]
    pub max_items: Option<usize>,

    /// Response field holding the result items
    #[arg(long, value_name = "KEY")]
    pub items_key: Option<String>,

    /// Fetch the first page only and print the next token
    #[arg(long)]
    pub no_auto_iteration: bool,
}

impl OperationArgs {
    fn builder(&self) -> RequestBuilder {
        let mut builder = RequestContext::builder(self.operation.as_str())
            .fields(self.input.clone().unwrap_or_default());
        for (name, value) in &self.fields {
            builder = builder.field(name.as_str(), value.clone());
        }
        builder
    }

    pub fn to_request(&self) -> Result<RequestContext, PagerError> {
        self.builder().build()
    }
}

impl DescribeArgs {
    pub fn to_request(&self) -> Result<RequestContext, PagerError> {
        self.operation
            .builder()
            .with_cursor(self.next_token.clone())
            .with_page_size(self.max_results)
            .with_max_items(self.max_items)
            .with_items_key(self.items_key.clone())
            .no_auto_iteration(self.no_auto_iteration)
            .build()
    }
}

fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    if name.is_empty() {
        return Err(format!("missing field name in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

fn parse_input(raw: &str) -> Result<Fields, String> {
    match serde_json::from_str(raw) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err("--input must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {}", e)),
    }
}
