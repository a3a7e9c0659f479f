//! # pager-engine
//!
//! Drives paginated operations against a cloud infrastructure API.
//!
//! ## Components
//!
//! - **Request:** Binds operation parameters into an immutable, validated context.
//! - **Paginator:** Follows continuation tokens lazily, one page at a time.
//! - **Emitter:** Forwards pages and their metadata downstream as they arrive.
//! - **Client:** The `CloudApi` seam, with an HTTP/JSON client and a scripted one.
//! - **Session:** Owns the client handle for one logical session.

pub mod emitter;
pub mod error;
pub mod http_client;
pub mod page;
pub mod paginator;
pub mod request;
pub mod scripted;
pub mod session;

use async_trait::async_trait;
use serde_json::Value;

pub use crate::emitter::{CollectingEmitter, JsonLinesEmitter, PageEmitter, Select};
pub use crate::error::PagerError;
pub use crate::http_client::{ClientSettings, HttpApi};
pub use crate::page::{Cursor, Page};
pub use crate::paginator::{Paginator, Summary};
pub use crate::request::{Fields, PaginationMode, RequestBuilder, RequestContext};
pub use crate::scripted::{RecordedCall, ScriptedApi};
pub use crate::session::Session;

/// One page request as handed to a [`CloudApi`]
#[derive(Debug, Clone, Copy)]
pub struct PageQuery<'a> {
    pub operation: &'a str,
    pub fields: &'a Fields,
    pub cursor: Option<&'a Cursor>,
    pub page_size: Option<u32>,
    pub items_key: Option<&'a str>,
}

/// Trait defining the calls the pager makes against the cloud API.
///
/// Implementations perform exactly one request per call: no retries, no
/// backoff. Errors are returned as-is to the caller.
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// Invokes a one-shot operation (create, modify, associate, ...)
    async fn invoke(&self, operation: &str, fields: &Fields) -> Result<Value, PagerError>;

    /// Fetches a single page of a describe/list operation
    async fn invoke_page(&self, query: PageQuery<'_>) -> Result<Page, PagerError>;
}
