use crate::error::PagerError;
use crate::page::{Cursor, MAX_RESULTS_FIELD, NEXT_TOKEN_FIELD};
use serde_json::{Map, Value};

/// Request fields (filters, IDs, ...) as sent to the service
pub type Fields = Map<String, Value>;

/// How the paginator follows continuation tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationMode {
    /// Follow tokens until the last page or the item cap
    Auto,
    /// Fetch a single page and hand the token back to the caller
    Manual,
}

/// The bound, validated parameters of one operation invocation.
///
/// A context is immutable once built. The continuation token that changes
/// while paginating is owned by the paginator, not by the context.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    operation: String,
    fields: Fields,
    cursor: Option<Cursor>,
    page_size: Option<u32>,
    max_items: Option<usize>,
    items_key: Option<String>,
    no_auto_iteration: bool,
}

impl RequestContext {
    pub fn builder(operation: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(operation)
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Cursor supplied by the caller, if any
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    /// Page size hint sent to the service as `MaxResults`
    pub fn page_size(&self) -> Option<u32> {
        self.page_size
    }

    /// Cap on the total number of items across pages
    pub fn max_items(&self) -> Option<usize> {
        self.max_items
    }

    pub fn items_key(&self) -> Option<&str> {
        self.items_key.as_deref()
    }

    /// An explicit cursor or the no-auto-iteration switch hands pagination to
    /// the caller. An item cap only bounds automatic pagination.
    pub fn mode(&self) -> PaginationMode {
        if self.cursor.is_some() || self.no_auto_iteration {
            PaginationMode::Manual
        } else {
            PaginationMode::Auto
        }
    }

    /// Whether any pagination option was bound
    pub fn has_pagination_options(&self) -> bool {
        self.cursor.is_some()
            || self.page_size.is_some()
            || self.max_items.is_some()
            || self.items_key.is_some()
            || self.no_auto_iteration
    }

    /// Copy of this context that resumes from `cursor`.
    pub fn resumed_from(&self, cursor: Cursor) -> Self {
        Self {
            cursor: Some(cursor),
            ..self.clone()
        }
    }
}

/// Builder binding parameters into a [`RequestContext`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    operation: String,
    fields: Fields,
    cursor: Option<String>,
    page_size: Option<u32>,
    max_items: Option<usize>,
    items_key: Option<String>,
    no_auto_iteration: bool,
}

impl RequestBuilder {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            fields: Fields::new(),
            cursor: None,
            page_size: None,
            max_items: None,
            items_key: None,
            no_auto_iteration: false,
        }
    }

    /// Sets a single field, replacing any previous value.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Merges a map of fields; later values win.
    pub fn fields(mut self, fields: Fields) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn with_cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_items(mut self, max_items: Option<usize>) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn with_items_key(mut self, items_key: Option<String>) -> Self {
        self.items_key = items_key;
        self
    }

    pub fn no_auto_iteration(mut self, enabled: bool) -> Self {
        self.no_auto_iteration = enabled;
        self
    }

    /// Validates the bound parameters and freezes them.
    pub fn build(self) -> Result<RequestContext, PagerError> {
        if self.operation.is_empty() {
            return Err(PagerError::InvalidRequest(
                "operation name must not be empty".to_string(),
            ));
        }
        if !self.operation.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PagerError::InvalidRequest(format!(
                "invalid operation name '{}'",
                self.operation
            )));
        }
        for reserved in [NEXT_TOKEN_FIELD, MAX_RESULTS_FIELD] {
            if self.fields.contains_key(reserved) {
                return Err(PagerError::InvalidRequest(format!(
                    "'{}' is managed by the paginator and cannot be set as a field",
                    reserved
                )));
            }
        }
        if self.page_size == Some(0) {
            return Err(PagerError::InvalidRequest(
                "page size must be at least 1".to_string(),
            ));
        }
        let cursor = match self.cursor {
            Some(token) => Some(Cursor::new(token).ok_or_else(|| {
                PagerError::InvalidRequest("an explicit cursor must not be empty".to_string())
            })?),
            None => None,
        };
        if matches!(self.items_key.as_deref(), Some("")) {
            return Err(PagerError::InvalidRequest(
                "items key must not be empty".to_string(),
            ));
        }

        Ok(RequestContext {
            operation: self.operation,
            fields: self.fields,
            cursor,
            page_size: self.page_size,
            max_items: self.max_items,
            items_key: self.items_key,
            no_auto_iteration: self.no_auto_iteration,
        })
    }
}
