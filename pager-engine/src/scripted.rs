use crate::error::PagerError;
use crate::page::{Cursor, Page};
use crate::request::Fields;
use crate::{CloudApi, PageQuery};

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A call observed by [`ScriptedApi`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: String,
    pub fields: Fields,
    pub cursor: Option<Cursor>,
    pub page_size: Option<u32>,
}

/// An in-memory `CloudApi` that replays scripted responses in order.
///
/// Every call consumes the next scripted entry. Running out of entries is
/// reported as an error so that unexpected extra fetches fail loudly.
#[derive(Debug, Default)]
pub struct ScriptedApi {
    pages: Mutex<VecDeque<Result<Page, String>>>,
    values: Mutex<VecDeque<Result<Value, String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a chain of pages; every page but the last links to the next one.
    pub fn with_page_chain(sizes: &[usize]) -> Self {
        let api = Self::new();
        let mut next_item = 0;
        for (index, size) in sizes.iter().enumerate() {
            let items = (next_item..next_item + size)
                .map(|n| Value::from(format!("item-{}", n)))
                .collect();
            next_item += size;
            let cursor = if index + 1 < sizes.len() {
                Cursor::new(format!("tok-{}", index + 1))
            } else {
                None
            };
            api.push_page(Page::new(items, cursor));
        }
        api
    }

    pub fn push_page(&self, page: Page) {
        lock(&self.pages).push_back(Ok(page));
    }

    pub fn push_page_error(&self, message: impl Into<String>) {
        lock(&self.pages).push_back(Err(message.into()));
    }

    pub fn push_value(&self, value: Value) {
        lock(&self.values).push_back(Ok(value));
    }

    pub fn push_value_error(&self, message: impl Into<String>) {
        lock(&self.values).push_back(Err(message.into()));
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    fn record(
        &self,
        operation: &str,
        fields: &Fields,
        cursor: Option<&Cursor>,
        page_size: Option<u32>,
    ) {
        lock(&self.calls).push(RecordedCall {
            operation: operation.to_string(),
            fields: fields.clone(),
            cursor: cursor.cloned(),
            page_size,
        });
    }
}

// A poisoned lock only means another test thread panicked; keep the data.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl CloudApi for ScriptedApi {
    async fn invoke(&self, operation: &str, fields: &Fields) -> Result<Value, PagerError> {
        self.record(operation, fields, None, None);
        debug!("Scripted invoke of {}", operation);
        match lock(&self.values).pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(PagerError::Scripted(message)),
            None => Err(PagerError::Scripted(format!(
                "no scripted response left for {}",
                operation
            ))),
        }
    }

    async fn invoke_page(&self, query: PageQuery<'_>) -> Result<Page, PagerError> {
        self.record(query.operation, query.fields, query.cursor, query.page_size);
        debug!(
            "Scripted page of {} (cursor: {:?})",
            query.operation,
            query.cursor.map(Cursor::as_str)
        );
        match lock(&self.pages).pop_front() {
            Some(Ok(page)) => Ok(page),
            Some(Err(message)) => Err(PagerError::Scripted(message)),
            None => Err(PagerError::Scripted(format!(
                "no scripted page left for {}",
                query.operation
            ))),
        }
    }
}
