use crate::error::PagerError;
use serde_json::{Map, Value};
use std::fmt;

/// Response field carrying the continuation token
pub const NEXT_TOKEN_FIELD: &str = "NextToken";
/// Request field carrying the page size
pub const MAX_RESULTS_FIELD: &str = "MaxResults";

/// Opaque, server-issued continuation token.
///
/// The client never looks inside a cursor; it only hands it back to the
/// server to fetch the next page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
    /// Wraps a token. An empty token means "no more pages" and yields `None`.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a describe/list operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Result items, in server order
    pub items: Vec<Value>,
    /// Continuation token; present if and only if more pages exist
    pub next_cursor: Option<Cursor>,
    /// The response object the page was extracted from
    pub response: Map<String, Value>,
}

impl Page {
    /// Builds a page without a backing response, storing the items under `Items`.
    pub fn new(items: Vec<Value>, next_cursor: Option<Cursor>) -> Self {
        let mut response = Map::new();
        response.insert("Items".to_string(), Value::Array(items.clone()));
        if let Some(cursor) = &next_cursor {
            response.insert(
                NEXT_TOKEN_FIELD.to_string(),
                Value::String(cursor.as_str().to_string()),
            );
        }
        Self {
            items,
            next_cursor,
            response,
        }
    }

    /// Extracts a page from a JSON response object.
    ///
    /// Items are read from `items_key` when given. Otherwise the single
    /// top-level array of the response is used; a response without arrays is
    /// an empty page and a response with several arrays is ambiguous.
    pub fn from_response(body: Value, items_key: Option<&str>) -> Result<Self, PagerError> {
        let response = match body {
            Value::Object(map) => map,
            other => {
                return Err(PagerError::MalformedResponse(format!(
                    "expected a JSON object, got {}",
                    json_type(&other)
                )));
            }
        };

        let next_cursor = match response.get(NEXT_TOKEN_FIELD) {
            None | Some(Value::Null) => None,
            Some(Value::String(token)) => Cursor::new(token.as_str()),
            Some(other) => {
                return Err(PagerError::MalformedResponse(format!(
                    "{} must be a string, got {}",
                    NEXT_TOKEN_FIELD,
                    json_type(other)
                )));
            }
        };

        let items = match items_key {
            Some(key) => match response.get(key) {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(items)) => items.clone(),
                Some(other) => {
                    return Err(PagerError::MalformedResponse(format!(
                        "'{}' must be an array, got {}",
                        key,
                        json_type(other)
                    )));
                }
            },
            None => {
                let arrays: Vec<(&String, &Vec<Value>)> = response
                    .iter()
                    .filter_map(|(key, value)| value.as_array().map(|items| (key, items)))
                    .collect();
                match arrays.as_slice() {
                    [] => Vec::new(),
                    [(_, items)] => items.to_vec(),
                    many => {
                        let keys: Vec<&str> = many.iter().map(|(key, _)| key.as_str()).collect();
                        return Err(PagerError::MalformedResponse(format!(
                            "response has several arrays ({}); name the items key",
                            keys.join(", ")
                        )));
                    }
                }
            }
        };

        Ok(Self {
            items,
            next_cursor,
            response,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the server signalled that more pages follow
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
