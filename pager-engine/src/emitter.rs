use crate::error::PagerError;
use crate::page::Page;
use crate::paginator::Summary;

use serde_json::Value;
use std::io::Write;
use std::str::FromStr;

/// Receives results as they are produced.
pub trait PageEmitter {
    /// Called once per fetched page, in order
    fn emit_page(&mut self, page: &Page) -> Result<(), PagerError>;

    /// Called with the response of a one-shot operation
    fn emit_value(&mut self, value: &Value) -> Result<(), PagerError>;

    /// Called after the last page of a successful run
    fn finish(&mut self, _summary: &Summary) -> Result<(), PagerError> {
        Ok(())
    }
}

/// Which part of a response is written out
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Select {
    /// The result items, one document each
    #[default]
    Items,
    /// The whole response object (`*`)
    Response,
    /// A single named response field; arrays are flattened
    Field(String),
}

impl FromStr for Select {
    type Err = PagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(PagerError::InvalidRequest(
                "select must not be empty".to_string(),
            )),
            "items" => Ok(Select::Items),
            "*" => Ok(Select::Response),
            field => Ok(Select::Field(field.to_string())),
        }
    }
}

impl Select {
    /// Documents to write for one page
    pub fn project_page(&self, page: &Page) -> Vec<Value> {
        match self {
            Select::Items => page.items.clone(),
            Select::Response => vec![Value::Object(page.response.clone())],
            Select::Field(name) => flatten(page.response.get(name)),
        }
    }

    /// Documents to write for a one-shot response
    pub fn project_value(&self, value: &Value) -> Vec<Value> {
        match self {
            Select::Items | Select::Response => vec![value.clone()],
            Select::Field(name) => flatten(value.get(name.as_str())),
        }
    }
}

fn flatten(value: Option<&Value>) -> Vec<Value> {
    match value {
        None => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
    }
}

/// Writes JSON documents, one per line, flushing after every page.
pub struct JsonLinesEmitter<W: Write> {
    out: W,
    select: Select,
    written: usize,
}

impl<W: Write> JsonLinesEmitter<W> {
    pub fn new(out: W, select: Select) -> Self {
        Self {
            out,
            select,
            written: 0,
        }
    }

    /// Number of documents written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_documents(&mut self, documents: Vec<Value>) -> Result<(), PagerError> {
        for document in documents {
            serde_json::to_writer(&mut self.out, &document)
                .map_err(|e| PagerError::Emit(e.into()))?;
            self.out.write_all(b"\n")?;
            self.written += 1;
        }
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> PageEmitter for JsonLinesEmitter<W> {
    fn emit_page(&mut self, page: &Page) -> Result<(), PagerError> {
        let documents = self.select.project_page(page);
        self.write_documents(documents)
    }

    fn emit_value(&mut self, value: &Value) -> Result<(), PagerError> {
        let documents = self.select.project_value(value);
        self.write_documents(documents)
    }

    fn finish(&mut self, _summary: &Summary) -> Result<(), PagerError> {
        self.out.flush()?;
        Ok(())
    }
}

/// Keeps everything it is given in memory.
#[derive(Debug, Default)]
pub struct CollectingEmitter {
    pub pages: Vec<Page>,
    pub values: Vec<Value>,
    pub summary: Option<Summary>,
}

impl CollectingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> impl Iterator<Item = &Value> {
        self.pages.iter().flat_map(|page| page.items.iter())
    }

    pub fn item_count(&self) -> usize {
        self.pages.iter().map(Page::len).sum()
    }
}

impl PageEmitter for CollectingEmitter {
    fn emit_page(&mut self, page: &Page) -> Result<(), PagerError> {
        self.pages.push(page.clone());
        Ok(())
    }

    fn emit_value(&mut self, value: &Value) -> Result<(), PagerError> {
        self.values.push(value.clone());
        Ok(())
    }

    fn finish(&mut self, summary: &Summary) -> Result<(), PagerError> {
        self.summary = Some(summary.clone());
        Ok(())
    }
}
