//! In-memory document source.
//!
//! Useful for headless runs and tests. A page whose `text` is `None` models a
//! page whose text cannot be extracted.

use crate::{check_page, DocumentSource, PageSize, PdfEngineError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryPage {
    pub width_pt: f32,
    pub height_pt: f32,
    #[serde(default)]
    pub text: Option<String>,
}

impl MemoryPage {
    pub fn new(width_pt: f32, height_pt: f32, text: impl Into<String>) -> Self {
        Self { width_pt, height_pt, text: Some(text.into()) }
    }

    /// A page whose text extraction always fails.
    pub fn unreadable(width_pt: f32, height_pt: f32) -> Self {
        Self { width_pt, height_pt, text: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryDocument {
    pub pages: Vec<MemoryPage>,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl MemoryDocument {
    pub fn new(pages: Vec<MemoryPage>) -> Self {
        Self { pages, source_url: None }
    }

    /// `count` letter-sized pages, each with the text produced by `text_for(page)`.
    pub fn uniform<F>(count: u32, text_for: F) -> Self
    where
        F: Fn(u32) -> String,
    {
        let pages = (1..=count).map(|page| MemoryPage::new(612.0, 792.0, text_for(page))).collect();
        Self::new(pages)
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn from_json(json: &str) -> Result<Self, PdfEngineError> {
        let doc: Self = serde_json::from_str(json)?;
        if doc.pages.is_empty() {
            return Err(PdfEngineError::NoPages);
        }
        Ok(doc)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, PdfEngineError> {
        let contents = fs::read_to_string(path)?;
        let mut doc = Self::from_json(&contents)?;
        if doc.source_url.is_none() {
            doc.source_url = Some(path.display().to_string());
        }
        Ok(doc)
    }

    fn page(&self, page: u32) -> Result<&MemoryPage, PdfEngineError> {
        check_page(page, self.page_count())?;
        Ok(&self.pages[(page - 1) as usize])
    }
}

impl DocumentSource for MemoryDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_size(&self, page: u32) -> Result<PageSize, PdfEngineError> {
        let page = self.page(page)?;
        Ok(PageSize::new(page.width_pt, page.height_pt))
    }

    fn page_text(&self, page: u32) -> Result<String, PdfEngineError> {
        self.page(page)?.text.clone().ok_or(PdfEngineError::TextUnavailable { page })
    }

    fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }
}
