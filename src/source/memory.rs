use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::PageSource;
use crate::error::{Error, Result};
use crate::model::Page;

/// Pages held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pages: Vec<Page>,
}

impl MemorySource {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    /// Parse a JSON array of pages.
    pub fn from_json(json: &str) -> Result<Self> {
        let pages: Vec<Page> = serde_json::from_str(json)?;
        Ok(Self::new(pages))
    }

    /// Load a page dump written by the raw block export.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let pages: Vec<Page> = serde_json::from_reader(reader)?;
        Ok(Self::new(pages))
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn push(&mut self, page: Page) {
        self.pages.push(page);
    }
}

impl PageSource for MemorySource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> Result<Page> {
        self.pages
            .get(index)
            .cloned()
            .ok_or(Error::PageOutOfRange(index as u32 + 1, self.pages.len() as u32))
    }
}

impl From<Vec<Page>> for MemorySource {
    fn from(pages: Vec<Page>) -> Self {
        Self::new(pages)
    }
}
