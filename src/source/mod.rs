//! Page sources.
//!
//! A [`PageSource`] isolates the layout stages from the concrete PDF decoder.
//! [`PdfSource`] reads PDF files through lopdf; [`MemorySource`] serves
//! pages built in code or loaded from a JSON page dump.

mod memory;
mod pdf;

pub use memory::MemorySource;
pub use pdf::{decode_text_simple, PdfSource};

use std::path::Path;

use crate::detect::{detect_input_kind, InputKind};
use crate::error::Result;
use crate::model::Page;

/// Abstract interface for decoded page access.
pub trait PageSource {
    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Decode the page at a 0-based `index`.
    fn page(&self, index: usize) -> Result<Page>;
}

impl<S: PageSource + ?Sized> PageSource for Box<S> {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn page(&self, index: usize) -> Result<Page> {
        (**self).page(index)
    }
}

/// Open a PDF or JSON page dump, chosen by [`detect_input_kind`].
pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Box<dyn PageSource>> {
    let path = path.as_ref();
    match detect_input_kind(path)? {
        InputKind::Pdf => Ok(Box::new(PdfSource::open(path)?)),
        InputKind::PageDump => Ok(Box::new(MemorySource::from_json_file(path)?)),
    }
}
