//! Span extraction: flatten page primitives into spans.

use std::path::{Path, PathBuf};

use crate::codec::ImageCodec;
use crate::error::Result;
use crate::model::{ImageData, Page, PageInfo, Primitive, Span};
use crate::source::PageSource;

use super::ChunkerOptions;

/// Output of the extraction stage.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Geometry of every page in source order
    pub pages: Vec<PageInfo>,
    /// Spans in page, primitive, line, run order
    pub spans: Vec<Span>,
    /// Decoded pages, retained only for the raw block export
    pub raw_pages: Vec<Page>,
    /// Images that failed to persist
    pub image_failures: usize,
}

/// Flattens page primitives into spans and persists images.
pub struct SpanExtractor<'a> {
    options: &'a ChunkerOptions,
    codec: ImageCodec,
    image_dir: Option<PathBuf>,
}

impl<'a> SpanExtractor<'a> {
    /// Create an extractor. Images are written to `image_dir` when given and
    /// image extraction is enabled.
    pub fn new(options: &'a ChunkerOptions, image_dir: Option<&Path>) -> Self {
        Self {
            options,
            codec: ImageCodec::new(options.image_quality),
            image_dir: image_dir
                .filter(|_| options.extract_images)
                .map(Path::to_path_buf),
        }
    }

    /// Extract spans from every page of `source`.
    pub fn extract(&self, source: &dyn PageSource) -> Result<Extraction> {
        let mut extraction = Extraction::default();

        for index in 0..source.page_count() {
            let page = source.page(index)?;
            extraction.pages.push(page.info());
            extraction.image_failures += self.extract_page(&page, &mut extraction.spans);
            if self.options.export_blocks {
                extraction.raw_pages.push(page);
            }
        }

        log::debug!(
            "Extracted {} spans from {} pages",
            extraction.spans.len(),
            extraction.pages.len()
        );
        Ok(extraction)
    }

    /// Append the spans of one page; returns the number of image failures.
    pub fn extract_page(&self, page: &Page, out: &mut Vec<Span>) -> usize {
        let mut failures = 0;

        for (block_no, primitive) in page.primitives.iter().enumerate() {
            match primitive {
                Primitive::Text { lines, .. } => {
                    for (line_no, line) in lines.iter().enumerate() {
                        for run in &line.runs {
                            if run.text.trim().is_empty() {
                                continue;
                            }
                            out.push(Span::text(
                                run.text.as_str(),
                                run.font_size,
                                run.bold,
                                run.bbox,
                                page.number,
                                block_no,
                                line_no,
                            ));
                        }
                    }
                }
                Primitive::Image { bbox, image } => {
                    let path = self.persist_image(page.number, block_no, image);
                    if path.is_none() && self.image_dir.is_some() {
                        failures += 1;
                    }
                    out.push(Span::image(*bbox, page.number, block_no, path));
                }
            }
        }

        failures
    }

    /// Write an image as `page_<p>_block_<b>.jpg`; `None` when disabled or
    /// when the payload cannot be decoded.
    fn persist_image(&self, page: u32, block_no: usize, image: &ImageData) -> Option<String> {
        let dir = self.image_dir.as_ref()?;
        let path = dir.join(format!("page_{}_block_{}.jpg", page, block_no));

        match self.codec.persist(image, &path) {
            Ok(()) => Some(path.to_string_lossy().into_owned()),
            Err(e) => {
                log::warn!(
                    "Skipping image on page {} block {}: {}",
                    page,
                    block_no,
                    e
                );
                None
            }
        }
    }
}
