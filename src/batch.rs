//! Batch processing over a directory of documents.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::pipeline::{artifact_stem, ChunkStats, DocumentChunker, DocumentOutput};
use crate::select::FileSelector;

/// Outcome of one successfully processed document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub input: PathBuf,
    pub document_name: String,
    pub chunks_path: PathBuf,
    pub stats: ChunkStats,
}

impl From<(PathBuf, DocumentOutput)> for DocumentSummary {
    fn from((input, output): (PathBuf, DocumentOutput)) -> Self {
        Self {
            input,
            document_name: output.document_name,
            chunks_path: output.chunks_path,
            stats: output.stats,
        }
    }
}

/// A document that failed; the rest of the batch still ran.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub input: PathBuf,
    pub error: String,
}

/// Results of a batch run, in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub documents: Vec<DocumentSummary>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total_chunks(&self) -> usize {
        self.documents.iter().map(|d| d.stats.chunks).sum()
    }

    pub fn total_tokens(&self) -> usize {
        self.documents.iter().map(|d| d.stats.total_tokens).sum()
    }
}

/// Runs a [`DocumentChunker`] over every selected file in a directory.
///
/// Documents share no state, so with `parallel` enabled they are spread
/// over the rayon pool. Stages inside a document always run in order.
pub struct BatchRunner {
    chunker: DocumentChunker,
}

impl BatchRunner {
    pub fn new(chunker: DocumentChunker) -> Self {
        Self { chunker }
    }

    pub fn chunker(&self) -> &DocumentChunker {
        &self.chunker
    }

    /// Resolve inputs and process them.
    ///
    /// Fails before any work when the selection is empty. Per-document
    /// failures are logged and collected in the report.
    pub fn run(
        &self,
        input_dir: &Path,
        selector: &FileSelector,
        output_dir: &Path,
    ) -> Result<BatchReport> {
        let inputs = selector.resolve(input_dir)?;
        Ok(self.run_files(&inputs, output_dir))
    }

    /// Process an explicit list of files.
    pub fn run_files(&self, inputs: &[PathBuf], output_dir: &Path) -> BatchReport {
        self.run_files_with(inputs, output_dir, |_| {})
    }

    /// Process files, calling `on_done` after each document.
    pub fn run_files_with<F>(&self, inputs: &[PathBuf], output_dir: &Path, on_done: F) -> BatchReport
    where
        F: Fn(&Path) + Sync,
    {
        log::info!(
            "Processing {} document(s){}",
            inputs.len(),
            if self.chunker.options().parallel {
                " in parallel"
            } else {
                ""
            }
        );

        let collisions = stem_collisions(inputs);
        let process = |(index, input): (usize, &PathBuf)| {
            let result = match collisions.get(&index) {
                Some(first) => Err(Error::InvalidConfig(format!(
                    "artifact name '{}' is already used by {}",
                    artifact_stem(&file_name(input)),
                    first.display()
                ))),
                None => self.chunker.process_file(input, output_dir),
            };
            on_done(input);
            (input.clone(), result)
        };
        let results: Vec<(PathBuf, Result<DocumentOutput>)> = if self.chunker.options().parallel {
            inputs.par_iter().enumerate().map(process).collect()
        } else {
            inputs.iter().enumerate().map(process).collect()
        };

        let mut report = BatchReport::default();
        for (input, result) in results {
            match result {
                Ok(output) => report.documents.push((input, output).into()),
                Err(e) => {
                    log::warn!("Failed to process {}: {}", input.display(), e);
                    report.failures.push(BatchFailure {
                        input,
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Inputs whose artifact stem was already claimed by an earlier input,
/// mapped to that earlier input. Stems compare case-insensitively.
fn stem_collisions(inputs: &[PathBuf]) -> HashMap<usize, PathBuf> {
    let mut claimed: HashMap<String, &PathBuf> = HashMap::new();
    let mut collisions = HashMap::new();
    for (index, input) in inputs.iter().enumerate() {
        let key = artifact_stem(&file_name(input)).to_lowercase();
        match claimed.get(&key) {
            Some(first) => {
                collisions.insert(index, (*first).clone());
            }
            None => {
                claimed.insert(key, input);
            }
        }
    }
    collisions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::WhitespaceTokenizer;
    use crate::model::{BBox, Chunk, Page, TextLine, TextRun};
    use crate::parser::ChunkerOptions;
    use crate::source::MemorySource;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write_dump(dir: &Path, name: &str, text: &str) {
        let mut page = Page::letter(1);
        page.add_text(vec![TextLine::from_runs(vec![TextRun::new(
            text,
            10.0,
            false,
            BBox::new(72.0, 200.0, 400.0, 210.0),
        )])]);
        let json = serde_json::to_string(MemorySource::new(vec![page]).pages()).unwrap();
        fs::write(dir.join(name), json).unwrap();
    }

    fn runner(parallel: bool) -> BatchRunner {
        let options = ChunkerOptions::default().with_parallel(parallel);
        let chunker = DocumentChunker::with_tokenizer(options, Arc::new(WhitespaceTokenizer)).unwrap();
        BatchRunner::new(chunker)
    }

    #[test]
    fn test_failures_do_not_abort() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_dump(input.path(), "a.json", "First document body.");
        fs::write(input.path().join("b.pdf"), b"not a pdf").unwrap();
        write_dump(input.path(), "c.json", "Third document body.");

        for parallel in [false, true] {
            let report = runner(parallel)
                .run(input.path(), &FileSelector::All, output.path())
                .unwrap();
            assert_eq!(report.documents.len(), 2);
            assert_eq!(report.failures.len(), 1);
            assert!(report.failures[0].input.ends_with("b.pdf"));
            assert_eq!(report.documents[0].document_name, "a.json");
            assert_eq!(report.total_chunks(), 2);
            assert!(!report.is_success());
        }
        assert!(output.path().join("a_chunks.json").exists());
        assert!(output.path().join("c_chunks.json").exists());
    }

    #[test]
    fn test_empty_selection_fails_fast() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_dump(input.path(), "a.json", "Body.");
        let selector = FileSelector::parse("*.pdf").unwrap();
        let result = runner(false).run(input.path(), &selector, output.path());
        assert!(matches!(result, Err(Error::NoMatchingInput(_))));
        assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_shared_stem_reported_not_overwritten() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_dump(input.path(), "a.json", "Page dump body.");
        fs::write(input.path().join("a.pdf"), b"%PDF-1.4\n").unwrap();

        for parallel in [false, true] {
            let report = runner(parallel)
                .run(input.path(), &FileSelector::All, output.path())
                .unwrap();
            assert_eq!(report.documents.len(), 1);
            assert_eq!(report.documents[0].document_name, "a.json");
            assert_eq!(report.failures.len(), 1);
            assert!(report.failures[0].input.ends_with("a.pdf"));
            assert!(report.failures[0].error.contains("a.json"));
        }

        let written: Vec<Chunk> = serde_json::from_str(
            &fs::read_to_string(output.path().join("a_chunks.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(written[0].text, "Page dump body.");
    }

    #[test]
    fn test_stem_collisions() {
        let inputs = vec![
            PathBuf::from("in/a.json"),
            PathBuf::from("in/a.pdf"),
            PathBuf::from("in/b.pdf"),
            PathBuf::from("in/A.PDF"),
        ];
        let collisions = stem_collisions(&inputs);
        assert_eq!(collisions.len(), 2);
        assert_eq!(collisions[&1], PathBuf::from("in/a.json"));
        assert_eq!(collisions[&3], PathBuf::from("in/a.json"));
    }
}
