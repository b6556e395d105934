//! JSON artifacts.
//!
//! Per document `<doc>` the output directory receives `<doc>_chunks.json`,
//! and optionally `<doc>_spans.json` and `<doc>_blocks.json`. Persisted
//! images live in `<doc>_images/`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize any artifact to a string.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value)?,
        JsonFormat::Compact => serde_json::to_string(value)?,
    };
    Ok(json)
}

/// Write an artifact to `path`, creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, format: JsonFormat) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    match format {
        JsonFormat::Pretty => serde_json::to_writer_pretty(&mut writer, value)?,
        JsonFormat::Compact => serde_json::to_writer(&mut writer, value)?,
    }
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Artifact locations for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub chunks: PathBuf,
    pub spans: PathBuf,
    pub blocks: PathBuf,
    pub images: PathBuf,
}

impl ArtifactPaths {
    /// Paths for document stem `stem` under `output_dir`.
    pub fn new(output_dir: &Path, stem: &str) -> Self {
        Self {
            chunks: output_dir.join(format!("{}_chunks.json", stem)),
            spans: output_dir.join(format!("{}_spans.json", stem)),
            blocks: output_dir.join(format!("{}_blocks.json", stem)),
            images: output_dir.join(format!("{}_images", stem)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, Span};
    use tempfile::TempDir;

    #[test]
    fn test_to_json_formats() {
        let spans = vec![Span::text("Hi", 10.0, false, BBox::default(), 1, 0, 0)];
        let pretty = to_json(&spans, JsonFormat::Pretty).unwrap();
        assert!(pretty.contains('\n'));
        let compact = to_json(&spans, JsonFormat::Compact).unwrap();
        assert!(!compact.contains('\n'));
        assert!(compact.contains("\"text\":\"Hi\""));
    }

    #[test]
    fn test_write_json_creates_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("doc_spans.json");
        write_json(&path, &vec![1, 2, 3], JsonFormat::Compact).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1,2,3]\n");
    }

    #[test]
    fn test_non_ascii_written_verbatim() {
        let json = to_json("Übersicht", JsonFormat::Compact).unwrap();
        assert_eq!(json, "\"Übersicht\"");
    }

    #[test]
    fn test_artifact_paths() {
        let paths = ArtifactPaths::new(Path::new("/out"), "manual");
        assert_eq!(paths.chunks, Path::new("/out/manual_chunks.json"));
        assert_eq!(paths.images, Path::new("/out/manual_images"));
    }
}
