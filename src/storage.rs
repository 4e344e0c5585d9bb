//! Output persistence
//!
//! Files are addressed as `{run_id}_{name}.{ext}` inside one directory.
//! The directory is an explicit value so tests and concurrent servers can
//! each use their own.

use crate::error::ProcessingError;
use crate::processing::{PipelineOutput, SourceImage, Stage};
use crate::run_id::RunId;
use image::ImageFormat;
use serde::Serialize;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Name of the passthrough copy of the decoded upload
pub const ORIGINAL: &str = "original";

/// Encoding used for persisted rasters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    pub const ALL: [Self; 2] = [Self::Png, Self::Jpeg];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
        }
    }
}

/// One file written for a run
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    /// `original` or a stage name
    pub name: String,
    pub file_name: String,
    #[serde(skip)]
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct OutputStore {
    root: PathBuf,
}

impl OutputStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Like [`OutputStore::new`], creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ProcessingError> {
        let store = Self::new(root);
        fs::create_dir_all(&store.root)
            .map_err(|e| ProcessingError::persistence(&store.root, e))?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_name(run_id: &RunId, name: &str, format: OutputFormat) -> String {
        format!("{}_{}.{}", run_id, name, format.extension())
    }

    pub fn archive_name(run_id: &RunId) -> String {
        format!("{}_results.zip", run_id)
    }

    /// Write the original and every stage output of a run.
    ///
    /// All rasters are encoded before the first file is created. If a write
    /// fails, files already written for this call are removed.
    pub fn persist(
        &self,
        run_id: &RunId,
        source: &SourceImage,
        output: &PipelineOutput,
        format: OutputFormat,
    ) -> Result<Vec<StoredFile>, ProcessingError> {
        let mut encoded = Vec::with_capacity(output.len() + 1);
        encoded.push((
            ORIGINAL,
            encode(ORIGINAL, |buf| {
                source.raster().write_to(buf, format.image_format())
            })?,
        ));
        for derived in output.iter() {
            let name = derived.stage.as_str();
            let bytes = encode(name, |buf| {
                derived.image.write_to(buf, format.image_format())
            })?;
            encoded.push((name, bytes));
        }

        fs::create_dir_all(&self.root)
            .map_err(|e| ProcessingError::persistence(&self.root, e))?;

        let mut written: Vec<StoredFile> = Vec::with_capacity(encoded.len());
        for (name, bytes) in encoded {
            let file_name = Self::file_name(run_id, name, format);
            let path = self.root.join(&file_name);
            if let Err(e) = fs::write(&path, &bytes) {
                discard(&written);
                return Err(ProcessingError::persistence(path, e));
            }
            written.push(StoredFile {
                name: name.to_string(),
                file_name,
                path,
            });
        }

        tracing::debug!(run_id = %run_id, files = written.len(), "outputs persisted");
        Ok(written)
    }

    /// Files of a run that exist on disk, original first, then pipeline order
    pub fn files(&self, run_id: &RunId) -> Result<Vec<StoredFile>, ProcessingError> {
        let names = std::iter::once(ORIGINAL).chain(Stage::ALL.iter().map(|s| s.as_str()));

        let mut files = Vec::new();
        for name in names {
            for format in OutputFormat::ALL {
                let file_name = Self::file_name(run_id, name, format);
                let path = self.root.join(&file_name);
                if path.is_file() {
                    files.push(StoredFile {
                        name: name.to_string(),
                        file_name,
                        path,
                    });
                }
            }
        }

        if files.is_empty() {
            return Err(ProcessingError::RunNotFound(run_id.to_string()));
        }
        Ok(files)
    }

    /// Bundle every file of a run into a ZIP archive.
    ///
    /// The archive is also written next to the outputs as
    /// `{run_id}_results.zip`; the returned bytes are its contents.
    pub fn archive(&self, run_id: &RunId) -> Result<Vec<u8>, ProcessingError> {
        let files = self.files(run_id)?;

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for file in &files {
            let bytes = fs::read(&file.path)
                .map_err(|e| ProcessingError::persistence(&file.path, e))?;
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            writer
                .start_file(file.file_name.clone(), options)
                .map_err(|e| ProcessingError::Archive(e.to_string()))?;
            writer
                .write_all(&bytes)
                .map_err(|e| ProcessingError::Archive(e.to_string()))?;
        }
        let bytes = writer
            .finish()
            .map_err(|e| ProcessingError::Archive(e.to_string()))?
            .into_inner();

        let archive_path = self.root.join(Self::archive_name(run_id));
        fs::write(&archive_path, &bytes)
            .map_err(|e| ProcessingError::persistence(&archive_path, e))?;

        tracing::info!(run_id = %run_id, files = files.len(), bytes = bytes.len(), "archive created");
        Ok(bytes)
    }
}

fn encode<F>(name: &str, write: F) -> Result<Vec<u8>, ProcessingError>
where
    F: FnOnce(&mut Cursor<Vec<u8>>) -> image::ImageResult<()>,
{
    let mut buf = Cursor::new(Vec::new());
    write(&mut buf).map_err(|e| ProcessingError::Encode {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(buf.into_inner())
}

/// Best-effort cleanup after a failed write
fn discard(files: &[StoredFile]) {
    for file in files {
        if let Err(e) = fs::remove_file(&file.path) {
            tracing::warn!("Failed to remove {}: {}", file.path.display(), e);
        }
    }
}
