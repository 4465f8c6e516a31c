//! Batch upload integration: de-identifies every queued file before the upload starts.

use log::error;
use rayon::prelude::*;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::deidentifier::{DeidentificationError, Deidentifier, DicomFile};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub String);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FileId {
    fn from(id: &str) -> Self {
        FileId(id.into())
    }
}

/// A file queued for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub id: FileId,
    pub name: String,
    pub media_type: String,
    pub data: Vec<u8>,
}

impl UploadFile {
    pub fn new(id: impl Into<FileId>, name: &str, media_type: &str, data: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            media_type: media_type.into(),
            data,
        }
    }
}

/// The registry of queued files kept by the upload host.
pub trait FileStore {
    fn get(&self, id: &FileId) -> Option<&UploadFile>;

    /// Replaces the payload of a file, keeping its name and media type.
    fn replace_data(&mut self, id: &FileId, data: Vec<u8>);

    fn remove(&mut self, id: &FileId) -> Option<UploadFile>;
}

/// In-memory [`FileStore`] that keeps files in the order they were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileRegistry {
    files: Vec<UploadFile>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: UploadFile) {
        self.files.push(file);
    }

    pub fn ids(&self) -> Vec<FileId> {
        self.files.iter().map(|f| f.id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UploadFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileStore for FileRegistry {
    fn get(&self, id: &FileId) -> Option<&UploadFile> {
        self.files.iter().find(|f| &f.id == id)
    }

    fn replace_data(&mut self, id: &FileId, data: Vec<u8>) {
        if let Some(file) = self.files.iter_mut().find(|f| &f.id == id) {
            file.data = data;
        }
    }

    fn remove(&mut self, id: &FileId) -> Option<UploadFile> {
        let index = self.files.iter().position(|f| &f.id == id)?;
        Some(self.files.remove(index))
    }
}

/// Shows messages to the user of the upload host.
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// [`Notifier`] that writes messages to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        error!("{}", message);
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error(transparent)]
    Deidentification(#[from] DeidentificationError),

    #[error("file {0} is not queued for upload")]
    MissingFile(FileId),
}

/// Outcome of preparing a single file.
#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    Fulfilled { file_id: FileId },
    Rejected { file_id: FileId, reason: UploadError },
}

impl Settled {
    pub fn file_id(&self) -> &FileId {
        match self {
            Settled::Fulfilled { file_id } | Settled::Rejected { file_id, .. } => file_id,
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settled::Fulfilled { .. })
    }
}

/// Upload hook that replaces each queued file by its de-identified version, or drops it
/// from the queue when it cannot be de-identified.
pub struct DeidentifierPlugin {
    deidentifier: Arc<Deidentifier>,
    session: Arc<Session>,
    notifier: Arc<dyn Notifier + Send + Sync>,
}

impl DeidentifierPlugin {
    pub fn new(deidentifier: Arc<Deidentifier>, session: Arc<Session>) -> Self {
        Self {
            deidentifier,
            session,
            notifier: Arc::new(LogNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier + Send + Sync>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// De-identifies the files with the given ids.
    ///
    /// Files are processed in parallel and independently of each other. De-identified
    /// payloads replace the queued ones; files that fail are removed from `store` and
    /// reported to the notifier. The returned outcomes are in the order of `ids`.
    pub fn prepare_upload<S>(&self, store: &mut S, ids: &[FileId]) -> Vec<Settled>
    where
        S: FileStore + Sync,
    {
        let outcomes: Vec<Result<DicomFile, UploadError>> = {
            let store = &*store;
            ids.par_iter()
                .map(|id| -> Result<DicomFile, UploadError> {
                    let file = store
                        .get(id)
                        .ok_or_else(|| UploadError::MissingFile(id.clone()))?;
                    let input = DicomFile::new(file.name.clone(), file.data.clone());
                    Ok(self.deidentifier.process(&self.session, &input)?)
                })
                .collect()
        };

        ids.iter()
            .zip(outcomes)
            .map(|(id, outcome)| match outcome {
                Ok(output) => {
                    store.replace_data(id, output.data);
                    Settled::Fulfilled {
                        file_id: id.clone(),
                    }
                }
                Err(reason) => {
                    let message = match store.remove(id) {
                        Some(file) => format!(
                            "Could not upload {} ({}): {}",
                            file.name, file.media_type, reason
                        ),
                        None => format!("Could not upload {}: {}", id, reason),
                    };
                    self.notifier.notify(&message);
                    Settled::Rejected {
                        file_id: id.clone(),
                        reason,
                    }
                }
            })
            .collect()
    }
}
