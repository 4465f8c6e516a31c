//! Policy driven de-identification of DICOM files.
//!
//! A [`Procedure`](config::Procedure) tells for every tag, optionally per SOP class, what
//! happens to an element: it is removed, kept, replaced with a dummy value, replaced with
//! a consistent pseudonym, or it makes the whole file rejected. The
//! [`Deidentifier`](deidentifier::Deidentifier) applies a procedure to complete files and
//! records the de-identification in the output; the
//! [`DeidentifierPlugin`](upload::DeidentifierPlugin) does so for a batch of files queued
//! for upload.
//!
//! # Example
//!
//! ```no_run
//! use dicom_deidentification::config::Procedure;
//! use dicom_deidentification::deidentifier::{Deidentifier, DicomFile};
//! use dicom_deidentification::session::Session;
//! use std::fs;
//!
//! let procedure = Procedure::from_reader(fs::File::open("procedure.json")?)?;
//! let deidentifier = Deidentifier::new(procedure);
//! let session = Session::new();
//!
//! let file = DicomFile::new("image.dcm", fs::read("image.dcm")?);
//! let output = deidentifier.process(&session, &file)?;
//! fs::write(format!("out/{}", output.name), output.data)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod actions;
pub mod codec;
pub mod config;
pub mod deidentifier;
pub mod dummy;
pub mod processor;
pub mod session;
pub mod upload;

#[cfg(test)]
mod test_utils;

pub use dicom_core::Tag;
pub use dicom_dictionary_std::tags;

pub use actions::ActionError;
pub use deidentifier::{DeidentificationError, Deidentifier, DicomFile};
pub use session::Session;
