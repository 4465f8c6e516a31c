use chrono::{DateTime, SecondsFormat, Utc};
use dicom_core::value::Value;
use dicom_core::{PrimitiveValue, Tag, VR};
use dicom_dictionary_std::tags;
use dicom_object::mem::InMemElement;
use dicom_object::meta::FileMetaTableBuilder;
use dicom_object::{FileMetaTable, InMemDicomObject};
use log::{debug, info};
use std::sync::Arc;
use thiserror::Error;

use crate::actions::errors::{ActionError, tag_key};
use crate::codec::{Codec, CodecError, DicomRsCodec, has_dicom_header};
use crate::config::{DEFAULT_DATASET_CLASS, Procedure};
use crate::processor::{DefaultProcessor, ProcessContext, Processor};
use crate::session::Session;

/// Identifier of this de-identifier in the provenance entries it writes.
pub const DEIDENTIFIER: &str = "grand-challenge-dicom-client-de-identifier";

const PATIENT_IDENTITY_REMOVED: &str = "YES";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeidentificationError {
    #[error("DICOM de-identification engine is not available")]
    EngineUnavailable,

    #[error("Invalid DICOM file, expected header is missing")]
    InvalidHeader,

    #[error("Unsupported DICOM VR: {0}")]
    UnsupportedRepresentation(String),

    #[error(
        "Image is rejected due to de-identification protocol. Tag: {}; Justification: {justification}",
        tag_key(.tag)
    )]
    RejectedTag { tag: Tag, justification: String },

    #[error("failed to read DICOM file: {0}")]
    ReadError(String),

    #[error("failed to write DICOM file: {0}")]
    WriteError(String),
}

impl From<ActionError> for DeidentificationError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Rejected { tag, justification } => {
                DeidentificationError::RejectedTag { tag, justification }
            }
            ActionError::UnsupportedRepresentation(vr) => {
                DeidentificationError::UnsupportedRepresentation(vr)
            }
        }
    }
}

impl From<CodecError> for DeidentificationError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Read(msg) => DeidentificationError::ReadError(msg),
            CodecError::Write(msg) => DeidentificationError::WriteError(msg),
        }
    }
}

pub type Result<T, E = DeidentificationError> = std::result::Result<T, E>;

/// A named DICOM file as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DicomFile {
    pub name: String,
    pub data: Vec<u8>,
}

impl DicomFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// De-identifies DICOM files according to a [`Procedure`].
///
/// Each file is checked for the DICOM header, parsed, walked element by element, marked
/// as de-identified and serialized again. A file either comes out fully processed, or not
/// at all.
///
/// # Example
///
/// ```
/// use dicom_deidentification::config::builder::ProcedureBuilder;
/// use dicom_deidentification::config::ActionCode;
/// use dicom_deidentification::deidentifier::{DeidentificationError, Deidentifier, DicomFile};
/// use dicom_deidentification::session::Session;
///
/// let procedure = ProcedureBuilder::new()
///     .default_action(ActionCode::Remove)
///     .version("1.0")
///     .build();
/// let deidentifier = Deidentifier::new(procedure);
/// let session = Session::new();
///
/// let file = DicomFile::new("image.dcm", b"not a DICOM file".to_vec());
/// let result = deidentifier.process(&session, &file);
/// assert_eq!(result, Err(DeidentificationError::InvalidHeader));
/// ```
pub struct Deidentifier {
    procedure: Arc<Procedure>,
    processor: Box<dyn Processor + Send + Sync>,
    codec: Option<Box<dyn Codec + Send + Sync>>,
    identifier: String,
}

impl Deidentifier {
    pub fn new(procedure: Procedure) -> Self {
        let procedure = Arc::new(procedure);
        Self {
            processor: Box::new(DefaultProcessor::new(Arc::clone(&procedure))),
            procedure,
            codec: Some(Box::new(DicomRsCodec::new())),
            identifier: DEIDENTIFIER.into(),
        }
    }

    pub fn with_processor(mut self, processor: impl Processor + Send + Sync + 'static) -> Self {
        self.processor = Box::new(processor);
        self
    }

    pub fn with_codec(mut self, codec: impl Codec + Send + Sync + 'static) -> Self {
        self.codec = Some(Box::new(codec));
        self
    }

    /// Drops the codec; every file processed afterwards fails with
    /// [`DeidentificationError::EngineUnavailable`].
    pub fn without_codec(mut self) -> Self {
        self.codec = None;
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    pub fn procedure(&self) -> &Procedure {
        &self.procedure
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// De-identifies a single file, keeping its name.
    pub fn process(&self, session: &Session, file: &DicomFile) -> Result<DicomFile> {
        let result = self.process_data(session, &file.data);
        match &result {
            Ok(_) => info!("de-identified {}", file.name),
            Err(e) => debug!("{}: {}", file.name, e),
        }

        Ok(DicomFile::new(file.name.clone(), result?))
    }

    fn process_data(&self, session: &Session, data: &[u8]) -> Result<Vec<u8>> {
        let codec = self
            .codec
            .as_deref()
            .ok_or(DeidentificationError::EngineUnavailable)?;

        if !has_dicom_header(data) {
            return Err(DeidentificationError::InvalidHeader);
        }

        let obj = codec.read(data)?;
        let dataset_class = dataset_class(&obj);

        let ctx = ProcessContext::new(&*self.processor, session, &dataset_class);
        let mut dataset = self.processor.process_dataset(&ctx, &obj)?;
        self.mark_deidentified(&mut dataset, Utc::now());

        let meta = rebuild_meta(session, obj.meta(), &dataset)?;
        let data = codec.write(&dataset.with_exact_meta(meta))?;
        Ok(data)
    }

    /// Returns the provenance entry for a de-identification at `timestamp`.
    pub fn provenance_entry(&self, timestamp: DateTime<Utc>) -> String {
        format!(
            "{}:procedure:{}:date:{}",
            self.identifier,
            self.procedure.version(),
            timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }

    fn mark_deidentified(&self, dataset: &mut InMemDicomObject, timestamp: DateTime<Utc>) {
        dataset.put(InMemElement::new(
            tags::PATIENT_IDENTITY_REMOVED,
            VR::CS,
            Value::from(PATIENT_IDENTITY_REMOVED),
        ));

        let mut methods = multi_str_values(dataset, tags::DEIDENTIFICATION_METHOD);
        methods.push(self.provenance_entry(timestamp));
        dataset.put(InMemElement::new(
            tags::DEIDENTIFICATION_METHOD,
            VR::LO,
            PrimitiveValue::Strs(methods.into_iter().collect()),
        ));
    }
}

/// Returns the string values of an element in order, empty ones included, or nothing if
/// it is absent, empty or not textual.
fn multi_str_values(dataset: &InMemDicomObject, tag: Tag) -> Vec<String> {
    let Ok(Some(elem)) = dataset.element_opt(tag) else {
        return Vec::new();
    };
    if let Value::Primitive(PrimitiveValue::Empty) = elem.value() {
        return Vec::new();
    }

    elem.value()
        .to_multi_str()
        .map(|values| {
            values
                .iter()
                .map(|v| v.trim_end_matches(['\0', ' ']).to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn string_values(dataset: &InMemDicomObject, tag: Tag) -> Vec<String> {
    multi_str_values(dataset, tag)
        .into_iter()
        .filter(|v| !v.is_empty())
        .collect()
}

fn string_value(dataset: &InMemDicomObject, tag: Tag) -> Option<String> {
    string_values(dataset, tag).into_iter().next()
}

/// The dataset class is the SOP Class UID of the dataset, if it has one.
fn dataset_class(dataset: &InMemDicomObject) -> String {
    string_value(dataset, tags::SOP_CLASS_UID).unwrap_or_else(|| DEFAULT_DATASET_CLASS.into())
}

/// Builds a file meta group that matches the de-identified dataset, keeping the original
/// transfer syntax.
///
/// Without an instance UID in the dataset, the meta group gets a fresh UID from the
/// session. Without a class UID, the original class is kept.
fn rebuild_meta(
    session: &Session,
    original: &FileMetaTable,
    dataset: &InMemDicomObject,
) -> Result<FileMetaTable> {
    let sop_class_uid = string_value(dataset, tags::SOP_CLASS_UID)
        .unwrap_or_else(|| original.media_storage_sop_class_uid().to_string());
    let sop_instance_uid = string_value(dataset, tags::SOP_INSTANCE_UID)
        .unwrap_or_else(|| session.generate_uid());

    FileMetaTableBuilder::new()
        .media_storage_sop_class_uid(sop_class_uid)
        .media_storage_sop_instance_uid(sop_instance_uid)
        .transfer_syntax(original.transfer_syntax())
        .build()
        .map_err(|e| DeidentificationError::WriteError(e.to_string()))
}
