use dicom_core::Tag;
use thiserror::Error;

/// Formats a tag as eight hex digits without separators, e.g. `00100010`.
pub(crate) fn tag_key(tag: &Tag) -> String {
    format!("{:04X}{:04X}", tag.group(), tag.element())
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error(
        "Image is rejected due to de-identification protocol. Tag: {}; Justification: {justification}",
        tag_key(.tag)
    )]
    Rejected { tag: Tag, justification: String },

    #[error("Unsupported DICOM VR: {0}")]
    UnsupportedRepresentation(String),
}
