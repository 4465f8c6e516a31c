use dicom_core::value::{DataSetSequence, Value};
use dicom_core::{Length, Tag, VR};
use dicom_object::mem::InMemElement;
use dicom_object::meta::{FileMetaTable, FileMetaTableBuilder};
use dicom_object::{FileDicomObject, InMemDicomObject};
use std::sync::Arc;

use crate::config::Procedure;
use crate::processor::{DefaultProcessor, ProcessContext};
use crate::session::Session;

pub(crate) fn make_file_meta() -> FileMetaTable {
    FileMetaTableBuilder::new()
        .media_storage_sop_class_uid("1.2.3")
        .media_storage_sop_instance_uid("2.3.4")
        .transfer_syntax("1.2.840.10008.1.2.1") // Explicit VR Little Endian
        .build()
        .unwrap()
}

/// Serializes a DICOM file holding the given elements.
pub(crate) fn make_dicom_file(elements: Vec<InMemElement>) -> Vec<u8> {
    let mut obj = FileDicomObject::new_empty_with_meta(make_file_meta());
    for elem in elements {
        obj.put(elem);
    }

    let mut data = Vec::new();
    obj.write_all(&mut data).unwrap();
    data
}

pub(crate) fn make_sequence(tag: Tag, items: Vec<InMemDicomObject>) -> InMemElement {
    InMemElement::new(
        tag,
        VR::SQ,
        Value::Sequence(DataSetSequence::new(items, Length::UNDEFINED)),
    )
}

/// Runs `f` with a context for a keep-everything procedure and a fresh session.
pub(crate) fn with_context<T>(f: impl FnOnce(&ProcessContext<'_>) -> T) -> T {
    with_procedure_context(Procedure::default(), f)
}

pub(crate) fn with_procedure_context<T>(
    procedure: Procedure,
    f: impl FnOnce(&ProcessContext<'_>) -> T,
) -> T {
    with_session_context(procedure, &Session::new(), f)
}

pub(crate) fn with_session_context<T>(
    procedure: Procedure,
    session: &Session,
    f: impl FnOnce(&ProcessContext<'_>) -> T,
) -> T {
    let processor = DefaultProcessor::new(Arc::new(procedure));
    let ctx = ProcessContext::new(&processor, session, "");
    f(&ctx)
}
