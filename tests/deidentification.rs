use dicom_core::value::{DataSetSequence, Value};
use dicom_core::{Length, PrimitiveValue, Tag, VR};
use dicom_deidentification::config::builder::ProcedureBuilder;
use dicom_deidentification::config::{ActionCode, DEFAULT_DATASET_CLASS, Procedure};
use dicom_deidentification::tags;
use dicom_deidentification::upload::{DeidentifierPlugin, FileRegistry, FileStore, Settled, UploadFile};
use dicom_deidentification::{DeidentificationError, Deidentifier, DicomFile, Session};
use dicom_object::mem::InMemElement;
use dicom_object::meta::FileMetaTableBuilder;
use dicom_object::{DefaultDicomObject, FileDicomObject, InMemDicomObject, OpenFileOptions};
use dicom_object::file::ReadPreamble;
use regex::Regex;
use std::io::Cursor;
use std::sync::Arc;

const PROVENANCE_PATTERN: &str =
    r"^grand-challenge-dicom-client-de-identifier:procedure:1\.0:date:\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z$";

fn make_dicom_file(name: &str, elements: Vec<InMemElement>) -> DicomFile {
    let meta = FileMetaTableBuilder::new()
        .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
        .media_storage_sop_instance_uid("9.8.7.6")
        .transfer_syntax("1.2.840.10008.1.2.1")
        .build()
        .unwrap();

    let mut obj = FileDicomObject::new_empty_with_meta(meta);
    for elem in elements {
        obj.put(elem);
    }

    let mut data = Vec::new();
    obj.write_all(&mut data).unwrap();
    DicomFile::new(name, data)
}

fn read(file: &DicomFile) -> DefaultDicomObject {
    OpenFileOptions::new()
        .read_preamble(ReadPreamble::Never)
        .from_reader(Cursor::new(file.data[128..].to_vec()))
        .unwrap()
}

fn sequence(tag: Tag, items: Vec<InMemDicomObject>) -> InMemElement {
    InMemElement::new(
        tag,
        VR::SQ,
        Value::Sequence(DataSetSequence::new(items, Length::UNDEFINED)),
    )
}

fn str_value(obj: &InMemDicomObject, tag: Tag) -> String {
    obj.element(tag)
        .unwrap()
        .to_str()
        .unwrap()
        .trim_end_matches(['\0', ' '])
        .to_string()
}

fn deidentification_methods(obj: &InMemDicomObject) -> Vec<String> {
    obj.element(tags::DEIDENTIFICATION_METHOD)
        .unwrap()
        .to_multi_str()
        .unwrap()
        .iter()
        .map(|v| v.trim_end_matches(['\0', ' ']).to_string())
        .collect()
}

#[test]
fn test_remove_by_default_keep_accession_number() {
    let procedure = ProcedureBuilder::new()
        .default_action(ActionCode::Remove)
        .version("1.0")
        .tag_action(DEFAULT_DATASET_CLASS, tags::ACCESSION_NUMBER, ActionCode::Keep)
        .build();
    let file = make_dicom_file(
        "image.dcm",
        vec![
            InMemElement::new(tags::PATIENT_NAME, VR::PN, Value::from("Doe^John")),
            InMemElement::new(tags::ACCESSION_NUMBER, VR::SH, Value::from("ACC123")),
        ],
    );

    let output = Deidentifier::new(procedure)
        .process(&Session::new(), &file)
        .unwrap();
    assert_eq!(output.name, "image.dcm");

    let obj = read(&output);
    assert!(obj.element_opt(tags::PATIENT_NAME).unwrap().is_none());
    assert_eq!(str_value(&obj, tags::ACCESSION_NUMBER), "ACC123");
    assert_eq!(str_value(&obj, tags::PATIENT_IDENTITY_REMOVED), "YES");

    let methods = deidentification_methods(&obj);
    assert_eq!(methods.len(), 1);
    assert!(Regex::new(PROVENANCE_PATTERN).unwrap().is_match(&methods[0]));
}

#[test]
fn test_pseudonymized_uids_are_consistent_across_files() {
    let procedure = ProcedureBuilder::new()
        .version("1.0")
        .tag_action(DEFAULT_DATASET_CLASS, tags::STUDY_INSTANCE_UID, ActionCode::Pseudonymize)
        .build();
    let deidentifier = Deidentifier::new(procedure);
    let session = Session::new();

    let study = |name: &str, uid: &str| {
        make_dicom_file(
            name,
            vec![InMemElement::new(tags::STUDY_INSTANCE_UID, VR::UI, Value::from(uid))],
        )
    };

    let first = read(&deidentifier.process(&session, &study("a.dcm", "1.2.3.4")).unwrap());
    let second = read(&deidentifier.process(&session, &study("b.dcm", "1.2.3.4")).unwrap());
    let third = read(&deidentifier.process(&session, &study("c.dcm", "1.2.3.5")).unwrap());

    let first_uid = str_value(&first, tags::STUDY_INSTANCE_UID);
    assert_ne!(first_uid, "1.2.3.4");
    assert_eq!(first_uid, str_value(&second, tags::STUDY_INSTANCE_UID));
    assert_ne!(first_uid, str_value(&third, tags::STUDY_INSTANCE_UID));
    assert_eq!(session.uid_map().len(), 2);

    // a new session starts over
    session.clear();
    assert!(session.uid_map().is_empty());
    let fourth = read(&deidentifier.process(&session, &study("d.dcm", "1.2.3.4")).unwrap());
    assert_ne!(first_uid, str_value(&fourth, tags::STUDY_INSTANCE_UID));
}

#[test]
fn test_batch_with_rejected_file() {
    let procedure = ProcedureBuilder::new()
        .version("1.0")
        .reject_tag(DEFAULT_DATASET_CLASS, tags::BURNED_IN_ANNOTATION, "Burned in annotations")
        .build();
    let plugin = DeidentifierPlugin::new(Arc::new(Deidentifier::new(procedure)), Arc::new(Session::new()));

    let pass = make_dicom_file(
        "pass.dcm",
        vec![InMemElement::new(tags::MODALITY, VR::CS, Value::from("CT"))],
    );
    let reject = make_dicom_file(
        "reject.dcm",
        vec![InMemElement::new(tags::BURNED_IN_ANNOTATION, VR::CS, Value::from("YES"))],
    );

    let mut registry = FileRegistry::new();
    registry.add(UploadFile::new("1", &pass.name, "application/dicom", pass.data.clone()));
    registry.add(UploadFile::new("2", &reject.name, "application/dicom", reject.data));

    let ids = registry.ids();
    let settled = plugin.prepare_upload(&mut registry, &ids);

    assert_eq!(settled.len(), 2);
    assert!(settled[0].is_fulfilled());
    match &settled[1] {
        Settled::Rejected { file_id, reason } => {
            assert_eq!(file_id, &ids[1]);
            assert_eq!(
                reason.to_string(),
                "Image is rejected due to de-identification protocol. Tag: 00280301; Justification: Burned in annotations"
            );
        }
        other => panic!("expected a rejection, got {:?}", other),
    }

    assert_eq!(registry.ids(), vec![ids[0].clone()]);
    let stored = registry.get(&ids[0]).unwrap();
    let obj = read(&DicomFile::new(stored.name.clone(), stored.data.clone()));
    assert_eq!(str_value(&obj, tags::MODALITY), "CT");
    assert_eq!(str_value(&obj, tags::PATIENT_IDENTITY_REMOVED), "YES");
}

#[test]
fn test_sequence_actions() {
    let item = || {
        InMemDicomObject::from_element_iter([
            InMemElement::new(tags::REFERENCED_SOP_CLASS_UID, VR::UI, Value::from("1.2.840.10008.5.1.4.1.1.2")),
            InMemElement::new(tags::REFERENCED_SOP_INSTANCE_UID, VR::UI, Value::from("1.2.3.4")),
        ])
    };
    let file = make_dicom_file(
        "image.dcm",
        vec![
            sequence(tags::REFERENCED_IMAGE_SEQUENCE, vec![item()]),
            sequence(tags::REFERENCED_STUDY_SEQUENCE, vec![item()]),
            sequence(tags::REFERENCED_SERIES_SEQUENCE, vec![item()]),
        ],
    );

    // nested policies only apply below kept sequences
    let procedure = ProcedureBuilder::new()
        .tag_action(DEFAULT_DATASET_CLASS, tags::REFERENCED_IMAGE_SEQUENCE, ActionCode::Keep)
        .tag_action(DEFAULT_DATASET_CLASS, tags::REFERENCED_STUDY_SEQUENCE, ActionCode::Dummy)
        .tag_action(DEFAULT_DATASET_CLASS, tags::REFERENCED_SERIES_SEQUENCE, ActionCode::Pseudonymize)
        .tag_action(DEFAULT_DATASET_CLASS, tags::REFERENCED_SOP_CLASS_UID, ActionCode::Remove)
        .tag_action(DEFAULT_DATASET_CLASS, tags::REFERENCED_SOP_INSTANCE_UID, ActionCode::Keep)
        .build();
    let session = Session::new();

    let obj = read(&Deidentifier::new(procedure).process(&session, &file).unwrap());

    let kept = &obj.element(tags::REFERENCED_IMAGE_SEQUENCE).unwrap().items().unwrap()[0];
    assert!(kept.element_opt(tags::REFERENCED_SOP_CLASS_UID).unwrap().is_none());
    assert_eq!(str_value(kept, tags::REFERENCED_SOP_INSTANCE_UID), "1.2.3.4");

    let dummied = &obj.element(tags::REFERENCED_STUDY_SEQUENCE).unwrap().items().unwrap()[0];
    assert_eq!(str_value(dummied, tags::REFERENCED_SOP_CLASS_UID), "1.2.3.4.5.6.7.8.9.0.1.2.3.4.5.6.7.8.9.0");
    assert_eq!(str_value(dummied, tags::REFERENCED_SOP_INSTANCE_UID), "1.2.3.4.5.6.7.8.9.0.1.2.3.4.5.6.7.8.9.0");

    let pseudonymized = &obj.element(tags::REFERENCED_SERIES_SEQUENCE).unwrap().items().unwrap()[0];
    let replacement = session.uid_map().get("1.2.3.4").unwrap();
    assert_eq!(str_value(pseudonymized, tags::REFERENCED_SOP_INSTANCE_UID), replacement);
    assert_ne!(
        str_value(pseudonymized, tags::REFERENCED_SOP_CLASS_UID),
        "1.2.840.10008.5.1.4.1.1.2"
    );
    assert_eq!(session.uid_map().len(), 2);
}

#[test]
fn test_procedure_from_json() {
    let procedure = Procedure::from_json(
        r#"{
            "default": "X",
            "version": "1.0",
            "sopClass": {
                "": {
                    "tag": {
                        "(0008,0050)": {"default": "K"},
                        "(0010,0010)": {"default": "D"},
                        "(0028,0301)": {"default": "R", "justification": "Burned in annotations"}
                    }
                },
                "1.2.840.10008.5.1.4.1.1.7": {
                    "tag": {
                        "(0010,0010)": {"default": "X"}
                    }
                }
            }
        }"#,
    )
    .unwrap();
    let deidentifier = Deidentifier::new(procedure);

    let elements = || {
        vec![
            InMemElement::new(tags::ACCESSION_NUMBER, VR::SH, Value::from("ACC123")),
            InMemElement::new(tags::PATIENT_NAME, VR::PN, Value::from("Doe^John")),
            InMemElement::new(tags::ROWS, VR::US, PrimitiveValue::from(64_u16)),
        ]
    };

    let obj = read(&deidentifier.process(&Session::new(), &make_dicom_file("ct.dcm", elements())).unwrap());
    assert_eq!(str_value(&obj, tags::ACCESSION_NUMBER), "ACC123");
    assert_eq!(str_value(&obj, tags::PATIENT_NAME), "DUMMY^PATIENT^^^");
    assert!(obj.element_opt(tags::ROWS).unwrap().is_none());

    let mut secondary_capture = elements();
    secondary_capture.push(InMemElement::new(
        tags::SOP_CLASS_UID,
        VR::UI,
        Value::from("1.2.840.10008.5.1.4.1.1.7"),
    ));
    let obj = read(
        &deidentifier
            .process(&Session::new(), &make_dicom_file("sc.dcm", secondary_capture))
            .unwrap(),
    );
    assert!(obj.element_opt(tags::PATIENT_NAME).unwrap().is_none());
    assert_eq!(str_value(&obj, tags::ACCESSION_NUMBER), "ACC123");

    let annotated = make_dicom_file(
        "annotated.dcm",
        vec![InMemElement::new(tags::BURNED_IN_ANNOTATION, VR::CS, Value::from("YES"))],
    );
    assert_eq!(
        deidentifier.process(&Session::new(), &annotated),
        Err(DeidentificationError::RejectedTag {
            tag: tags::BURNED_IN_ANNOTATION,
            justification: "Burned in annotations".into(),
        })
    );
}

#[test]
fn test_invalid_file() {
    let deidentifier = Deidentifier::new(Procedure::default());
    let file = DicomFile::new("notes.txt", b"definitely not DICOM".to_vec());

    assert_eq!(
        deidentifier.process(&Session::new(), &file),
        Err(DeidentificationError::InvalidHeader)
    );
    assert_eq!(
        Deidentifier::new(Procedure::default())
            .without_codec()
            .process(&Session::new(), &file),
        Err(DeidentificationError::EngineUnavailable)
    );
}
