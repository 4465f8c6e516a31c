use dicom_core::header::Header;
use dicom_core::value::{DataSetSequence, Value};
use dicom_core::{Length, PrimitiveValue, VR};
use dicom_object::InMemDicomObject;
use dicom_object::mem::InMemElement;
use log::warn;
use std::borrow::Cow;

use crate::actions::ProcessElement;
use crate::actions::dummy_element;
use crate::actions::errors::ActionError;
use crate::dummy::is_textual;
use crate::processor::ProcessContext;
use crate::session::Session;

/// Action that replaces every value of a DICOM element with a replacement UID, using the
/// session's UID map so that equal values get equal replacements across files.
///
/// For sequences, every nested element is pseudonymized, whatever action would have been
/// resolved for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Pseudonymize;

impl ProcessElement for Pseudonymize {
    fn process<'a>(
        &self,
        ctx: &ProcessContext<'_>,
        elem: &'a InMemElement,
    ) -> Result<Option<Cow<'a, InMemElement>>, ActionError> {
        Ok(Some(pseudonymize_element(ctx.session(), elem)))
    }
}

pub(crate) fn pseudonymize_element<'a>(
    session: &Session,
    elem: &'a InMemElement,
) -> Cow<'a, InMemElement> {
    match elem.value() {
        Value::Sequence(seq) => {
            let items: Vec<InMemDicomObject> = seq
                .items()
                .iter()
                .map(|item| pseudonymize_dataset(session, item))
                .collect();
            Cow::Owned(InMemElement::new(
                elem.tag(),
                VR::SQ,
                Value::Sequence(DataSetSequence::new(items, Length::UNDEFINED)),
            ))
        }
        Value::Primitive(PrimitiveValue::Empty) => Cow::Borrowed(elem),
        Value::Primitive(value) if is_textual(elem.vr()) => {
            let replacements: Vec<String> = value
                .to_multi_str()
                .iter()
                .map(|v| v.trim_end_matches(['\0', ' ']))
                .map(|v| {
                    if v.is_empty() {
                        String::new()
                    } else {
                        session.pseudonymize(v)
                    }
                })
                .collect();
            Cow::Owned(InMemElement::new(
                elem.tag(),
                elem.vr(),
                PrimitiveValue::Strs(replacements.into_iter().collect()),
            ))
        }
        _ => {
            warn!(
                "tag {} with VR {} cannot hold a replacement UID, using a dummy value instead",
                elem.tag(),
                elem.vr()
            );
            Cow::Owned(dummy_element(elem))
        }
    }
}

fn pseudonymize_dataset(session: &Session, item: &InMemDicomObject) -> InMemDicomObject {
    InMemDicomObject::from_element_iter(
        item.iter()
            .map(|elem| pseudonymize_element(session, elem).into_owned()),
    )
}
