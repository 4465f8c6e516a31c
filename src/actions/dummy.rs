use dicom_core::header::Header;
use dicom_core::value::{DataSetSequence, Value};
use dicom_core::{Length, VR};
use dicom_object::InMemDicomObject;
use dicom_object::mem::InMemElement;
use std::borrow::Cow;

use crate::actions::ProcessElement;
use crate::actions::errors::ActionError;
use crate::dummy::dummy_value;
use crate::processor::ProcessContext;

/// Action that replaces DICOM element values with the dummy value of their value
/// representation.
///
/// For sequences, the structure is kept and every nested element is replaced by its
/// dummy value, whatever action would have been resolved for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Dummy;

impl ProcessElement for Dummy {
    fn process<'a>(
        &self,
        _ctx: &ProcessContext<'_>,
        elem: &'a InMemElement,
    ) -> Result<Option<Cow<'a, InMemElement>>, ActionError> {
        Ok(Some(Cow::Owned(dummy_element(elem))))
    }
}

pub(crate) fn dummy_element(elem: &InMemElement) -> InMemElement {
    match elem.value() {
        Value::Sequence(seq) => {
            let items: Vec<InMemDicomObject> = seq.items().iter().map(dummy_dataset).collect();
            InMemElement::new(
                elem.tag(),
                VR::SQ,
                Value::Sequence(DataSetSequence::new(items, Length::UNDEFINED)),
            )
        }
        _ => InMemElement::new(elem.tag(), elem.vr(), dummy_value(elem.vr())),
    }
}

fn dummy_dataset(item: &InMemDicomObject) -> InMemDicomObject {
    InMemDicomObject::from_element_iter(item.iter().map(dummy_element))
}
