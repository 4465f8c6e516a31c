use dicom_core::header::Header;
use dicom_core::value::{DataSetSequence, Value};
use dicom_core::{Length, VR};
use dicom_object::InMemDicomObject;
use dicom_object::mem::InMemElement;
use std::borrow::Cow;

use crate::actions::ProcessElement;
use crate::actions::errors::ActionError;
use crate::processor::ProcessContext;

/// Action that preserves DICOM element values unchanged.
///
/// Sequences are not kept as a whole: each item is processed again, so that every nested
/// element gets the action resolved for its own tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Keep;

impl ProcessElement for Keep {
    fn process<'a>(
        &self,
        ctx: &ProcessContext<'_>,
        elem: &'a InMemElement,
    ) -> Result<Option<Cow<'a, InMemElement>>, ActionError> {
        let Value::Sequence(seq) = elem.value() else {
            return Ok(Some(Cow::Borrowed(elem)));
        };

        let items = seq
            .items()
            .iter()
            .map(|item| ctx.process_dataset(item))
            .collect::<Result<Vec<InMemDicomObject>, _>>()?;

        let new_elem = InMemElement::new(
            elem.tag(),
            VR::SQ,
            Value::Sequence(DataSetSequence::new(items, Length::UNDEFINED)),
        );
        Ok(Some(Cow::Owned(new_elem)))
    }
}
