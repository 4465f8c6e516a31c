use dicom_object::mem::InMemElement;
use std::borrow::Cow;

use crate::actions::ProcessElement;
use crate::actions::errors::ActionError;
use crate::processor::ProcessContext;

/// Action that completely removes DICOM elements from the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Remove;

impl ProcessElement for Remove {
    fn process<'a>(
        &self,
        _ctx: &ProcessContext<'_>,
        _elem: &'a InMemElement,
    ) -> Result<Option<Cow<'a, InMemElement>>, ActionError> {
        Ok(None)
    }
}
