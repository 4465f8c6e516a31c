use dicom_core::header::Header;
use dicom_object::mem::InMemElement;
use std::borrow::Cow;

use crate::actions::ProcessElement;
use crate::actions::errors::ActionError;
use crate::processor::ProcessContext;

/// Action that rejects the whole file as soon as the element is encountered.
#[derive(Debug, Clone, PartialEq)]
pub struct Reject {
    justification: String,
}

impl Reject {
    pub fn new(justification: String) -> Self {
        Self { justification }
    }
}

impl ProcessElement for Reject {
    fn process<'a>(
        &self,
        _ctx: &ProcessContext<'_>,
        elem: &'a InMemElement,
    ) -> Result<Option<Cow<'a, InMemElement>>, ActionError> {
        Err(ActionError::Rejected {
            tag: elem.tag(),
            justification: self.justification.clone(),
        })
    }
}
