mod dummy;
pub(crate) mod errors;
mod keep;
mod pseudonymize;
mod reject;
mod remove;

use dicom_object::mem::InMemElement;
use std::borrow::Cow;

use crate::config::{ActionCode, TagPolicy};
use crate::processor::ProcessContext;
use dummy::Dummy;
pub use errors::ActionError;
use keep::Keep;
use pseudonymize::Pseudonymize;
use reject::Reject;
use remove::Remove;

pub(crate) use dummy::dummy_element;
pub(crate) use pseudonymize::pseudonymize_element;

pub trait ProcessElement {
    fn process<'a>(
        &self,
        ctx: &ProcessContext<'_>,
        elem: &'a InMemElement,
    ) -> Result<Option<Cow<'a, InMemElement>>, ActionError>;
}

/// The action resolved for a single data element.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Completely remove the data element from the dataset.
    Remove,

    /// Preserve the data element. Items of a sequence are processed element by element,
    /// each with its own resolved action.
    Keep,

    /// Replace the value with the dummy value of its value representation. Every element
    /// nested in a sequence is replaced, regardless of its own policy.
    Dummy,

    /// Replace every value with a consistently mapped replacement UID. Every element nested
    /// in a sequence is replaced, regardless of its own policy.
    Pseudonymize,

    /// Reject the whole file.
    Reject { justification: String },
}

impl Action {
    pub fn get_action_struct(&self) -> Box<dyn ProcessElement> {
        match self {
            Action::Remove => Box::new(Remove),
            Action::Keep => Box::new(Keep),
            Action::Dummy => Box::new(Dummy),
            Action::Pseudonymize => Box::new(Pseudonymize),
            Action::Reject { justification } => Box::new(Reject::new(justification.clone())),
        }
    }
}

impl From<ActionCode> for Action {
    fn from(code: ActionCode) -> Self {
        match code {
            ActionCode::Remove => Action::Remove,
            ActionCode::Keep => Action::Keep,
            ActionCode::Dummy => Action::Dummy,
            ActionCode::Pseudonymize => Action::Pseudonymize,
            ActionCode::Reject => Action::Reject {
                justification: String::new(),
            },
        }
    }
}

impl From<&TagPolicy> for Action {
    fn from(policy: &TagPolicy) -> Self {
        match policy.default {
            ActionCode::Reject => Action::Reject {
                justification: policy.justification.clone().unwrap_or_default(),
            },
            code => Action::from(code),
        }
    }
}
