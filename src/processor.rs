use dicom_core::header::Header;
use dicom_object::InMemDicomObject;
use dicom_object::mem::InMemElement;
use log::debug;
use std::borrow::Cow;
use std::sync::Arc;

use crate::actions::errors::ActionError;
use crate::config::Procedure;
use crate::session::Session;

pub type Result<T, E = ActionError> = std::result::Result<T, E>;

/// Everything an action needs to know while a dataset is being walked.
pub struct ProcessContext<'a> {
    processor: &'a dyn Processor,
    session: &'a Session,
    dataset_class: &'a str,
}

impl<'a> ProcessContext<'a> {
    pub fn new(processor: &'a dyn Processor, session: &'a Session, dataset_class: &'a str) -> Self {
        Self {
            processor,
            session,
            dataset_class,
        }
    }

    pub fn session(&self) -> &Session {
        self.session
    }

    pub fn dataset_class(&self) -> &str {
        self.dataset_class
    }

    /// Processes a (nested) dataset with the same processor, session and dataset class.
    pub fn process_dataset(&self, dataset: &InMemDicomObject) -> Result<InMemDicomObject> {
        self.processor.process_dataset(self, dataset)
    }
}

pub trait Processor {
    /// Processes a single data element.
    ///
    /// # Returns
    ///
    /// * `Some(Cow<InMemElement>)` - The processed element, either borrowed or owned
    /// * `None` - If the element should be removed
    /// * `Err` - If the element could not be processed or the file is rejected
    fn process_element<'a>(
        &self,
        ctx: &ProcessContext<'_>,
        elem: &'a InMemElement,
    ) -> Result<Option<Cow<'a, InMemElement>>>;

    /// Processes every element of a dataset and returns the resulting dataset.
    ///
    /// The first error aborts the walk; no partially processed dataset is returned.
    fn process_dataset(
        &self,
        ctx: &ProcessContext<'_>,
        dataset: &InMemDicomObject,
    ) -> Result<InMemDicomObject> {
        let mut elements = Vec::new();
        for elem in dataset {
            if let Some(processed) = self.process_element(ctx, elem)? {
                elements.push(processed.into_owned());
            }
        }
        Ok(InMemDicomObject::from_element_iter(elements))
    }
}

/// A processor for DICOM data elements that applies the actions of a de-identification
/// [`Procedure`].
///
/// The action for each element is resolved from its tag and the dataset class. Elements
/// nested in sequences are handled according to the action of the sequence: kept
/// sequences have their items processed element by element, dummied and pseudonymized
/// sequences have all their nested elements replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultProcessor {
    procedure: Arc<Procedure>,
}

impl DefaultProcessor {
    pub fn new(procedure: Arc<Procedure>) -> Self {
        Self { procedure }
    }

    pub fn procedure(&self) -> &Procedure {
        &self.procedure
    }
}

impl Processor for DefaultProcessor {
    fn process_element<'a>(
        &self,
        ctx: &ProcessContext<'_>,
        elem: &'a InMemElement,
    ) -> Result<Option<Cow<'a, InMemElement>>> {
        let action = self.procedure.resolve(&elem.tag(), ctx.dataset_class());
        debug!("{} {:?}", elem.tag(), action);
        action.get_action_struct().process(ctx, elem)
    }
}

/// A processor that leaves every element as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoopProcessor;

impl NoopProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Processor for NoopProcessor {
    fn process_element<'a>(
        &self,
        _ctx: &ProcessContext<'_>,
        elem: &'a InMemElement,
    ) -> Result<Option<Cow<'a, InMemElement>>> {
        Ok(Some(Cow::Borrowed(elem)))
    }
}
