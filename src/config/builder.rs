use crate::config::{ActionCode, Procedure, TagPolicy};
use dicom_core::Tag;

/// A builder for [`Procedure`] to assemble a de-identification procedure in code.
///
/// # Example
///
/// ```
/// use dicom_deidentification::config::builder::ProcedureBuilder;
/// use dicom_deidentification::config::{ActionCode, DEFAULT_DATASET_CLASS};
/// use dicom_deidentification::tags;
///
/// let procedure = ProcedureBuilder::new()
///     .default_action(ActionCode::Remove)
///     .version("1.0")
///     .tag_action(DEFAULT_DATASET_CLASS, tags::ACCESSION_NUMBER, ActionCode::Keep)
///     .tag_action(DEFAULT_DATASET_CLASS, tags::SOP_INSTANCE_UID, ActionCode::Pseudonymize)
///     .reject_tag(DEFAULT_DATASET_CLASS, tags::BURNED_IN_ANNOTATION, "Burned in annotations")
///     .build();
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcedureBuilder(Procedure);

impl ProcedureBuilder {
    pub fn new() -> Self {
        ProcedureBuilder(Procedure::default())
    }

    /// Starts from an existing [`Procedure`].
    pub fn from_procedure(procedure: &Procedure) -> Self {
        ProcedureBuilder(procedure.clone())
    }

    /// Sets the action for all tags without a specific override.
    pub fn default_action(mut self, code: ActionCode) -> Self {
        self.0.default = Some(code);
        self
    }

    /// Sets the version label that ends up in the de-identification method description.
    pub fn version(mut self, version: &str) -> Self {
        self.0.version = version.into();
        self
    }

    /// Sets the action for a tag in datasets of the given class.
    ///
    /// Use [`DEFAULT_DATASET_CLASS`](crate::config::DEFAULT_DATASET_CLASS) for overrides
    /// that apply to every class.
    pub fn tag_action(self, dataset_class: &str, tag: Tag, code: ActionCode) -> Self {
        self.tag_policy(
            dataset_class,
            tag,
            TagPolicy {
                default: code,
                justification: None,
            },
        )
    }

    /// Rejects files containing the tag, reporting the given justification.
    pub fn reject_tag(self, dataset_class: &str, tag: Tag, justification: &str) -> Self {
        self.tag_policy(
            dataset_class,
            tag,
            TagPolicy {
                default: ActionCode::Reject,
                justification: Some(justification.into()),
            },
        )
    }

    pub fn tag_policy(mut self, dataset_class: &str, tag: Tag, policy: TagPolicy) -> Self {
        self.0
            .sop_class
            .entry(dataset_class.into())
            .or_default()
            .tag
            .insert(tag, policy);
        self
    }

    pub fn build(self) -> Procedure {
        self.0
    }
}
