pub mod builder;
pub mod tag_policy_map;
pub mod uid_root;

use crate::actions::Action;
use dicom_core::Tag;
use garde::Validate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use thiserror::Error;

use tag_policy_map::TagPolicyMap;
use uid_root::UidRootError;

/// Dataset class under which the overrides for all classes are listed.
pub const DEFAULT_DATASET_CLASS: &str = "";

const DEFAULT_VERSION: &str = "unknown";

#[derive(Error, Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum ConfigError {
    #[error("invalid UID root: {0}")]
    InvalidUidRoot(String),

    #[error("invalid procedure: {0}")]
    InvalidProcedure(String),
}

impl From<UidRootError> for ConfigError {
    fn from(err: UidRootError) -> Self {
        ConfigError::InvalidUidRoot(err.0)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::InvalidProcedure(format!("{err}"))
    }
}

impl From<garde::Report> for ConfigError {
    fn from(err: garde::Report) -> Self {
        ConfigError::InvalidProcedure(format!("{err}"))
    }
}

/// Action codes as they appear in a de-identification procedure.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ActionCode {
    /// Remove the element from the dataset.
    #[serde(rename = "X")]
    Remove,

    /// Keep the element. For sequences, every nested element gets its own action.
    #[serde(rename = "K")]
    Keep,

    /// Replace the value with a dummy value of the same value representation.
    #[serde(rename = "D")]
    Dummy,

    /// Replace the value with a consistently mapped replacement UID.
    #[serde(rename = "U")]
    Pseudonymize,

    /// Reject the whole file.
    #[serde(rename = "R")]
    Reject,
}

/// Override of the action for a single tag.
#[derive(Serialize, Deserialize, Validate, Debug, Clone, PartialEq)]
pub struct TagPolicy {
    #[garde(skip)]
    pub default: ActionCode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(length(min = 1))]
    pub justification: Option<String>,
}

/// Tag overrides that apply to one dataset class (i.e. SOP Class UID).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ClassPolicy {
    #[serde(default)]
    pub tag: TagPolicyMap,
}

fn default_version() -> String {
    DEFAULT_VERSION.into()
}

/// A versioned de-identification procedure.
///
/// The procedure is read-only during processing. It defines a global default action
/// and, per dataset class, overrides for individual tags. Overrides listed under the
/// empty dataset class ([`DEFAULT_DATASET_CLASS`]) apply to every class.
///
/// # Example
///
/// ```
/// use dicom_deidentification::config::Procedure;
///
/// let procedure = Procedure::from_json(r#"{
///     "default": "X",
///     "version": "1.0",
///     "sopClass": {"": {"tag": {"(0008,0050)": {"default": "K"}}}}
/// }"#).unwrap();
/// assert_eq!(procedure.version(), "1.0");
/// ```
#[derive(Serialize, Deserialize, Validate, Debug, Clone, PartialEq)]
pub struct Procedure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(skip)]
    default: Option<ActionCode>,

    #[serde(default = "default_version")]
    #[garde(length(min = 1, max = 64))]
    version: String,

    #[serde(default, rename = "sopClass")]
    #[garde(skip)]
    sop_class: BTreeMap<String, ClassPolicy>,
}

impl Default for Procedure {
    fn default() -> Self {
        Self {
            default: None,
            version: default_version(),
            sop_class: BTreeMap::new(),
        }
    }
}

impl Procedure {
    /// Parses and validates a procedure from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let procedure: Procedure = serde_json::from_str(json)?;
        procedure.validate()?;
        Ok(procedure)
    }

    /// Parses and validates a procedure from a JSON byte source.
    pub fn from_reader(reader: impl Read) -> Result<Self, ConfigError> {
        let procedure: Procedure = serde_json::from_reader(reader)?;
        procedure.validate()?;
        Ok(procedure)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn default_action(&self) -> Option<ActionCode> {
        self.default
    }

    pub fn class_policy(&self, dataset_class: &str) -> Option<&ClassPolicy> {
        self.sop_class.get(dataset_class)
    }

    /// Returns the [`Action`] to take for a tag in a dataset of the given class.
    ///
    /// Lookup order, closest scope first:
    /// 1. an override for the tag under `dataset_class`
    /// 2. an override for the tag under the default dataset class
    /// 3. the global default action of the procedure
    /// 4. [`Action::Keep`]
    pub fn resolve(&self, tag: &Tag, dataset_class: &str) -> Action {
        let policy = self
            .tag_policy(tag, dataset_class)
            .or_else(|| self.tag_policy(tag, DEFAULT_DATASET_CLASS));

        match policy {
            Some(policy) => Action::from(policy),
            None => self.default.map(Action::from).unwrap_or(Action::Keep),
        }
    }

    fn tag_policy(&self, tag: &Tag, dataset_class: &str) -> Option<&TagPolicy> {
        self.class_policy(dataset_class)
            .and_then(|class_policy| class_policy.tag.get(tag))
    }
}
