use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

static UID_ROOT_REGEX: OnceLock<Regex> = OnceLock::new();
const UID_ROOT_MAX_LENGTH: usize = 32;

/// Root of UUID derived UIDs, see DICOM PS3.5 section B.2.
pub const UUID_DERIVED_UID_ROOT: &str = "2.25";

/// The [`UidRoot`] struct represents a DICOM UID root that is used as prefix for the
/// replacement UIDs handed out during pseudonymization.
///
/// The [`UidRoot`] must follow DICOM UID format rules:
/// - Start with a digit 1-9
/// - Contain only numbers separated by single dots
/// - Have no leading zeros in any component (a lone `0` is fine)
/// - Optionally end with a dot
///
/// It also must not have more than 32 characters. An empty [`UidRoot`] means that the
/// UUID derived root `2.25` is used.
///
/// # Example
///
/// ```
/// use dicom_deidentification::config::uid_root::UidRoot;
///
/// let uid_root = "1.2.840.123".parse::<UidRoot>().unwrap();
/// assert_eq!(uid_root.as_prefix(), "1.2.840.123.");
///
/// // Invalid UID root (not starting with 1-9)
/// let invalid = "0.1.2".parse::<UidRoot>();
/// assert!(invalid.is_err());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct UidRoot(pub(crate) String);

#[derive(Error, Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
#[error("{0}")]
pub struct UidRootError(pub String);

impl UidRoot {
    pub fn new(uid_root: &str) -> Result<Self, UidRootError> {
        let regex = UID_ROOT_REGEX.get_or_init(|| {
            Regex::new(r"^([1-9][0-9]*(\.(0|[1-9][0-9]*))*\.?)?$").unwrap()
        });

        if uid_root.len() > UID_ROOT_MAX_LENGTH || !regex.is_match(uid_root) {
            return Err(UidRootError(format!(
                "UID root must be empty or consist of numeric components separated by single dots, start with 1-9, have no leading zeros, and be no longer than {UID_ROOT_MAX_LENGTH} characters"
            )));
        }

        Ok(Self(uid_root.into()))
    }

    /// Returns the prefix for newly generated UIDs, always ending with a dot.
    ///
    /// An empty [`UidRoot`] yields the UUID derived root (`"2.25."`).
    pub fn as_prefix(&self) -> String {
        let root = self.0.trim();
        if root.is_empty() {
            format!("{UUID_DERIVED_UID_ROOT}.")
        } else if root.ends_with('.') {
            root.into()
        } else {
            format!("{root}.")
        }
    }
}

impl Default for UidRoot {
    fn default() -> Self {
        Self("".into())
    }
}

impl FromStr for UidRoot {
    type Err = UidRootError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UidRoot::new(s)
    }
}

impl AsRef<str> for UidRoot {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
