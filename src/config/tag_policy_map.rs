use crate::config::TagPolicy;
use dicom_core::{DataDictionary, Tag};
use dicom_dictionary_std::StandardDataDictionary;
use garde::Validate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Per-tag policy overrides of a single dataset class, keyed by tag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TagPolicyMap(pub(crate) BTreeMap<Tag, TagPolicy>);

impl TagPolicyMap {
    pub fn new() -> Self {
        TagPolicyMap(BTreeMap::new())
    }

    pub fn insert(&mut self, tag: Tag, policy: TagPolicy) -> Option<TagPolicy> {
        self.0.insert(tag, policy)
    }

    pub fn get(&self, tag: &Tag) -> Option<&TagPolicy> {
        self.0.get(tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Policy with the tag alias as an informative comment
#[derive(Serialize)]
struct TagPolicyWithComment<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
    #[serde(flatten)]
    policy: &'a TagPolicy,
}

#[derive(Deserialize)]
struct OwnedTagPolicyWithComment {
    #[serde(default)]
    #[allow(dead_code)]
    comment: Option<String>,
    #[serde(flatten)]
    policy: TagPolicy,
}

fn get_tag_alias(tag: &Tag) -> Option<&'static str> {
    StandardDataDictionary.by_tag(*tag).map(|entry| entry.alias)
}

impl Serialize for TagPolicyMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;

        for (tag, policy) in &self.0 {
            let policy_with_comment = TagPolicyWithComment {
                comment: get_tag_alias(tag),
                policy,
            };
            map.serialize_entry(&format!("{tag}"), &policy_with_comment)?;
        }

        map.end()
    }
}

impl<'de> Deserialize<'de> for TagPolicyMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string_map: BTreeMap<String, OwnedTagPolicyWithComment> =
            BTreeMap::deserialize(deserializer)?;

        let mut tag_map = BTreeMap::new();

        for (tag_str, policy_with_comment) in string_map {
            // Tag keys are only accepted in the '(GGGG,EEEE)' notation
            if !tag_str.starts_with('(') || !tag_str.ends_with(')') {
                return Err(serde::de::Error::custom(format!(
                    "Tag must be in format '(XXXX,XXXX)', got: {tag_str}"
                )));
            }

            let tag: Tag = tag_str.parse().map_err(|_| {
                serde::de::Error::custom(format!(
                    "Tag must be in format '(XXXX,XXXX)' where X is a hex digit, got: {tag_str}"
                ))
            })?;

            let policy = policy_with_comment.policy;
            policy.validate().map_err(|err| {
                serde::de::Error::custom(format!("Validation error for tag {tag_str}: {err}"))
            })?;

            tag_map.insert(tag, policy);
        }

        Ok(TagPolicyMap(tag_map))
    }
}
