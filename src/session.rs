//! Session scoped state shared by all files of one upload.

use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::config::uid_root::UidRoot;

const UID_MAX_LENGTH: usize = 64;

pub(crate) fn truncate_to(n: usize, s: &str) -> String {
    s.chars().take(n).collect()
}

#[derive(Debug, Default)]
struct UidMapEntries {
    replacements: HashMap<String, String>,
    issued: HashSet<String>,
}

/// Consistent mapping from original identifiers to generated replacement UIDs.
///
/// The same original value always maps to the same replacement for as long as the map
/// lives (or until [`UidMap::clear`] is called). Different original values never share a
/// replacement. Lookups and inserts are guarded by a single lock, so concurrent
/// encounters of the same original value yield one replacement.
#[derive(Debug, Default)]
pub struct UidMap {
    uid_root: UidRoot,
    entries: Mutex<UidMapEntries>,
}

impl UidMap {
    pub fn new(uid_root: UidRoot) -> Self {
        Self {
            uid_root,
            entries: Mutex::new(UidMapEntries::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, UidMapEntries> {
        // the entries stay consistent even if another thread panicked while holding the lock
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the replacement for `original`, generating and recording a new one on
    /// first sight.
    pub fn pseudonymize(&self, original: &str) -> String {
        let mut entries = self.lock();
        if let Some(replacement) = entries.replacements.get(original) {
            return replacement.clone();
        }

        let replacement = self.issue(&mut entries);
        debug!("new replacement UID {replacement}");
        entries
            .replacements
            .insert(original.to_string(), replacement.clone());
        replacement
    }

    /// Returns a new UID that is not tied to any original value.
    ///
    /// The UID is distinct from every replacement handed out by this map, but it is not
    /// recorded as one.
    pub fn generate(&self) -> String {
        let mut entries = self.lock();
        self.issue(&mut entries)
    }

    fn issue(&self, entries: &mut UidMapEntries) -> String {
        let uid = loop {
            let candidate = self.generate_uid();
            if !entries.issued.contains(&candidate) {
                break candidate;
            }
        };
        entries.issued.insert(uid.clone());
        uid
    }

    /// Returns the replacement recorded for `original`, if any.
    pub fn get(&self, original: &str) -> Option<String> {
        self.lock().replacements.get(original).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().replacements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().replacements.is_empty()
    }

    /// Forgets all recorded replacements.
    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.replacements.clear();
        entries.issued.clear();
    }

    fn generate_uid(&self) -> String {
        let uid = format!("{}{}", self.uid_root.as_prefix(), Uuid::new_v4().as_u128());
        truncate_to(UID_MAX_LENGTH, &uid)
    }
}

/// State of one de-identification session.
///
/// A session is created per upload and handed to every file that is processed as part of
/// it. Dropping the session (or calling [`Session::clear`]) ends the consistent mapping
/// of identifiers.
#[derive(Debug, Default)]
pub struct Session {
    uid_map: UidMap,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session whose replacement UIDs start with the given root.
    pub fn with_uid_root(uid_root: UidRoot) -> Self {
        Self {
            uid_map: UidMap::new(uid_root),
        }
    }

    pub fn uid_map(&self) -> &UidMap {
        &self.uid_map
    }

    pub fn pseudonymize(&self, original: &str) -> String {
        self.uid_map.pseudonymize(original)
    }

    /// Returns a new UID under the session's root without recording a replacement.
    pub fn generate_uid(&self) -> String {
        self.uid_map.generate()
    }

    pub fn clear(&self) {
        self.uid_map.clear();
    }
}
