//! Per-language string tables referenced by localized dialog properties.

use std::collections::{BTreeMap, HashMap};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::{ids::IdGenerator, locale::Language};

/// Language-keyed `id -> text` tables plus the encoding each language's
/// string file was read from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct StringMap {
    #[serde(default)]
    strings: BTreeMap<Language, IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    encodings: BTreeMap<Language, String>,
}

impl StringMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the text of `id` for one language, returning the previous text.
    pub fn insert(
        &mut self,
        language: Language,
        id: impl Into<String>,
        text: impl Into<String>,
    ) -> Option<String> {
        self.strings
            .entry(language)
            .or_default()
            .insert(id.into(), text.into())
    }

    pub fn get(&self, language: Language, id: &str) -> Option<&str> {
        self.strings
            .get(&language)
            .and_then(|table| table.get(id))
            .map(String::as_str)
    }

    /// Whether any language has an entry for `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.strings.values().any(|table| table.contains_key(id))
    }

    /// Removes `id` from every language.
    pub fn remove(&mut self, id: &str) -> bool {
        let mut removed = false;
        for table in self.strings.values_mut() {
            removed |= table.shift_remove(id).is_some();
        }
        removed
    }

    /// True when no language has non-empty text for `id`.
    pub fn is_empty_everywhere(&self, id: &str) -> bool {
        Language::ALL
            .into_iter()
            .all(|language| self.get(language, id).is_none_or(str::is_empty))
    }

    /// Every id known to any language, in first-seen order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        let ids: IndexSet<&str> = self
            .strings
            .values()
            .flat_map(|table| table.keys().map(String::as_str))
            .collect();
        ids.into_iter()
    }

    /// All `(id, text, language)` triples.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, Language)> {
        self.strings.iter().flat_map(|(language, table)| {
            table
                .iter()
                .map(move |(id, text)| (id.as_str(), text.as_str(), *language))
        })
    }

    /// `(id, text)` pairs of one language, in insertion order.
    pub fn entries_for(&self, language: Language) -> impl Iterator<Item = (&str, &str)> {
        self.strings
            .get(&language)
            .into_iter()
            .flat_map(|table| table.iter().map(|(id, text)| (id.as_str(), text.as_str())))
    }

    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.strings.keys().copied()
    }

    pub fn len(&self, language: Language) -> usize {
        self.strings.get(&language).map_or(0, IndexMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.strings.values().all(IndexMap::is_empty)
    }

    pub fn set_encoding(&mut self, language: Language, label: impl Into<String>) {
        self.encodings.insert(language, label.into());
    }

    /// The encoding label of a language's string file, falling back to the
    /// language default.
    pub fn encoding(&self, language: Language) -> &str {
        self.encodings
            .get(&language)
            .map(String::as_str)
            .unwrap_or_else(|| language.default_encoding())
    }

    /// Folds another map in; entries of `other` win.
    pub fn merge(&mut self, other: StringMap) {
        for (language, table) in other.strings {
            let target = self.strings.entry(language).or_default();
            for (id, text) in table {
                target.insert(id, text);
            }
        }
        self.encodings.extend(other.encodings);
    }

    /// Copies the map, giving every id a fresh name from `generator`.
    ///
    /// An id shared by several languages is renamed once. Returns the copy and
    /// the `old id -> new id` lookup.
    pub fn copy_with_regenerated_ids(
        &self,
        generator: &mut dyn IdGenerator,
    ) -> (StringMap, HashMap<String, String>) {
        let lookup: HashMap<String, String> = self
            .ids()
            .map(|id| (id.to_string(), generator.next_id()))
            .collect();

        let strings = self
            .strings
            .iter()
            .map(|(language, table)| {
                let renamed = table
                    .iter()
                    .map(|(id, text)| (lookup[id].clone(), text.clone()))
                    .collect();
                (*language, renamed)
            })
            .collect();

        (
            StringMap {
                strings,
                encodings: self.encodings.clone(),
            },
            lookup,
        )
    }
}
