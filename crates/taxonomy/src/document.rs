//! Wire-level taxonomy document.
//!
//! On the wire the taxonomy is a JSON object mapping category names to ordered
//! subcategory lists. The in-memory form is an ordered list of entries so that
//! key order survives a round trip, and so that duplicate keys in a submitted
//! body reach the validator instead of being collapsed by the parser.

use core::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use atelier_core::CategoryName;

/// One `category -> subcategories` entry, as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    pub category: String,
    pub subcategories: Vec<String>,
}

/// Full category mapping; the unit of persistence and transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonomyDocument {
    entries: Vec<DocumentEntry>,
}

impl TaxonomyDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Does not deduplicate; see `validate`.
    pub fn push(&mut self, category: impl Into<String>, subcategories: Vec<String>) {
        self.entries.push(DocumentEntry {
            category: category.into(),
            subcategories,
        });
    }

    /// Builder-style `push`.
    pub fn with(mut self, category: impl Into<String>, subcategories: &[&str]) -> Self {
        self.push(
            category,
            subcategories.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn entries(&self) -> &[DocumentEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Subcategories of the first entry whose normalized name matches.
    pub fn get(&self, category: &str) -> Option<&[String]> {
        let key = CategoryName::normalize(category);
        self.entries
            .iter()
            .find(|e| CategoryName::normalize(&e.category) == key)
            .map(|e| e.subcategories.as_slice())
    }

    pub fn contains(&self, category: &str) -> bool {
        self.get(category).is_some()
    }

    /// Drop every entry whose normalized name matches.
    pub fn remove(&mut self, category: &str) {
        let key = CategoryName::normalize(category);
        self.entries
            .retain(|e| CategoryName::normalize(&e.category) != key);
    }

    /// Replace the subcategories of an existing entry, or append a new one.
    pub fn upsert(&mut self, category: &str, subcategories: Vec<String>) {
        let key = CategoryName::normalize(category);
        match self
            .entries
            .iter_mut()
            .find(|e| CategoryName::normalize(&e.category) == key)
        {
            Some(entry) => entry.subcategories = subcategories,
            None => self.push(category, subcategories),
        }
    }
}

impl<C: Into<String>> FromIterator<(C, Vec<String>)> for TaxonomyDocument {
    fn from_iter<I: IntoIterator<Item = (C, Vec<String>)>>(iter: I) -> Self {
        let mut doc = Self::new();
        for (category, subs) in iter {
            doc.push(category, subs);
        }
        doc
    }
}

impl Serialize for TaxonomyDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.category, &entry.subcategories)?;
        }
        map.end()
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = TaxonomyDocument;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of category names to subcategory arrays")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut doc = TaxonomyDocument::new();
        while let Some((category, subcategories)) = access.next_entry::<String, Vec<String>>()? {
            doc.push(category, subcategories);
        }
        Ok(doc)
    }
}

impl<'de> Deserialize<'de> for TaxonomyDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(DocumentVisitor)
    }
}
