//! Localized display labels for lookup values.
//!
//! Labels are a side mapping from `(lookup value, locale)` to a display
//! string. They never take part in equality or business rules.

use crate::lookup::Lookup;
use std::collections::HashMap;

/// Key of a label: lookup kind plus machine name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelKey {
    /// Lookup kind.
    pub kind: &'static str,
    /// Machine name.
    pub name: &'static str,
}

impl LabelKey {
    /// Key for a lookup value.
    #[must_use]
    pub fn of<L: Lookup>(value: L) -> Self {
        Self {
            kind: L::KIND,
            name: value.name(),
        }
    }
}

/// Label storage with locale fallback.
///
/// Resolution order: requested locale, default locale, then a humanized
/// machine name (`in_progress` becomes `In progress`).
#[derive(Debug, Clone)]
pub struct LabelCatalog {
    default_locale: String,
    labels: HashMap<(LabelKey, String), String>,
}

impl LabelCatalog {
    /// Creates an empty catalog.
    pub fn new(default_locale: impl Into<String>) -> Self {
        Self {
            default_locale: default_locale.into(),
            labels: HashMap::new(),
        }
    }

    /// Returns the default locale.
    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Sets the label of a value in a locale.
    pub fn set_label<L: Lookup>(&mut self, value: L, locale: &str, label: impl Into<String>) {
        self.labels
            .insert((LabelKey::of(value), locale.to_string()), label.into());
    }

    /// Returns the label of a value in a locale.
    pub fn label<L: Lookup>(&self, value: L, locale: &str) -> String {
        let key = LabelKey::of(value);
        self.labels
            .get(&(key, locale.to_string()))
            .or_else(|| self.labels.get(&(key, self.default_locale.clone())))
            .cloned()
            .unwrap_or_else(|| humanize(value.name()))
    }
}

impl Default for LabelCatalog {
    fn default() -> Self {
        Self::new("en")
    }
}

fn humanize(name: &str) -> String {
    let spaced = name.replace(['_', '-'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
