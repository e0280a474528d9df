//! Canonical section names and their accepted title variants

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A canonical section with the heading wordings that refer to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    /// Canonical name, used as the key in extracted records
    pub name: String,

    /// Accepted heading titles, in priority order
    #[serde(default)]
    pub variants: Vec<String>,
}

impl SectionSpec {
    /// Create a spec from a name and its variants
    pub fn new<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// Variants to match, falling back to the canonical name itself
    pub fn titles(&self) -> Vec<&str> {
        if self.variants.is_empty() {
            vec![self.name.as_str()]
        } else {
            self.variants.iter().map(String::as_str).collect()
        }
    }

    /// Normalized, de-duplicated variants in their original order
    pub fn normalized_titles(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.titles()
            .into_iter()
            .map(normalize_title)
            .filter(|t| !t.is_empty() && seen.insert(t.clone()))
            .collect()
    }
}

/// Ordered list of canonical sections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionCatalog {
    sections: Vec<SectionSpec>,
}

impl Default for SectionCatalog {
    fn default() -> Self {
        Self::new(vec![
            SectionSpec::new(
                "Signs and symptoms",
                ["Signs and symptoms", "Signs_and_symptoms", "Symptoms", "Clinical features"],
            ),
            SectionSpec::new("Causes", ["Causes", "Cause", "Etiology", "Aetiology"]),
            SectionSpec::new("Diagnosis", ["Diagnosis", "Diagnostic"]),
            SectionSpec::new("Treatment", ["Treatment", "Therapy", "Management"]),
            SectionSpec::new("Prognosis", ["Prognosis", "Outcome"]),
            // "Epidemology" is a misspelling seen in live articles
            SectionSpec::new("Epidemiology", ["Epidemiology", "Epidemology", "Prevalence"]),
            SectionSpec::new(
                "Society and culture",
                [
                    "Society and culture",
                    "Society_and_culture",
                    "Culture and society",
                    "Society",
                    "Culture",
                ],
            ),
        ])
    }
}

impl SectionCatalog {
    /// Create a catalog from an ordered list of sections
    pub fn new(sections: Vec<SectionSpec>) -> Self {
        Self { sections }
    }

    /// Sections in canonical order
    pub fn sections(&self) -> &[SectionSpec] {
        &self.sections
    }

    /// Canonical names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    /// Look up a section by canonical name
    pub fn get(&self, name: &str) -> Option<&SectionSpec> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Number of canonical sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the catalog has no sections
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Check that the catalog is non-empty and canonical names are unique
    pub fn validate(&self) -> Result<(), String> {
        if self.sections.is_empty() {
            return Err("section catalog must not be empty".to_string());
        }
        let mut seen = HashSet::new();
        for section in &self.sections {
            if section.name.trim().is_empty() {
                return Err("canonical section names must not be blank".to_string());
            }
            if !seen.insert(section.name.as_str()) {
                return Err(format!("duplicate canonical section '{}'", section.name));
            }
        }
        Ok(())
    }
}

/// Normalize a heading title or identifier for comparison.
///
/// Lower-cases, treats `_` and `-` as word separators, drops every other
/// character that is not alphanumeric or whitespace, and collapses runs of
/// whitespace to a single space.
pub fn normalize_title(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
