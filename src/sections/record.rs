//! Per-article extraction record

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// JSON key holding the article identifier in serialized records
pub const ARTICLE_KEY: &str = "Disease";

/// Extracted canonical sections of one article.
///
/// Serialized as a flat JSON object: the article identifier under
/// [`ARTICLE_KEY`] followed by one key per populated canonical section, in
/// catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRecord {
    article: String,
    sections: Vec<(String, String)>,
}

impl SectionRecord {
    pub(crate) fn new(article: impl Into<String>, sections: Vec<(String, String)>) -> Self {
        Self {
            article: article.into(),
            sections,
        }
    }

    /// Article identifier (page title)
    pub fn article(&self) -> &str {
        &self.article
    }

    /// Text of a canonical section, if it was populated
    pub fn get(&self, name: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, text)| text.as_str())
    }

    /// Populated sections in catalog order
    pub fn sections(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Populated canonical names in catalog order
    pub fn names(&self) -> Vec<&str> {
        self.sections.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Number of populated sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether no section was populated
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Render as markdown with one `##` heading per section
    pub fn to_markdown(&self) -> String {
        let mut out = format!("# {}\n", self.article);
        for (name, text) in &self.sections {
            out.push_str(&format!("\n## {name}\n\n{text}\n"));
        }
        out
    }

    /// Section bodies joined by blank lines, without headings
    pub fn reference_text(&self) -> String {
        self.sections
            .iter()
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Serialize for SectionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len() + 1))?;
        map.serialize_entry(ARTICLE_KEY, &self.article)?;
        for (name, text) in &self.sections {
            map.serialize_entry(name, text)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SectionRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = SectionRecord;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an object with a \"{ARTICLE_KEY}\" key and string section values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut article = None;
        let mut sections = Vec::new();
        while let Some((key, value)) = access.next_entry::<String, String>()? {
            if key == ARTICLE_KEY {
                article = Some(value);
            } else {
                sections.push((key, value));
            }
        }
        let article = article.ok_or_else(|| serde::de::Error::missing_field(ARTICLE_KEY))?;
        Ok(SectionRecord { article, sections })
    }
}
