//! Record types for the six seeded collections.
//!
//! Documents are stored as JSON and decoded into these types when read, so
//! the rest of the crate never probes for field presence. Fields the site does
//! not interpret are kept in `extra` and passed through to the templates.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The fixed set of collections the loader seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Projects,
    Tools,
    OtherSkills,
    Education,
    Language,
    ProgLanguage,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Projects,
        Collection::OtherSkills,
        Collection::Education,
        Collection::Tools,
        Collection::Language,
        Collection::ProgLanguage,
    ];

    /// Table name in the store.
    pub fn name(self) -> &'static str {
        match self {
            Collection::Projects => "projects",
            Collection::Tools => "tools",
            Collection::OtherSkills => "otherskills",
            Collection::Education => "education",
            Collection::Language => "language",
            Collection::ProgLanguage => "proglanguage",
        }
    }

    /// File stem of the seed file inside the archive's `json/` folder.
    pub fn source_stem(self) -> &'static str {
        match self {
            Collection::Tools => "software",
            other => other.name(),
        }
    }

    pub fn staging_name(self) -> String {
        format!("{}__staging", self.name())
    }

    /// Decodes a raw seed record into the collection's record type and
    /// returns its identifier.
    pub fn validate(self, value: &Value) -> Result<String, serde_json::Error> {
        let id = match self {
            Collection::Projects => Project::deserialize(value)?.id,
            Collection::Tools => Tool::deserialize(value)?.id,
            _ => Skill::deserialize(value)?.id,
        };
        Ok(id)
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub name: String,
}

/// An entry in a project's software or skills list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub long: String,
    #[serde(default)]
    pub short: String,
    #[serde(default)]
    pub img: String,
    /// Release date as stored (`YYYY-MM-DD`); the home page shows the year only.
    #[serde(default)]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub categories: Vec<CategoryRef>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub software: Vec<Reference>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub skills: Vec<Reference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Project {
    /// Leading four characters of the date, the display form on the home page.
    pub fn year(&self) -> &str {
        match self.date.char_indices().nth(4) {
            Some((end, _)) => &self.date[..end],
            None => &self.date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub img: String,
    #[serde(default)]
    pub externallink: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Entry of otherskills, education, language or proglanguage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Row of a product page table. Serializes flat, so templates see
/// `name`, `link` and whatever display fields the source row carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TableRow {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: None,
            extra: Map::new(),
        }
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
