//! Controlled-vocabulary mappings between Pure and RDM.
//!
//! The access-right and resource-type tables are fixed and live in code;
//! the language table maps Pure's English language names to ISO 639-3
//! codes and is loaded from a JSON reference file at startup.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::warn;

use purerdm_core::error::ConfigError;
use purerdm_core::record::{AccessRight, ResourceType};
use purerdm_core::Result;

/// Restriction kinds the repository understands.
pub const ALLOWED_RESTRICTIONS: [&str; 4] = ["owners", "groups", "ip_single", "ip_range"];

/// Restrictions applied to every record that is not fully open.
pub const DEFAULT_RESTRICTIONS: [&str; 4] = ALLOWED_RESTRICTIONS;

/// Map a Pure open-access permission onto the RDM access right.
///
/// Unmapped values return `None`, distinct from `Closed`; the caller
/// logs a warning and leaves the field unset.
pub fn access_right(permission: &str) -> Option<AccessRight> {
    match permission {
        "Open" => Some(AccessRight::Open),
        "Embargoed" => Some(AccessRight::Embargoed),
        "Restricted" => Some(AccessRight::Restricted),
        "Closed" | "Unknown" | "Indeterminate" | "None" => Some(AccessRight::Closed),
        _ => None,
    }
}

/// Map a Pure publication type onto the RDM resource type.
///
/// Anything not in the table (including "Other report") falls back to
/// [`ResourceType::Other`].
pub fn resource_type(pure_type: &str) -> ResourceType {
    match pure_type {
        "Article"
        | "Chapter"
        | "Book"
        | "Paper"
        | "Thesis"
        | "Diploma Thesis"
        | "Master's Thesis"
        | "Doctoral Thesis" => ResourceType::Publication,
        "Lecture or Presentation" | "Conference contribution" => ResourceType::Presentation,
        "Poster" => ResourceType::Poster,
        "Software" => ResourceType::Software,
        "Data set/Database" => ResourceType::Dataset,
        _ => ResourceType::Other,
    }
}

/// Subtype for a resource type, when the repository defines one.
///
/// Only publications carry a subtype; the repository has no finer-grained
/// publication vocabulary yet, so everything lands in the generic bucket.
pub fn resource_subtype(kind: ResourceType) -> Option<&'static str> {
    match kind {
        ResourceType::Publication => Some("publication-other"),
        _ => None,
    }
}

/// Validate a restriction list against the known kinds.
///
/// Unknown entries are logged and kept; the repository ignores what it
/// does not understand.
pub fn validate_restrictions(restrictions: &[String]) {
    for restriction in restrictions {
        if !ALLOWED_RESTRICTIONS.contains(&restriction.as_str()) {
            warn!(restriction, "Unknown restriction kind");
        }
    }
}

/// Language-name to ISO 639-3 lookup table.
///
/// Loaded once from the reference file shipped with the deployment; a
/// missing or malformed file is a startup failure, not a per-record one.
#[derive(Debug, Clone)]
pub struct LanguageTable {
    codes: HashMap<String, String>,
}

impl LanguageTable {
    /// Load the table from a JSON file mapping names to codes.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.display().to_string(),
        })?;
        let value: Value = serde_json::from_str(&raw).map_err(|e| ConfigError::Malformed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let object = value.as_object().ok_or_else(|| ConfigError::Malformed {
            path: path.display().to_string(),
            reason: "expected a top-level object".to_string(),
        })?;

        let mut codes = HashMap::with_capacity(object.len());
        for (name, code) in object {
            let code = code.as_str().ok_or_else(|| ConfigError::Malformed {
                path: path.display().to_string(),
                reason: format!("code for '{}' is not a string", name),
            })?;
            codes.insert(name.clone(), code.to_string());
        }
        Ok(Self { codes })
    }

    /// Build a table directly from entries, for tests.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            codes: entries
                .into_iter()
                .map(|(name, code)| (name.into(), code.into()))
                .collect(),
        }
    }

    /// ISO 639-3 code for a Pure language name.
    ///
    /// "Undefined/Unknown" and names outside the table resolve to `None`;
    /// the record is then submitted without a language.
    pub fn code_for(&self, name: &str) -> Option<&str> {
        if name == "Undefined/Unknown" {
            return None;
        }
        self.codes.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn access_rights_cover_the_pure_vocabulary() {
        assert_eq!(access_right("Open"), Some(AccessRight::Open));
        assert_eq!(access_right("Embargoed"), Some(AccessRight::Embargoed));
        assert_eq!(access_right("Restricted"), Some(AccessRight::Restricted));
        assert_eq!(access_right("Closed"), Some(AccessRight::Closed));
        assert_eq!(access_right("Unknown"), Some(AccessRight::Closed));
        assert_eq!(access_right("Indeterminate"), Some(AccessRight::Closed));
        assert_eq!(access_right("None"), Some(AccessRight::Closed));
    }

    #[test]
    fn unmapped_access_right_is_none() {
        assert_eq!(access_right("Public domain"), None);
        assert_eq!(access_right(""), None);
    }

    #[test]
    fn resource_types_map_onto_rdm_vocabulary() {
        assert_eq!(resource_type("Diploma Thesis"), ResourceType::Publication);
        assert_eq!(resource_type("Article"), ResourceType::Publication);
        assert_eq!(
            resource_type("Lecture or Presentation"),
            ResourceType::Presentation
        );
        assert_eq!(resource_type("Poster"), ResourceType::Poster);
        assert_eq!(resource_type("Software"), ResourceType::Software);
        assert_eq!(resource_type("Data set/Database"), ResourceType::Dataset);
    }

    #[test]
    fn unknown_resource_types_fall_back_to_other() {
        assert_eq!(resource_type("Other report"), ResourceType::Other);
        assert_eq!(resource_type("Interpretive dance"), ResourceType::Other);
    }

    #[test]
    fn only_publications_carry_a_subtype() {
        assert_eq!(
            resource_subtype(ResourceType::Publication),
            Some("publication-other")
        );
        assert_eq!(resource_subtype(ResourceType::Poster), None);
        assert_eq!(resource_subtype(ResourceType::Other), None);
    }

    #[test]
    fn language_table_resolves_names() {
        let table = LanguageTable::from_entries([("German", "deu"), ("English", "eng")]);
        assert_eq!(table.code_for("German"), Some("deu"));
        assert_eq!(table.code_for("Klingon"), None);
        assert_eq!(table.code_for("Undefined/Unknown"), None);
    }

    #[test]
    fn language_table_loads_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"German": "deu"}}"#).unwrap();
        let table = LanguageTable::load(file.path()).unwrap();
        assert_eq!(table.code_for("German"), Some("deu"));
    }

    #[test]
    fn malformed_language_file_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(LanguageTable::load(file.path()).is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"German": 42}}"#).unwrap();
        assert!(LanguageTable::load(file.path()).is_err());
    }

    #[test]
    fn missing_language_file_is_fatal() {
        assert!(LanguageTable::load(Path::new("/nonexistent/languages.json")).is_err());
    }
}
