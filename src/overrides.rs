use crate::error::Result;
use crate::schema::FieldCategory;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Human-authored forced mappings, one map per canonicalized category.
/// An entry `raw label -> canonical label` always wins over the fuzzy
/// clustering result for that exact raw label; it never interacts with
/// clustering or the threshold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MappingOverrides {
    #[schemars(description = "Forced client-name mappings (exact raw label to canonical label)")]
    pub clients: BTreeMap<String, String>,

    #[schemars(description = "Forced collaborator-name mappings")]
    pub collaborators: BTreeMap<String, String>,

    #[schemars(description = "Forced department-name mappings")]
    pub departments: BTreeMap<String, String>,

    #[schemars(description = "Forced macro-activity mappings")]
    pub macro_activities: BTreeMap<String, String>,

    #[schemars(description = "Forced micro-activity mappings")]
    pub micro_activities: BTreeMap<String, String>,
}

impl MappingOverrides {
    /// Loads overrides from a JSON file. A missing file is not an error:
    /// it yields the empty defaults, matching how the dashboard behaves
    /// when no override file has been authored yet.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No override file at {}, using empty defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let overrides: Self = serde_json::from_str(&contents)?;
        Ok(overrides)
    }

    pub fn for_category(&self, category: FieldCategory) -> &BTreeMap<String, String> {
        match category {
            FieldCategory::Client => &self.clients,
            FieldCategory::Collaborator => &self.collaborators,
            FieldCategory::Department => &self.departments,
            FieldCategory::MacroActivity => &self.macro_activities,
            FieldCategory::MicroActivity => &self.micro_activities,
        }
    }

    pub fn is_empty(&self) -> bool {
        FieldCategory::ALL
            .iter()
            .all(|c| self.for_category(*c).is_empty())
    }
}
