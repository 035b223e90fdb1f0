use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// One of the six output files a unit field can land in.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SlkKind {
    #[serde(rename = "Profile")]
    Profile,
    #[serde(rename = "UnitWeapons")]
    Weapons,
    #[serde(rename = "UnitAbilities")]
    Abilities,
    #[serde(rename = "UnitBalance")]
    Balance,
    #[serde(rename = "UnitData")]
    Data,
    #[serde(rename = "UnitUI")]
    Ui,
}

impl SlkKind {
    /// Write order used by the output coordinator.
    pub const ALL: [SlkKind; 6] = [
        SlkKind::Weapons,
        SlkKind::Profile,
        SlkKind::Abilities,
        SlkKind::Balance,
        SlkKind::Data,
        SlkKind::Ui,
    ];

    /// Position of this kind in [`SlkKind::ALL`].
    pub fn slot(self) -> usize {
        match self {
            SlkKind::Weapons => 0,
            SlkKind::Profile => 1,
            SlkKind::Abilities => 2,
            SlkKind::Balance => 3,
            SlkKind::Data => 4,
            SlkKind::Ui => 5,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            SlkKind::Profile => "CampaignUnitFunc.txt",
            SlkKind::Weapons => "UnitWeapons.slk",
            SlkKind::Abilities => "UnitAbilities.slk",
            SlkKind::Balance => "UnitBalance.slk",
            SlkKind::Data => "UnitData.slk",
            SlkKind::Ui => "UnitUI.slk",
        }
    }

    /// Identifier used by the field catalog's `slk` column.
    pub fn catalog_name(self) -> &'static str {
        match self {
            SlkKind::Profile => "Profile",
            SlkKind::Weapons => "UnitWeapons",
            SlkKind::Abilities => "UnitAbilities",
            SlkKind::Balance => "UnitBalance",
            SlkKind::Data => "UnitData",
            SlkKind::Ui => "UnitUI",
        }
    }

    /// The profile kind is a free-form key=value file with no header template.
    pub fn is_templated(self) -> bool {
        self != SlkKind::Profile
    }
}

impl fmt::Display for SlkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.catalog_name())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ValueType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "int", alias = "integer")]
    Integer,
    #[serde(rename = "real", alias = "unreal")]
    Real,
}

impl ValueType {
    pub fn is_text(self) -> bool {
        self == ValueType::String
    }
}

/// Ordering tag for fields that share one profile cell.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum IndexTag {
    #[default]
    None,
    First,
    Second,
    Other(String),
}

impl IndexTag {
    pub fn from_raw(raw: &str) -> IndexTag {
        match raw.trim() {
            "" | "-1" => IndexTag::None,
            "0" => IndexTag::First,
            "1" => IndexTag::Second,
            other => IndexTag::Other(other.to_string()),
        }
    }
}

impl fmt::Display for IndexTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexTag::None => f.write_str("-1"),
            IndexTag::First => f.write_str("0"),
            IndexTag::Second => f.write_str("1"),
            IndexTag::Other(raw) => f.write_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for IndexTag {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawIndex {
            Number(i64),
            Text(String),
        }

        let raw = Option::<RawIndex>::deserialize(deserializer)?;
        Ok(match raw {
            None => IndexTag::None,
            Some(RawIndex::Number(n)) => IndexTag::from_raw(&n.to_string()),
            Some(RawIndex::Text(s)) => IndexTag::from_raw(&s),
        })
    }
}

impl Serialize for IndexTag {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldMetadata {
    #[serde(alias = "ID")]
    pub id: String,
    /// Base column name shared by every field placed in the same cell.
    pub field: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub slk: SlkKind,
    #[serde(default)]
    pub index: IndexTag,
}

impl FieldMetadata {
    pub fn new(id: &str, field: &str, value_type: ValueType, slk: SlkKind) -> Self {
        FieldMetadata {
            id: id.to_string(),
            field: field.to_string(),
            value_type,
            slk,
            index: IndexTag::None,
        }
    }

    pub fn with_index(mut self, index: IndexTag) -> Self {
        self.index = index;
        self
    }
}

/// A resolved unit value, already defaults-merged and type-coerced.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FieldValue {
    pub fn is_empty_text(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.is_empty())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(n) => write!(f, "{n}"),
            FieldValue::Real(r) => write!(f, "{r}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Real(value)
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read field catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse field catalog {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("field catalog declares '{0}' more than once")]
    DuplicateField(String),
}

/// Field ID to metadata lookup.
#[derive(Clone, Debug, Default)]
pub struct FieldCatalog {
    fields: HashMap<String, FieldMetadata>,
}

impl FieldCatalog {
    pub fn from_fields<I>(fields: I) -> std::result::Result<Self, CatalogError>
    where
        I: IntoIterator<Item = FieldMetadata>,
    {
        let mut map = HashMap::new();
        for meta in fields {
            if map.contains_key(&meta.id) {
                return Err(CatalogError::DuplicateField(meta.id));
            }
            map.insert(meta.id.clone(), meta);
        }
        Ok(FieldCatalog { fields: map })
    }

    pub fn from_json_str(src: &str, origin: &str) -> std::result::Result<Self, CatalogError> {
        let fields: Vec<FieldMetadata> =
            serde_json::from_str(src).map_err(|e| CatalogError::Parse {
                path: origin.to_string(),
                source: e,
            })?;
        Self::from_fields(fields)
    }

    pub fn load(path: &Path) -> std::result::Result<Self, CatalogError> {
        let src = fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json_str(&src, &path.display().to_string())
    }

    pub fn get(&self, id: &str) -> Option<&FieldMetadata> {
        self.fields.get(id)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
