use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

mod anomaly;
pub mod catalog;
pub mod fixups;
pub mod input;
mod manager;
pub mod merge;
pub mod row;
mod slk_file;
pub mod template;

pub use anomaly::Anomaly;
pub use catalog::{
    CatalogError, FieldCatalog, FieldMetadata, FieldValue, IndexTag, SlkKind, ValueType,
};
pub use input::UnitRecord;
pub use manager::{SlkFileManager, WriteReport};
pub use slk_file::SlkFile;
pub use template::{SlkTemplate, TemplateError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterSettings {
    /// Resolved units, one field map per unit.
    pub input_path: PathBuf,
    /// Field catalog: field ID to column name, type, destination and index.
    pub catalog_path: PathBuf,
    /// Header templates, or any directory above them.
    pub template_path: PathBuf,
    pub output_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse units from {path}: {source}")]
    Input {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unit {unit}: field '{field}' is neither a number nor a string")]
    InvalidValue { unit: String, field: String },
    #[error("no units in input")]
    NoUnits,
    #[error("failed to write {}", failed_kinds(.0))]
    Write(Vec<SlkKind>),
}

fn failed_kinds(kinds: &[SlkKind]) -> String {
    kinds
        .iter()
        .map(|k| k.file_name())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, ConvertError>;

/// What a finished run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub units: usize,
    pub files_written: Vec<PathBuf>,
    pub anomalies: Vec<Anomaly>,
}

/// Converts a resolved units file into the six unit SLK/profile files.
pub fn run(settings: ConverterSettings) -> Result<RunSummary> {
    if !settings.input_path.exists() {
        return Err(ConvertError::Config(format!(
            "Input path does not exist: {}",
            settings.input_path.display()
        )));
    }

    let catalog = FieldCatalog::load(&settings.catalog_path)?;
    let units = input::load_units(&settings.input_path)?;
    if units.is_empty() {
        return Err(ConvertError::NoUnits);
    }

    let template_dir = template::locate_template_dir(&settings.template_path)?;
    info!(
        units = units.len(),
        fields = catalog.len(),
        templates = %template_dir.display(),
        "converting units"
    );

    let mut manager = SlkFileManager::new(catalog, &template_dir)?;
    manager.set_count(units.len());
    for unit in &units {
        manager.write_unit(&unit.id, unit.fields.iter().cloned());
    }

    let outcome = manager.write_files(&settings.output_path);
    let anomalies = manager.anomalies().to_vec();
    if !anomalies.is_empty() {
        warn!(count = anomalies.len(), "some fields were skipped");
    }
    if !outcome.is_success() {
        return Err(ConvertError::Write(
            outcome.failed.iter().map(|(kind, _)| *kind).collect(),
        ));
    }

    info!(
        files = outcome.written.len(),
        output = %settings.output_path.display(),
        "wrote unit files"
    );

    Ok(RunSummary {
        units: units.len(),
        files_written: outcome.written,
        anomalies,
    })
}
