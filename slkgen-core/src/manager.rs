use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::anomaly::{report, Anomaly};
use crate::catalog::{FieldCatalog, FieldValue, SlkKind};
use crate::slk_file::SlkFile;
use crate::template::{SlkTemplate, TemplateError};

/// Unit attributes that only describe the unit record itself.
const BOOKKEEPING_FIELDS: [&str; 2] = ["isCustom", "baseUnit"];

/// Outcome of writing every kind. Failed kinds do not stop the others.
#[derive(Debug, Default)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(SlkKind, std::io::Error)>,
}

impl WriteReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owns one [`SlkFile`] per destination kind and routes unit fields to them.
#[derive(Debug)]
pub struct SlkFileManager {
    catalog: FieldCatalog,
    /// Indexed by [`SlkKind::slot`].
    files: Vec<SlkFile>,
    anomalies: Vec<Anomaly>,
}

impl SlkFileManager {
    /// Loads every header template from `template_dir`. A missing or
    /// broken template aborts construction.
    pub fn new(catalog: FieldCatalog, template_dir: &Path) -> Result<Self, TemplateError> {
        let files = SlkKind::ALL
            .iter()
            .map(|&kind| SlkFile::new(kind, template_dir))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SlkFileManager {
            catalog,
            files,
            anomalies: Vec::new(),
        })
    }

    /// Builds a manager from already parsed templates, one per templated kind.
    pub fn from_templates<I>(catalog: FieldCatalog, templates: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = SlkTemplate>,
    {
        let mut templates: Vec<SlkTemplate> = templates.into_iter().collect();
        let mut files = Vec::with_capacity(SlkKind::ALL.len());
        for kind in SlkKind::ALL {
            if !kind.is_templated() {
                files.push(SlkFile::profile());
                continue;
            }
            let pos = templates
                .iter()
                .position(|t| t.kind() == kind)
                .ok_or(TemplateError::MissingTemplate { kind })?;
            files.push(SlkFile::from_template(templates.swap_remove(pos)));
        }
        Ok(SlkFileManager {
            catalog,
            files,
            anomalies: Vec::new(),
        })
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn file(&self, kind: SlkKind) -> &SlkFile {
        &self.files[kind.slot()]
    }

    /// Declares the number of units in every templated header.
    pub fn set_count(&mut self, count: usize) {
        for file in &mut self.files {
            file.set_row_count(count);
        }
    }

    /// Opens a row for `unit_id` in every kind and places its fields.
    pub fn write_unit<I, K>(&mut self, unit_id: &str, fields: I)
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: AsRef<str>,
    {
        for file in &mut self.files {
            file.start_unit(unit_id);
        }

        let mut placed = 0usize;
        for (field_id, value) in fields {
            let field_id = field_id.as_ref();
            if BOOKKEEPING_FIELDS.contains(&field_id) {
                continue;
            }
            let Some(meta) = self.catalog.get(field_id) else {
                report(
                    &mut self.anomalies,
                    Anomaly::UnknownField {
                        unit: unit_id.to_string(),
                        field: field_id.to_string(),
                    },
                );
                continue;
            };
            self.files[meta.slk.slot()].write_field(value, meta);
            placed += 1;
        }
        debug!(unit = unit_id, fields = placed, "wrote unit");

        self.collect_anomalies();
    }

    fn collect_anomalies(&mut self) {
        for file in &mut self.files {
            self.anomalies.extend(file.take_anomalies());
        }
    }

    /// Everything skipped so far. Merge problems of the last unit show up
    /// once its rows are committed.
    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    /// Commits the last rows and writes every kind into `dir`.
    pub fn write_files(&mut self, dir: &Path) -> WriteReport {
        let mut outcome = WriteReport::default();
        for file in &mut self.files {
            match file.write_file(dir) {
                Ok(path) => outcome.written.push(path),
                Err(err) => {
                    warn!(kind = %file.kind(), error = %err, "failed to write slk file");
                    outcome.failed.push((file.kind(), err));
                }
            }
        }
        self.collect_anomalies();
        outcome
    }
}
