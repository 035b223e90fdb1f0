use std::fs;
use std::mem;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::anomaly::{report, Anomaly};
use crate::catalog::{FieldMetadata, FieldValue, SlkKind};
use crate::fixups;
use crate::merge::ProfileBlock;
use crate::row::{SlkCell, UnitRow};
use crate::template::{SlkTemplate, TemplateError};

/// Closing record of an SLK file.
const END_RECORD: &str = "E";
const LINE_ENDING: &str = "\r\n";

#[derive(Debug)]
enum OpenRow {
    Slk(UnitRow),
    Profile(ProfileBlock),
}

/// Accumulated output of one destination kind.
#[derive(Debug)]
pub struct SlkFile {
    kind: SlkKind,
    template: Option<SlkTemplate>,
    body: Vec<String>,
    ordinal: usize,
    open: Option<OpenRow>,
    committed: usize,
    anomalies: Vec<Anomaly>,
}

impl SlkFile {
    /// Loads the header template for templated kinds.
    pub fn new(kind: SlkKind, template_dir: &Path) -> Result<Self, TemplateError> {
        let template = if kind.is_templated() {
            Some(SlkTemplate::load(kind, template_dir)?)
        } else {
            None
        };
        Ok(Self::with_template(kind, template))
    }

    pub fn from_template(template: SlkTemplate) -> Self {
        Self::with_template(template.kind(), Some(template))
    }

    pub fn profile() -> Self {
        Self::with_template(SlkKind::Profile, None)
    }

    fn with_template(kind: SlkKind, template: Option<SlkTemplate>) -> Self {
        SlkFile {
            kind,
            template,
            body: Vec::new(),
            // Y1 is the template's own header row.
            ordinal: 1,
            open: None,
            committed: 0,
            anomalies: Vec::new(),
        }
    }

    pub fn kind(&self) -> SlkKind {
        self.kind
    }

    /// Units committed with at least one line of data.
    pub fn committed_rows(&self) -> usize {
        self.committed
    }

    pub fn set_row_count(&mut self, rows: usize) {
        if let Some(template) = self.template.as_mut() {
            template.set_row_count(rows);
        }
    }

    /// Commits the open row, if any, and opens one for `unit_id`.
    pub fn start_unit(&mut self, unit_id: &str) {
        self.finish_unit();
        self.ordinal += 1;
        self.open = Some(match self.template {
            Some(_) => OpenRow::Slk(UnitRow::new(unit_id, self.ordinal)),
            None => OpenRow::Profile(ProfileBlock::new(unit_id)),
        });
    }

    pub fn write_field(&mut self, value: FieldValue, meta: &FieldMetadata) {
        match self.open.as_mut() {
            Some(OpenRow::Slk(row)) => {
                // Templates always exist for rows of this shape.
                let Some(template) = self.template.as_ref() else {
                    return;
                };
                let Some(column) = template.column(&meta.field) else {
                    report(
                        &mut self.anomalies,
                        Anomaly::UnmappedColumn {
                            unit: row.unit_id().to_string(),
                            kind: self.kind,
                            field: meta.id.clone(),
                            column: meta.field.clone(),
                        },
                    );
                    return;
                };
                let cell = if meta.value_type.is_text() {
                    SlkCell::text(column, &value.to_string())
                } else {
                    SlkCell::raw(column, value.to_string())
                };
                row.push(cell);
            }
            Some(OpenRow::Profile(block)) => block.push(meta, value),
            None => {
                warn!(kind = %self.kind, field = %meta.id, "field written with no open unit");
            }
        }
    }

    /// Post-processes and appends the open row. Rows without data are
    /// dropped.
    pub fn finish_unit(&mut self) {
        let Some(open) = self.open.take() else {
            return;
        };

        let lines: Vec<String> = match open {
            OpenRow::Slk(mut row) => {
                fixups::apply(self.kind, &mut row);
                if row.is_empty() {
                    return;
                }
                row.lines().collect()
            }
            OpenRow::Profile(block) => {
                if block.is_empty() {
                    return;
                }
                block.into_lines(&mut self.anomalies)
            }
        };

        self.body.extend(lines);
        self.committed += 1;
    }

    pub fn take_anomalies(&mut self) -> Vec<Anomaly> {
        mem::take(&mut self.anomalies)
    }

    /// Header, committed rows and terminator as they would be written.
    /// The open row is not included; call [`SlkFile::finish_unit`] first.
    pub fn render(&self) -> String {
        let header = self.template.as_ref().map(SlkTemplate::lines).unwrap_or(&[]);
        let footer: &[&str] = if self.kind.is_templated() {
            &[END_RECORD, ""]
        } else {
            &[""]
        };

        let lines: Vec<&str> = header
            .iter()
            .chain(self.body.iter())
            .map(String::as_str)
            .chain(footer.iter().copied())
            .collect();
        lines.join(LINE_ENDING)
    }

    /// Commits the open row and writes the file into `dir`, creating it if
    /// needed.
    pub fn write_file(&mut self, dir: &Path) -> std::io::Result<PathBuf> {
        self.finish_unit();
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        let path = dir.join(self.kind.file_name());
        fs::write(&path, self.render())?;
        debug!(
            kind = %self.kind,
            rows = self.committed,
            path = %path.display(),
            "wrote slk file"
        );
        Ok(path)
    }
}
