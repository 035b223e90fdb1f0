use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::catalog::SlkKind;

/// File used to recognise a directory of header templates.
const PROBE_TEMPLATE: &str = "UnitData.slk";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("{kind} has no header template")]
    NotTemplated { kind: SlkKind },

    #[error("no slk header supplied for {kind}")]
    MissingTemplate { kind: SlkKind },

    #[error("failed to load slk header {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("slk header for {kind} has no row count line")]
    MissingCountLine { kind: SlkKind },

    #[error("slk header for {kind} has a malformed column on line {line}: '{text}'")]
    MalformedColumn {
        kind: SlkKind,
        line: usize,
        text: String,
    },

    #[error("no directory containing UnitData.slk under {0}")]
    NotFound(PathBuf),
}

/// Parsed header prologue of a templated SLK kind.
#[derive(Clone, Debug)]
pub struct SlkTemplate {
    kind: SlkKind,
    lines: Vec<String>,
    count_line: usize,
    columns: HashMap<String, u32>,
}

impl SlkTemplate {
    pub fn load(kind: SlkKind, dir: &Path) -> Result<Self, TemplateError> {
        if !kind.is_templated() {
            return Err(TemplateError::NotTemplated { kind });
        }
        let path = dir.join(kind.file_name());
        let text = fs::read_to_string(&path).map_err(|e| TemplateError::Io {
            path: path.clone(),
            source: e,
        })?;
        let template = Self::parse(kind, &text)?;
        debug!(
            kind = %kind,
            path = %path.display(),
            columns = template.columns.len(),
            "loaded slk header"
        );
        Ok(template)
    }

    pub fn parse(kind: SlkKind, text: &str) -> Result<Self, TemplateError> {
        let mut lines: Vec<String> = Vec::new();
        let mut columns = HashMap::new();
        let mut count_line = None;

        for (idx, raw) in text.split('\n').enumerate() {
            let line = raw.strip_suffix('\r').unwrap_or(raw);

            if line.starts_with("B;") && count_line.is_none() {
                count_line = Some(lines.len());
            } else if line.starts_with('C') {
                let (column, name) =
                    parse_column_line(line).ok_or_else(|| TemplateError::MalformedColumn {
                        kind,
                        line: idx + 1,
                        text: line.to_string(),
                    })?;
                // X1 holds the row key, never a field value.
                if column != 1 {
                    columns.insert(name.to_string(), column);
                }
            }

            lines.push(line.to_string());
        }

        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }

        let count_line = count_line.ok_or(TemplateError::MissingCountLine { kind })?;

        Ok(SlkTemplate {
            kind,
            lines,
            count_line,
            columns,
        })
    }

    pub fn kind(&self) -> SlkKind {
        self.kind
    }

    pub fn column(&self, name: &str) -> Option<u32> {
        self.columns.get(name).copied()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Declares `rows` unit rows; the stored count includes the header row.
    pub fn set_row_count(&mut self, rows: usize) {
        let declared = rows + 1;
        let line = &mut self.lines[self.count_line];
        let mut replaced = false;
        let mut parts: Vec<String> = line
            .split(';')
            .map(|part| {
                if !replaced && part.starts_with('Y') {
                    replaced = true;
                    format!("Y{declared}")
                } else {
                    part.to_string()
                }
            })
            .collect();
        if !replaced {
            // `B;X<n>;D0` without a Y field: insert it ahead of the trailing D0.
            let at = parts.len().saturating_sub(1).max(1);
            parts.insert(at, format!("Y{declared}"));
        }
        *line = parts.join(";");
    }

    pub fn declared_rows(&self) -> Option<usize> {
        self.lines[self.count_line]
            .split(';')
            .find_map(|part| part.strip_prefix('Y'))
            .and_then(|n| n.parse().ok())
    }
}

/// Parses `C;X<n>[;...];K"<name>"` into the column number and quoted name.
fn parse_column_line(line: &str) -> Option<(u32, &str)> {
    let rest = line.strip_prefix("C;X")?;
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let column: u32 = rest[..digits_end].parse().ok()?;

    let key_start = rest.find(";K\"")? + 3;
    let key = &rest[key_start..];
    let key_end = key.rfind('"')?;
    Some((column, &key[..key_end]))
}

/// Finds the directory holding the header templates, either `root` itself
/// or the first matching directory below it.
pub fn locate_template_dir(root: &Path) -> Result<PathBuf, TemplateError> {
    if root.join(PROBE_TEMPLATE).is_file() {
        return Ok(root.to_path_buf());
    }

    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_type().is_file() && entry.file_name() == PROBE_TEMPLATE)
        .and_then(|entry| entry.path().parent().map(Path::to_path_buf))
        .ok_or_else(|| TemplateError::NotFound(root.to_path_buf()))
}
