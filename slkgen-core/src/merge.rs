use indexmap::IndexMap;

use crate::anomaly::{report, Anomaly};
use crate::catalog::{FieldMetadata, FieldValue, IndexTag, ValueType};

#[derive(Clone, Debug)]
struct PendingField {
    field_id: String,
    index: IndexTag,
    value_type: ValueType,
    value: FieldValue,
}

/// Profile block of one unit. Values are held until commit so that
/// indexed fields sharing a key can be combined into one cell.
#[derive(Clone, Debug)]
pub struct ProfileBlock {
    unit_id: String,
    pending: IndexMap<String, Vec<PendingField>>,
}

impl ProfileBlock {
    pub fn new(unit_id: &str) -> Self {
        ProfileBlock {
            unit_id: unit_id.to_string(),
            pending: IndexMap::new(),
        }
    }

    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn push(&mut self, meta: &FieldMetadata, value: FieldValue) {
        self.pending
            .entry(meta.field.clone())
            .or_default()
            .push(PendingField {
                field_id: meta.id.clone(),
                index: meta.index.clone(),
                value_type: meta.value_type,
                value,
            });
    }

    /// Resolves every key to its final `(key, value)` pair, keys in
    /// first-arrival order.
    pub fn resolve(self, anomalies: &mut Vec<Anomaly>) -> Vec<(String, String)> {
        let unit_id = self.unit_id;
        self.pending
            .into_iter()
            .filter_map(|(key, entries)| {
                let value = merge_entries(&unit_id, &key, entries, anomalies)?;
                Some((key, value))
            })
            .collect()
    }

    /// `[unit]`, one `key=value` line per resolved key, then a blank line.
    pub fn into_lines(self, anomalies: &mut Vec<Anomaly>) -> Vec<String> {
        let mut lines = vec![format!("[{}]", self.unit_id)];
        lines.extend(
            self.resolve(anomalies)
                .into_iter()
                .map(|(key, value)| format!("{key}={value}")),
        );
        lines.push(String::new());
        lines
    }
}

/// Position of each tag inside a merged cell is fixed: `First` goes left
/// of the existing value, `Second` goes right, whatever the arrival order.
fn merge_entries(
    unit_id: &str,
    key: &str,
    entries: Vec<PendingField>,
    anomalies: &mut Vec<Anomaly>,
) -> Option<String> {
    let mut entries = entries.into_iter();
    let head = entries.next()?;

    let mut value = head.value.to_string();
    let mut has_first = head.index == IndexTag::First;
    let mut has_second = head.index == IndexTag::Second;

    for entry in entries {
        let tagged_cell = has_first || has_second;
        let merged = match entry.index {
            IndexTag::First if tagged_cell && !has_first => {
                has_first = true;
                format!("{},{}", entry.value, value)
            }
            IndexTag::Second if tagged_cell && !has_second => {
                has_second = true;
                format!("{},{}", value, entry.value)
            }
            _ => {
                report(
                    anomalies,
                    Anomaly::UnmergedIndex {
                        unit: unit_id.to_string(),
                        field: entry.field_id,
                        column: key.to_string(),
                        index: entry.index,
                    },
                );
                continue;
            }
        };

        value = if entry.value_type.is_text() {
            format!("\"{merged}\"")
        } else {
            merged
        };
    }

    Some(value)
}
