use thiserror::Error;
use tracing::warn;

use crate::catalog::{IndexTag, SlkKind};

/// A placement the engine skipped. Reported, never fatal.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Anomaly {
    #[error("unit {unit}: field '{field}' is not in the field catalog")]
    UnknownField { unit: String, field: String },

    #[error("unit {unit}: {kind} has no column named '{column}' (field '{field}')")]
    UnmappedColumn {
        unit: String,
        kind: SlkKind,
        field: String,
        column: String,
    },

    #[error("unit {unit}: unhandled index {index} for '{column}' (field '{field}')")]
    UnmergedIndex {
        unit: String,
        field: String,
        column: String,
        index: IndexTag,
    },
}

/// Logs `anomaly` and appends it to `sink`.
pub(crate) fn report(sink: &mut Vec<Anomaly>, anomaly: Anomaly) {
    warn!("{anomaly}");
    sink.push(anomaly);
}
