use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::catalog::FieldValue;
use crate::{ConvertError, Result};

/// One unit with its resolved fields, in input order.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitRecord {
    pub id: String,
    pub fields: Vec<(String, FieldValue)>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UnitsFile {
    List(Vec<ListedUnit>),
    Keyed(Map<String, Value>),
}

#[derive(Deserialize)]
struct ListedUnit {
    id: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

pub fn load_units(path: &Path) -> Result<Vec<UnitRecord>> {
    let src = fs::read_to_string(path)?;
    parse_units(&src).map_err(|err| match err {
        ConvertError::Json(source) => ConvertError::Input {
            path: path.display().to_string(),
            source,
        },
        other => other,
    })
}

/// Accepts either `[{"id": .., "fields": {..}}, ..]` or `{"<id>": {..}, ..}`.
pub fn parse_units(src: &str) -> Result<Vec<UnitRecord>> {
    let file: UnitsFile = serde_json::from_str(src)?;
    match file {
        UnitsFile::List(units) => units
            .into_iter()
            .map(|unit| unit_record(unit.id, unit.fields))
            .collect(),
        UnitsFile::Keyed(units) => units
            .into_iter()
            .map(|(id, fields)| match fields {
                Value::Object(fields) => unit_record(id, fields),
                _ => Err(ConvertError::Config(format!(
                    "unit {id} is not an object of fields"
                ))),
            })
            .collect(),
    }
}

fn unit_record(id: String, fields: Map<String, Value>) -> Result<UnitRecord> {
    let fields = fields
        .into_iter()
        .map(|(field, value)| {
            let value = field_value(&id, &field, value)?;
            Ok((field, value))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(UnitRecord { id, fields })
}

fn field_value(unit: &str, field: &str, value: Value) -> Result<FieldValue> {
    match value {
        // Flags such as isCustom arrive as booleans.
        Value::Bool(b) => Ok(FieldValue::Integer(i64::from(b))),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(FieldValue::Integer(i)),
            None => n.as_f64().map(FieldValue::Real).ok_or_else(|| {
                ConvertError::InvalidValue {
                    unit: unit.to_string(),
                    field: field.to_string(),
                }
            }),
        },
        Value::String(s) => Ok(FieldValue::Text(s)),
        _ => Err(ConvertError::InvalidValue {
            unit: unit.to_string(),
            field: field.to_string(),
        }),
    }
}
