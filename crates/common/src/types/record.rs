use crate::types::simplified::{SimpleType, SimplifiedColumn};
use serde::Serialize;
use serde_json::{Map, Value};

/// A typed cell of a synthetic row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl SqlValue {
    /// Coerces a generated JSON value to the declared column type.
    /// Anything that cannot be represented becomes `Null`.
    pub fn coerce(value: &Value, target: SimpleType) -> SqlValue {
        match (target, value) {
            (_, Value::Null) => SqlValue::Null,
            (SimpleType::Int, v) => coerce_int(v).map_or(SqlValue::Null, SqlValue::Int),
            (SimpleType::Float, v) => coerce_float(v).map_or(SqlValue::Null, SqlValue::Float),
            (SimpleType::Boolean, v) => coerce_bool(v).map_or(SqlValue::Null, SqlValue::Bool),
            (_, Value::String(s)) => SqlValue::Text(s.clone()),
            (_, Value::Number(n)) => SqlValue::Text(n.to_string()),
            (_, Value::Bool(b)) => SqlValue::Text(b.to_string()),
            (_, Value::Array(_) | Value::Object(_)) => SqlValue::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn to_json(&self) -> Value {
        match self {
            SqlValue::Null => Value::Null,
            SqlValue::Int(i) => Value::from(*i),
            SqlValue::Float(f) => Value::from(*f),
            SqlValue::Bool(b) => Value::Bool(*b),
            SqlValue::Text(s) => Value::String(s.clone()),
        }
    }
}

fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// One synthetic row: ordered `(column, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, SqlValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: SqlValue) {
        self.fields.push((column.into(), value));
    }

    /// Builds a record from a generated JSON object, keeping only the keys
    /// declared in `columns` (in declaration order) and coercing each value.
    /// Returns `None` when `value` is not an object.
    pub fn from_json(value: &Value, columns: &[SimplifiedColumn]) -> Option<Record> {
        let object = value.as_object()?;
        let fields = columns
            .iter()
            .filter_map(|column| {
                object
                    .get(&column.name)
                    .map(|v| (column.name.clone(), SqlValue::coerce(v, column.column_type)))
            })
            .collect();
        Some(Record { fields })
    }

    /// Drops every field whose column is flagged auto-increment.
    pub fn without_auto_increment(&self, columns: &[SimplifiedColumn]) -> Record {
        let fields = self
            .fields
            .iter()
            .filter(|(name, _)| {
                !columns
                    .iter()
                    .any(|c| c.auto_increment && &c.name == name)
            })
            .cloned()
            .collect();
        Record { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn to_json_object(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns() -> Vec<SimplifiedColumn> {
        vec![
            SimplifiedColumn::new("id", SimpleType::Int).auto_increment(),
            SimplifiedColumn::new("age", SimpleType::Int),
            SimplifiedColumn::new("score", SimpleType::Float),
            SimplifiedColumn::new("active", SimpleType::Boolean),
            SimplifiedColumn::new("name", SimpleType::String),
        ]
    }

    #[test]
    fn coerces_values_to_declared_types() {
        let row = json!({
            "name": "Ada",
            "age": "42",
            "score": 7,
            "active": "false",
            "unexpected": "dropped"
        });
        let record = Record::from_json(&row, &columns()).unwrap();

        assert_eq!(record.columns().collect::<Vec<_>>(), ["age", "score", "active", "name"]);
        assert_eq!(record.get("age"), Some(&SqlValue::Int(42)));
        assert_eq!(record.get("score"), Some(&SqlValue::Float(7.0)));
        assert_eq!(record.get("active"), Some(&SqlValue::Bool(false)));
        assert!(record.get("unexpected").is_none());
    }

    #[test]
    fn uncoercible_values_become_null() {
        let row = json!({"age": "forty", "active": 3, "name": {"first": "Ada"}});
        let record = Record::from_json(&row, &columns()).unwrap();
        assert!(record.values().all(SqlValue::is_null));
    }

    #[test]
    fn auto_increment_fields_are_filtered() {
        let row = json!({"id": 9});
        let record = Record::from_json(&row, &columns()).unwrap();
        assert_eq!(record.len(), 1);
        assert!(record.without_auto_increment(&columns()).is_empty());
    }

    #[test]
    fn non_objects_are_not_records() {
        assert!(Record::from_json(&json!([1, 2]), &columns()).is_none());
    }
}
