use serde::{Deserialize, Serialize};

pub const DEFAULT_SIMPLIFIED_COUNT: u32 = 100;

/// Column type bucket of the synthetic-data format.
///
/// `to_simplified` only ever produces the first five variants; `Email` and
/// `Datetime` are accepted from clients when generating data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SimpleType {
    Int,
    String,
    Date,
    Boolean,
    Float,
    Email,
    Datetime,
}

impl SimpleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimpleType::Int => "int",
            SimpleType::String => "string",
            SimpleType::Date => "date",
            SimpleType::Boolean => "boolean",
            SimpleType::Float => "float",
            SimpleType::Email => "email",
            SimpleType::Datetime => "datetime",
        }
    }

    /// Lenient token parse; unknown tokens land in `String`.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" => SimpleType::Int,
            "date" => SimpleType::Date,
            "datetime" => SimpleType::Datetime,
            "boolean" | "bool" => SimpleType::Boolean,
            "float" | "decimal" => SimpleType::Float,
            "email" => SimpleType::Email,
            _ => SimpleType::String,
        }
    }
}

impl From<String> for SimpleType {
    fn from(value: String) -> Self {
        SimpleType::from_token(&value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub past: Option<bool>,
}

impl ColumnOptions {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.unique.is_none() && self.past.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: SimpleType,
    #[serde(rename = "autoIncrement", default)]
    pub auto_increment: bool,
    #[serde(rename = "notNull", default, skip_serializing_if = "std::ops::Not::not")]
    pub not_null: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ColumnOptions>,
}

impl SimplifiedColumn {
    pub fn new(name: impl Into<String>, column_type: SimpleType) -> Self {
        Self {
            name: name.into(),
            column_type,
            auto_increment: false,
            not_null: false,
            options: None,
        }
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedSchema {
    #[serde(rename = "tableName")]
    pub table_name: String,
    #[serde(default = "default_count")]
    pub count: u32,
    pub columns: Vec<SimplifiedColumn>,
}

fn default_count() -> u32 {
    DEFAULT_SIMPLIFIED_COUNT
}
