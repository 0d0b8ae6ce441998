use common::types::{Dialect, SimpleType};

/// How a dialect expresses an auto-incrementing integer key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoIncrementStyle {
    /// Keyword appended after the other column constraints.
    Suffix(&'static str),
    /// The column type itself is swapped for `SERIAL`/`BIGSERIAL`.
    SerialType,
    /// `INTEGER PRIMARY KEY AUTOINCREMENT` on the column; only valid when the
    /// key has a single column.
    InlinePrimaryKey,
    None,
}

#[derive(Debug, Clone, Copy)]
pub struct NativeTypes {
    pub int: &'static str,
    pub float: &'static str,
    pub boolean: &'static str,
    pub date: &'static str,
    pub datetime: &'static str,
    pub email: &'static str,
    pub string: &'static str,
}

/// Everything the DDL synthesizer needs to know about one dialect.
#[derive(Debug, Clone, Copy)]
pub struct DialectRules {
    pub dialect: Dialect,
    pub open_quote: char,
    pub close_quote: char,
    pub auto_increment: AutoIncrementStyle,
    pub native_types: NativeTypes,
    pub true_literal: &'static str,
    pub false_literal: &'static str,
}

const MYSQL: DialectRules = DialectRules {
    dialect: Dialect::MySql,
    open_quote: '`',
    close_quote: '`',
    auto_increment: AutoIncrementStyle::Suffix("AUTO_INCREMENT"),
    native_types: NativeTypes {
        int: "INT",
        float: "FLOAT",
        boolean: "BOOLEAN",
        date: "DATE",
        datetime: "DATETIME",
        email: "VARCHAR(100)",
        string: "VARCHAR(255)",
    },
    true_literal: "TRUE",
    false_literal: "FALSE",
};

const POSTGRES: DialectRules = DialectRules {
    dialect: Dialect::Postgres,
    open_quote: '"',
    close_quote: '"',
    auto_increment: AutoIncrementStyle::SerialType,
    native_types: NativeTypes {
        int: "INTEGER",
        float: "FLOAT",
        boolean: "BOOLEAN",
        date: "DATE",
        datetime: "TIMESTAMP",
        email: "VARCHAR(100)",
        string: "VARCHAR(255)",
    },
    true_literal: "TRUE",
    false_literal: "FALSE",
};

const SQLITE: DialectRules = DialectRules {
    dialect: Dialect::Sqlite,
    open_quote: '"',
    close_quote: '"',
    auto_increment: AutoIncrementStyle::InlinePrimaryKey,
    native_types: NativeTypes {
        int: "INTEGER",
        float: "REAL",
        boolean: "INTEGER",
        date: "TEXT",
        datetime: "TEXT",
        email: "TEXT",
        string: "TEXT",
    },
    true_literal: "1",
    false_literal: "0",
};

const SQL_SERVER: DialectRules = DialectRules {
    dialect: Dialect::SqlServer,
    open_quote: '[',
    close_quote: ']',
    auto_increment: AutoIncrementStyle::Suffix("IDENTITY(1,1)"),
    native_types: NativeTypes {
        int: "INT",
        float: "FLOAT",
        boolean: "BIT",
        date: "DATE",
        datetime: "DATETIME",
        email: "NVARCHAR(100)",
        string: "NVARCHAR(255)",
    },
    true_literal: "1",
    false_literal: "0",
};

const TRINO: DialectRules = DialectRules {
    dialect: Dialect::Trino,
    open_quote: '"',
    close_quote: '"',
    auto_increment: AutoIncrementStyle::None,
    native_types: NativeTypes {
        int: "INTEGER",
        float: "DOUBLE",
        boolean: "BOOLEAN",
        date: "DATE",
        datetime: "TIMESTAMP",
        email: "VARCHAR(100)",
        string: "VARCHAR",
    },
    true_literal: "TRUE",
    false_literal: "FALSE",
};

impl DialectRules {
    pub fn for_dialect(dialect: Dialect) -> &'static DialectRules {
        match dialect {
            Dialect::MySql => &MYSQL,
            Dialect::Postgres => &POSTGRES,
            Dialect::Sqlite => &SQLITE,
            Dialect::SqlServer => &SQL_SERVER,
            Dialect::Trino => &TRINO,
        }
    }

    /// Quotes an identifier, doubling any embedded closing quote.
    pub fn quote(&self, ident: &str) -> String {
        let mut quoted = String::with_capacity(ident.len() + 2);
        quoted.push(self.open_quote);
        for ch in ident.chars() {
            if ch == self.close_quote {
                quoted.push(ch);
            }
            quoted.push(ch);
        }
        quoted.push(self.close_quote);
        quoted
    }

    pub fn native_type(&self, simple: SimpleType) -> &'static str {
        let types = &self.native_types;
        match simple {
            SimpleType::Int => types.int,
            SimpleType::Float => types.float,
            SimpleType::Boolean => types.boolean,
            SimpleType::Date => types.date,
            SimpleType::Datetime => types.datetime,
            SimpleType::Email => types.email,
            SimpleType::String => types.string,
        }
    }

    pub fn bool_literal(&self, value: bool) -> &'static str {
        if value {
            self.true_literal
        } else {
            self.false_literal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_per_dialect() {
        assert_eq!(DialectRules::for_dialect(Dialect::MySql).quote("user"), "`user`");
        assert_eq!(DialectRules::for_dialect(Dialect::Postgres).quote("user"), "\"user\"");
        assert_eq!(DialectRules::for_dialect(Dialect::SqlServer).quote("user"), "[user]");
        assert_eq!(DialectRules::for_dialect(Dialect::Trino).quote("user"), "\"user\"");
    }

    #[test]
    fn embedded_closing_quote_is_doubled() {
        assert_eq!(DialectRules::for_dialect(Dialect::SqlServer).quote("a]b"), "[a]]b]");
        assert_eq!(DialectRules::for_dialect(Dialect::Sqlite).quote("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn every_dialect_has_rules() {
        for dialect in Dialect::ALL {
            assert_eq!(DialectRules::for_dialect(dialect).dialect, dialect);
        }
    }
}
