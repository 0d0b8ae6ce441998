use crate::error::ForgeError;
use crate::types::dialect::Dialect;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Engines a connection can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    MySql,
    MariaDb,
    Postgres,
    Sqlite,
    SqlServer,
    MongoDb,
}

impl DatabaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseKind::MySql => "mysql",
            DatabaseKind::MariaDb => "mariadb",
            DatabaseKind::Postgres => "postgres",
            DatabaseKind::Sqlite => "sqlite",
            DatabaseKind::SqlServer => "sqlserver",
            DatabaseKind::MongoDb => "mongodb",
        }
    }

    /// SQL dialect spoken by the engine; `None` for MongoDB.
    pub fn sql_dialect(&self) -> Option<Dialect> {
        match self {
            DatabaseKind::MySql | DatabaseKind::MariaDb => Some(Dialect::MySql),
            DatabaseKind::Postgres => Some(Dialect::Postgres),
            DatabaseKind::Sqlite => Some(Dialect::Sqlite),
            DatabaseKind::SqlServer => Some(Dialect::SqlServer),
            DatabaseKind::MongoDb => None,
        }
    }

    pub fn default_port(&self) -> Option<u16> {
        match self {
            DatabaseKind::MySql | DatabaseKind::MariaDb => Some(3306),
            DatabaseKind::Postgres => Some(5432),
            DatabaseKind::SqlServer => Some(1433),
            DatabaseKind::MongoDb => Some(27017),
            DatabaseKind::Sqlite => None,
        }
    }
}

impl FromStr for DatabaseKind {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(DatabaseKind::MySql),
            "mariadb" => Ok(DatabaseKind::MariaDb),
            "postgres" | "postgresql" => Ok(DatabaseKind::Postgres),
            "sqlite" => Ok(DatabaseKind::Sqlite),
            "sqlserver" => Ok(DatabaseKind::SqlServer),
            "mongodb" => Ok(DatabaseKind::MongoDb),
            _ => Err(ForgeError::unsupported_dialect(s)),
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection request as it arrives on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConnectionConfig {
    pub host: Option<String>,
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default, deserialize_with = "deserialize_port_to_string")]
    pub port: String,
    #[serde(rename = "dbType")]
    pub db_type: Option<String>,
}

/// A validated target database. Passed by reference into every adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub kind: DatabaseKind,
    pub host: String,
    pub user: String,
    pub password: String,
    /// Database name, or the file path for SQLite.
    pub database: String,
    pub port: Option<u16>,
}

impl ConnectionConfig {
    pub fn new(kind: DatabaseKind, host: &str, user: &str, password: &str, database: &str) -> Self {
        Self {
            kind,
            host: host.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            database: database.to_string(),
            port: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn host(&self) -> &str {
        if self.host.is_empty() {
            "localhost"
        } else {
            &self.host
        }
    }

    pub fn port_or_default(&self) -> u16 {
        self.port
            .or_else(|| self.kind.default_port())
            .unwrap_or_default()
    }

    pub fn summary(&self) -> ConnectionSummary {
        ConnectionSummary {
            database: self.database.clone(),
            host: self.host.clone(),
            user: self.user.clone(),
            port: self.port,
            db_type: self.kind.as_str().to_string(),
        }
    }
}

impl TryFrom<RawConnectionConfig> for ConnectionConfig {
    type Error = ForgeError;

    #[track_caller]
    fn try_from(raw: RawConnectionConfig) -> Result<Self, Self::Error> {
        let (Some(host), Some(user), Some(db_type)) = (raw.host, raw.user, raw.db_type) else {
            return Err(ForgeError::input("Missing connection parameters"));
        };
        let kind: DatabaseKind = db_type.parse()?;

        let port = match raw.port.trim() {
            "" => None,
            value => Some(
                value
                    .parse::<u16>()
                    .map_err(|_| ForgeError::input("Port must be a number"))?,
            ),
        };

        Ok(Self {
            kind,
            host,
            user,
            password: raw.password.unwrap_or_default(),
            database: raw.database.unwrap_or_default(),
            port,
        })
    }
}

/// Connection details safe to echo back to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionSummary {
    pub database: String,
    pub host: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(rename = "dbType")]
    pub db_type: String,
}

fn deserialize_port_to_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct PortVisitor;

    impl<'de> serde::de::Visitor<'de> for PortVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer port value")
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value < 0 {
                return Err(E::custom("port cannot be negative"));
            }
            Ok(value.to_string())
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_owned())
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(String::new())
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(PortVisitor)
}
