//! Request schemas and validated names.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} {reason}")]
pub struct InvalidField {
    pub field: &'static str,
    pub reason: &'static str,
}

/// A database name: non-empty, ASCII alphanumeric, bounded length.
///
/// Names are spliced into engine statements by the backends, so nothing
/// outside `[A-Za-z0-9]` is ever accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DatabaseName(String);

impl DatabaseName {
    pub const MAX_LEN: usize = 64;

    /// Validate `raw`, attributing failures to `field`.
    pub fn parse(field: &'static str, raw: &str) -> Result<Self, InvalidField> {
        if raw.is_empty() {
            return Err(InvalidField { field, reason: "is required" });
        }
        if raw.len() > Self::MAX_LEN {
            return Err(InvalidField {
                field,
                reason: "must be at most 64 characters",
            });
        }
        if !raw.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(InvalidField {
                field,
                reason: "must be alphanumeric",
            });
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of `POST /{engine}/databases`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreateDatabaseRequest {
    #[serde(default)]
    pub database_name: String,
}

impl CreateDatabaseRequest {
    pub fn validate(&self) -> Result<DatabaseName, InvalidField> {
        DatabaseName::parse("database_name", &self.database_name)
    }
}

/// Body of `PATCH /{engine}/databases/{db_name}`.
///
/// `old_database_name` is optional; when sent it must name the database in
/// the path.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RenameDatabaseRequest {
    #[serde(default)]
    pub old_database_name: Option<String>,
    #[serde(default)]
    pub new_database_name: String,
}

impl RenameDatabaseRequest {
    /// Returns the current and the new name.
    pub fn validate(&self, path_name: &str) -> Result<(DatabaseName, DatabaseName), InvalidField> {
        let old = target_database(
            path_name,
            "old_database_name",
            self.old_database_name.as_deref(),
        )?;
        let new = DatabaseName::parse("new_database_name", &self.new_database_name)?;
        Ok((old, new))
    }
}

/// Optional body of the credentials, delete and stats routes.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseSelector {
    #[serde(default)]
    pub database_name: Option<String>,
}

impl DatabaseSelector {
    pub fn validate(&self, path_name: &str) -> Result<DatabaseName, InvalidField> {
        target_database(path_name, "database_name", self.database_name.as_deref())
    }
}

/// The database a request acts on. The path names it; a body field, if
/// present, must name the same database.
fn target_database(
    path_name: &str,
    body_field: &'static str,
    body_name: Option<&str>,
) -> Result<DatabaseName, InvalidField> {
    let name = DatabaseName::parse("db_name", path_name)?;
    if let Some(body_name) = body_name {
        let body_name = DatabaseName::parse(body_field, body_name)?;
        if body_name != name {
            return Err(InvalidField {
                field: body_field,
                reason: "does not match the database in the path",
            });
        }
    }
    Ok(name)
}

/// Per-user query totals reported by engines that track them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryActivity {
    pub username: String,
    pub database_name: String,
    pub total_queries: u64,
}

#[derive(Debug, Serialize)]
pub struct ProvisionedDatabase {
    pub username: String,
    pub password: String,
    pub database_name: DatabaseName,
}

#[derive(Debug, Serialize)]
pub struct RenamedDatabase {
    pub old_database_name: DatabaseName,
    pub new_database_name: DatabaseName,
}

#[derive(Debug, Serialize)]
pub struct DeletedDatabase {
    pub database_name: DatabaseName,
}

#[derive(Debug, Serialize)]
pub struct DatabaseStats {
    pub database_name: DatabaseName,
    pub stats: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct QueryActivityReport {
    pub user_activities: Vec<QueryActivity>,
}
