//! Project configuration (`sqlc.json`).
//!
//! A configuration lists SQL packages. Each package names its engine, where
//! its schema and query files live, and the strictness switches used while
//! checking its queries:
//!
//! ```json
//! {
//!   "version": "2",
//!   "sql": [{
//!     "name": "app",
//!     "engine": "postgresql",
//!     "schema": "schema.sql",
//!     "queries": ["queries/users.sql", "queries/posts.sql"],
//!     "strict_function_checks": true
//!   }]
//! }
//! ```
//!
//! Passes never read configuration from ambient state; they take a
//! [`CombinedSettings`] argument.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sqlc_error::{Result, SqlcError};
use tracing::debug;

/// The only configuration version understood.
pub const CONFIG_VERSION: &str = "2";

/// Database engine a package targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    PostgreSQL,
    MySQL,
    SQLite,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PostgreSQL => "postgresql",
            Self::MySQL => "mysql",
            Self::SQLite => "sqlite",
        })
    }
}

/// One or more file paths. Accepts a single string or a list of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PathsRepr", into = "Vec<String>")]
pub struct Paths(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum PathsRepr {
    One(String),
    Many(Vec<String>),
}

impl From<PathsRepr> for Paths {
    fn from(repr: PathsRepr) -> Self {
        match repr {
            PathsRepr::One(path) => Self(vec![path]),
            PathsRepr::Many(paths) => Self(paths),
        }
    }
}

impl From<Paths> for Vec<String> {
    fn from(paths: Paths) -> Self {
        paths.0
    }
}

impl Paths {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Paths joined onto `base` (usually the configuration file's directory).
    /// Absolute paths are kept as they are.
    #[must_use]
    pub fn resolve(&self, base: &Path) -> Vec<PathBuf> {
        self.0.iter().map(|p| base.join(p)).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Paths {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// One `sql` entry of the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlPackage {
    #[serde(default)]
    pub name: String,
    pub engine: Engine,
    pub queries: Paths,
    pub schema: Paths,
    /// Unknown ordinary function calls are errors instead of being tolerated.
    #[serde(default)]
    pub strict_function_checks: bool,
}

impl SqlPackage {
    /// A package with the given engine and no files, all checks lenient.
    #[must_use]
    pub fn new(name: impl Into<String>, engine: Engine) -> Self {
        Self {
            name: name.into(),
            engine,
            queries: Paths::default(),
            schema: Paths::default(),
            strict_function_checks: false,
        }
    }

    fn check(&self, index: usize) -> Result<()> {
        let label = if self.name.is_empty() {
            format!("sql[{index}]")
        } else {
            format!("package \"{}\"", self.name)
        };
        if self.schema.is_empty() {
            return Err(SqlcError::invalid_config(format!("{label}: no schema files")));
        }
        if self.queries.is_empty() {
            return Err(SqlcError::invalid_config(format!("{label}: no query files")));
        }
        Ok(())
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub sql: Vec<SqlPackage>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_owned(),
            sql: Vec::new(),
        }
    }
}

impl Config {
    /// Parse and check a configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SqlcError::invalid_config(e.to_string()))?;
        config.check()?;
        debug!(
            target: "sqlc.config",
            version = %config.version,
            packages = config.sql.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Read, parse and check a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(target: "sqlc.config", path = %path.display(), "reading configuration");
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize back to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SqlcError::internal(e.to_string()))
    }

    fn check(&self) -> Result<()> {
        if self.version != CONFIG_VERSION {
            return Err(SqlcError::invalid_config(format!(
                "unsupported version \"{}\", expected \"{CONFIG_VERSION}\"",
                self.version
            )));
        }
        for (index, package) in self.sql.iter().enumerate() {
            package.check(index)?;
        }
        Ok(())
    }

    /// Find a package by name.
    #[must_use]
    pub fn package(&self, name: &str) -> Option<&SqlPackage> {
        self.sql.iter().find(|p| p.name == name)
    }
}

/// The settings in force while compiling one package's queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedSettings {
    pub global: Config,
    pub package: SqlPackage,
}

impl CombinedSettings {
    #[must_use]
    pub fn new(global: &Config, package: &SqlPackage) -> Self {
        Self {
            global: global.clone(),
            package: package.clone(),
        }
    }

    /// Settings for a standalone package outside any configuration file.
    #[must_use]
    pub fn for_package(package: SqlPackage) -> Self {
        Self {
            global: Config::default(),
            package,
        }
    }

    /// Whether unknown ordinary function calls are fatal.
    #[must_use]
    pub fn strict_function_checks(&self) -> bool {
        self.package.strict_function_checks
    }
}

impl Default for CombinedSettings {
    fn default() -> Self {
        Self::for_package(SqlPackage::new("", Engine::PostgreSQL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "version": "2",
        "sql": [
            {
                "name": "app",
                "engine": "postgresql",
                "schema": "schema.sql",
                "queries": ["q/users.sql", "q/posts.sql"],
                "strict_function_checks": true
            },
            {
                "engine": "sqlite",
                "schema": ["a.sql"],
                "queries": "q.sql"
            }
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let config = Config::from_json(SAMPLE).unwrap();
        assert_eq!(config.sql.len(), 2);

        let app = config.package("app").unwrap();
        assert_eq!(app.engine, Engine::PostgreSQL);
        assert_eq!(app.schema.iter().collect::<Vec<_>>(), ["schema.sql"]);
        assert_eq!(app.queries.iter().count(), 2);
        assert!(app.strict_function_checks);

        let lite = &config.sql[1];
        assert_eq!(lite.engine, Engine::SQLite);
        assert!(!lite.strict_function_checks);
        assert_eq!(lite.queries.iter().collect::<Vec<_>>(), ["q.sql"]);
    }

    #[test]
    fn test_combined_settings_carries_package_flags() {
        let config = Config::from_json(SAMPLE).unwrap();
        let strict = CombinedSettings::new(&config, &config.sql[0]);
        assert!(strict.strict_function_checks());
        assert_eq!(strict.global.sql.len(), 2);

        let lenient = CombinedSettings::new(&config, &config.sql[1]);
        assert!(!lenient.strict_function_checks());
        assert!(!CombinedSettings::default().strict_function_checks());
    }

    #[test]
    fn test_unmodelled_package_keys_are_ignored() {
        let config = Config::from_json(
            r#"{"version": "2", "sql": [{"name": "app", "engine": "postgresql",
                "schema": "s.sql", "queries": "q.sql", "strict_order_by": true}]}"#,
        )
        .unwrap();
        let app = config.package("app").unwrap();
        assert!(!app.strict_function_checks);
        let json: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
        assert!(json["sql"][0].get("strict_order_by").is_none());
    }

    #[test]
    fn test_rejects_wrong_version() {
        let err = Config::from_json(r#"{"version": "1", "sql": []}"#).unwrap_err();
        assert!(matches!(err, SqlcError::InvalidConfig { .. }));
        assert!(err.to_string().contains("unsupported version \"1\""));
    }

    #[test]
    fn test_rejects_unknown_engine() {
        let json = r#"{"version": "2", "sql": [
            {"engine": "oracle", "schema": "s.sql", "queries": "q.sql"}
        ]}"#;
        assert!(matches!(
            Config::from_json(json).unwrap_err(),
            SqlcError::InvalidConfig { .. }
        ));
    }

    #[test]
    fn test_rejects_package_without_queries() {
        let json = r#"{"version": "2", "sql": [
            {"name": "app", "engine": "mysql", "schema": "s.sql", "queries": []}
        ]}"#;
        let err = Config::from_json(json).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: package \"app\": no query files"
        );
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sqlc.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        drop(file);

        let config = Config::from_path(&path).unwrap();
        let app = config.package("app").unwrap();
        assert_eq!(
            app.queries.resolve(dir.path()),
            vec![dir.path().join("q/users.sql"), dir.path().join("q/posts.sql")]
        );
    }

    #[test]
    fn test_from_path_missing_file_is_io() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_path(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, SqlcError::Io(_)));
    }

    #[test]
    fn test_json_round_trip_keeps_paths_as_lists() {
        let config = Config::from_json(SAMPLE).unwrap();
        let json = config.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["sql"][1]["queries"], serde_json::json!(["q.sql"]));
        assert_eq!(Config::from_json(&json).unwrap(), config);
    }
}
