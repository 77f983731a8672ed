//! Environment loader: `.env.<mode>` file merged with process variables,
//! validated against a fixed schema before anything else starts.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

/// Variable selecting which env file is read.
pub const RUNTIME_MODE_VAR: &str = "APP_ENV";

pub const DATABASE_HOST: &str = "DATABASE_HOST";
pub const DATABASE_PORT: &str = "DATABASE_PORT";
pub const DATABASE_USERNAME: &str = "DATABASE_USERNAME";
pub const DATABASE_PASSWORD: &str = "DATABASE_PASSWORD";
pub const DATABASE_DATABASE: &str = "DATABASE_DATABASE";
pub const API_KEY: &str = "API_KEY";

const DEFAULT_DATABASE_PORT: &str = "5432";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    Development,
    Production,
}

impl RuntimeMode {
    /// Only the literal `development` selects development; everything else,
    /// including an unset indicator, is production.
    pub fn from_indicator(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("development") => Self::Development,
            _ => Self::Production,
        }
    }

    pub fn env_file_name(self) -> &'static str {
        match self {
            Self::Development => ".env.dev",
            Self::Production => ".env.prod",
        }
    }

    pub fn env_file(self, dir: &Path) -> PathBuf {
        dir.join(self.env_file_name())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Port,
}

#[derive(Debug, Clone, Copy)]
pub struct EnvRule {
    pub key: &'static str,
    pub kind: ValueKind,
    pub required: bool,
    pub default: Option<&'static str>,
}

impl EnvRule {
    pub const fn required(key: &'static str, kind: ValueKind) -> Self {
        Self {
            key,
            kind,
            required: true,
            default: None,
        }
    }

    pub const fn optional(key: &'static str, kind: ValueKind) -> Self {
        Self {
            key,
            kind,
            required: false,
            default: None,
        }
    }

    pub const fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }
}

#[derive(Debug, Clone)]
pub struct EnvSchema {
    rules: Vec<EnvRule>,
}

impl EnvSchema {
    pub fn new(rules: Vec<EnvRule>) -> Self {
        Self { rules }
    }

    /// Keys the service needs for its primary relational store, plus the
    /// optional key consulted by the authorization guard.
    pub fn service() -> Self {
        Self::new(vec![
            EnvRule::required(DATABASE_HOST, ValueKind::Text),
            EnvRule::required(DATABASE_PORT, ValueKind::Port).with_default(DEFAULT_DATABASE_PORT),
            EnvRule::required(DATABASE_USERNAME, ValueKind::Text),
            EnvRule::required(DATABASE_PASSWORD, ValueKind::Text),
            EnvRule::required(DATABASE_DATABASE, ValueKind::Text),
            EnvRule::optional(API_KEY, ValueKind::Text),
        ])
    }

    pub fn rules(&self) -> &[EnvRule] {
        &self.rules
    }

    /// Validate `vars` against every rule, collecting all failures.
    pub fn validate(&self, vars: &HashMap<String, String>) -> Result<ConfigurationSet, EnvError> {
        let mut values = BTreeMap::new();
        let mut issues = Vec::new();

        for rule in &self.rules {
            let raw = vars
                .get(rule.key)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .or(rule.default);

            let Some(raw) = raw else {
                if rule.required {
                    issues.push(EnvIssue::new(rule.key, "is required"));
                }
                continue;
            };

            match parse_value(rule.kind, raw) {
                Ok(value) => {
                    values.insert(rule.key, value);
                }
                Err(reason) => issues.push(EnvIssue::new(rule.key, reason)),
            }
        }

        if issues.is_empty() {
            Ok(ConfigurationSet { values })
        } else {
            Err(EnvError::Validation(ValidationFailure { issues }))
        }
    }
}

fn parse_value(kind: ValueKind, raw: &str) -> Result<EnvValue, String> {
    match kind {
        ValueKind::Text => Ok(EnvValue::Text(raw.to_string())),
        ValueKind::Port => match raw.parse::<u16>() {
            Ok(0) => Err("must be a port between 1 and 65535".to_string()),
            Ok(port) => Ok(EnvValue::Port(port)),
            Err(_) => Err(format!("must be a port number, got `{raw}`")),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    Text(String),
    Port(u16),
}

/// Validated environment values; immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationSet {
    values: BTreeMap<&'static str, EnvValue>,
}

impl ConfigurationSet {
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(EnvValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn port(&self, key: &str) -> Option<u16> {
        match self.values.get(key) {
            Some(EnvValue::Port(port)) => Some(*port),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvIssue {
    pub key: &'static str,
    pub reason: String,
}

impl EnvIssue {
    fn new(key: &'static str, reason: impl Into<String>) -> Self {
        Self {
            key,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub issues: Vec<EnvIssue>,
}

impl ValidationFailure {
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.issues.iter().map(|issue| issue.key)
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, issue) in self.issues.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} {}", issue.key, issue.reason)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("failed to read env file `{}`: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
    #[error("environment validation failed: {0}")]
    Validation(ValidationFailure),
}

impl EnvError {
    pub fn validation_failure(&self) -> Option<&ValidationFailure> {
        match self {
            Self::Validation(failure) => Some(failure),
            Self::File { .. } => None,
        }
    }
}

/// Result of loading the environment: the mode, the merged raw variables
/// (consumed again by the layered settings) and the validated set.
#[derive(Debug, Clone)]
pub struct LoadedEnvironment {
    pub mode: RuntimeMode,
    pub env_file: PathBuf,
    pub vars: HashMap<String, String>,
    pub values: ConfigurationSet,
}

/// Load `.env.<mode>` from `dir`, overlay `process_vars`, and validate.
///
/// The mode indicator is read from the process variables only; an env file
/// cannot switch which env file is read. A missing file is skipped.
pub fn load_environment<I>(
    dir: &Path,
    process_vars: I,
    schema: &EnvSchema,
) -> Result<LoadedEnvironment, EnvError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let process: HashMap<String, String> = process_vars.into_iter().collect();
    let mode = RuntimeMode::from_indicator(process.get(RUNTIME_MODE_VAR).map(String::as_str));
    let env_file = mode.env_file(dir);

    let mut vars = read_env_file(&env_file)?;
    vars.extend(process);

    let values = schema.validate(&vars)?;

    Ok(LoadedEnvironment {
        mode,
        env_file,
        vars,
        values,
    })
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, EnvError> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(err) if err.not_found() => {
            debug!(
                target = "cafe::config::env",
                path = %path.display(),
                "env file not found, using process environment only"
            );
            return Ok(HashMap::new());
        }
        Err(source) => {
            return Err(EnvError::File {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(|source| EnvError::File {
            path: path.to_path_buf(),
            source,
        })?;
        vars.insert(key, value);
    }
    Ok(vars)
}
