//! Environment values from a dotenv file.
//!
//! The file is read once into an immutable repository. Variables already set
//! in the process environment take precedence over the file.

use std::{collections::HashMap, path::Path};

use tracing::debug;

use crate::{
    error::{CoreError, Result},
    resolvable::Resolvable,
};

/// A coerced environment value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    Bool(bool),
    String(String),
    /// The variable was set to `null` or `(null)`.
    Null,
}

impl EnvValue {
    /// Coerce a raw variable value.
    ///
    /// `true`, `false`, `empty` and `null` (optionally in parentheses, any
    /// case) become their typed forms; matching surrounding quotes are
    /// stripped from everything else.
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "true" | "(true)" => Self::Bool(true),
            "false" | "(false)" => Self::Bool(false),
            "empty" | "(empty)" => Self::String(String::new()),
            "null" | "(null)" => Self::Null,
            _ => Self::String(unquote(raw).to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

fn unquote(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

/// Immutable repository of environment variables.
#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    /// Read `dir/filename`.
    pub fn load(dir: &Path, filename: &str) -> Result<Self> {
        let path = dir.join(filename);
        let iter =
            dotenvy::from_path_iter(&path).map_err(|e| CoreError::env(&path, e.to_string()))?;

        let mut vars = HashMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| CoreError::env(&path, e.to_string()))?;
            vars.insert(key, value);
        }

        debug!(path = %path.display(), count = vars.len(), "loaded environment file");
        Ok(Self { vars })
    }

    /// Build a repository from explicit pairs.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    fn raw(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .or_else(|| self.vars.get(key).cloned())
    }

    /// Coerced value, or `None` when the variable is not set anywhere.
    pub fn get(&self, key: &str) -> Option<EnvValue> {
        self.raw(key).map(|raw| EnvValue::parse(&raw))
    }

    /// Coerced value, or the resolved default when unset.
    pub fn get_or(&self, key: &str, default: impl Into<Resolvable<EnvValue>>) -> EnvValue {
        self.get(key).unwrap_or_else(|| default.into().resolve())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_coercion() {
        assert_eq!(EnvValue::parse("true"), EnvValue::Bool(true));
        assert_eq!(EnvValue::parse("(TRUE)"), EnvValue::Bool(true));
        assert_eq!(EnvValue::parse("False"), EnvValue::Bool(false));
        assert_eq!(EnvValue::parse("(empty)"), EnvValue::String(String::new()));
        assert_eq!(EnvValue::parse("null"), EnvValue::Null);
        assert_eq!(EnvValue::parse("\"quoted\""), EnvValue::String("quoted".to_string()));
        assert_eq!(EnvValue::parse("'single'"), EnvValue::String("single".to_string()));
        assert_eq!(EnvValue::parse("\"mismatch'"), EnvValue::String("\"mismatch'".to_string()));
        assert_eq!(EnvValue::parse("plain"), EnvValue::String("plain".to_string()));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut file = std::fs::File::create(dir.path().join(".env")).expect("create file");
        writeln!(file, "PAGEMETA_TEST_ENV_DEBUG=true").unwrap();
        writeln!(file, "PAGEMETA_TEST_ENV_NAME=\"Example Site\"").unwrap();
        writeln!(file, "PAGEMETA_TEST_ENV_NOTHING=null").unwrap();
        drop(file);

        let env = Env::load(dir.path(), ".env").expect("load env");

        assert_eq!(env.get("PAGEMETA_TEST_ENV_DEBUG"), Some(EnvValue::Bool(true)));
        assert_eq!(
            env.get("PAGEMETA_TEST_ENV_NAME").unwrap().as_str(),
            Some("Example Site")
        );
        assert_eq!(env.get("PAGEMETA_TEST_ENV_NOTHING"), Some(EnvValue::Null));
        assert_eq!(env.get("PAGEMETA_TEST_ENV_MISSING"), None);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        assert!(Env::load(dir.path(), ".env.missing").is_err());
    }

    #[test]
    fn test_get_or_defaults() {
        let env = Env::from_vars([("PAGEMETA_TEST_ENV_SET", "value")]);

        assert_eq!(
            env.get_or("PAGEMETA_TEST_ENV_SET", EnvValue::Null),
            EnvValue::String("value".to_string())
        );
        assert_eq!(
            env.get_or("PAGEMETA_TEST_ENV_UNSET", EnvValue::Bool(false)),
            EnvValue::Bool(false)
        );
        assert_eq!(
            env.get_or(
                "PAGEMETA_TEST_ENV_UNSET",
                Resolvable::producer(|| EnvValue::String("computed".to_string()))
            ),
            EnvValue::String("computed".to_string())
        );
    }
}
