//! Extraction options
//!
//! [`ExtractConfig`] is the raw, deserializable shape (TOML or built in code);
//! [`ExtractOptions`] is the validated form the passes run with. All
//! configuration errors surface while building the options, never during a
//! build pass.

use std::{fs, path::Path, str::FromStr};

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Deserialize;

use crate::hashing::HashFunction;

/// How the scanner's visited set is scoped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisitScope {
    /// One visited set for the whole scan pass. A module reached while
    /// scanning one chunk is not evaluated again for a later chunk.
    #[default]
    Global,
    /// A fresh visited set for every chunk
    PerChunk,
}

fn default_hash_function() -> String {
    "sha256".to_owned()
}

/// Raw extraction configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ExtractConfig {
    /// Regular expression a resource must match to be extracted
    pub test: String,
    /// Output path template, e.g. `[name].above.css`
    pub filename: String,
    /// Resource substrings marking the roots of the reachability search
    pub modules: Vec<String>,
    /// Digest used for `[contenthash]` when the token names none
    #[serde(default = "default_hash_function")]
    pub hash_function: String,
    #[serde(default)]
    pub visit_scope: VisitScope,
}

impl ExtractConfig {
    pub fn new(test: &str, filename: &str, modules: &[&str]) -> Self {
        Self {
            test: test.to_owned(),
            filename: filename.to_owned(),
            modules: modules.iter().map(|m| (*m).to_owned()).collect(),
            hash_function: default_hash_function(),
            visit_scope: VisitScope::default(),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid extraction configuration")
    }

    /// Load the configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("In {}", path.display()))
    }
}

/// Validated options shared by the extraction passes
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    test: Regex,
    roots: Vec<String>,
    pub filename: String,
    pub hash_function: HashFunction,
    pub visit_scope: VisitScope,
}

impl ExtractOptions {
    pub fn from_config(config: ExtractConfig) -> Result<Self> {
        let test = Regex::new(&config.test)
            .with_context(|| format!("Invalid `test` pattern {:?}", config.test))?;
        if config.filename.trim().is_empty() {
            bail!("`filename` must not be empty");
        }
        if config.modules.is_empty() {
            bail!("`modules` must name at least one extraction root");
        }
        if let Some(empty) = config.modules.iter().position(String::is_empty) {
            bail!("`modules[{empty}]` is empty and would match every resource");
        }
        let hash_function = HashFunction::from_str(&config.hash_function)?;

        Ok(Self {
            test,
            roots: config.modules,
            filename: config.filename,
            hash_function,
            visit_scope: config.visit_scope,
        })
    }

    /// Whether the resource is a starting point of the reachability search
    pub fn is_root(&self, resource: &str) -> bool {
        self.roots.iter().any(|root| resource.contains(root.as_str()))
    }

    /// Whether a reached resource should be moved to the derived chunk
    pub fn should_extract(&self, resource: &str) -> bool {
        self.test.is_match(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        let options = ExtractOptions::from_config(ExtractConfig::new(
            r"\.css$",
            "[name].above.css",
            &["styles_b.css", "styles_c.css"],
        ))
        .expect("valid config");

        assert!(options.is_root("/app/src/styles_b.css"));
        assert!(options.is_root("/app/src/styles_c.css"));
        assert!(!options.is_root("/app/src/styles_a.css"));
        assert!(options.should_extract("/app/src/styles_a.css"));
        assert!(!options.should_extract("/app/src/entry.js"));
        assert_eq!(options.visit_scope, VisitScope::Global);
        assert_eq!(options.hash_function, HashFunction::Sha256);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = ExtractOptions::from_config(ExtractConfig::new("(", "a.css", &["a"]))
            .expect_err("unbalanced group");
        assert!(err.to_string().contains("Invalid `test` pattern"));
    }

    #[test]
    fn test_missing_roots_and_filename_are_rejected() {
        assert!(ExtractOptions::from_config(ExtractConfig::new("x", "a.css", &[])).is_err());
        assert!(ExtractOptions::from_config(ExtractConfig::new("x", " ", &["a"])).is_err());
        assert!(ExtractOptions::from_config(ExtractConfig::new("x", "a.css", &[""])).is_err());
    }

    #[test]
    fn test_toml_config() {
        let config = ExtractConfig::from_toml_str(
            r#"
            test = '\.css$'
            filename = "[name].[contenthash:8].css"
            modules = ["above.css"]
            hash-function = "sha512"
            visit-scope = "per-chunk"
            "#,
        )
        .expect("parses");

        assert_eq!(config.modules, vec!["above.css"]);
        let options = ExtractOptions::from_config(config).expect("valid");
        assert_eq!(options.visit_scope, VisitScope::PerChunk);
        assert_eq!(options.hash_function, HashFunction::Sha512);
    }

    #[test]
    fn test_toml_missing_required_key() {
        let err = ExtractConfig::from_toml_str("test = 'css'\nmodules = ['a']")
            .expect_err("filename is required");
        assert!(format!("{err:#}").contains("filename"));
    }

    #[test]
    fn test_unknown_hash_function() {
        let mut config = ExtractConfig::new("x", "a.css", &["a"]);
        config.hash_function = "md4".to_owned();
        assert!(ExtractOptions::from_config(config).is_err());
    }
}
