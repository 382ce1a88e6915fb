//! Generator configuration.
//!
//! Settings come from an optional `atgen.toml` and from command-line flags;
//! flags win. Relative paths in a config file are taken relative to the
//! file's directory.
//!
//! ```toml
//! spec = "specs/login.yaml"
//! template = "tests/template.rs"
//! output_dir = "tests"
//!
//! [[packages]]
//! path = "my_app::api::v1"
//! alias = "api_v1"
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// An extra package a router may live in, with the local name to use for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageAlias {
    pub path: String,
    #[serde(default)]
    pub alias: Option<String>,
}

impl FromStr for PackageAlias {
    type Err = ConfigError;

    /// `my_app::api::v1=api_v1`, or just the path.
    fn from_str(s: &str) -> ConfigResult<Self> {
        let (path, alias) = match s.split_once('=') {
            Some((path, alias)) => (path.trim(), Some(alias.trim())),
            None => (s.trim(), None),
        };
        if syn::parse_str::<syn::Path>(path).is_err() {
            return Err(ConfigError::Invalid {
                message: format!("`{path}` is not a module path"),
            });
        }
        if let Some(alias) = alias {
            if syn::parse_str::<syn::Ident>(alias).is_err() {
                return Err(ConfigError::Invalid {
                    message: format!("`{alias}` is not a valid alias"),
                });
            }
        }
        Ok(Self {
            path: path.to_string(),
            alias: alias.map(str::to_string),
        })
    }
}

/// Settings as read from a file or flags; every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub spec: Option<PathBuf>,
    pub template: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    /// Upper bound of the manifest search; defaults to the current directory.
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub packages: Vec<PackageAlias>,
}

impl GeneratorConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    fn rebase(&mut self, base: &Path) {
        for field in [&mut self.spec, &mut self.template, &mut self.output_dir, &mut self.root] {
            if let Some(p) = field {
                if p.is_relative() {
                    *p = base.join(&*p);
                }
            }
        }
    }

    /// Layer `overrides` on top of `self`. Extra packages accumulate.
    pub fn merge(mut self, overrides: GeneratorConfig) -> Self {
        self.spec = overrides.spec.or(self.spec);
        self.template = overrides.template.or(self.template);
        self.output_dir = overrides.output_dir.or(self.output_dir);
        self.root = overrides.root.or(self.root);
        self.packages.extend(overrides.packages);
        self
    }

    /// Check that every required setting is present.
    pub fn resolve(self) -> ConfigResult<ResolvedConfig> {
        let required = |value: Option<PathBuf>, name: &str| {
            value.ok_or_else(|| ConfigError::Invalid {
                message: format!("`{name}` is not set"),
            })
        };
        let root = match self.root {
            Some(root) => root,
            None => std::env::current_dir().map_err(|e| ConfigError::Invalid {
                message: format!("cannot determine current directory: {e}"),
            })?,
        };
        Ok(ResolvedConfig {
            spec: required(self.spec, "spec")?,
            template: required(self.template, "template")?,
            output_dir: required(self.output_dir, "output_dir")?,
            root,
            packages: self.packages,
        })
    }
}

/// Complete settings for one generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub spec: PathBuf,
    pub template: PathBuf,
    pub output_dir: PathBuf,
    pub root: PathBuf,
    pub packages: Vec<PackageAlias>,
}
