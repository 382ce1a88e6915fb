//! Package identity of directories and the registry of known modules.
//!
//! A Rust "package" here is a module path such as `my_app::routes`. The
//! resolver maps an output directory to the module path its generated files
//! will live in, and the registry records every module a router may be
//! declared in, together with the local name used to refer to it.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::PackageError;

pub type PackageResult<T> = std::result::Result<T, PackageError>;

/// How files in a directory are compiled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// Part of the crate's library module tree (under `src/`).
    Library,
    /// A directory whose files are compiled as their own crates (`tests/`, `benches/`, ...).
    Standalone { dir: String },
}

/// Logical package identity of a directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageId {
    pub crate_name: String,
    /// Module segments below the crate root; empty for the root itself.
    pub modules: Vec<String>,
    pub target: TargetKind,
}

impl PackageId {
    pub fn library(crate_name: impl Into<String>, modules: &[&str]) -> Self {
        Self {
            crate_name: crate_name.into(),
            modules: modules.iter().map(|m| m.to_string()).collect(),
            target: TargetKind::Library,
        }
    }

    pub fn standalone(crate_name: impl Into<String>, dir: impl Into<String>) -> Self {
        Self {
            crate_name: crate_name.into(),
            modules: Vec::new(),
            target: TargetKind::Standalone { dir: dir.into() },
        }
    }

    /// Module path, e.g. `my_app::routes`.
    pub fn path(&self) -> String {
        std::iter::once(self.crate_name.as_str())
            .chain(self.modules.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("::")
    }

    /// Whether code in this package can call items of `package` unqualified.
    pub fn is(&self, package: &str) -> bool {
        self.target == TargetKind::Library && self.path() == package
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            TargetKind::Library => write!(f, "{}", self.path()),
            TargetKind::Standalone { dir } => write!(f, "{} ({dir}/)", self.crate_name),
        }
    }
}

/// The package owning a directory and the crate it belongs to.
#[derive(Debug, Clone)]
pub struct Owner {
    pub package: PackageId,
    /// Directory holding the owning `Cargo.toml`.
    pub crate_root: PathBuf,
}

#[derive(Deserialize)]
struct Manifest {
    package: Option<ManifestPackage>,
    lib: Option<ManifestLib>,
}

#[derive(Deserialize)]
struct ManifestPackage {
    name: String,
}

#[derive(Deserialize)]
struct ManifestLib {
    name: Option<String>,
}

/// Crate name declared by a manifest, `None` for virtual workspaces.
fn crate_name(manifest_path: &Path) -> PackageResult<Option<String>> {
    let content = std::fs::read_to_string(manifest_path).map_err(|e| PackageError::ManifestRead {
        path: manifest_path.display().to_string(),
        source: e,
    })?;
    let manifest: Manifest = toml::from_str(&content).map_err(|e| PackageError::ManifestParse {
        path: manifest_path.display().to_string(),
        message: e.to_string(),
    })?;
    let Some(package) = manifest.package else {
        return Ok(None);
    };
    let name = manifest.lib.and_then(|l| l.name).unwrap_or(package.name);
    Ok(Some(name.replace('-', "_")))
}

fn canonicalize(path: &Path) -> PackageResult<PathBuf> {
    path.canonicalize().map_err(|e| PackageError::Canonicalize {
        path: path.display().to_string(),
        source: e,
    })
}

/// Package identity of `dir`, searching for the owning crate no higher than `root`.
pub fn resolve_package(root: &Path, dir: &Path) -> PackageResult<Owner> {
    let root = canonicalize(root)?;
    let dir = canonicalize(dir)?;
    let not_owned = || PackageError::PathNotOwned {
        root: root.display().to_string(),
        path: dir.display().to_string(),
    };
    if !dir.starts_with(&root) {
        return Err(not_owned());
    }

    for candidate in dir.ancestors() {
        if !candidate.starts_with(&root) {
            break;
        }
        let manifest = candidate.join("Cargo.toml");
        if !manifest.is_file() {
            continue;
        }
        let Some(name) = crate_name(&manifest)? else {
            continue;
        };
        let relative = dir.strip_prefix(candidate).unwrap_or(Path::new(""));
        let mut components = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned());
        let package = match components.next() {
            Some(first) if first == "src" => PackageId {
                crate_name: name,
                modules: components.collect(),
                target: TargetKind::Library,
            },
            Some(first) => PackageId::standalone(name, first),
            None => PackageId::library(name, &[]),
        };
        tracing::debug!(%package, crate_root = %candidate.display(), "resolved output package");
        return Ok(Owner {
            package,
            crate_root: candidate.to_path_buf(),
        });
    }
    Err(not_owned())
}

/// A package generated code may refer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPackage {
    /// Full module path, e.g. `my_app::routes`.
    pub path: String,
    /// Local name bound by the import, e.g. `routes`.
    pub name: String,
}

/// How generated code reaches a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageRef {
    /// The output lives in the package itself.
    Local,
    /// Items are reached as `alias::item`, after `use <import>;` when set.
    Qualified { alias: String, import: Option<String> },
}

#[derive(Debug, Clone, Default)]
pub struct PackageRegistry {
    packages: Vec<LoadedPackage>,
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every module of the crate at `crate_root` by walking `src/`.
    pub fn discover(crate_root: &Path) -> PackageResult<Self> {
        let manifest = crate_root.join("Cargo.toml");
        let mut registry = Self::new();
        let Some(name) = crate_name(&manifest)? else {
            return Ok(registry);
        };
        registry.insert(&name, None);

        let src = crate_root.join("src");
        for entry in WalkDir::new(&src).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if entry.file_type().is_dir() || path.extension().is_none_or(|ext| ext != "rs") {
                continue;
            }
            let Ok(relative) = path.strip_prefix(&src) else {
                continue;
            };
            let mut segments: Vec<String> = relative
                .with_extension("")
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            // `lib.rs`, `main.rs` and `mod.rs` name their directory, not a module.
            if matches!(segments.last().map(String::as_str), Some("lib" | "main" | "mod")) {
                segments.pop();
            }
            if segments.first().map(String::as_str) == Some("bin") || segments.is_empty() {
                continue;
            }
            let module = std::iter::once(name.clone()).chain(segments).collect::<Vec<_>>().join("::");
            registry.insert(&module, None);
        }

        tracing::debug!(crate_name = %name, packages = registry.packages.len(), "discovered packages");
        Ok(registry)
    }

    /// Register a package; `alias` defaults to its last path segment.
    /// Re-registering a path replaces its alias.
    pub fn insert(&mut self, path: &str, alias: Option<&str>) {
        let name = alias
            .map(str::to_string)
            .unwrap_or_else(|| path.rsplit("::").next().unwrap_or(path).to_string());
        match self.packages.iter_mut().find(|p| p.path == path) {
            Some(existing) => existing.name = name,
            None => self.packages.push(LoadedPackage {
                path: path.to_string(),
                name,
            }),
        }
    }

    pub fn get(&self, path: &str) -> Option<&LoadedPackage> {
        self.packages.iter().find(|p| p.path == path)
    }

    pub fn packages(&self) -> &[LoadedPackage] {
        &self.packages
    }

    /// How code in `output` reaches `package`; `None` when it is not loaded.
    ///
    /// Two packages sharing a local name are not disambiguated.
    pub fn reference(&self, package: &str, output: &PackageId) -> Option<PackageRef> {
        if output.is(package) {
            return Some(PackageRef::Local);
        }
        let loaded = self.get(package)?;
        let (krate, rest) = match package.split_once("::") {
            Some((krate, rest)) => (krate, Some(rest)),
            None => (package, None),
        };

        let same_library = output.target == TargetKind::Library && output.crate_name == krate;
        let import = if same_library {
            match rest {
                Some(rest) => Some(format!("crate::{rest}")),
                None => {
                    return Some(PackageRef::Qualified {
                        alias: "crate".to_string(),
                        import: None,
                    });
                }
            }
        } else if rest.is_none() && loaded.name == krate {
            // Crate roots are already in scope through the extern prelude.
            None
        } else {
            Some(package.to_string())
        };

        let default_name = package.rsplit("::").next().unwrap_or(package);
        let import = import.map(|path| {
            if loaded.name == default_name {
                path
            } else {
                format!("{path} as {}", loaded.name)
            }
        });
        Some(PackageRef::Qualified {
            alias: loaded.name.clone(),
            import,
        })
    }
}
