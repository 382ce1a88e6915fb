//! Rich diagnostic error types for the atgen generator.
//!
//! Each stage of a generation run defines its own error type with miette
//! `#[diagnostic]` derives, providing error codes, help text, and source chains
//! so users know exactly what went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

use crate::template::RegionKind;

/// Top-level error type for a generation run.
///
/// Each variant wraps a stage-specific error, preserving the full diagnostic
/// chain through to the user. Every variant aborts the whole run.
#[derive(Debug, Error, Diagnostic)]
pub enum AtgenError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Emit(#[from] EmitError),
}

pub type AtgenResult<T> = std::result::Result<T, AtgenError>;

// ---------------------------------------------------------------------------
// Template / configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("template has no {region} marker")]
    #[diagnostic(
        code(atgen::config::missing_region),
        help(
            "Mark the skeleton with `#[atgen({tag})]` or a doc comment containing \
             \"{legacy}\". The template must contain exactly one test function skeleton."
        )
    )]
    MissingRegion {
        region: RegionKind,
        tag: &'static str,
        legacy: &'static str,
    },

    #[error("template marks more than one {region}")]
    #[diagnostic(
        code(atgen::config::duplicate_region),
        help("Keep exactly one marked test function skeleton in the template.")
    )]
    DuplicateRegion { region: RegionKind },

    #[error("{region} is required by test function \"{function}\" but the template does not define it")]
    #[diagnostic(
        code(atgen::config::region_required),
        help(
            "The spec uses a construct that needs this skeleton. Add a statement marked \
             `#[atgen({tag})]` inside the test function skeleton."
        )
    )]
    RegionRequired {
        region: RegionKind,
        tag: &'static str,
        function: String,
    },

    #[error("{region} does not contain the `{token}` sentinel")]
    #[diagnostic(
        code(atgen::config::missing_slot),
        help(
            "Every required sentinel of a present region must appear in it. \
             See the sentinel table (contract v{contract}) in the template docs."
        )
    )]
    MissingSlot {
        region: RegionKind,
        token: &'static str,
        contract: u32,
    },

    #[error("{region} has no empty `{{}}` block to receive tests")]
    #[diagnostic(
        code(atgen::config::missing_placeholder),
        help("Put an empty block statement `{{}}` where the generated tests should go.")
    )]
    MissingPlaceholder { region: RegionKind },

    #[error("failed to read template: {path}")]
    #[diagnostic(
        code(atgen::config::template_read),
        help("Check that the template path exists and is readable.")
    )]
    TemplateRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("template is not valid Rust: {message}")]
    #[diagnostic(
        code(atgen::config::template_parse),
        help("The template must be a syntactically valid Rust source file.")
    )]
    TemplateParse { message: String },

    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(atgen::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(atgen::config::parse),
        help("Check the TOML syntax in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(atgen::config::invalid),
        help("Pass the missing value on the command line or set it in atgen.toml.")
    )]
    Invalid { message: String },
}

// ---------------------------------------------------------------------------
// Assembly errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum AssemblyError {
    #[error("router package `{package}` of test function \"{function}\" is not a loaded package")]
    #[diagnostic(
        code(atgen::assembly::unresolved_package),
        help(
            "The router's declaring package must be a module of the crate that owns the \
             output directory, or be registered with `--package path=alias`."
        )
    )]
    UnresolvedPackage { function: String, package: String },

    #[error("interpolation `{literal}` names an invalid type: {message}")]
    #[diagnostic(
        code(atgen::assembly::bad_interpolation),
        help("Use `${{name:Type}}` where Type is a Rust type, e.g. `${{user_id:i64}}`.")
    )]
    BadInterpolation { literal: String, message: String },

    #[error("invalid test function name \"{name}\"")]
    #[diagnostic(
        code(atgen::assembly::bad_name),
        help("Test function names must be valid Rust identifiers.")
    )]
    BadName { name: String },
}

// ---------------------------------------------------------------------------
// Spec loading errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SpecError {
    #[error("failed to read spec: {path}")]
    #[diagnostic(
        code(atgen::spec::read),
        help("Check that the YAML spec exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse spec {path}: {message}")]
    #[diagnostic(
        code(atgen::spec::parse),
        help(
            "The spec must be a YAML sequence of test functions, each with `name`, \
             `router` and `tests`."
        )
    )]
    Parse { path: String, message: String },

    #[error("invalid router reference \"{reference}\" in test function \"{function}\"")]
    #[diagnostic(
        code(atgen::spec::router),
        help("Write the router as a full path to a function, e.g. `my_app::routes::router`.")
    )]
    InvalidRouter { function: String, reference: String },
}

// ---------------------------------------------------------------------------
// Package resolution errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum PackageError {
    #[error("no crate under {root} owns {path}")]
    #[diagnostic(
        code(atgen::package::path_not_owned),
        help(
            "The output directory must live inside a Cargo package (a directory with a \
             Cargo.toml carrying a [package] table) below the root."
        )
    )]
    PathNotOwned { root: String, path: String },

    #[error("failed to read manifest: {path}")]
    #[diagnostic(
        code(atgen::package::manifest_read),
        help("Ensure Cargo.toml is readable.")
    )]
    ManifestRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest {path}: {message}")]
    #[diagnostic(
        code(atgen::package::manifest_parse),
        help("Check the TOML syntax of Cargo.toml.")
    )]
    ManifestParse { path: String, message: String },

    #[error("cannot canonicalize {path}")]
    #[diagnostic(
        code(atgen::package::canonicalize),
        help("The directory must exist before generation.")
    )]
    Canonicalize {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Emit errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EmitError {
    #[error("failed to create output directory: {path}")]
    #[diagnostic(
        code(atgen::emit::create_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    #[diagnostic(
        code(atgen::emit::write),
        help("Ensure the output directory is writable and the disk is not full.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
