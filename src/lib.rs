// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # atgen
//!
//! Generates Rust HTTP API tests from declarative YAML specs by instantiating
//! a hand-written template file.
//!
//! ## Architecture
//!
//! - **Spec** (`spec`): YAML test functions, tests and subtest groups
//! - **Planning** (`plan`): one filtered copy of each function per API version
//! - **Template** (`template`): marked regions and the sentinel contract
//! - **Rewriting** (`rewrite`): deep-cloned regions with sentinels replaced
//! - **Assembly** (`imports`, `assemble`, `emit`): one formatted file per version
//! - **Packages** (`package`): which module the output lives in, and how to
//!   reach the router from there
//!
//! ## Library usage
//!
//! ```no_run
//! use atgen::config::GeneratorConfig;
//! use atgen::generator::Generator;
//!
//! let config = GeneratorConfig {
//!     spec: Some("specs/login.yaml".into()),
//!     template: Some("tests/template.rs".into()),
//!     output_dir: Some("tests".into()),
//!     ..Default::default()
//! };
//! let written = Generator::new(config.resolve().unwrap()).generate().unwrap();
//! ```

pub mod assemble;
pub mod config;
pub mod emit;
pub mod error;
pub mod generator;
pub mod imports;
pub mod package;
pub mod plan;
pub mod rewrite;
pub mod spec;
pub mod syntax;
pub mod template;
