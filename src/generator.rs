//! A complete generation run.
//!
//! Loads the spec and template, works out which package the output lands
//! in, then writes one file per API version. The first error aborts the run;
//! files already written for earlier versions stay in place.

use std::path::PathBuf;

use crate::assemble::assemble;
use crate::config::ResolvedConfig;
use crate::emit;
use crate::error::{AtgenResult, EmitError};
use crate::imports::ImportSet;
use crate::package::{self, PackageId, PackageRegistry};
use crate::plan;
use crate::rewrite::Instantiator;
use crate::spec::{self, TestFunction};
use crate::template::Template;

pub struct Generator {
    config: ResolvedConfig,
}

impl Generator {
    pub fn new(config: ResolvedConfig) -> Self {
        Self { config }
    }

    /// Run generation, returning the written paths in version order.
    pub fn generate(&self) -> AtgenResult<Vec<PathBuf>> {
        let config = &self.config;
        let _span = tracing::info_span!("generate", spec = %config.spec.display()).entered();

        let funcs = spec::load_spec(&config.spec)?;
        let template = Template::load(&config.template)?;

        std::fs::create_dir_all(&config.output_dir).map_err(|e| EmitError::CreateDir {
            path: config.output_dir.display().to_string(),
            source: e,
        })?;
        let owner = package::resolve_package(&config.root, &config.output_dir)?;
        let mut registry = PackageRegistry::discover(&owner.crate_root)?;
        for extra in &config.packages {
            registry.insert(&extra.path, extra.alias.as_deref());
        }

        let planned = plan::plan_all(&funcs);
        if planned.is_empty() {
            tracing::warn!("no test function targets any API version, nothing to generate");
        }

        let mut written = Vec::with_capacity(planned.len());
        for (version, functions) in &planned {
            let _span = tracing::info_span!("version", %version).entered();
            let content = render_version(&template, functions, &owner.package, &registry)?;
            let name = emit::output_file_name(version, &config.spec);
            written.push(emit::write_atomic(&config.output_dir, &name, &content)?);
        }
        Ok(written)
    }
}

/// Formatted source of the file for one version's planned functions.
pub fn render_version(
    template: &Template,
    functions: &[TestFunction],
    output: &PackageId,
    registry: &PackageRegistry,
) -> AtgenResult<String> {
    let instantiator = Instantiator::new(template, output, registry);
    let mut imports = ImportSet::new();
    let mut items = Vec::with_capacity(functions.len());
    for func in functions {
        imports.extend(ImportSet::for_function(func, output, registry)?);
        items.push(instantiator.instantiate(func)?);
    }
    let file = assemble(template, items, &imports);
    Ok(emit::format_file(&file))
}
