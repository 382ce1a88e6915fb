//! Import reconciliation for generated files.
//!
//! Generated code needs the router's package (when it is not the output
//! package itself) and the helper crates of form and raw bodies. Requirements
//! are collected as `use` paths and merged into the file's existing imports.

use std::collections::BTreeSet;

use quote::ToTokens;
use syn::{File, Item, ItemUse, UseTree};

use crate::error::AssemblyError;
use crate::package::{PackageId, PackageRef, PackageRegistry};
use crate::rewrite::body;
use crate::spec::TestFunction;

/// A set of `use` paths such as `my_app::routes` or `my_app::v1 as api_v1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet {
    paths: BTreeSet<String>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything one planned test function needs.
    pub fn for_function(
        func: &TestFunction,
        output: &PackageId,
        registry: &PackageRegistry,
    ) -> Result<Self, AssemblyError> {
        let mut set = Self::new();
        match registry.reference(&func.router.package, output) {
            Some(PackageRef::Qualified {
                import: Some(path), ..
            }) => set.insert(path),
            Some(_) => {}
            None => {
                return Err(AssemblyError::UnresolvedPackage {
                    function: func.name.clone(),
                    package: func.router.package.clone(),
                });
            }
        }
        for test in func.all_tests() {
            for helper in body::helper_imports(test.req.content_type) {
                set.insert(*helper);
            }
        }
        Ok(set)
    }

    pub fn insert(&mut self, path: impl Into<String>) {
        self.paths.insert(path.into());
    }

    pub fn extend(&mut self, other: ImportSet) {
        self.paths.extend(other.paths);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Add every missing import after the file's last `use` item.
    pub fn apply(&self, file: &mut File) {
        let mut existing = BTreeSet::new();
        for item in &file.items {
            if let Item::Use(u) = item {
                flatten(String::new(), &u.tree, &mut existing);
            }
        }

        let additions: Vec<Item> = self
            .paths
            .iter()
            .filter_map(|path| {
                let item: ItemUse = syn::parse_str(&format!("use {path};")).ok()?;
                let mut leaves = BTreeSet::new();
                flatten(String::new(), &item.tree, &mut leaves);
                if leaves.is_subset(&existing) {
                    return None;
                }
                Some(Item::Use(item))
            })
            .collect();
        if additions.is_empty() {
            return;
        }

        let at = file
            .items
            .iter()
            .rposition(|i| matches!(i, Item::Use(_)))
            .map_or(0, |i| i + 1);
        tracing::debug!(count = additions.len(), "adding imports");
        file.items.splice(at..at, additions);
    }
}

/// Expand a use tree into one normalized string per imported name.
///
/// A `self` leaf names its parent module, so `a::b::{self}` flattens to
/// `a::b` just like `use a::b;`.
fn flatten(prefix: String, tree: &UseTree, out: &mut BTreeSet<String>) {
    let join = |segment: &str| {
        if segment == "self" && !prefix.is_empty() {
            prefix.clone()
        } else if prefix.is_empty() {
            segment.to_string()
        } else {
            format!("{prefix}::{segment}")
        }
    };
    match tree {
        UseTree::Path(p) => flatten(join(&p.ident.to_string()), &p.tree, out),
        UseTree::Name(n) => {
            out.insert(join(&n.ident.to_string()));
        }
        UseTree::Rename(r) => {
            out.insert(format!("{} as {}", join(&r.ident.to_string()), r.rename));
        }
        UseTree::Glob(g) => {
            out.insert(join(&g.star_token.to_token_stream().to_string()));
        }
        UseTree::Group(g) => {
            for item in &g.items {
                flatten(prefix.clone(), item, out);
            }
        }
    }
}
