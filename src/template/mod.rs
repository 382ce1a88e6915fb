//! Template loading and region discovery.
//!
//! A template is an ordinary Rust file. Three regions inside it are marked
//! for cloning:
//!
//! - **FunctionSkeleton**: the `fn` item every generated test function starts from
//! - **TestSkeleton**: a statement cloned once per test
//! - **SubtestSkeleton**: a statement cloned once per subtest group
//!
//! Regions are marked with `#[atgen(test_func)]`, `#[atgen(test)]` and
//! `#[atgen(subtest)]`. Doc comments containing the older marker text
//! (`/// Atgen TestFunc block` etc.) are recognized as well.
//!
//! The parsed file is kept as an immutable canonical tree; callers receive
//! deep copies of the regions and never touch the original.

pub mod slots;

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use syn::visit_mut::{self, VisitMut};
use syn::{Attribute, File, Item, ItemFn, Stmt};

use crate::error::ConfigError;
use crate::syntax;
use self::slots::Slot;

pub type TemplateResult<T> = std::result::Result<T, ConfigError>;

/// The three cloneable regions of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    FunctionSkeleton,
    TestSkeleton,
    SubtestSkeleton,
}

impl RegionKind {
    pub const ALL: [RegionKind; 3] = [
        RegionKind::FunctionSkeleton,
        RegionKind::TestSkeleton,
        RegionKind::SubtestSkeleton,
    ];

    /// Argument of the `#[atgen(..)]` marker attribute.
    pub fn tag(self) -> &'static str {
        match self {
            RegionKind::FunctionSkeleton => "test_func",
            RegionKind::TestSkeleton => "test",
            RegionKind::SubtestSkeleton => "subtest",
        }
    }

    /// Marker text recognized inside doc comments.
    pub fn legacy_marker(self) -> &'static str {
        match self {
            RegionKind::FunctionSkeleton => "Atgen TestFunc block",
            RegionKind::TestSkeleton => "Atgen Test block",
            RegionKind::SubtestSkeleton => "Atgen Subtest block",
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionKind::FunctionSkeleton => write!(f, "test function skeleton"),
            RegionKind::TestSkeleton => write!(f, "test skeleton"),
            RegionKind::SubtestSkeleton => write!(f, "subtest skeleton"),
        }
    }
}

/// The region an attribute marks, if it is a marker.
pub fn attr_marker(attr: &Attribute) -> Option<RegionKind> {
    if attr.path().is_ident("atgen") {
        let tag: syn::Ident = attr.parse_args().ok()?;
        return RegionKind::ALL.into_iter().find(|k| tag == k.tag());
    }
    if attr.path().is_ident("doc") {
        if let syn::Meta::NameValue(nv) = &attr.meta {
            if let syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(text),
                ..
            }) = &nv.value
            {
                let text = text.value();
                return RegionKind::ALL
                    .into_iter()
                    .find(|k| text.contains(k.legacy_marker()));
            }
        }
    }
    None
}

pub fn marker_of(attrs: &[Attribute]) -> Option<RegionKind> {
    attrs.iter().find_map(attr_marker)
}

pub fn strip_markers(attrs: &mut Vec<Attribute>) {
    attrs.retain(|a| attr_marker(a).is_none());
}

/// Where a marker was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub kind: RegionKind,
    /// Index of the top-level item carrying the marker or containing it.
    pub item: usize,
    /// `true` when the marker sits on a statement nested in the item.
    pub nested: bool,
}

/// Every region marker of a file, in source order.
#[derive(Debug, Clone, Default)]
pub struct MarkerIndex {
    markers: Vec<Marker>,
}

impl MarkerIndex {
    pub fn build(file: &File) -> Self {
        struct Collector {
            item: usize,
            markers: Vec<Marker>,
        }

        impl<'ast> syn::visit::Visit<'ast> for Collector {
            fn visit_stmt(&mut self, stmt: &'ast Stmt) {
                if let Some(kind) = marker_of(syntax::stmt_attrs(stmt)) {
                    self.markers.push(Marker {
                        kind,
                        item: self.item,
                        nested: true,
                    });
                }
                syn::visit::visit_stmt(self, stmt);
            }
        }

        let mut collector = Collector {
            item: 0,
            markers: Vec::new(),
        };
        for (index, item) in file.items.iter().enumerate() {
            collector.item = index;
            if let Item::Fn(f) = item {
                if let Some(kind) = marker_of(&f.attrs) {
                    collector.markers.push(Marker {
                        kind,
                        item: index,
                        nested: false,
                    });
                }
            }
            syn::visit::Visit::visit_item(&mut collector, item);
        }
        Self {
            markers: collector.markers,
        }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Item index of the function skeleton, failing on absence or ambiguity.
    pub fn function_item(&self) -> TemplateResult<usize> {
        let mut found = self
            .markers
            .iter()
            .filter(|m| m.kind == RegionKind::FunctionSkeleton && !m.nested);
        let first = found.next().ok_or(ConfigError::MissingRegion {
            region: RegionKind::FunctionSkeleton,
            tag: RegionKind::FunctionSkeleton.tag(),
            legacy: RegionKind::FunctionSkeleton.legacy_marker(),
        })?;
        if found.next().is_some() {
            return Err(ConfigError::DuplicateRegion {
                region: RegionKind::FunctionSkeleton,
            });
        }
        Ok(first.item)
    }
}

/// Pulls marked statements out of the function skeleton, innermost first,
/// so a test skeleton nested in the subtest skeleton leaves it too.
#[derive(Default)]
struct RegionExtractor {
    test: Option<Stmt>,
    subtest: Option<Stmt>,
}

impl RegionExtractor {
    fn take(&mut self, stmt: &Stmt) -> bool {
        let slot = match marker_of(syntax::stmt_attrs(stmt)) {
            Some(RegionKind::TestSkeleton) => &mut self.test,
            Some(RegionKind::SubtestSkeleton) => &mut self.subtest,
            _ => return false,
        };
        if slot.is_none() {
            let mut region = stmt.clone();
            if let Some(attrs) = syntax::stmt_attrs_mut(&mut region) {
                strip_markers(attrs);
            }
            *slot = Some(region);
        }
        true
    }
}

impl VisitMut for RegionExtractor {
    fn visit_block_mut(&mut self, block: &mut syn::Block) {
        visit_mut::visit_block_mut(self, block);
        block.stmts.retain(|stmt| !self.take(stmt));
    }
}

#[derive(Default)]
struct PlaceholderFinder {
    found: bool,
}

impl<'ast> syn::visit::Visit<'ast> for PlaceholderFinder {
    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        if syntax::is_placeholder(stmt) {
            self.found = true;
            return;
        }
        syn::visit::visit_stmt(self, stmt);
    }
}

fn has_placeholder(block: &syn::Block) -> bool {
    let mut finder = PlaceholderFinder::default();
    syn::visit::Visit::visit_block(&mut finder, block);
    finder.found
}

/// A loaded template: the canonical file plus detached region copies.
#[derive(Debug, Clone)]
pub struct Template {
    file: File,
    function_item: usize,
    function: ItemFn,
    /// Slots the function skeleton uses.
    function_slots: BTreeSet<Slot>,
    test: Option<Stmt>,
    subtest: Option<Stmt>,
}

impl Template {
    /// Load and validate a template file.
    pub fn load(path: &Path) -> TemplateResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::TemplateRead {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&source)
    }

    /// Parse and validate template source.
    pub fn parse(source: &str) -> TemplateResult<Self> {
        let file: File = syn::parse_file(source).map_err(|e| ConfigError::TemplateParse {
            message: e.to_string(),
        })?;

        let index = MarkerIndex::build(&file);
        let function_item = index.function_item()?;
        let Item::Fn(skeleton) = &file.items[function_item] else {
            return Err(ConfigError::MissingRegion {
                region: RegionKind::FunctionSkeleton,
                tag: RegionKind::FunctionSkeleton.tag(),
                legacy: RegionKind::FunctionSkeleton.legacy_marker(),
            });
        };

        let mut function = skeleton.clone();
        strip_markers(&mut function.attrs);
        let mut extractor = RegionExtractor::default();
        extractor.visit_item_fn_mut(&mut function);

        let function_slots = slots::scan_fn(&function);
        let template = Self {
            file,
            function_item,
            function,
            function_slots,
            test: extractor.test,
            subtest: extractor.subtest,
        };
        template.validate()?;

        tracing::debug!(
            function = %template.function.sig.ident,
            has_test = template.test.is_some(),
            has_subtest = template.subtest.is_some(),
            "loaded template"
        );
        Ok(template)
    }

    fn validate(&self) -> TemplateResult<()> {
        slots::validate(RegionKind::FunctionSkeleton, &self.function_slots)?;
        if !has_placeholder(&self.function.block) {
            return Err(ConfigError::MissingPlaceholder {
                region: RegionKind::FunctionSkeleton,
            });
        }
        if let Some(test) = &self.test {
            slots::validate(RegionKind::TestSkeleton, &slots::scan_stmt(test))?;
        }
        if let Some(subtest) = &self.subtest {
            slots::validate(RegionKind::SubtestSkeleton, &slots::scan_stmt(subtest))?;
            let mut finder = PlaceholderFinder::default();
            syn::visit::Visit::visit_stmt(&mut finder, subtest);
            if !finder.found {
                return Err(ConfigError::MissingPlaceholder {
                    region: RegionKind::SubtestSkeleton,
                });
            }
        }
        Ok(())
    }

    /// The canonical file, function skeleton still in place.
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Index of the function skeleton among the file's items.
    pub fn function_item(&self) -> usize {
        self.function_item
    }

    pub fn has_region(&self, kind: RegionKind) -> bool {
        match kind {
            RegionKind::FunctionSkeleton => true,
            RegionKind::TestSkeleton => self.test.is_some(),
            RegionKind::SubtestSkeleton => self.subtest.is_some(),
        }
    }

    /// Whether the function skeleton contains `slot`.
    pub fn function_has_slot(&self, slot: Slot) -> bool {
        self.function_slots.contains(&slot)
    }

    /// Fresh deep copy of the function skeleton, nested regions removed.
    pub fn clone_function(&self) -> ItemFn {
        self.function.clone()
    }

    pub fn clone_test(&self) -> Option<Stmt> {
        self.test.clone()
    }

    pub fn clone_subtest(&self) -> Option<Stmt> {
        self.subtest.clone()
    }
}
