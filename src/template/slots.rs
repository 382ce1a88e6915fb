//! The sentinel contract between templates and the rewriter.
//!
//! Every token the rewriter replaces is listed once in [`SLOTS`], together with
//! the syntax role it plays and the region it must appear in. Templates are
//! checked against the table when they are loaded.

use std::collections::BTreeSet;

use syn::visit::{self, Visit};

use super::RegionKind;
use crate::error::ConfigError;
use crate::syntax;

/// Bumped whenever a slot is added, renamed, or changes role.
pub const CONTRACT_VERSION: u32 = 1;

/// Identifier of the register store accessor generated lookups call.
pub const REGISTER_STORE: &str = "atgen_register";

/// How a slot appears in template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRole {
    /// Callee of a call expression: `atgen_router_func(..)`.
    Callee,
    /// Name bound by a `let`; the initializer is replaced.
    Binding,
    /// A whole string literal.
    Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    RouterCall,
    Vars,
    Method,
    Path,
    Status,
    RegisterKey,
    RequestBody,
    ReqHeaders,
    ReqParams,
    ResHeaders,
    ResParams,
    ResParamsArray,
    TestVars,
    SubtestName,
}

#[derive(Debug, Clone, Copy)]
pub struct SlotSpec {
    pub slot: Slot,
    pub token: &'static str,
    pub role: SlotRole,
    pub region: RegionKind,
    pub required: bool,
}

const fn spec(slot: Slot, token: &'static str, role: SlotRole, region: RegionKind, required: bool) -> SlotSpec {
    SlotSpec { slot, token, role, region, required }
}

use super::RegionKind::{FunctionSkeleton as F, SubtestSkeleton as S, TestSkeleton as T};
use self::SlotRole::{Binding, Callee, Literal};

pub const SLOTS: &[SlotSpec] = &[
    spec(Slot::RouterCall, "atgen_router_func", Callee, F, true),
    spec(Slot::Vars, "atgen_vars", Binding, F, false),
    spec(Slot::Method, "AtgenMethod", Literal, T, true),
    spec(Slot::Path, "AtgenPath", Literal, T, true),
    spec(Slot::Status, "atgenStatus", Literal, T, true),
    spec(Slot::RegisterKey, "atgenRegisterKey", Literal, T, false),
    spec(Slot::RequestBody, "atgen_request_body", Callee, T, true),
    spec(Slot::ReqHeaders, "atgen_req_headers", Binding, T, false),
    spec(Slot::ReqParams, "atgen_req_params", Binding, T, false),
    spec(Slot::ResHeaders, "atgen_res_headers", Binding, T, false),
    spec(Slot::ResParams, "atgen_res_params", Binding, T, false),
    spec(Slot::ResParamsArray, "atgen_res_params_array", Binding, T, false),
    spec(Slot::TestVars, "atgen_test_vars", Binding, T, false),
    spec(Slot::SubtestName, "AtgenSubtestName", Literal, S, true),
];

impl Slot {
    pub fn spec(self) -> &'static SlotSpec {
        // Every variant has exactly one row; the table is checked in tests.
        SLOTS
            .iter()
            .find(|s| s.slot == self)
            .unwrap_or(&SLOTS[0])
    }

    pub fn token(self) -> &'static str {
        self.spec().token
    }

    /// The slot a token names in the given role, if any.
    pub fn lookup(role: SlotRole, token: &str) -> Option<Slot> {
        SLOTS
            .iter()
            .find(|s| s.role == role && s.token == token)
            .map(|s| s.slot)
    }
}

/// Collects every slot that occurs in a syntax subtree.
#[derive(Default)]
struct SlotScanner {
    found: BTreeSet<Slot>,
}

impl<'ast> Visit<'ast> for SlotScanner {
    fn visit_expr_call(&mut self, call: &'ast syn::ExprCall) {
        if let syn::Expr::Path(p) = &*call.func {
            if let Some(ident) = p.path.get_ident() {
                if let Some(slot) = Slot::lookup(SlotRole::Callee, &ident.to_string()) {
                    self.found.insert(slot);
                }
            }
        }
        visit::visit_expr_call(self, call);
    }

    fn visit_local(&mut self, local: &'ast syn::Local) {
        if let Some(name) = binding_name(&local.pat) {
            if let Some(slot) = Slot::lookup(SlotRole::Binding, &name) {
                self.found.insert(slot);
            }
        }
        visit::visit_local(self, local);
    }

    fn visit_lit_str(&mut self, lit: &'ast syn::LitStr) {
        if let Some(slot) = Slot::lookup(SlotRole::Literal, &lit.value()) {
            self.found.insert(slot);
        }
    }

    fn visit_macro(&mut self, mac: &'ast syn::Macro) {
        let mut literals = Vec::new();
        syntax::string_literals(&mac.tokens, &mut literals);
        for value in literals {
            if let Some(slot) = Slot::lookup(SlotRole::Literal, &value) {
                self.found.insert(slot);
            }
        }
        visit::visit_macro(self, mac);
    }
}

/// Name bound by a simple `let` pattern, looking through type ascriptions.
pub fn binding_name(pat: &syn::Pat) -> Option<String> {
    match pat {
        syn::Pat::Ident(p) => Some(p.ident.to_string()),
        syn::Pat::Type(p) => binding_name(&p.pat),
        _ => None,
    }
}

pub fn scan_fn(item: &syn::ItemFn) -> BTreeSet<Slot> {
    let mut scanner = SlotScanner::default();
    scanner.visit_item_fn(item);
    scanner.found
}

pub fn scan_stmt(stmt: &syn::Stmt) -> BTreeSet<Slot> {
    let mut scanner = SlotScanner::default();
    scanner.visit_stmt(stmt);
    scanner.found
}

/// Check that every required slot of `region` was found in it.
pub fn validate(region: RegionKind, found: &BTreeSet<Slot>) -> Result<(), ConfigError> {
    for spec in SLOTS.iter().filter(|s| s.region == region) {
        if found.contains(&spec.slot) {
            continue;
        }
        if spec.required {
            return Err(ConfigError::MissingSlot {
                region,
                token: spec.token,
                contract: CONTRACT_VERSION,
            });
        }
        tracing::debug!(%region, token = spec.token, "optional slot not used by template");
    }
    Ok(())
}
