//! Template instantiation: clone regions, then rewrite sentinels.
//!
//! For each planned test function the function skeleton is cloned and
//! renamed, its router call is pointed at the real router, and one clone of
//! the test (or subtest) skeleton per test is rewritten and spliced into the
//! function's `{}` placeholder. Every clone is an independent deep copy, so
//! nothing done here is visible in the template or in sibling clones.

pub mod body;
pub mod interpolate;
pub mod literal;

use std::collections::BTreeSet;

use proc_macro2::{Literal, Span, TokenStream};
use quote::ToTokens;
use syn::visit_mut::{self, VisitMut};
use syn::{Expr, ItemFn, Stmt};

use crate::error::{AssemblyError, AtgenResult, ConfigError};
use crate::package::{PackageId, PackageRef, PackageRegistry};
use crate::spec::{ContentType, SubtestGroup, Test, TestFunction, TestItem};
use crate::syntax;
use crate::template::slots::{self, Slot, SlotRole};
use crate::template::{RegionKind, Template};

/// Instantiates test functions for one output package.
pub struct Instantiator<'a> {
    template: &'a Template,
    output: &'a PackageId,
    registry: &'a PackageRegistry,
}

impl<'a> Instantiator<'a> {
    pub fn new(template: &'a Template, output: &'a PackageId, registry: &'a PackageRegistry) -> Self {
        Self {
            template,
            output,
            registry,
        }
    }

    /// Build the complete generated function for a planned test function.
    pub fn instantiate(&self, func: &TestFunction) -> AtgenResult<ItemFn> {
        let mut item = self.template.clone_function();
        item.sig.ident = syn::parse_str(&func.name).map_err(|_| AssemblyError::BadName {
            name: func.name.clone(),
        })?;

        let callee = self.router_callee(func)?;
        FunctionRewriter {
            callee,
            vars: literal::map_literal(&func.vars),
        }
        .visit_item_fn_mut(&mut item);

        warn_duplicate_registers(func);

        let mut stmts = Vec::with_capacity(func.tests.len());
        for test_item in &func.tests {
            match test_item {
                TestItem::Test(test) => stmts.push(self.instantiate_test(func, test)?),
                TestItem::Subtest(group) => stmts.push(self.instantiate_subtest(func, group)?),
            }
        }
        splice_placeholder(&mut item, stmts);

        tracing::debug!(function = %func.name, tests = func.tests.len(), "instantiated test function");
        Ok(item)
    }

    /// Path the router call is rewritten to.
    fn router_callee(&self, func: &TestFunction) -> AtgenResult<syn::Path> {
        let name = &func.router.name;
        let path = match self.registry.reference(&func.router.package, self.output) {
            Some(PackageRef::Local) => name.clone(),
            Some(PackageRef::Qualified { alias, .. }) => format!("{alias}::{name}"),
            None => {
                return Err(AssemblyError::UnresolvedPackage {
                    function: func.name.clone(),
                    package: func.router.package.clone(),
                }
                .into());
            }
        };
        syn::parse_str(&path).map_err(|_| {
            AssemblyError::UnresolvedPackage {
                function: func.name.clone(),
                package: func.router.package.clone(),
            }
            .into()
        })
    }

    fn instantiate_test(&self, func: &TestFunction, test: &Test) -> AtgenResult<Stmt> {
        let mut stmt = self.template.clone_test().ok_or_else(|| region_required(RegionKind::TestSkeleton, func))?;
        TestRewriter { test }.visit_stmt_mut(&mut stmt);
        let reads_vars = interpolate_stmt(&mut stmt)?;
        if reads_vars && !self.template.function_has_slot(Slot::Vars) {
            return Err(ConfigError::MissingSlot {
                region: RegionKind::FunctionSkeleton,
                token: Slot::Vars.token(),
                contract: slots::CONTRACT_VERSION,
            }
            .into());
        }
        Ok(stmt)
    }

    fn instantiate_subtest(&self, func: &TestFunction, group: &SubtestGroup) -> AtgenResult<Stmt> {
        let mut stmt = self
            .template
            .clone_subtest()
            .ok_or_else(|| region_required(RegionKind::SubtestSkeleton, func))?;
        LiteralRewriter {
            slot: Slot::SubtestName,
            replacement: lit_str(&group.name),
        }
        .visit_stmt_mut(&mut stmt);

        let tests = group
            .tests
            .iter()
            .map(|test| self.instantiate_test(func, test))
            .collect::<AtgenResult<Vec<_>>>()?;
        splice_placeholder_stmt(&mut stmt, tests);
        Ok(stmt)
    }
}

fn region_required(region: RegionKind, func: &TestFunction) -> ConfigError {
    ConfigError::RegionRequired {
        region,
        tag: region.tag(),
        function: func.name.clone(),
    }
}

/// Register keys written by more than one test of `func`, each listed once
/// in order of first reuse.
fn duplicate_registers(func: &TestFunction) -> Vec<&str> {
    let mut seen = BTreeSet::new();
    let mut duplicates = Vec::new();
    for key in func.all_tests().filter_map(|t| t.register.as_deref()) {
        if !seen.insert(key) && !duplicates.contains(&key) {
            duplicates.push(key);
        }
    }
    duplicates
}

fn warn_duplicate_registers(func: &TestFunction) {
    for key in duplicate_registers(func) {
        tracing::warn!(function = %func.name, register = key, "register key reused, later response shadows earlier");
    }
}

fn lit_str(value: &str) -> Expr {
    let lit = syn::LitStr::new(value, Span::call_site());
    syn::parse_quote!(#lit)
}

fn callee_slot(call: &syn::ExprCall) -> Option<Slot> {
    let Expr::Path(p) = &*call.func else {
        return None;
    };
    let ident = p.path.get_ident()?;
    Slot::lookup(SlotRole::Callee, &ident.to_string())
}

fn literal_slot(expr: &Expr) -> Option<Slot> {
    match expr {
        Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(s),
            ..
        }) => Slot::lookup(SlotRole::Literal, &s.value()),
        _ => None,
    }
}

fn binding_slot(stmt: &Stmt) -> Option<Slot> {
    match stmt {
        Stmt::Local(local) => slots::binding_name(&local.pat).and_then(|n| Slot::lookup(SlotRole::Binding, &n)),
        _ => None,
    }
}

/// Replace the initializer of a `let` slot, adding one when missing.
fn set_initializer(local: &mut syn::Local, expr: Expr) {
    match &mut local.init {
        Some(init) => {
            *init.expr = expr;
            init.diverge = None;
        }
        None => {
            local.init = Some(syn::LocalInit {
                eq_token: Default::default(),
                expr: Box::new(expr),
                diverge: None,
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Function-level rewriting
// ---------------------------------------------------------------------------

struct FunctionRewriter {
    callee: syn::Path,
    vars: Expr,
}

impl VisitMut for FunctionRewriter {
    fn visit_expr_call_mut(&mut self, call: &mut syn::ExprCall) {
        if callee_slot(call) == Some(Slot::RouterCall) {
            *call.func = Expr::Path(syn::ExprPath {
                attrs: Vec::new(),
                qself: None,
                path: self.callee.clone(),
            });
        }
        visit_mut::visit_expr_call_mut(self, call);
    }

    fn visit_local_mut(&mut self, local: &mut syn::Local) {
        let name = slots::binding_name(&local.pat);
        if name.as_deref() == Some(Slot::Vars.token()) {
            set_initializer(local, self.vars.clone());
            return;
        }
        visit_mut::visit_local_mut(self, local);
    }
}

// ---------------------------------------------------------------------------
// Test-level rewriting
// ---------------------------------------------------------------------------

struct TestRewriter<'t> {
    test: &'t Test,
}

impl TestRewriter<'_> {
    fn literal(&self, slot: Slot) -> Option<Expr> {
        let test = self.test;
        match slot {
            Slot::Method => Some(lit_str(&test.method.to_uppercase())),
            Slot::Path => Some(lit_str(&test.path)),
            Slot::Status => {
                let status = Literal::u16_unsuffixed(test.res.status);
                Some(syn::parse_quote!(#status))
            }
            Slot::RegisterKey => Some(lit_str(test.register.as_deref().unwrap_or_default())),
            _ => None,
        }
    }

    fn binding(&self, slot: Slot) -> Option<Expr> {
        let test = self.test;
        match slot {
            Slot::ReqHeaders => Some(literal::map_literal(&test.req.headers)),
            Slot::ReqParams => Some(literal::map_literal(&test.req.params)),
            Slot::ResHeaders => Some(literal::map_literal(&test.res.headers)),
            Slot::ResParams => Some(literal::map_literal(&test.res.params)),
            Slot::ResParamsArray => Some(literal::seq_literal(&test.res.params_array)),
            Slot::TestVars => Some(literal::map_literal(&test.vars)),
            _ => None,
        }
    }
}

impl VisitMut for TestRewriter<'_> {
    fn visit_block_mut(&mut self, block: &mut syn::Block) {
        // Raw bodies carry no structured params.
        if self.test.req.content_type == ContentType::Raw {
            block.stmts.retain(|s| binding_slot(s) != Some(Slot::ReqParams));
        }
        visit_mut::visit_block_mut(self, block);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if let Some(replacement) = literal_slot(expr).and_then(|slot| self.literal(slot)) {
            *expr = replacement;
            return;
        }
        if let Expr::Call(call) = expr {
            if callee_slot(call) == Some(Slot::RequestBody) {
                *expr = body::request_body(&self.test.req);
                return;
            }
        }
        visit_mut::visit_expr_mut(self, expr);
    }

    fn visit_local_mut(&mut self, local: &mut syn::Local) {
        let slot = slots::binding_name(&local.pat).and_then(|n| Slot::lookup(SlotRole::Binding, &n));
        if let Some(expr) = slot.and_then(|s| self.binding(s)) {
            set_initializer(local, expr);
            return;
        }
        visit_mut::visit_local_mut(self, local);
    }

    fn visit_macro_mut(&mut self, mac: &mut syn::Macro) {
        let tokens = std::mem::take(&mut mac.tokens);
        mac.tokens = syntax::map_string_literals(tokens, &mut |value, _| {
            let slot = Slot::lookup(SlotRole::Literal, value)?;
            self.literal(slot).map(|e| e.into_token_stream())
        });
    }
}

/// Replaces one literal slot everywhere, macros included.
struct LiteralRewriter {
    slot: Slot,
    replacement: Expr,
}

impl VisitMut for LiteralRewriter {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if literal_slot(expr) == Some(self.slot) {
            *expr = self.replacement.clone();
            return;
        }
        visit_mut::visit_expr_mut(self, expr);
    }

    fn visit_macro_mut(&mut self, mac: &mut syn::Macro) {
        let tokens = std::mem::take(&mut mac.tokens);
        mac.tokens = syntax::map_string_literals(tokens, &mut |value, _| {
            (Slot::lookup(SlotRole::Literal, value) == Some(self.slot)).then(|| self.replacement.to_token_stream())
        });
    }
}

// ---------------------------------------------------------------------------
// Interpolation pass
// ---------------------------------------------------------------------------

/// Rewrites `${..}` and `$register[..]` literals; keeps the first error.
#[derive(Default)]
struct Interpolator {
    error: Option<AssemblyError>,
    /// Set once a `${name:Type}` lookup into the vars binding is emitted.
    reads_vars: bool,
}

impl Interpolator {
    fn expand(&mut self, value: &str) -> Option<TokenStream> {
        if self.error.is_some() {
            return None;
        }
        let interpolation = interpolate::Interpolation::parse(value)?;
        if matches!(interpolation, interpolate::Interpolation::Var { .. }) {
            self.reads_vars = true;
        }
        match interpolation.to_tokens(value) {
            Ok(tokens) => Some(tokens),
            Err(e) => {
                self.error = Some(e);
                None
            }
        }
    }
}

impl VisitMut for Interpolator {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if let Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(s),
            ..
        }) = expr
        {
            let value = s.value();
            if let Some(tokens) = self.expand(&value) {
                match syn::parse2::<Expr>(tokens) {
                    Ok(replacement) => *expr = replacement,
                    Err(e) => {
                        self.error.get_or_insert(AssemblyError::BadInterpolation {
                            literal: value,
                            message: e.to_string(),
                        });
                    }
                }
            }
            return;
        }
        visit_mut::visit_expr_mut(self, expr);
    }

    fn visit_macro_mut(&mut self, mac: &mut syn::Macro) {
        let tokens = std::mem::take(&mut mac.tokens);
        mac.tokens = syntax::map_string_literals(tokens, &mut |value, _| self.expand(value));
    }
}

/// Returns whether the statement now reads the function's vars binding.
fn interpolate_stmt(stmt: &mut Stmt) -> Result<bool, AssemblyError> {
    let mut interpolator = Interpolator::default();
    interpolator.visit_stmt_mut(stmt);
    match interpolator.error {
        Some(e) => Err(e),
        None => Ok(interpolator.reads_vars),
    }
}

// ---------------------------------------------------------------------------
// Placeholder splicing
// ---------------------------------------------------------------------------

/// Replaces the first `{}` statement, in source order, with `pending`.
struct PlaceholderSplicer {
    pending: Option<Vec<Stmt>>,
}

impl VisitMut for PlaceholderSplicer {
    fn visit_block_mut(&mut self, block: &mut syn::Block) {
        let mut i = 0;
        while i < block.stmts.len() && self.pending.is_some() {
            if syntax::is_placeholder(&block.stmts[i]) {
                let stmts = self.pending.take().unwrap_or_default();
                block.stmts.splice(i..=i, stmts);
                return;
            }
            self.visit_stmt_mut(&mut block.stmts[i]);
            i += 1;
        }
    }
}

/// Splice statements into a function's placeholder; `false` if it has none.
pub fn splice_placeholder(item: &mut ItemFn, stmts: Vec<Stmt>) -> bool {
    let mut splicer = PlaceholderSplicer { pending: Some(stmts) };
    splicer.visit_item_fn_mut(item);
    splicer.pending.is_none()
}

pub fn splice_placeholder_stmt(stmt: &mut Stmt, stmts: Vec<Stmt>) -> bool {
    let mut splicer = PlaceholderSplicer { pending: Some(stmts) };
    splicer.visit_stmt_mut(stmt);
    splicer.pending.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Request, Response, RouterReference};
    use serde_json::json;

    const TEMPLATE: &str = r#"
use serde_json::Value;

#[atgen(test_func)]
#[test]
fn atgen_test_func() -> Result<(), Box<dyn std::error::Error>> {
    let atgen_vars = serde_json::json!({});
    let router = atgen_router_func();
    {}
    #[atgen(subtest)]
    {
        println!("subtest {}", "AtgenSubtestName");
        {}
    }
    #[atgen(test)]
    {
        let atgen_req_headers = serde_json::json!({});
        let atgen_req_params = serde_json::json!({});
        let atgen_res_params = serde_json::json!({});
        let body = atgen_request_body()?;
        let res = send(&router, "AtgenMethod", "AtgenPath", &atgen_req_headers, body);
        assert_eq!(res.status, "atgenStatus");
        register("atgenRegisterKey", &res);
    }
    Ok(())
}
"#;

    fn template() -> Template {
        Template::parse(TEMPLATE).unwrap()
    }

    fn test(method: &str, path: &str, status: u16) -> Test {
        Test {
            method: method.into(),
            path: path.into(),
            register: None,
            req: Request::default(),
            res: Response {
                status,
                ..Default::default()
            },
            vars: Default::default(),
            api_versions: vec![],
        }
    }

    fn func(name: &str, router: &str, tests: Vec<TestItem>) -> TestFunction {
        TestFunction {
            name: name.into(),
            vars: Default::default(),
            router: RouterReference::parse(router).unwrap(),
            api_versions: vec!["v1".into()],
            tests,
        }
    }

    fn registry() -> PackageRegistry {
        let mut r = PackageRegistry::new();
        r.insert("my_app::routes", None);
        r
    }

    fn render(item: &ItemFn) -> String {
        item.to_token_stream().to_string()
    }

    #[test]
    fn login_end_to_end() {
        let t = template();
        let output = PackageId::standalone("my_app", "tests");
        let reg = registry();
        let f = func(
            "Login",
            "my_app::routes::router",
            vec![TestItem::Test(test("post", "/api/v1/login", 200))],
        );
        let item = Instantiator::new(&t, &output, &reg).instantiate(&f).unwrap();
        assert_eq!(item.sig.ident, "Login");

        let out = render(&item);
        assert!(out.contains("routes :: router ()"), "{out}");
        assert!(out.contains("\"POST\""));
        assert!(out.contains("\"/api/v1/login\""));
        assert!(out.contains("assert_eq ! (res . status , 200)"), "{out}");
        assert!(!out.contains("Atgen"));
        assert!(!out.contains("atgenStatus"));
        assert!(out.contains("serde_json :: to_vec (& atgen_req_params)"));
    }

    #[test]
    fn router_in_output_package_is_called_unqualified() {
        let t = template();
        let output = PackageId::library("my_app", &["routes"]);
        let reg = registry();
        let f = func("Local", "my_app::routes::router", vec![TestItem::Test(test("get", "/", 204))]);
        let out = render(&Instantiator::new(&t, &output, &reg).instantiate(&f).unwrap());
        assert!(out.contains("let router = router ()"), "{out}");
    }

    #[test]
    fn unresolved_router_package_fails() {
        let t = template();
        let output = PackageId::standalone("my_app", "tests");
        let reg = registry();
        let f = func("Lost", "elsewhere::router", vec![TestItem::Test(test("get", "/", 200))]);
        let err = Instantiator::new(&t, &output, &reg).instantiate(&f).unwrap_err();
        assert!(matches!(
            err,
            crate::error::AtgenError::Assembly(AssemblyError::UnresolvedPackage { .. })
        ));
    }

    #[test]
    fn tests_are_spliced_in_order_with_subtests() {
        let t = template();
        let output = PackageId::standalone("my_app", "tests");
        let reg = registry();
        let group = SubtestGroup {
            name: "nested group".into(),
            api_versions: None,
            tests: vec![test("get", "/inner", 200)],
        };
        let f = func(
            "Ordered",
            "my_app::routes::router",
            vec![
                TestItem::Test(test("get", "/first", 200)),
                TestItem::Subtest(group),
                TestItem::Test(test("get", "/last", 200)),
            ],
        );
        let out = render(&Instantiator::new(&t, &output, &reg).instantiate(&f).unwrap());
        let first = out.find("\"/first\"").unwrap();
        let group = out.find("\"nested group\"").unwrap();
        let inner = out.find("\"/inner\"").unwrap();
        let last = out.find("\"/last\"").unwrap();
        assert!(first < group && group < inner && inner < last, "{out}");
        // The placeholder is consumed; `Ok(())` still closes the function.
        assert!(out.trim_end().ends_with("Ok (()) }"), "{out}");
    }

    #[test]
    fn form_body_and_composite_literals() {
        let t = template();
        let output = PackageId::standalone("my_app", "tests");
        let reg = registry();
        let mut form = test("post", "/form", 201);
        form.req.content_type = ContentType::Form;
        form.req.params = json!({ "b": 2, "a": "x" }).as_object().unwrap().clone();
        form.req.headers = json!({ "X-Token": "t" }).as_object().unwrap().clone();
        let f = func("Form", "my_app::routes::router", vec![TestItem::Test(form)]);
        let out = render(&Instantiator::new(&t, &output, &reg).instantiate(&f).unwrap());

        assert!(out.contains("encode (key)"), "{out}");
        assert!(out.contains("\"X-Token\" : \"t\""), "{out}");
        let a = out.find("\"a\" : \"x\"").unwrap();
        let b = out.find("\"b\" : 2").unwrap();
        assert!(a < b);
    }

    #[test]
    fn raw_body_deletes_params_binding() {
        let t = template();
        let output = PackageId::standalone("my_app", "tests");
        let reg = registry();
        let mut raw = test("post", "/raw", 200);
        raw.req.content_type = ContentType::Raw;
        raw.req.body = "hello".into();
        let f = func("Raw", "my_app::routes::router", vec![TestItem::Test(raw)]);
        let out = render(&Instantiator::new(&t, &output, &reg).instantiate(&f).unwrap());

        assert!(!out.contains("atgen_req_params"), "{out}");
        assert!(out.contains("render_str"));
        assert!(out.contains("\"hello\""));
    }

    #[test]
    fn interpolations_inside_params_become_lookups() {
        let t = template();
        let output = PackageId::standalone("my_app", "tests");
        let reg = registry();
        let mut login = test("post", "/me", 200);
        login.req.params = json!({ "token": "$register[login.token]", "id": "${user_id:i64}" })
            .as_object()
            .unwrap()
            .clone();
        let f = func("Interp", "my_app::routes::router", vec![TestItem::Test(login)]);
        let out = render(&Instantiator::new(&t, &output, &reg).instantiate(&f).unwrap());

        assert!(out.contains("atgen_register () [\"login\"] [\"token\"]"), "{out}");
        assert!(out.contains("from_value :: < i64 > (atgen_vars [\"user_id\"] . clone ())"), "{out}");
    }

    #[test]
    fn function_vars_fill_the_vars_slot() {
        let t = template();
        let output = PackageId::standalone("my_app", "tests");
        let reg = registry();
        let mut f = func("Vars", "my_app::routes::router", vec![TestItem::Test(test("get", "/", 200))]);
        f.vars = json!({ "user_id": 7 }).as_object().unwrap().clone();
        let out = render(&Instantiator::new(&t, &output, &reg).instantiate(&f).unwrap());
        assert!(out.contains("let atgen_vars = :: serde_json :: json ! ({ \"user_id\" : 7 })"), "{out}");
    }

    #[test]
    fn missing_subtest_region_is_reported_when_used() {
        let src = r#"
#[atgen(test_func)]
fn skeleton() {
    let router = atgen_router_func();
    {}
    #[atgen(test)]
    {
        let body = atgen_request_body();
        check("AtgenMethod", "AtgenPath", "atgenStatus", body);
    }
}
"#;
        let t = Template::parse(src).unwrap();
        let output = PackageId::standalone("my_app", "tests");
        let reg = registry();
        let group = SubtestGroup {
            name: "g".into(),
            api_versions: None,
            tests: vec![],
        };
        let f = func("NoSub", "my_app::routes::router", vec![TestItem::Subtest(group)]);
        let err = Instantiator::new(&t, &output, &reg).instantiate(&f).unwrap_err();
        assert!(matches!(
            err,
            crate::error::AtgenError::Config(ConfigError::RegionRequired {
                region: RegionKind::SubtestSkeleton,
                ..
            })
        ));
    }

    #[test]
    fn missing_test_region_is_reported_when_used() {
        let src = r#"
#[atgen(test_func)]
fn skeleton() {
    let router = atgen_router_func();
    {}
}
"#;
        let t = Template::parse(src).unwrap();
        let output = PackageId::standalone("my_app", "tests");
        let reg = registry();
        let f = func("NoTest", "my_app::routes::router", vec![TestItem::Test(test("get", "/", 200))]);
        let err = Instantiator::new(&t, &output, &reg).instantiate(&f).unwrap_err();
        assert!(matches!(
            err,
            crate::error::AtgenError::Config(ConfigError::RegionRequired {
                region: RegionKind::TestSkeleton,
                ..
            })
        ));
    }

    #[test]
    fn var_lookup_needs_the_vars_binding() {
        let src = r#"
#[atgen(test_func)]
fn skeleton() {
    let router = atgen_router_func();
    {}
    #[atgen(test)]
    {
        let atgen_req_params = serde_json::json!({});
        let body = atgen_request_body();
        check("AtgenMethod", "AtgenPath", "atgenStatus", body);
    }
}
"#;
        let t = Template::parse(src).unwrap();
        let output = PackageId::standalone("my_app", "tests");
        let reg = registry();

        let mut plain = test("get", "/", 200);
        plain.req.params = json!({ "token": "$register[login.token]" }).as_object().unwrap().clone();
        let f = func("RegisterOnly", "my_app::routes::router", vec![TestItem::Test(plain)]);
        assert!(Instantiator::new(&t, &output, &reg).instantiate(&f).is_ok());

        let mut typed = test("get", "/", 200);
        typed.req.params = json!({ "id": "${user_id:i64}" }).as_object().unwrap().clone();
        let f = func("NeedsVars", "my_app::routes::router", vec![TestItem::Test(typed)]);
        let err = Instantiator::new(&t, &output, &reg).instantiate(&f).unwrap_err();
        assert!(matches!(
            err,
            crate::error::AtgenError::Config(ConfigError::MissingSlot {
                region: RegionKind::FunctionSkeleton,
                token: "atgen_vars",
                ..
            })
        ));
    }

    #[test]
    fn duplicated_register_keys_are_reported_once_each() {
        let registered = |key: &str, path: &str| {
            let mut t = test("post", path, 200);
            t.register = Some(key.into());
            t
        };
        let group = SubtestGroup {
            name: "again".into(),
            api_versions: None,
            tests: vec![registered("login", "/c"), registered("user", "/d")],
        };
        let f = func(
            "Dupes",
            "my_app::routes::router",
            vec![
                TestItem::Test(registered("login", "/a")),
                TestItem::Test(registered("user", "/b")),
                TestItem::Test(registered("login", "/e")),
                TestItem::Subtest(group),
                TestItem::Test(registered("once", "/f")),
            ],
        );
        assert_eq!(duplicate_registers(&f), vec!["login", "user"]);

        let unique = func(
            "Unique",
            "my_app::routes::router",
            vec![TestItem::Test(registered("a", "/a")), TestItem::Test(test("get", "/b", 200))],
        );
        assert!(duplicate_registers(&unique).is_empty());
    }

    #[test]
    fn clones_never_alias_the_template_or_each_other() {
        let t = template();
        let pristine = render(&t.clone_function());
        let pristine_test = t.clone_test().unwrap().to_token_stream().to_string();

        let mut clones: Vec<ItemFn> = (0..3).map(|_| t.clone_function()).collect();
        for (i, clone) in clones.iter_mut().enumerate() {
            clone.sig.ident = quote::format_ident!("renamed_{i}");
            splice_placeholder(clone, vec![syn::parse_quote!(mutated(#i);)]);
        }

        assert_eq!(render(&t.clone_function()), pristine);
        assert_eq!(t.clone_test().unwrap().to_token_stream().to_string(), pristine_test);
        for (i, clone) in clones.iter().enumerate() {
            let out = render(clone);
            assert!(out.contains(&format!("renamed_{i}")));
            for j in (0..3).filter(|j| *j != i) {
                assert!(!out.contains(&format!("renamed_{j}")));
                assert!(!out.contains(&format!("mutated ({j}usize)")));
            }
        }
    }
}
