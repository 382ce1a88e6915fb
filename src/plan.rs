//! Version-driven test planning.
//!
//! A test function declares the API versions it targets; individual tests may
//! override that scope. Planning turns one function into one filtered copy per
//! version, with the `{apiVersion}` placeholder resolved in every path.

use std::collections::BTreeMap;

use crate::spec::{SubtestGroup, Test, TestFunction, TestItem};

/// Placeholder substituted with the version in every planned test path.
pub const VERSION_PLACEHOLDER: &str = "{apiVersion}";

/// Deduplicated, first-seen union of the function's versions and the versions
/// of every test it contains (top level and inside subtest groups).
pub fn expand_versions(func: &TestFunction) -> Vec<String> {
    let mut versions: Vec<String> = Vec::new();
    let candidates = func
        .api_versions
        .iter()
        .chain(func.all_tests().flat_map(|t| t.api_versions.iter()));
    for v in candidates {
        if !versions.contains(v) {
            versions.push(v.clone());
        }
    }
    versions
}

/// Filtered copy of `func` containing only what applies to `version`.
///
/// Returns `None` when nothing survives; that is not an error.
pub fn plan(func: &TestFunction, version: &str) -> Option<TestFunction> {
    let mut tests = Vec::new();
    for item in &func.tests {
        match item {
            TestItem::Test(test) => {
                if let Some(t) = plan_test(test, &func.api_versions, version) {
                    tests.push(TestItem::Test(t));
                }
            }
            TestItem::Subtest(group) => {
                if let Some(g) = plan_group(group, &func.api_versions, version) {
                    tests.push(TestItem::Subtest(g));
                }
            }
        }
    }

    if tests.is_empty() {
        return None;
    }

    Some(TestFunction {
        name: func.name.clone(),
        vars: func.vars.clone(),
        router: func.router.clone(),
        api_versions: func.api_versions.clone(),
        tests,
    })
}

/// Plan every function for every version it mentions.
///
/// Functions keep their spec order within each version.
pub fn plan_all(funcs: &[TestFunction]) -> BTreeMap<String, Vec<TestFunction>> {
    let mut planned: BTreeMap<String, Vec<TestFunction>> = BTreeMap::new();
    for func in funcs {
        for version in expand_versions(func) {
            match plan(func, &version) {
                Some(p) => {
                    tracing::debug!(function = %func.name, %version, "planned test function");
                    planned.entry(version).or_default().push(p);
                }
                None => {
                    tracing::debug!(function = %func.name, %version, "no tests apply, skipping");
                }
            }
        }
    }
    planned
}

fn plan_test(test: &Test, fn_versions: &[String], version: &str) -> Option<Test> {
    let applies = if test.api_versions.is_empty() {
        fn_versions.iter().any(|v| v == version)
    } else {
        test.api_versions.iter().any(|v| v == version)
    };
    if !applies {
        return None;
    }
    let mut planned = test.clone();
    planned.path = test.path.replace(VERSION_PLACEHOLDER, version);
    Some(planned)
}

fn plan_group(group: &SubtestGroup, fn_versions: &[String], version: &str) -> Option<SubtestGroup> {
    let scope = group.api_versions.as_deref().unwrap_or(fn_versions);
    if !scope.iter().any(|v| v == version) {
        return None;
    }
    // Grouped tests inherit the function's scope, not the group's.
    let tests = group
        .tests
        .iter()
        .filter_map(|t| plan_test(t, fn_versions, version))
        .collect();
    Some(SubtestGroup {
        name: group.name.clone(),
        api_versions: group.api_versions.clone(),
        tests,
    })
}
