//! Test specification model and YAML loading.
//!
//! A spec file is a YAML sequence of test functions. Values produced here are
//! immutable inputs to a generation run: the planner copies and filters them,
//! nothing mutates them in place.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SpecError;

pub type SpecResult<T> = std::result::Result<T, SpecError>;

/// How a test's request body is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Params serialized with `serde_json::to_vec`.
    #[default]
    Json,
    /// Params URL-encoded as `key=value` pairs.
    Form,
    /// The literal `body` string, rendered through a template engine.
    Raw,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Json => write!(f, "json"),
            ContentType::Form => write!(f, "form"),
            ContentType::Raw => write!(f, "raw"),
        }
    }
}

/// The handler-dispatch function a generated test invokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterReference {
    /// Function name, e.g. `router`.
    pub name: String,
    /// Declaring package path, e.g. `my_app::routes`.
    pub package: String,
}

impl RouterReference {
    /// Split `my_app::routes::router` into package and function name.
    pub fn parse(reference: &str) -> Option<Self> {
        let (package, name) = reference.trim().rsplit_once("::")?;
        if package.is_empty() || syn::parse_str::<syn::Ident>(name).is_err() {
            return None;
        }
        if syn::parse_str::<syn::Path>(package).is_err() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            package: package.to_string(),
        })
    }
}

impl fmt::Display for RouterReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.package, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Request {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    /// Literal body, only meaningful for [`ContentType::Raw`].
    pub body: String,
    pub params: Map<String, Value>,
    pub headers: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Response {
    pub status: u16,
    pub headers: Map<String, Value>,
    pub params: Map<String, Value>,
    pub params_array: Vec<Value>,
}

/// A single HTTP request/response check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    pub method: String,
    /// May contain the `{apiVersion}` placeholder until planned.
    pub path: String,
    /// Key the response body is stored under for later `$register[..]` lookups.
    #[serde(default)]
    pub register: Option<String>,
    #[serde(default)]
    pub req: Request,
    #[serde(default)]
    pub res: Response,
    #[serde(default)]
    pub vars: Map<String, Value>,
    /// Empty means "inherit the function's versions".
    #[serde(default)]
    pub api_versions: Vec<String>,
}

/// A named, version-scopable cluster of tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtestGroup {
    pub name: String,
    #[serde(default)]
    pub api_versions: Option<Vec<String>>,
    #[serde(default)]
    pub tests: Vec<Test>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TestItem {
    Test(Test),
    Subtest(SubtestGroup),
}

/// A generated test entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct TestFunction {
    pub name: String,
    pub vars: Map<String, Value>,
    pub router: RouterReference,
    pub api_versions: Vec<String>,
    pub tests: Vec<TestItem>,
}

impl TestFunction {
    /// Every test of the function, top level and inside subtest groups, in order.
    pub fn all_tests(&self) -> impl Iterator<Item = &Test> {
        self.tests.iter().flat_map(|item| match item {
            TestItem::Test(test) => std::slice::from_ref(test).iter(),
            TestItem::Subtest(group) => group.tests.iter(),
        })
    }
}

// ---------------------------------------------------------------------------
// YAML wire format
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTestFunction {
    name: String,
    #[serde(default)]
    vars: Map<String, Value>,
    router: String,
    #[serde(default)]
    api_versions: Vec<String>,
    #[serde(default)]
    tests: Vec<RawTestItem>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTestItem {
    Subtests { subtests: Vec<SubtestGroup> },
    Test(Test),
}

impl RawTestFunction {
    fn into_function(self) -> SpecResult<TestFunction> {
        let router = RouterReference::parse(&self.router).ok_or_else(|| SpecError::InvalidRouter {
            function: self.name.clone(),
            reference: self.router.clone(),
        })?;

        let mut tests = Vec::with_capacity(self.tests.len());
        for item in self.tests {
            match item {
                RawTestItem::Test(test) => tests.push(TestItem::Test(test)),
                RawTestItem::Subtests { subtests } => {
                    tests.extend(subtests.into_iter().map(TestItem::Subtest));
                }
            }
        }

        Ok(TestFunction {
            name: self.name,
            vars: self.vars,
            router,
            api_versions: self.api_versions,
            tests,
        })
    }
}

/// Parse spec YAML. `origin` only labels errors.
pub fn parse_spec(source: &str, origin: &str) -> SpecResult<Vec<TestFunction>> {
    let raw: Vec<RawTestFunction> =
        serde_yaml::from_str(source).map_err(|e| SpecError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
    raw.into_iter().map(RawTestFunction::into_function).collect()
}

/// Load a spec file from disk.
pub fn load_spec(path: &Path) -> SpecResult<Vec<TestFunction>> {
    let content = std::fs::read_to_string(path).map_err(|e| SpecError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_spec(&content, &path.display().to_string())
}
