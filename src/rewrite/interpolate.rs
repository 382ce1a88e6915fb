//! The two string interpolation forms understood inside generated tests.
//!
//! - `${name:Type}` reads `name` from the test function's vars, deserialized as `Type`.
//! - `$register[path]` walks the register store along `path`, where
//!   `path := ident ('.' ident | '[' digit+ ']')*`, and yields a string.
//!
//! Only literals consisting entirely of one interpolation are rewritten.

use std::sync::LazyLock;

use proc_macro2::{Literal, Span, TokenStream};
use quote::{format_ident, quote};
use regex::Regex;

use crate::error::AssemblyError;
use crate::template::slots::{REGISTER_STORE, Slot};

static VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\{([A-Za-z_][A-Za-z0-9_]*):(.+)\}$").unwrap());

static REGISTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$(?:register|atgenRegister)\[(.*)\]$").unwrap());

static REGISTER_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*|\[[0-9]+\])*$").unwrap()
});

static SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)|\[([0-9]+)\]").unwrap());

/// One step of a register lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// String-keyed map lookup.
    Key(String),
    /// Zero-based sequence index.
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpolation {
    Var { name: String, ty: String },
    Register(Vec<Segment>),
}

impl Interpolation {
    /// Recognize a literal value. Malformed register paths are left alone.
    pub fn parse(value: &str) -> Option<Self> {
        if let Some(caps) = VAR.captures(value) {
            return Some(Interpolation::Var {
                name: caps[1].to_string(),
                ty: caps[2].trim().to_string(),
            });
        }
        let caps = REGISTER.captures(value)?;
        match parse_register_path(&caps[1]) {
            Some(segments) => Some(Interpolation::Register(segments)),
            None => {
                tracing::warn!(literal = value, "malformed register path, leaving literal as is");
                None
            }
        }
    }

    /// The expression replacing the literal.
    pub fn to_tokens(&self, literal: &str) -> Result<TokenStream, AssemblyError> {
        match self {
            Interpolation::Var { name, ty } => {
                let ty: syn::Type = syn::parse_str(ty).map_err(|e| AssemblyError::BadInterpolation {
                    literal: literal.to_string(),
                    message: e.to_string(),
                })?;
                let vars = format_ident!("{}", Slot::Vars.token());
                let message = format!("var `{name}` is not a {}", quote!(#ty));
                Ok(quote! {
                    ::serde_json::from_value::<#ty>(#vars[#name].clone()).expect(#message)
                })
            }
            Interpolation::Register(segments) => {
                let store = format_ident!("{}", REGISTER_STORE);
                let steps = segments.iter().map(|segment| match segment {
                    Segment::Key(key) => {
                        let key = syn::LitStr::new(key, Span::call_site());
                        quote!([#key])
                    }
                    Segment::Index(index) => {
                        let index = Literal::usize_suffixed(*index);
                        quote!([#index])
                    }
                });
                let message = format!("register value at `{literal}` is not a string");
                Ok(quote! {
                    #store()#(#steps)*.as_str().expect(#message).to_owned()
                })
            }
        }
    }
}

/// Split `a.b[0].c` into segments; `None` when it does not match the grammar.
pub fn parse_register_path(path: &str) -> Option<Vec<Segment>> {
    if !REGISTER_PATH.is_match(path) {
        return None;
    }
    SEGMENT
        .captures_iter(path)
        .map(|caps| match (caps.get(1), caps.get(2)) {
            (Some(key), _) => Some(Segment::Key(key.as_str().to_string())),
            (None, Some(index)) => index.as_str().parse().ok().map(Segment::Index),
            (None, None) => None,
        })
        .collect()
}

/// Expression for a literal value, if it is an interpolation.
pub fn interpolate(value: &str) -> Result<Option<TokenStream>, AssemblyError> {
    match Interpolation::parse(value) {
        Some(interp) => interp.to_tokens(value).map(Some),
        None => Ok(None),
    }
}
