//! Literal emission from structured spec values.
//!
//! Maps, sequences and scalars from the spec become `::serde_json::json!(..)`
//! expressions. Map keys are emitted in sorted order so output never depends
//! on how the source map happened to be stored.

use proc_macro2::{Literal, Span, TokenStream};
use quote::quote;
use serde_json::{Map, Number, Value};
use syn::Expr;

/// `::serde_json::json!(..)` for an arbitrary value.
pub fn json_literal(value: &Value) -> Expr {
    let body = value_tokens(value);
    syn::parse_quote!(::serde_json::json!(#body))
}

/// `::serde_json::json!({..})` for a mapping.
pub fn map_literal(map: &Map<String, Value>) -> Expr {
    let body = object_tokens(map);
    syn::parse_quote!(::serde_json::json!(#body))
}

/// `::serde_json::json!([..])` for a sequence.
pub fn seq_literal(items: &[Value]) -> Expr {
    let body = array_tokens(items);
    syn::parse_quote!(::serde_json::json!(#body))
}

fn value_tokens(value: &Value) -> TokenStream {
    match value {
        Value::Null => quote!(null),
        Value::Bool(b) => quote!(#b),
        Value::Number(n) => number_tokens(n),
        Value::String(s) => {
            let lit = syn::LitStr::new(s, Span::call_site());
            quote!(#lit)
        }
        Value::Array(items) => array_tokens(items),
        Value::Object(map) => object_tokens(map),
    }
}

fn array_tokens(items: &[Value]) -> TokenStream {
    let items = items.iter().map(value_tokens);
    quote!([#(#items),*])
}

fn object_tokens(map: &Map<String, Value>) -> TokenStream {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    let pairs = entries.into_iter().map(|(key, value)| {
        let key = syn::LitStr::new(key, Span::call_site());
        let value = value_tokens(value);
        quote!(#key: #value)
    });
    quote!({ #(#pairs),* })
}

fn number_tokens(n: &Number) -> TokenStream {
    if let Some(u) = n.as_u64() {
        let lit = Literal::u64_unsuffixed(u);
        return quote!(#lit);
    }
    if let Some(i) = n.as_i64() {
        // Only negative values reach here.
        let lit = Literal::u64_unsuffixed(i.unsigned_abs());
        return quote!(-#lit);
    }
    let f = n.as_f64().unwrap_or_default();
    let lit = Literal::f64_unsuffixed(f.abs());
    if f.is_sign_negative() {
        quote!(-#lit)
    } else {
        quote!(#lit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::ToTokens;
    use serde_json::json;

    fn render(expr: &Expr) -> String {
        expr.to_token_stream().to_string()
    }

    #[test]
    fn map_keys_are_sorted() {
        let value = json!({ "zeta": 1, "alpha": 2, "mid": 3 });
        let Value::Object(map) = value else { unreachable!() };
        let out = render(&map_literal(&map));
        let a = out.find("\"alpha\"").unwrap();
        let m = out.find("\"mid\"").unwrap();
        let z = out.find("\"zeta\"").unwrap();
        assert!(a < m && m < z, "{out}");
    }

    #[test]
    fn nested_values_keep_their_shape() {
        let value = json!({ "user": { "tags": ["a", null, true], "age": -4, "score": 1.5 } });
        let out = render(&json_literal(&value));
        let expected = quote!(::serde_json::json!({
            "user": { "age": -4, "score": 1.5, "tags": ["a", null, true] }
        }))
        .to_string();
        assert_eq!(out, expected);
    }

    #[test]
    fn empty_sequence() {
        assert_eq!(render(&seq_literal(&[])), quote!(::serde_json::json!([])).to_string());
    }
}
