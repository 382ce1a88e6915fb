//! Request body synthesis, one builder per content type.

use proc_macro2::Span;
use quote::format_ident;
use syn::Expr;

use crate::spec::{ContentType, Request};
use crate::template::slots::Slot;

/// Imports the generated body expression of a content type relies on.
///
/// Registered for every test of that content type, whether or not the
/// particular expression ends up using all of them.
pub fn helper_imports(content_type: ContentType) -> &'static [&'static str] {
    match content_type {
        ContentType::Json => &[],
        ContentType::Form => &["serde_json::Value", "urlencoding::encode"],
        ContentType::Raw => &["minijinja::Environment", "minijinja::context"],
    }
}

/// Expression replacing the `atgen_request_body()` call.
///
/// Every variant evaluates to a `Result<Vec<u8>, E>` so the template can
/// handle them uniformly.
pub fn request_body(req: &Request) -> Expr {
    match req.content_type {
        ContentType::Json => json_body(),
        ContentType::Form => form_body(),
        ContentType::Raw => raw_body(&req.body),
    }
}

fn json_body() -> Expr {
    let params = format_ident!("{}", Slot::ReqParams.token());
    syn::parse_quote!(::serde_json::to_vec(&#params))
}

fn form_body() -> Expr {
    let params = format_ident!("{}", Slot::ReqParams.token());
    syn::parse_quote! {
        (|| -> ::std::result::Result<::std::vec::Vec<u8>, ::std::convert::Infallible> {
            let mut pairs = ::std::vec::Vec::new();
            if let Some(params) = #params.as_object() {
                for (key, value) in params {
                    let value = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    pairs.push(format!("{}={}", encode(key), encode(&value)));
                }
            }
            Ok(pairs.join("&").into_bytes())
        })()
    }
}

fn raw_body(body: &str) -> Expr {
    let body = syn::LitStr::new(body, Span::call_site());
    syn::parse_quote! {
        (|| -> ::std::result::Result<::std::vec::Vec<u8>, ::minijinja::Error> {
            let env = Environment::new();
            let rendered = env.render_str("{{ body }}", context! { body => #body })?;
            Ok(rendered.into_bytes())
        })()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::ToTokens;

    fn request(content_type: ContentType, body: &str) -> Request {
        Request {
            content_type,
            body: body.into(),
            ..Default::default()
        }
    }

    #[test]
    fn json_serializes_params() {
        let out = request_body(&request(ContentType::Json, "")).to_token_stream().to_string();
        assert_eq!(out, quote::quote!(::serde_json::to_vec(&atgen_req_params)).to_string());
    }

    #[test]
    fn form_references_params_only() {
        let out = request_body(&request(ContentType::Form, "ignored")).to_token_stream().to_string();
        assert!(out.contains("atgen_req_params"));
        assert!(out.contains("encode"));
        assert!(!out.contains("ignored"));
    }

    #[test]
    fn raw_references_body_only() {
        let out = request_body(&request(ContentType::Raw, "{\"a\":1}")).to_token_stream().to_string();
        assert!(!out.contains("atgen_req_params"));
        assert!(out.contains(r#""{\"a\":1}""#), "{out}");
        assert!(out.contains("render_str"));
    }

    #[test]
    fn helper_imports_are_fixed_per_content_type() {
        assert!(helper_imports(ContentType::Json).is_empty());
        assert_eq!(helper_imports(ContentType::Form), &["serde_json::Value", "urlencoding::encode"]);
        assert_eq!(helper_imports(ContentType::Raw), &["minijinja::Environment", "minijinja::context"]);
    }
}
