//! Small helpers over the `syn` tree shared by the loader and the rewriter.
//!
//! `syn` keeps macro bodies as opaque token streams, so sentinels that live
//! inside `assert_eq!(..)` or `json!(..)` are reached at the token level.

use proc_macro2::{Group, Literal, Span, TokenStream, TokenTree};
use syn::{Attribute, Expr, Stmt};

/// Outer attributes attached to a statement, if the statement kind carries any.
pub fn stmt_attrs(stmt: &Stmt) -> &[Attribute] {
    match stmt {
        Stmt::Local(local) => &local.attrs,
        Stmt::Macro(mac) => &mac.attrs,
        Stmt::Expr(expr, _) => expr_attrs(expr),
        Stmt::Item(_) => &[],
    }
}

pub fn stmt_attrs_mut(stmt: &mut Stmt) -> Option<&mut Vec<Attribute>> {
    match stmt {
        Stmt::Local(local) => Some(&mut local.attrs),
        Stmt::Macro(mac) => Some(&mut mac.attrs),
        Stmt::Expr(expr, _) => expr_attrs_mut(expr),
        Stmt::Item(_) => None,
    }
}

fn expr_attrs(expr: &Expr) -> &[Attribute] {
    match expr {
        Expr::Block(e) => &e.attrs,
        Expr::Call(e) => &e.attrs,
        Expr::MethodCall(e) => &e.attrs,
        Expr::Macro(e) => &e.attrs,
        Expr::If(e) => &e.attrs,
        Expr::ForLoop(e) => &e.attrs,
        Expr::While(e) => &e.attrs,
        Expr::Loop(e) => &e.attrs,
        Expr::Match(e) => &e.attrs,
        Expr::Unsafe(e) => &e.attrs,
        Expr::Assign(e) => &e.attrs,
        Expr::Try(e) => &e.attrs,
        _ => &[],
    }
}

fn expr_attrs_mut(expr: &mut Expr) -> Option<&mut Vec<Attribute>> {
    match expr {
        Expr::Block(e) => Some(&mut e.attrs),
        Expr::Call(e) => Some(&mut e.attrs),
        Expr::MethodCall(e) => Some(&mut e.attrs),
        Expr::Macro(e) => Some(&mut e.attrs),
        Expr::If(e) => Some(&mut e.attrs),
        Expr::ForLoop(e) => Some(&mut e.attrs),
        Expr::While(e) => Some(&mut e.attrs),
        Expr::Loop(e) => Some(&mut e.attrs),
        Expr::Match(e) => Some(&mut e.attrs),
        Expr::Unsafe(e) => Some(&mut e.attrs),
        Expr::Assign(e) => Some(&mut e.attrs),
        Expr::Try(e) => Some(&mut e.attrs),
        _ => None,
    }
}

/// An empty, unlabeled, attribute-free `{}` statement.
pub fn is_placeholder(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Expr(Expr::Block(block), _) => {
            block.attrs.is_empty() && block.label.is_none() && block.block.stmts.is_empty()
        }
        _ => false,
    }
}

/// Value of a string literal token, or `None` for any other literal.
pub fn literal_str(lit: &Literal) -> Option<String> {
    let tokens = TokenStream::from(TokenTree::Literal(lit.clone()));
    syn::parse2::<syn::LitStr>(tokens).ok().map(|s| s.value())
}

/// Every string literal value in a token stream, recursing into groups.
pub fn string_literals(tokens: &TokenStream, out: &mut Vec<String>) {
    for tree in tokens.clone() {
        match tree {
            TokenTree::Group(group) => string_literals(&group.stream(), out),
            TokenTree::Literal(lit) => {
                if let Some(value) = literal_str(&lit) {
                    out.push(value);
                }
            }
            _ => {}
        }
    }
}

/// Rebuild a token stream, offering every string literal to `replace`.
///
/// `replace` receives the literal's value and span and returns the tokens to
/// put in its place, or `None` to keep the literal. Multi-token replacements
/// are wrapped in parentheses so they stay a single expression.
pub fn map_string_literals<F>(tokens: TokenStream, replace: &mut F) -> TokenStream
where
    F: FnMut(&str, Span) -> Option<TokenStream>,
{
    tokens
        .into_iter()
        .map(|tree| match tree {
            TokenTree::Group(group) => {
                let mut rebuilt = Group::new(group.delimiter(), map_string_literals(group.stream(), replace));
                rebuilt.set_span(group.span());
                TokenTree::Group(rebuilt)
            }
            TokenTree::Literal(lit) => match literal_str(&lit).and_then(|v| replace(&v, lit.span())) {
                Some(replacement) => {
                    let mut trees: Vec<TokenTree> = replacement.into_iter().collect();
                    if trees.len() == 1 {
                        trees.remove(0)
                    } else {
                        TokenTree::Group(Group::new(
                            proc_macro2::Delimiter::Parenthesis,
                            trees.into_iter().collect(),
                        ))
                    }
                }
                None => TokenTree::Literal(lit),
            },
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    #[test]
    fn collects_literals_inside_nested_groups() {
        let tokens = quote!(assert_eq!(res.status, "atgenStatus", { "x": ["y"] }));
        let mut out = Vec::new();
        string_literals(&tokens, &mut out);
        assert_eq!(out, vec!["atgenStatus", "x", "y"]);
    }

    #[test]
    fn replaces_literals_and_parenthesizes_expressions() {
        let tokens = quote!(f("a", "b", 1));
        let rebuilt = map_string_literals(tokens, &mut |value, _| match value {
            "a" => Some(quote!(42)),
            "b" => Some(quote!(x.y())),
            _ => None,
        });
        assert_eq!(rebuilt.to_string(), quote!(f(42, (x.y()), 1)).to_string());
    }

    #[test]
    fn statement_attributes_are_found_on_block_expressions() {
        let stmt: Stmt = syn::parse_quote! {
            #[atgen(test)]
            {
                run();
            }
        };
        assert_eq!(stmt_attrs(&stmt).len(), 1);
    }

    #[test]
    fn only_bare_empty_blocks_are_placeholders() {
        let empty: syn::Block = syn::parse_quote!({ {} });
        assert!(is_placeholder(&empty.stmts[0]));

        let marked: syn::Block = syn::parse_quote!({ #[atgen(test)] {} });
        assert!(!is_placeholder(&marked.stmts[0]));

        let full: syn::Block = syn::parse_quote!({ { run(); } });
        assert!(!is_placeholder(&full.stmts[0]));
    }
}
