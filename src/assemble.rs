//! Splices generated functions into a copy of the template file.

use syn::visit_mut::{self, VisitMut};
use syn::{File, Item, ItemFn, Stmt};

use crate::imports::ImportSet;
use crate::syntax;
use crate::template::{Template, strip_markers};

/// Build one output file from the template and the generated functions.
///
/// Functions keep their given order and go before the template's first `fn`
/// item, counting the skeleton itself, which is then removed.
pub fn assemble(template: &Template, functions: Vec<ItemFn>, imports: &ImportSet) -> File {
    let mut file = template.file().clone();

    // The skeleton is an `fn`, so `at` never lies past it.
    let skeleton = template.function_item();
    let at = file
        .items
        .iter()
        .position(|item| matches!(item, Item::Fn(_)))
        .unwrap_or(skeleton);
    file.items.remove(skeleton);
    file.items.splice(at..at, functions.into_iter().map(Item::Fn));

    MarkerPruner.visit_file_mut(&mut file);
    imports.apply(&mut file);
    file
}

/// Drops region markers wherever they are left.
struct MarkerPruner;

impl VisitMut for MarkerPruner {
    fn visit_item_mut(&mut self, item: &mut Item) {
        let attrs = match item {
            Item::Fn(i) => Some(&mut i.attrs),
            Item::Const(i) => Some(&mut i.attrs),
            Item::Static(i) => Some(&mut i.attrs),
            Item::Struct(i) => Some(&mut i.attrs),
            Item::Enum(i) => Some(&mut i.attrs),
            Item::Impl(i) => Some(&mut i.attrs),
            Item::Mod(i) => Some(&mut i.attrs),
            Item::Use(i) => Some(&mut i.attrs),
            Item::Type(i) => Some(&mut i.attrs),
            Item::Macro(i) => Some(&mut i.attrs),
            _ => None,
        };
        if let Some(attrs) = attrs {
            strip_markers(attrs);
        }
        visit_mut::visit_item_mut(self, item);
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        if let Some(attrs) = syntax::stmt_attrs_mut(stmt) {
            strip_markers(attrs);
        }
        visit_mut::visit_stmt_mut(self, stmt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::ToTokens;

    const TEMPLATE: &str = r#"
use serde_json::json;

/// Atgen TestFunc block
#[test]
fn atgen_test_func() {
    let router = atgen_router_func();
    {}
    #[atgen(test)]
    {
        let body = atgen_request_body();
        check(&router, "AtgenMethod", "AtgenPath", "atgenStatus", body);
    }
}

fn check(router: &Router, method: &str, path: &str, status: u16, body: Vec<u8>) {}
"#;

    fn names(file: &File) -> Vec<String> {
        file.items
            .iter()
            .filter_map(|item| match item {
                Item::Fn(f) => Some(f.sig.ident.to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn functions_replace_the_skeleton_in_order() {
        let template = Template::parse(TEMPLATE).unwrap();
        let a: ItemFn = syn::parse_quote!(fn first() {});
        let b: ItemFn = syn::parse_quote!(fn second() {});
        let file = assemble(&template, vec![a, b], &ImportSet::new());
        assert_eq!(names(&file), vec!["first", "second", "check"]);
    }

    #[test]
    fn functions_take_the_place_of_a_leading_skeleton() {
        let src = r#"
use serde_json::json;

#[atgen(test_func)]
fn skel() {
    let router = atgen_router_func();
    {}
}

struct Helper;

fn helper() {}
"#;
        let template = Template::parse(src).unwrap();
        let generated: ItemFn = syn::parse_quote!(fn generated() {});
        let file = assemble(&template, vec![generated], &ImportSet::new());

        let order: Vec<String> = file
            .items
            .iter()
            .map(|item| match item {
                Item::Use(_) => "use".to_string(),
                Item::Fn(f) => f.sig.ident.to_string(),
                Item::Struct(s) => s.ident.to_string(),
                _ => "other".to_string(),
            })
            .collect();
        assert_eq!(order, vec!["use", "generated", "Helper", "helper"]);
    }

    #[test]
    fn markers_do_not_survive() {
        let template = Template::parse(TEMPLATE).unwrap();
        let marked: ItemFn = syn::parse_quote! {
            #[atgen(test_func)]
            fn leftover() {
                #[atgen(test)]
                {}
            }
        };
        let file = assemble(&template, vec![marked], &ImportSet::new());
        let out = file.into_token_stream().to_string();
        assert!(!out.contains("atgen ("), "{out}");
        assert!(!out.contains("Atgen TestFunc block"));
    }

    #[test]
    fn template_is_not_consumed() {
        let template = Template::parse(TEMPLATE).unwrap();
        let _ = assemble(&template, vec![], &ImportSet::new());
        assert_eq!(names(template.file()), vec!["atgen_test_func", "check"]);
    }

    #[test]
    fn imports_are_merged() {
        let template = Template::parse(TEMPLATE).unwrap();
        let mut imports = ImportSet::new();
        imports.insert("my_app::routes");
        imports.insert("serde_json::json");
        let file = assemble(&template, vec![], &imports);
        let uses = file.items.iter().filter(|i| matches!(i, Item::Use(_))).count();
        assert_eq!(uses, 2);
    }
}
