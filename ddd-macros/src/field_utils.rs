use proc_macro2::Span;
use syn::{Field, FieldsNamed, Ident, Token, Type, punctuated::Punctuated};

/// 确保具名字段结构体包含所需字段，并按给定顺序置于最前
/// - 已存在的同名字段复用原定义（保留其属性与可见性）；
/// - 其余字段保持原有相对顺序。
pub(crate) fn ensure_leading_fields(fields_named: &mut FieldsNamed, required: &[(&str, Type)]) {
    let old_named = fields_named.named.clone();
    let mut new_named: Punctuated<Field, Token![,]> = Punctuated::new();

    for (name, ty) in required {
        match old_named.iter().find(|f| is_named(f, name)) {
            Some(existing) => new_named.push(existing.clone()),
            None => {
                let ident = Ident::new(name, Span::call_site());
                new_named.push(syn::parse_quote! { #ident: #ty });
            }
        }
    }

    for f in old_named {
        if !required.iter().any(|(name, _)| is_named(&f, name)) {
            new_named.push(f);
        }
    }

    fields_named.named = new_named;
}

/// 为指定字段追加属性（若字段存在）
pub(crate) fn add_field_attr(fields_named: &mut FieldsNamed, name: &str, attr: syn::Attribute) {
    if let Some(field) = fields_named.named.iter_mut().find(|f| is_named(f, name)) {
        field.attrs.push(attr);
    }
}

fn is_named(field: &Field, name: &str) -> bool {
    field.ident.as_ref().is_some_and(|i| i == name)
}
