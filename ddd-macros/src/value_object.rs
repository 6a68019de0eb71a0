use crate::derive_utils::apply_derives;
use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Item, Result, Token, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[value_object] 宏实现
/// - 支持结构体（具名或 tuple）与枚举
/// - 合并/追加派生：Clone, (Debug 可控), Serialize, Deserialize
/// - 结构体：按字段声明顺序生成相等分量（`#[value_object(skip)]` 的字段除外），
///   并以分量实现 `PartialEq`/`Eq`/`Hash`，因此不接受这三者出现在 `#[derive]` 中
/// - 枚举：派生 `PartialEq`/`Eq`/`Hash`，整个值作为唯一分量
/// - 参数：`#[value_object(debug = true|false)]`，默认 true
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as ValueObjectAttrConfig);
    let mut input = parse_macro_input!(item as Item);

    let mut required: Vec<syn::Path> = vec![
        syn::parse_quote!(Clone),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];

    if cfg.derive_debug.unwrap_or(true) {
        required.insert(0, syn::parse_quote!(Debug));
    }

    match &mut input {
        Item::Struct(st) => {
            if let Err(err) = apply_derives(
                &mut st.attrs,
                required,
                &["PartialEq", "Eq", "Hash"],
                "#[value_object]",
            ) {
                return err.to_compile_error().into();
            }

            let mut components = Vec::new();
            for (index, field) in st.fields.iter_mut().enumerate() {
                let skip = match take_skip_attr(&mut field.attrs) {
                    Ok(skip) => skip,
                    Err(err) => return err.to_compile_error().into(),
                };
                if skip {
                    continue;
                }
                let member = match &field.ident {
                    Some(ident) => quote! { #ident },
                    None => {
                        let index = syn::Index::from(index);
                        quote! { #index }
                    }
                };
                components.push(quote! {
                    &self.#member as &dyn ::ddd_domain::value_object::EqualityComponent
                });
            }

            let ident = &st.ident;
            let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

            TokenStream::from(quote! {
                #st

                impl #impl_generics ::ddd_domain::value_object::ValueObject for #ident #ty_generics #where_clause {
                    fn equality_components(
                        &self,
                    ) -> ::std::vec::Vec<&dyn ::ddd_domain::value_object::EqualityComponent> {
                        ::std::vec![#(#components),*]
                    }
                }

                impl #impl_generics ::std::cmp::PartialEq for #ident #ty_generics #where_clause {
                    fn eq(&self, other: &Self) -> bool {
                        ::ddd_domain::value_object::value_objects_equal(self, other)
                    }
                }

                impl #impl_generics ::std::cmp::Eq for #ident #ty_generics #where_clause {}

                impl #impl_generics ::std::hash::Hash for #ident #ty_generics #where_clause {
                    fn hash<__H: ::std::hash::Hasher>(&self, state: &mut __H) {
                        state.write_u64(::ddd_domain::value_object::value_object_hash(self));
                    }
                }
            })
        }
        Item::Enum(en) => {
            required.extend([
                syn::parse_quote!(PartialEq),
                syn::parse_quote!(Eq),
                syn::parse_quote!(Hash),
            ]);
            if let Err(err) = apply_derives(&mut en.attrs, required, &[], "#[value_object]") {
                return err.to_compile_error().into();
            }

            let ident = &en.ident;
            let (impl_generics, ty_generics, where_clause) = en.generics.split_for_impl();

            TokenStream::from(quote! {
                #en

                impl #impl_generics ::ddd_domain::value_object::ValueObject for #ident #ty_generics #where_clause {
                    fn equality_components(
                        &self,
                    ) -> ::std::vec::Vec<&dyn ::ddd_domain::value_object::EqualityComponent> {
                        ::std::vec![self as &dyn ::ddd_domain::value_object::EqualityComponent]
                    }
                }
            })
        }
        other => syn::Error::new(other.span(), "#[value_object] only supports struct or enum")
            .to_compile_error()
            .into(),
    }
}

// 移除字段上的 #[value_object(skip)]，返回是否存在
fn take_skip_attr(attrs: &mut Vec<syn::Attribute>) -> Result<bool> {
    let mut skip = false;
    let mut retained = Vec::with_capacity(attrs.len());
    for attr in attrs.drain(..) {
        if attr.path().is_ident("value_object") {
            let key: syn::Ident = attr.parse_args()?;
            if key != "skip" {
                return Err(syn::Error::new(key.span(), "unknown field option; expected 'skip'"));
            }
            skip = true;
        } else {
            retained.push(attr);
        }
    }
    *attrs = retained;
    Ok(skip)
}

// -------- parsing --------

struct ValueObjectAttrConfig {
    derive_debug: Option<bool>,
}

impl Parse for ValueObjectAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        if input.is_empty() {
            return Ok(Self { derive_debug: None });
        }

        let mut derive_debug: Option<bool> = None;
        let pairs: Punctuated<ValueObjectAttrElem, Token![,]> =
            Punctuated::parse_terminated(input)?;

        for elem in pairs {
            match elem {
                ValueObjectAttrElem::Debug(b) => {
                    if derive_debug.is_some() {
                        return Err(syn::Error::new(
                            proc_macro2::Span::call_site(),
                            "duplicate key 'debug' in attribute",
                        ));
                    }
                    derive_debug = Some(b);
                }
            }
        }
        Ok(Self { derive_debug })
    }
}

enum ValueObjectAttrElem {
    Debug(bool),
}

impl Parse for ValueObjectAttrElem {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: syn::Ident = input.parse()?;
        if key == "debug" {
            let _eq: Token![=] = input.parse()?;
            let expr: syn::Expr = input.parse()?;
            match expr {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Bool(b),
                    ..
                }) => Ok(Self::Debug(b.value())),
                other => Err(syn::Error::new(
                    other.span(),
                    "expected boolean literal for 'debug'",
                )),
            }
        } else {
            Err(syn::Error::new(
                key.span(),
                "unknown key in attribute; expected 'debug'",
            ))
        }
    }
}
