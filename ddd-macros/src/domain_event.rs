use crate::derive_utils::apply_derives;
use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Expr, Ident, Item, Result, Token, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[domain_event] 宏实现
/// - 支持结构体与枚举，载荷字段不做改动
/// - 合并/追加派生：Debug, Clone
/// - 生成 `::ddd_domain::domain_event::DomainEvent` 实现
/// - 支持：`#[domain_event(name = "...")]` 覆写事件类型名（默认取 Rust 类型名）
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EventAttrConfig);
    let mut input = parse_macro_input!(item as Item);

    let required: Vec<syn::Path> = vec![syn::parse_quote!(Debug), syn::parse_quote!(Clone)];

    let derived = match &mut input {
        Item::Struct(st) => apply_derives(&mut st.attrs, required, &[], "#[domain_event]")
            .map(|()| (st.ident.clone(), st.generics.clone())),
        Item::Enum(en) => apply_derives(&mut en.attrs, required, &[], "#[domain_event]")
            .map(|()| (en.ident.clone(), en.generics.clone())),
        other => {
            return syn::Error::new(
                other.span(),
                "#[domain_event] only supports struct or enum",
            )
            .to_compile_error()
            .into();
        }
    };
    let (ident, generics) = match derived {
        Ok(parts) => parts,
        Err(err) => return err.to_compile_error().into(),
    };

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let event_type = cfg.name.map(|lit| {
        quote! {
            fn event_type(&self) -> &'static str {
                #lit
            }
        }
    });

    TokenStream::from(quote! {
        #input

        impl #impl_generics ::ddd_domain::domain_event::DomainEvent for #ident #ty_generics #where_clause {
            #event_type
        }
    })
}

// -------- parsing --------

// 解析键值参数：name = "..."
struct EventAttrConfig {
    name: Option<syn::LitStr>,
}

impl Parse for EventAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut name: Option<syn::LitStr> = None;

        if input.is_empty() {
            return Ok(Self { name });
        }

        let pairs: Punctuated<EventAttrKv, Token![,]> =
            Punctuated::<EventAttrKv, Token![,]>::parse_terminated(input)?;

        for kv in pairs {
            match kv.key.to_string().as_str() {
                "name" => {
                    if name.is_some() {
                        return Err(syn::Error::new(
                            kv.key.span(),
                            "duplicate key 'name' in attribute",
                        ));
                    }
                    let lit = match kv.value {
                        Expr::Lit(syn::ExprLit {
                            lit: syn::Lit::Str(lit),
                            ..
                        }) => lit,
                        other => {
                            return Err(syn::Error::new(
                                other.span(),
                                "expected string literal for 'name'",
                            ));
                        }
                    };
                    name = Some(lit);
                }
                _ => {
                    return Err(syn::Error::new(
                        kv.key.span(),
                        "unknown key; expected 'name'",
                    ));
                }
            }
        }

        Ok(Self { name })
    }
}

struct EventAttrKv {
    key: Ident,
    value: Expr,
}

impl Parse for EventAttrKv {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        let value: Expr = input.parse()?;
        Ok(Self { key, value })
    }
}
