use crate::derive_utils::DeriveList;
use crate::field_utils::{add_field_attr, ensure_leading_fields};
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, Type, parse_macro_input};

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Entity,
    AggregateRoot,
}

impl Kind {
    fn attr_name(self) -> &'static str {
        match self {
            Kind::Entity => "#[entity]",
            Kind::AggregateRoot => "#[aggregate_root]",
        }
    }
}

/// #[entity] / #[aggregate_root] 宏实现
/// - 追加字段（若缺失）并置于最前：`id`, `created_on`, `updated_on`；
///   聚合根另追加 `domain_events` 缓冲（结构体派生 serde 时标记 `#[serde(skip)]`）
/// - 实现 `::ddd_domain::entity::Entity`，聚合根另实现 `AggregateRoot`
/// - 不改动已有 derive
pub(crate) fn expand(attr: TokenStream, item: TokenStream, kind: Kind) -> TokenStream {
    if !attr.is_empty() {
        let attr = proc_macro2::TokenStream::from(attr);
        return syn::Error::new(attr.span(), format!("{} takes no arguments", kind.attr_name()))
            .to_compile_error()
            .into();
    }

    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), format!("{} only on struct", kind.attr_name()))
                .to_compile_error()
                .into();
        }
    };

    let with_serde = DeriveList::peek(&st.attrs).derives_serde();

    // 仅支持具名字段结构体
    let fields_named = match &mut st.fields {
        syn::Fields::Named(f) => f,
        _ => {
            return syn::Error::new(st.span(), "only supports named-field struct")
                .to_compile_error()
                .into();
        }
    };

    let id_ty: Type = syn::parse_quote! { ::ddd_domain::entity_id::EntityId };
    let created_ty: Type =
        syn::parse_quote! { ::ddd_domain::chrono::DateTime<::ddd_domain::chrono::Utc> };
    let updated_ty: Type = syn::parse_quote! {
        ::std::option::Option<::ddd_domain::chrono::DateTime<::ddd_domain::chrono::Utc>>
    };
    let mut required = vec![
        ("id", id_ty),
        ("created_on", created_ty),
        ("updated_on", updated_ty),
    ];
    if kind == Kind::AggregateRoot {
        required.push((
            "domain_events",
            syn::parse_quote! { ::ddd_domain::domain_event::DomainEvents },
        ));
    }
    ensure_leading_fields(fields_named, &required);

    if kind == Kind::AggregateRoot && with_serde {
        add_field_attr(fields_named, "domain_events", syn::parse_quote!(#[serde(skip)]));
    }

    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let aggregate = (kind == Kind::AggregateRoot).then(|| {
        quote! {
            impl #impl_generics ::ddd_domain::aggregate_root::AggregateRoot for #ident #ty_generics #where_clause {
                fn domain_events(&self) -> &::ddd_domain::domain_event::DomainEvents {
                    &self.domain_events
                }

                fn domain_events_mut(&mut self) -> &mut ::ddd_domain::domain_event::DomainEvents {
                    &mut self.domain_events
                }
            }
        }
    });

    let as_aggregate = (kind == Kind::AggregateRoot).then(|| {
        quote! {
            fn as_aggregate_root_mut(
                &mut self,
            ) -> ::std::option::Option<&mut dyn ::ddd_domain::aggregate_root::AggregateRoot> {
                ::std::option::Option::Some(self)
            }
        }
    });

    let expanded = quote! {
        #st

        impl #impl_generics ::ddd_domain::entity::Entity for #ident #ty_generics #where_clause {
            fn id(&self) -> &::ddd_domain::entity_id::EntityId {
                &self.id
            }

            fn created_on(&self) -> ::ddd_domain::chrono::DateTime<::ddd_domain::chrono::Utc> {
                self.created_on
            }

            fn updated_on(
                &self,
            ) -> ::std::option::Option<::ddd_domain::chrono::DateTime<::ddd_domain::chrono::Utc>> {
                self.updated_on
            }

            fn set_created_on(&mut self, at: ::ddd_domain::chrono::DateTime<::ddd_domain::chrono::Utc>) {
                self.created_on = at;
            }

            fn set_updated_on(&mut self, at: ::ddd_domain::chrono::DateTime<::ddd_domain::chrono::Utc>) {
                self.updated_on = ::std::option::Option::Some(at);
            }

            #as_aggregate
        }

        #aggregate
    };

    TokenStream::from(expanded)
}
