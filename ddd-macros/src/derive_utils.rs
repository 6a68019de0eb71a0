use quote::ToTokens;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Attribute, Path, Result, Token};

/// 类型上的派生列表
///
/// 宏从属性中取出全部 `#[derive(..)]`，按需补齐必需的派生，
/// 再合并为一个 `#[derive(..)]` 写回到属性列表最前面。
/// 同名派生按末段标识符判重，`Serialize` 与 `serde::Serialize` 视为同一项。
pub(crate) struct DeriveList {
    paths: Vec<Path>,
}

impl DeriveList {
    /// 移除 attrs 中所有 derive 属性，收集其中的路径
    pub(crate) fn take(attrs: &mut Vec<Attribute>) -> Result<Self> {
        let mut paths = Vec::new();
        let mut rest = Vec::with_capacity(attrs.len());
        for attr in attrs.drain(..) {
            if attr.path().is_ident("derive") {
                paths.extend(parse_paths(&attr)?);
            } else {
                rest.push(attr);
            }
        }
        *attrs = rest;
        Ok(Self { paths })
    }

    /// 只读地收集派生，不改动属性；无法解析的 derive 忽略
    pub(crate) fn peek(attrs: &[Attribute]) -> Self {
        let paths = attrs
            .iter()
            .filter(|attr| attr.path().is_ident("derive"))
            .filter_map(|attr| parse_paths(attr).ok())
            .flatten()
            .collect();
        Self { paths }
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.paths.iter().any(|p| key_of(p) == name)
    }

    pub(crate) fn derives_serde(&self) -> bool {
        self.contains("Serialize") || self.contains("Deserialize")
    }

    /// 必需的派生排在前面，已有的同名派生不再重复
    pub(crate) fn require(&mut self, required: impl IntoIterator<Item = Path>) {
        let mut merged: Vec<Path> = Vec::new();
        for path in required.into_iter().chain(self.paths.drain(..)) {
            let key = key_of(&path);
            if !merged.iter().any(|p| key_of(p) == key) {
                merged.push(path);
            }
        }
        self.paths = merged;
    }

    /// 宏会自行实现的 trait 不允许再出现在派生里
    pub(crate) fn reject(&self, names: &[&str], macro_name: &str) -> Result<()> {
        match self.paths.iter().find(|p| names.contains(&key_of(p).as_str())) {
            Some(path) => Err(syn::Error::new(
                path.span(),
                format!(
                    "{macro_name} implements `{}` itself; remove it from #[derive]",
                    key_of(path)
                ),
            )),
            None => Ok(()),
        }
    }

    /// 以单个 derive 属性写回 attrs 开头；列表为空时不写
    pub(crate) fn write_back(self, attrs: &mut Vec<Attribute>) {
        if self.paths.is_empty() {
            return;
        }
        let paths = self.paths;
        attrs.insert(0, syn::parse_quote!(#[derive(#(#paths),*)]));
    }
}

fn parse_paths(attr: &Attribute) -> Result<Punctuated<Path, Token![,]>> {
    attr.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated)
}

fn key_of(path: &Path) -> String {
    path.segments
        .last()
        .map(|segment| segment.ident.to_string())
        .unwrap_or_else(|| path.to_token_stream().to_string())
}

/// 为 attrs 补齐必需派生，必要时拒绝冲突的派生
pub(crate) fn apply_derives(
    attrs: &mut Vec<Attribute>,
    required: Vec<Path>,
    rejected: &[&str],
    macro_name: &str,
) -> Result<()> {
    let mut derives = DeriveList::take(attrs)?;
    derives.reject(rejected, macro_name)?;
    derives.require(required);
    derives.write_back(attrs);
    Ok(())
}
