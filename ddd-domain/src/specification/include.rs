//! 预加载（Include）
//!
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

/// 带类型检查的导航预加载
///
/// 选择器只用于在编译期确认导航属性确实存在于 `T` 上，运行时仅保留路径。
///
/// ```
/// use ddd_domain::specification::Include;
///
/// struct Order {
///     lines: Vec<u32>,
/// }
///
/// let inc = Include::of("lines", |o: &Order| &o.lines);
/// assert_eq!(inc.path(), "lines");
/// ```
pub struct Include<T> {
    path: &'static str,
    target: &'static str,
    _owner: PhantomData<fn(&T)>,
}

impl<T> Include<T> {
    pub fn of<N>(path: &'static str, _selector: fn(&T) -> &N) -> Self
    where
        N: ?Sized,
    {
        Self {
            path,
            target: type_name::<N>(),
            _owner: PhantomData,
        }
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    /// 导航目标的类型名
    pub fn target(&self) -> &'static str {
        self.target
    }
}

impl<T> Clone for Include<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Include<T> {}

impl<T> fmt::Debug for Include<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Include")
            .field("path", &self.path)
            .field("target", &self.target)
            .finish()
    }
}
