//! Literal skeletons and their call-site identity.

use std::cell::RefCell;

use crate::collections::map::HashMap;

/// Identity of one template call site: the address of its static skeleton.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct SkeletonKey(usize);

/// The literal text segments of one template call site. `N` arguments are
/// interleaved between `N + 1` segments.
///
/// Skeletons are declared `static` (the `template!` macro does this), so the
/// address is stable and doubles as the call-site key.
#[derive(Debug)]
pub struct Skeleton {
    parts: &'static [&'static str],
}

thread_local! {
    static INTERNED: RefCell<HashMap<Vec<String>, &'static Skeleton>> =
        RefCell::new(HashMap::default());
}

impl Skeleton {
    pub const fn new(parts: &'static [&'static str]) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &'static [&'static str] {
        self.parts
    }

    /// Number of arguments a call must supply.
    pub fn arity(&self) -> usize {
        self.parts.len().saturating_sub(1)
    }

    pub fn key(&'static self) -> SkeletonKey {
        SkeletonKey(self as *const Skeleton as usize)
    }

    /// Skeleton for segments only known at runtime. Equal segment lists share
    /// one leaked skeleton, so the result is a stable call-site key.
    pub fn intern(parts: Vec<String>) -> &'static Skeleton {
        INTERNED.with(|interned| {
            let mut interned = interned.borrow_mut();
            if let Some(existing) = interned.get(&parts) {
                return *existing;
            }
            let leaked: Vec<&'static str> = parts
                .iter()
                .map(|part| &*Box::leak(part.clone().into_boxed_str()))
                .collect();
            let skeleton: &'static Skeleton = Box::leak(Box::new(Skeleton {
                parts: Box::leak(leaked.into_boxed_slice()),
            }));
            interned.insert(parts, skeleton);
            skeleton
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static FIRST: Skeleton = Skeleton::new(&["<p>", "</p>"]);
    static SECOND: Skeleton = Skeleton::new(&["<p>", "</p>"]);

    #[test]
    fn equal_text_at_two_sites_has_two_keys() {
        assert_ne!(FIRST.key(), SECOND.key());
        assert_eq!(FIRST.key(), FIRST.key());
        assert_eq!(FIRST.arity(), 1);
    }

    #[test]
    fn interned_skeletons_are_shared_by_content() {
        let a = Skeleton::intern(vec!["<b ".into(), "></b>".into()]);
        let b = Skeleton::intern(vec!["<b ".into(), "></b>".into()]);
        let c = Skeleton::intern(vec!["<i ".into(), "></i>".into()]);
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }
}
