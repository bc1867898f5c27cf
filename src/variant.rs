//! The search contract and the table of registered variants.

use std::fmt;

use crate::backends::{branching_search, branchless_prefetch_search, branchless_search};
use crate::quaternary::{quaternary_search, quaternary_search_pipelined, quaternary_search_portable};
use crate::scalar::binary_search_reference;

/// Signature shared by every built-in search function.
///
/// The slice carries the element count. The result is an index in
/// `[0, values.len())` or [`NOT_FOUND`](crate::NOT_FOUND).
pub type SearchFn = fn(&[i64], i64) -> i64;

/// A strategy for locating a key in a strictly ascending slice.
///
/// Implementations must be pure: the result depends only on `(values, key)`.
pub trait SearchVariant {
    /// Stable name used in logs, report headers and `--variant` filters.
    fn name(&self) -> &str;

    fn search(&self, values: &[i64], key: i64) -> i64;
}

/// A named search function.
#[derive(Clone, Copy)]
pub struct FnVariant {
    name: &'static str,
    func: SearchFn,
}

impl FnVariant {
    pub const fn new(name: &'static str, func: SearchFn) -> Self {
        Self { name, func }
    }
}

impl SearchVariant for FnVariant {
    fn name(&self) -> &str {
        self.name
    }

    #[inline]
    fn search(&self, values: &[i64], key: i64) -> i64 {
        (self.func)(values, key)
    }
}

impl fmt::Debug for FnVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnVariant").field(&self.name).finish()
    }
}

/// Built-in variants, in report order.
pub const BUILTIN_VARIANTS: &[FnVariant] = &[
    FnVariant::new("reference", binary_search_reference),
    FnVariant::new("branching", branching_search),
    FnVariant::new("branchless", branchless_search),
    FnVariant::new("branchless_prefetch", branchless_prefetch_search),
    FnVariant::new("quaternary", quaternary_search),
    FnVariant::new("quaternary_pipelined", quaternary_search_pipelined),
    FnVariant::new("quaternary_portable", quaternary_search_portable),
];

/// Ordered collection of variants under test.
///
/// Registration order is the column order of every report.
#[derive(Default)]
pub struct Registry {
    variants: Vec<Box<dyn SearchVariant>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding [`BUILTIN_VARIANTS`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for &variant in BUILTIN_VARIANTS {
            registry.register(variant);
        }
        registry
    }

    pub fn register<V: SearchVariant + 'static>(&mut self, variant: V) {
        self.variants.push(Box::new(variant));
    }

    /// Keeps only the variants whose name appears in `names`.
    pub fn retain_named(&mut self, names: &[String]) {
        self.variants
            .retain(|variant| names.iter().any(|name| name == variant.name()));
    }

    pub fn get(&self, name: &str) -> Option<&dyn SearchVariant> {
        self.iter().find(|variant| variant.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn SearchVariant> {
        self.variants.iter().map(|variant| variant.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|variant| variant.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}
