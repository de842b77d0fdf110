//! Build configuration filter
//!
//! Evaluates `#[cfg(..)]` attributes against a set of active tags so that only
//! declarations reachable under the current configuration are extracted.

use std::collections::BTreeSet;
use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, Lit, Meta, Token};

/// Active build configuration tags
///
/// A tag is either a bare flag (`desktop`) or a `key=value` pair
/// (`feature=qml`). Quotes around the value are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CfgSet {
    flags: BTreeSet<String>,
    values: BTreeSet<(String, String)>,
}

impl CfgSet {
    /// Create an empty set (every predicate that needs a tag is false)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from tag strings
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for tag in tags {
            set.insert(tag.as_ref());
        }
        set
    }

    /// Add a tag
    pub fn insert(&mut self, tag: &str) {
        let tag = tag.trim();
        if tag.is_empty() {
            return;
        }

        match tag.split_once('=') {
            Some((key, value)) => {
                let value = value.trim().trim_matches('"');
                self.values.insert((key.trim().to_string(), value.to_string()));
            }
            None => {
                self.flags.insert(tag.to_string());
            }
        }
    }

    /// Check a bare flag
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    /// Check a `key = "value"` pair
    pub fn has_value(&self, key: &str, value: &str) -> bool {
        self.values.contains(&(key.to_string(), value.to_string()))
    }

    /// Whether an item carrying these attributes is active
    ///
    /// All `cfg` attributes must hold. Attributes other than `cfg` are ignored.
    pub fn is_enabled(&self, attrs: &[Attribute]) -> bool {
        attrs
            .iter()
            .filter(|attr| attr.path().is_ident("cfg"))
            .all(|attr| match &attr.meta {
                Meta::List(list) => match list.parse_args::<Meta>() {
                    Ok(predicate) => self.eval(&predicate),
                    Err(_) => false,
                },
                _ => false,
            })
    }

    /// Evaluate a single cfg predicate
    pub fn eval(&self, meta: &Meta) -> bool {
        match meta {
            Meta::Path(path) => path
                .get_ident()
                .is_some_and(|ident| self.has_flag(&ident.to_string())),
            Meta::NameValue(nv) => {
                let Some(key) = nv.path.get_ident() else {
                    return false;
                };
                match &nv.value {
                    Expr::Lit(expr) => match &expr.lit {
                        Lit::Str(value) => self.has_value(&key.to_string(), &value.value()),
                        _ => false,
                    },
                    _ => false,
                }
            }
            Meta::List(list) => {
                let Ok(nested) = list.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated) else {
                    return false;
                };

                if list.path.is_ident("all") {
                    nested.iter().all(|m| self.eval(m))
                } else if list.path.is_ident("any") {
                    nested.iter().any(|m| self.eval(m))
                } else if list.path.is_ident("not") {
                    nested.len() == 1 && !self.eval(&nested[0])
                } else {
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn enabled(set: &CfgSet, attr: Attribute) -> bool {
        set.is_enabled(&[attr])
    }

    #[test]
    fn test_flags_and_values() {
        let set = CfgSet::from_tags(["desktop", "feature=\"qml\"", "target_os=linux"]);
        assert!(set.has_flag("desktop"));
        assert!(set.has_value("feature", "qml"));
        assert!(set.has_value("target_os", "linux"));

        assert!(enabled(&set, parse_quote!(#[cfg(desktop)])));
        assert!(enabled(&set, parse_quote!(#[cfg(feature = "qml")])));
        assert!(!enabled(&set, parse_quote!(#[cfg(mobile)])));
        assert!(!enabled(&set, parse_quote!(#[cfg(feature = "widgets")])));
    }

    #[test]
    fn test_combinators() {
        let set = CfgSet::from_tags(["desktop"]);
        assert!(enabled(&set, parse_quote!(#[cfg(all(desktop, not(mobile)))])));
        assert!(enabled(&set, parse_quote!(#[cfg(any(mobile, desktop))])));
        assert!(!enabled(&set, parse_quote!(#[cfg(all(desktop, mobile))])));
        assert!(!enabled(&set, parse_quote!(#[cfg(not(desktop))])));
        assert!(enabled(&set, parse_quote!(#[cfg(all())])));
        assert!(!enabled(&set, parse_quote!(#[cfg(any())])));
    }

    #[test]
    fn test_non_cfg_attributes_ignored() {
        let set = CfgSet::new();
        let attrs: Vec<Attribute> = vec![parse_quote!(#[derive(Default)]), parse_quote!(#[doc = "x"])];
        assert!(set.is_enabled(&attrs));
        assert!(!enabled(&set, parse_quote!(#[cfg(test)])));
    }
}
