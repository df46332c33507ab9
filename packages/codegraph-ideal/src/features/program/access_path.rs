/*
 * Access paths
 *
 * The tracked fact of the reference program model: a base followed by a
 * (bounded) list of field names.
 *
 *   a          local `a`
 *   a.f.g      field `g` of field `f` of `a`
 *   Holder::f  static field `f` of class `Holder`
 *   <zero>     the ZERO fact
 *
 * Field lists are k-limited to MAX_FIELD_DEPTH; appending past the limit
 * truncates, which over-approximates the set of reachable objects.
 */

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::ideal::domain::DataflowFact;

/// Maximum number of fields kept on a path
pub const MAX_FIELD_DEPTH: usize = 3;

/// Root of an access path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PathBase {
    Zero,
    Local(String),
    Static(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccessPath {
    base: PathBase,
    fields: Vec<String>,
}

impl AccessPath {
    pub fn zero() -> Self {
        Self {
            base: PathBase::Zero,
            fields: Vec::new(),
        }
    }

    pub fn local(name: impl Into<String>) -> Self {
        Self {
            base: PathBase::Local(name.into()),
            fields: Vec::new(),
        }
    }

    /// `class::field`
    pub fn static_field(class: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            base: PathBase::Static(class.into()),
            fields: vec![field.into()],
        }
    }

    pub fn base(&self) -> &PathBase {
        &self.base
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Local variable the path starts at, if any
    pub fn local_name(&self) -> Option<&str> {
        match &self.base {
            PathBase::Local(name) => Some(name),
            _ => None,
        }
    }

    /// Path starts at local `var`
    pub fn is_rooted_at(&self, var: &str) -> bool {
        self.local_name() == Some(var)
    }

    /// Exactly the local `var`, no fields
    pub fn is_local(&self, var: &str) -> bool {
        self.is_rooted_at(var) && self.fields.is_empty()
    }

    /// `var.field...`: rooted at `var` with `field` as first field
    pub fn starts_with_field(&self, var: &str, field: &str) -> bool {
        self.is_rooted_at(var) && self.fields.first().map(String::as_str) == Some(field)
    }

    /// Same fields on a different local
    pub fn with_base(&self, var: impl Into<String>) -> Self {
        Self {
            base: PathBase::Local(var.into()),
            fields: self.fields.clone(),
        }
    }

    /// `prefix.field` followed by this path's fields
    pub fn prepend_field(&self, var: impl Into<String>, field: impl Into<String>) -> Self {
        let mut fields = Vec::with_capacity(self.fields.len() + 1);
        fields.push(field.into());
        fields.extend(self.fields.iter().cloned());
        fields.truncate(MAX_FIELD_DEPTH);
        Self {
            base: PathBase::Local(var.into()),
            fields,
        }
    }

    /// Drop the first field and move to local `var`
    pub fn strip_first_field(&self, var: impl Into<String>) -> Self {
        Self {
            base: PathBase::Local(var.into()),
            fields: self.fields.iter().skip(1).cloned().collect(),
        }
    }

    pub fn append_field(&self, field: impl Into<String>) -> Self {
        let mut fields = self.fields.clone();
        if fields.len() < MAX_FIELD_DEPTH {
            fields.push(field.into());
        }
        Self {
            base: self.base.clone(),
            fields,
        }
    }
}

impl DataflowFact for AccessPath {
    fn zero() -> Self {
        AccessPath::zero()
    }

    fn is_zero(&self) -> bool {
        self.base == PathBase::Zero
    }

    fn contains_static_field(&self) -> bool {
        matches!(self.base, PathBase::Static(_))
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            PathBase::Zero => return write!(f, "<zero>"),
            PathBase::Local(name) => write!(f, "{}", name)?,
            PathBase::Static(class) => {
                write!(f, "{}::", class)?;
                return write!(f, "{}", self.fields.join("."));
            }
        }
        for field in &self.fields {
            write!(f, ".{}", field)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(AccessPath::zero().to_string(), "<zero>");
        assert_eq!(AccessPath::local("a").to_string(), "a");
        assert_eq!(
            AccessPath::local("a").append_field("f").append_field("g").to_string(),
            "a.f.g"
        );
        assert_eq!(AccessPath::static_field("Holder", "f").to_string(), "Holder::f");
    }

    #[test]
    fn test_zero_and_static() {
        assert!(AccessPath::zero().is_zero());
        assert!(!AccessPath::local("a").is_zero());
        assert!(AccessPath::static_field("Holder", "f").contains_static_field());
        assert!(!AccessPath::local("a").contains_static_field());
    }

    #[test]
    fn test_rooting() {
        let path = AccessPath::local("h").append_field("f");
        assert!(path.is_rooted_at("h"));
        assert!(!path.is_local("h"));
        assert!(path.starts_with_field("h", "f"));
        assert!(!path.starts_with_field("h", "g"));
        assert_eq!(path.strip_first_field("x"), AccessPath::local("x"));
        assert_eq!(path.with_base("k").to_string(), "k.f");
    }

    #[test]
    fn test_field_depth_is_bounded() {
        let mut path = AccessPath::local("a");
        for i in 0..10 {
            path = path.append_field(format!("f{}", i));
        }
        assert_eq!(path.fields().len(), MAX_FIELD_DEPTH);

        let deep = AccessPath::local("x").prepend_field("h", "g");
        assert_eq!(deep.to_string(), "h.g");
        let deeper = path.prepend_field("h", "g");
        assert_eq!(deeper.fields().len(), MAX_FIELD_DEPTH);
        assert_eq!(deeper.fields()[0], "g");
    }
}
