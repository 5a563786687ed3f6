use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Attribute value with one renderer per variant.
///
/// `Text` is quoted and escaped on output, `Html` is wrapped in angle
/// brackets unescaped, `Literal` is emitted exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Text(String),
    Html(String),
    Literal(String),
}

impl AttrValue {
    /// Verbatim markup, rendered as `<value>` without escaping.
    pub fn html(value: impl Into<String>) -> Self {
        Self::Html(value.into())
    }

    /// Raw text emitted with no quoting at all; the caller is responsible
    /// for producing something the output language accepts.
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// The generic text form, regardless of variant.
    pub fn display(&self) -> &str {
        match self {
            Self::Text(value) | Self::Html(value) | Self::Literal(value) => value,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for AttrValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

macro_rules! attr_value_from_display {
    ($($ty:ty),*) => {
        $(impl From<$ty> for AttrValue {
            fn from(value: $ty) -> Self {
                Self::Text(value.to_string())
            }
        })*
    };
}

attr_value_from_display!(bool, i32, i64, u32, u64, usize, f32, f64);

/// Shared attribute store decorating every graph entity.
///
/// Clones share the same backing map, so a handle copied around keeps
/// observing (and contributing) the same attributes.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    entries: Rc<RefCell<BTreeMap<String, AttrValue>>>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute. Setting an empty name is a no-op, and so is
    /// setting an empty plain-text value: defaults seeded at creation time
    /// (a node's `label = id`) survive being re-applied with blank input.
    pub fn set(&self, name: &str, value: impl Into<AttrValue>) {
        if name.is_empty() {
            return;
        }
        let value = value.into();
        if matches!(&value, AttrValue::Text(text) if text.is_empty()) {
            return;
        }
        self.entries.borrow_mut().insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<AttrValue> {
        self.entries.borrow().get(name).cloned()
    }

    /// Removes a key outright regardless of value kind.
    pub fn delete(&self, name: &str) -> bool {
        self.entries.borrow_mut().remove(name).is_some()
    }

    /// Detached copy of the current entries, sorted by name.
    pub fn to_map(&self) -> BTreeMap<String, AttrValue> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Copy with a fresh backing store, for `Graph::deep_copy`.
    pub(crate) fn detached_clone(&self) -> Self {
        Self {
            entries: Rc::new(RefCell::new(self.to_map())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_is_ignored() {
        let attrs = Attributes::new();
        attrs.set("", "value");
        assert!(attrs.is_empty());
    }

    #[test]
    fn empty_text_preserves_existing_value() {
        let attrs = Attributes::new();
        attrs.set("label", "kept");
        attrs.set("label", "");
        assert_eq!(attrs.get("label"), Some(AttrValue::Text("kept".into())));
    }

    #[test]
    fn delete_removes_any_value_kind() {
        let attrs = Attributes::new();
        attrs.set("a", AttrValue::html("<b>x</b>"));
        attrs.set("b", AttrValue::literal("raw"));
        assert!(attrs.delete("a"));
        assert!(attrs.delete("b"));
        assert!(!attrs.delete("a"));
        assert!(attrs.is_empty());
    }

    #[test]
    fn clones_share_backing_store() {
        let attrs = Attributes::new();
        let other = attrs.clone();
        other.set("color", "red");
        assert_eq!(attrs.get("color"), Some(AttrValue::Text("red".into())));
    }

    #[test]
    fn numeric_values_stringify() {
        let attrs = Attributes::new();
        attrs.set("weight", 42);
        attrs.set("flag", true);
        assert_eq!(attrs.get("weight"), Some(AttrValue::Text("42".into())));
        assert_eq!(attrs.get("flag"), Some(AttrValue::Text("true".into())));
    }

    #[test]
    fn detached_clone_stops_sharing() {
        let attrs = Attributes::new();
        attrs.set("x", "1");
        let copy = attrs.detached_clone();
        copy.set("x", "2");
        assert_eq!(attrs.get("x"), Some(AttrValue::Text("1".into())));
    }
}
