//! Dynamic values flowing through template arguments, props and live
//! properties.

use std::fmt;
use std::rc::Rc;

use crate::collections::OrderedMap;
use crate::component::Component;
use crate::host::{Event, NodeId};
use crate::markers::INNER_MARKUP_KEY;
use crate::Error;

pub type ValueMap = OrderedMap<Value>;

type HandlerFn = dyn Fn(&Event) -> Result<(), Error>;

/// Event handler stored in a node's handler property.
///
/// Identity is the allocation: cloning a `Handler` keeps it equal, building a
/// new one from the same closure does not.
#[derive(Clone)]
pub struct Handler(Rc<HandlerFn>);

impl Handler {
    pub fn new(f: impl Fn(&Event) -> Result<(), Error> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &Event) -> Result<(), Error> {
        (self.0)(event)
    }

    pub fn same(&self, other: &Handler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    List(Rc<[Value]>),
    Map(Rc<ValueMap>),
    Node(NodeId),
    Handler(Handler),
    Component(Component),
}

impl Value {
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(Rc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn nodes(nodes: &[NodeId]) -> Self {
        Value::list(nodes.iter().copied().map(Value::Node))
    }

    /// Raw markup for a `dangerously-set-inner-html` binding.
    pub fn html(markup: impl Into<String>) -> Self {
        Value::map([(INNER_MARKUP_KEY, Value::Str(markup.into().into()))])
    }

    /// Strict equality: primitives by value, shared values by reference.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Node(a), Value::Node(b)) => a == b,
            (Value::Handler(a), Value::Handler(b)) => a.same(b),
            (Value::Component(a), Value::Component(b)) => a.same(b),
            _ => false,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null | Value::Bool(false) => false,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Whether a content slot keeps this value: everything truthy, plus
    /// every number (so `0` renders).
    pub fn is_renderable(&self) -> bool {
        self.is_truthy() || matches!(self, Value::Number(_))
    }

    /// Length for list-like values; `None` for anything without one.
    pub fn sequence_len(&self) -> Option<usize> {
        match self {
            Value::List(items) => Some(items.len()),
            Value::Str(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    pub fn is_empty_sequence(&self) -> bool {
        self.sequence_len() == Some(0)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Value::Handler(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&Component> {
        match self {
            Value::Component(c) => Some(c),
            _ => None,
        }
    }

    /// Text written into a content slot: strings verbatim, everything else
    /// through its JSON form.
    pub fn to_content_text(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            Value::Handler(_) | Value::Component(_) => String::new(),
            other => other.to_json().to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::Str(s) => Json::String(s.to_string()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => Json::Object(
                map.iter()
                    .filter(|(_, v)| !matches!(v, Value::Handler(_) | Value::Component(_)))
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Node(_) => Json::Object(serde_json::Map::new()),
            Value::Handler(_) | Value::Component(_) => Json::Null,
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    // Integral values print without a fraction; non-finite ones as null.
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

fn format_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        write!(f, "{}", n as i128)
    } else {
        write!(f, "{n}")
    }
}

/// String conversion used for attribute values.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => format_number(*n, f),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !matches!(item, Value::Null) {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Value::Map(_) => f.write_str("[object Object]"),
            Value::Node(id) => write!(f, "[node {id}]"),
            Value::Handler(_) | Value::Component(_) => f.write_str("[function]"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Map(map) => f.debug_map().entries(map.iter()).finish(),
            Value::Node(id) => write!(f, "Node({id})"),
            Value::Handler(h) => h.fmt(f),
            Value::Component(c) => c.fmt(f),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value.into())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Str(value.as_str().into())
    }
}

impl From<Rc<str>> for Value {
    fn from(value: Rc<str>) -> Self {
        Value::Str(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(value as f64)
                }
            }
        )*
    };
}

number_from!(i32, i64, u32, u64, usize, f32, f64);

impl From<NodeId> for Value {
    fn from(value: NodeId) -> Self {
        Value::Node(value)
    }
}

impl From<Vec<NodeId>> for Value {
    fn from(value: Vec<NodeId>) -> Self {
        Value::nodes(&value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value.into())
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Value::Map(Rc::new(value))
    }
}

impl From<Handler> for Value {
    fn from(value: Handler) -> Self {
        Value::Handler(value)
    }
}

impl From<Component> for Value {
    fn from(value: Component) -> Self {
        Value::Component(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_compare_by_content_lists_by_reference() {
        assert!(Value::from("a").same(&Value::from(String::from("a"))));
        let list = Value::list([Value::from(1)]);
        assert!(list.same(&list.clone()));
        assert!(!list.same(&Value::list([Value::from(1)])));
        assert!(!Value::Number(f64::NAN).same(&Value::Number(f64::NAN)));
    }

    #[test]
    fn zero_renders_but_false_and_empty_do_not() {
        assert!(Value::from(0).is_renderable());
        assert!(!Value::from(false).is_renderable());
        assert!(!Value::from("").is_renderable());
        assert!(!Value::Null.is_renderable());
    }

    #[test]
    fn content_text_uses_json_for_non_strings() {
        assert_eq!(Value::from(1).to_content_text(), "1");
        assert_eq!(Value::from(1.5).to_content_text(), "1.5");
        assert_eq!(Value::from(true).to_content_text(), "true");
        assert_eq!(Value::from("plain").to_content_text(), "plain");
        assert_eq!(
            Value::list([Value::from(1), Value::from("x")]).to_content_text(),
            r#"[1,"x"]"#
        );
        assert_eq!(Value::map([("a", Value::from(2))]).to_content_text(), r#"{"a":2}"#);
    }

    #[test]
    fn attribute_text_follows_string_conversion() {
        assert_eq!(Value::from(3).to_string(), "3");
        assert_eq!(Value::from(0.25).to_string(), "0.25");
        assert_eq!(
            Value::list([Value::from("a"), Value::from(2)]).to_string(),
            "a,2"
        );
        assert_eq!(Value::map([("k", Value::Null)]).to_string(), "[object Object]");
    }
}
