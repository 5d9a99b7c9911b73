//! # Value Types and Literals
//!
//! Primitive value types, literal slots and the operator/comparator
//! enumerations used by Operation and Condition nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive value type of the target language.
///
/// `Variable` is the untyped wildcard used by built-ins such as `LOAD` or
/// `STORE` that accept either concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueType {
    Uint64,
    String,
    Variable,
}

impl ValueType {
    /// `Variable` is compatible with any type on either end.
    pub fn is_compatible_with(self, other: ValueType) -> bool {
        self == other || self == ValueType::Variable || other == ValueType::Variable
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Uint64 => "Uint64",
            ValueType::String => "String",
            ValueType::Variable => "Variable",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete literal value.
///
/// Serialized untagged, so a project document stores `42` or `"text"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Uint64(u64),
    String(String),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Uint64(_) => ValueType::Uint64,
            Value::String(_) => ValueType::String,
        }
    }

    /// Render using the target language's literal syntax.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Uint64(n) => n.to_string(),
            Value::String(s) => format!("\"{}\"", s),
        }
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Uint64(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

/// Rust types that can live inside a [`Slot`].
pub trait LiteralKind: Clone + Into<Value> {
    const VALUE_TYPE: ValueType;

    /// Narrow a dynamically typed value, `None` on a type mismatch.
    fn from_value(value: Value) -> Option<Self>;
}

impl LiteralKind for u64 {
    const VALUE_TYPE: ValueType = ValueType::Uint64;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Uint64(n) => Some(n),
            Value::String(_) => None,
        }
    }
}

impl LiteralKind for String {
    const VALUE_TYPE: ValueType = ValueType::String;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            Value::Uint64(_) => None,
        }
    }
}

impl LiteralKind for Value {
    const VALUE_TYPE: ValueType = ValueType::Variable;

    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

/// An input that either carries a literal or reads from its upstream link.
///
/// Stored as `null` (unset) or the literal itself in the project document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<T>", into = "Option<T>")]
#[serde(bound(
    serialize = "T: Serialize + Clone",
    deserialize = "T: Deserialize<'de>"
))]
pub enum Slot<T> {
    Unset,
    Literal(T),
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot::Unset
    }
}

impl<T> From<Option<T>> for Slot<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Slot::Literal(v),
            None => Slot::Unset,
        }
    }
}

impl<T> From<Slot<T>> for Option<T> {
    fn from(slot: Slot<T>) -> Self {
        match slot {
            Slot::Literal(v) => Some(v),
            Slot::Unset => None,
        }
    }
}

impl<T> Slot<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Slot::Unset)
    }

    pub fn as_literal(&self) -> Option<&T> {
        match self {
            Slot::Literal(v) => Some(v),
            Slot::Unset => None,
        }
    }
}

impl<T: LiteralKind> Slot<T> {
    /// Formatted literal text, `None` when the slot reads from a link.
    pub fn to_literal(&self) -> Option<String> {
        self.as_literal().map(|v| v.clone().into().to_literal())
    }

    /// Narrow a dynamically typed slot into this slot's type.
    pub fn narrow(slot: Slot<Value>) -> Option<Slot<T>> {
        match slot {
            Slot::Unset => Some(Slot::Unset),
            Slot::Literal(v) => T::from_value(v).map(Slot::Literal),
        }
    }
}

/// A named, typed literal slot, e.g. one argument of a built-in call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TypedSlot {
    Uint64 {
        #[serde(rename = "valueSet", default)]
        value_set: Slot<u64>,
    },
    String {
        #[serde(rename = "valueSet", default)]
        value_set: Slot<String>,
    },
    Variable {
        #[serde(rename = "valueSet", default)]
        value_set: Slot<Value>,
    },
}

impl TypedSlot {
    pub fn unset(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Uint64 => TypedSlot::Uint64 { value_set: Slot::Unset },
            ValueType::String => TypedSlot::String { value_set: Slot::Unset },
            ValueType::Variable => TypedSlot::Variable { value_set: Slot::Unset },
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            TypedSlot::Uint64 { .. } => ValueType::Uint64,
            TypedSlot::String { .. } => ValueType::String,
            TypedSlot::Variable { .. } => ValueType::Variable,
        }
    }

    pub fn is_unset(&self) -> bool {
        match self {
            TypedSlot::Uint64 { value_set } => value_set.is_unset(),
            TypedSlot::String { value_set } => value_set.is_unset(),
            TypedSlot::Variable { value_set } => value_set.is_unset(),
        }
    }

    pub fn to_literal(&self) -> Option<String> {
        match self {
            TypedSlot::Uint64 { value_set } => value_set.to_literal(),
            TypedSlot::String { value_set } => value_set.to_literal(),
            TypedSlot::Variable { value_set } => value_set.to_literal(),
        }
    }

    /// Replace the literal, keeping the slot's type.
    ///
    /// Returns `false` (and leaves the slot untouched) on a type mismatch.
    pub fn assign(&mut self, value: Slot<Value>) -> bool {
        match self {
            TypedSlot::Uint64 { value_set } => assign_narrowed(value_set, value),
            TypedSlot::String { value_set } => assign_narrowed(value_set, value),
            TypedSlot::Variable { value_set } => {
                *value_set = value;
                true
            }
        }
    }
}

pub(crate) fn assign_narrowed<T: LiteralKind>(target: &mut Slot<T>, value: Slot<Value>) -> bool {
    match Slot::<T>::narrow(value) {
        Some(narrowed) => {
            *target = narrowed;
            true
        }
        None => false,
    }
}

/// Left/right operands of an Operation or Condition node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize + Clone",
    deserialize = "T: Deserialize<'de>"
))]
pub struct Operands<T> {
    #[serde(default)]
    pub left: Slot<T>,
    #[serde(default)]
    pub right: Slot<T>,
}

impl<T> Default for Operands<T> {
    fn default() -> Self {
        Self { left: Slot::Unset, right: Slot::Unset }
    }
}

impl<T: LiteralKind> Operands<T> {
    /// Assign `"left"` or `"right"`; `false` on an unknown key or type mismatch.
    pub fn assign(&mut self, key: &str, value: Slot<Value>) -> bool {
        match key {
            "left" => assign_narrowed(&mut self.left, value),
            "right" => assign_narrowed(&mut self.right, value),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Uint64Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
    #[serde(rename = "%")]
    Modulo,
    #[serde(rename = "&")]
    BitwiseAnd,
    #[serde(rename = "|")]
    BitwiseOr,
    #[serde(rename = "^")]
    BitwiseXor,
    #[serde(rename = "!")]
    BitwiseNot,
    #[serde(rename = ">>")]
    BitwiseRightShift,
    #[serde(rename = "<<")]
    BitwiseLeftShift,
}

impl Uint64Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Uint64Operator::Add => "+",
            Uint64Operator::Subtract => "-",
            Uint64Operator::Multiply => "*",
            Uint64Operator::Divide => "/",
            Uint64Operator::Modulo => "%",
            Uint64Operator::BitwiseAnd => "&",
            Uint64Operator::BitwiseOr => "|",
            Uint64Operator::BitwiseXor => "^",
            Uint64Operator::BitwiseNot => "!",
            Uint64Operator::BitwiseRightShift => ">>",
            Uint64Operator::BitwiseLeftShift => "<<",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StringOperator {
    #[serde(rename = "+")]
    Concatenate,
}

impl StringOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            StringOperator::Concatenate => "+",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Uint64Comparator {
    #[serde(rename = "==")]
    Equals,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = ">=")]
    GreaterOrEquals,
    #[serde(rename = "<")]
    Lower,
    #[serde(rename = "<=")]
    LowerOrEquals,
    #[serde(rename = "!=")]
    Differs,
}

impl Uint64Comparator {
    pub fn symbol(self) -> &'static str {
        match self {
            Uint64Comparator::Equals => "==",
            Uint64Comparator::Greater => ">",
            Uint64Comparator::GreaterOrEquals => ">=",
            Uint64Comparator::Lower => "<",
            Uint64Comparator::LowerOrEquals => "<=",
            Uint64Comparator::Differs => "!=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StringComparator {
    #[serde(rename = "==")]
    Equals,
    #[serde(rename = "!=")]
    Different,
}

impl StringComparator {
    pub fn symbol(self) -> &'static str {
        match self {
            StringComparator::Equals => "==",
            StringComparator::Different => "!=",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_is_compatible_with_everything() {
        assert!(ValueType::Variable.is_compatible_with(ValueType::Uint64));
        assert!(ValueType::String.is_compatible_with(ValueType::Variable));
        assert!(ValueType::Uint64.is_compatible_with(ValueType::Uint64));
        assert!(!ValueType::Uint64.is_compatible_with(ValueType::String));
    }

    #[test]
    fn test_literal_formatting_is_type_directed() {
        assert_eq!(Value::Uint64(42).to_literal(), "42");
        assert_eq!(Value::from("abc").to_literal(), "\"abc\"");
        assert_eq!(Slot::Literal(7u64).to_literal(), Some("7".to_string()));
        assert_eq!(Slot::<String>::Unset.to_literal(), None);
    }

    #[test]
    fn test_slot_uses_null_for_unset() {
        let unset: Slot<u64> = serde_json::from_str("null").unwrap();
        assert_eq!(unset, Slot::Unset);
        assert_eq!(serde_json::to_string(&Slot::Literal(5u64)).unwrap(), "5");
    }

    #[test]
    fn test_typed_slot_rejects_wrong_literal() {
        let mut slot = TypedSlot::unset(ValueType::Uint64);
        assert!(!slot.assign(Slot::Literal(Value::from("nope"))));
        assert!(slot.is_unset());

        assert!(slot.assign(Slot::Literal(Value::Uint64(3))));
        assert_eq!(slot.to_literal(), Some("3".to_string()));

        let mut any = TypedSlot::unset(ValueType::Variable);
        assert!(any.assign(Slot::Literal(Value::from("key"))));
        assert_eq!(any.to_literal(), Some("\"key\"".to_string()));
    }

    #[test]
    fn test_typed_slot_document_shape() {
        let slot: TypedSlot =
            serde_json::from_str(r#"{ "type": "String", "valueSet": "hello" }"#).unwrap();
        assert_eq!(
            slot,
            TypedSlot::String { value_set: Slot::Literal("hello".to_string()) }
        );
    }
}
