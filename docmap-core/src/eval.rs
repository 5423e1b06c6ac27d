//! Operator application over native record values.
//!
//! This module gives every [`Operator`] its meaning on [`Bson`] values. It
//! normalizes numeric types so that an `Int32` literal compares equal to a
//! `Double` field holding the same number, while two integers always compare
//! exactly.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, datetime::DateTime};

use crate::expression::Operator;

/// Type-erased, comparable view of a BSON value.
///
/// Integers of either width compare as `i64`; a comparison that involves a
/// float goes through `f64`. Values with no natural
/// comparison (object ids, binaries, ...) fall back to strict BSON equality.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Integer(*value as i64),
            Bson::Int64(value) => Comparable::Integer(*value),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Integer(a), Comparable::Integer(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::Integer(a), Comparable::Number(b)) => (*a as f64) == *b,
            (Comparable::Number(a), Comparable::Integer(b)) => *a == (*b as f64),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Integer(a), Comparable::Integer(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::Integer(a), Comparable::Number(b)) => (*a as f64).partial_cmp(b),
            (Comparable::Number(a), Comparable::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn of(value: &Bson) -> Option<Number> {
        match value {
            Bson::Int32(value) => Some(Number::Int(*value as i64)),
            Bson::Int64(value) => Some(Number::Int(*value)),
            Bson::Double(value) => Some(Number::Float(*value)),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(value) => value as f64,
            Number::Float(value) => value,
        }
    }
}

/// Truthiness of a value, as used by logical operators and predicates.
pub fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Null | Bson::Undefined => false,
        Bson::Boolean(value) => *value,
        Bson::Int32(value) => *value != 0,
        Bson::Int64(value) => *value != 0,
        Bson::Double(value) => *value != 0.0,
        Bson::String(value) => !value.is_empty(),
        Bson::Array(value) => !value.is_empty(),
        Bson::Document(value) => !value.is_empty(),
        _ => true,
    }
}

/// Applies `operator` to two resolved operand values.
///
/// Unary operators ignore `right`. Operands the operator cannot act on yield
/// [`Bson::Null`] for value-producing operators and `false` for predicates.
pub fn apply(operator: Operator, left: &Bson, right: &Bson) -> Bson {
    match operator {
        Operator::Eq => Bson::Boolean(Comparable::from(left) == Comparable::from(right)),
        Operator::Ne => Bson::Boolean(Comparable::from(left) != Comparable::from(right)),
        Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => {
            Bson::Boolean(match Comparable::from(left).partial_cmp(&Comparable::from(right)) {
                Some(ordering) => match operator {
                    Operator::Lt => ordering == Ordering::Less,
                    Operator::Le => ordering != Ordering::Greater,
                    Operator::Gt => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                },
                None => false,
            })
        }
        Operator::And => match (left, right) {
            (Bson::Int32(_) | Bson::Int64(_), Bson::Int32(_) | Bson::Int64(_)) => {
                integers(left, right, |a, b| Some(a & b))
            }
            _ => Bson::Boolean(truthy(left) && truthy(right)),
        },
        Operator::Or => match (left, right) {
            (Bson::Int32(_) | Bson::Int64(_), Bson::Int32(_) | Bson::Int64(_)) => {
                integers(left, right, |a, b| Some(a | b))
            }
            _ => Bson::Boolean(truthy(left) || truthy(right)),
        },
        Operator::Xor => match (left, right) {
            (Bson::Boolean(a), Bson::Boolean(b)) => Bson::Boolean(a ^ b),
            _ => integers(left, right, |a, b| Some(a ^ b)),
        },
        Operator::Add => match (left, right) {
            (Bson::String(a), Bson::String(b)) => Bson::String(format!("{a}{b}")),
            (Bson::Array(a), Bson::Array(b)) => Bson::Array(a.iter().chain(b).cloned().collect()),
            _ => arithmetic(left, right, i64::checked_add, |a, b| a + b),
        },
        Operator::Sub => arithmetic(left, right, i64::checked_sub, |a, b| a - b),
        Operator::Div => match (Number::of(left), Number::of(right)) {
            (Some(_), Some(divisor)) if divisor.as_f64() == 0.0 => Bson::Null,
            (Some(a), Some(b)) => Bson::Double(a.as_f64() / b.as_f64()),
            _ => Bson::Null,
        },
        Operator::Neg => match Number::of(left) {
            Some(Number::Int(value)) => value.checked_neg().map_or(Bson::Null, Bson::Int64),
            Some(Number::Float(value)) => Bson::Double(-value),
            None => Bson::Null,
        },
        Operator::Not => Bson::Boolean(!truthy(left)),
        Operator::Contains => Bson::Boolean(contains(right, left)),
        Operator::NotContains => Bson::Boolean(!contains(right, left)),
        Operator::Is => Bson::Boolean(left == right),
        Operator::IsNot => Bson::Boolean(left != right),
        Operator::Concat => match (left, right) {
            (Bson::String(a), Bson::String(b)) => Bson::String(format!("{a}{b}")),
            (Bson::Array(a), Bson::Array(b)) => Bson::Array(a.iter().chain(b).cloned().collect()),
            _ => Bson::Null,
        },
        Operator::StartsWith => match (left, right) {
            (Bson::String(value), Bson::String(prefix)) => Bson::Boolean(value.starts_with(prefix.as_str())),
            _ => Bson::Boolean(false),
        },
        Operator::EndsWith => match (left, right) {
            (Bson::String(value), Bson::String(suffix)) => Bson::Boolean(value.ends_with(suffix.as_str())),
            _ => Bson::Boolean(false),
        },
        Operator::Len => match left {
            Bson::String(value) => Bson::Int64(value.chars().count() as i64),
            Bson::Array(value) => Bson::Int64(value.len() as i64),
            Bson::Document(value) => Bson::Int64(value.len() as i64),
            _ => Bson::Null,
        },
    }
}

/// `item in container`: array membership, substring or document key.
fn contains(container: &Bson, item: &Bson) -> bool {
    match container {
        Bson::Array(items) => {
            let item = Comparable::from(item);
            items.iter().any(|candidate| Comparable::from(candidate) == item)
        }
        Bson::String(haystack) => match item {
            Bson::String(needle) => haystack.contains(needle.as_str()),
            _ => false,
        },
        Bson::Document(doc) => match item {
            Bson::String(key) => doc.contains_key(key),
            _ => false,
        },
        _ => false,
    }
}

fn integers(left: &Bson, right: &Bson, op: fn(i64, i64) -> Option<i64>) -> Bson {
    match (Number::of(left), Number::of(right)) {
        (Some(Number::Int(a)), Some(Number::Int(b))) => op(a, b).map_or(Bson::Null, Bson::Int64),
        _ => Bson::Null,
    }
}

fn arithmetic(left: &Bson, right: &Bson, int_op: fn(i64, i64) -> Option<i64>, float_op: fn(f64, f64) -> f64) -> Bson {
    match (Number::of(left), Number::of(right)) {
        (Some(Number::Int(a)), Some(Number::Int(b))) => int_op(a, b).map_or(Bson::Null, Bson::Int64),
        (Some(a), Some(b)) => Bson::Double(float_op(a.as_f64(), b.as_f64())),
        _ => Bson::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_equality_normalizes_numbers() {
        assert_eq!(apply(Operator::Eq, &Bson::Double(300.0), &Bson::Int32(300)), Bson::Boolean(true));
        assert_eq!(apply(Operator::Eq, &Bson::Int64(3), &Bson::Int32(4)), Bson::Boolean(false));
        assert_eq!(apply(Operator::Eq, &Bson::String("3".into()), &Bson::Int32(3)), Bson::Boolean(false));
        assert_eq!(apply(Operator::Ne, &Bson::Null, &Bson::Int32(3)), Bson::Boolean(true));
    }

    #[test]
    fn test_ordering() {
        assert_eq!(apply(Operator::Ge, &Bson::Int32(18), &Bson::Int64(18)), Bson::Boolean(true));
        assert_eq!(apply(Operator::Lt, &Bson::Int32(15), &Bson::Double(18.5)), Bson::Boolean(true));
        assert_eq!(apply(Operator::Gt, &Bson::String("b".into()), &Bson::String("a".into())), Bson::Boolean(true));
        assert_eq!(apply(Operator::Le, &Bson::Null, &Bson::Int32(1)), Bson::Boolean(false));
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let max = Bson::Int64(i64::MAX);
        let below = Bson::Int64(i64::MAX - 1);
        assert_eq!(apply(Operator::Eq, &max, &below), Bson::Boolean(false));
        assert_eq!(apply(Operator::Ne, &max, &below), Bson::Boolean(true));
        assert_eq!(apply(Operator::Gt, &max, &below), Bson::Boolean(true));
        assert_eq!(apply(Operator::Le, &max, &below), Bson::Boolean(false));
        assert_eq!(apply(Operator::Eq, &Bson::Int64(1 << 53), &Bson::Int64((1 << 53) + 1)), Bson::Boolean(false));
        assert_eq!(apply(Operator::Contains, &below, &Bson::Array(vec![max.clone()])), Bson::Boolean(false));
    }

    #[test]
    fn test_logical_and_bitwise() {
        assert_eq!(apply(Operator::And, &Bson::Boolean(true), &Bson::Boolean(false)), Bson::Boolean(false));
        assert_eq!(apply(Operator::Or, &Bson::Boolean(false), &Bson::Boolean(true)), Bson::Boolean(true));
        assert_eq!(apply(Operator::Or, &Bson::Int32(4), &Bson::Int32(1)), Bson::Int64(5));
        assert_eq!(apply(Operator::And, &Bson::Int32(6), &Bson::Int64(3)), Bson::Int64(2));
        assert_eq!(apply(Operator::Xor, &Bson::Boolean(true), &Bson::Boolean(true)), Bson::Boolean(false));
        assert_eq!(apply(Operator::Xor, &Bson::Int32(6), &Bson::Int32(3)), Bson::Int64(5));
        assert_eq!(apply(Operator::Xor, &Bson::String("a".into()), &Bson::Int32(3)), Bson::Null);
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(apply(Operator::Add, &Bson::Int32(2), &Bson::Int32(3)), Bson::Int64(5));
        assert_eq!(apply(Operator::Add, &Bson::Int32(2), &Bson::Double(0.5)), Bson::Double(2.5));
        assert_eq!(apply(Operator::Add, &Bson::String("Ax".into()), &Bson::String("y".into())), Bson::String("Axy".into()));
        assert_eq!(apply(Operator::Sub, &Bson::Int64(i64::MIN), &Bson::Int32(1)), Bson::Null);
        assert_eq!(apply(Operator::Div, &Bson::Int32(3), &Bson::Int32(2)), Bson::Double(1.5));
        assert_eq!(apply(Operator::Div, &Bson::Int32(3), &Bson::Int32(0)), Bson::Null);
        assert_eq!(apply(Operator::Neg, &Bson::Int32(3), &Bson::Null), Bson::Int64(-3));
    }

    #[test]
    fn test_containment_and_identity() {
        let tags = Bson::Array(vec![Bson::String("admin".into()), Bson::Int32(1)]);
        assert_eq!(apply(Operator::Contains, &Bson::String("admin".into()), &tags), Bson::Boolean(true));
        assert_eq!(apply(Operator::Contains, &Bson::Double(1.0), &tags), Bson::Boolean(true));
        assert_eq!(apply(Operator::NotContains, &Bson::String("guest".into()), &tags), Bson::Boolean(true));
        assert_eq!(
            apply(Operator::Contains, &Bson::String("money".into()), &Bson::Document(doc! { "money": 1 })),
            Bson::Boolean(true)
        );
        assert_eq!(apply(Operator::Is, &Bson::Null, &Bson::Null), Bson::Boolean(true));
        assert_eq!(apply(Operator::Is, &Bson::Double(1.0), &Bson::Int32(1)), Bson::Boolean(false));
        assert_eq!(apply(Operator::IsNot, &Bson::Int32(1), &Bson::Null), Bson::Boolean(true));
    }

    #[test]
    fn test_string_operators() {
        let name = Bson::String("Axy".into());
        assert_eq!(apply(Operator::StartsWith, &name, &Bson::String("Ax".into())), Bson::Boolean(true));
        assert_eq!(apply(Operator::EndsWith, &name, &Bson::String("y".into())), Bson::Boolean(true));
        assert_eq!(apply(Operator::StartsWith, &Bson::Null, &Bson::String("Ax".into())), Bson::Boolean(false));
        assert_eq!(apply(Operator::Len, &name, &Bson::Null), Bson::Int64(3));
        assert_eq!(apply(Operator::Concat, &name, &Bson::String("z".into())), Bson::String("Axyz".into()));
        assert_eq!(apply(Operator::Not, &Bson::String(String::new()), &Bson::Null), Bson::Boolean(true));
    }

    #[test]
    fn test_truthiness() {
        assert!(!truthy(&Bson::Null));
        assert!(!truthy(&Bson::Int32(0)));
        assert!(truthy(&Bson::Double(0.1)));
        assert!(!truthy(&Bson::Array(vec![])));
        assert!(truthy(&Bson::Document(doc! { "a": 1 })));
    }
}
