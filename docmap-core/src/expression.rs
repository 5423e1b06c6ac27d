//! Query expressions built from field paths.
//!
//! An [`Expression`] is an immutable binary node: a left operand, an
//! [`Operator`] and a right operand. Operands are field paths, nested
//! expressions or literal [`Bson`] values. Trees are built bottom-up through
//! builder methods on [`FieldPath`] and [`Expression`], and combined with `&`
//! and `|`:
//!
//! ```ignore
//! use docmap::prelude::*;
//!
//! let adults = User::field("age")?.gte(18);
//! let rich = User::path("info.money")?.gt(100);
//! let filter = adults & rich;
//!
//! assert!(filter.matches(&bson::doc! { "age": 20, "info": { "money": 300 } }));
//! ```
//!
//! Evaluation is a full walk of the tree for every record; there is no
//! planning or short-circuiting.

use std::{
    borrow::Cow,
    fmt,
    ops::{BitAnd, BitOr},
};

use bson::{Bson, Document};

use crate::{
    dict,
    error::{DocumentStoreError, DocumentStoreResult},
    eval,
    field::FieldPath,
};

/// The closed set of operators an expression node can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Xor,
    Add,
    Sub,
    Div,
    /// Unary: negates the left operand.
    Neg,
    /// Unary: logical negation of the left operand.
    Not,
    /// `left in right`.
    Contains,
    /// `left not in right`.
    NotContains,
    /// Strict equality, without numeric coercion.
    Is,
    IsNot,
    Concat,
    StartsWith,
    EndsWith,
    /// Unary: length of the left operand.
    Len,
}

impl Operator {
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Xor => "xor",
            Operator::Add => "add",
            Operator::Sub => "sub",
            Operator::Div => "truediv",
            Operator::Neg => "neg",
            Operator::Not => "not",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::Is => "is",
            Operator::IsNot => "is_not",
            Operator::Concat => "concat",
            Operator::StartsWith => "startswith",
            Operator::EndsWith => "endswith",
            Operator::Len => "len",
        }
    }
}

/// One side of an expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Field(FieldPath),
    Expr(Box<Expression>),
    Value(Bson),
}

impl Operand {
    /// Resolves this operand against a record.
    ///
    /// Field paths missing from the record resolve to [`Bson::Null`].
    fn resolve<'a>(&'a self, record: &'a Document) -> Cow<'a, Bson> {
        match self {
            Operand::Expr(expr) => Cow::Owned(expr.evaluate(record)),
            Operand::Field(path) => match dict::get_path(record, &path.record_segments()) {
                Some(value) => Cow::Borrowed(value),
                None => Cow::Owned(Bson::Null),
            },
            Operand::Value(value) => Cow::Borrowed(value),
        }
    }
}

impl From<FieldPath> for Operand {
    fn from(path: FieldPath) -> Self {
        Operand::Field(path)
    }
}

impl From<Expression> for Operand {
    fn from(expr: Expression) -> Self {
        Operand::Expr(Box::new(expr))
    }
}

impl From<Bson> for Operand {
    fn from(value: Bson) -> Self {
        Operand::Value(value)
    }
}

macro_rules! literal_operands {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(value: $ty) -> Self {
                    Operand::Value(Bson::from(value))
                }
            }
        )*
    };
}

literal_operands!(bool, i32, i64, f64, &str, String, Document, Vec<Bson>, bson::DateTime);

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Field(path) => write!(f, "{path}"),
            Operand::Expr(expr) => write!(f, "{expr}"),
            Operand::Value(value) => write!(f, "{value}"),
        }
    }
}

/// An immutable binary node of a query expression tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    left: Operand,
    operator: Operator,
    right: Operand,
}

impl Expression {
    pub fn new(left: impl Into<Operand>, operator: Operator, right: impl Into<Operand>) -> Self {
        Self { left: left.into(), operator, right: right.into() }
    }

    pub fn left(&self) -> &Operand {
        &self.left
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn right(&self) -> &Operand {
        &self.right
    }

    /// Evaluates the tree against a record and returns the resulting value.
    pub fn evaluate(&self, record: &Document) -> Bson {
        let left = self.left.resolve(record);
        let right = self.right.resolve(record);
        eval::apply(self.operator, &left, &right)
    }

    /// Evaluates the tree as a predicate: the truthiness of [`Expression::evaluate`].
    pub fn matches(&self, record: &Document) -> bool {
        eval::truthy(&self.evaluate(record))
    }

    /// Folds a sequence of expressions left to right with `operator`.
    ///
    /// A single expression is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::MalformedExpression`] when the sequence is
    /// empty or contains an operand that is not an expression.
    pub fn merge<I>(operands: I, operator: Operator) -> DocumentStoreResult<Expression>
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        let mut merged: Option<Expression> = None;

        for operand in operands {
            let Operand::Expr(expr) = operand.into() else {
                return Err(DocumentStoreError::MalformedExpression(
                    "only expressions can be merged".to_string(),
                ));
            };
            merged = Some(match merged {
                Some(acc) => Expression::new(acc, operator, *expr),
                None => *expr,
            });
        }

        merged.ok_or_else(|| {
            DocumentStoreError::MalformedExpression("cannot merge an empty expression list".to_string())
        })
    }

    /// Reconstructs the field assignments this expression pins down.
    ///
    /// Each `field == literal` (or `field is literal`) leaf contributes the
    /// literal at the field's attribute path; nested expressions on either
    /// side are visited and deep-merged. Other comparisons contribute nothing,
    /// so `age > 18` never seeds `age = 18`.
    pub fn to_mapping(&self) -> Document {
        let mut mapping = match (&self.left, self.operator, &self.right) {
            (Operand::Field(path), Operator::Eq | Operator::Is, Operand::Value(value)) => {
                dict::expand(&path.attribute_key(), value.clone())
            }
            _ => Document::new(),
        };

        if let Operand::Expr(left) = &self.left {
            mapping = dict::merge(&mapping, &left.to_mapping());
        }
        if let Operand::Expr(right) = &self.right {
            mapping = dict::merge(&mapping, &right.to_mapping());
        }

        mapping
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}|{}|{}>", self.left, self.operator.name(), self.right)
    }
}

impl BitAnd for Expression {
    type Output = Expression;

    fn bitand(self, other: Expression) -> Expression {
        Expression::new(self, Operator::And, other)
    }
}

impl BitOr for Expression {
    type Output = Expression;

    fn bitor(self, other: Expression) -> Expression {
        Expression::new(self, Operator::Or, other)
    }
}

/// Builder methods shared by field paths and expressions.
macro_rules! operator_builders {
    ($ty:ty) => {
        impl $ty {
            /// Builds `self <operator> other`.
            pub fn binary(self, operator: Operator, other: impl Into<Operand>) -> Expression {
                Expression::new(self, operator, other)
            }

            pub fn eq(self, other: impl Into<Operand>) -> Expression {
                self.binary(Operator::Eq, other)
            }

            pub fn ne(self, other: impl Into<Operand>) -> Expression {
                self.binary(Operator::Ne, other)
            }

            pub fn lt(self, other: impl Into<Operand>) -> Expression {
                self.binary(Operator::Lt, other)
            }

            pub fn lte(self, other: impl Into<Operand>) -> Expression {
                self.binary(Operator::Le, other)
            }

            pub fn gt(self, other: impl Into<Operand>) -> Expression {
                self.binary(Operator::Gt, other)
            }

            pub fn gte(self, other: impl Into<Operand>) -> Expression {
                self.binary(Operator::Ge, other)
            }

            pub fn and(self, other: impl Into<Operand>) -> Expression {
                self.binary(Operator::And, other)
            }

            pub fn or(self, other: impl Into<Operand>) -> Expression {
                self.binary(Operator::Or, other)
            }

            pub fn xor(self, other: impl Into<Operand>) -> Expression {
                self.binary(Operator::Xor, other)
            }

            #[allow(clippy::should_implement_trait)]
            pub fn add(self, other: impl Into<Operand>) -> Expression {
                self.binary(Operator::Add, other)
            }

            #[allow(clippy::should_implement_trait)]
            pub fn sub(self, other: impl Into<Operand>) -> Expression {
                self.binary(Operator::Sub, other)
            }

            #[allow(clippy::should_implement_trait)]
            pub fn div(self, other: impl Into<Operand>) -> Expression {
                self.binary(Operator::Div, other)
            }

            #[allow(clippy::should_implement_trait)]
            pub fn neg(self) -> Expression {
                self.binary(Operator::Neg, Bson::Null)
            }

            #[allow(clippy::should_implement_trait)]
            pub fn not(self) -> Expression {
                self.binary(Operator::Not, Bson::Null)
            }

            pub fn len(self) -> Expression {
                self.binary(Operator::Len, Bson::Null)
            }

            pub fn starts_with(self, other: impl Into<Operand>) -> Expression {
                self.binary(Operator::StartsWith, other)
            }

            pub fn ends_with(self, other: impl Into<Operand>) -> Expression {
                self.binary(Operator::EndsWith, other)
            }

            /// `self in other`.
            pub fn is_in(self, other: impl Into<Operand>) -> Expression {
                self.binary(Operator::Contains, other)
            }

            /// `self not in other`.
            pub fn not_in(self, other: impl Into<Operand>) -> Expression {
                self.binary(Operator::NotContains, other)
            }

            pub fn is(self, other: impl Into<Operand>) -> Expression {
                self.binary(Operator::Is, other)
            }

            pub fn is_not(self, other: impl Into<Operand>) -> Expression {
                self.binary(Operator::IsNot, other)
            }

            pub fn concat(self, other: impl Into<Operand>) -> Expression {
                self.binary(Operator::Concat, other)
            }
        }
    };
}

operator_builders!(FieldPath);
operator_builders!(Expression);

fn helper(left: impl Into<Operand>, operator: Operator, right: impl Into<Operand>) -> DocumentStoreResult<Expression> {
    match left.into() {
        Operand::Value(value) => Err(DocumentStoreError::MalformedExpression(format!(
            "left operand of {} must be a field path or an expression, got {value}",
            operator.name()
        ))),
        left => Ok(Expression::new(left, operator, right)),
    }
}

/// Builds `left in right`.
///
/// # Errors
///
/// Returns [`DocumentStoreError::MalformedExpression`] when `left` is a literal.
pub fn is_in(left: impl Into<Operand>, right: impl Into<Operand>) -> DocumentStoreResult<Expression> {
    helper(left, Operator::Contains, right)
}

/// Builds `left not in right`. Fails like [`is_in`].
pub fn not_in(left: impl Into<Operand>, right: impl Into<Operand>) -> DocumentStoreResult<Expression> {
    helper(left, Operator::NotContains, right)
}

/// Builds `left is right`. Fails like [`is_in`].
pub fn is(left: impl Into<Operand>, right: impl Into<Operand>) -> DocumentStoreResult<Expression> {
    helper(left, Operator::Is, right)
}

/// Builds `left is not right`. Fails like [`is_in`].
pub fn is_not(left: impl Into<Operand>, right: impl Into<Operand>) -> DocumentStoreResult<Expression> {
    helper(left, Operator::IsNot, right)
}

/// Builds the concatenation of `left` and `right`. Fails like [`is_in`].
pub fn concat(left: impl Into<Operand>, right: impl Into<Operand>) -> DocumentStoreResult<Expression> {
    helper(left, Operator::Concat, right)
}
