//! Boolean guard expressions over property values and instance state.
//!
//! Every conditional part of a description (format rules, flag rules,
//! connection groups and render groups) carries a [`ConditionTree`] which
//! is evaluated against a [`ConditionContext`] to decide whether it applies.

use std::cmp::Ordering;

use crate::{
    geometry::{InstanceGeometry, Orientation},
    value::{PropertySet, TypedValue},
};

/// The state variable which is true for horizontally placed instances.
pub const STATE_HORIZONTAL: &str = "horizontal";
/// The state variable which is true for flipped instances.
pub const STATE_FLIPPED: &str = "flipped";

/// What a [`Condition`] looks up.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    /// A named property of the instance.
    Property,
    /// A piece of instance state, like its orientation.
    State,
}

/// The comparison a [`Condition`] applies.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl ComparisonOp {
    /// The operator token used in condition expressions.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
        }
    }

    fn matches(self, ord: Ordering) -> bool {
        match self {
            Self::Equal => ord.is_eq(),
            Self::NotEqual => ord.is_ne(),
            Self::Less => ord.is_lt(),
            Self::LessOrEqual => ord.is_le(),
            Self::Greater => ord.is_gt(),
            Self::GreaterOrEqual => ord.is_ge(),
        }
    }
}

/// A single comparison of a variable against a constant operand.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    /// The name of the property or state variable.
    pub variable: String,
    /// The comparison to apply.
    pub op: ComparisonOp,
    /// The right-hand side of the comparison.
    pub value: TypedValue,
    /// Whether `variable` names a property or a state.
    pub kind: ConditionKind,
}

impl Condition {
    /// Creates a property condition.
    pub fn property(variable: impl Into<String>, op: ComparisonOp, value: TypedValue) -> Self {
        Self {
            variable: variable.into(),
            op,
            value,
            kind: ConditionKind::Property,
        }
    }

    /// Creates a condition which checks a state variable for `expected`.
    pub fn state(variable: impl Into<String>, expected: bool) -> Self {
        Self {
            variable: variable.into(),
            op: ComparisonOp::Equal,
            value: TypedValue::Bool(expected),
            kind: ConditionKind::State,
        }
    }

    /// Evaluates the condition in the given context.
    ///
    /// Variables missing from the context make the condition false.
    pub fn evaluate<C: ConditionContext + ?Sized>(&self, ctx: &C) -> bool {
        match self.kind {
            ConditionKind::Property => match ctx.property(&self.variable) {
                Some(lhs) => compare(self.op, lhs, &self.value),
                None => false,
            },
            ConditionKind::State => match ctx.state(&self.variable) {
                Some(state) => compare(self.op, &TypedValue::Bool(state), &self.value),
                None => false,
            },
        }
    }
}

fn compare(op: ComparisonOp, lhs: &TypedValue, rhs: &TypedValue) -> bool {
    let ord = match (lhs, rhs) {
        (TypedValue::Bool(a), TypedValue::Bool(b)) => {
            return match op {
                ComparisonOp::Equal => a == b,
                ComparisonOp::NotEqual => a != b,
                _ => false,
            };
        }

        // Enum operands match regardless of case.
        (TypedValue::String(a) | TypedValue::Enum(a), TypedValue::Enum(b)) => {
            a.to_lowercase().cmp(&b.to_lowercase())
        }
        (TypedValue::String(a) | TypedValue::Enum(a), TypedValue::String(b)) => a.cmp(b),

        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => match a.partial_cmp(&b) {
                Some(ord) => ord,
                None => return false,
            },
            _ => return false,
        },
    };

    op.matches(ord)
}

/// The boolean operator joining two subtrees.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
}

/// A binary tree of [`Condition`]s.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ConditionTree {
    /// Always true.
    #[default]
    Empty,
    /// A single condition.
    Leaf(Condition),
    /// Two subtrees joined by an operator.
    Operator {
        op: BoolOp,
        left: Box<ConditionTree>,
        right: Box<ConditionTree>,
    },
}

impl ConditionTree {
    /// Joins two trees with [`BoolOp::And`].
    pub fn and(left: ConditionTree, right: ConditionTree) -> Self {
        Self::Operator {
            op: BoolOp::And,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Joins two trees with [`BoolOp::Or`].
    pub fn or(left: ConditionTree, right: ConditionTree) -> Self {
        Self::Operator {
            op: BoolOp::Or,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Whether this is the [`ConditionTree::Empty`] tree.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Evaluates the tree, short-circuiting operator nodes.
    pub fn evaluate<C: ConditionContext + ?Sized>(&self, ctx: &C) -> bool {
        match self {
            Self::Empty => true,
            Self::Leaf(c) => c.evaluate(ctx),
            Self::Operator { op, left, right } => match op {
                BoolOp::And => left.evaluate(ctx) && right.evaluate(ctx),
                BoolOp::Or => left.evaluate(ctx) || right.evaluate(ctx),
            },
        }
    }

    /// Builds a tree from a flat list of implicitly AND-ed conditions.
    pub fn from_collection(conditions: Vec<Condition>) -> Self {
        conditions
            .into_iter()
            .map(Self::Leaf)
            .reduce(Self::and)
            .unwrap_or_default()
    }

    /// Flattens the tree into a list of AND-ed conditions.
    ///
    /// Returns [`None`] when the tree uses [`BoolOp::Or`] anywhere, as
    /// such a tree has no flat representation.
    pub fn to_collection(&self) -> Option<Vec<&Condition>> {
        fn walk<'a>(tree: &'a ConditionTree, out: &mut Vec<&'a Condition>) -> bool {
            match tree {
                ConditionTree::Empty => true,
                ConditionTree::Leaf(c) => {
                    out.push(c);
                    true
                }
                ConditionTree::Operator {
                    op: BoolOp::And,
                    left,
                    right,
                } => walk(left, out) && walk(right, out),
                ConditionTree::Operator { op: BoolOp::Or, .. } => false,
            }
        }

        let mut out = Vec::new();
        walk(self, &mut out).then_some(out)
    }

    /// Iterates over every condition in the tree, left to right.
    pub fn conditions(&self) -> Vec<&Condition> {
        fn walk<'a>(tree: &'a ConditionTree, out: &mut Vec<&'a Condition>) {
            match tree {
                ConditionTree::Empty => {}
                ConditionTree::Leaf(c) => out.push(c),
                ConditionTree::Operator { left, right, .. } => {
                    walk(left, out);
                    walk(right, out);
                }
            }
        }

        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }
}

impl From<Condition> for ConditionTree {
    fn from(value: Condition) -> Self {
        Self::Leaf(value)
    }
}

/// The variables a [`ConditionTree`] is evaluated against.
pub trait ConditionContext {
    /// Looks up the current value of a property.
    fn property(&self, name: &str) -> Option<&TypedValue>;

    /// Looks up a state variable of the instance.
    ///
    /// Contexts without instance state know no state variables.
    fn state(&self, name: &str) -> Option<bool> {
        let _ = name;
        None
    }
}

impl ConditionContext for PropertySet {
    fn property(&self, name: &str) -> Option<&TypedValue> {
        self.get(name)
    }
}

impl<C: ConditionContext + ?Sized> ConditionContext for &C {
    fn property(&self, name: &str) -> Option<&TypedValue> {
        (**self).property(name)
    }

    fn state(&self, name: &str) -> Option<bool> {
        (**self).state(name)
    }
}

/// A [`ConditionContext`] for a placed component instance, which knows
/// both its properties and its orientation state.
#[derive(Clone, Copy, Debug)]
pub struct InstanceContext<'a> {
    /// The live property values of the instance.
    pub properties: &'a PropertySet,
    /// The placement of the instance.
    pub geometry: &'a InstanceGeometry,
}

impl<'a> InstanceContext<'a> {
    pub fn new(properties: &'a PropertySet, geometry: &'a InstanceGeometry) -> Self {
        Self {
            properties,
            geometry,
        }
    }
}

impl ConditionContext for InstanceContext<'_> {
    fn property(&self, name: &str) -> Option<&TypedValue> {
        self.properties.get(name)
    }

    fn state(&self, name: &str) -> Option<bool> {
        match name {
            STATE_HORIZONTAL => Some(self.geometry.orientation == Orientation::Horizontal),
            STATE_FLIPPED => Some(self.geometry.flipped),
            _ => None,
        }
    }
}

/// Evaluates `tree` against `ctx`.
///
/// This never fails; undefined variables degrade to false.
#[inline]
pub fn evaluate_conditions<C: ConditionContext + ?Sized>(tree: &ConditionTree, ctx: &C) -> bool {
    tree.evaluate(ctx)
}
