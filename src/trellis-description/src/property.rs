//! Typed property declarations.

use crate::{
    condition::{ConditionContext, ConditionTree},
    format,
    value::{PropertyType, TypedValue},
};

/// A conditional display format of a property value.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormatRule {
    pub conditions: ConditionTree,
    /// The format string; `$Name` references raw property values.
    pub value: String,
}

/// The kinds of auxiliary conditions a property may carry.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OtherConditionKind {
    /// Whether the property is shown in editors.
    Visible,
    /// Whether the property is locked against edits.
    ReadOnly,
}

impl OtherConditionKind {
    pub const ALL: [OtherConditionKind; 2] = [Self::Visible, Self::ReadOnly];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::ReadOnly => "readonly",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }
}

/// The fixed set of auxiliary conditions of a property.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OtherConditions {
    pub visible: Option<ConditionTree>,
    pub read_only: Option<ConditionTree>,
}

impl OtherConditions {
    pub fn get(&self, kind: OtherConditionKind) -> Option<&ConditionTree> {
        match kind {
            OtherConditionKind::Visible => self.visible.as_ref(),
            OtherConditionKind::ReadOnly => self.read_only.as_ref(),
        }
    }

    pub fn set(&mut self, kind: OtherConditionKind, tree: ConditionTree) {
        let slot = match kind {
            OtherConditionKind::Visible => &mut self.visible,
            OtherConditionKind::ReadOnly => &mut self.read_only,
        };
        *slot = Some(tree);
    }

    /// Iterates over the present conditions in declaration order of the
    /// kinds.
    pub fn iter(&self) -> impl Iterator<Item = (OtherConditionKind, &ConditionTree)> {
        OtherConditionKind::ALL
            .into_iter()
            .filter_map(|k| self.get(k).map(|t| (k, t)))
    }
}

/// A property declared by a component description.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentProperty {
    /// The name used in conditions and references.
    pub name: String,
    /// The key under which instance values are persisted.
    pub serialized_name: String,
    /// The human-readable name shown in editors.
    pub display_name: String,
    pub ty: PropertyType,
    pub default: TypedValue,
    /// Display formats, where the last matching rule wins.
    pub format_rules: Vec<FormatRule>,
    pub other_conditions: OtherConditions,
    /// Allowed values of an enum-typed property.
    pub enum_options: Vec<String>,
}

impl ComponentProperty {
    /// Creates a property without format rules or options.
    pub fn new(name: impl Into<String>, default: TypedValue) -> Self {
        let name = name.into();
        Self {
            serialized_name: name.to_lowercase(),
            display_name: name.clone(),
            name,
            ty: default.ty(),
            default,
            format_rules: Vec::new(),
            other_conditions: OtherConditions::default(),
            enum_options: Vec::new(),
        }
    }

    /// The value of this property in `ctx`, or the default.
    pub fn value_in<'a, C: ConditionContext + ?Sized>(&'a self, ctx: &'a C) -> &'a TypedValue {
        ctx.property(&self.name).unwrap_or(&self.default)
    }

    /// Selects the format string which applies in `ctx`.
    ///
    /// Rules are evaluated in declaration order and the last matching
    /// one is taken.
    pub fn format_rule<C: ConditionContext + ?Sized>(&self, ctx: &C) -> Option<&str> {
        self.format_rules
            .iter()
            .filter(|r| r.conditions.evaluate(ctx))
            .last()
            .map(|r| r.value.as_str())
    }

    /// Formats the value of this property for display.
    pub fn format<C: ConditionContext + ?Sized>(&self, ctx: &C) -> String {
        let value = self.value_in(ctx);
        match self.format_rule(ctx) {
            Some(fmt) => format::substitute(fmt, |name| {
                if name == self.name {
                    Some(value.to_string())
                } else {
                    ctx.property(name).map(ToString::to_string)
                }
            }),
            None => value.to_string(),
        }
    }

    /// Whether the property is visible in `ctx`. Defaults to true.
    pub fn is_visible<C: ConditionContext + ?Sized>(&self, ctx: &C) -> bool {
        self.other_conditions
            .visible
            .as_ref()
            .map_or(true, |t| t.evaluate(ctx))
    }

    /// Whether the property is read-only in `ctx`. Defaults to false.
    pub fn is_read_only<C: ConditionContext + ?Sized>(&self, ctx: &C) -> bool {
        self.other_conditions
            .read_only
            .as_ref()
            .is_some_and(|t| t.evaluate(ctx))
    }
}
