//! Property kinds and typed values
//!
//! A macro parameter declares which value kinds it accepts; computed values
//! (project variables, `THIS CARD.<property>` references) carry the kind of
//! the property they came from so compatibility can be checked before use.

use serde::{Deserialize, Serialize};

/// Kind of a property value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Free-form text
    Text,
    /// Numeric (integer or decimal)
    Numeric,
    /// A team member
    User,
    /// A calendar date
    Date,
    /// A reference to another card
    Card,
    /// A node in a tree-structured property
    Tree,
}

impl ValueKind {
    /// Human-readable kind name used in error messages
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Numeric => "numeric",
            Self::User => "user",
            Self::Date => "date",
            Self::Card => "card",
            Self::Tree => "tree",
        }
    }
}

/// A value paired with the kind of the property it was read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedValue {
    /// Kind of the source property
    pub kind: ValueKind,
    /// Stored string form of the value
    pub value: String,
}

impl TypedValue {
    /// Create a typed value
    #[inline]
    #[must_use]
    pub fn new(kind: ValueKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// Shorthand for a text value
    #[inline]
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::new(ValueKind::Text, value)
    }

    /// Shorthand for a numeric value
    #[inline]
    #[must_use]
    pub fn numeric(value: impl Into<String>) -> Self {
        Self::new(ValueKind::Numeric, value)
    }

    /// Shorthand for a date value
    #[inline]
    #[must_use]
    pub fn date(value: impl Into<String>) -> Self {
        Self::new(ValueKind::Date, value)
    }
}

/// Definition of the property a query column selects
///
/// Drives x-axis label derivation: numeric properties get precision-aware
/// labels, date properties get calendar fill-in, card properties get
/// `#N Name` formatting, tree properties get ancestor expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    /// Property name as the project defines it
    pub name: String,
    /// Kind of values the property stores
    pub kind: ValueKind,
    /// Decimal precision for numeric properties
    pub precision: Option<u32>,
}

impl PropertyDefinition {
    /// Create a property definition without precision
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            precision: None,
        }
    }

    /// Create a numeric property definition with precision
    #[inline]
    #[must_use]
    pub fn numeric(name: impl Into<String>, precision: u32) -> Self {
        Self {
            name: name.into(),
            kind: ValueKind::Numeric,
            precision: Some(precision),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_describe() {
        assert_eq!(ValueKind::Numeric.describe(), "numeric");
        assert_eq!(ValueKind::Card.describe(), "card");
    }

    #[test]
    fn typed_value_shorthands() {
        assert_eq!(TypedValue::text("a").kind, ValueKind::Text);
        assert_eq!(TypedValue::numeric("2").kind, ValueKind::Numeric);
        assert_eq!(TypedValue::date("2024-01-01").kind, ValueKind::Date);
    }

    #[test]
    fn numeric_property_has_precision() {
        let prop = PropertyDefinition::numeric("Size", 2);
        assert_eq!(prop.precision, Some(2));
    }
}
