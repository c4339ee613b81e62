//! Card context seam
//!
//! `THIS CARD.<property>` parameter values resolve against the card
//! currently being charted. Outside a card render (wiki pages, previews
//! without a card) there is no card context and such references read as
//! "not set".

use crate::property::TypedValue;

/// The card a macro is being rendered for
pub trait CardContext: Send + Sync {
    /// Card number
    fn number(&self) -> u64;

    /// Current value of a card property, by property name (case-insensitive)
    fn property_value(&self, name: &str) -> Option<TypedValue>;
}
