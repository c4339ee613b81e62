//! Generic parameter resolver
//!
//! Binds a raw parameter map to an ordered descriptor list. Resolution for
//! a single parameter, in order:
//!
//! 1. `list_of` definitions take the raw map's `series` sub-collection and
//!    resolve every element independently against the element schema.
//! 2. No raw entry for the external name: the default applies.
//! 3. Whitespace is stripped; a value outside the allowed-values whitelist
//!    counts as "not provided" and falls back to the default.
//! 4. Computable definitions recognize `THIS CARD.<property>` and
//!    `(project variable)` before treating the value as a literal; both
//!    enforce kind compatibility.
//! 5. A value that is blank after all of the above falls back to the
//!    default.
//!
//! Missing required parameters are aggregated into a single error naming
//! every one of them.

use crate::definition::{DefaultValue, ParameterDefinition};
use crate::error::{ParameterError, ParameterResult};
use crate::value::{external_name, RawParams, ResolvedParams};
use chartmark_data::{CardContext, Project, TypedValue};

/// Context a parameter set is resolved against
pub struct ResolveContext<'a> {
    /// Project supplying variables and locale formatting
    pub project: &'a dyn Project,
    /// Card being charted, when rendering inside a card
    pub card: Option<&'a dyn CardContext>,
}

impl<'a> ResolveContext<'a> {
    /// Context without a card (wiki pages, previews)
    #[inline]
    #[must_use]
    pub fn for_project(project: &'a dyn Project) -> Self {
        Self {
            project,
            card: None,
        }
    }

    /// Context for a card render
    #[inline]
    #[must_use]
    pub fn for_card(project: &'a dyn Project, card: &'a dyn CardContext) -> Self {
        Self {
            project,
            card: Some(card),
        }
    }
}

impl std::fmt::Debug for ResolveContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveContext")
            .field("project", &self.project.identifier())
            .field("card", &self.card.map(CardContext::number))
            .finish()
    }
}

/// Resolve a full descriptor list against a raw parameter map
///
/// # Errors
/// - [`ParameterError::MissingValues`] naming every required parameter that
///   did not resolve.
/// - [`ParameterError::IncompatibleType`] when a computed value's kind does
///   not match the declaration.
pub fn resolve_all(
    definitions: &[ParameterDefinition],
    raw: &RawParams,
    ctx: &ResolveContext<'_>,
) -> ParameterResult<ResolvedParams> {
    let mut resolved = ResolvedParams::new();
    let mut missing = Vec::new();

    for definition in definitions {
        if let Some(schema) = definition.list_schema() {
            let elements = raw.series().unwrap_or(&[]);
            let mut series = Vec::with_capacity(elements.len());
            for element in elements {
                series.push(resolve_all(schema, element, ctx)?);
            }
            if series.is_empty() && definition.requirement().applies(ctx) {
                missing.push(external_name(definition.name()));
            }
            resolved.set_series(definition.name(), series);
            continue;
        }

        match resolve_scalar(definition, raw, ctx)? {
            Some(value) => resolved.set(definition.name(), value),
            None => {
                if definition.requirement().applies(ctx) {
                    missing.push(external_name(definition.name()));
                }
            }
        }
    }

    if missing.is_empty() {
        Ok(resolved)
    } else {
        Err(ParameterError::missing(missing))
    }
}

fn resolve_scalar(
    definition: &ParameterDefinition,
    raw: &RawParams,
    ctx: &ResolveContext<'_>,
) -> ParameterResult<Option<String>> {
    let external = external_name(definition.name());
    let Some(raw_value) = raw.scalar(&external) else {
        return Ok(default_for(definition, ctx));
    };

    let trimmed = raw_value.trim();

    if !definition.allowed().is_empty()
        && !definition
            .allowed()
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(trimmed))
    {
        // outside the whitelist is equivalent to "not provided"
        return Ok(default_for(definition, ctx));
    }

    let value = if definition.is_computable() {
        resolve_computed(definition, trimmed, ctx)?
    } else {
        Some(trimmed.to_string())
    };

    match value {
        Some(v) if !v.trim().is_empty() => Ok(Some(v)),
        _ => Ok(default_for(definition, ctx)),
    }
}

const THIS_CARD_PREFIX: &str = "this card.";

fn resolve_computed(
    definition: &ParameterDefinition,
    trimmed: &str,
    ctx: &ResolveContext<'_>,
) -> ParameterResult<Option<String>> {
    if let Some(prefix) = trimmed.get(..THIS_CARD_PREFIX.len()) {
        if prefix.eq_ignore_ascii_case(THIS_CARD_PREFIX) {
            let property = trimmed[THIS_CARD_PREFIX.len()..].trim();
            // no card in the current evaluation context reads as "not set"
            let Some(card) = ctx.card else {
                return Ok(None);
            };
            let Some(typed) = card.property_value(property) else {
                return Ok(None);
            };
            check_kind(definition, trimmed, &typed)?;
            return Ok(Some(typed.value));
        }
    }

    if trimmed.len() >= 2 && trimmed.starts_with('(') && trimmed.ends_with(')') {
        let name = trimmed[1..trimmed.len() - 1].trim();
        if let Some(typed) = ctx.project.variable(name) {
            check_kind(definition, trimmed, &typed)?;
            return Ok(Some(typed.value));
        }
        // unknown variable reads as "not set"
        return Ok(None);
    }

    Ok(Some(trimmed.to_string()))
}

fn check_kind(
    definition: &ParameterDefinition,
    reference: &str,
    typed: &TypedValue,
) -> ParameterResult<()> {
    if definition.compatible_kinds().contains(&typed.kind) {
        Ok(())
    } else {
        Err(ParameterError::IncompatibleType {
            parameter: external_name(definition.name()),
            value: reference.to_string(),
            expected: definition.compatible_kinds().to_vec(),
        })
    }
}

fn default_for(definition: &ParameterDefinition, ctx: &ResolveContext<'_>) -> Option<String> {
    match definition.default() {
        None => None,
        Some(DefaultValue::Static(value)) => Some(value.clone()),
        Some(DefaultValue::Computed(compute)) => compute(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartmark_data::ValueKind;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    struct TestProject;

    impl Project for TestProject {
        fn identifier(&self) -> &str {
            "alpha"
        }

        fn parse_date(&self, raw: &str) -> Result<NaiveDate, String> {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| raw.to_string())
        }

        fn format_date(&self, date: NaiveDate) -> String {
            date.format("%Y-%m-%d").to_string()
        }

        fn format_number(&self, value: f64) -> String {
            format!("{value:.2}")
        }

        fn precision(&self) -> u32 {
            2
        }

        fn variable(&self, name: &str) -> Option<TypedValue> {
            match name.to_ascii_lowercase().as_str() {
                "release" => Some(TypedValue::new(ValueKind::Card, "42")),
                "velocity" => Some(TypedValue::numeric("7.5")),
                _ => None,
            }
        }

        fn card_name(&self, _number: u64) -> Option<String> {
            None
        }
    }

    struct TestCard;

    impl CardContext for TestCard {
        fn number(&self) -> u64 {
            11
        }

        fn property_value(&self, name: &str) -> Option<TypedValue> {
            match name.to_ascii_lowercase().as_str() {
                "due date" => Some(TypedValue::date("2024-03-01")),
                "owner" => Some(TypedValue::new(ValueKind::User, "dev")),
                _ => None,
            }
        }
    }

    fn ctx(project: &TestProject) -> ResolveContext<'_> {
        ResolveContext::for_project(project)
    }

    #[test]
    fn absent_value_returns_static_default() {
        let project = TestProject;
        let defs = vec![ParameterDefinition::new("chart_width").default_value("440")];

        let resolved = resolve_all(&defs, &RawParams::new(), &ctx(&project)).unwrap();
        assert_eq!(resolved.text("chart_width"), Some("440"));
    }

    #[test]
    fn absent_value_returns_computed_default() {
        let project = TestProject;
        let defs = vec![ParameterDefinition::new("project").computed_default(Arc::new(
            |ctx: &ResolveContext<'_>| Some(ctx.project.identifier().to_string()),
        ))];

        let resolved = resolve_all(&defs, &RawParams::new(), &ctx(&project)).unwrap();
        assert_eq!(resolved.text("project"), Some("alpha"));
    }

    #[test]
    fn supplied_value_is_stripped() {
        let project = TestProject;
        let defs = vec![ParameterDefinition::new("query")];
        let raw = RawParams::from_pairs([("query", "  SELECT name  ")]);

        let resolved = resolve_all(&defs, &raw, &ctx(&project)).unwrap();
        assert_eq!(resolved.text("query"), Some("SELECT name"));
    }

    #[test]
    fn whitelist_miss_falls_back_to_default() {
        let project = TestProject;
        let defs = vec![ParameterDefinition::new("chart_type")
            .allowed_values(["bar", "line", "area"])
            .default_value("bar")];
        let raw = RawParams::from_pairs([("chart-type", "pie")]);

        let resolved = resolve_all(&defs, &raw, &ctx(&project)).unwrap();
        assert_eq!(resolved.text("chart_type"), Some("bar"));
    }

    #[test]
    fn whitelist_is_case_insensitive() {
        let project = TestProject;
        let defs = vec![ParameterDefinition::new("chart_type")
            .allowed_values(["bar", "line"])
            .default_value("bar")];
        let raw = RawParams::from_pairs([("chart-type", "LINE")]);

        let resolved = resolve_all(&defs, &raw, &ctx(&project)).unwrap();
        assert_eq!(resolved.text("chart_type"), Some("LINE"));
    }

    #[test]
    fn missing_required_parameters_are_aggregated() {
        let project = TestProject;
        let defs = vec![
            ParameterDefinition::new("query").required(),
            ParameterDefinition::new("start_date").required(),
            ParameterDefinition::new("chart_width").default_value("440"),
        ];

        let err = resolve_all(&defs, &RawParams::new(), &ctx(&project)).unwrap_err();
        assert_eq!(err.to_string(), "parameters query, start-date are required");
    }

    #[test]
    fn this_card_reference_resolves_and_checks_kind() {
        let project = TestProject;
        let card = TestCard;
        let ctx = ResolveContext::for_card(&project, &card);

        let defs = vec![ParameterDefinition::new("start_date")
            .computable()
            .compatible(&[ValueKind::Date])];
        let raw = RawParams::from_pairs([("start-date", "THIS CARD.Due Date")]);

        let resolved = resolve_all(&defs, &raw, &ctx).unwrap();
        assert_eq!(resolved.text("start_date"), Some("2024-03-01"));
    }

    #[test]
    fn this_card_kind_mismatch_raises() {
        let project = TestProject;
        let card = TestCard;
        let ctx = ResolveContext::for_card(&project, &card);

        let defs = vec![ParameterDefinition::new("start_date")
            .computable()
            .compatible(&[ValueKind::Date])];
        let raw = RawParams::from_pairs([("start-date", "THIS CARD.Owner")]);

        let err = resolve_all(&defs, &raw, &ctx).unwrap_err();
        assert!(matches!(err, ParameterError::IncompatibleType { .. }));
        assert!(err.to_string().contains("THIS CARD.Owner"));
    }

    #[test]
    fn this_card_without_card_context_falls_back_to_default() {
        let project = TestProject;
        let defs = vec![ParameterDefinition::new("start_date")
            .computable()
            .compatible(&[ValueKind::Date])
            .default_value("2024-01-01")];
        let raw = RawParams::from_pairs([("start-date", "THIS CARD.Due Date")]);

        let resolved = resolve_all(&defs, &raw, &ctx(&project)).unwrap();
        assert_eq!(resolved.text("start_date"), Some("2024-01-01"));
    }

    #[test]
    fn project_variable_resolves() {
        let project = TestProject;
        let defs = vec![ParameterDefinition::new("target_release")
            .computable()
            .compatible(&[ValueKind::Card])];
        let raw = RawParams::from_pairs([("target-release", "(release)")]);

        let resolved = resolve_all(&defs, &raw, &ctx(&project)).unwrap();
        assert_eq!(resolved.text("target_release"), Some("42"));
    }

    #[test]
    fn unknown_project_variable_reads_as_not_set() {
        let project = TestProject;
        let defs = vec![ParameterDefinition::new("target_release")
            .computable()
            .compatible(&[ValueKind::Card])
            .default_value("1")];
        let raw = RawParams::from_pairs([("target-release", "(no such thing)")]);

        let resolved = resolve_all(&defs, &raw, &ctx(&project)).unwrap();
        assert_eq!(resolved.text("target_release"), Some("1"));
    }

    #[test]
    fn blank_value_falls_back_to_default() {
        let project = TestProject;
        let defs = vec![ParameterDefinition::new("label").default_value("(not set)")];
        let raw = RawParams::from_pairs([("label", "   ")]);

        let resolved = resolve_all(&defs, &raw, &ctx(&project)).unwrap();
        assert_eq!(resolved.text("label"), Some("(not set)"));
    }

    #[test]
    fn series_elements_resolve_independently_in_order() {
        let project = TestProject;
        let element_schema = vec![
            ParameterDefinition::new("label").default_value("(untitled)"),
            ParameterDefinition::new("data").required(),
        ];
        let defs =
            vec![ParameterDefinition::new("series").required().list_of(element_schema)];

        let mut raw = RawParams::new();
        raw.insert_series(vec![
            RawParams::from_pairs([("label", "Open"), ("data", "SELECT a")]),
            RawParams::from_pairs([("data", "SELECT b")]),
        ]);

        let resolved = resolve_all(&defs, &raw, &ctx(&project)).unwrap();
        let series = resolved.series("series").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].text("label"), Some("Open"));
        assert_eq!(series[1].text("label"), Some("(untitled)"));
        assert_eq!(series[1].text("data"), Some("SELECT b"));
    }

    #[test]
    fn required_series_missing_raises() {
        let project = TestProject;
        let defs = vec![ParameterDefinition::new("series")
            .required()
            .list_of(vec![ParameterDefinition::new("data")])];

        let err = resolve_all(&defs, &RawParams::new(), &ctx(&project)).unwrap_err();
        assert_eq!(err.to_string(), "parameter series is required");
    }

    #[test]
    fn resolution_is_idempotent() {
        let project = TestProject;
        let defs = vec![
            ParameterDefinition::new("query").required(),
            ParameterDefinition::new("target_release")
                .computable()
                .compatible(&[ValueKind::Card]),
            ParameterDefinition::new("chart_width").default_value("440"),
        ];
        let raw = RawParams::from_pairs([
            ("query", "SELECT status"),
            ("target-release", "(release)"),
        ]);

        let first = resolve_all(&defs, &raw, &ctx(&project)).unwrap();
        let second = resolve_all(&defs, &raw, &ctx(&project)).unwrap();
        assert_eq!(first, second);
    }
}
