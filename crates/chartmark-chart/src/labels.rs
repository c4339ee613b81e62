//! X-axis label derivation
//!
//! Raw grouping keys from the query results become display labels according
//! to the kind of the grouping property:
//!
//! - **numeric**: keys are reconciled at the property's precision, so
//!   `1.5` and `1.50` share one position; labels sort ascending
//! - **date**: every calendar day between the first and last key (or the
//!   explicit boundary overrides) gets a label, data or not
//! - **card**: labels render as `#N Name`
//! - **tree**: ancestor paths missing from the data are filled in, in
//!   first-observed depth-first order
//! - **text / user**: distinct keys in first-observed order

use crate::error::{ChartError, ChartResult};
use chartmark_data::{Project, PropertyDefinition, ValueKind};
use chrono::Duration;
use std::collections::HashMap;

/// Which raw spelling represents a group of numerically equal keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericTieBreak {
    /// The spelling with the most decimal places
    #[default]
    HighestPrecision,
    /// The spelling observed first
    FirstSeen,
}

/// Inputs for label derivation
pub struct LabelOptions<'a> {
    /// Definition of the grouping property
    pub property: &'a PropertyDefinition,
    /// Project supplying date/number formatting
    pub project: &'a dyn Project,
    /// Explicit first-label override for date axes
    pub start: Option<&'a str>,
    /// Explicit last-label override for date axes
    pub end: Option<&'a str>,
    /// Spelling choice for numerically equal keys
    pub tie_break: NumericTieBreak,
}

/// Derived axis labels plus the raw-key positions feeding them
#[derive(Debug, Clone, Default)]
pub struct LabelSet {
    labels: Vec<String>,
    positions: HashMap<String, usize>,
}

impl LabelSet {
    /// Display labels in axis order
    #[inline]
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Axis position of a raw key
    #[must_use]
    pub fn position(&self, raw_key: &str) -> Option<usize> {
        self.positions.get(raw_key).copied()
    }

    /// Number of axis positions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the axis is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn push(&mut self, label: String) -> usize {
        self.labels.push(label);
        self.labels.len() - 1
    }
}

/// Derive axis labels from the raw key universe
///
/// `keys` must be distinct and in first-observed order across all series.
///
/// # Errors
/// Fails when a date boundary override does not parse in the project's
/// date format.
pub fn derive_labels(keys: &[String], opts: &LabelOptions<'_>) -> ChartResult<LabelSet> {
    match opts.property.kind {
        ValueKind::Numeric => Ok(numeric_labels(keys, opts)),
        ValueKind::Date => date_labels(keys, opts),
        ValueKind::Card => Ok(card_labels(keys, opts)),
        ValueKind::Tree => Ok(tree_labels(keys)),
        ValueKind::Text | ValueKind::User => Ok(verbatim_labels(keys)),
    }
}

fn verbatim_labels(keys: &[String]) -> LabelSet {
    let mut set = LabelSet::default();
    for key in keys {
        if !set.positions.contains_key(key) {
            let pos = set.push(key.clone());
            set.positions.insert(key.clone(), pos);
        }
    }
    set
}

fn numeric_labels(keys: &[String], opts: &LabelOptions<'_>) -> LabelSet {
    struct Group {
        value: f64,
        representative: String,
        members: Vec<String>,
    }

    let precision = opts
        .property
        .precision
        .unwrap_or_else(|| opts.project.precision());
    let factor = 10f64.powi(precision as i32);

    let mut groups: Vec<Group> = Vec::new();
    let mut by_rounded: HashMap<i64, usize> = HashMap::new();
    let mut unparseable: Vec<String> = Vec::new();

    for key in keys {
        let Ok(value) = key.trim().parse::<f64>() else {
            tracing::debug!(key, "non-numeric key on a numeric axis");
            unparseable.push(key.clone());
            continue;
        };
        let rounded = (value * factor).round() as i64;
        match by_rounded.get(&rounded) {
            Some(&idx) => {
                let group = &mut groups[idx];
                group.members.push(key.clone());
                if opts.tie_break == NumericTieBreak::HighestPrecision
                    && decimal_places(key) > decimal_places(&group.representative)
                {
                    group.representative = key.clone();
                }
            }
            None => {
                by_rounded.insert(rounded, groups.len());
                groups.push(Group {
                    value: rounded as f64 / factor,
                    representative: key.clone(),
                    members: vec![key.clone()],
                });
            }
        }
    }

    groups.sort_by(|a, b| a.value.total_cmp(&b.value));

    let mut set = LabelSet::default();
    for group in groups {
        let pos = set.push(group.representative);
        for member in group.members {
            set.positions.insert(member, pos);
        }
    }
    for key in unparseable {
        let pos = set.push(key.clone());
        set.positions.insert(key, pos);
    }
    set
}

fn decimal_places(raw: &str) -> usize {
    raw.trim()
        .split_once('.')
        .map_or(0, |(_, frac)| frac.len())
}

fn date_labels(keys: &[String], opts: &LabelOptions<'_>) -> ChartResult<LabelSet> {
    let mut parsed: Vec<(String, chrono::NaiveDate)> = Vec::new();
    let mut unparseable: Vec<String> = Vec::new();
    for key in keys {
        match opts.project.parse_date(key) {
            Ok(date) => parsed.push((key.clone(), date)),
            Err(_) => {
                tracing::debug!(key, "undated key on a date axis");
                unparseable.push(key.clone());
            }
        }
    }

    let boundary = |raw: &str| {
        opts.project
            .parse_date(raw)
            .map_err(ChartError::InvalidDateBoundary)
    };

    let data_min = parsed.iter().map(|(_, d)| *d).min();
    let data_max = parsed.iter().map(|(_, d)| *d).max();
    let start = match opts.start {
        Some(raw) => Some(boundary(raw)?),
        None => data_min,
    };
    let end = match opts.end {
        Some(raw) => Some(boundary(raw)?),
        None => data_max,
    };

    let mut set = LabelSet::default();
    if let (Some(start), Some(end)) = (start, end) {
        let mut positions_by_date: HashMap<chrono::NaiveDate, usize> = HashMap::new();
        let mut day = start;
        while day <= end {
            let pos = set.push(opts.project.format_date(day));
            positions_by_date.insert(day, pos);
            day += Duration::days(1);
        }
        for (key, date) in parsed {
            // keys outside an explicit boundary fall off the axis
            if let Some(&pos) = positions_by_date.get(&date) {
                set.positions.insert(key, pos);
            }
        }
    }
    for key in unparseable {
        let pos = set.push(key.clone());
        set.positions.insert(key, pos);
    }
    Ok(set)
}

fn card_labels(keys: &[String], opts: &LabelOptions<'_>) -> LabelSet {
    let mut set = LabelSet::default();
    for key in keys {
        if set.positions.contains_key(key) {
            continue;
        }
        let label = match key.trim().trim_start_matches('#').parse::<u64>() {
            Ok(number) => match opts.project.card_name(number) {
                Some(name) => format!("#{number} {name}"),
                None => format!("#{number}"),
            },
            Err(_) => key.clone(),
        };
        let pos = set.push(label);
        set.positions.insert(key.clone(), pos);
    }
    set
}

fn tree_labels(keys: &[String]) -> LabelSet {
    let mut set = LabelSet::default();
    let mut seen: HashMap<String, usize> = HashMap::new();
    for key in keys {
        let segments: Vec<&str> = key.split(" > ").collect();
        let mut last_pos = 0;
        for depth in 1..=segments.len() {
            let path = segments[..depth].join(" > ");
            last_pos = match seen.get(&path) {
                Some(&pos) => pos,
                None => {
                    let pos = set.push(path.clone());
                    seen.insert(path, pos);
                    pos
                }
            };
        }
        set.positions.insert(key.clone(), last_pos);
    }
    set
}
