//! Macro block extraction and body parsing
//!
//! Macro blocks are double-brace delimited:
//!
//! ```text
//! {{ data-series-chart
//!   cumulative: true
//!   series:
//!     - label: Open
//!       data: SELECT 'Iteration', COUNT(*)
//! }}
//! ```
//!
//! Since a document may embed several macros of the same type, occurrences
//! are order-addressed: `extract` locates the N-th (1-based) block of a
//! given type. The body is a restricted YAML mapping; before handing it to
//! the YAML parser each line's value is auto-quoted when it is a bare hex
//! color (`#` starts a YAML comment) or contains an odd number of quote
//! characters (unescaped quotes in query snippets).

use crate::context::MacroContext;
use crate::error::{MacroError, MacroResult, SYNTAX_MESSAGE};
use crate::registry::{Macro, MacroRegistry};
use chartmark_data::ProjectRegistry;
use chartmark_params::RawParams;
use once_cell::sync::Lazy;
use regex::Regex;

static MACRO_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\{\{\s*([A-Za-z][A-Za-z0-9_-]*)(.*?)\}\}").expect("macro block pattern")
});

/// A located, constructed macro together with its effective context
///
/// The context differs from the caller's when the macro carried an explicit
/// `project` parameter.
pub struct Extraction {
    /// The constructed macro
    pub macro_instance: Box<dyn Macro>,
    /// Context the macro must execute under
    pub ctx: MacroContext,
    /// 1-based ordinal position within the document
    pub position: usize,
}

impl std::fmt::Debug for Extraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extraction")
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

/// Locates macro blocks in raw text and constructs macro instances
pub struct Extractor<'a> {
    registry: &'a MacroRegistry,
    projects: &'a ProjectRegistry,
}

impl<'a> Extractor<'a> {
    /// Create an extractor over a macro registry and project registry
    #[inline]
    #[must_use]
    pub fn new(registry: &'a MacroRegistry, projects: &'a ProjectRegistry) -> Self {
        Self { registry, projects }
    }

    /// The macro registry this extractor constructs from
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &MacroRegistry {
        self.registry
    }

    /// Extract and construct the N-th macro of a type from raw text
    ///
    /// # Errors
    /// [`MacroError::Processing`] for an unknown macro name, a missing
    /// occurrence, malformed parameters, or a failing constructor. YAML
    /// failures carry the fixed [`SYNTAX_MESSAGE`].
    pub fn extract(
        &self,
        text: &str,
        name: &str,
        position: usize,
        ctx: &MacroContext,
    ) -> MacroResult<Extraction> {
        let body = self
            .nth_body(text, name, position)
            .ok_or_else(|| {
                MacroError::processing_in(
                    format!("Macro {name} not found at position {position}"),
                    ctx.project.identifier(),
                )
            })?;

        let raw = parse_parameters(&body)?;
        let ctx = self.effective_context(ctx, &raw)?;
        let macro_instance = self.registry.construct(name, &ctx, &raw)?;

        Ok(Extraction {
            macro_instance,
            ctx,
            position,
        })
    }

    /// Extract, construct, and execute; failures yield an empty string
    ///
    /// Extraction inside a larger document render is best-effort: one bad
    /// macro must not fail the whole document.
    pub fn extract_and_generate(
        &self,
        text: &str,
        name: &str,
        position: usize,
        ctx: &MacroContext,
    ) -> String {
        match self
            .extract(text, name, position, ctx)
            .and_then(|extraction| extraction.macro_instance.execute(&extraction.ctx))
        {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(macro_name = name, position, error = %err, "macro generation failed");
                String::new()
            }
        }
    }

    fn nth_body(&self, text: &str, name: &str, position: usize) -> Option<String> {
        MACRO_BLOCK
            .captures_iter(text)
            .filter(|caps| &caps[1] == name)
            .nth(position.checked_sub(1)?)
            .map(|caps| caps[2].to_string())
    }

    fn effective_context(
        &self,
        ctx: &MacroContext,
        raw: &RawParams,
    ) -> MacroResult<MacroContext> {
        let Some(identifier) = raw.scalar("project") else {
            return Ok(ctx.clone());
        };
        let identifier = identifier.trim();
        if identifier.is_empty() || identifier == ctx.project.identifier() {
            return Ok(ctx.clone());
        }
        let project = self.projects.get(identifier).ok_or_else(|| {
            MacroError::processing_in(
                format!("There is no project with identifier {identifier}"),
                ctx.project.identifier(),
            )
        })?;
        Ok(ctx.with_project(project))
    }
}

impl std::fmt::Debug for Extractor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("macros", &self.registry.names())
            .finish()
    }
}

/// Parse a macro body into a raw parameter map
///
/// # Errors
/// Any YAML-level failure maps to the fixed [`SYNTAX_MESSAGE`]; raw parser
/// exception text is never surfaced.
pub fn parse_parameters(body: &str) -> MacroResult<RawParams> {
    let prepared = prepare_yaml(body);
    if prepared.trim().is_empty() {
        return Ok(RawParams::new());
    }

    let value: serde_yaml::Value = serde_yaml::from_str(&prepared)
        .map_err(|_| MacroError::processing(SYNTAX_MESSAGE))?;

    match value {
        serde_yaml::Value::Null => Ok(RawParams::new()),
        serde_yaml::Value::Mapping(mapping) => mapping_to_params(mapping),
        _ => Err(MacroError::processing(SYNTAX_MESSAGE)),
    }
}

fn mapping_to_params(mapping: serde_yaml::Mapping) -> MacroResult<RawParams> {
    let mut params = RawParams::new();
    for (key, value) in mapping {
        let key = scalar_to_string(&key).ok_or_else(|| MacroError::processing(SYNTAX_MESSAGE))?;
        match value {
            serde_yaml::Value::Sequence(elements) if key == "series" => {
                let mut series = Vec::with_capacity(elements.len());
                for element in elements {
                    match element {
                        serde_yaml::Value::Mapping(inner) => {
                            series.push(mapping_to_params(inner)?);
                        }
                        _ => return Err(MacroError::processing(SYNTAX_MESSAGE)),
                    }
                }
                params.insert_series(series);
            }
            serde_yaml::Value::Null => params.insert(key, ""),
            other => {
                let scalar = scalar_to_string(&other)
                    .ok_or_else(|| MacroError::processing(SYNTAX_MESSAGE))?;
                params.insert(key, scalar);
            }
        }
    }
    Ok(params)
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Dedent the body and auto-quote values YAML would mangle
fn prepare_yaml(body: &str) -> String {
    let dedented = dedent(body);
    dedented
        .lines()
        .map(quote_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn dedent(body: &str) -> String {
    let indent = body
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);
    body.lines()
        .map(|line| if line.len() >= indent { &line[indent..] } else { line })
        .collect::<Vec<_>>()
        .join("\n")
}

fn quote_line(line: &str) -> String {
    let Some(colon) = line.find(':') else {
        return line.to_string();
    };
    let (head, rest) = line.split_at(colon);
    let value = rest[1..].trim();

    if value.is_empty() || is_quoted(value) {
        return line.to_string();
    }

    let needs_quoting = value.starts_with('#')
        || value.matches('"').count() % 2 == 1
        || value.matches('\'').count() % 2 == 1;

    if needs_quoting {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("{head}: \"{escaped}\"")
    } else {
        line.to_string()
    }
}

fn is_quoted(value: &str) -> bool {
    value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
}
