//! Ordered follow-up rules.
//!
//! Each rule inspects the utterance and the prior frame and either plans a
//! [`Transform`] or declines. The resolver tries them in the order returned
//! by [`default_rules`]; the first rule that plans something wins.

use std::sync::LazyLock;

use regex::Regex;

use tabletalk_core::frame::{ColumnType, TabularFrame};

use super::transform::{CompareOp, FilterValue, Transform};

// =============================================================================
// Compiled patterns
// =============================================================================

static PROJECTION_LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:only|just|show)\s+([a-z0-9_,\s]+)").unwrap());

static NAME_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bnames?\b").unwrap());

static BY_PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bby\s+([a-z_ ]+)").unwrap());

static LIMIT_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:first|top|only|limit|last|bottom)?\s*(\d+)").unwrap());

static COMPARISON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*(>=|<=|=|>|<)\s*([A-Za-z0-9\-./_]+)").unwrap()
});

static BARE_COMPARISON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*(>=|<=|=|>|<)\s*([A-Za-z0-9\-./_]+)\s*$").unwrap()
});

/// Columns probed, in order, when a sort names no column explicitly.
const SORT_DOMAIN_COLUMNS: &[&str] = &[
    "salary",
    "hire_date",
    "dept_id",
    "department_id",
    "emp_id",
    "employee_id",
    "job_id",
];

const DESCENDING_WORDS: &[&str] = &["desc", "descending", "reverse", "largest", "highest"];

const LIMIT_WORDS: &[&str] = &["top", "first", "limit", "only", "last", "bottom"];

const TAIL_WORDS: &[&str] = &["last", "bottom"];

// =============================================================================
// Rule seam
// =============================================================================

/// What a rule gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    /// Trimmed utterance as typed.
    pub raw: &'a str,
    /// Trimmed, lower-cased utterance.
    pub lower: &'a str,
    /// Prior frame with the derived name column already applied.
    pub frame: &'a TabularFrame,
}

pub trait FollowUpRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Plan a transform, or `None` when the rule does not apply.
    fn plan(&self, input: &RuleInput<'_>) -> Option<Transform>;
}

/// Projection, sort, limit, filter.
pub fn default_rules() -> Vec<Box<dyn FollowUpRule>> {
    vec![
        Box::new(ProjectionRule),
        Box::new(SortRule),
        Box::new(LimitRule),
        Box::new(FilterRule),
    ]
}

// =============================================================================
// Column lookup
// =============================================================================

/// Resolve an identifier to a column name: exact match first, then ASCII
/// case-insensitive.
pub fn find_column(frame: &TabularFrame, ident: &str) -> Option<String> {
    if frame.has_column(ident) {
        return Some(ident.to_string());
    }
    frame
        .column_names()
        .into_iter()
        .find(|c| c.eq_ignore_ascii_case(ident))
        .map(str::to_string)
}

/// `names` if present, else `name`.
fn name_column(frame: &TabularFrame) -> Option<String> {
    ["names", "name"]
        .into_iter()
        .find(|c| frame.has_column(c))
        .map(str::to_string)
}

/// A `<identifier> <op> <value>` clause whose identifier names a column.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub column: String,
    pub op: CompareOp,
    pub literal: String,
}

/// Take the first comparison in `raw`. Declines when its identifier is not
/// a column of `frame`.
pub fn parse_comparison(raw: &str, frame: &TabularFrame) -> Option<Comparison> {
    let caps = COMPARISON_RE.captures(raw)?;
    let column = find_column(frame, &caps[1])?;
    let op = CompareOp::from_symbol(&caps[2])?;
    Some(Comparison {
        column,
        op,
        literal: caps[3].to_string(),
    })
}

/// True when the whole utterance is one comparison on a column of `frame`,
/// e.g. `dept_id = 2`.
pub fn is_bare_comparison(raw: &str, frame: &TabularFrame) -> bool {
    BARE_COMPARISON_RE
        .captures(raw)
        .is_some_and(|caps| find_column(frame, &caps[1]).is_some())
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

// =============================================================================
// Rules
// =============================================================================

/// "only names", "show name, salary", "just their salary".
pub struct ProjectionRule;

impl FollowUpRule for ProjectionRule {
    fn name(&self) -> &'static str {
        "projection"
    }

    fn plan(&self, input: &RuleInput<'_>) -> Option<Transform> {
        let text = input.lower;
        if !contains_any(text, &["only", "just", "show"]) || text.contains("sort") {
            return None;
        }

        if let Some(caps) = PROJECTION_LIST_RE.captures_iter(text).last() {
            let mut wanted: Vec<String> = Vec::new();
            for entry in caps[1].split(',') {
                let entry = entry.split_whitespace().collect::<Vec<_>>().join("_");
                let resolved = match find_column(input.frame, &entry) {
                    Some(col) => Some(col),
                    None if entry == "name" || entry == "names" => name_column(input.frame),
                    None => None,
                };
                if let Some(col) = resolved {
                    if !wanted.contains(&col) {
                        wanted.push(col);
                    }
                }
            }
            if !wanted.is_empty() {
                return Some(Transform::Project(wanted));
            }
        }

        if text.contains("salary") {
            if let Some(col) = find_column(input.frame, "salary") {
                return Some(Transform::Project(vec![col]));
            }
        }
        if NAME_WORD_RE.is_match(text) {
            if let Some(col) = name_column(input.frame) {
                return Some(Transform::Project(vec![col]));
            }
        }
        None
    }
}

/// "sort by salary desc", "order by hire date".
pub struct SortRule;

impl SortRule {
    fn target(input: &RuleInput<'_>) -> Option<String> {
        let text = input.lower;
        let frame = input.frame;

        if let Some(caps) = BY_PHRASE_RE.captures(text) {
            let words: Vec<&str> = caps[1].split_whitespace().collect();
            for len in (1..=words.len()).rev() {
                if let Some(col) = find_column(frame, &words[..len].join("_")) {
                    return Some(col);
                }
            }
        }

        if NAME_WORD_RE.is_match(text) {
            if let Some(col) = name_column(frame) {
                return Some(col);
            }
        }

        for candidate in SORT_DOMAIN_COLUMNS {
            let spaced = candidate.replace('_', " ");
            if text.contains(candidate) || text.contains(&spaced) {
                if let Some(col) = find_column(frame, candidate) {
                    return Some(col);
                }
            }
        }

        frame
            .columns()
            .iter()
            .find(|c| c.kind() == ColumnType::Text)
            .or_else(|| frame.columns().first())
            .map(|c| c.name().to_string())
    }
}

impl FollowUpRule for SortRule {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn plan(&self, input: &RuleInput<'_>) -> Option<Transform> {
        if !input.lower.contains("sort") && !input.lower.contains("order by") {
            return None;
        }
        let column = Self::target(input)?;
        Some(Transform::Sort {
            column,
            descending: contains_any(input.lower, DESCENDING_WORDS),
        })
    }
}

/// "top 3", "last 5", "first 10".
pub struct LimitRule;

impl FollowUpRule for LimitRule {
    fn name(&self) -> &'static str {
        "limit"
    }

    fn plan(&self, input: &RuleInput<'_>) -> Option<Transform> {
        if !contains_any(input.lower, LIMIT_WORDS) {
            return None;
        }
        let caps = LIMIT_COUNT_RE.captures(input.lower)?;
        let count: usize = caps[1].parse().ok()?;
        Some(Transform::Limit {
            count,
            from_end: contains_any(input.lower, TAIL_WORDS),
        })
    }
}

/// "salary > 50000", "filter where dept_id = 2".
pub struct FilterRule;

impl FilterRule {
    fn coerce(frame: &TabularFrame, comparison: &Comparison) -> Option<FilterValue> {
        let kind = frame.column(&comparison.column)?.kind();
        let literal = comparison.literal.as_str();
        match kind {
            ColumnType::Integer => {
                let digits: String = literal
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '-')
                    .collect();
                digits.parse().ok().map(FilterValue::Integer)
            }
            ColumnType::Float => {
                let digits: String = literal
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                    .collect();
                digits.parse().ok().map(FilterValue::Float)
            }
            _ => Some(FilterValue::Text(literal.to_string())),
        }
    }
}

impl FollowUpRule for FilterRule {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn plan(&self, input: &RuleInput<'_>) -> Option<Transform> {
        let text = input.lower;
        let has_operator = CompareOp::ALL.iter().any(|op| text.contains(op.symbol()));
        if !text.contains("filter") && !text.contains("where") && !has_operator {
            return None;
        }
        let comparison = parse_comparison(input.raw, input.frame)?;
        let value = Self::coerce(input.frame, &comparison)?;
        Some(Transform::Filter {
            column: comparison.column,
            op: comparison.op,
            value,
        })
    }
}
