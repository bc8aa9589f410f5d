//! Deterministic follow-up resolution against the previous result.
//!
//! Short instructions such as "only names", "sort by salary desc", "top 3"
//! or "dept_id = 2" are answered by transforming a copy of the most recent
//! frame instead of asking the model for new SQL. Anything the rules cannot
//! handle comes back as [`Resolution::NotApplicable`] and is routed to query
//! synthesis.

pub mod rules;
pub mod transform;

use tracing::debug;

use tabletalk_core::frame::TabularFrame;

use self::rules::{default_rules, is_bare_comparison, FollowUpRule, RuleInput};
pub use self::transform::{CompareOp, FilterValue, Transform};

/// Words that point back at the previous result.
const BACK_REFERENCE_CUES: &[&str] = &[
    "above",
    "them",
    "their",
    "those",
    "these",
    "same",
    "previous",
    "earlier",
    "that list",
    "now ",
];

/// Leading words of a bare instruction.
const INSTRUCTION_STARTS: &[&str] = &[
    "sort", "only", "show", "just", "top", "first", "last", "bottom",
];

/// Result of trying to resolve an utterance without the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Applied {
        transform: Transform,
        frame: TabularFrame,
    },
    NotApplicable,
}

impl Resolution {
    pub fn is_applied(&self) -> bool {
        matches!(self, Resolution::Applied { .. })
    }
}

/// Runs the ordered rule list against a copy of the prior frame.
pub struct FollowUpResolver {
    rules: Vec<Box<dyn FollowUpRule>>,
}

impl Default for FollowUpResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FollowUpResolver {
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Resolve `utterance` against `prior`. Never mutates `prior`.
    pub fn resolve(&self, utterance: &str, prior: Option<&TabularFrame>) -> Resolution {
        let Some(prior) = prior.filter(|f| !f.is_empty()) else {
            return Resolution::NotApplicable;
        };

        let raw = utterance.trim();
        let lower = raw.to_lowercase();
        let working = prior.with_name_column();

        if !looks_like_follow_up(raw, &lower, &working) {
            debug!("Utterance does not look like a follow-up");
            return Resolution::NotApplicable;
        }

        let input = RuleInput {
            raw,
            lower: &lower,
            frame: &working,
        };
        for rule in &self.rules {
            let Some(transform) = rule.plan(&input) else {
                continue;
            };
            match transform.apply(&working) {
                Ok(frame) => {
                    debug!(rule = rule.name(), transform = %transform, rows = frame.row_count(), "Follow-up applied");
                    return Resolution::Applied { transform, frame };
                }
                Err(e) => {
                    debug!(rule = rule.name(), error = %e, "Follow-up transform failed");
                }
            }
        }
        Resolution::NotApplicable
    }
}

/// Cheap gate run before any rule so new questions are not hijacked.
fn looks_like_follow_up(raw: &str, lower: &str, frame: &TabularFrame) -> bool {
    BACK_REFERENCE_CUES.iter().any(|cue| lower.contains(cue))
        || INSTRUCTION_STARTS.iter().any(|w| lower.starts_with(w))
        || lower.contains("filter")
        || is_bare_comparison(raw, frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabletalk_core::frame::{Column, Value};

    fn employees() -> TabularFrame {
        TabularFrame::new(vec![
            Column::new("emp_id", vec![1.into(), 2.into(), 3.into()]),
            Column::new("first_name", vec!["Ada".into(), "Alan".into(), "Grace".into()]),
            Column::new("last_name", vec!["Lovelace".into(), "Turing".into(), "Hopper".into()]),
            Column::new("salary", vec![50000.into(), 90000.into(), 30000.into()]),
        ])
        .unwrap()
    }

    fn numbered(rows: i64) -> TabularFrame {
        TabularFrame::new(vec![
            Column::new("n", (1..=rows).map(Value::from).collect()),
            Column::new("dept_id", (1..=rows).map(|i| Value::from(i % 3)).collect()),
        ])
        .unwrap()
    }

    fn applied(resolution: Resolution) -> (Transform, TabularFrame) {
        match resolution {
            Resolution::Applied { transform, frame } => (transform, frame),
            Resolution::NotApplicable => panic!("expected the follow-up to apply"),
        }
    }

    fn ints(frame: &TabularFrame, column: &str) -> Vec<i64> {
        frame
            .column(column)
            .unwrap()
            .values()
            .iter()
            .map(|v| match v {
                Value::Integer(i) => *i,
                other => panic!("not an integer: {other:?}"),
            })
            .collect()
    }

    // ---- Guards ----

    #[test]
    fn test_no_prior_frame() {
        let resolver = FollowUpResolver::new();
        for utterance in ["sort by salary desc", "only names", "top 3", "dept_id = 2"] {
            assert_eq!(resolver.resolve(utterance, None), Resolution::NotApplicable);
        }
    }

    #[test]
    fn test_empty_prior_frame() {
        let resolver = FollowUpResolver::new();
        let empty = employees().head(0);
        assert_eq!(resolver.resolve("top 3", Some(&empty)), Resolution::NotApplicable);
    }

    #[test]
    fn test_precheck_short_circuits_new_questions() {
        let resolver = FollowUpResolver::new();
        let frame = employees();
        // Contains "only" and a number, but reads as a fresh question.
        assert_eq!(
            resolver.resolve("which departments have only 2 employees", Some(&frame)),
            Resolution::NotApplicable
        );
        assert_eq!(
            resolver.resolve("list all projects", Some(&frame)),
            Resolution::NotApplicable
        );
    }

    #[test]
    fn test_precheck_accepts_cue_words() {
        let resolver = FollowUpResolver::new();
        let (transform, _) = applied(resolver.resolve("give me the top 2 of those", Some(&employees())));
        assert_eq!(
            transform,
            Transform::Limit {
                count: 2,
                from_end: false
            }
        );
    }

    #[test]
    fn test_precheck_rejects_comparison_inside_question() {
        let resolver = FollowUpResolver::new();
        let frame = TabularFrame::new(vec![
            Column::new("emp_id", vec![1.into(), 2.into()]),
            Column::new("dept_id", vec![3.into(), 4.into()]),
            Column::new("salary", vec![60000.into(), 40000.into()]),
        ])
        .unwrap();
        for utterance in [
            "list all employees where dept_id = 3",
            "how many projects have budget where salary > 50000 in the whole company",
        ] {
            assert_eq!(
                resolver.resolve(utterance, Some(&frame)),
                Resolution::NotApplicable,
                "{utterance}"
            );
        }
        assert!(resolver.resolve("dept_id = 3", Some(&frame)).is_applied());
    }

    #[test]
    fn test_precheck_comparison_on_unknown_column() {
        let resolver = FollowUpResolver::new();
        assert_eq!(
            resolver.resolve("bonus > 3", Some(&employees())),
            Resolution::NotApplicable
        );
    }

    // ---- Scenarios ----

    #[test]
    fn test_only_names_projects_derived_column() {
        let resolver = FollowUpResolver::new();
        let (_, frame) = applied(resolver.resolve("only names", Some(&employees())));
        assert_eq!(frame.column_names(), vec!["name"]);
        assert_eq!(
            frame.column("name").unwrap().values(),
            &[
                Value::from("Ada Lovelace"),
                Value::from("Alan Turing"),
                Value::from("Grace Hopper")
            ]
        );
    }

    #[test]
    fn test_sort_by_salary_desc() {
        let resolver = FollowUpResolver::new();
        let (_, frame) = applied(resolver.resolve("sort by salary desc", Some(&employees())));
        assert_eq!(ints(&frame, "salary"), vec![90000, 50000, 30000]);
    }

    #[test]
    fn test_top_and_last_three() {
        let resolver = FollowUpResolver::new();
        let frame = numbered(10);
        let (_, top) = applied(resolver.resolve("top 3", Some(&frame)));
        assert_eq!(ints(&top, "n"), vec![1, 2, 3]);
        let (_, last) = applied(resolver.resolve("last 3", Some(&frame)));
        assert_eq!(ints(&last, "n"), vec![8, 9, 10]);
    }

    #[test]
    fn test_bare_comparison_filters() {
        let resolver = FollowUpResolver::new();
        let frame = numbered(10);
        let (transform, filtered) = applied(resolver.resolve("dept_id = 2", Some(&frame)));
        assert_eq!(
            transform,
            Transform::Filter {
                column: "dept_id".to_string(),
                op: CompareOp::Eq,
                value: FilterValue::Integer(2),
            }
        );
        assert_eq!(ints(&filtered, "dept_id"), vec![2, 2, 2]);
        assert_eq!(ints(&filtered, "n"), vec![2, 5, 8]);
    }

    // ---- Rule ordering ----

    #[test]
    fn test_projection_beats_limit() {
        let resolver = FollowUpResolver::new();
        let (transform, _) = applied(resolver.resolve("only salary 2", Some(&employees())));
        assert_eq!(transform, Transform::Project(vec!["salary".to_string()]));
    }

    #[test]
    fn test_unknown_projection_falls_through_to_limit() {
        let resolver = FollowUpResolver::new();
        let (transform, _) = applied(resolver.resolve("show only 2", Some(&employees())));
        assert_eq!(
            transform,
            Transform::Limit {
                count: 2,
                from_end: false
            }
        );
    }

    #[test]
    fn test_sort_beats_limit() {
        let resolver = FollowUpResolver::new();
        let (transform, _) = applied(resolver.resolve("sort top 2 by salary", Some(&employees())));
        assert!(matches!(transform, Transform::Sort { .. }));
    }

    #[test]
    fn test_nothing_matches_after_precheck() {
        let resolver = FollowUpResolver::new();
        assert_eq!(
            resolver.resolve("what about those", Some(&employees())),
            Resolution::NotApplicable
        );
    }

    // ---- Properties ----

    #[test]
    fn test_resolution_never_mutates_input() {
        let resolver = FollowUpResolver::new();
        let frame = employees();
        let before = frame.clone();
        for utterance in [
            "only names",
            "sort by salary desc",
            "top 2",
            "salary > 40000",
            "show emp_id, salary",
        ] {
            resolver.resolve(utterance, Some(&frame));
            assert_eq!(frame, before, "mutated by {utterance}");
        }
    }

    #[test]
    fn test_results_are_row_subsets() {
        let resolver = FollowUpResolver::new();
        let frame = employees().with_name_column();
        let original: Vec<Vec<Value>> = frame
            .rows()
            .map(|r| r.into_iter().cloned().collect())
            .collect();
        for utterance in [
            "sort by salary",
            "sort them by salary desc",
            "top 2",
            "last 1",
            "salary >= 50000",
            "filter emp_id < 3",
        ] {
            let (_, out) = applied(resolver.resolve(utterance, Some(&frame)));
            assert!(out.row_count() <= frame.row_count());
            assert_eq!(out.column_names(), frame.column_names());
            for row in out.rows() {
                let row: Vec<Value> = row.into_iter().cloned().collect();
                assert!(original.contains(&row), "{utterance} produced a foreign row");
            }
        }
    }

    #[test]
    fn test_projection_is_idempotent() {
        let resolver = FollowUpResolver::new();
        let (_, once) = applied(resolver.resolve("only name, salary", Some(&employees())));
        let (_, twice) = applied(resolver.resolve("only name, salary", Some(&once)));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sort_is_stable() {
        let resolver = FollowUpResolver::new();
        let frame = TabularFrame::new(vec![
            Column::new("salary", vec![10.into(), 20.into(), 10.into(), 20.into(), 10.into()]),
            Column::new("seq", vec![1.into(), 2.into(), 3.into(), 4.into(), 5.into()]),
        ])
        .unwrap();
        let (_, asc) = applied(resolver.resolve("sort by salary", Some(&frame)));
        assert_eq!(ints(&asc, "seq"), vec![1, 3, 5, 2, 4]);
        let (_, desc) = applied(resolver.resolve("sort by salary desc", Some(&frame)));
        assert_eq!(ints(&desc, "seq"), vec![2, 4, 1, 3, 5]);
    }
}
