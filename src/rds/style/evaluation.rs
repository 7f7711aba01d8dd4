//! Template evaluation
//!
//! Walks a [`CompiledTemplate`] against a [`MetadataContext`] and produces one
//! string per top-level group. Evaluation only reads the template, so one
//! template can be evaluated from any number of places at once.
//!
//! Omission rules:
//!
//!     - A field with no value contributes nothing and marks its enclosing
//!       subgroup as unsatisfied.
//!     - An unsatisfied subgroup contributes nothing, literals included. The
//!       omission stops at that subgroup's brackets: the parent is not marked.
//!     - A top-level group whose text is empty or only whitespace is dropped
//!       from the output.

use crate::rds::metadata::MetadataContext;
use crate::rds::style::ast::{CompiledTemplate, Group, Segment};
use serde::Serialize;

/// Lines produced by one evaluation, in source order, none of them blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EvaluatedOutput {
    lines: Vec<String>,
}

impl EvaluatedOutput {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl IntoIterator for EvaluatedOutput {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.into_iter()
    }
}

/// Evaluate every group of `template` against `context`.
pub fn evaluate(template: &CompiledTemplate, context: &MetadataContext) -> EvaluatedOutput {
    let lines = template
        .groups()
        .iter()
        .filter_map(|group| evaluate_group(group, context))
        .collect();
    EvaluatedOutput { lines }
}

/// Evaluate a single top-level group, `None` when it renders blank.
pub fn evaluate_group(group: &Group, context: &MetadataContext) -> Option<String> {
    let mut out = String::new();
    render(group, context, &mut out);
    if out.trim().is_empty() {
        None
    } else {
        Some(out)
    }
}

/// An open subgroup during [`render`].
struct Frame<'a> {
    segments: std::slice::Iter<'a, Segment>,
    /// Length of the output before this subgroup started.
    mark: usize,
    satisfied: bool,
}

/// Append `group` to `out`. Returns `false` if one of its own fields had no value.
///
/// Subgroups are walked with an explicit stack, so nesting depth is not limited by
/// the thread's stack size.
fn render(group: &Group, context: &MetadataContext, out: &mut String) -> bool {
    let mut stack = vec![Frame {
        segments: group.segments.iter(),
        mark: out.len(),
        satisfied: true,
    }];
    while let Some(frame) = stack.last_mut() {
        match frame.segments.next() {
            Some(Segment::Literal(text)) => out.push_str(text),
            Some(Segment::Field(kind)) => match context.lookup(*kind) {
                Some(value) => out.push_str(value),
                None => frame.satisfied = false,
            },
            Some(Segment::Subgroup(inner)) => stack.push(Frame {
                segments: inner.segments.iter(),
                mark: out.len(),
                satisfied: true,
            }),
            None => {
                let Some(done) = stack.pop() else { break };
                if stack.is_empty() {
                    return done.satisfied;
                }
                if !done.satisfied {
                    out.truncate(done.mark);
                }
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rds::style::{parse, FieldKind};

    fn eval(source: &str, context: &MetadataContext) -> Vec<String> {
        evaluate(&parse(source), context).into_lines()
    }

    #[test]
    fn test_deep_subgroups_are_evaluated() {
        let depth = 50_000;
        let source = format!("{}{{T}}{}x", "[".repeat(depth), "]".repeat(depth));
        let ctx = MetadataContext::new().with(FieldKind::Title, "t");
        assert_eq!(eval(&source, &ctx), vec!["tx"]);
        assert_eq!(eval(&source, &MetadataContext::new()), vec!["x"]);
    }

    #[test]
    fn test_top_level_field_does_not_truncate() {
        let template = parse("a{G}b");
        let mut out = String::new();
        assert!(!render(&template.groups()[0], &MetadataContext::new(), &mut out));
        assert_eq!(out, "ab");
    }

    #[test]
    fn test_subgroup_omitted_without_value() {
        let empty = MetadataContext::new();
        assert_eq!(eval("A[ - {A}]", &empty), vec!["A"]);

        let queen = MetadataContext::new().with(FieldKind::Artist, "Queen");
        assert_eq!(eval("A[ - {A}]", &queen), vec!["A - Queen"]);
    }

    #[test]
    fn test_empty_group_is_dropped() {
        let ctx = MetadataContext::new().with(FieldKind::Title, "Silent Night");
        assert_eq!(eval("{T}|{A}", &ctx), vec!["Silent Night"]);
    }

    #[test]
    fn test_nested_omission_is_contained() {
        let ctx = MetadataContext::new().with(FieldKind::Title, "Silent Night");
        assert_eq!(eval("[{T}[ ({A})]]", &ctx), vec!["Silent Night"]);
    }

    #[test]
    fn test_top_level_missing_field_is_empty_text() {
        let ctx = MetadataContext::new().with(FieldKind::Title, "Silent Night");
        assert_eq!(eval("{T} by {A}", &ctx), vec!["Silent Night by "]);
    }

    #[test]
    fn test_whitespace_only_group_is_dropped() {
        let ctx = MetadataContext::new();
        assert!(eval("   ", &ctx).is_empty());
        assert_eq!(eval(" [{T}] |x", &ctx), vec!["x"]);
    }

    #[test]
    fn test_leading_whitespace_is_kept() {
        let ctx = MetadataContext::new();
        assert_eq!(eval("Merry|Christ-|  -mas!", &ctx), vec!["Merry", "Christ-", "  -mas!"]);
    }

    #[test]
    fn test_subgroup_without_fields_always_renders() {
        assert_eq!(eval("[abc]", &MetadataContext::new()), vec!["abc"]);
    }

    #[test]
    fn test_any_missing_field_omits_subgroup() {
        let mut ctx = MetadataContext::new();
        ctx.set_track_number(3);
        assert!(eval("[Track {N} of {C}]", &ctx).is_empty());
        ctx.set_playlist_count(10);
        assert_eq!(eval("[Track {N} of {C}]", &ctx), vec!["Track 3 of 10"]);
    }
}
