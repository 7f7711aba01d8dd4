//! Output formats for compiled templates
//!
//! Style string
//!
//!     [`to_style_string`] writes a template back as style text. Literal control
//!     characters are escaped, subgroups always get an explicit `]`, and groups are
//!     joined with `|`. Parsing the result gives back an equal group tree, except
//!     for a literal `\` placed directly before a structural character, which the
//!     grammar has no way to spell.
//!
//! Treeviz
//!
//!     One line per node, nesting shown with box drawing connectors:
//!
//!         <prefix><connector> <icon> <label>
//!
//!     Icons
//!         Template: ⧉
//!         Group (one RDS line): ↵
//!         Literal: ◦
//!         Field: ⊕
//!         Subgroup: ⊂

use crate::rds::style::ast::{CompiledTemplate, Group, Segment};

const CONTROL: [char; 5] = ['{', '}', '[', ']', '|'];

/// Render a template as style text.
pub fn to_style_string(template: &CompiledTemplate) -> String {
    template
        .groups()
        .iter()
        .map(group_to_style_string)
        .collect::<Vec<_>>()
        .join("|")
}

fn group_to_style_string(group: &Group) -> String {
    let mut out = String::new();
    let mut pending = vec![group.segments.iter()];
    while let Some(segments) = pending.last_mut() {
        match segments.next() {
            Some(Segment::Literal(text)) => {
                for ch in text.chars() {
                    if CONTROL.contains(&ch) {
                        out.push('\\');
                    }
                    out.push(ch);
                }
            }
            Some(Segment::Field(kind)) => out.push_str(&kind.to_string()),
            Some(Segment::Subgroup(inner)) => {
                out.push('[');
                pending.push(inner.segments.iter());
            }
            None => {
                pending.pop();
                if !pending.is_empty() {
                    out.push(']');
                }
            }
        }
    }
    out
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let mut truncated = s.chars().take(max_chars).collect::<String>();
        truncated.push_str("...");
        truncated
    } else {
        s.to_string()
    }
}

/// Render a template as a tree, one node per line.
pub fn to_treeviz_str(template: &CompiledTemplate) -> String {
    let mut output = format!("⧉ {}\n", truncate(template.source(), 30));
    let count = template.groups().len();
    for (i, group) in template.groups().iter().enumerate() {
        let is_last = i + 1 == count;
        output.push_str(&node_line("", is_last, "↵", &format!("line {}", i + 1)));
        format_segments(&mut output, &group.segments, child_prefix("", is_last));
    }
    output
}

/// Children still to print under one node.
struct Level<'a> {
    children: std::iter::Enumerate<std::slice::Iter<'a, Segment>>,
    count: usize,
    prefix: String,
}

fn format_segments(output: &mut String, segments: &[Segment], prefix: String) {
    let mut stack = vec![Level {
        children: segments.iter().enumerate(),
        count: segments.len(),
        prefix,
    }];
    while let Some(level) = stack.last_mut() {
        let Some((index, segment)) = level.children.next() else {
            stack.pop();
            continue;
        };
        let is_last = index + 1 == level.count;
        match segment {
            Segment::Literal(text) => {
                let label = format!("{:?}", truncate(text, 30));
                output.push_str(&node_line(&level.prefix, is_last, "◦", &label));
            }
            Segment::Field(kind) => {
                let label = format!("{} {}", kind, kind.label());
                output.push_str(&node_line(&level.prefix, is_last, "⊕", &label));
            }
            Segment::Subgroup(inner) => {
                output.push_str(&node_line(&level.prefix, is_last, "⊂", "subgroup"));
                let prefix = child_prefix(&level.prefix, is_last);
                stack.push(Level {
                    children: inner.segments.iter().enumerate(),
                    count: inner.segments.len(),
                    prefix,
                });
            }
        }
    }
}

fn node_line(prefix: &str, is_last: bool, icon: &str, label: &str) -> String {
    let connector = if is_last { "└─" } else { "├─" };
    format!("{}{} {} {}\n", prefix, connector, icon, label)
}

fn child_prefix(prefix: &str, is_last: bool) -> String {
    format!("{}{}", prefix, if is_last { "  " } else { "│ " })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rds::style::parse;

    #[test]
    fn test_style_string_escapes_literals() {
        let template = parse(r"a\|b{X}|[c\]]");
        assert_eq!(to_style_string(&template), r"a\|b\{X\}|[c\]]");
    }

    #[test]
    fn test_style_string_closes_implicit_subgroups() {
        let template = parse("x[{A}|y");
        assert_eq!(to_style_string(&template), "x[{A}]|y");
    }

    #[test]
    fn test_style_string_reparses_to_same_groups() {
        let template = parse("Merry|{T}[ by {A}]|[Track {N} of {C}]|a]b{Z}");
        let again = parse(&to_style_string(&template));
        assert_eq!(template.groups(), again.groups());
    }

    #[test]
    fn test_treeviz() {
        let template = parse("{T}[ by {A}]|Merry");
        insta::assert_snapshot!(to_treeviz_str(&template).trim_end(), @r###"
        ⧉ {T}[ by {A}]|Merry
        ├─ ↵ line 1
        │ ├─ ⊕ {T} Title
        │ └─ ⊂ subgroup
        │   ├─ ◦ " by "
        │   └─ ⊕ {A} Artist
        └─ ↵ line 2
          └─ ◦ "Merry"
        "###);
    }

    #[test]
    fn test_treeviz_truncates_long_source() {
        let template = parse("abcdefghijklmnopqrstuvwxyz0123456789");
        let first_line = to_treeviz_str(&template)
            .lines()
            .next()
            .map(str::to_string);
        assert_eq!(
            first_line.as_deref(),
            Some("⧉ abcdefghijklmnopqrstuvwxyz0123...")
        );
    }

    #[test]
    fn test_deep_subgroups() {
        let depth = 2_000;
        let template = parse(&format!("{}x", "[".repeat(depth)));
        let expected = format!("{}x{}", "[".repeat(depth), "]".repeat(depth));
        assert_eq!(to_style_string(&template), expected);

        let tree = to_treeviz_str(&template);
        assert_eq!(tree.lines().count(), depth + 3);
        assert!(tree.trim_end().ends_with("◦ \"x\""));
    }
}
