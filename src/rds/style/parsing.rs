//! Style string parser
//!
//! Builds the group tree from the token stream in a single pass over a stack of
//! open groups: the root group at the bottom and one subgroup per open `[` above it.
//!
//! Bracket pairing is decided before that pass. A `[` that has a matching `]`
//! somewhere later owns everything up to that `]`, pipes included, so pipes only
//! split at the top level. A `[` without a partner stays open until the next
//! pipe that is not inside a matched pair, or until end of input, and is closed
//! there as if the `]` had been written. A `]` without a partner is text.
//!
//! The parser never fails; it is bounded by the number of tokens.

use crate::rds::style::ast::{CompiledTemplate, FieldKind, Group, Segment};
use crate::rds::style::lexing::tokenize;
use crate::rds::style::token::Token;

/// Parse a style string into a template.
pub fn parse(source: &str) -> CompiledTemplate {
    let tokens = tokenize(source);
    CompiledTemplate::new(source, parse_tokens(&tokens))
}

/// Build the top-level groups from an already tokenized style string.
///
/// Groups with no segments at all (`"a||b"`, a trailing pipe) are not kept.
pub fn parse_tokens(tokens: &[Token]) -> Vec<Group> {
    let paired = pair_brackets(tokens);

    let mut groups = Vec::new();
    let mut stack = vec![Group::default()];
    // Number of open subgroups whose `[` has a partner.
    let mut paired_depth = 0usize;

    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            Token::GroupOpen => {
                if paired[i] {
                    paired_depth += 1;
                }
                stack.push(Group::default());
            }
            Token::GroupClose if paired[i] => {
                // A paired `]` always closes the subgroup its partner opened.
                close_top(&mut stack);
                paired_depth -= 1;
            }
            Token::Pipe if paired_depth == 0 => {
                finish_group(&mut stack, &mut groups);
            }
            Token::FieldOpen => {
                let (segment, consumed) = parse_field(&tokens[i..]);
                top(&mut stack).push_segment(segment);
                i += consumed;
                continue;
            }
            other => top(&mut stack).push_text(&other.literal_text()),
        }
        i += 1;
    }

    finish_group(&mut stack, &mut groups);
    groups
}

fn top(stack: &mut [Group]) -> &mut Group {
    // The root group is never popped, `finish_group` swaps it out instead.
    stack.last_mut().expect("root group is always present")
}

/// Pop the innermost open subgroup into its parent.
fn close_top(stack: &mut Vec<Group>) {
    if stack.len() < 2 {
        return;
    }
    if let Some(group) = stack.pop() {
        top(stack).push_segment(Segment::Subgroup(group));
    }
}

/// Close every open subgroup and move the finished root group to `groups`.
fn finish_group(stack: &mut Vec<Group>, groups: &mut Vec<Group>) {
    while stack.len() > 1 {
        close_top(stack);
    }
    let root = std::mem::replace(top(stack), Group::default());
    if !root.is_empty() {
        groups.push(root);
    }
}

/// Mark every `[` and `]` that has a partner. Pipes do not interrupt pairing.
fn pair_brackets(tokens: &[Token]) -> Vec<bool> {
    let mut paired = vec![false; tokens.len()];
    let mut open = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        match token {
            Token::GroupOpen => open.push(index),
            Token::GroupClose => {
                if let Some(start) = open.pop() {
                    paired[start] = true;
                    paired[index] = true;
                }
            }
            _ => {}
        }
    }
    paired
}

/// Read a field reference starting at a `{`.
///
/// Returns the resulting segment and how many tokens it used. Only `{`, a single
/// character, `}` forms a reference; an unknown code keeps the whole run as text,
/// and any other shape leaves the `{` as text on its own.
fn parse_field(tokens: &[Token]) -> (Segment, usize) {
    let code = match tokens.get(1) {
        Some(Token::Text(text)) => single_char(text),
        Some(Token::Escaped(c)) => Some(*c),
        _ => None,
    };

    match (code, tokens.get(2)) {
        (Some(code), Some(Token::FieldClose)) => match FieldKind::from_code(code) {
            Some(kind) => (Segment::Field(kind), 3),
            None => {
                tracing::trace!(%code, "unknown field code kept as text");
                (Segment::Literal(format!("{{{}}}", code)), 3)
            }
        },
        _ => (Segment::Literal("{".to_string()), 1),
    }
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
