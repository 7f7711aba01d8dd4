//! Compiled form of a style string.
//!
//! A [`CompiledTemplate`] is built once per style string and shared read-only by
//! every evaluation until the style string changes. Nothing in here is mutated
//! after parsing.

use serde::Serialize;
use std::fmt;

/// The values a style string can reference, one per `{X}` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FieldKind {
    Title,
    Artist,
    Album,
    Genre,
    TrackNumber,
    /// Pre-formatted as `M:SS`.
    TrackLength,
    /// Item count in the main playlist section.
    PlaylistCount,
    /// Item position in the main playlist section.
    PlaylistPosition,
}

impl FieldKind {
    pub const ALL: [FieldKind; 8] = [
        FieldKind::Title,
        FieldKind::Artist,
        FieldKind::Album,
        FieldKind::Genre,
        FieldKind::TrackNumber,
        FieldKind::TrackLength,
        FieldKind::PlaylistCount,
        FieldKind::PlaylistPosition,
    ];

    /// Map a one-letter field code. Codes are case sensitive.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'T' => Some(FieldKind::Title),
            'A' => Some(FieldKind::Artist),
            'B' => Some(FieldKind::Album),
            'G' => Some(FieldKind::Genre),
            'N' => Some(FieldKind::TrackNumber),
            'L' => Some(FieldKind::TrackLength),
            'C' => Some(FieldKind::PlaylistCount),
            'P' => Some(FieldKind::PlaylistPosition),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            FieldKind::Title => 'T',
            FieldKind::Artist => 'A',
            FieldKind::Album => 'B',
            FieldKind::Genre => 'G',
            FieldKind::TrackNumber => 'N',
            FieldKind::TrackLength => 'L',
            FieldKind::PlaylistCount => 'C',
            FieldKind::PlaylistPosition => 'P',
        }
    }

    /// Human readable name, as shown in the style text guide.
    pub fn label(self) -> &'static str {
        match self {
            FieldKind::Title => "Title",
            FieldKind::Artist => "Artist",
            FieldKind::Album => "Album",
            FieldKind::Genre => "Genre",
            FieldKind::TrackNumber => "Track Number",
            FieldKind::TrackLength => "Track Length",
            FieldKind::PlaylistCount => "Playlist Count",
            FieldKind::PlaylistPosition => "Playlist Position",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.code())
    }
}

/// One piece of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Segment {
    /// Text emitted verbatim. Escapes are already resolved.
    Literal(String),
    /// A `{X}` reference.
    Field(FieldKind),
    /// A bracketed run, dropped as a whole when any field inside it is empty.
    Subgroup(Group),
}

/// Ordered segments. At the top level, one group is one RDS line.
///
/// Nesting depth is unbounded; drop, clone and equality walk the tree with an
/// explicit stack.
#[derive(Debug, Default, Serialize)]
pub struct Group {
    pub segments: Vec<Segment>,
}

impl Group {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Every field referenced in this group, nested subgroups included, in source order.
    pub fn fields(&self) -> Vec<FieldKind> {
        let mut fields = Vec::new();
        let mut pending = vec![self.segments.iter()];
        while let Some(segments) = pending.last_mut() {
            match segments.next() {
                Some(Segment::Field(kind)) => fields.push(*kind),
                Some(Segment::Subgroup(inner)) => pending.push(inner.segments.iter()),
                Some(Segment::Literal(_)) => {}
                None => {
                    pending.pop();
                }
            }
        }
        fields
    }

    /// Append literal text, merging with a trailing literal segment.
    pub(crate) fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Literal(existing)) = self.segments.last_mut() {
            existing.push_str(text);
        } else {
            self.segments.push(Segment::Literal(text.to_string()));
        }
    }

    /// Append a segment, merging adjacent literals.
    pub(crate) fn push_segment(&mut self, segment: Segment) {
        match segment {
            Segment::Literal(text) => self.push_text(&text),
            other => self.segments.push(other),
        }
    }
}

impl Drop for Group {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.segments);
        while let Some(segment) = pending.pop() {
            if let Segment::Subgroup(mut inner) = segment {
                pending.append(&mut inner.segments);
            }
        }
    }
}

impl Clone for Group {
    fn clone(&self) -> Self {
        let mut pending = vec![(self.segments.iter(), Group::default())];
        while let Some((segments, copy)) = pending.last_mut() {
            match segments.next() {
                Some(Segment::Subgroup(inner)) => {
                    pending.push((inner.segments.iter(), Group::default()));
                }
                Some(segment) => copy.segments.push(segment.clone()),
                None => {
                    if let Some((_, done)) = pending.pop() {
                        match pending.last_mut() {
                            Some((_, parent)) => parent.segments.push(Segment::Subgroup(done)),
                            None => return done,
                        }
                    }
                }
            }
        }
        Group::default()
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((left, right)) = pending.pop() {
            if left.segments.len() != right.segments.len() {
                return false;
            }
            for pair in left.segments.iter().zip(&right.segments) {
                match pair {
                    (Segment::Subgroup(a), Segment::Subgroup(b)) => pending.push((a, b)),
                    (Segment::Literal(a), Segment::Literal(b)) if a == b => {}
                    (Segment::Field(a), Segment::Field(b)) if a == b => {}
                    _ => return false,
                }
            }
        }
        true
    }
}

impl Eq for Group {}

/// Immutable result of parsing one style string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompiledTemplate {
    source: String,
    groups: Vec<Group>,
}

impl CompiledTemplate {
    pub fn new(source: impl Into<String>, groups: Vec<Group>) -> Self {
        Self {
            source: source.into(),
            groups,
        }
    }

    /// The style string this template was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for kind in FieldKind::ALL {
            assert_eq!(FieldKind::from_code(kind.code()), Some(kind));
        }
    }

    #[test]
    fn test_codes_are_case_sensitive() {
        assert_eq!(FieldKind::from_code('t'), None);
        assert_eq!(FieldKind::from_code('X'), None);
    }

    #[test]
    fn test_push_text_merges_literals() {
        let mut group = Group::default();
        group.push_text("a");
        group.push_text("");
        group.push_segment(Segment::Literal("b".to_string()));
        group.push_segment(Segment::Field(FieldKind::Title));
        group.push_text("c");
        assert_eq!(
            group.segments,
            vec![
                Segment::Literal("ab".to_string()),
                Segment::Field(FieldKind::Title),
                Segment::Literal("c".to_string()),
            ]
        );
    }

    #[test]
    fn test_fields_include_nested() {
        let group = Group::new(vec![
            Segment::Field(FieldKind::Title),
            Segment::Subgroup(Group::new(vec![
                Segment::Literal(" - ".to_string()),
                Segment::Subgroup(Group::new(vec![Segment::Field(FieldKind::Album)])),
                Segment::Field(FieldKind::Artist),
            ])),
        ]);
        assert_eq!(
            group.fields(),
            vec![FieldKind::Title, FieldKind::Album, FieldKind::Artist]
        );
    }

    fn nested(depth: usize) -> Group {
        let mut group = Group::new(vec![Segment::Field(FieldKind::Title)]);
        for _ in 0..depth {
            group = Group::new(vec![Segment::Subgroup(group)]);
        }
        group
    }

    #[test]
    fn test_deep_nesting_without_recursion() {
        let group = nested(200_000);
        assert_eq!(group.fields(), vec![FieldKind::Title]);

        let copy = group.clone();
        assert_eq!(copy, group);
        assert_ne!(copy, nested(199_999));
    }

    #[test]
    fn test_equality_compares_structure() {
        let a = Group::new(vec![Segment::Subgroup(Group::new(vec![Segment::Literal(
            "x".to_string(),
        )]))]);
        let b = Group::new(vec![Segment::Literal("x".to_string())]);
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }
}
