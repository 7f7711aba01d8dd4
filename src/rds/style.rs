//! RDS style text compiler
//!
//!     A style string describes how track and playlist values are assembled into the
//!     short text lines sent as RDS Program Service or RadioText. The pipeline is:
//!
//!         style string -> tokens -> CompiledTemplate -> EvaluatedOutput
//!
//!     Parsing happens once per style string change; evaluation runs on every
//!     metadata refresh against the same immutable template.
//!
//! Grammar
//!
//!     {X}     Field reference, X one of T A B G N L C P
//!     |       Splits the style string into independent lines
//!     [ ]     Subgroup, omitted entirely when any field inside it has no value
//!     \       Escapes one of | { } [ ]
//!
//!     End of input acts as a final pipe.
//!
//! Recovery
//!
//!     Nothing in a style string is an error. Unknown field codes and stray closing
//!     brackets are literal text; an unclosed `[` closes at the next top-level pipe or
//!     at end of input.

pub mod ast;
pub mod cache;
pub mod evaluation;
pub mod formats;
pub mod lexing;
pub mod parsing;
pub mod token;

pub use ast::{CompiledTemplate, FieldKind, Group, Segment};
pub use cache::TemplateCache;
pub use evaluation::{evaluate, EvaluatedOutput};
pub use lexing::{tokenize, tokenize_with_spans};
pub use parsing::{parse, parse_tokens};
pub use token::Token;
