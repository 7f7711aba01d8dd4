//! Token definitions for RDS style text
//!
//! The tokens are defined using the logos derive macro. Every character of a style
//! string is claimed by exactly one variant, so tokenization cannot fail: runs of
//! ordinary characters become [`Token::Text`], the five control characters get
//! their own variants, and a backslash either escapes the control character that
//! follows it or stands for itself.
use logos::Logos;
use serde::Serialize;
use std::fmt;

/// All possible tokens in a style string
#[derive(Logos, Debug, PartialEq, Eq, Clone, Serialize)]
pub enum Token {
    // Structural markers
    #[token("{")]
    FieldOpen,
    #[token("}")]
    FieldClose,
    #[token("[")]
    GroupOpen,
    #[token("]")]
    GroupClose,
    #[token("|")]
    Pipe,

    // `\` followed by a control character: the character is literal
    #[regex(r"\\[{}\[\]|]", |lex| lex.slice().chars().nth(1))]
    Escaped(char),

    // `\` before anything else (or at end of input) is itself literal
    #[token("\\")]
    Backslash,

    // Text content (catch-all for non-control characters)
    #[regex(r"[^{}\[\]|\\]+", |lex| lex.slice().to_owned())]
    Text(String),
}

impl Token {
    /// Short kind name, used by the token listing formats.
    pub fn name(&self) -> &'static str {
        match self {
            Token::FieldOpen => "FieldOpen",
            Token::FieldClose => "FieldClose",
            Token::GroupOpen => "GroupOpen",
            Token::GroupClose => "GroupClose",
            Token::Pipe => "Pipe",
            Token::Escaped(_) => "Escaped",
            Token::Backslash => "Backslash",
            Token::Text(_) => "Text",
        }
    }

    /// The literal text this token stands for when it has no structural role.
    ///
    /// Structural tokens fall back to their source character, which is how the
    /// parser renders unmatched brackets and malformed field references.
    pub fn literal_text(&self) -> String {
        match self {
            Token::Text(s) => s.clone(),
            Token::Escaped(c) => c.to_string(),
            Token::Backslash => "\\".to_string(),
            Token::FieldOpen => "{".to_string(),
            Token::FieldClose => "}".to_string(),
            Token::GroupOpen => "[".to_string(),
            Token::GroupClose => "]".to_string(),
            Token::Pipe => "|".to_string(),
        }
    }
}

/// Writes the token back in style string form.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Escaped(c) => write!(f, "\\{}", c),
            other => write!(f, "{}", other.literal_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> Vec<Token> {
        Token::lexer(source).map(|t| t.expect("every character is a token")).collect()
    }

    #[test]
    fn test_structural_markers() {
        assert_eq!(
            lex_all("{}[]|"),
            vec![
                Token::FieldOpen,
                Token::FieldClose,
                Token::GroupOpen,
                Token::GroupClose,
                Token::Pipe
            ]
        );
    }

    #[test]
    fn test_text_runs_coalesce() {
        assert_eq!(
            lex_all("Merry Christmas!"),
            vec![Token::Text("Merry Christmas!".to_string())]
        );
    }

    #[test]
    fn test_escapes() {
        assert_eq!(
            lex_all(r"\|\{\}\[\]"),
            vec![
                Token::Escaped('|'),
                Token::Escaped('{'),
                Token::Escaped('}'),
                Token::Escaped('['),
                Token::Escaped(']'),
            ]
        );
    }

    #[test]
    fn test_backslash_before_ordinary_character() {
        assert_eq!(
            lex_all(r"a\b"),
            vec![
                Token::Text("a".to_string()),
                Token::Backslash,
                Token::Text("b".to_string())
            ]
        );
    }

    #[test]
    fn test_trailing_backslash() {
        assert_eq!(
            lex_all("end\\"),
            vec![Token::Text("end".to_string()), Token::Backslash]
        );
    }

    #[test]
    fn test_display_restores_source() {
        let source = r"{T}[ by \[{A}\]]|x\y";
        let rebuilt: String = lex_all(source).iter().map(|t| t.to_string()).collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_unicode_text() {
        assert_eq!(lex_all("Noël ♪"), vec![Token::Text("Noël ♪".to_string())]);
    }
}
