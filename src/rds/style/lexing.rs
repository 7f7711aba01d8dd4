//! Base tokenization for style strings
//!
//! This module provides convenience functions for tokenizing style text.
//! The actual tokenization is handled entirely by logos.

use crate::rds::style::token::Token;
use logos::Logos;

/// Tokenize a style string and collect all tokens
pub fn tokenize(source: &str) -> Vec<Token> {
    tokenize_with_spans(source)
        .into_iter()
        .map(|(token, _)| token)
        .collect()
}

/// Tokenize a style string and collect tokens with their byte spans
pub fn tokenize_with_spans(source: &str) -> Vec<(Token, logos::Span)> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            // Unreachable with the current token set; keep the text rather than drop it.
            Err(()) => tokens.push((Token::Text(lexer.slice().to_owned()), lexer.span())),
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(tokenize(""), vec![]);
    }

    #[test]
    fn test_default_rt_style() {
        let tokens = tokenize("Merry Christmas!|{T}[ by {A}]");
        assert_eq!(
            tokens,
            vec![
                Token::Text("Merry Christmas!".to_string()),
                Token::Pipe,
                Token::FieldOpen,
                Token::Text("T".to_string()),
                Token::FieldClose,
                Token::GroupOpen,
                Token::Text(" by ".to_string()),
                Token::FieldOpen,
                Token::Text("A".to_string()),
                Token::FieldClose,
                Token::GroupClose,
            ]
        );
    }

    #[test]
    fn test_spans_cover_source() {
        let source = "Noël|{T}\\";
        let spans: Vec<_> = tokenize_with_spans(source)
            .into_iter()
            .map(|(_, span)| span)
            .collect();
        assert_eq!(spans.first().map(|s| s.start), Some(0));
        assert_eq!(spans.last().map(|s| s.end), Some(source.len()));
        for pair in spans.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_only_control_characters() {
        assert_eq!(tokenize("]]||[[").len(), 6);
    }
}
