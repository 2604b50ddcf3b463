//! Lexer for the layer-stack expression language using logos

use logos::Logos;

use crate::error::ParseError;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    // Literal keywords
    #[token("True")]
    True,
    #[token("False")]
    False,
    #[token("None")]
    None,

    // Operators (longer patterns first)
    #[token("**")]
    DoubleStar,
    #[token("*")]
    Star,
    #[token("//")]
    DoubleSlash,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,

    // Delimiters
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token(",")]
    Comma,
    #[token("=")]
    Equals,
    #[token(".")]
    Dot,

    // Literals - identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r"'([^'\\\n]|\\.)*'", |lex| unescape(strip_quotes(lex.slice())))]
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape(strip_quotes(lex.slice())))]
    String(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    // Comments (skip)
    #[regex(r"#[^\n]*", logos::skip)]
    LineComment,
}

fn strip_quotes(s: &str) -> &str {
    &s[1..s.len() - 1]
}

/// Resolve backslash escapes inside a quoted literal.
///
/// Unknown escapes keep their backslash, like the host language this
/// grammar is modelled on.
fn unescape(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            'x' => out.push(hex_escape(&mut chars, 2)?),
            'u' => out.push(hex_escape(&mut chars, 4)?),
            'U' => out.push(hex_escape(&mut chars, 8)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Some(out)
}

fn hex_escape(chars: &mut std::str::Chars<'_>, digits: usize) -> Option<char> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.len() != digits {
        return None;
    }
    u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
}

/// Lex input string into tokens with spans
///
/// Unlike a permissive lexer, any character outside the grammar aborts with
/// a syntax error: the sandbox never guesses at input it cannot read.
pub fn lex(input: &str) -> Result<Vec<(Token, Span)>, ParseError> {
    Token::lexer(input)
        .spanned()
        .map(|(tok, span)| match tok {
            Ok(t) => Ok((t, span)),
            Err(()) => {
                let found = &input[span.clone()];
                // Integers past i64 become floats; the number guard rejects them
                if found.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(x) = found.parse::<f64>() {
                        return Ok((Token::Float(x), span));
                    }
                }
                Err(ParseError::Syntax {
                    span,
                    message: format!("Unexpected input '{}'", found),
                    expected: vec![],
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        lex(input).expect("should lex").into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_call_with_keywords() {
        assert_eq!(
            tokens("RectangleLayer(pos=(0, 0))"),
            vec![
                Token::Ident("RectangleLayer".to_string()),
                Token::ParenOpen,
                Token::Ident("pos".to_string()),
                Token::Equals,
                Token::ParenOpen,
                Token::Int(0),
                Token::Comma,
                Token::Int(0),
                Token::ParenClose,
                Token::ParenClose,
            ]
        );
    }

    #[test]
    fn test_literal_keywords() {
        assert_eq!(
            tokens("True False None Truthy"),
            vec![
                Token::True,
                Token::False,
                Token::None,
                Token::Ident("Truthy".to_string())
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens("42 3.14 1e3 .5 -10"),
            vec![
                Token::Int(42),
                Token::Float(3.14),
                Token::Float(1000.0),
                Token::Float(0.5),
                Token::Minus,
                Token::Int(10)
            ]
        );
    }

    #[test]
    fn test_oversized_integer_lexes_as_float() {
        assert_eq!(
            tokens("99999999999999999999 9223372036854775807"),
            vec![Token::Float(1e20), Token::Int(i64::MAX)]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            tokens("+ - * ** / // %"),
            vec![
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::DoubleStar,
                Token::Slash,
                Token::DoubleSlash,
                Token::Percent
            ]
        );
    }

    #[test]
    fn test_strings_both_quotes() {
        assert_eq!(
            tokens(r#"'single' "double""#),
            vec![
                Token::String("single".to_string()),
                Token::String("double".to_string())
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens(r#"'it\'s\né\q'"#),
            vec![Token::String("it's\n\u{e9}\\q".to_string())]
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            tokens("ImageStack( # background\n)"),
            vec![
                Token::Ident("ImageStack".to_string()),
                Token::ParenOpen,
                Token::ParenClose
            ]
        );
    }

    #[test]
    fn test_unknown_character_is_error() {
        let err = lex("ImageStack({})").unwrap_err();
        match err {
            ParseError::Syntax { span, .. } => assert_eq!(span, 11..12),
        }
    }

    #[test]
    fn test_integer_overflow_is_error() {
        assert!(lex("99999999999999999999999").is_err());
    }
}
