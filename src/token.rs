//! Tokenizer for Jack source.
//!
//! Produces a flat `Vec<Token>` from a source buffer using longest-match
//! lexical rules tried in priority order: comment, keyword, identifier,
//! symbol, string constant, integer constant. Comments are recognized and
//! discarded here; the parser never sees them.

use std::path::Path;

use crate::error::{JackError, SourceLocation};

pub const KEYWORDS: &[&str] = &[
    "class",
    "constructor",
    "function",
    "method",
    "field",
    "static",
    "var",
    "int",
    "char",
    "boolean",
    "void",
    "true",
    "false",
    "null",
    "this",
    "let",
    "do",
    "if",
    "else",
    "while",
    "return",
];

const SYMBOLS: &[char] = &[
    '{', '}', '(', ')', '[', ']', '.', ',', ';', '+', '-', '*', '/', '&', '|', '<', '>', '=', '~',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Symbol,
    Identifier,
    IntConst,
    StringConst,
}

/// An immutable `(kind, lexeme)` pair plus the position it was lexed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }
}

impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        self.lexeme == *other
    }
}

/// Lex `source` into a finite, source-ordered token sequence.
///
/// `file` is attached to every lexical error for diagnostics; it plays no
/// role in tokenization itself.
pub fn tokenize(source: &str, file: &Path) -> Result<Vec<Token>, JackError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut line = 0usize;
    let mut col = 0usize;

    let advance = |i: &mut usize, line: &mut usize, col: &mut usize, chars: &[char]| {
        if chars[*i] == '\n' {
            *line += 1;
            *col = 0;
        } else {
            *col += 1;
        }
        *i += 1;
    };

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            advance(&mut i, &mut line, &mut col, &chars);
            continue;
        }

        // Comments: // to end of line, or /* ... */ (possibly multi-line).
        if c == '/' && i + 1 < chars.len() && chars[i + 1] == '/' {
            while i < chars.len() && chars[i] != '\n' {
                advance(&mut i, &mut line, &mut col, &chars);
            }
            continue;
        }
        if c == '/' && i + 1 < chars.len() && chars[i + 1] == '*' {
            let (start_line, start_col) = (line, col);
            advance(&mut i, &mut line, &mut col, &chars);
            advance(&mut i, &mut line, &mut col, &chars);
            let mut closed = false;
            while i + 1 < chars.len() {
                if chars[i] == '*' && chars[i + 1] == '/' {
                    advance(&mut i, &mut line, &mut col, &chars);
                    advance(&mut i, &mut line, &mut col, &chars);
                    closed = true;
                    break;
                }
                advance(&mut i, &mut line, &mut col, &chars);
            }
            if !closed {
                return Err(JackError::Lexical {
                    loc: SourceLocation::new(file.to_path_buf(), start_line, start_col),
                    message: "unterminated block comment".to_string(),
                });
            }
            continue;
        }

        // String constant: delimited by '"', no embedded newline or quote.
        if c == '"' {
            let (start_line, start_col) = (line, col);
            advance(&mut i, &mut line, &mut col, &chars);
            let mut s = String::new();
            let mut closed = false;
            while i < chars.len() {
                if chars[i] == '"' {
                    advance(&mut i, &mut line, &mut col, &chars);
                    closed = true;
                    break;
                }
                if chars[i] == '\n' {
                    break;
                }
                s.push(chars[i]);
                advance(&mut i, &mut line, &mut col, &chars);
            }
            if !closed {
                return Err(JackError::Lexical {
                    loc: SourceLocation::new(file.to_path_buf(), start_line, start_col),
                    message: "unterminated string constant".to_string(),
                });
            }
            tokens.push(Token::new(TokenKind::StringConst, s, start_line, start_col));
            continue;
        }

        // Identifier or keyword: [A-Za-z_][A-Za-z0-9_]*
        if c.is_ascii_alphabetic() || c == '_' {
            let (start_line, start_col) = (line, col);
            let mut s = String::new();
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                s.push(chars[i]);
                advance(&mut i, &mut line, &mut col, &chars);
            }
            let kind = if KEYWORDS.contains(&s.as_str()) {
                TokenKind::Keyword
            } else {
                TokenKind::Identifier
            };
            tokens.push(Token::new(kind, s, start_line, start_col));
            continue;
        }

        // Integer constant: [0-9]+
        if c.is_ascii_digit() {
            let (start_line, start_col) = (line, col);
            let mut s = String::new();
            while i < chars.len() && chars[i].is_ascii_digit() {
                s.push(chars[i]);
                advance(&mut i, &mut line, &mut col, &chars);
            }
            tokens.push(Token::new(TokenKind::IntConst, s, start_line, start_col));
            continue;
        }

        // Symbol
        if SYMBOLS.contains(&c) {
            let (start_line, start_col) = (line, col);
            advance(&mut i, &mut line, &mut col, &chars);
            tokens.push(Token::new(
                TokenKind::Symbol,
                c.to_string(),
                start_line,
                start_col,
            ));
            continue;
        }

        return Err(JackError::Lexical {
            loc: SourceLocation::new(file.to_path_buf(), line, col),
            message: format!("unexpected character '{c}'"),
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn lex(src: &str) -> Vec<Token> {
        tokenize(src, &PathBuf::from("Test.jack")).unwrap()
    }

    #[test]
    fn tokenizes_keywords_identifiers_and_symbols() {
        let tokens = lex("class Foo { field int x; }");
        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(
            lexemes,
            vec!["class", "Foo", "{", "field", "int", "x", ";", "}"]
        );
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[2].kind, TokenKind::Symbol);
    }

    #[test]
    fn strips_line_and_block_comments() {
        let tokens = lex("// leading\nlet x /* inline */ = 1; // trailing\n");
        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["let", "x", "=", "1", ";"]);
    }

    #[test]
    fn reads_string_constants() {
        let tokens = lex(r#""Hello, World!""#);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::StringConst);
        assert_eq!(tokens[0].lexeme, "Hello, World!");
    }

    #[test]
    fn rejects_unterminated_string() {
        let err = tokenize(r#"let x = "oops"#, &PathBuf::from("Test.jack")).unwrap_err();
        assert!(matches!(err, JackError::Lexical { .. }));
    }

    #[test]
    fn rejects_unexpected_character() {
        let err = tokenize("let x = 1 @ 2;", &PathBuf::from("Test.jack")).unwrap_err();
        assert!(matches!(err, JackError::Lexical { .. }));
    }

    #[test]
    fn tracks_line_numbers_across_multiline_comments() {
        let tokens = lex("/* line0\nline1\nline2 */\nvar int y;");
        assert_eq!(tokens[0].line, 3);
    }
}
