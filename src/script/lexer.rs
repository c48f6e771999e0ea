use crate::diagnostic::Span;
use crate::script::error::ScriptError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Number(f64),
    Str(String),
    True,
    False,

    Let,
    If,
    Else,
    For,
    In,

    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Assign,
    DotDot,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    Bang,

    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    AndAnd,
    OrOr,

    Question,
    Colon,

    Eof,
}

impl TokenKind {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Ident(s) => format!("identifier `{s}`"),
            Self::Number(v) => format!("number `{v}`"),
            Self::Str(_) => "string literal".to_owned(),
            Self::Eof => "end of input".to_owned(),
            other => format!("`{}`", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::Let => "let",
            Self::If => "if",
            Self::Else => "else",
            Self::For => "for",
            Self::In => "in",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::Comma => ",",
            Self::Semi => ";",
            Self::Assign => "=",
            Self::DotDot => "..",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Bang => "!",
            Self::EqEq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::Question => "?",
            Self::Colon => ":",
            Self::Ident(_) | Self::Number(_) | Self::Str(_) | Self::Eof => "?",
        }
    }
}

/// Tokens plus every lexical error found. Bad characters are skipped so parsing can continue.
#[derive(Debug)]
pub(crate) struct Lexed {
    pub(crate) tokens: Vec<Token>,
    pub(crate) errors: Vec<ScriptError>,
}

pub(crate) fn lex(input: &str) -> Lexed {
    let mut out = Vec::new();
    let mut errors = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let start = i;

        // Line comment.
        if c == '/' && bytes.get(i + 1) == Some(&b'/') {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }

        // Number: [0-9]+(.[0-9]+)?([eE][+-]?[0-9]+)? or .[0-9]+
        if c.is_ascii_digit()
            || (c == '.' && i + 1 < bytes.len() && (bytes[i + 1] as char).is_ascii_digit())
        {
            if c == '.' {
                i += 1;
            } else {
                while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
                    i += 1;
                }
                // `0..10` is a range, not a fraction.
                if i < bytes.len()
                    && bytes[i] == b'.'
                    && i + 1 < bytes.len()
                    && (bytes[i + 1] as char).is_ascii_digit()
                {
                    i += 1;
                }
            }

            while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
                i += 1;
            }

            if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
                let e_pos = i;
                i += 1;
                if i < bytes.len() && matches!(bytes[i], b'+' | b'-') {
                    i += 1;
                }
                let exp_start = i;
                while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
                    i += 1;
                }
                if exp_start == i {
                    errors.push(ScriptError::new(
                        Span::new(e_pos, i),
                        "invalid number exponent (expected digits)",
                    ));
                    continue;
                }
            }

            match input[start..i].parse::<f64>() {
                Ok(v) => out.push(Token {
                    kind: TokenKind::Number(v),
                    span: Span::new(start, i),
                }),
                Err(_) => errors.push(ScriptError::new(Span::new(start, i), "invalid number")),
            }
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            i += 1;
            while i < bytes.len() {
                let ch = bytes[i] as char;
                if ch.is_ascii_alphanumeric() || ch == '_' {
                    i += 1;
                } else {
                    break;
                }
            }
            let kind = match &input[start..i] {
                "true" => TokenKind::True,
                "false" => TokenKind::False,
                "let" => TokenKind::Let,
                "if" => TokenKind::If,
                "else" => TokenKind::Else,
                "for" => TokenKind::For,
                "in" => TokenKind::In,
                s => TokenKind::Ident(s.to_owned()),
            };
            out.push(Token {
                kind,
                span: Span::new(start, i),
            });
            continue;
        }

        if c == '"' {
            match lex_string(input, start) {
                Ok((value, end)) => {
                    i = end;
                    out.push(Token {
                        kind: TokenKind::Str(value),
                        span: Span::new(start, end),
                    });
                }
                Err(e) => {
                    i = input.len();
                    errors.push(e);
                }
            }
            continue;
        }

        if i + 1 < bytes.len() {
            let kind = match &bytes[i..i + 2] {
                b"&&" => Some(TokenKind::AndAnd),
                b"||" => Some(TokenKind::OrOr),
                b"==" => Some(TokenKind::EqEq),
                b"!=" => Some(TokenKind::Ne),
                b"<=" => Some(TokenKind::Le),
                b">=" => Some(TokenKind::Ge),
                b".." => Some(TokenKind::DotDot),
                _ => None,
            };
            if let Some(kind) = kind {
                i += 2;
                out.push(Token {
                    kind,
                    span: Span::new(start, i),
                });
                continue;
            }
        }

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semi,
            '=' => TokenKind::Assign,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '!' => TokenKind::Bang,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            _ => {
                let ch = input[start..].chars().next().unwrap_or('\u{fffd}');
                let end = start + ch.len_utf8();
                errors.push(ScriptError::new(
                    Span::new(start, end),
                    format!("unexpected character '{ch}'"),
                ));
                i = end;
                continue;
            }
        };
        i += 1;
        out.push(Token {
            kind,
            span: Span::new(start, i),
        });
    }

    out.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(input.len(), input.len()),
    });

    Lexed {
        tokens: out,
        errors,
    }
}

/// Lex a `"..."` literal starting at `start`. Returns the unescaped value and the end offset.
fn lex_string(input: &str, start: usize) -> Result<(String, usize), ScriptError> {
    let mut value = String::new();
    let mut chars = input[start + 1..].char_indices();
    while let Some((off, ch)) = chars.next() {
        match ch {
            '"' => return Ok((value, start + 1 + off + 1)),
            '\n' => break,
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, '"')) => value.push('"'),
                Some((_, '\\')) => value.push('\\'),
                Some((esc_off, other)) => {
                    let at = start + 1 + esc_off;
                    return Err(ScriptError::new(
                        Span::new(at - 1, at + other.len_utf8()),
                        format!("unknown escape sequence '\\{other}'"),
                    ));
                }
                None => break,
            },
            other => value.push(other),
        }
    }
    Err(ScriptError::new(
        Span::new(start, input.len()),
        "unterminated string literal",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let lexed = lex(src);
        assert!(lexed.errors.is_empty(), "{:?}", lexed.errors);
        lexed.tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_ranges_without_eating_fractions() {
        assert_eq!(
            kinds("0..10"),
            vec![
                TokenKind::Number(0.0),
                TokenKind::DotDot,
                TokenKind::Number(10.0),
                TokenKind::Eof
            ]
        );
        assert_eq!(
            kinds("1.5 .25"),
            vec![
                TokenKind::Number(1.5),
                TokenKind::Number(0.25),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn skips_comments_and_recognizes_keywords() {
        assert_eq!(
            kinds("let x = 1; // trailing\nfor"),
            vec![
                TokenKind::Let,
                TokenKind::Ident("x".to_owned()),
                TokenKind::Assign,
                TokenKind::Number(1.0),
                TokenKind::Semi,
                TokenKind::For,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lexes_string_escapes() {
        assert_eq!(
            kinds(r#""a\"b\n""#),
            vec![TokenKind::Str("a\"b\n".to_owned()), TokenKind::Eof]
        );
    }

    #[test]
    fn reports_bad_characters_and_keeps_going() {
        let lexed = lex("a @ b");
        assert_eq!(lexed.errors.len(), 1);
        assert_eq!(lexed.errors[0].span, Span::new(2, 3));
        assert_eq!(lexed.tokens.len(), 3);
    }

    #[test]
    fn reports_unterminated_strings() {
        let lexed = lex("fail(\"oops);");
        assert_eq!(lexed.errors.len(), 1);
        assert!(lexed.errors[0].message.contains("unterminated"));
    }
}
