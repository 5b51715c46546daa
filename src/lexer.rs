use crate::diagnostics::Diagnostic;
use crate::token::{Span, Token, TokenType};

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    tokens: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            line: 1,
            column: 0,
            tokens: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> u8 {
        if self.pos < self.bytes.len() {
            self.bytes[self.pos]
        } else {
            0
        }
    }

    fn peek_at(&self, offset: usize) -> u8 {
        let idx = self.pos + offset;
        if idx < self.bytes.len() {
            self.bytes[idx]
        } else {
            0
        }
    }

    fn advance(&mut self, n: usize) {
        for _ in 0..n {
            if self.pos < self.bytes.len() {
                if self.bytes[self.pos] == b'\n' {
                    self.line += 1;
                    self.column = 0;
                } else {
                    self.column += 1;
                }
                self.pos += 1;
            }
        }
    }

    fn span_from(&self, line: u32, column: u32, start: usize) -> Span {
        Span::new(line, column, start as u32, (self.pos - start) as u32)
    }

    fn push(&mut self, token_type: TokenType, line: u32, column: u32, start: usize) {
        let span = self.span_from(line, column, start);
        self.tokens.push(Token {
            token_type,
            value: self.input[start..self.pos].to_string(),
            span,
        });
    }

    fn run(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        while !self.at_end() {
            let (line, column, start) = (self.line, self.column, self.pos);
            let c = self.peek();
            match c {
                b' ' | b'\t' | b'\r' | b'\n' => self.advance(1),
                b'/' if self.peek_at(1) == b'/' => {
                    while !self.at_end() && self.peek() != b'\n' {
                        self.advance(1);
                    }
                }
                b'/' if self.peek_at(1) == b'*' => {
                    self.advance(2);
                    let mut closed = false;
                    while !self.at_end() {
                        if self.peek() == b'*' && self.peek_at(1) == b'/' {
                            self.advance(2);
                            closed = true;
                            break;
                        }
                        self.advance(1);
                    }
                    if !closed {
                        let span = self.span_from(line, column, start);
                        self.diagnostics
                            .push(Diagnostic::lex("unterminated block comment", span));
                    }
                }
                b'"' => self.lex_string(line, column, start),
                b'0'..=b'9' => self.lex_number(line, column, start),
                c if is_ident_start(c) => {
                    while is_word_char(self.peek()) {
                        self.advance(1);
                    }
                    let text = &self.input[start..self.pos];
                    let tt = TokenType::keyword_from_str(text).unwrap_or(TokenType::Identifier);
                    self.push(tt, line, column, start);
                }
                _ => self.lex_operator(line, column, start),
            }
        }

        let eof_span = Span::new(self.line, self.column, self.pos as u32, 0);
        self.tokens.push(Token {
            token_type: TokenType::Eof,
            value: String::new(),
            span: eof_span,
        });
        (self.tokens, self.diagnostics)
    }

    fn lex_string(&mut self, line: u32, column: u32, start: usize) {
        self.advance(1); // opening quote
        let mut value = String::new();
        let mut closed = false;
        while !self.at_end() {
            let c = self.peek();
            match c {
                b'"' => {
                    self.advance(1);
                    closed = true;
                    break;
                }
                b'\n' => break,
                b'\\' => {
                    let esc = self.peek_at(1);
                    match esc {
                        b'n' => value.push('\n'),
                        b't' => value.push('\t'),
                        b'"' => value.push('"'),
                        b'\\' => value.push('\\'),
                        other => {
                            let span = Span::new(
                                self.line,
                                self.column,
                                self.pos as u32,
                                2.min((self.bytes.len() - self.pos) as u32),
                            );
                            self.diagnostics.push(Diagnostic::lex(
                                format!("unknown escape sequence '\\{}'", other as char),
                                span,
                            ));
                        }
                    }
                    self.advance(2);
                }
                _ => {
                    let ch = self.input[self.pos..].chars().next().unwrap_or('\0');
                    value.push(ch);
                    self.advance(ch.len_utf8());
                }
            }
        }

        let span = self.span_from(line, column, start);
        if !closed {
            self.diagnostics
                .push(Diagnostic::lex("unterminated string literal", span));
        }
        self.tokens.push(Token {
            token_type: TokenType::StringLit,
            value,
            span,
        });
    }

    fn lex_number(&mut self, line: u32, column: u32, start: usize) {
        while self.peek().is_ascii_digit() {
            self.advance(1);
        }
        let mut is_float = false;
        if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
            is_float = true;
            self.advance(1);
            while self.peek().is_ascii_digit() {
                self.advance(1);
            }
        }
        let tt = if is_float {
            TokenType::FloatLit
        } else {
            TokenType::IntLit
        };
        self.push(tt, line, column, start);
    }

    fn lex_operator(&mut self, line: u32, column: u32, start: usize) {
        let two: &[u8] = &self.bytes[self.pos..(self.pos + 2).min(self.bytes.len())];
        let tt2 = match two {
            b"<=" => Some(TokenType::LessEqual),
            b">=" => Some(TokenType::GreaterEqual),
            b"==" => Some(TokenType::EqualEqual),
            b"!=" => Some(TokenType::NotEqual),
            b"&&" => Some(TokenType::AndAnd),
            b"||" => Some(TokenType::OrOr),
            _ => None,
        };
        if let Some(tt) = tt2 {
            self.advance(2);
            self.push(tt, line, column, start);
            return;
        }

        let tt1 = match self.peek() {
            b'+' => Some(TokenType::Plus),
            b'-' => Some(TokenType::Minus),
            b'*' => Some(TokenType::Star),
            b'/' => Some(TokenType::Slash),
            b'%' => Some(TokenType::Percent),
            b'<' => Some(TokenType::Less),
            b'>' => Some(TokenType::Greater),
            b'=' => Some(TokenType::Assign),
            b'!' => Some(TokenType::Bang),
            b'?' => Some(TokenType::Question),
            b'(' => Some(TokenType::LParen),
            b')' => Some(TokenType::RParen),
            b'{' => Some(TokenType::LBrace),
            b'}' => Some(TokenType::RBrace),
            b'[' => Some(TokenType::LBracket),
            b']' => Some(TokenType::RBracket),
            b',' => Some(TokenType::Comma),
            b':' => Some(TokenType::Colon),
            b';' => Some(TokenType::Semicolon),
            b'.' => Some(TokenType::Dot),
            _ => None,
        };
        match tt1 {
            Some(tt) => {
                self.advance(1);
                self.push(tt, line, column, start);
            }
            None => {
                let ch = self.input[self.pos..].chars().next().unwrap_or('\0');
                self.advance(ch.len_utf8());
                let span = self.span_from(line, column, start);
                self.diagnostics
                    .push(Diagnostic::lex(format!("unexpected character '{}'", ch), span));
            }
        }
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_word_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Tokenize a source string. Lexical problems are collected as `lex`
/// diagnostics; the token stream always ends with an `Eof` token so the
/// parser never runs off the end.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    Lexer::new(source).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenType> {
        let (tokens, diags) = tokenize(src);
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
        tokens.into_iter().map(|t| t.token_type).collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        let ks = kinds("var x const foreach classify");
        assert_eq!(
            ks,
            vec![
                TokenType::Var,
                TokenType::Identifier,
                TokenType::Const,
                TokenType::Foreach,
                TokenType::Identifier,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn numbers_int_vs_float() {
        let (tokens, _) = tokenize("42 3.14 7.");
        assert_eq!(tokens[0].token_type, TokenType::IntLit);
        assert_eq!(tokens[1].token_type, TokenType::FloatLit);
        // "7." lexes as int followed by dot
        assert_eq!(tokens[2].token_type, TokenType::IntLit);
        assert_eq!(tokens[3].token_type, TokenType::Dot);
    }

    #[test]
    fn string_escapes_decoded() {
        let (tokens, diags) = tokenize(r#""a\nb\t\"c\\""#);
        assert!(diags.is_empty());
        assert_eq!(tokens[0].value, "a\nb\t\"c\\");
    }

    #[test]
    fn unterminated_string_reports_lex_error() {
        let (_, diags) = tokenize("\"oops");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("unterminated"));
    }

    #[test]
    fn comments_are_skipped() {
        let ks = kinds("1 // line\n/* block\nstill */ 2");
        assert_eq!(
            ks,
            vec![TokenType::IntLit, TokenType::IntLit, TokenType::Eof]
        );
    }

    #[test]
    fn spans_track_line_and_column() {
        let (tokens, _) = tokenize("var\n  x");
        assert_eq!(tokens[0].span.line, 1);
        assert_eq!(tokens[0].span.column, 0);
        assert_eq!(tokens[0].span.length, 3);
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.column, 2);
    }

    #[test]
    fn two_char_operators() {
        let ks = kinds("<= >= == != && ||");
        assert_eq!(
            ks,
            vec![
                TokenType::LessEqual,
                TokenType::GreaterEqual,
                TokenType::EqualEqual,
                TokenType::NotEqual,
                TokenType::AndAnd,
                TokenType::OrOr,
                TokenType::Eof,
            ]
        );
    }
}
