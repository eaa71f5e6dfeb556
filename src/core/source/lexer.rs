//! Dart-flavoured tokenizer.
//!
//! Produces just enough structure for declaration discovery and token-level
//! renames: identifiers (including `$name` / `${...}` inside strings), whole
//! string literals, doc comments and single-byte punctuation. Fails on
//! unterminated strings/comments, unbalanced brackets and stray characters.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Number,
    /// A whole string literal. Interpolated identifiers follow it as separate tokens.
    Str,
    DocComment,
    Punct,
}

/// Byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Inclusive of `end`, so a caret placed right after a name still hits it.
    pub fn touches(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.span.start..self.span.end]
    }

    pub fn is_punct(&self, src: &str, c: char) -> bool {
        self.kind == TokenKind::Punct && src[self.span.start..].starts_with(c)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub offset: usize,
    pub message: String,
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer {
        src,
        bytes: src.as_bytes(),
        pos: if src.starts_with('\u{feff}') { 3 } else { 0 },
        tokens: Vec::new(),
    };
    lexer.lex(false)?;
    Ok(lexer.tokens)
}

/// 1-based line and column (in chars) of a byte offset.
pub fn line_col(src: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(src.len());
    let before = src.get(..offset).unwrap_or(src);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_part(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn closer_for(open: u8) -> u8 {
    match open {
        b'(' => b')',
        b'[' => b']',
        _ => b'}',
    }
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
}

impl Lexer<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> LexError {
        LexError {
            offset,
            message: message.into(),
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, end),
        });
    }

    /// Lex to end of input, or, when `nested`, up to the `}` closing a `${`.
    fn lex(&mut self, nested: bool) -> Result<(), LexError> {
        let mut brackets: Vec<(u8, usize)> = Vec::new();

        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' | 0x0c => self.pos += 1,
                b'/' if self.peek_at(1) == Some(b'/') => self.line_comment(),
                b'/' if self.peek_at(1) == Some(b'*') => self.block_comment()?,
                b'\'' | b'"' => self.string(self.pos, false)?,
                b'r' if matches!(self.peek_at(1), Some(b'\'') | Some(b'"')) => {
                    let start = self.pos;
                    self.pos += 1;
                    self.string(start, true)?;
                }
                b if is_ident_start(b) => self.identifier(),
                b'0'..=b'9' => self.number(),
                b'.' if self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) => self.number(),
                b'(' | b'[' | b'{' => {
                    brackets.push((b, self.pos));
                    self.punct();
                }
                b')' | b']' | b'}' => {
                    if nested && b == b'}' && brackets.is_empty() {
                        self.pos += 1;
                        return Ok(());
                    }
                    match brackets.pop() {
                        Some((open, _)) if closer_for(open) == b => self.punct(),
                        Some((open, at)) => {
                            return Err(self.error(
                                self.pos,
                                format!(
                                    "'{}' does not close '{}' opened at byte {}",
                                    b as char, open as char, at
                                ),
                            ))
                        }
                        None => {
                            return Err(
                                self.error(self.pos, format!("unexpected '{}'", b as char))
                            )
                        }
                    }
                }
                b'`' | b'\\' => {
                    return Err(self.error(self.pos, format!("unexpected '{}'", b as char)))
                }
                b if b.is_ascii_punctuation() => self.punct(),
                _ => {
                    let c = self.src[self.pos..].chars().next().unwrap_or('?');
                    return Err(self.error(self.pos, format!("unexpected character '{}'", c)));
                }
            }
        }

        if let Some((open, at)) = brackets.pop() {
            return Err(self.error(at, format!("unclosed '{}'", open as char)));
        }
        if nested {
            return Err(self.error(self.pos, "unterminated string interpolation"));
        }
        Ok(())
    }

    fn punct(&mut self) {
        self.push(TokenKind::Punct, self.pos, self.pos + 1);
        self.pos += 1;
    }

    fn identifier(&mut self) {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_part) {
            self.pos += 1;
        }
        self.push(TokenKind::Identifier, start, self.pos);
    }

    fn number(&mut self) {
        let start = self.pos;
        while let Some(b) = self.peek() {
            let exponent_sign = (b == b'+' || b == b'-')
                && matches!(self.bytes.get(self.pos.wrapping_sub(1)), Some(b'e') | Some(b'E'))
                && !self.src[start..self.pos].starts_with("0x");
            let fraction = b == b'.' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit());
            if b.is_ascii_alphanumeric() || b == b'_' || fraction || exponent_sign {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.push(TokenKind::Number, start, self.pos);
    }

    fn line_comment(&mut self) {
        let start = self.pos;
        while self.peek().is_some_and(|b| b != b'\n') {
            self.pos += 1;
        }
        let text = &self.src[start..self.pos];
        if text.starts_with("///") && !text.starts_with("////") {
            self.push(TokenKind::DocComment, start, self.pos);
        }
    }

    fn block_comment(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 2;
        let mut depth = 1usize;

        while depth > 0 {
            match (self.peek(), self.peek_at(1)) {
                (None, _) => return Err(self.error(start, "unterminated block comment")),
                (Some(b'/'), Some(b'*')) => {
                    depth += 1;
                    self.pos += 2;
                }
                (Some(b'*'), Some(b'/')) => {
                    depth -= 1;
                    self.pos += 2;
                }
                _ => self.pos += 1,
            }
        }

        let text = &self.src[start..self.pos];
        if text.starts_with("/**") && text != "/**/" {
            self.push(TokenKind::DocComment, start, self.pos);
        }
        Ok(())
    }

    /// `start` points at the `r` prefix for raw strings, otherwise at the quote.
    fn string(&mut self, start: usize, raw: bool) -> Result<(), LexError> {
        let quote = self.bytes[self.pos];
        let triple = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        let slot = self.tokens.len();
        self.push(TokenKind::Str, start, start);
        self.pos += if triple { 3 } else { 1 };

        loop {
            let Some(b) = self.peek() else {
                return Err(self.error(start, "unterminated string"));
            };

            if b == quote {
                if !triple {
                    self.pos += 1;
                    break;
                }
                if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                    self.pos += 3;
                    break;
                }
                self.pos += 1;
                continue;
            }

            match b {
                b'\n' | b'\r' if !triple => {
                    return Err(self.error(start, "unterminated string"));
                }
                b'\\' if !raw => self.pos += 2,
                b'$' if !raw => match self.peek_at(1) {
                    Some(b'{') => {
                        self.pos += 2;
                        self.lex(true)?;
                    }
                    Some(n) if is_ident_start(n) && n != b'$' => {
                        let ident_start = self.pos + 1;
                        self.pos = ident_start;
                        while self
                            .peek()
                            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
                        {
                            self.pos += 1;
                        }
                        self.push(TokenKind::Identifier, ident_start, self.pos);
                    }
                    _ => self.pos += 1,
                },
                _ => self.pos += 1,
            }
        }

        self.tokens[slot].span.end = self.pos;
        Ok(())
    }
}
