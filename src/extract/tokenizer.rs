//! A small tokenizer for English article text.
//!
//! Produces words, numbers, percent signs, and single punctuation characters,
//! each with its byte span. Whitespace is skipped. Numbers keep internal
//! thousands separators and decimal points (`1,200.5`) so that malformed
//! tokens such as `1.2.3` surface as one token and can be rejected whole.

/// What a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Number,
    Percent,
    Punct,
}

/// A token borrowed from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

impl<'a> Token<'a> {
    /// Lowercased text with typographic apostrophes folded to `'`.
    pub fn lower(&self) -> String {
        self.text.to_lowercase().replace('\u{2019}', "'")
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct && self.text.starts_with(c)
    }

    /// Words, numbers and percent signs; everything except punctuation.
    pub fn is_lexical(&self) -> bool {
        self.kind != TokenKind::Punct
    }
}

/// Lazy token stream over a string slice.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek_char(&self, at: usize) -> Option<char> {
        self.text.get(at..).and_then(|rest| rest.chars().next())
    }

    fn scan_number(&self, start: usize) -> usize {
        let mut end = start;
        while let Some(c) = self.peek_char(end) {
            if c.is_ascii_digit() {
                end += 1;
            } else if (c == ',' || c == '.')
                && self.peek_char(end + 1).is_some_and(|n| n.is_ascii_digit())
            {
                end += 1;
            } else {
                break;
            }
        }
        end
    }

    fn scan_word(&self, start: usize) -> usize {
        let mut end = start;
        while let Some(c) = self.peek_char(end) {
            if c.is_alphanumeric() {
                end += c.len_utf8();
            } else if (c == '\'' || c == '\u{2019}')
                && self
                    .peek_char(end + c.len_utf8())
                    .is_some_and(|n| n.is_alphabetic())
            {
                end += c.len_utf8();
            } else {
                break;
            }
        }
        end
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(c) = self.peek_char(self.pos) {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }

        let start = self.pos;
        let c = self.peek_char(start)?;
        let (kind, end) = if c.is_ascii_digit() {
            (TokenKind::Number, self.scan_number(start))
        } else if c.is_alphabetic() {
            (TokenKind::Word, self.scan_word(start))
        } else if c == '%' {
            (TokenKind::Percent, start + 1)
        } else {
            (TokenKind::Punct, start + c.len_utf8())
        };

        self.pos = end;
        Some(Token {
            kind,
            text: &self.text[start..end],
            start,
            end,
        })
    }
}

/// Parse a number token as a non-negative real.
///
/// Thousands separators must group by three (`12,500`); at most one decimal
/// point is allowed. Returns `None` for anything else.
pub fn parse_number(token: &str) -> Option<f64> {
    let mut parts = token.split('.');
    let integer = parts.next()?;
    let fraction = parts.next();
    if parts.next().is_some() {
        return None;
    }

    if integer.contains(',') {
        let mut groups = integer.split(',');
        let head = groups.next()?;
        if head.is_empty() || head.len() > 3 {
            return None;
        }
        if groups.any(|g| g.len() != 3) {
            return None;
        }
    }

    let digits: String = integer.chars().filter(|c| *c != ',').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let literal = match fraction {
        Some(f) if f.is_empty() || !f.chars().all(|c| c.is_ascii_digit()) => return None,
        Some(f) => format!("{digits}.{f}"),
        None => digits,
    };

    literal.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}
