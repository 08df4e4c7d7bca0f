use crate::planner::error::{Result, SqlError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Came from a quoted literal; never treated as a keyword or operator.
    pub is_literal: bool,
    /// Byte offset of the token in the source text.
    pub offset: usize,
}

impl Token {
    pub fn is_keyword(&self, keyword: &str) -> bool {
        !self.is_literal && self.text.eq_ignore_ascii_case(keyword)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-' | '_')
}

/// Splits SQL text into tokens: quoted literals, runs of word characters,
/// two-character comparison operators and single punctuation characters.
pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '"' || c == '\'' {
            let quote = c;
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            while let Some((_, c)) = chars.next() {
                if c == '\\' {
                    if let Some(&(_, escaped)) = chars.peek() {
                        if escaped == quote || escaped == '\\' {
                            value.push(escaped);
                            chars.next();
                            continue;
                        }
                    }
                    value.push(c);
                } else if c == quote {
                    // '' inside a single-quoted literal is an escaped quote
                    if quote == '\'' && matches!(chars.peek(), Some(&(_, '\''))) {
                        value.push('\'');
                        chars.next();
                        continue;
                    }
                    closed = true;
                    break;
                } else {
                    value.push(c);
                }
            }
            if !closed {
                return Err(SqlError::UnterminatedString(offset));
            }
            tokens.push(Token {
                text: value,
                is_literal: true,
                offset,
            });
            continue;
        }

        if is_word_char(c) {
            let mut end = offset;
            while let Some(&(i, c)) = chars.peek() {
                if !is_word_char(c) {
                    break;
                }
                end = i + c.len_utf8();
                chars.next();
            }
            tokens.push(Token {
                text: text[offset..end].to_string(),
                is_literal: false,
                offset,
            });
            continue;
        }

        chars.next();
        let mut token = c.to_string();
        if matches!(c, '<' | '>' | '=' | '!') {
            if let Some(&(_, next)) = chars.peek() {
                if matches!(next, '<' | '>' | '=') {
                    token.push(next);
                    chars.next();
                }
            }
        }
        tokens.push(Token {
            text: token,
            is_literal: false,
            offset,
        });
    }

    Ok(tokens)
}

/// Cursor over a token slice with explicit `peek`/`advance`.
#[derive(Debug, Clone)]
pub struct TokenCursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    pub fn peek_nth(&self, n: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + n)
    }

    pub fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Next token, or `NotEnoughTokens` at the end of input.
    pub fn expect_any(&mut self) -> Result<&'a Token> {
        self.advance().ok_or(SqlError::NotEnoughTokens)
    }

    pub fn peek_keyword(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(keyword))
    }

    /// Consumes the next token if it is `keyword`.
    pub fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}
