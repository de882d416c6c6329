//! Single-character lookahead tokenizer.
//!
//! The lexer is pulled one token at a time by the parser; it never materializes the full token
//! stream. It counts every token handed out so the parser can detect productions that made no
//! progress.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(CompareOp::Eq),
            "<>" => Some(CompareOp::Ne),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Le),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Ge),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    #[inline]
    pub fn apply(self, left: f64, right: f64) -> bool {
        match self {
            CompareOp::Eq => left == right,
            CompareOp::Ne => left != right,
            CompareOp::Lt => left < right,
            CompareOp::Le => left <= right,
            CompareOp::Gt => left > right,
            CompareOp::Ge => left >= right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'a> {
    Number(f64),
    /// One of `+-*/(){}^`.
    Operator(char),
    Variable(&'a str),
    /// Identifier directly followed by `(` or `{`; the bracket is consumed.
    Function(&'a str),
    Logical(LogicalOp),
    Compare(CompareOp),
    Delimiter,
    Stop,
    /// Digits and dots that do not form a number, e.g. `1.2.3`.
    InvalidNumber(&'a str),
    /// Unrecognized character.
    Unknown(&'a str),
}

impl TokenKind<'_> {
    pub(crate) fn describe(&self) -> String {
        match self {
            TokenKind::Number(n) => n.to_string(),
            TokenKind::Operator(c) => c.to_string(),
            TokenKind::Variable(name)
            | TokenKind::InvalidNumber(name)
            | TokenKind::Unknown(name) => (*name).to_string(),
            TokenKind::Function(name) => format!("{name}("),
            TokenKind::Logical(LogicalOp::And) => "and".to_string(),
            TokenKind::Logical(LogicalOp::Or) => "or".to_string(),
            TokenKind::Compare(op) => op.symbol().to_string(),
            TokenKind::Delimiter => ",".to_string(),
            TokenKind::Stop => "<end>".to_string(),
        }
    }

    /// States after which a `-` starts an operand instead of continuing one.
    pub(crate) fn precedes_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Operator(_)
                | TokenKind::Compare(_)
                | TokenKind::Logical(_)
                | TokenKind::Function(_)
                | TokenKind::Delimiter
                | TokenKind::Unknown(_)
        )
    }
}

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    count: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            count: 0,
        }
    }

    /// Number of tokens handed out so far.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    fn peek_byte(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn take_while(&mut self, mut pred: impl FnMut(u8) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek_byte() {
            if !pred(b) {
                break;
            }
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    pub fn next_token(&mut self) -> TokenKind<'a> {
        self.count += 1;
        self.take_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'));

        let Some(b) = self.peek_byte() else {
            return TokenKind::Stop;
        };
        match b {
            b',' => {
                self.pos += 1;
                TokenKind::Delimiter
            }
            b'+' | b'-' | b'*' | b'/' | b'(' | b')' | b'{' | b'}' | b'^' => {
                self.pos += 1;
                TokenKind::Operator(b as char)
            }
            b'=' | b'<' | b'>' => {
                let start = self.pos;
                self.pos += 1;
                if matches!(self.peek_byte(), Some(b'>' | b'=')) {
                    self.pos += 1;
                }
                let symbol = &self.src[start..self.pos];
                match CompareOp::from_symbol(symbol) {
                    Some(op) => TokenKind::Compare(op),
                    None => TokenKind::Unknown(symbol),
                }
            }
            b'0'..=b'9' => {
                let literal = self.take_while(|b| b.is_ascii_digit() || b == b'.');
                match literal.parse::<f64>() {
                    Ok(value) => TokenKind::Number(value),
                    Err(_) => TokenKind::InvalidNumber(literal),
                }
            }
            b'a'..=b'z' | b'A'..=b'Z' => {
                let ident =
                    self.take_while(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.');
                if matches!(self.peek_byte(), Some(b'(' | b'{')) {
                    self.pos += 1;
                    return TokenKind::Function(ident);
                }
                if ident.eq_ignore_ascii_case("and") {
                    TokenKind::Logical(LogicalOp::And)
                } else if ident.eq_ignore_ascii_case("or") {
                    TokenKind::Logical(LogicalOp::Or)
                } else if ident == "true" {
                    TokenKind::Number(1.0)
                } else if ident == "false" {
                    TokenKind::Number(0.0)
                } else {
                    TokenKind::Variable(ident)
                }
            }
            _ => {
                let start = self.pos;
                let ch_len = self.src[start..].chars().next().map_or(1, char::len_utf8);
                self.pos += ch_len;
                TokenKind::Unknown(&self.src[start..self.pos])
            }
        }
    }
}

/// Tokenize `src` completely, ending with [`TokenKind::Stop`].
///
/// The parser pulls tokens lazily; this is a convenience for diagnostics and tests.
pub fn lex(src: &str) -> Vec<TokenKind<'_>> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token == TokenKind::Stop;
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}
