//! Precedence-climbing recursive descent compiler.
//!
//! Levels, loosest first:
//!
//! ```text
//! logical     := comparison (("and" | "or") comparison)*
//! comparison  := additive (("=" | "<>" | "<" | ">" | "<=" | ">=") additive)?
//! additive    := multiplicative (("+" | "-") multiplicative)*
//! multiplicative := power (("*" | "/") power)*
//! power       := unary ("^" unary)*
//! unary       := "-" unary | primary
//! primary     := number | variable | "(" logical ")" | function logical ("," logical)* ")"
//! ```
//!
//! Every binary level is left-associative, `^` included. No syntax tree is built: each
//! production appends its instructions after those of its operands, so the output is already
//! in post-order for the VM.

use crate::accessor::VariableAccessor;
use crate::error::ParseError;
use crate::functions::Function;
use crate::lexer::{Lexer, TokenKind};
use crate::program::{BinaryOp, Instruction, Program, VariableSlot};
use crate::MAX_LOCAL_VARIABLES;

/// Maximum depth of nested parentheses, function calls and unary minus signs.
pub const MAX_NESTING: usize = 64;

/// How names that are not known yet are treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding {
    /// Unknown names are registered as new local slots on first sight.
    Lax,
    /// Every name must resolve through the accessor or an already registered local.
    Strict,
}

/// Compile `src` into a [`Program`].
///
/// `locals` holds the local variable names known so far; in [`Binding::Lax`] mode new names are
/// appended to it. Accessor names take precedence over local names.
pub fn compile(
    src: &str,
    locals: &mut Vec<String>,
    accessor: Option<&dyn VariableAccessor>,
    binding: Binding,
) -> Result<Program, ParseError> {
    let accessor_names = accessor.map(|a| a.variable_names());
    let parser = Parser {
        lexer: Lexer::new(src),
        token: TokenKind::Stop,
        last: None,
        program: Program::new(),
        locals,
        accessor_names,
        binding,
        depth: 0,
    };
    parser.parse()
}

struct Parser<'src, 'env> {
    lexer: Lexer<'src>,
    token: TokenKind<'src>,
    /// Previous token; `None` at the start of input.
    last: Option<TokenKind<'src>>,
    program: Program,
    locals: &'env mut Vec<String>,
    accessor_names: Option<Vec<&'env str>>,
    binding: Binding,
    depth: usize,
}

impl<'src, 'env> Parser<'src, 'env> {
    fn advance(&mut self) {
        let next = self.lexer.next_token();
        let prev = std::mem::replace(&mut self.token, next);
        if self.lexer.count() > 1 {
            self.last = Some(prev);
        }
    }

    fn emit(&mut self, instr: Instruction) {
        self.program.instrs.push(instr);
    }

    fn parse(mut self) -> Result<Program, ParseError> {
        self.advance();
        if self.token != TokenKind::Stop {
            let before = self.lexer.count();
            self.parse_logical()?;
            if before == self.lexer.count() {
                return Err(ParseError::UnbalancedParentheses);
            }
            match &self.token {
                TokenKind::Stop => {}
                TokenKind::Operator(')' | '}') => return Err(ParseError::UnbalancedParentheses),
                TokenKind::Unknown(token) => {
                    return Err(ParseError::SyntaxError {
                        token: (*token).to_string(),
                    })
                }
                other => {
                    return Err(ParseError::TrailingInput {
                        token: other.describe(),
                    })
                }
            }
        }
        self.emit(Instruction::Stop);
        self.program.locals = self.locals.clone();
        Ok(self.program)
    }

    fn parse_logical(&mut self) -> Result<(), ParseError> {
        self.parse_comparison()?;
        while let TokenKind::Logical(op) = self.token {
            self.advance();
            self.parse_comparison()?;
            self.emit(Instruction::Logical(op));
        }
        Ok(())
    }

    fn parse_comparison(&mut self) -> Result<(), ParseError> {
        self.parse_additive()?;
        if let TokenKind::Compare(op) = self.token {
            self.advance();
            self.parse_additive()?;
            self.emit(Instruction::Compare(op));
        }
        Ok(())
    }

    fn parse_additive(&mut self) -> Result<(), ParseError> {
        self.parse_multiplicative()?;
        while let TokenKind::Operator(c @ ('+' | '-')) = self.token {
            self.advance();
            self.parse_multiplicative()?;
            self.emit_binary(c);
        }
        Ok(())
    }

    fn parse_multiplicative(&mut self) -> Result<(), ParseError> {
        self.parse_power()?;
        while let TokenKind::Operator(c @ ('*' | '/')) = self.token {
            self.advance();
            self.parse_power()?;
            self.emit_binary(c);
        }
        Ok(())
    }

    fn parse_power(&mut self) -> Result<(), ParseError> {
        self.parse_unary()?;
        while self.token == TokenKind::Operator('^') {
            self.advance();
            self.parse_unary()?;
            self.emit_binary('^');
        }
        Ok(())
    }

    fn emit_binary(&mut self, c: char) {
        if let Some(op) = BinaryOp::from_char(c) {
            self.emit(Instruction::Binary(op));
        }
    }

    fn parse_unary(&mut self) -> Result<(), ParseError> {
        let starts_operand = self.last.as_ref().map_or(true, TokenKind::precedes_operand);
        if self.token == TokenKind::Operator('-') && starts_operand {
            self.enter()?;
            self.advance();
            self.parse_unary()?;
            self.emit(Instruction::Negate);
            self.depth -= 1;
            return Ok(());
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<(), ParseError> {
        match self.token.clone() {
            TokenKind::Number(value) => {
                self.emit(Instruction::Number(value));
                self.advance();
                Ok(())
            }
            TokenKind::Variable(name) => {
                let slot = self.resolve_variable(name)?;
                self.emit(Instruction::Variable(slot));
                self.advance();
                Ok(())
            }
            TokenKind::Operator('(' | '{') => {
                self.enter()?;
                self.advance();
                self.parse_logical()?;
                match &self.token {
                    TokenKind::Operator(')' | '}') => {}
                    TokenKind::Unknown(token) => {
                        return Err(ParseError::SyntaxError {
                            token: (*token).to_string(),
                        })
                    }
                    _ => return Err(ParseError::UnbalancedParentheses),
                }
                self.advance();
                self.depth -= 1;
                Ok(())
            }
            TokenKind::Function(name) => self.parse_call(name),
            TokenKind::Operator(')' | '}') => Err(ParseError::UnbalancedParentheses),
            TokenKind::Stop => Err(ParseError::UnexpectedEnd),
            TokenKind::Unknown(token) => Err(ParseError::SyntaxError {
                token: token.to_string(),
            }),
            TokenKind::InvalidNumber(literal) => Err(ParseError::InvalidNumber {
                literal: literal.to_string(),
            }),
            other => Err(ParseError::UnexpectedToken {
                token: other.describe(),
            }),
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::NestingTooDeep);
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_call(&mut self, name: &str) -> Result<(), ParseError> {
        let func = Function::from_name(name).ok_or_else(|| ParseError::UnknownFunction {
            name: name.to_string(),
        })?;
        self.enter()?;
        self.advance();

        let mut argc = 0;
        loop {
            match &self.token {
                TokenKind::Operator(')' | '}') => break,
                TokenKind::Stop => {
                    return Err(ParseError::MissingClosingBracket {
                        function: func.name(),
                    })
                }
                _ => {}
            }
            let before = self.lexer.count();
            self.parse_logical()?;
            if before == self.lexer.count() {
                return Err(ParseError::UnbalancedParentheses);
            }
            argc += 1;
            match &self.token {
                TokenKind::Delimiter => self.advance(),
                TokenKind::Operator(')' | '}') => {}
                TokenKind::Stop => {
                    return Err(ParseError::MissingClosingBracket {
                        function: func.name(),
                    })
                }
                TokenKind::Unknown(token) => {
                    return Err(ParseError::SyntaxError {
                        token: (*token).to_string(),
                    })
                }
                other => {
                    return Err(ParseError::UnexpectedToken {
                        token: other.describe(),
                    })
                }
            }
        }

        let arity = func.arity();
        if !arity.accepts(argc) {
            return Err(ParseError::ArgumentCount {
                function: func.name(),
                expected: arity.describe(),
                found: argc,
            });
        }
        self.emit(Instruction::Call { func, argc });
        self.advance();
        self.depth -= 1;
        Ok(())
    }

    fn resolve_variable(&mut self, name: &str) -> Result<VariableSlot, ParseError> {
        if let Some(names) = &self.accessor_names {
            if let Some(index) = names.iter().position(|n| *n == name) {
                return Ok(VariableSlot::Model(index));
            }
        }
        if let Some(slot) = self.locals.iter().position(|n| n == name) {
            return Ok(VariableSlot::Local(slot));
        }
        if self.binding == Binding::Strict {
            return Err(ParseError::VariableNotAvailable {
                name: name.to_string(),
            });
        }
        if self.locals.len() >= MAX_LOCAL_VARIABLES {
            return Err(ParseError::TooManyVariables);
        }
        if self.accessor_names.is_some() {
            log::warn!("variable '{name}' is not provided by the bound accessor; using a local slot");
        }
        self.locals.push(name.to_string());
        Ok(VariableSlot::Local(self.locals.len() - 1))
    }
}
