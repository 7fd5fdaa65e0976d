//! Parser - shunting-yard conversion from tokens to postfix
//!
//! No tree is built. Operands go straight to the output; operators,
//! function names and opening parentheses wait on a stack until precedence
//! or a closing parenthesis releases them.
//!
//! Function calls use an argument-boundary node so that flat postfix can
//! carry any number of arguments: the boundary is emitted when the call's
//! opening parenthesis is read, before the first argument, and the function
//! node itself is emitted only after its arguments. `atan2(1, 2)` becomes
//!
//! ```text
//! <boundary> 1 2 atan2
//! ```
//!
//! and the evaluator collects everything above the nearest boundary as the
//! argument list.

use crate::environment::{Binding, Environment};
use crate::error::{Diagnostic, ParseError, ParseErrorKind, Report};
use crate::number::Number;
use crate::scanner::{Token, TokenKind};
use std::fmt;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Number(Number),
    Constant(String),
    Function(String),
    UnaryOperator { name: String, binding: Binding },
    BinaryOperator { name: String, binding: Binding },
    /// Start of a function's argument list
    ArgumentBoundary,
    Null,
}

/// One postfix instruction, tagged with the source offset it came from
#[derive(Debug, Clone, PartialEq)]
pub struct PostfixNode {
    pub kind: NodeKind,
    pub offset: usize,
}

impl PostfixNode {
    pub fn new(kind: NodeKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

impl fmt::Display for PostfixNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Number(n) => write!(f, "{}", n),
            NodeKind::Constant(name) | NodeKind::Function(name) => f.write_str(name),
            NodeKind::UnaryOperator { name, .. } => write!(f, "{}u", name),
            NodeKind::BinaryOperator { name, .. } => f.write_str(name),
            NodeKind::ArgumentBoundary => f.write_str("|"),
            NodeKind::Null => f.write_str("null"),
        }
    }
}

/// Operator stack entries
#[derive(Debug)]
enum Pending {
    Function { name: String, offset: usize },
    Unary { name: String, binding: Binding, offset: usize },
    Binary { name: String, binding: Binding, offset: usize },
    OpeningParen { offset: usize },
}

impl Pending {
    /// Convert to output; opening parentheses never reach the output
    fn into_node(self) -> Option<PostfixNode> {
        match self {
            Pending::Function { name, offset } => {
                Some(PostfixNode::new(NodeKind::Function(name), offset))
            },
            Pending::Unary {
                name,
                binding,
                offset,
            } => Some(PostfixNode::new(
                NodeKind::UnaryOperator { name, binding },
                offset,
            )),
            Pending::Binary {
                name,
                binding,
                offset,
            } => Some(PostfixNode::new(
                NodeKind::BinaryOperator { name, binding },
                offset,
            )),
            Pending::OpeningParen { .. } => None,
        }
    }
}

type Step = Result<(), Diagnostic<ParseErrorKind>>;

static NULL_TOKEN: Token = Token {
    kind: TokenKind::Null,
    literal: String::new(),
    offset: 0,
};

/// Shunting-yard parser over a scanned token sequence
pub struct Parser<'a> {
    tokens: &'a [Token],
    input: &'a str,
    env: &'a Environment,
    current: usize,
    output: Vec<PostfixNode>,
    stack: Vec<Pending>,
}

impl<'a> Parser<'a> {
    /// `input` is the line the tokens were scanned from, used to annotate
    /// errors; `env` supplies operator precedence and associativity, with
    /// the grammar's own bindings for operators it does not define.
    pub fn new(tokens: &'a [Token], input: &'a str, env: &'a Environment) -> Self {
        Self {
            tokens,
            input,
            env,
            current: 0,
            output: Vec::new(),
            stack: Vec::new(),
        }
    }

    pub fn parse(mut self) -> Result<Vec<PostfixNode>, ParseError> {
        if !self.tokens.last().is_some_and(|t| t.is(TokenKind::Eof)) {
            return Err(Report::single(
                self.input,
                Diagnostic::unlocated(ParseErrorKind::MissingEndOfInput),
            ));
        }

        let mut errors = Vec::new();
        while !self.at_end() {
            if let Err(diagnostic) = self.step() {
                errors.push(diagnostic);
            }
            self.current += 1;
        }

        // Parentheses still open at the end are reported with the rest
        errors.extend(self.stack.iter().filter_map(|pending| match pending {
            Pending::OpeningParen { offset } => Some(Diagnostic::at(
                ParseErrorKind::UnmatchedParenthesis,
                *offset,
            )),
            _ => None,
        }));

        if !errors.is_empty() {
            debug!(errors = errors.len(), "parse failed");
            return Err(Report::new(self.input, errors));
        }

        while let Some(pending) = self.stack.pop() {
            self.output.extend(pending.into_node());
        }

        debug!(nodes = self.output.len(), "parsed postfix");
        trace!(
            postfix = %self
                .output
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" "),
            "postfix stream"
        );
        Ok(self.output)
    }

    fn step(&mut self) -> Step {
        let tokens = self.tokens;
        let token = &tokens[self.current];
        match token.kind {
            TokenKind::Number => self.parse_number(token),
            TokenKind::Identifier => self.parse_identifier(token),
            TokenKind::Operator => self.parse_operator(token),
            TokenKind::OpeningParen => {
                if matches!(self.stack.last(), Some(Pending::Function { .. })) {
                    self.output
                        .push(PostfixNode::new(NodeKind::ArgumentBoundary, token.offset));
                }
                self.stack.push(Pending::OpeningParen {
                    offset: token.offset,
                });
                Ok(())
            },
            TokenKind::ClosingParen => self.parse_closing_paren(token),
            TokenKind::Comma => self.parse_comma(token),
            TokenKind::Eof | TokenKind::Null => Err(Diagnostic::at(
                ParseErrorKind::IllegalToken(token.to_string()),
                token.offset,
            )),
        }
    }

    fn parse_number(&mut self, token: &Token) -> Step {
        let number = Number::parse_literal(&token.literal).ok_or_else(|| {
            Diagnostic::at(
                ParseErrorKind::InvalidNumber(token.literal.clone()),
                token.offset,
            )
        })?;
        self.output
            .push(PostfixNode::new(NodeKind::Number(number), token.offset));
        self.expect_operand_follower()
    }

    fn parse_identifier(&mut self, token: &Token) -> Step {
        if self.peek_next().is(TokenKind::OpeningParen) {
            self.stack.push(Pending::Function {
                name: token.literal.clone(),
                offset: token.offset,
            });
            Ok(())
        } else {
            self.output.push(PostfixNode::new(
                NodeKind::Constant(token.literal.clone()),
                token.offset,
            ));
            self.expect_operand_follower()
        }
    }

    fn parse_operator(&mut self, token: &Token) -> Step {
        let name = token.literal.clone();

        if self.is_unary(token) {
            let binding = self
                .env
                .unary_operator(&name)
                .map(|op| op.binding)
                .or_else(|| Binding::unary(&name))
                .ok_or_else(|| {
                    Diagnostic::at(
                        ParseErrorKind::IllegalToken(token.to_string()),
                        token.offset,
                    )
                })?;
            self.stack.push(Pending::Unary {
                name,
                binding,
                offset: token.offset,
            });
            return self.expect_operand_start();
        }

        let binding = self
            .env
            .binary_operator(&name)
            .map(|op| op.binding)
            .or_else(|| Binding::binary(&name))
            .ok_or_else(|| {
                Diagnostic::at(
                    ParseErrorKind::IllegalToken(token.to_string()),
                    token.offset,
                )
            })?;

        while self.stack_outranks(&binding) {
            if let Some(node) = self.stack.pop().and_then(Pending::into_node) {
                self.output.push(node);
            }
        }
        self.stack.push(Pending::Binary {
            name,
            binding,
            offset: token.offset,
        });
        self.expect_binary_follower()
    }

    fn parse_closing_paren(&mut self, token: &Token) -> Step {
        loop {
            match self.stack.pop() {
                Some(Pending::OpeningParen { .. }) => break,
                Some(other) => self.output.extend(other.into_node()),
                None => {
                    return Err(Diagnostic::at(
                        ParseErrorKind::UnmatchedParenthesis,
                        token.offset,
                    ))
                },
            }
        }
        self.expect_operand_follower()
    }

    fn parse_comma(&mut self, token: &Token) -> Step {
        let unexpected =
            || Diagnostic::at(ParseErrorKind::UnexpectedToken(token.to_string()), token.offset);

        // The nearest open parenthesis must belong to a function call
        let paren = self
            .stack
            .iter()
            .rposition(|p| matches!(p, Pending::OpeningParen { .. }))
            .ok_or_else(unexpected)?;
        if paren == 0 || !matches!(self.stack[paren - 1], Pending::Function { .. }) {
            return Err(unexpected());
        }

        while self.stack.len() > paren + 1 {
            if let Some(node) = self.stack.pop().and_then(Pending::into_node) {
                self.output.push(node);
            }
        }
        self.expect_operand_start()
    }

    /// Whether the stack top must be output before an incoming binary
    /// operator with `incoming` binding is pushed
    fn stack_outranks(&self, incoming: &Binding) -> bool {
        match self.stack.last() {
            Some(Pending::Function { .. }) => true,
            Some(Pending::Unary { binding, .. }) | Some(Pending::Binary { binding, .. }) => {
                binding.yields_to(incoming)
            },
            Some(Pending::OpeningParen { .. }) | None => false,
        }
    }

    /// A `-` opening the input or following an operator, opening
    /// parenthesis or comma negates its operand
    fn is_unary(&self, token: &Token) -> bool {
        if token.literal != "-" {
            return false;
        }
        if self.current == 0 {
            return true;
        }
        let prev = self.peek_prev();
        prev.is(TokenKind::Operator) || prev.is(TokenKind::OpeningParen) || prev.is(TokenKind::Comma)
    }

    /// After an operand: an operator, `)`, `,` or the end
    fn expect_operand_follower(&self) -> Step {
        let next = self.peek_next();
        match next.kind {
            TokenKind::Operator
            | TokenKind::ClosingParen
            | TokenKind::Comma
            | TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected(next)),
        }
    }

    /// After a binary operator: an operand start or any operator. A missing
    /// operand surfaces as an operand-count error at evaluation.
    fn expect_binary_follower(&self) -> Step {
        let next = self.peek_next();
        match next.kind {
            TokenKind::Number
            | TokenKind::Identifier
            | TokenKind::OpeningParen
            | TokenKind::Operator => Ok(()),
            _ => Err(self.unexpected(next)),
        }
    }

    /// Where an operand must start: a number, identifier, `(` or a negation
    fn expect_operand_start(&self) -> Step {
        let next = self.peek_next();
        match next.kind {
            TokenKind::Number | TokenKind::Identifier | TokenKind::OpeningParen => Ok(()),
            TokenKind::Operator if next.literal == "-" => Ok(()),
            _ => Err(self.unexpected(next)),
        }
    }

    fn unexpected(&self, token: &Token) -> Diagnostic<ParseErrorKind> {
        Diagnostic::at(
            ParseErrorKind::UnexpectedToken(token.to_string()),
            token.offset,
        )
    }

    fn peek_next(&self) -> &Token {
        self.tokens.get(self.current + 1).unwrap_or(&NULL_TOKEN)
    }

    fn peek_prev(&self) -> &Token {
        match self.current.checked_sub(1) {
            Some(i) => &self.tokens[i],
            None => &NULL_TOKEN,
        }
    }

    fn at_end(&self) -> bool {
        self.tokens[self.current].is(TokenKind::Eof)
    }
}

/// Parse scanned `tokens` of `input` into postfix order
pub fn parse(
    tokens: &[Token],
    input: &str,
    env: &Environment,
) -> Result<Vec<PostfixNode>, ParseError> {
    Parser::new(tokens, input, env).parse()
}
