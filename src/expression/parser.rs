// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Recursive-descent parser for single-parameter lambdas.
//!
//! Precedence, lowest first:
//!
//! ```text
//! conditional   a if cond else b
//! or / and / not
//! comparison    == != < <= > >= in, not in, is, is not   (chained)
//! additive      + -
//! term          * / // %
//! unary         - +
//! power         **                                        (right-assoc)
//! postfix       x[i]  x[a:b:c]  x.method(...)
//! atom          literals, the parameter, [..], {..}, (..), builtin(...)
//! ```
//!
//! Name resolution happens here rather than in a separate pass: a name is
//! either the parameter, a comprehension variable in scope, or an allow-listed
//! builtin in call position. Anything else is a compilation error.

use serde_json::{Number, Value};

use super::ast::{BinaryOp, CompareOp, Expr, UnaryOp};
use super::builtins::{Builtin, Method};
use super::lexer::{Keyword, Spanned, Token};
use crate::errors::CompilationError;

/// Deepest permitted expression tree. Brackets, prefix operators and every
/// link of an operator, subscript or method chain each count as one level.
pub const MAX_NESTING: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Lambda {
    pub param: String,
    pub body: Expr,
}

pub(crate) fn parse(source: &str, tokens: Vec<Spanned>) -> Result<Lambda, CompilationError> {
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        scope: Vec::new(),
        depth: 0,
    };
    parser.parse_lambda()
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
    scope: Vec<String>,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn error_at(&self, position: usize, reason: impl Into<String>) -> CompilationError {
        CompilationError {
            expression: self.source.to_string(),
            position,
            reason: reason.into(),
        }
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.position)
            .unwrap_or(self.source.len())
    }

    fn error_here(&self, reason: impl Into<String>) -> CompilationError {
        self.error_at(self.position(), reason)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn peek_next(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1).map(|t| &t.token)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> Result<(), CompilationError> {
        if self.eat(&token) {
            return Ok(());
        }
        Err(self.unexpected(&format!("expected {}", token.describe())))
    }

    fn unexpected(&self, context: &str) -> CompilationError {
        match self.peek() {
            Some(token) => self.error_here(format!("{}, found {}", context, token.describe())),
            None => self.error_here(format!("{}, found end of expression", context)),
        }
    }

    fn enter(&mut self) -> Result<(), CompilationError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error_here(format!(
                "expression nests deeper than {} levels",
                MAX_NESTING
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Releases the levels taken by one operator chain.
    fn leave_chain(&mut self, levels: usize) {
        self.depth -= levels;
    }

    fn in_scope(&self, name: &str) -> bool {
        self.scope.iter().any(|bound| bound == name)
    }

    fn check_binding_name(&self, name: &str, position: usize) -> Result<(), CompilationError> {
        if name.starts_with('_') {
            return Err(self.error_at(position, format!("name '{}' is not allowed: names starting with '_' are reserved", name)));
        }
        if Builtin::from_name(name).is_some() {
            return Err(self.error_at(position, format!("name '{}' shadows a builtin function", name)));
        }
        Ok(())
    }

    fn parse_lambda(&mut self) -> Result<Lambda, CompilationError> {
        let header_position = self.position();
        let param = match (self.peek().cloned(), self.peek_next().cloned()) {
            (Some(Token::Keyword(Keyword::Lambda)), next) => {
                self.pos += 1;
                match next {
                    Some(Token::Name(name)) => {
                        self.pos += 1;
                        if self.check(&Token::Comma) {
                            return Err(self.error_here("lambda must declare exactly one parameter"));
                        }
                        self.expect(Token::Colon)?;
                        name
                    }
                    _ => return Err(self.error_here("lambda must declare exactly one parameter")),
                }
            }
            (Some(Token::Name(name)), Some(Token::Arrow)) => {
                self.pos += 2;
                name
            }
            _ => {
                return Err(self.error_at(
                    header_position,
                    "expected a one-parameter function such as `lambda x: ...` or `x -> ...`",
                ))
            }
        };
        self.check_binding_name(&param, header_position)?;

        self.scope.push(param.clone());
        let body = self.parse_expr()?;
        if self.pos < self.tokens.len() {
            return Err(self.unexpected("expected end of expression"));
        }

        Ok(Lambda { param, body })
    }

    fn parse_expr(&mut self) -> Result<Expr, CompilationError> {
        self.enter()?;
        let expr = self.parse_conditional()?;
        self.leave();
        Ok(expr)
    }

    fn parse_conditional(&mut self) -> Result<Expr, CompilationError> {
        let then = self.parse_or()?;
        if !self.eat(&Token::Keyword(Keyword::If)) {
            return Ok(then);
        }
        let test = self.parse_or()?;
        self.expect(Token::Keyword(Keyword::Else))?;
        let otherwise = self.parse_expr()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn parse_or(&mut self) -> Result<Expr, CompilationError> {
        let mut left = self.parse_and()?;
        let mut levels = 0;
        while self.eat(&Token::Keyword(Keyword::Or)) {
            self.enter()?;
            levels += 1;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        self.leave_chain(levels);
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, CompilationError> {
        let mut left = self.parse_not()?;
        let mut levels = 0;
        while self.eat(&Token::Keyword(Keyword::And)) {
            self.enter()?;
            levels += 1;
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        self.leave_chain(levels);
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, CompilationError> {
        if !self.eat(&Token::Keyword(Keyword::Not)) {
            return self.parse_comparison();
        }
        self.enter()?;
        let operand = self.parse_not()?;
        self.leave();
        Ok(Expr::Not(Box::new(operand)))
    }

    fn comparison_op(&mut self) -> Option<CompareOp> {
        let op = match (self.peek(), self.peek_next()) {
            (Some(Token::EqualEqual), _) => CompareOp::Equal,
            (Some(Token::NotEqual), _) => CompareOp::NotEqual,
            (Some(Token::Less), _) => CompareOp::Less,
            (Some(Token::LessEqual), _) => CompareOp::LessEqual,
            (Some(Token::Greater), _) => CompareOp::Greater,
            (Some(Token::GreaterEqual), _) => CompareOp::GreaterEqual,
            (Some(Token::Keyword(Keyword::In)), _) => CompareOp::In,
            (Some(Token::Keyword(Keyword::Not)), Some(Token::Keyword(Keyword::In))) => {
                self.pos += 1;
                CompareOp::NotIn
            }
            (Some(Token::Keyword(Keyword::Is)), Some(Token::Keyword(Keyword::Not))) => {
                self.pos += 1;
                CompareOp::IsNot
            }
            (Some(Token::Keyword(Keyword::Is)), _) => CompareOp::Is,
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn parse_comparison(&mut self) -> Result<Expr, CompilationError> {
        let first = self.parse_additive()?;
        let mut rest = Vec::new();
        while let Some(op) = self.comparison_op() {
            rest.push((op, self.parse_additive()?));
        }
        if rest.is_empty() {
            return Ok(first);
        }
        Ok(Expr::Compare {
            first: Box::new(first),
            rest,
        })
    }

    fn parse_additive(&mut self) -> Result<Expr, CompilationError> {
        let mut left = self.parse_term()?;
        let mut levels = 0;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Subtract,
                _ => {
                    self.leave_chain(levels);
                    return Ok(left);
                }
            };
            self.pos += 1;
            self.enter()?;
            levels += 1;
            let right = self.parse_term()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_term(&mut self) -> Result<Expr, CompilationError> {
        let mut left = self.parse_unary()?;
        let mut levels = 0;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Multiply,
                Some(Token::Slash) => BinaryOp::Divide,
                Some(Token::DoubleSlash) => BinaryOp::FloorDivide,
                Some(Token::Percent) => BinaryOp::Modulo,
                _ => {
                    self.leave_chain(levels);
                    return Ok(left);
                }
            };
            self.pos += 1;
            self.enter()?;
            levels += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, CompilationError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Negate,
            Some(Token::Plus) => UnaryOp::Plus,
            _ => return self.parse_power(),
        };
        self.pos += 1;
        self.enter()?;
        let operand = self.parse_unary()?;
        self.leave();
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_power(&mut self) -> Result<Expr, CompilationError> {
        let base = self.parse_postfix()?;
        if !self.eat(&Token::DoubleStar) {
            return Ok(base);
        }
        self.enter()?;
        let exponent = self.parse_unary()?;
        self.leave();
        Ok(Expr::Binary {
            op: BinaryOp::Power,
            left: Box::new(base),
            right: Box::new(exponent),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, CompilationError> {
        let mut expr = self.parse_atom()?;
        let mut levels = 0;
        loop {
            match self.peek() {
                Some(Token::LeftBracket) => {
                    self.pos += 1;
                    self.enter()?;
                    levels += 1;
                    expr = self.parse_subscript(expr)?;
                }
                Some(Token::Dot) => {
                    self.pos += 1;
                    self.enter()?;
                    levels += 1;
                    expr = self.parse_method_call(expr)?;
                }
                Some(Token::LeftParen) => {
                    return Err(self.error_here("only allow-listed builtin functions can be called"));
                }
                _ => {
                    self.leave_chain(levels);
                    return Ok(expr);
                }
            }
        }
    }

    fn parse_subscript(&mut self, target: Expr) -> Result<Expr, CompilationError> {
        if self.check(&Token::RightBracket) {
            return Err(self.error_here("empty subscript"));
        }
        let start = if self.check(&Token::Colon) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };

        if !self.eat(&Token::Colon) {
            let index = start.ok_or_else(|| self.unexpected("expected a subscript"))?;
            self.expect(Token::RightBracket)?;
            return Ok(Expr::Index {
                target: Box::new(target),
                index,
            });
        }

        let end = if self.check(&Token::Colon) || self.check(&Token::RightBracket) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        let step = if self.eat(&Token::Colon) && !self.check(&Token::RightBracket) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        self.expect(Token::RightBracket)?;

        Ok(Expr::Slice {
            target: Box::new(target),
            start,
            end,
            step,
        })
    }

    fn parse_method_call(&mut self, target: Expr) -> Result<Expr, CompilationError> {
        let position = self.position();
        let name = match self.advance() {
            Some(Spanned {
                token: Token::Name(name),
                ..
            }) => name,
            _ => return Err(self.error_at(position, "expected a method name after '.'")),
        };

        if name.starts_with('_') {
            return Err(self.error_at(
                position,
                format!("access to private attribute '{}' is not allowed", name),
            ));
        }
        if !self.check(&Token::LeftParen) {
            return Err(self.error_at(
                position,
                format!(
                    "attribute access '.{}' is not allowed; only allow-listed method calls are supported",
                    name
                ),
            ));
        }
        let method = Method::from_name(&name).ok_or_else(|| {
            self.error_at(position, format!("method '{}' is not allowed", name))
        })?;

        self.pos += 1;
        let args = self.parse_call_args()?;
        self.check_arity(method.name(), method.arity(), args.len(), position)?;

        Ok(Expr::MethodCall {
            target: Box::new(target),
            method,
            args,
        })
    }

    /// Parses arguments after an opening parenthesis, consuming the closing one.
    fn parse_call_args(&mut self) -> Result<Vec<Expr>, CompilationError> {
        let mut args = Vec::new();
        if self.eat(&Token::RightParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if self.eat(&Token::Comma) {
                if self.eat(&Token::RightParen) {
                    return Ok(args);
                }
                continue;
            }
            self.expect(Token::RightParen)?;
            return Ok(args);
        }
    }

    fn check_arity(
        &self,
        name: &str,
        (min, max): (usize, Option<usize>),
        given: usize,
        position: usize,
    ) -> Result<(), CompilationError> {
        let too_many = max.is_some_and(|max| given > max);
        if given < min || too_many {
            let expected = match max {
                Some(max) if max == min => format!("{}", min),
                Some(max) => format!("{} to {}", min, max),
                None => format!("at least {}", min),
            };
            return Err(self.error_at(
                position,
                format!("'{}' takes {} argument(s), {} given", name, expected, given),
            ));
        }
        Ok(())
    }

    fn parse_atom(&mut self) -> Result<Expr, CompilationError> {
        let position = self.position();
        let token = match self.advance() {
            Some(spanned) => spanned.token,
            None => return Err(self.error_here("unexpected end of expression")),
        };

        match token {
            Token::Int(i) => Ok(Expr::Literal(Value::from(i))),
            Token::Float(f) => Number::from_f64(f)
                .map(|n| Expr::Literal(Value::Number(n)))
                .ok_or_else(|| self.error_at(position, "number literal is out of range")),
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::Keyword(Keyword::None) => Ok(Expr::Literal(Value::Null)),
            Token::Keyword(Keyword::True) => Ok(Expr::Literal(Value::Bool(true))),
            Token::Keyword(Keyword::False) => Ok(Expr::Literal(Value::Bool(false))),
            Token::Keyword(Keyword::Lambda) => {
                Err(self.error_at(position, "nested lambdas are not allowed"))
            }
            Token::Name(name) => self.parse_name(name, position),
            Token::LeftParen => self.parse_parenthesised(),
            Token::LeftBracket => self.parse_list(),
            Token::LeftBrace => self.parse_dict(),
            other => Err(self.error_at(position, format!("unexpected {}", other.describe()))),
        }
    }

    fn parse_name(&mut self, name: String, position: usize) -> Result<Expr, CompilationError> {
        if self.eat(&Token::LeftParen) {
            if self.in_scope(&name) {
                return Err(self.error_at(position, format!("'{}' is not callable", name)));
            }
            let function = Builtin::from_name(&name).ok_or_else(|| {
                self.error_at(position, format!("function '{}' is not allowed", name))
            })?;
            let args = self.parse_call_args()?;
            self.check_arity(function.name(), function.arity(), args.len(), position)?;
            return Ok(Expr::Call { function, args });
        }

        if self.in_scope(&name) {
            return Ok(Expr::Var(name));
        }
        if name.starts_with('_') {
            return Err(self.error_at(
                position,
                format!("name '{}' is not allowed: names starting with '_' are reserved", name),
            ));
        }
        if Builtin::from_name(&name).is_some() {
            return Err(self.error_at(position, format!("builtin '{}' must be called", name)));
        }
        Err(self.error_at(
            position,
            format!(
                "name '{}' is not defined; only the lambda parameter may be referenced",
                name
            ),
        ))
    }

    fn parse_parenthesised(&mut self) -> Result<Expr, CompilationError> {
        if self.eat(&Token::RightParen) {
            return Ok(Expr::List(Vec::new()));
        }
        let first = self.parse_expr()?;
        if !self.eat(&Token::Comma) {
            self.expect(Token::RightParen)?;
            return Ok(first);
        }

        // tuple literal, represented as a list
        let mut items = vec![first];
        while !self.eat(&Token::RightParen) {
            items.push(self.parse_expr()?);
            if !self.eat(&Token::Comma) {
                self.expect(Token::RightParen)?;
                break;
            }
        }
        Ok(Expr::List(items))
    }

    /// Name bound by a top-level `for` inside the bracket just opened, if any.
    fn comprehension_var(&self) -> Option<(String, usize)> {
        let mut depth = 0usize;
        for (offset, spanned) in self.tokens[self.pos..].iter().enumerate() {
            match &spanned.token {
                Token::LeftParen | Token::LeftBracket | Token::LeftBrace => depth += 1,
                Token::RightParen | Token::RightBracket | Token::RightBrace => {
                    if depth == 0 {
                        return None;
                    }
                    depth -= 1;
                }
                Token::Keyword(Keyword::For) if depth == 0 => {
                    return match self.tokens.get(self.pos + offset + 1) {
                        Some(Spanned {
                            token: Token::Name(name),
                            position,
                        }) => Some((name.clone(), *position)),
                        _ => None,
                    };
                }
                _ => {}
            }
        }
        None
    }

    fn parse_list(&mut self) -> Result<Expr, CompilationError> {
        if self.eat(&Token::RightBracket) {
            return Ok(Expr::List(Vec::new()));
        }
        if let Some((var, position)) = self.comprehension_var() {
            return self.parse_comprehension(var, position);
        }

        let mut items = Vec::new();
        loop {
            items.push(self.parse_expr()?);
            if self.eat(&Token::Comma) {
                if self.eat(&Token::RightBracket) {
                    break;
                }
                continue;
            }
            self.expect(Token::RightBracket)?;
            break;
        }
        Ok(Expr::List(items))
    }

    fn parse_comprehension(&mut self, var: String, position: usize) -> Result<Expr, CompilationError> {
        self.check_binding_name(&var, position)?;

        self.scope.push(var.clone());
        let element = self.parse_expr()?;
        self.scope.pop();

        self.expect(Token::Keyword(Keyword::For))?;
        self.pos += 1; // the bound name, located by comprehension_var
        self.expect(Token::Keyword(Keyword::In))?;
        let iter = self.parse_or()?;

        self.scope.push(var.clone());
        let condition = if self.eat(&Token::Keyword(Keyword::If)) {
            Some(Box::new(self.parse_or()?))
        } else {
            None
        };
        self.scope.pop();

        if self.check(&Token::Keyword(Keyword::For)) {
            return Err(self.error_here("only a single 'for' clause is supported"));
        }
        self.expect(Token::RightBracket)?;

        Ok(Expr::Comprehension {
            element: Box::new(element),
            var,
            iter: Box::new(iter),
            condition,
        })
    }

    fn parse_dict(&mut self) -> Result<Expr, CompilationError> {
        let mut entries = Vec::new();
        if self.eat(&Token::RightBrace) {
            return Ok(Expr::Dict(entries));
        }
        loop {
            let key = self.parse_expr()?;
            self.expect(Token::Colon)?;
            let value = self.parse_expr()?;
            entries.push((key, value));
            if self.eat(&Token::Comma) {
                if self.eat(&Token::RightBrace) {
                    break;
                }
                continue;
            }
            self.expect(Token::RightBrace)?;
            break;
        }
        Ok(Expr::Dict(entries))
    }
}
