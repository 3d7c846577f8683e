use crate::diagnostics::Deadline;
use crate::language::{
    ast::*,
    errors::{SyntaxError, SyntaxErrors},
    lexer::{LexError, lex},
    span::Span,
    token::{Token, TokenKind},
    types::{Type, TypeExpr},
};
use std::mem;

const MAX_NESTING_DEPTH: usize = 200;

/// How a parse attempt ended when it did not produce a value: either a syntax
/// error worth reporting, or the shared classification deadline expired and the
/// attempt was abandoned.
#[derive(Clone, Debug)]
pub enum ParseFault {
    Syntax(SyntaxError),
    Interrupted,
}

impl From<SyntaxError> for ParseFault {
    fn from(error: SyntaxError) -> Self {
        ParseFault::Syntax(error)
    }
}

pub fn parse_program(source: &str) -> Result<Program, SyntaxErrors> {
    let tokens = match lex(source) {
        Ok(tokens) => tokens,
        Err(errors) => return Err(SyntaxErrors::new(errors.into_iter().map(lex_to_syntax).collect())),
    };

    let mut parser = Parser::new(tokens, None);
    let mut imports = Vec::new();
    let mut functions = Vec::new();
    let mut errors = Vec::new();

    while !parser.at_eof() {
        if parser.check(&TokenKind::Semi) {
            let _ = parser.bump();
            continue;
        }
        if parser.check(&TokenKind::Import) {
            match parser.parse_import() {
                Ok(import) => imports.push(import),
                Err(fault) => {
                    errors.push(fault_to_syntax(fault));
                    parser.synchronize();
                }
            }
            continue;
        }
        match parser.parse_function() {
            Ok(function) => functions.push(function),
            Err(fault) => {
                errors.push(fault_to_syntax(fault));
                parser.synchronize();
            }
        }
    }

    if errors.is_empty() {
        Ok(Program { imports, functions })
    } else {
        Err(SyntaxErrors::new(errors))
    }
}

pub fn parse_import_source(source: &str, deadline: Option<Deadline>) -> Result<Import, ParseFault> {
    let mut parser = snippet_parser(source, deadline)?;
    let import = parser.parse_import()?;
    parser.expect_eof("expected end of input after import")?;
    Ok(import)
}

pub fn parse_function_source(
    source: &str,
    deadline: Option<Deadline>,
) -> Result<FunctionDef, ParseFault> {
    let mut parser = snippet_parser(source, deadline)?;
    let function = parser.parse_function()?;
    parser.expect_eof("expected end of input after function declaration")?;
    Ok(function)
}

pub fn parse_variable_source(
    source: &str,
    deadline: Option<Deadline>,
) -> Result<VarDecl, ParseFault> {
    let mut parser = snippet_parser(source, deadline)?;
    let decl = parser.parse_var_decl()?;
    parser.expect_eof("expected end of input after variable declaration")?;
    Ok(decl)
}

pub fn parse_statement_source(
    source: &str,
    deadline: Option<Deadline>,
) -> Result<Statement, ParseFault> {
    let mut parser = snippet_parser(source, deadline)?;
    let statement = parser.parse_statement()?;
    parser.expect_eof("expected end of input after statement")?;
    Ok(statement)
}

/// Parses a bare expression, tolerating one trailing `;`.
pub fn parse_expression_source(
    source: &str,
    deadline: Option<Deadline>,
) -> Result<Expr, ParseFault> {
    let mut parser = snippet_parser(source, deadline)?;
    let expr = parser.parse_expr()?;
    parser.matches(&TokenKind::Semi)?;
    parser.expect_eof("expected end of input after expression")?;
    Ok(expr)
}

/// Extracts the dotted path of an already validated import snippet.
pub fn import_path(source: &str) -> Option<String> {
    parse_import_source(source, None).ok().map(|import| import.path)
}

/// Extracts the declared name of an already validated function snippet.
pub fn declaration_name(source: &str) -> Option<String> {
    parse_function_source(source, None)
        .ok()
        .map(|function| function.name.name)
}

/// Re-parses an already validated variable-declaration snippet.
pub fn variable_declaration(source: &str) -> Option<VarDecl> {
    parse_variable_source(source, None).ok()
}

fn snippet_parser(source: &str, deadline: Option<Deadline>) -> Result<Parser, ParseFault> {
    let tokens = match lex(source) {
        Ok(tokens) => tokens,
        Err(mut errors) => return Err(ParseFault::Syntax(lex_to_syntax(errors.remove(0)))),
    };
    Ok(Parser::new(tokens, deadline))
}

fn lex_to_syntax(error: LexError) -> SyntaxError {
    SyntaxError::new(error.message, error.span)
}

fn fault_to_syntax(fault: ParseFault) -> SyntaxError {
    match fault {
        ParseFault::Syntax(error) => error,
        ParseFault::Interrupted => SyntaxError::new("parse interrupted", Span::new(0, 0)),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    deadline: Option<Deadline>,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>, deadline: Option<Deadline>) -> Self {
        Self {
            tokens,
            pos: 0,
            deadline,
            depth: 0,
        }
    }

    /// Guards the recursive productions so pathological nesting fails with a
    /// syntax error instead of exhausting the stack.
    fn enter_nesting(&mut self) -> Result<(), ParseFault> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseFault::Syntax(SyntaxError::new(
                "input is too deeply nested",
                self.peek().span,
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn tick(&self) -> Result<(), ParseFault> {
        match &self.deadline {
            Some(deadline) if deadline.expired() => Err(ParseFault::Interrupted),
            _ => Ok(()),
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_next_is(&self, kind: &TokenKind) -> bool {
        self.tokens
            .get(self.pos + 1)
            .map(|token| mem::discriminant(&token.kind) == mem::discriminant(kind))
            .unwrap_or(false)
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn bump(&mut self) -> Result<Token, ParseFault> {
        self.tick()?;
        let token = self.tokens[self.pos].clone();
        if !matches!(token.kind, TokenKind::Eof) {
            self.pos += 1;
        }
        Ok(token)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        mem::discriminant(&self.peek().kind) == mem::discriminant(kind)
    }

    fn matches(&mut self, kind: &TokenKind) -> Result<bool, ParseFault> {
        self.tick()?;
        if self.check(kind) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<Token, ParseFault> {
        self.tick()?;
        if self.check(kind) {
            self.bump()
        } else {
            Err(self.error_here(message))
        }
    }

    fn expect_identifier(&mut self, message: &str) -> Result<Identifier, ParseFault> {
        self.tick()?;
        if let TokenKind::Identifier(name) = &self.peek().kind {
            let name = name.clone();
            let token = self.bump()?;
            Ok(Identifier {
                name,
                span: token.span,
            })
        } else {
            Err(self.error_here(message))
        }
    }

    fn expect_eof(&mut self, message: &str) -> Result<(), ParseFault> {
        if self.at_eof() {
            Ok(())
        } else {
            Err(self.error_here(message))
        }
    }

    fn error_here(&self, message: &str) -> ParseFault {
        let token = self.peek();
        ParseFault::Syntax(SyntaxError::new(
            format!("{message}, found {}", token.kind.describe()),
            token.span,
        ))
    }

    /// Skips ahead to the next plausible top-level item after an error.
    fn synchronize(&mut self) {
        while !self.at_eof() {
            let Ok(token) = self.bump() else { return };
            if matches!(token.kind, TokenKind::Semi | TokenKind::RBrace) {
                return;
            }
        }
    }

    fn peek_type(&self) -> Option<Type> {
        match self.peek().kind {
            TokenKind::KwInt => Some(Type::Int),
            TokenKind::KwFloat => Some(Type::Float),
            TokenKind::KwBool => Some(Type::Bool),
            TokenKind::KwString => Some(Type::Str),
            TokenKind::KwVoid => Some(Type::Unit),
            _ => None,
        }
    }

    fn parse_type_expr(&mut self, message: &str) -> Result<TypeExpr, ParseFault> {
        match self.peek_type() {
            Some(ty) => {
                let token = self.bump()?;
                Ok(TypeExpr {
                    ty,
                    span: token.span,
                })
            }
            None => Err(self.error_here(message)),
        }
    }

    fn parse_import(&mut self) -> Result<Import, ParseFault> {
        let start = self.expect(&TokenKind::Import, "expected `import`")?;
        let mut path = self
            .expect_identifier("expected module path after `import`")?
            .name;
        while self.matches(&TokenKind::Dot)? {
            let segment = self.expect_identifier("expected path segment after `.`")?;
            path.push('.');
            path.push_str(&segment.name);
        }
        let end = self.expect(&TokenKind::Semi, "expected `;` after import path")?;
        Ok(Import {
            path,
            span: start.span.merge(end.span),
        })
    }

    fn parse_function(&mut self) -> Result<FunctionDef, ParseFault> {
        let ret = self.parse_type_expr("expected a return type to start a function declaration")?;
        let name = self.expect_identifier("expected function name")?;
        self.expect(&TokenKind::LParen, "expected `(` after function name")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let ty = self.parse_type_expr("expected parameter type")?;
                let pname = self.expect_identifier("expected parameter name")?;
                params.push(Param {
                    span: ty.span.merge(pname.span),
                    name: pname,
                    ty,
                });
                if !self.matches(&TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "expected `)` after parameters")?;
        let body = self.parse_block()?;
        Ok(FunctionDef {
            span: ret.span.merge(body.span),
            name,
            ret,
            params,
            body,
        })
    }

    fn parse_block(&mut self) -> Result<Block, ParseFault> {
        let open = self.expect(&TokenKind::LBrace, "expected `{`")?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_eof() {
            statements.push(self.parse_statement()?);
        }
        let close = self.expect(&TokenKind::RBrace, "expected `}` to close block")?;
        Ok(Block {
            statements,
            span: open.span.merge(close.span),
        })
    }

    fn parse_var_decl(&mut self) -> Result<VarDecl, ParseFault> {
        let ty = self.parse_type_expr("expected a type to start a variable declaration")?;
        let name = self.expect_identifier("expected variable name")?;
        self.expect(&TokenKind::Eq, "expected `=` after variable name")?;
        let value = self.parse_expr()?;
        let end = self.expect(&TokenKind::Semi, "expected `;` after variable declaration")?;
        Ok(VarDecl {
            span: ty.span.merge(end.span),
            ty,
            name,
            value,
        })
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseFault> {
        self.tick()?;
        self.enter_nesting()?;
        let statement = self.parse_statement_inner();
        self.depth -= 1;
        statement
    }

    fn parse_statement_inner(&mut self) -> Result<Statement, ParseFault> {
        if self.peek_type().is_some() {
            return self.parse_var_decl().map(Statement::VarDecl);
        }
        let kind = self.peek().kind.clone();
        match kind {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Identifier(_) if self.peek_next_is(&TokenKind::Eq) => self.parse_assign(),
            _ => {
                let expr = self.parse_expr()?;
                let end = self.expect(&TokenKind::Semi, "expected `;` after expression")?;
                Ok(Statement::Expr {
                    span: expr.span().merge(end.span),
                    expr,
                })
            }
        }
    }

    fn parse_assign(&mut self) -> Result<Statement, ParseFault> {
        let name = self.expect_identifier("expected variable name")?;
        self.expect(&TokenKind::Eq, "expected `=` in assignment")?;
        let value = self.parse_expr()?;
        let end = self.expect(&TokenKind::Semi, "expected `;` after assignment")?;
        Ok(Statement::Assign {
            span: name.span.merge(end.span),
            name,
            value,
        })
    }

    fn parse_if(&mut self) -> Result<Statement, ParseFault> {
        let start = self.expect(&TokenKind::If, "expected `if`")?;
        self.expect(&TokenKind::LParen, "expected `(` after `if`")?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "expected `)` after condition")?;
        let then_block = self.parse_block()?;
        let mut span = start.span.merge(then_block.span);
        let else_block = if self.matches(&TokenKind::Else)? {
            let block = if self.check(&TokenKind::If) {
                // Route through parse_statement so `else if` chains count
                // against the nesting limit.
                let nested = self.parse_statement()?;
                Block {
                    span: nested.span(),
                    statements: vec![nested],
                }
            } else {
                self.parse_block()?
            };
            span = span.merge(block.span);
            Some(block)
        } else {
            None
        };
        Ok(Statement::If {
            cond,
            then_block,
            else_block,
            span,
        })
    }

    fn parse_while(&mut self) -> Result<Statement, ParseFault> {
        let start = self.expect(&TokenKind::While, "expected `while`")?;
        self.expect(&TokenKind::LParen, "expected `(` after `while`")?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "expected `)` after condition")?;
        let body = self.parse_block()?;
        Ok(Statement::While {
            span: start.span.merge(body.span),
            cond,
            body,
        })
    }

    fn parse_return(&mut self) -> Result<Statement, ParseFault> {
        let start = self.expect(&TokenKind::Return, "expected `return`")?;
        if self.check(&TokenKind::Semi) {
            let end = self.bump()?;
            return Ok(Statement::Return {
                value: None,
                span: start.span.merge(end.span),
            });
        }
        let value = self.parse_expr()?;
        let end = self.expect(&TokenKind::Semi, "expected `;` after return value")?;
        Ok(Statement::Return {
            value: Some(value),
            span: start.span.merge(end.span),
        })
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseFault> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseFault> {
        let mut left = self.parse_and()?;
        while self.matches(&TokenKind::PipePipe)? {
            let right = self.parse_and()?;
            left = binary(left, BinaryOp::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseFault> {
        let mut left = self.parse_equality()?;
        while self.matches(&TokenKind::AmpAmp)? {
            let right = self.parse_equality()?;
            left = binary(left, BinaryOp::And, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseFault> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = if self.matches(&TokenKind::EqEq)? {
                BinaryOp::Eq
            } else if self.matches(&TokenKind::BangEq)? {
                BinaryOp::Ne
            } else {
                break;
            };
            let right = self.parse_comparison()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseFault> {
        let mut left = self.parse_term()?;
        loop {
            let op = if self.matches(&TokenKind::LtEq)? {
                BinaryOp::Le
            } else if self.matches(&TokenKind::GtEq)? {
                BinaryOp::Ge
            } else if self.matches(&TokenKind::Lt)? {
                BinaryOp::Lt
            } else if self.matches(&TokenKind::Gt)? {
                BinaryOp::Gt
            } else {
                break;
            };
            let right = self.parse_term()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseFault> {
        let mut left = self.parse_factor()?;
        loop {
            let op = if self.matches(&TokenKind::Plus)? {
                BinaryOp::Add
            } else if self.matches(&TokenKind::Minus)? {
                BinaryOp::Sub
            } else {
                break;
            };
            let right = self.parse_factor()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseFault> {
        let mut left = self.parse_unary()?;
        loop {
            let op = if self.matches(&TokenKind::Star)? {
                BinaryOp::Mul
            } else if self.matches(&TokenKind::Slash)? {
                BinaryOp::Div
            } else if self.matches(&TokenKind::Percent)? {
                BinaryOp::Rem
            } else {
                break;
            };
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseFault> {
        self.tick()?;
        self.enter_nesting()?;
        let expr = self.parse_unary_inner();
        self.depth -= 1;
        expr
    }

    fn parse_unary_inner(&mut self) -> Result<Expr, ParseFault> {
        let op = if self.check(&TokenKind::Minus) {
            Some(UnaryOp::Neg)
        } else if self.check(&TokenKind::Bang) {
            Some(UnaryOp::Not)
        } else {
            None
        };
        if let Some(op) = op {
            let token = self.bump()?;
            let operand = self.parse_unary()?;
            let span = token.span.merge(operand.span());
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                span,
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseFault> {
        let token = self.bump()?;
        match token.kind {
            TokenKind::Integer(value) => Ok(Expr::Literal(Literal {
                kind: LiteralKind::Int(value),
                span: token.span,
            })),
            TokenKind::Float(value) => Ok(Expr::Literal(Literal {
                kind: LiteralKind::Float(value),
                span: token.span,
            })),
            TokenKind::Str(value) => Ok(Expr::Literal(Literal {
                kind: LiteralKind::Str(value),
                span: token.span,
            })),
            TokenKind::True => Ok(Expr::Literal(Literal {
                kind: LiteralKind::Bool(true),
                span: token.span,
            })),
            TokenKind::False => Ok(Expr::Literal(Literal {
                kind: LiteralKind::Bool(false),
                span: token.span,
            })),
            TokenKind::LParen => {
                let expr = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "expected `)` to close grouping")?;
                Ok(expr)
            }
            TokenKind::Identifier(name) => {
                let ident = Identifier {
                    name,
                    span: token.span,
                };
                if self.matches(&TokenKind::Dot)? {
                    let function = self.expect_identifier("expected function name after `.`")?;
                    self.expect(
                        &TokenKind::LParen,
                        "expected `(` to call a module function",
                    )?;
                    let (args, close) = self.parse_args()?;
                    return Ok(Expr::Call {
                        span: ident.span.merge(close.span),
                        target: CallTarget {
                            module: Some(ident.name),
                            name: function.name,
                            span: ident.span.merge(function.span),
                        },
                        args,
                    });
                }
                if self.check(&TokenKind::LParen) {
                    self.bump()?;
                    let (args, close) = self.parse_args()?;
                    return Ok(Expr::Call {
                        span: ident.span.merge(close.span),
                        target: CallTarget {
                            module: None,
                            name: ident.name,
                            span: ident.span,
                        },
                        args,
                    });
                }
                Ok(Expr::Ident(ident))
            }
            other => Err(ParseFault::Syntax(SyntaxError::new(
                format!("expected expression, found {}", other.describe()),
                token.span,
            ))),
        }
    }

    fn parse_args(&mut self) -> Result<(Vec<Expr>, Token), ParseFault> {
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.matches(&TokenKind::Comma)? {
                    break;
                }
            }
        }
        let close = self.expect(&TokenKind::RParen, "expected `)` after arguments")?;
        Ok((args, close))
    }
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    let span = left.span().merge(right.span());
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
        span,
    }
}
