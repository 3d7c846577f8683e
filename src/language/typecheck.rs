use crate::language::{
    ast::*,
    span::Span,
    types::Type,
};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug)]
pub struct TypeError {
    pub message: String,
    pub span: Span,
}

impl TypeError {
    fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TypeWarning {
    pub message: String,
    pub span: Span,
}

#[derive(Clone)]
struct FunctionSignature {
    params: Vec<Type>,
    ret: Type,
}

/// Checks a whole program, returning any warnings on success.
pub fn check_program(program: &Program) -> Result<Vec<TypeWarning>, Vec<TypeError>> {
    let mut checker = Checker {
        imports: program
            .imports
            .iter()
            .map(|import| import.path.clone())
            .collect(),
        functions: HashMap::new(),
        scopes: Vec::new(),
        current_ret: Type::Unit,
        errors: Vec::new(),
    };
    checker.collect_functions(program);
    for function in &program.functions {
        checker.check_function(function);
    }

    // Unknown import paths are accepted; they just cannot be called into.
    let warnings = program
        .imports
        .iter()
        .filter(|import| !known_module(&import.path))
        .map(|import| TypeWarning {
            message: format!("module `{}` has no known functions", import.path),
            span: import.span,
        })
        .collect();

    if checker.errors.is_empty() {
        Ok(warnings)
    } else {
        Err(checker.errors)
    }
}

fn known_module(path: &str) -> bool {
    matches!(path, "math" | "strings")
}

struct Checker {
    imports: HashSet<String>,
    functions: HashMap<String, FunctionSignature>,
    scopes: Vec<Vec<(String, Type)>>,
    current_ret: Type,
    errors: Vec<TypeError>,
}

impl Checker {
    fn collect_functions(&mut self, program: &Program) {
        for function in &program.functions {
            let name = &function.name.name;
            if name == "print" || name == "show" {
                self.error(
                    format!("cannot redefine builtin `{name}`"),
                    function.name.span,
                );
                continue;
            }
            if self.functions.contains_key(name) {
                self.error(
                    format!("function `{name}` is already defined"),
                    function.name.span,
                );
                continue;
            }
            self.functions.insert(
                name.clone(),
                FunctionSignature {
                    params: function.params.iter().map(|param| param.ty.ty).collect(),
                    ret: function.ret.ty,
                },
            );
        }
    }

    fn check_function(&mut self, function: &FunctionDef) {
        self.current_ret = function.ret.ty;
        self.scopes.push(Vec::new());
        for param in &function.params {
            if param.ty.ty == Type::Unit {
                self.error("parameters cannot have type `void`", param.ty.span);
            }
            self.declare(&param.name.name, param.ty.ty);
        }
        self.check_block(&function.body);
        self.scopes.pop();
    }

    fn check_block(&mut self, block: &Block) {
        self.scopes.push(Vec::new());
        for statement in &block.statements {
            self.check_statement(statement);
        }
        self.scopes.pop();
    }

    fn check_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::VarDecl(decl) => {
                if decl.ty.ty == Type::Unit {
                    self.error("cannot declare a variable of type `void`", decl.ty.span);
                    return;
                }
                if let Some(found) = self.infer_expr(&decl.value) {
                    if found != decl.ty.ty {
                        self.error(
                            format!(
                                "mismatched types: `{}` declared as `{}` but initialized with `{found}`",
                                decl.name.name, decl.ty.ty
                            ),
                            decl.value.span(),
                        );
                        return;
                    }
                }
                // A repeated declaration replaces the existing binding in the
                // same scope, matching re-declaration across session turns.
                self.declare(&decl.name.name, decl.ty.ty);
            }
            Statement::Assign { name, value, .. } => {
                let declared = self.lookup(&name.name);
                let found = self.infer_expr(value);
                match declared {
                    None => self.error(format!("unknown variable `{}`", name.name), name.span),
                    Some(expected) => {
                        if let Some(found) = found {
                            if found != expected {
                                self.error(
                                    format!(
                                        "mismatched types: `{}` has type `{expected}` but is assigned `{found}`",
                                        name.name
                                    ),
                                    value.span(),
                                );
                            }
                        }
                    }
                }
            }
            Statement::If {
                cond,
                then_block,
                else_block,
                ..
            } => {
                self.check_condition(cond);
                self.check_block(then_block);
                if let Some(block) = else_block {
                    self.check_block(block);
                }
            }
            Statement::While { cond, body, .. } => {
                self.check_condition(cond);
                self.check_block(body);
            }
            Statement::Return { value, span } => {
                let found = match value {
                    Some(expr) => self.infer_expr(expr),
                    None => Some(Type::Unit),
                };
                if let Some(found) = found {
                    if self.current_ret == Type::Unit && found != Type::Unit {
                        self.error("void function cannot return a value", *span);
                    } else if self.current_ret != Type::Unit && found != self.current_ret {
                        self.error(
                            format!(
                                "mismatched return type: expected `{}`, found `{found}`",
                                self.current_ret
                            ),
                            *span,
                        );
                    }
                }
            }
            Statement::Expr { expr, .. } => {
                self.infer_expr(expr);
            }
        }
    }

    fn check_condition(&mut self, cond: &Expr) {
        if let Some(found) = self.infer_expr(cond) {
            if found != Type::Bool {
                self.error(
                    format!("condition must be `bool`, found `{found}`"),
                    cond.span(),
                );
            }
        }
    }

    /// Infers the type of an expression; `None` means the expression already
    /// produced an error and follow-on checks should stay quiet.
    fn infer_expr(&mut self, expr: &Expr) -> Option<Type> {
        match expr {
            Expr::Literal(literal) => Some(match literal.kind {
                LiteralKind::Int(_) => Type::Int,
                LiteralKind::Float(_) => Type::Float,
                LiteralKind::Bool(_) => Type::Bool,
                LiteralKind::Str(_) => Type::Str,
            }),
            Expr::Ident(ident) => match self.lookup(&ident.name) {
                Some(ty) => Some(ty),
                None => {
                    self.error(format!("unknown variable `{}`", ident.name), ident.span);
                    None
                }
            },
            Expr::Unary { op, operand, span } => {
                let found = self.infer_expr(operand)?;
                match op {
                    UnaryOp::Neg if matches!(found, Type::Int | Type::Float) => Some(found),
                    UnaryOp::Not if found == Type::Bool => Some(Type::Bool),
                    UnaryOp::Neg => {
                        self.error(format!("cannot negate a value of type `{found}`"), *span);
                        None
                    }
                    UnaryOp::Not => {
                        self.error(format!("`!` expects `bool`, found `{found}`"), *span);
                        None
                    }
                }
            }
            Expr::Binary {
                left,
                op,
                right,
                span,
            } => {
                let lhs = self.infer_expr(left);
                let rhs = self.infer_expr(right);
                let (lhs, rhs) = (lhs?, rhs?);
                self.infer_binary(*op, lhs, rhs, *span)
            }
            Expr::Call { target, args, span } => self.infer_call(target, args, *span),
        }
    }

    fn infer_binary(&mut self, op: BinaryOp, lhs: Type, rhs: Type, span: Span) -> Option<Type> {
        let mismatch = |checker: &mut Self| {
            checker.error(
                format!(
                    "operator `{}` cannot combine `{lhs}` and `{rhs}`",
                    op.symbol()
                ),
                span,
            );
            None
        };
        match op {
            BinaryOp::Add => match (lhs, rhs) {
                (Type::Int, Type::Int) => Some(Type::Int),
                (Type::Float, Type::Float) => Some(Type::Float),
                (Type::Str, Type::Str) => Some(Type::Str),
                _ => mismatch(self),
            },
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => match (lhs, rhs) {
                (Type::Int, Type::Int) => Some(Type::Int),
                (Type::Float, Type::Float) => Some(Type::Float),
                _ => mismatch(self),
            },
            BinaryOp::Eq | BinaryOp::Ne => {
                if lhs == rhs && lhs != Type::Unit {
                    Some(Type::Bool)
                } else {
                    mismatch(self)
                }
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => match (lhs, rhs) {
                (Type::Int, Type::Int) | (Type::Float, Type::Float) => Some(Type::Bool),
                _ => mismatch(self),
            },
            BinaryOp::And | BinaryOp::Or => {
                if lhs == Type::Bool && rhs == Type::Bool {
                    Some(Type::Bool)
                } else {
                    mismatch(self)
                }
            }
        }
    }

    fn infer_call(&mut self, target: &CallTarget, args: &[Expr], span: Span) -> Option<Type> {
        let arg_types: Vec<Option<Type>> = args.iter().map(|arg| self.infer_expr(arg)).collect();

        if let Some(module) = &target.module {
            if !self.imports.contains(module) {
                self.error(format!("module `{module}` is not imported"), target.span);
                return None;
            }
            let Some((params, ret)) = module_signature(module, &target.name) else {
                self.error(
                    format!("unknown function `{}`", target.display_name()),
                    target.span,
                );
                return None;
            };
            self.check_args(&target.display_name(), params, &arg_types, args, span);
            return Some(ret);
        }

        match target.name.as_str() {
            "print" => {
                if args.len() != 1 {
                    self.error("`print` expects exactly one argument", span);
                } else if arg_types[0] == Some(Type::Unit) {
                    self.error("cannot print a `void` value", args[0].span());
                }
                Some(Type::Unit)
            }
            "show" => {
                if args.len() != 1 {
                    self.error("`show` expects exactly one argument", span);
                }
                Some(Type::Unit)
            }
            name => {
                let Some(signature) = self.functions.get(name).cloned() else {
                    self.error(format!("unknown function `{name}`"), target.span);
                    return None;
                };
                self.check_args(name, &signature.params, &arg_types, args, span);
                Some(signature.ret)
            }
        }
    }

    fn check_args(
        &mut self,
        name: &str,
        params: &[Type],
        arg_types: &[Option<Type>],
        args: &[Expr],
        span: Span,
    ) {
        if params.len() != args.len() {
            self.error(
                format!(
                    "function `{name}` expected {} argument(s) but received {}",
                    params.len(),
                    args.len()
                ),
                span,
            );
            return;
        }
        for (index, expected) in params.iter().enumerate() {
            if let Some(found) = arg_types[index] {
                if found != *expected {
                    self.error(
                        format!(
                            "argument {} of `{name}` expects `{expected}`, found `{found}`",
                            index + 1
                        ),
                        args[index].span(),
                    );
                }
            }
        }
    }

    fn declare(&mut self, name: &str, ty: Type) {
        let scope = self
            .scopes
            .last_mut()
            .expect("checker always has an active scope");
        match scope.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = ty,
            None => scope.push((name.to_string(), ty)),
        }
    }

    fn lookup(&self, name: &str) -> Option<Type> {
        self.scopes.iter().rev().find_map(|scope| {
            scope
                .iter()
                .find(|(existing, _)| existing == name)
                .map(|(_, ty)| *ty)
        })
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.errors.push(TypeError::new(message, span));
    }
}

/// Signatures for the import-gated builtin modules.
pub fn module_signature(module: &str, name: &str) -> Option<(&'static [Type], Type)> {
    match (module, name) {
        ("math", "abs") => Some((&[Type::Int], Type::Int)),
        ("math", "min") => Some((&[Type::Int, Type::Int], Type::Int)),
        ("math", "max") => Some((&[Type::Int, Type::Int], Type::Int)),
        ("strings", "len") => Some((&[Type::Str], Type::Int)),
        ("strings", "upper") => Some((&[Type::Str], Type::Str)),
        ("strings", "lower") => Some((&[Type::Str], Type::Str)),
        _ => None,
    }
}
