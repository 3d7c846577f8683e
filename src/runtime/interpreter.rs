use crate::language::{
    ast::*,
    types::Type,
};
use crate::runtime::{
    environment::Environment,
    error::{RuntimeError, RuntimeResult},
    output::OutputHandle,
    value::Value,
};
use std::collections::HashMap;

const MAX_CALL_DEPTH: usize = 200;

/// Runs the entry point of a loaded program and returns the final value of
/// every variable in the entry point's outermost scope, in declaration order.
pub fn run_entry(
    program: &Program,
    entry: &FunctionDef,
    output: &OutputHandle,
) -> RuntimeResult<Vec<(String, Value)>> {
    let mut interpreter = Interpreter::new(program, output.clone());
    let mut env = Environment::new();
    interpreter.exec_statements(&entry.body.statements, &mut env)?;
    Ok(env.root_bindings())
}

enum Flow {
    Normal,
    Return(Value),
}

struct Interpreter<'p> {
    functions: HashMap<&'p str, &'p FunctionDef>,
    output: OutputHandle,
    depth: usize,
}

impl<'p> Interpreter<'p> {
    fn new(program: &'p Program, output: OutputHandle) -> Self {
        Self {
            functions: program
                .functions
                .iter()
                .map(|function| (function.name.name.as_str(), function))
                .collect(),
            output,
            depth: 0,
        }
    }

    fn exec_statements(
        &mut self,
        statements: &[Statement],
        env: &mut Environment,
    ) -> RuntimeResult<Flow> {
        for statement in statements {
            if let Flow::Return(value) = self.exec_statement(statement, env)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_block(&mut self, block: &Block, env: &mut Environment) -> RuntimeResult<Flow> {
        env.push_scope();
        let flow = self.exec_statements(&block.statements, env);
        env.pop_scope();
        flow
    }

    fn exec_statement(
        &mut self,
        statement: &Statement,
        env: &mut Environment,
    ) -> RuntimeResult<Flow> {
        match statement {
            Statement::VarDecl(decl) => {
                let value = self.eval(&decl.value, env)?;
                env.declare(&decl.name.name, value);
                Ok(Flow::Normal)
            }
            Statement::Assign { name, value, .. } => {
                let value = self.eval(value, env)?;
                env.assign(&name.name, value)?;
                Ok(Flow::Normal)
            }
            Statement::If {
                cond,
                then_block,
                else_block,
                ..
            } => {
                if self.eval_condition(cond, env)? {
                    self.exec_block(then_block, env)
                } else if let Some(block) = else_block {
                    self.exec_block(block, env)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Statement::While { cond, body, .. } => {
                while self.eval_condition(cond, env)? {
                    if let Flow::Return(value) = self.exec_block(body, env)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Unit,
                };
                Ok(Flow::Return(value))
            }
            Statement::Expr { expr, .. } => {
                self.eval(expr, env)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn eval_condition(&mut self, cond: &Expr, env: &mut Environment) -> RuntimeResult<bool> {
        match self.eval(cond, env)? {
            Value::Bool(value) => Ok(value),
            other => Err(RuntimeError::TypeMismatch {
                message: format!("condition evaluated to `{}`", other.type_of()),
            }),
        }
    }

    fn eval(&mut self, expr: &Expr, env: &mut Environment) -> RuntimeResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match &literal.kind {
                LiteralKind::Int(value) => Value::Int(*value),
                LiteralKind::Float(value) => Value::Float(*value),
                LiteralKind::Bool(value) => Value::Bool(*value),
                LiteralKind::Str(value) => Value::Str(value.clone()),
            }),
            Expr::Ident(ident) => env.get(&ident.name),
            Expr::Unary { op, operand, .. } => {
                let value = self.eval(operand, env)?;
                eval_unary(*op, value)
            }
            Expr::Binary {
                left, op, right, ..
            } => {
                // Logical operators short-circuit.
                if matches!(op, BinaryOp::And | BinaryOp::Or) {
                    let lhs = self.eval_condition(left, env)?;
                    return match (op, lhs) {
                        (BinaryOp::And, false) => Ok(Value::Bool(false)),
                        (BinaryOp::Or, true) => Ok(Value::Bool(true)),
                        _ => Ok(Value::Bool(self.eval_condition(right, env)?)),
                    };
                }
                let lhs = self.eval(left, env)?;
                let rhs = self.eval(right, env)?;
                eval_binary(*op, lhs, rhs)
            }
            Expr::Call { target, args, .. } => self.eval_call(target, args, env),
        }
    }

    fn eval_call(
        &mut self,
        target: &CallTarget,
        args: &[Expr],
        env: &mut Environment,
    ) -> RuntimeResult<Value> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg, env)?);
        }

        if let Some(module) = &target.module {
            return eval_module_call(module, &target.name, &values);
        }

        match target.name.as_str() {
            "print" | "show" => {
                let Some(value) = values.first() else {
                    return Err(RuntimeError::ArityMismatch {
                        name: target.name.clone(),
                        expected: 1,
                        received: 0,
                    });
                };
                // `show` is the observation wrapper; it stays quiet for void.
                if target.name == "print" || value.type_of() != Type::Unit {
                    self.write_line(&value.to_string())?;
                }
                Ok(Value::Unit)
            }
            name => {
                let Some(&function) = self.functions.get(name) else {
                    return Err(RuntimeError::UnknownSymbol {
                        name: name.to_string(),
                    });
                };
                if function.params.len() != values.len() {
                    return Err(RuntimeError::ArityMismatch {
                        name: name.to_string(),
                        expected: function.params.len(),
                        received: values.len(),
                    });
                }
                self.call_function(function, values)
            }
        }
    }

    fn call_function(
        &mut self,
        function: &'p FunctionDef,
        values: Vec<Value>,
    ) -> RuntimeResult<Value> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::CallDepthExceeded {
                name: function.name.name.clone(),
            });
        }
        self.depth += 1;
        let mut env = Environment::new();
        for (param, value) in function.params.iter().zip(values) {
            env.declare(&param.name.name, value);
        }
        let flow = self.exec_statements(&function.body.statements, &mut env);
        self.depth -= 1;
        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Normal if function.ret.ty == Type::Unit => Ok(Value::Unit),
            Flow::Normal => Err(RuntimeError::MissingReturn {
                name: function.name.name.clone(),
            }),
        }
    }

    fn write_line(&self, text: &str) -> RuntimeResult<()> {
        self.output
            .write_line(text)
            .map_err(|err| RuntimeError::Output {
                message: err.to_string(),
            })
    }
}

fn eval_unary(op: UnaryOp, value: Value) -> RuntimeResult<Value> {
    match (op, value) {
        (UnaryOp::Neg, Value::Int(v)) => {
            v.checked_neg()
                .map(Value::Int)
                .ok_or(RuntimeError::IntegerOverflow {
                    operation: "-".to_string(),
                })
        }
        (UnaryOp::Neg, Value::Float(v)) => Ok(Value::Float(-v)),
        (UnaryOp::Not, Value::Bool(v)) => Ok(Value::Bool(!v)),
        (op, value) => Err(RuntimeError::TypeMismatch {
            message: format!(
                "unary `{}` is not defined for `{}`",
                match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Not => "!",
                },
                value.type_of()
            ),
        }),
    }
}

fn eval_binary(op: BinaryOp, lhs: Value, rhs: Value) -> RuntimeResult<Value> {
    use BinaryOp::*;
    match (op, lhs, rhs) {
        (Add, Value::Int(a), Value::Int(b)) => checked(a.checked_add(b), "+"),
        (Sub, Value::Int(a), Value::Int(b)) => checked(a.checked_sub(b), "-"),
        (Mul, Value::Int(a), Value::Int(b)) => checked(a.checked_mul(b), "*"),
        (Div, Value::Int(a), Value::Int(b)) => {
            if b == 0 {
                Err(RuntimeError::DivisionByZero)
            } else {
                checked(a.checked_div(b), "/")
            }
        }
        (Rem, Value::Int(a), Value::Int(b)) => {
            if b == 0 {
                Err(RuntimeError::DivisionByZero)
            } else {
                checked(a.checked_rem(b), "%")
            }
        }
        (Add, Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        (Sub, Value::Float(a), Value::Float(b)) => Ok(Value::Float(a - b)),
        (Mul, Value::Float(a), Value::Float(b)) => Ok(Value::Float(a * b)),
        (Div, Value::Float(a), Value::Float(b)) => Ok(Value::Float(a / b)),
        (Rem, Value::Float(a), Value::Float(b)) => Ok(Value::Float(a % b)),
        (Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        (Eq, a, b) => Ok(Value::Bool(a == b)),
        (Ne, a, b) => Ok(Value::Bool(a != b)),
        (Lt, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a < b)),
        (Le, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a <= b)),
        (Gt, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a > b)),
        (Ge, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a >= b)),
        (Lt, Value::Float(a), Value::Float(b)) => Ok(Value::Bool(a < b)),
        (Le, Value::Float(a), Value::Float(b)) => Ok(Value::Bool(a <= b)),
        (Gt, Value::Float(a), Value::Float(b)) => Ok(Value::Bool(a > b)),
        (Ge, Value::Float(a), Value::Float(b)) => Ok(Value::Bool(a >= b)),
        (op, lhs, rhs) => Err(RuntimeError::TypeMismatch {
            message: format!(
                "operator `{}` is not defined for `{}` and `{}`",
                op.symbol(),
                lhs.type_of(),
                rhs.type_of()
            ),
        }),
    }
}

fn checked(result: Option<i64>, operation: &str) -> RuntimeResult<Value> {
    result
        .map(Value::Int)
        .ok_or_else(|| RuntimeError::IntegerOverflow {
            operation: operation.to_string(),
        })
}

fn eval_module_call(module: &str, name: &str, values: &[Value]) -> RuntimeResult<Value> {
    match (module, name, values) {
        ("math", "abs", [Value::Int(v)]) => {
            v.checked_abs()
                .map(Value::Int)
                .ok_or(RuntimeError::IntegerOverflow {
                    operation: "abs".to_string(),
                })
        }
        ("math", "min", [Value::Int(a), Value::Int(b)]) => Ok(Value::Int(*a.min(b))),
        ("math", "max", [Value::Int(a), Value::Int(b)]) => Ok(Value::Int(*a.max(b))),
        ("strings", "len", [Value::Str(v)]) => Ok(Value::Int(v.chars().count() as i64)),
        ("strings", "upper", [Value::Str(v)]) => Ok(Value::Str(v.to_uppercase())),
        ("strings", "lower", [Value::Str(v)]) => Ok(Value::Str(v.to_lowercase())),
        _ => Err(RuntimeError::UnknownSymbol {
            name: format!("{module}.{name}"),
        }),
    }
}
