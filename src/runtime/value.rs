use crate::language::types::Type;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Unit,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    pub fn type_of(&self) -> Type {
        match self {
            Value::Unit => Type::Unit,
            Value::Int(_) => Type::Int,
            Value::Float(_) => Type::Float,
            Value::Bool(_) => Type::Bool,
            Value::Str(_) => Type::Str,
        }
    }

    /// Renders the value as a source literal that re-parses to the same value,
    /// used when re-declaring session variables in a synthesized program.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Unit => "0".to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => float_literal(*v),
            Value::Bool(v) => v.to_string(),
            Value::Str(v) => {
                let mut out = String::with_capacity(v.len() + 2);
                out.push('"');
                for ch in v.chars() {
                    match ch {
                        '"' => out.push_str("\\\""),
                        '\\' => out.push_str("\\\\"),
                        '\n' => out.push_str("\\n"),
                        '\t' => out.push_str("\\t"),
                        '\r' => out.push_str("\\r"),
                        other => out.push(other),
                    }
                }
                out.push('"');
                out
            }
        }
    }
}

fn float_literal(value: f64) -> String {
    if value.is_nan() {
        return "(0.0 / 0.0)".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 {
            "(1.0 / 0.0)".to_string()
        } else {
            "(-1.0 / 0.0)".to_string()
        };
    }
    if value < 0.0 {
        // The grammar has no negative literals; emit a unary minus.
        return format!("-{}", float_text(-value));
    }
    float_text(value)
}

fn float_text(value: f64) -> String {
    // `{:?}` keeps a decimal point or exponent, so the text lexes as a float.
    format!("{value:?}")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v}"),
        }
    }
}
