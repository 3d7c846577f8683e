use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("unknown symbol `{name}`")]
    UnknownSymbol { name: String },
    #[error("type mismatch: {message}")]
    TypeMismatch { message: String },
    #[error("function `{name}` expected {expected} arguments but received {received}")]
    ArityMismatch {
        name: String,
        expected: usize,
        received: usize,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow in `{operation}`")]
    IntegerOverflow { operation: String },
    #[error("function `{name}` ended without returning a value")]
    MissingReturn { name: String },
    #[error("maximum call depth exceeded in `{name}`")]
    CallDepthExceeded { name: String },
    #[error("failed to write program output: {message}")]
    Output { message: String },
}
