pub mod environment;
pub mod error;
pub mod interpreter;
pub mod output;
pub mod value;
