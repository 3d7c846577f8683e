use crate::diagnostics::Deadline;
use crate::engine::error::ClassifyError;
use crate::language::{
    ast::{Expr, Statement},
    errors::SyntaxError,
    parser::{self, ParseFault},
    span::Span,
};
use std::fmt;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnippetCategory {
    Import,
    ModuleDeclaration,
    VariableDeclaration,
    Statement,
    Expression,
}

impl fmt::Display for SnippetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SnippetCategory::Import => "import",
            SnippetCategory::ModuleDeclaration => "module declaration",
            SnippetCategory::VariableDeclaration => "variable declaration",
            SnippetCategory::Statement => "statement",
            SnippetCategory::Expression => "expression",
        };
        f.write_str(text)
    }
}

/// One classified unit of REPL input. Created once per turn and never mutated.
#[derive(Clone, Debug)]
pub struct Snippet {
    pub category: SnippetCategory,
    pub source_text: String,
}

impl Snippet {
    pub fn new(category: SnippetCategory, source_text: impl Into<String>) -> Self {
        Self {
            category,
            source_text: source_text.into(),
        }
    }
}

/// Candidate productions in priority order, most structurally specific first.
/// The first match wins even if a later candidate would also parse.
const PRIORITY: [SnippetCategory; 5] = [
    SnippetCategory::Import,
    SnippetCategory::ModuleDeclaration,
    SnippetCategory::VariableDeclaration,
    SnippetCategory::Statement,
    SnippetCategory::Expression,
];

/// Determines the syntactic category of a raw fragment by trial parsing.
///
/// All attempts share one monotonic deadline derived from `budget`; a parse in
/// progress is abandoned as soon as the deadline passes, so worst-case latency
/// stays bounded even for pathological input.
pub fn classify(raw: &str, budget: Duration) -> Result<Snippet, ClassifyError> {
    if raw.trim().is_empty() {
        return Err(ClassifyError::NoMatch {
            error: SyntaxError::new("empty input", Span::new(0, 0)),
        });
    }

    let deadline = Deadline::after(budget);
    let mut last_error: Option<SyntaxError> = None;

    for category in PRIORITY {
        if deadline.expired() {
            return Err(ClassifyError::Timeout { budget });
        }
        match attempt(category, raw, deadline) {
            Ok(()) => return Ok(Snippet::new(category, raw)),
            Err(ParseFault::Interrupted) => return Err(ClassifyError::Timeout { budget }),
            Err(ParseFault::Syntax(error)) => last_error = Some(error),
        }
    }

    // The expression attempt is the most permissive, so its error is the one
    // worth showing.
    Err(ClassifyError::NoMatch {
        error: last_error
            .unwrap_or_else(|| SyntaxError::new("unclassifiable input", Span::new(0, raw.len()))),
    })
}

fn attempt(category: SnippetCategory, raw: &str, deadline: Deadline) -> Result<(), ParseFault> {
    let deadline = Some(deadline);
    match category {
        SnippetCategory::Import => parser::parse_import_source(raw, deadline).map(drop),
        SnippetCategory::ModuleDeclaration => {
            parser::parse_function_source(raw, deadline).map(drop)
        }
        SnippetCategory::VariableDeclaration => {
            parser::parse_variable_source(raw, deadline).map(drop)
        }
        SnippetCategory::Statement => {
            let statement = parser::parse_statement_source(raw, deadline)?;
            match statement {
                // A bare non-call expression is not a statement here; it falls
                // through to the expression production so its value gets shown.
                Statement::Expr { ref expr, span } if !matches!(expr, Expr::Call { .. }) => {
                    Err(ParseFault::Syntax(SyntaxError::new(
                        "bare expression is not a statement",
                        span,
                    )))
                }
                // `return` only makes sense inside a declared function body.
                Statement::Return { span, .. } => Err(ParseFault::Syntax(SyntaxError::new(
                    "`return` outside of a function",
                    span,
                ))),
                _ => Ok(()),
            }
        }
        SnippetCategory::Expression => parser::parse_expression_source(raw, deadline).map(drop),
    }
}
