#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Out of memory while growing the query tree")]
    NoMemory,

    #[error("Unbalanced group nesting")]
    GroupNesting,

    #[error("Empty group")]
    EmptyGroup,

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("No parse callback registered for predicate: {0}")]
    NoParseCallback(String),

    #[error("No evaluation callback registered for predicate: {0}")]
    NoEvaluationCallback(String),

    #[error("Invalid or missing argument: {0}")]
    InvalidOrMissingArgument(String),

    #[error("Parse callback failed: {0}")]
    ParseCallbackFailed(String),

    #[error("Evaluation callback failed: {0}")]
    EvaluationCallbackFailed(String),
}

pub type Result<T> = std::result::Result<T, QueryError>;
