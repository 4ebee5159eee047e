use sqlc_ast::Span;
use thiserror::Error;

/// Primary error type for sqlc query analysis.
///
/// Every error raised while checking a statement carries the [`Span`] of the
/// node it is about, so the caller can point the user at the exact call.
/// Message texts follow PostgreSQL's wording where a PostgreSQL equivalent
/// exists.
#[derive(Error, Debug)]
pub enum SqlcError {
    // === Directive Errors ===
    /// A function, or an unknown `sqlc.*` directive, could not be found.
    #[error("function {name} does not exist")]
    FunctionNotFound { name: String, span: Span },

    /// A directive was called with fewer arguments than it accepts.
    #[error("expected at least {min} parameter(s) to sqlc.{function}; got {actual}")]
    TooFewArguments {
        function: String,
        min: usize,
        actual: usize,
        span: Span,
    },

    /// A directive was called with more arguments than it accepts.
    #[error("expected at most {max} parameter(s) to sqlc.{function}; got {actual}")]
    TooManyArguments {
        function: String,
        max: usize,
        actual: usize,
        span: Span,
    },

    /// A directive argument was neither a constant nor a column reference.
    #[error("expected parameter to sqlc.{function} to be string or reference; got {got}")]
    InvalidDirectiveArgument {
        function: String,
        got: String,
        span: Span,
    },

    /// The option string passed to a directive is not one it understands.
    #[error("valid options for sqlc.{function} are: `nullable`, got {got}")]
    InvalidDirectiveOption {
        function: String,
        got: String,
        span: Span,
    },

    /// A directive option was a constant but not a string.
    #[error("options for sqlc.{function} must be string")]
    DirectiveOptionNotString { function: String, span: Span },

    // === Catalog Errors ===
    /// The function exists but no overload takes this many arguments.
    #[error("function {signature} does not exist")]
    NoMatchingSignature { signature: String, span: Span },

    /// A table referenced by the query is not in the catalog or FROM clause.
    #[error("relation \"{name}\" does not exist")]
    RelationNotFound { name: String, span: Span },

    // === SQL Errors ===
    /// SQL syntax error reported by the parser.
    #[error("syntax error at {line}:{col}: {message}")]
    Syntax {
        message: String,
        span: Span,
        line: u32,
        col: u32,
    },

    // === Configuration Errors ===
    /// The configuration file could not be understood.
    #[error("invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Internal Errors ===
    /// Internal logic error (should never happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// PostgreSQL SQLSTATE classes reported alongside errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// `42883`.
    UndefinedFunction,
    /// `42P01`.
    UndefinedTable,
    /// `42601`.
    SyntaxError,
    /// `22023`.
    InvalidParameterValue,
    /// `F0000`.
    ConfigFileError,
    /// `58030`.
    IoError,
    /// `XX000`.
    InternalError,
}

impl ErrorCode {
    /// The five-character SQLSTATE code.
    pub const fn sqlstate(self) -> &'static str {
        match self {
            Self::UndefinedFunction => "42883",
            Self::UndefinedTable => "42P01",
            Self::SyntaxError => "42601",
            Self::InvalidParameterValue => "22023",
            Self::ConfigFileError => "F0000",
            Self::IoError => "58030",
            Self::InternalError => "XX000",
        }
    }
}

impl SqlcError {
    /// Map this error to a SQLSTATE class.
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::FunctionNotFound { .. } | Self::NoMatchingSignature { .. } => {
                ErrorCode::UndefinedFunction
            }
            Self::RelationNotFound { .. } => ErrorCode::UndefinedTable,
            Self::TooFewArguments { .. }
            | Self::TooManyArguments { .. }
            | Self::InvalidDirectiveArgument { .. }
            | Self::InvalidDirectiveOption { .. }
            | Self::DirectiveOptionNotString { .. } => ErrorCode::InvalidParameterValue,
            Self::Syntax { .. } => ErrorCode::SyntaxError,
            Self::InvalidConfig { .. } => ErrorCode::ConfigFileError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Source location of the offending node, when the error has one.
    pub const fn span(&self) -> Option<Span> {
        match self {
            Self::FunctionNotFound { span, .. }
            | Self::TooFewArguments { span, .. }
            | Self::TooManyArguments { span, .. }
            | Self::InvalidDirectiveArgument { span, .. }
            | Self::InvalidDirectiveOption { span, .. }
            | Self::DirectiveOptionNotString { span, .. }
            | Self::NoMatchingSignature { span, .. }
            | Self::RelationNotFound { span, .. }
            | Self::Syntax { span, .. } => Some(*span),
            Self::InvalidConfig { .. } | Self::Io(_) | Self::Internal(_) => None,
        }
    }

    /// Whether this is a lookup miss.
    ///
    /// Lenient function checking tolerates exactly these errors; a function
    /// that exists but is called wrongly is not a miss.
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::FunctionNotFound { .. } | Self::RelationNotFound { .. }
        )
    }

    /// Whether the user can likely fix this by editing the query or config.
    pub const fn is_user_recoverable(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::Internal(_))
    }

    /// Human-friendly suggestion for fixing this error.
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::FunctionNotFound { .. } => Some(
                "Check the function name; sqlc directives are sqlc.arg, sqlc.narg, sqlc.slice and sqlc.embed",
            ),
            Self::InvalidDirectiveOption { .. } | Self::DirectiveOptionNotString { .. } => {
                Some("The only option accepted by sqlc.embed is 'nullable'")
            }
            Self::InvalidDirectiveArgument { .. } => {
                Some("Pass a plain name, e.g. sqlc.arg(user_id) or sqlc.arg('user_id')")
            }
            Self::RelationNotFound { .. } => {
                Some("Embedded tables must appear in the FROM clause of the query")
            }
            _ => None,
        }
    }

    /// Render as `line:col: message` against the statement's source text.
    pub fn render(&self, source: &str) -> String {
        match self.span() {
            Some(span) if !matches!(self, Self::Syntax { .. }) => {
                let (line, col) = span.line_col(source);
                format!("{line}:{col}: {self}")
            }
            _ => self.to_string(),
        }
    }

    /// Create a function-not-found error.
    pub fn function_not_found(name: impl Into<String>, span: Span) -> Self {
        Self::FunctionNotFound {
            name: name.into(),
            span,
        }
    }

    /// Create a relation-not-found error.
    pub fn relation_not_found(name: impl Into<String>, span: Span) -> Self {
        Self::RelationNotFound {
            name: name.into(),
            span,
        }
    }

    /// Create an invalid-configuration error.
    pub fn invalid_config(detail: impl Into<String>) -> Self {
        Self::InvalidConfig {
            detail: detail.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using `SqlcError`.
pub type Result<T> = std::result::Result<T, SqlcError>;
