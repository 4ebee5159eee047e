//! SQL token types.
//!
//! Every token carries a discriminant and a byte-offset Span. Keywords are
//! their own variants so the parser can match them directly.

use sqlc_ast::Span;

/// A lexed token with its position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Bytes of the source the token covers.
    pub span: Span,
    /// 1-based line of the first byte.
    pub line: u32,
    /// 1-based column of the first character.
    pub col: u32,
}

/// Token discriminant.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // === Literals ===
    /// Integer literal: `42`.
    Integer(i64),
    /// Float literal kept in source form: `3.14`, `1e10`, `.5`.
    Float(String),
    /// `'text'`, with doubled quotes unescaped.
    String(String),

    // === Identifiers ===
    /// Unquoted identifier, folded to lower case.
    Id(String),
    /// Double-quoted identifier, case preserved.
    QuotedId(String),

    // === Parameters ===
    /// `$N` positional parameter.
    Param(u32),
    /// `?` parameter, numbered by the parser in order of appearance.
    Question,

    // === Operators ===
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Concat, // `||`
    Eq,     // `=`
    Ne,     // `<>` or `!=`
    Lt,
    Le,
    Gt,
    Ge,
    DoubleColon, // `::`

    // === Punctuation ===
    Dot,
    Comma,
    Semicolon,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,

    // === Keywords ===
    KwAnd,
    KwAs,
    KwAsc,
    KwBy,
    KwCross,
    KwDelete,
    KwDesc,
    KwDistinct,
    KwFalse,
    KwFrom,
    KwFull,
    KwGroup,
    KwIn,
    KwInner,
    KwInsert,
    KwInto,
    KwIs,
    KwJoin,
    KwLeft,
    KwLike,
    KwLimit,
    KwNot,
    KwNull,
    KwOn,
    KwOr,
    KwOrder,
    KwOuter,
    KwReturning,
    KwRight,
    KwSelect,
    KwSet,
    KwTrue,
    KwUpdate,
    KwValues,
    KwWhere,

    // === Special ===
    /// End of input.
    Eof,
    /// Input the lexer could not make sense of, with a message.
    Error(String),
}

impl TokenKind {
    /// The keyword spelled by `s`, ignoring case.
    #[must_use]
    pub fn lookup_keyword(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Some(Self::KwAnd),
            "AS" => Some(Self::KwAs),
            "ASC" => Some(Self::KwAsc),
            "BY" => Some(Self::KwBy),
            "CROSS" => Some(Self::KwCross),
            "DELETE" => Some(Self::KwDelete),
            "DESC" => Some(Self::KwDesc),
            "DISTINCT" => Some(Self::KwDistinct),
            "FALSE" => Some(Self::KwFalse),
            "FROM" => Some(Self::KwFrom),
            "FULL" => Some(Self::KwFull),
            "GROUP" => Some(Self::KwGroup),
            "IN" => Some(Self::KwIn),
            "INNER" => Some(Self::KwInner),
            "INSERT" => Some(Self::KwInsert),
            "INTO" => Some(Self::KwInto),
            "IS" => Some(Self::KwIs),
            "JOIN" => Some(Self::KwJoin),
            "LEFT" => Some(Self::KwLeft),
            "LIKE" => Some(Self::KwLike),
            "LIMIT" => Some(Self::KwLimit),
            "NOT" => Some(Self::KwNot),
            "NULL" => Some(Self::KwNull),
            "ON" => Some(Self::KwOn),
            "OR" => Some(Self::KwOr),
            "ORDER" => Some(Self::KwOrder),
            "OUTER" => Some(Self::KwOuter),
            "RETURNING" => Some(Self::KwReturning),
            "RIGHT" => Some(Self::KwRight),
            "SELECT" => Some(Self::KwSelect),
            "SET" => Some(Self::KwSet),
            "TRUE" => Some(Self::KwTrue),
            "UPDATE" => Some(Self::KwUpdate),
            "VALUES" => Some(Self::KwValues),
            "WHERE" => Some(Self::KwWhere),
            _ => None,
        }
    }

    /// Keywords that begin a statement. The parser resynchronizes on these.
    #[must_use]
    pub const fn is_statement_start(&self) -> bool {
        matches!(
            self,
            Self::KwSelect | Self::KwInsert | Self::KwUpdate | Self::KwDelete
        )
    }

    /// Short description used in "expected X, got Y" messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Integer(i) => format!("integer {i}"),
            Self::Float(f) => format!("number {f}"),
            Self::String(s) => format!("string '{s}'"),
            Self::Id(s) | Self::QuotedId(s) => format!("identifier {s}"),
            Self::Param(n) => format!("${n}"),
            Self::Eof => "end of input".to_owned(),
            Self::Error(msg) => msg.clone(),
            other => format!("{other:?}"),
        }
    }
}
