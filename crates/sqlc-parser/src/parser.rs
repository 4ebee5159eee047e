//! SQL parser.
//!
//! Hand-written recursive descent parser. Expression parsing lives in expr.rs.
//! Each statement is parsed into its own [`Ast`] rooted at a `RawStmt`.

use std::error::Error;
use std::fmt;

use sqlc_ast::{
    Ast, DeleteStmt, InsertStmt, JoinKind, NodeId, RangeVar, SelectStmt, SortDirection, Span,
    SyntaxNode, TableName, UpdateStmt,
};
use sqlc_error::SqlcError;

use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub line: u32,
    pub col: u32,
}

impl ParseError {
    #[must_use]
    pub(crate) fn at(message: impl Into<String>, token: Option<&Token>) -> Self {
        if let Some(t) = token {
            Self {
                message: message.into(),
                span: t.span,
                line: t.line,
                col: t.col,
            }
        } else {
            Self {
                message: message.into(),
                span: Span::ZERO,
                line: 0,
                col: 0,
            }
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.col, self.message)
    }
}

impl Error for ParseError {}

impl From<ParseError> for SqlcError {
    fn from(err: ParseError) -> Self {
        Self::Syntax {
            message: err.message,
            span: err.span,
            line: err.line,
            col: err.col,
        }
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    pub(crate) errors: Vec<ParseError>,
    /// Tree of the statement currently being parsed.
    pub(crate) ast: Ast,
    /// Last number handed out to a `?` parameter in the current statement.
    pub(crate) next_param: u32,
}

impl Parser {
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            ast: Ast::new(),
            next_param: 0,
        }
    }

    #[must_use]
    pub fn from_sql(sql: &str) -> Self {
        Self::new(Lexer::tokenize(sql))
    }

    /// Parse every statement, recovering at `;` after an error.
    pub fn parse_all(&mut self) -> (Vec<Ast>, Vec<ParseError>) {
        let mut stmts = Vec::new();
        while let Some(result) = self.next_statement() {
            match result {
                Ok(ast) => stmts.push(ast),
                Err(e) => self.errors.push(e),
            }
        }
        (stmts, std::mem::take(&mut self.errors))
    }

    /// Parse every statement, keeping each outcome in source order.
    pub fn statements(&mut self) -> Vec<Result<Ast, ParseError>> {
        let span = tracing::debug_span!(
            target: "sqlc.parse",
            "parse",
            statements = tracing::field::Empty,
            errors = tracing::field::Empty,
        );
        let _guard = span.enter();

        let mut out = Vec::new();
        while let Some(result) = self.next_statement() {
            if let Err(err) = &result {
                tracing::debug!(target: "sqlc.parse", error = %err, "statement failed to parse");
            }
            out.push(result);
        }

        span.record("statements", out.len() as u64);
        span.record("errors", out.iter().filter(|r| r.is_err()).count() as u64);
        out
    }

    /// Parse the next statement, or `None` at end of input.
    pub fn next_statement(&mut self) -> Option<Result<Ast, ParseError>> {
        while self.check(&TokenKind::Semicolon) {
            self.advance();
        }
        if self.at_eof() {
            return None;
        }
        let result = self.parse_statement();
        match &result {
            Ok(_) => {
                if !self.eat(&TokenKind::Semicolon) && !self.at_eof() {
                    let err = self.err_expected("';' or end of input");
                    self.synchronize();
                    return Some(Err(err));
                }
            }
            Err(_) => self.synchronize(),
        }
        Some(result)
    }

    /// Parse one statement into a fresh tree.
    pub fn parse_statement(&mut self) -> Result<Ast, ParseError> {
        self.ast = Ast::new();
        self.next_param = 0;
        let start = self.current_span();
        let stmt = self.parse_statement_inner()?;
        let span = start.merge(self.prev_span());
        let root = self.ast.push(SyntaxNode::RawStmt { stmt, span });
        self.ast.set_root(root);
        Ok(std::mem::take(&mut self.ast))
    }

    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    // -----------------------------------------------------------------------
    // Token navigation
    // -----------------------------------------------------------------------

    pub(crate) fn peek(&self) -> &TokenKind {
        self.current().map_or(&TokenKind::Eof, |t| &t.kind)
    }

    pub(crate) fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn peek_nth(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map_or(&TokenKind::Eof, |t| &t.kind)
    }

    pub(crate) fn at_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    /// Consume the current token and return it. `Eof` is never consumed.
    pub(crate) fn advance(&mut self) -> Token {
        let tok = self.current().cloned().unwrap_or_else(|| Token {
            kind: TokenKind::Eof,
            span: self.prev_span(),
            line: 0,
            col: 0,
        });
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind) -> Result<Span, ParseError> {
        if self.check(kind) {
            Ok(self.advance().span)
        } else {
            Err(self.err_expected(&format!("{kind:?}")))
        }
    }

    pub(crate) fn current_span(&self) -> Span {
        self.current().map_or(Span::ZERO, |t| t.span)
    }

    /// Span of the most recently consumed token.
    pub(crate) fn prev_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(Span::ZERO, |t| t.span)
    }

    pub(crate) fn err_expected(&self, what: &str) -> ParseError {
        let got = match self.current() {
            Some(t) => t.kind.describe(),
            None => "end of input".to_owned(),
        };
        ParseError::at(format!("expected {what}, got {got}"), self.current())
    }

    fn synchronize(&mut self) {
        loop {
            match self.peek() {
                TokenKind::Eof => return,
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                k if k.is_statement_start() => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Identifiers and names
    // -----------------------------------------------------------------------

    pub(crate) fn parse_identifier(&mut self) -> Result<String, ParseError> {
        match self.peek().clone() {
            TokenKind::Id(s) | TokenKind::QuotedId(s) => {
                self.advance();
                Ok(s)
            }
            _ => Err(self.err_expected("identifier")),
        }
    }

    fn parse_table_name(&mut self) -> Result<TableName, ParseError> {
        let first = self.parse_identifier()?;
        if self.eat(&TokenKind::Dot) {
            let second = self.parse_identifier()?;
            Ok(TableName::qualified(first, second))
        } else {
            Ok(TableName::bare(first))
        }
    }

    fn try_alias(&mut self) -> Result<Option<String>, ParseError> {
        if self.eat(&TokenKind::KwAs) {
            return Ok(Some(self.parse_identifier()?));
        }
        if matches!(self.peek(), TokenKind::Id(_) | TokenKind::QuotedId(_)) {
            return Ok(Some(self.parse_identifier()?));
        }
        Ok(None)
    }

    pub(crate) fn parse_comma_sep<T>(
        &mut self,
        f: fn(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        let mut v = vec![f(self)?];
        while self.eat(&TokenKind::Comma) {
            v.push(f(self)?);
        }
        Ok(v)
    }

    // -----------------------------------------------------------------------
    // Statement dispatch
    // -----------------------------------------------------------------------

    fn parse_statement_inner(&mut self) -> Result<NodeId, ParseError> {
        match self.peek() {
            TokenKind::KwSelect => self.parse_select(),
            TokenKind::KwInsert => self.parse_insert(),
            TokenKind::KwUpdate => self.parse_update(),
            TokenKind::KwDelete => self.parse_delete(),
            TokenKind::Error(msg) => Err(ParseError::at(msg.clone(), self.current())),
            _ => Err(self.err_expected("SELECT, INSERT, UPDATE or DELETE")),
        }
    }

    // -----------------------------------------------------------------------
    // SELECT
    // -----------------------------------------------------------------------

    fn parse_select(&mut self) -> Result<NodeId, ParseError> {
        self.expect(&TokenKind::KwSelect)?;
        let distinct = self.eat(&TokenKind::KwDistinct);
        let targets = self.parse_comma_sep(Self::parse_res_target)?;
        let target_list = self.ast.list(targets);

        let from = if self.eat(&TokenKind::KwFrom) {
            self.parse_comma_sep(Self::parse_from_item)?
        } else {
            Vec::new()
        };
        let from_clause = self.ast.list(from);

        let where_clause = self.parse_where()?;

        let group = if self.eat(&TokenKind::KwGroup) {
            self.expect(&TokenKind::KwBy)?;
            self.parse_comma_sep(Self::parse_expr_id)?
        } else {
            Vec::new()
        };
        let group_clause = self.ast.list(group);

        let sort = if self.eat(&TokenKind::KwOrder) {
            self.expect(&TokenKind::KwBy)?;
            self.parse_comma_sep(Self::parse_sort_by)?
        } else {
            Vec::new()
        };
        let sort_clause = self.ast.list(sort);

        let limit_count = if self.eat(&TokenKind::KwLimit) {
            Some(self.parse_expr_id()?)
        } else {
            None
        };

        Ok(self.ast.push(SyntaxNode::SelectStmt(SelectStmt {
            distinct,
            target_list,
            from_clause,
            where_clause,
            group_clause,
            sort_clause,
            limit_count,
        })))
    }

    /// `*`, or `expr [[AS] name]`.
    fn parse_res_target(&mut self) -> Result<NodeId, ParseError> {
        if self.check(&TokenKind::Star) {
            let span = self.advance().span;
            let star = self.ast.push(SyntaxNode::AStar);
            let fields = self.ast.list(vec![star]);
            let val = self.ast.push(SyntaxNode::ColumnRef { fields, span });
            return Ok(self.ast.push(SyntaxNode::ResTarget {
                name: None,
                val,
                span,
            }));
        }
        let expr = self.parse_expr()?;
        let name = self.try_alias()?;
        let span = expr.span.merge(self.prev_span());
        Ok(self.ast.push(SyntaxNode::ResTarget {
            name,
            val: expr.id,
            span,
        }))
    }

    fn parse_range_var(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        let TableName { schema, name } = self.parse_table_name()?;
        let alias = self.try_alias()?;
        let span = start.merge(self.prev_span());
        Ok(self.ast.push(SyntaxNode::RangeVar(RangeVar {
            schema,
            name,
            alias,
            span,
        })))
    }

    /// A table reference followed by any number of joins.
    fn parse_from_item(&mut self) -> Result<NodeId, ParseError> {
        let mut larg = self.parse_range_var()?;
        loop {
            let kind = match self.peek() {
                TokenKind::KwJoin => JoinKind::Inner,
                TokenKind::KwInner => {
                    self.advance();
                    JoinKind::Inner
                }
                TokenKind::KwLeft | TokenKind::KwRight | TokenKind::KwFull => {
                    let kind = match self.advance().kind {
                        TokenKind::KwLeft => JoinKind::Left,
                        TokenKind::KwRight => JoinKind::Right,
                        _ => JoinKind::Full,
                    };
                    self.eat(&TokenKind::KwOuter);
                    kind
                }
                TokenKind::KwCross => {
                    self.advance();
                    JoinKind::Cross
                }
                _ => break,
            };
            self.expect(&TokenKind::KwJoin)?;
            let rarg = self.parse_range_var()?;
            let quals = if kind == JoinKind::Cross {
                None
            } else {
                self.expect(&TokenKind::KwOn)?;
                Some(self.parse_expr_id()?)
            };
            larg = self.ast.push(SyntaxNode::JoinExpr {
                kind,
                larg,
                rarg,
                quals,
            });
        }
        Ok(larg)
    }

    fn parse_sort_by(&mut self) -> Result<NodeId, ParseError> {
        let node = self.parse_expr_id()?;
        let dir = if self.eat(&TokenKind::KwAsc) {
            SortDirection::Asc
        } else if self.eat(&TokenKind::KwDesc) {
            SortDirection::Desc
        } else {
            SortDirection::Default
        };
        Ok(self.ast.push(SyntaxNode::SortBy { node, dir }))
    }

    fn parse_where(&mut self) -> Result<Option<NodeId>, ParseError> {
        if self.eat(&TokenKind::KwWhere) {
            Ok(Some(self.parse_expr_id()?))
        } else {
            Ok(None)
        }
    }

    fn parse_returning(&mut self) -> Result<NodeId, ParseError> {
        let items = if self.eat(&TokenKind::KwReturning) {
            self.parse_comma_sep(Self::parse_res_target)?
        } else {
            Vec::new()
        };
        Ok(self.ast.list(items))
    }

    // -----------------------------------------------------------------------
    // INSERT / UPDATE / DELETE
    // -----------------------------------------------------------------------

    fn parse_insert(&mut self) -> Result<NodeId, ParseError> {
        self.expect(&TokenKind::KwInsert)?;
        self.expect(&TokenKind::KwInto)?;
        let table = self.parse_table_name()?;
        let relation = self.ast.push(SyntaxNode::TableName(table));

        let names = if self.eat(&TokenKind::LeftParen) {
            let names = self.parse_comma_sep(Self::parse_identifier)?;
            self.expect(&TokenKind::RightParen)?;
            names
        } else {
            Vec::new()
        };
        let col_ids: Vec<NodeId> = names
            .into_iter()
            .map(|n| self.ast.push(SyntaxNode::String(n)))
            .collect();
        let cols = self.ast.list(col_ids);

        self.expect(&TokenKind::KwValues)?;
        let rows = self.parse_comma_sep(Self::parse_values_row)?;
        let values_lists = self.ast.list(rows);
        let returning_list = self.parse_returning()?;

        Ok(self.ast.push(SyntaxNode::InsertStmt(InsertStmt {
            relation,
            cols,
            values_lists,
            returning_list,
        })))
    }

    fn parse_values_row(&mut self) -> Result<NodeId, ParseError> {
        self.expect(&TokenKind::LeftParen)?;
        let items = self.parse_comma_sep(Self::parse_expr_id)?;
        self.expect(&TokenKind::RightParen)?;
        Ok(self.ast.list(items))
    }

    fn parse_update(&mut self) -> Result<NodeId, ParseError> {
        self.expect(&TokenKind::KwUpdate)?;
        let relation = self.parse_range_var()?;
        self.expect(&TokenKind::KwSet)?;
        let assignments = self.parse_comma_sep(Self::parse_assignment)?;
        let target_list = self.ast.list(assignments);
        let where_clause = self.parse_where()?;
        let returning_list = self.parse_returning()?;
        Ok(self.ast.push(SyntaxNode::UpdateStmt(UpdateStmt {
            relation,
            target_list,
            where_clause,
            returning_list,
        })))
    }

    /// `column = expr`.
    fn parse_assignment(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        let name = self.parse_identifier()?;
        self.expect(&TokenKind::Eq)?;
        let val = self.parse_expr()?;
        Ok(self.ast.push(SyntaxNode::ResTarget {
            name: Some(name),
            val: val.id,
            span: start.merge(val.span),
        }))
    }

    fn parse_delete(&mut self) -> Result<NodeId, ParseError> {
        self.expect(&TokenKind::KwDelete)?;
        self.expect(&TokenKind::KwFrom)?;
        let relation = self.parse_range_var()?;
        let where_clause = self.parse_where()?;
        let returning_list = self.parse_returning()?;
        Ok(self.ast.push(SyntaxNode::DeleteStmt(DeleteStmt {
            relation,
            where_clause,
            returning_list,
        })))
    }
}

/// Parse every statement in `sql`, one result per statement in source order.
#[must_use]
pub fn parse_statements(sql: &str) -> Vec<Result<Ast, ParseError>> {
    Parser::from_sql(sql).statements()
}

/// Parse exactly one statement.
pub fn parse_one(sql: &str) -> Result<Ast, ParseError> {
    let mut parser = Parser::from_sql(sql);
    match parser.next_statement() {
        Some(Ok(ast)) => {
            if parser.at_eof() {
                Ok(ast)
            } else {
                Err(ParseError::at(
                    "expected a single statement",
                    parser.current(),
                ))
            }
        }
        Some(Err(err)) => Err(err),
        None => Err(ParseError::at("empty query", parser.current())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sql: &str) -> Ast {
        match parse_one(sql) {
            Ok(ast) => ast,
            Err(err) => unreachable!("parse error for `{sql}`: {err}"),
        }
    }

    fn round_trip(sql: &str) -> String {
        let ast = parse(sql);
        let root = ast.root().unwrap();
        ast.display(root).to_string()
    }

    #[test]
    fn test_select_with_embed() {
        assert_eq!(
            round_trip("SELECT sqlc.embed(users), posts.title FROM users JOIN posts ON posts.user_id = users.id"),
            "SELECT sqlc.embed(users), posts.title FROM users JOIN posts ON posts.user_id = users.id"
        );
    }

    #[test]
    fn test_select_clauses() {
        assert_eq!(
            round_trip(
                "select distinct a as x, count(*) from t where a > 1 and b is not null \
                 group by a order by a desc, b limit 10"
            ),
            "SELECT DISTINCT a AS x, count(*) FROM t WHERE a > 1 AND b IS NOT NULL \
             GROUP BY a ORDER BY a DESC, b LIMIT 10"
        );
    }

    #[test]
    fn test_mixed_bool_operators_keep_grouping() {
        assert_eq!(
            round_trip("SELECT a FROM t WHERE (a OR b) AND c"),
            "SELECT a FROM t WHERE (a OR b) AND c"
        );
        assert_eq!(
            round_trip("SELECT a FROM t WHERE a OR b AND c"),
            "SELECT a FROM t WHERE a OR (b AND c)"
        );
        assert_eq!(
            round_trip("SELECT a FROM t WHERE (a AND b) AND c"),
            "SELECT a FROM t WHERE a AND b AND c"
        );
    }

    #[test]
    fn test_select_star_and_aliases() {
        assert_eq!(
            round_trip("SELECT *, u.* FROM public.users u LEFT OUTER JOIN posts AS p ON p.id = u.id"),
            "SELECT *, u.* FROM public.users AS u LEFT JOIN posts AS p ON p.id = u.id"
        );
    }

    #[test]
    fn test_insert_returning() {
        assert_eq!(
            round_trip("INSERT INTO users (name, bio) VALUES (sqlc.arg(name), $2), ('x', NULL) RETURNING *"),
            "INSERT INTO users (name, bio) VALUES (sqlc.arg(name), $2), ('x', NULL) RETURNING *"
        );
    }

    #[test]
    fn test_update_and_delete() {
        assert_eq!(
            round_trip("UPDATE users SET name = sqlc.narg('name'), age = age + 1 WHERE id = $1"),
            "UPDATE users SET name = sqlc.narg('name'), age = age + 1 WHERE id = $1"
        );
        assert_eq!(
            round_trip("DELETE FROM users WHERE id IN (sqlc.slice(ids)) RETURNING id"),
            "DELETE FROM users WHERE id IN (sqlc.slice(ids)) RETURNING id"
        );
    }

    #[test]
    fn test_question_params_are_numbered() {
        let ast = parse("SELECT * FROM t WHERE a = ? AND b = ?");
        let mut numbers = Vec::new();
        sqlc_ast::inspect(&ast, ast.root().unwrap(), |ast, id| {
            if let SyntaxNode::ParamRef { number, .. } = ast.get(id) {
                numbers.push(*number);
            }
            true
        });
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_statement_span_covers_statement() {
        let sql = "SELECT 1;\n  SELECT sqlc.arg(id) FROM t ;";
        let stmts = parse_statements(sql);
        assert_eq!(stmts.len(), 2);
        let second = stmts[1].as_ref().unwrap();
        let span = second.get(second.root().unwrap()).span().unwrap();
        assert_eq!(span.slice(sql), Some("SELECT sqlc.arg(id) FROM t"));
    }

    #[test]
    fn test_recovery_at_semicolon() {
        let sql = "SELECT FROM; SELECT 1; UPDATE; DELETE FROM t";
        let (stmts, errors) = Parser::from_sql(sql).parse_all();
        assert_eq!(stmts.len(), 2);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line, 1);
        assert_eq!(errors[0].col, 8);
    }

    #[test]
    fn test_statements_keep_order() {
        let results = parse_statements("SELECT 1; SELEC 2; SELECT 3");
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_missing_separator_is_an_error() {
        let err = parse_one("SELECT 1 SELECT 2").unwrap_err();
        assert!(err.message.contains("expected ';'"), "{}", err.message);
    }

    #[test]
    fn test_parse_error_converts_to_syntax_error() {
        let err = parse_one("SELECT (1").unwrap_err();
        let err: SqlcError = err.into();
        assert!(matches!(err, SqlcError::Syntax { .. }));
        assert_eq!(err.error_code(), sqlc_error::ErrorCode::SyntaxError);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_one("  ;  ").is_err());
        assert!(parse_statements("-- nothing").is_empty());
    }
}
