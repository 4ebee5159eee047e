use sqlc_ast::{Ast, Span};
use sqlc_catalog::Catalog;
use sqlc_config::CombinedSettings;
use sqlc_error::{Result, SqlcError};
use sqlc_parser::Parser;
use sqlc_rewrite::{EmbedSet, embeds};
use tracing::debug;

use crate::expand::{OutputColumn, expand};

/// One compiled statement.
#[derive(Debug, Clone)]
pub struct Query {
    /// Source text of the statement.
    pub sql: String,
    /// Byte offset of `sql` within the text it was compiled from. Spans in
    /// `ast`, `embeds` and `columns` are relative to that text.
    pub offset: u32,
    /// The statement after directive rewriting.
    pub ast: Ast,
    pub embeds: EmbedSet,
    pub columns: Vec<OutputColumn>,
}

impl Query {
    /// The statement text with each embedded table's directive replaced by
    /// its qualified column list.
    #[must_use]
    pub fn expanded_sql(&self) -> String {
        let mut edits: Vec<(Span, String)> = self
            .columns
            .iter()
            .filter_map(|c| match c {
                OutputColumn::Embed(e) => Some((e.span, e.select_list())),
                OutputColumn::Column(_) => None,
            })
            .collect();
        edits.sort_by_key(|(span, _)| std::cmp::Reverse(span.start));

        let mut sql = self.sql.clone();
        for (span, text) in edits {
            let (Some(start), Some(end)) = (
                span.start.checked_sub(self.offset),
                span.end.checked_sub(self.offset),
            ) else {
                continue;
            };
            let range = start as usize..end as usize;
            if sql.get(range.clone()).is_some() {
                sql.replace_range(range, &text);
            }
        }
        sql
    }

    /// Whether the statement embeds any table.
    #[must_use]
    pub fn has_embeds(&self) -> bool {
        !self.embeds.is_empty()
    }
}

/// Runs the checking and rewriting passes over parsed statements.
///
/// Holds the catalog and the settings of the package being compiled; both are
/// only read, so one compiler can serve several threads.
#[derive(Debug, Clone)]
pub struct Compiler {
    catalog: Catalog,
    settings: CombinedSettings,
}

impl Compiler {
    #[must_use]
    pub fn new(catalog: Catalog, settings: CombinedSettings) -> Self {
        Self { catalog, settings }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn settings(&self) -> &CombinedSettings {
        &self.settings
    }

    /// Compile every statement in `sql`.
    ///
    /// Returns one result per statement in source order. A statement that
    /// fails to parse or check does not affect the others.
    pub fn compile(&self, sql: &str) -> Vec<Result<Query>> {
        let span = tracing::debug_span!(
            target: "sqlc.compile",
            "compile",
            statements = tracing::field::Empty,
            failed = tracing::field::Empty,
        );
        let _guard = span.enter();

        let results: Vec<Result<Query>> = Parser::from_sql(sql)
            .statements()
            .into_iter()
            .map(|parsed| {
                parsed
                    .map_err(SqlcError::from)
                    .and_then(|ast| self.compile_ast(ast, sql))
            })
            .collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        span.record("statements", results.len() as u64);
        span.record("failed", failed as u64);
        results
    }

    /// Check, rewrite and expand one parsed statement.
    ///
    /// `source` is the text the tree's spans point into. Directives are
    /// validated on the tree as parsed, before `sqlc.embed` calls are
    /// rewritten.
    pub fn compile_ast(&self, mut ast: Ast, source: &str) -> Result<Query> {
        sqlc_validate::func_call(&self.catalog, &self.settings, &ast)?;
        let embeds = embeds(&mut ast);
        let columns = expand(&self.catalog, &ast, &embeds)?;

        let span = ast
            .root()
            .and_then(|root| ast.get(root).span())
            .unwrap_or(Span::new(0, u32::try_from(source.len()).unwrap_or(u32::MAX)));
        let (sql, offset) = match span.slice(source) {
            Some(text) => (text.to_owned(), span.start),
            None => (source.to_owned(), 0),
        };
        debug!(
            target: "sqlc.compile",
            start = span.start,
            embeds = embeds.len(),
            columns = columns.len(),
            "statement compiled"
        );
        Ok(Query {
            sql,
            offset,
            ast,
            embeds,
            columns,
        })
    }
}
