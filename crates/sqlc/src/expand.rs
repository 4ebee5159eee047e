//! Output column expansion.
//!
//! Turns a statement's output list (SELECT targets or RETURNING) into
//! [`OutputColumn`]s. Wildcards that came from `sqlc.embed` become a single
//! embedded column; every other wildcard is expanded in place.

use sqlc_ast::{Ast, NodeId, Span, SyntaxNode, TableName};
use sqlc_catalog::{Catalog, Table};
use sqlc_error::{Result, SqlcError};
use sqlc_rewrite::EmbedSet;

/// Name PostgreSQL gives an output column it cannot name.
pub const UNNAMED_COLUMN: &str = "?column?";

/// A plain output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// Name the source table is visible under, for columns read from a table.
    pub table: Option<String>,
    /// `None` when the type could not be determined.
    pub data_type: Option<String>,
    pub not_null: bool,
}

/// All columns of one table, produced by `sqlc.embed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedColumn {
    /// Name the table is visible under in the query (its alias, if any).
    pub name: String,
    /// The catalog table.
    pub table: TableName,
    pub nullable: bool,
    pub columns: Vec<Column>,
    /// Span of the `sqlc.embed(...)` call in the source.
    pub span: Span,
}

impl EmbedColumn {
    /// The embedded columns as a qualified select list: `u.id, u.name`.
    #[must_use]
    pub fn select_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("{}.{}", self.name, c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One entry of a query's result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputColumn {
    Column(Column),
    Embed(EmbedColumn),
}

impl OutputColumn {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Column(c) => &c.name,
            Self::Embed(e) => &e.name,
        }
    }
}

/// A table in scope, under the name the query sees it by.
struct Source<'c> {
    visible: String,
    name: TableName,
    table: &'c Table,
}

impl Source<'_> {
    fn matches(&self, qualifier: &str) -> bool {
        self.visible.eq_ignore_ascii_case(qualifier)
            || self.name.to_string().eq_ignore_ascii_case(qualifier)
    }

    fn column(&self, column: &sqlc_catalog::Column) -> Column {
        Column {
            name: column.name.clone(),
            table: Some(self.visible.clone()),
            data_type: Some(column.data_type.clone()),
            not_null: column.not_null,
        }
    }

    fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.table.columns.iter().map(|c| self.column(c))
    }
}

/// Tables visible to a statement's output list.
struct Scope<'c> {
    sources: Vec<Source<'c>>,
}

impl<'c> Scope<'c> {
    fn build(catalog: &'c Catalog, ast: &Ast, stmt: NodeId) -> Result<Self> {
        let mut scope = Self {
            sources: Vec::new(),
        };
        let stmt_span = ast
            .root()
            .and_then(|root| ast.get(root).span())
            .unwrap_or(Span::ZERO);
        match ast.get(stmt) {
            SyntaxNode::SelectStmt(s) => scope.add(catalog, ast, s.from_clause, stmt_span)?,
            SyntaxNode::InsertStmt(s) => scope.add(catalog, ast, s.relation, stmt_span)?,
            SyntaxNode::UpdateStmt(s) => scope.add(catalog, ast, s.relation, stmt_span)?,
            SyntaxNode::DeleteStmt(s) => scope.add(catalog, ast, s.relation, stmt_span)?,
            _ => {}
        }
        Ok(scope)
    }

    fn add(&mut self, catalog: &'c Catalog, ast: &Ast, id: NodeId, span: Span) -> Result<()> {
        match ast.get(id) {
            SyntaxNode::List(items) => {
                for item in items {
                    self.add(catalog, ast, *item, span)?;
                }
            }
            SyntaxNode::JoinExpr { larg, rarg, .. } => {
                self.add(catalog, ast, *larg, span)?;
                self.add(catalog, ast, *rarg, span)?;
            }
            SyntaxNode::RangeVar(rv) => {
                let name = TableName {
                    schema: rv.schema.clone(),
                    name: rv.name.clone(),
                };
                let table = catalog
                    .find_table(&name)
                    .ok_or_else(|| SqlcError::relation_not_found(name.to_string(), rv.span))?;
                self.sources.push(Source {
                    visible: rv.visible_name().to_owned(),
                    name,
                    table,
                });
            }
            SyntaxNode::TableName(name) => {
                let table = catalog
                    .find_table(name)
                    .ok_or_else(|| SqlcError::relation_not_found(name.to_string(), span))?;
                self.sources.push(Source {
                    visible: name.name.clone(),
                    name: name.clone(),
                    table,
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn find(&self, qualifier: &str) -> Option<&Source<'c>> {
        self.sources.iter().find(|s| s.matches(qualifier))
    }
}

/// The output list of a statement: SELECT targets or RETURNING.
fn output_list(ast: &Ast, stmt: NodeId) -> &[NodeId] {
    match ast.get(stmt) {
        SyntaxNode::SelectStmt(s) => ast.list_items(s.target_list),
        SyntaxNode::InsertStmt(s) => ast.list_items(s.returning_list),
        SyntaxNode::UpdateStmt(s) => ast.list_items(s.returning_list),
        SyntaxNode::DeleteStmt(s) => ast.list_items(s.returning_list),
        _ => &[],
    }
}

/// String fields of a column reference, and whether it ends in `*`.
fn column_ref_parts(ast: &Ast, fields: NodeId) -> (Vec<&str>, bool) {
    let mut parts = Vec::new();
    let mut star = false;
    for field in ast.list_items(fields) {
        match ast.get(*field) {
            SyntaxNode::String(s) => parts.push(s.as_str()),
            SyntaxNode::AStar => star = true,
            _ => {}
        }
    }
    (parts, star)
}

/// Expand the output list of the statement under `ast`'s root.
pub(crate) fn expand(catalog: &Catalog, ast: &Ast, embeds: &EmbedSet) -> Result<Vec<OutputColumn>> {
    let Some(stmt) = ast.statement() else {
        return Ok(Vec::new());
    };
    let scope = Scope::build(catalog, ast, stmt)?;
    let mut out = Vec::new();

    for target in output_list(ast, stmt) {
        let SyntaxNode::ResTarget { name, val, .. } = ast.get(*target) else {
            continue;
        };
        if let Some(embed) = embeds.find(*val) {
            let source = scope
                .find(&embed.param)
                .ok_or_else(|| SqlcError::relation_not_found(embed.param.clone(), embed.span))?;
            out.push(OutputColumn::Embed(EmbedColumn {
                name: source.visible.clone(),
                table: source.name.clone(),
                nullable: embed.nullable,
                columns: source.columns().collect(),
                span: embed.span,
            }));
            continue;
        }
        match ast.get(*val) {
            SyntaxNode::ColumnRef { fields, span } => {
                let (parts, star) = column_ref_parts(ast, *fields);
                if star {
                    expand_star(&scope, &parts, *span, &mut out)?;
                } else {
                    out.push(OutputColumn::Column(named_column(&scope, &parts, name.as_deref())));
                }
            }
            other => out.push(OutputColumn::Column(Column {
                name: name.clone().unwrap_or_else(|| expression_name(ast, other)),
                table: None,
                data_type: expression_type(catalog, ast, *val),
                not_null: false,
            })),
        }
    }
    Ok(out)
}

fn expand_star(scope: &Scope<'_>, qualifier: &[&str], span: Span, out: &mut Vec<OutputColumn>) -> Result<()> {
    if qualifier.is_empty() {
        for source in &scope.sources {
            out.extend(source.columns().map(OutputColumn::Column));
        }
        return Ok(());
    }
    let qualifier = qualifier.join(".");
    let source = scope
        .find(&qualifier)
        .ok_or_else(|| SqlcError::relation_not_found(qualifier.clone(), span))?;
    out.extend(source.columns().map(OutputColumn::Column));
    Ok(())
}

fn named_column(scope: &Scope<'_>, parts: &[&str], alias: Option<&str>) -> Column {
    let Some((column, qualifier)) = parts.split_last() else {
        return Column {
            name: alias.unwrap_or(UNNAMED_COLUMN).to_owned(),
            table: None,
            data_type: None,
            not_null: false,
        };
    };
    let found = if qualifier.is_empty() {
        scope
            .sources
            .iter()
            .find_map(|s| s.table.column(column).map(|c| s.column(c)))
    } else {
        scope
            .find(&qualifier.join("."))
            .and_then(|s| s.table.column(column).map(|c| s.column(c)))
    };
    let mut col = found.unwrap_or_else(|| Column {
        name: (*column).to_owned(),
        table: None,
        data_type: None,
        not_null: false,
    });
    if let Some(alias) = alias {
        alias.clone_into(&mut col.name);
    }
    col
}

/// PostgreSQL's default name for an unaliased expression.
fn expression_name(ast: &Ast, node: &SyntaxNode) -> String {
    match node {
        SyntaxNode::FuncCall(call) => call.func.name.clone(),
        SyntaxNode::TypeCast { arg, .. } => match ast.get(*arg) {
            SyntaxNode::ColumnRef { fields, .. } => column_ref_parts(ast, *fields)
                .0
                .last()
                .map_or_else(|| UNNAMED_COLUMN.to_owned(), |s| (*s).to_owned()),
            inner => expression_name(ast, inner),
        },
        _ => UNNAMED_COLUMN.to_owned(),
    }
}

fn expression_type(catalog: &Catalog, ast: &Ast, id: NodeId) -> Option<String> {
    match ast.get(id) {
        SyntaxNode::TypeCast { type_name, .. } => Some(type_name.clone()),
        SyntaxNode::FuncCall(call) if !call.func.is_directive() => catalog
            .resolve_func_call(ast, id)
            .ok()
            .map(|f| f.return_type.clone()),
        _ => None,
    }
}
