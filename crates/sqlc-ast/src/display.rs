//! SQL pretty-printing for syntax trees.
//!
//! [`NodeDisplay`] renders any subtree back to SQL text. The output is
//! normalized (single spaces, upper-case keywords) rather than a copy of the
//! source, which makes it handy for comparing trees in tests and for logging
//! what a rewrite produced.

use std::fmt;

use crate::{Ast, BoolOp, ExprOp, JoinKind, NodeId, SortDirection, SyntaxNode};

/// `Display` adapter for one subtree of an [`Ast`].
#[derive(Clone, Copy)]
pub struct NodeDisplay<'a> {
    ast: &'a Ast,
    id: NodeId,
}

impl<'a> NodeDisplay<'a> {
    pub(crate) const fn new(ast: &'a Ast, id: NodeId) -> Self {
        Self { ast, id }
    }

    fn child(self, id: NodeId) -> Self {
        Self::new(self.ast, id)
    }

    fn comma_list(self, f: &mut fmt::Formatter<'_>, list: NodeId) -> fmt::Result {
        for (i, item) in self.ast.list_items(list).iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", self.child(*item))?;
        }
        Ok(())
    }

    /// Operands that are themselves operator expressions get parentheses.
    fn operand(self, f: &mut fmt::Formatter<'_>, id: NodeId) -> fmt::Result {
        match self.ast.get(id) {
            SyntaxNode::AExpr { .. } | SyntaxNode::BoolExpr { .. } => {
                write!(f, "({})", self.child(id))
            }
            _ => write!(f, "{}", self.child(id)),
        }
    }

    fn returning(self, f: &mut fmt::Formatter<'_>, list: NodeId) -> fmt::Result {
        if !self.ast.list_items(list).is_empty() {
            f.write_str(" RETURNING ")?;
            self.comma_list(f, list)?;
        }
        Ok(())
    }

    fn where_clause(self, f: &mut fmt::Formatter<'_>, clause: Option<NodeId>) -> fmt::Result {
        if let Some(w) = clause {
            write!(f, " WHERE {}", self.child(w))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helper: quote an identifier if needed
// ---------------------------------------------------------------------------

/// Returns true if the name would not survive an unquoted round trip.
fn needs_quoting(name: &str) -> bool {
    let Some(&first) = name.as_bytes().first() else {
        return true;
    };
    if !(first.is_ascii_lowercase() || first == b'_') {
        return true;
    }
    name.bytes()
        .any(|b| !(b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_'))
}

fn write_ident(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if needs_quoting(name) {
        write!(f, "\"{}\"", name.replace('"', "\"\""))
    } else {
        f.write_str(name)
    }
}

fn write_qualified(f: &mut fmt::Formatter<'_>, schema: Option<&str>, name: &str) -> fmt::Result {
    if let Some(schema) = schema {
        write_ident(f, schema)?;
        f.write_str(".")?;
    }
    write_ident(f, name)
}

impl fmt::Display for NodeDisplay<'_> {
    #[allow(clippy::too_many_lines)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let this = *self;
        match self.ast.get(self.id) {
            SyntaxNode::RawStmt { stmt, .. } => write!(f, "{}", this.child(*stmt)),
            SyntaxNode::SelectStmt(s) => {
                f.write_str("SELECT ")?;
                if s.distinct {
                    f.write_str("DISTINCT ")?;
                }
                this.comma_list(f, s.target_list)?;
                if !self.ast.list_items(s.from_clause).is_empty() {
                    f.write_str(" FROM ")?;
                    this.comma_list(f, s.from_clause)?;
                }
                this.where_clause(f, s.where_clause)?;
                if !self.ast.list_items(s.group_clause).is_empty() {
                    f.write_str(" GROUP BY ")?;
                    this.comma_list(f, s.group_clause)?;
                }
                if !self.ast.list_items(s.sort_clause).is_empty() {
                    f.write_str(" ORDER BY ")?;
                    this.comma_list(f, s.sort_clause)?;
                }
                if let Some(limit) = s.limit_count {
                    write!(f, " LIMIT {}", this.child(limit))?;
                }
                Ok(())
            }
            SyntaxNode::InsertStmt(s) => {
                write!(f, "INSERT INTO {}", this.child(s.relation))?;
                if !self.ast.list_items(s.cols).is_empty() {
                    f.write_str(" (")?;
                    this.comma_list(f, s.cols)?;
                    f.write_str(")")?;
                }
                f.write_str(" VALUES ")?;
                for (i, row) in self.ast.list_items(s.values_lists).iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str("(")?;
                    this.comma_list(f, *row)?;
                    f.write_str(")")?;
                }
                this.returning(f, s.returning_list)
            }
            SyntaxNode::UpdateStmt(s) => {
                write!(f, "UPDATE {} SET ", this.child(s.relation))?;
                for (i, target) in self.ast.list_items(s.target_list).iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if let SyntaxNode::ResTarget {
                        name: Some(name),
                        val,
                        ..
                    } = self.ast.get(*target)
                    {
                        write_ident(f, name)?;
                        write!(f, " = {}", this.child(*val))?;
                    } else {
                        write!(f, "{}", this.child(*target))?;
                    }
                }
                this.where_clause(f, s.where_clause)?;
                this.returning(f, s.returning_list)
            }
            SyntaxNode::DeleteStmt(s) => {
                write!(f, "DELETE FROM {}", this.child(s.relation))?;
                this.where_clause(f, s.where_clause)?;
                this.returning(f, s.returning_list)
            }
            SyntaxNode::ResTarget { name, val, .. } => {
                write!(f, "{}", this.child(*val))?;
                if let Some(name) = name {
                    f.write_str(" AS ")?;
                    write_ident(f, name)?;
                }
                Ok(())
            }
            SyntaxNode::RangeVar(rv) => {
                write_qualified(f, rv.schema.as_deref(), &rv.name)?;
                if let Some(alias) = &rv.alias {
                    f.write_str(" AS ")?;
                    write_ident(f, alias)?;
                }
                Ok(())
            }
            SyntaxNode::JoinExpr {
                kind,
                larg,
                rarg,
                quals,
            } => {
                let kw = match kind {
                    JoinKind::Inner => "JOIN",
                    JoinKind::Left => "LEFT JOIN",
                    JoinKind::Right => "RIGHT JOIN",
                    JoinKind::Full => "FULL JOIN",
                    JoinKind::Cross => "CROSS JOIN",
                };
                write!(f, "{} {kw} {}", this.child(*larg), this.child(*rarg))?;
                if let Some(q) = quals {
                    write!(f, " ON {}", this.child(*q))?;
                }
                Ok(())
            }
            SyntaxNode::SortBy { node, dir } => {
                write!(f, "{}", this.child(*node))?;
                match dir {
                    SortDirection::Default => Ok(()),
                    SortDirection::Asc => f.write_str(" ASC"),
                    SortDirection::Desc => f.write_str(" DESC"),
                }
            }
            SyntaxNode::AExpr {
                op, lexpr, rexpr, ..
            } => match (op, lexpr) {
                (ExprOp::In | ExprOp::NotIn, Some(l)) => {
                    this.operand(f, *l)?;
                    write!(f, " {} ({})", op.as_str(), this.child(*rexpr))
                }
                (ExprOp::Negate, _) | (_, None) => {
                    f.write_str(op.as_str())?;
                    this.operand(f, *rexpr)
                }
                (_, Some(l)) => {
                    this.operand(f, *l)?;
                    write!(f, " {} ", op.as_str())?;
                    this.operand(f, *rexpr)
                }
            },
            SyntaxNode::BoolExpr { op, args, .. } => {
                let items = self.ast.list_items(*args);
                if *op == BoolOp::Not {
                    f.write_str("NOT ")?;
                    if let Some(arg) = items.first() {
                        this.operand(f, *arg)?;
                    }
                    return Ok(());
                }
                let sep = if *op == BoolOp::And { " AND " } else { " OR " };
                for (i, arg) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    match self.ast.get(*arg) {
                        SyntaxNode::BoolExpr { op: inner, .. } if inner != op => {
                            write!(f, "({})", this.child(*arg))?;
                        }
                        _ => write!(f, "{}", this.child(*arg))?,
                    }
                }
                Ok(())
            }
            SyntaxNode::NullTest { arg, not, .. } => {
                this.operand(f, *arg)?;
                f.write_str(if *not { " IS NOT NULL" } else { " IS NULL" })
            }
            SyntaxNode::TypeCast { arg, type_name, .. } => {
                this.operand(f, *arg)?;
                write!(f, "::{type_name}")
            }
            SyntaxNode::FuncCall(call) => {
                write_qualified(f, call.func.schema.as_deref(), &call.func.name)?;
                f.write_str("(")?;
                if call.agg_star {
                    f.write_str("*")?;
                } else {
                    if call.agg_distinct {
                        f.write_str("DISTINCT ")?;
                    }
                    this.comma_list(f, call.args)?;
                }
                f.write_str(")")
            }
            SyntaxNode::ColumnRef { fields, .. } => {
                for (i, field) in self.ast.list_items(*fields).iter().enumerate() {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    write!(f, "{}", this.child(*field))?;
                }
                Ok(())
            }
            SyntaxNode::ParamRef { number, .. } => write!(f, "${number}"),
            SyntaxNode::AConst { val, .. } => match self.ast.get(*val) {
                SyntaxNode::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
                _ => write!(f, "{}", this.child(*val)),
            },
            SyntaxNode::String(s) => write_ident(f, s),
            SyntaxNode::Integer(i) => write!(f, "{i}"),
            SyntaxNode::Float(s) => f.write_str(s),
            SyntaxNode::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            SyntaxNode::Null => f.write_str("NULL"),
            SyntaxNode::AStar => f.write_str("*"),
            SyntaxNode::List(_) => this.comma_list(f, self.id),
            SyntaxNode::TableName(name) => write_qualified(f, name.schema.as_deref(), &name.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Ast, FuncName, Span, SyntaxNode};

    #[test]
    fn test_display_star_ref() {
        let mut ast = Ast::new();
        let id = ast.star_ref("users", Span::ZERO);
        assert_eq!(ast.display(id).to_string(), "users.*");
    }

    #[test]
    fn test_display_func_call_and_constants() {
        let mut ast = Ast::new();
        let table = ast.column_ref(["users"], Span::ZERO);
        let opt = ast.string_const("nullable", Span::ZERO);
        let call = ast.func_call(FuncName::qualified("sqlc", "embed"), vec![table, opt], Span::ZERO);
        assert_eq!(
            ast.display(call).to_string(),
            "sqlc.embed(users, 'nullable')"
        );
    }

    #[test]
    fn test_display_quotes_identifiers() {
        let mut ast = Ast::new();
        let id = ast.column_ref(["Users", "first name"], Span::ZERO);
        assert_eq!(ast.display(id).to_string(), "\"Users\".\"first name\"");
        let lit = ast.string_const("it's", Span::ZERO);
        assert_eq!(ast.display(lit).to_string(), "'it''s'");
    }

    #[test]
    fn test_display_nested_operators_parenthesized() {
        let mut ast = Ast::new();
        let a = ast.integer_const(1, Span::ZERO);
        let b = ast.integer_const(2, Span::ZERO);
        let c = ast.integer_const(3, Span::ZERO);
        let sum = ast.push(SyntaxNode::AExpr {
            op: crate::ExprOp::Add,
            lexpr: Some(a),
            rexpr: b,
            span: Span::ZERO,
        });
        let product = ast.push(SyntaxNode::AExpr {
            op: crate::ExprOp::Multiply,
            lexpr: Some(sum),
            rexpr: c,
            span: Span::ZERO,
        });
        assert_eq!(ast.display(product).to_string(), "(1 + 2) * 3");
    }
}
