// Pratt expression parser with PostgreSQL operator precedence.
//
// Precedence table (lowest to highest):
//   OR
//   AND
//   NOT (prefix)
//   IS [NOT] NULL
//   = <> < <= > >=
//   [NOT] LIKE, [NOT] IN
//   || (any other operator)
//   + - (binary)
//   * / %
//   - + (unary prefix)
//   :: (cast)

use sqlc_ast::{BoolOp, ExprOp, FuncCall, FuncName, NodeId, Span, SyntaxNode};

use crate::parser::{ParseError, Parser};
use crate::token::TokenKind;

// Binding powers: higher = tighter binding.
// Left BP is checked against min_bp; right BP is passed to recursive call.
mod bp {
    pub const OR: (u8, u8) = (1, 2);
    pub const AND: (u8, u8) = (3, 4);
    pub const NOT_PREFIX: u8 = 5;
    pub const IS: u8 = 7;
    pub const COMPARISON: (u8, u8) = (9, 10);
    pub const LIKE_IN: (u8, u8) = (11, 12);
    pub const OTHER: (u8, u8) = (13, 14);
    pub const ADD: (u8, u8) = (15, 16);
    pub const MUL: (u8, u8) = (17, 18);
    pub const UNARY: u8 = 19;
    pub const CAST: u8 = 21;
}

/// A parsed expression and the source it covers, parentheses included.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Parsed {
    pub(crate) id: NodeId,
    pub(crate) span: Span,
}

impl Parser {
    /// Parse a single SQL expression into the current tree.
    pub(crate) fn parse_expr(&mut self) -> Result<Parsed, ParseError> {
        self.parse_expr_bp(0)
    }

    pub(crate) fn parse_expr_id(&mut self) -> Result<NodeId, ParseError> {
        Ok(self.parse_expr()?.id)
    }

    // ── Pratt core ──────────────────────────────────────────────────────

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Parsed, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            if let Some(l_bp) = self.postfix_bp() {
                if l_bp < min_bp {
                    break;
                }
                lhs = self.parse_postfix(lhs)?;
                continue;
            }

            if let Some((l_bp, r_bp)) = self.infix_bp() {
                if l_bp < min_bp {
                    break;
                }
                lhs = self.parse_infix(lhs, r_bp)?;
                continue;
            }

            break;
        }

        Ok(lhs)
    }

    fn node(&mut self, node: SyntaxNode, span: Span) -> Parsed {
        Parsed {
            id: self.ast.push(node),
            span,
        }
    }

    fn constant(&mut self, value: SyntaxNode, span: Span) -> Parsed {
        let val = self.ast.push(value);
        self.node(SyntaxNode::AConst { val, span }, span)
    }

    // ── Prefix (nud) ────────────────────────────────────────────────────

    fn parse_prefix(&mut self) -> Result<Parsed, ParseError> {
        let tok = self.advance();
        match tok.kind.clone() {
            // ── Literals ────────────────────────────────────────────────
            TokenKind::Integer(i) => Ok(self.constant(SyntaxNode::Integer(i), tok.span)),
            TokenKind::Float(f) => Ok(self.constant(SyntaxNode::Float(f), tok.span)),
            TokenKind::String(s) => Ok(self.constant(SyntaxNode::String(s), tok.span)),
            TokenKind::KwNull => Ok(self.constant(SyntaxNode::Null, tok.span)),
            TokenKind::KwTrue => Ok(self.constant(SyntaxNode::Boolean(true), tok.span)),
            TokenKind::KwFalse => Ok(self.constant(SyntaxNode::Boolean(false), tok.span)),

            // ── Parameters ──────────────────────────────────────────────
            TokenKind::Param(number) => Ok(self.node(
                SyntaxNode::ParamRef {
                    number,
                    span: tok.span,
                },
                tok.span,
            )),
            TokenKind::Question => {
                self.next_param += 1;
                let number = self.next_param;
                Ok(self.node(
                    SyntaxNode::ParamRef {
                        number,
                        span: tok.span,
                    },
                    tok.span,
                ))
            }

            // ── Unary prefix: - + ───────────────────────────────────────
            TokenKind::Minus => {
                // Negative numeric literals fold into the constant.
                match self.peek().clone() {
                    TokenKind::Integer(i) if !self.cast_follows() => {
                        let lit = self.advance();
                        let span = tok.span.merge(lit.span);
                        return Ok(self.constant(SyntaxNode::Integer(-i), span));
                    }
                    TokenKind::Float(f) if !self.cast_follows() => {
                        let lit = self.advance();
                        let span = tok.span.merge(lit.span);
                        return Ok(self.constant(SyntaxNode::Float(format!("-{f}")), span));
                    }
                    _ => {}
                }
                let inner = self.parse_expr_bp(bp::UNARY)?;
                let span = tok.span.merge(inner.span);
                Ok(self.node(
                    SyntaxNode::AExpr {
                        op: ExprOp::Negate,
                        lexpr: None,
                        rexpr: inner.id,
                        span,
                    },
                    span,
                ))
            }
            TokenKind::Plus => {
                let inner = self.parse_expr_bp(bp::UNARY)?;
                Ok(Parsed {
                    id: inner.id,
                    span: tok.span.merge(inner.span),
                })
            }

            // ── Prefix NOT ──────────────────────────────────────────────
            TokenKind::KwNot => {
                let inner = self.parse_expr_bp(bp::NOT_PREFIX)?;
                let span = tok.span.merge(inner.span);
                let args = self.ast.list(vec![inner.id]);
                Ok(self.node(
                    SyntaxNode::BoolExpr {
                        op: BoolOp::Not,
                        args,
                        span,
                    },
                    span,
                ))
            }

            // ── Parenthesized expression ────────────────────────────────
            TokenKind::LeftParen => {
                if self.check(&TokenKind::KwSelect) {
                    return Err(ParseError::at("subqueries are not supported", self.current()));
                }
                let inner = self.parse_expr()?;
                let end = self.expect(&TokenKind::RightParen)?;
                Ok(Parsed {
                    id: inner.id,
                    span: tok.span.merge(end),
                })
            }

            // ── Identifier: column ref or function call ─────────────────
            TokenKind::Id(name) | TokenKind::QuotedId(name) => self.parse_ident_expr(name, tok.span),

            // ── Keywords usable as function names ───────────────────────
            TokenKind::KwLeft | TokenKind::KwRight if self.check(&TokenKind::LeftParen) => {
                let name = if tok.kind == TokenKind::KwLeft {
                    "left"
                } else {
                    "right"
                };
                self.parse_function_call(vec![name.to_owned()], tok.span)
            }

            TokenKind::Error(message) => Err(ParseError::at(message, Some(&tok))),
            other => Err(ParseError::at(
                format!("unexpected {} in expression", other.describe()),
                Some(&tok),
            )),
        }
    }

    fn cast_follows(&self) -> bool {
        matches!(self.peek_nth(1), TokenKind::DoubleColon)
    }

    /// Parse `name`, `a.b.c`, `t.*`, or `[schema.]name(args)`.
    fn parse_ident_expr(&mut self, first: String, start: Span) -> Result<Parsed, ParseError> {
        let mut parts = vec![first];
        let mut end = start;
        let mut star = false;
        while self.eat(&TokenKind::Dot) {
            let tok = self.advance();
            end = tok.span;
            match tok.kind.clone() {
                TokenKind::Id(s) | TokenKind::QuotedId(s) => parts.push(s),
                TokenKind::Star => {
                    star = true;
                    break;
                }
                other => {
                    return Err(ParseError::at(
                        format!("expected column name after '.', got {}", other.describe()),
                        Some(&tok),
                    ));
                }
            }
        }

        if !star && self.check(&TokenKind::LeftParen) {
            return self.parse_function_call(parts, start);
        }

        let span = start.merge(end);
        let mut fields: Vec<NodeId> = parts
            .into_iter()
            .map(|p| self.ast.push(SyntaxNode::String(p)))
            .collect();
        if star {
            fields.push(self.ast.push(SyntaxNode::AStar));
        }
        let fields = self.ast.list(fields);
        Ok(self.node(SyntaxNode::ColumnRef { fields, span }, span))
    }

    fn parse_function_call(&mut self, parts: Vec<String>, start: Span) -> Result<Parsed, ParseError> {
        let mut names = parts.into_iter();
        let func = match (names.next(), names.next(), names.next()) {
            (Some(name), None, _) => FuncName::bare(name),
            (Some(schema), Some(name), None) => FuncName::qualified(schema, name),
            _ => {
                return Err(ParseError::at(
                    "improper qualified name (too many dotted names)",
                    self.current(),
                ));
            }
        };

        self.expect(&TokenKind::LeftParen)?;
        let mut agg_star = false;
        let mut agg_distinct = false;
        let mut args = Vec::new();
        if self.eat(&TokenKind::Star) {
            agg_star = true;
        } else if !self.check(&TokenKind::RightParen) {
            agg_distinct = self.eat(&TokenKind::KwDistinct);
            args = self.parse_comma_sep(Self::parse_expr_id)?;
        }
        let end = self.expect(&TokenKind::RightParen)?;

        let span = start.merge(end);
        let args = self.ast.list(args);
        Ok(self.node(
            SyntaxNode::FuncCall(FuncCall {
                func,
                args,
                agg_star,
                agg_distinct,
                span,
            }),
            span,
        ))
    }

    // ── Postfix ─────────────────────────────────────────────────────────

    fn postfix_bp(&self) -> Option<u8> {
        match self.peek() {
            TokenKind::KwIs => Some(bp::IS),
            TokenKind::DoubleColon => Some(bp::CAST),
            _ => None,
        }
    }

    fn parse_postfix(&mut self, lhs: Parsed) -> Result<Parsed, ParseError> {
        let tok = self.advance();
        if tok.kind == TokenKind::DoubleColon {
            let type_name = self.parse_type_name()?;
            let span = lhs.span.merge(self.prev_span());
            return Ok(self.node(
                SyntaxNode::TypeCast {
                    arg: lhs.id,
                    type_name,
                    span,
                },
                span,
            ));
        }

        let not = self.eat(&TokenKind::KwNot);
        let end = self.expect(&TokenKind::KwNull)?;
        let span = lhs.span.merge(end);
        Ok(self.node(
            SyntaxNode::NullTest {
                arg: lhs.id,
                not,
                span,
            },
            span,
        ))
    }

    /// `name[.name][(n[, n])][[]]...`, rendered back to text.
    fn parse_type_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.parse_identifier()?;
        while self.eat(&TokenKind::Dot) {
            name.push('.');
            name.push_str(&self.parse_identifier()?);
        }
        if self.eat(&TokenKind::LeftParen) {
            let mut mods = Vec::new();
            loop {
                match self.advance().kind {
                    TokenKind::Integer(i) => mods.push(i.to_string()),
                    other => {
                        return Err(ParseError::at(
                            format!("expected type modifier, got {}", other.describe()),
                            self.tokens.get(self.pos.saturating_sub(1)),
                        ));
                    }
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RightParen)?;
            name = format!("{name}({})", mods.join(","));
        }
        while self.eat(&TokenKind::LeftBracket) {
            self.expect(&TokenKind::RightBracket)?;
            name.push_str("[]");
        }
        Ok(name)
    }

    // ── Infix (led) ─────────────────────────────────────────────────────

    fn infix_bp(&self) -> Option<(u8, u8)> {
        match self.peek() {
            TokenKind::KwOr => Some(bp::OR),
            TokenKind::KwAnd => Some(bp::AND),
            TokenKind::Eq
            | TokenKind::Ne
            | TokenKind::Lt
            | TokenKind::Le
            | TokenKind::Gt
            | TokenKind::Ge => Some(bp::COMPARISON),
            TokenKind::KwLike | TokenKind::KwIn => Some(bp::LIKE_IN),
            TokenKind::KwNot if matches!(self.peek_nth(1), TokenKind::KwLike | TokenKind::KwIn) => {
                Some(bp::LIKE_IN)
            }
            TokenKind::Concat => Some(bp::OTHER),
            TokenKind::Plus | TokenKind::Minus => Some(bp::ADD),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some(bp::MUL),
            _ => None,
        }
    }

    fn parse_infix(&mut self, lhs: Parsed, r_bp: u8) -> Result<Parsed, ParseError> {
        let tok = self.advance();
        let op = match &tok.kind {
            TokenKind::KwOr => return self.make_bool(lhs, BoolOp::Or, r_bp),
            TokenKind::KwAnd => return self.make_bool(lhs, BoolOp::And, r_bp),
            TokenKind::KwIn => return self.parse_in(lhs, ExprOp::In),
            TokenKind::KwNot => {
                if self.eat(&TokenKind::KwIn) {
                    return self.parse_in(lhs, ExprOp::NotIn);
                }
                self.expect(&TokenKind::KwLike)?;
                ExprOp::NotLike
            }
            TokenKind::KwLike => ExprOp::Like,
            TokenKind::Eq => ExprOp::Eq,
            TokenKind::Ne => ExprOp::Ne,
            TokenKind::Lt => ExprOp::Lt,
            TokenKind::Le => ExprOp::Le,
            TokenKind::Gt => ExprOp::Gt,
            TokenKind::Ge => ExprOp::Ge,
            TokenKind::Concat => ExprOp::Concat,
            TokenKind::Plus => ExprOp::Add,
            TokenKind::Minus => ExprOp::Subtract,
            TokenKind::Star => ExprOp::Multiply,
            TokenKind::Slash => ExprOp::Divide,
            TokenKind::Percent => ExprOp::Modulo,
            other => {
                return Err(ParseError::at(
                    format!("unexpected {} after expression", other.describe()),
                    Some(&tok),
                ));
            }
        };
        let rhs = self.parse_expr_bp(r_bp)?;
        let span = lhs.span.merge(rhs.span);
        Ok(self.node(
            SyntaxNode::AExpr {
                op,
                lexpr: Some(lhs.id),
                rexpr: rhs.id,
                span,
            },
            span,
        ))
    }

    /// `AND`/`OR` chains flatten into one `BoolExpr`, as PostgreSQL does.
    fn make_bool(&mut self, lhs: Parsed, op: BoolOp, r_bp: u8) -> Result<Parsed, ParseError> {
        let rhs = self.parse_expr_bp(r_bp)?;
        let span = lhs.span.merge(rhs.span);

        let existing = match self.ast.get_mut(lhs.id) {
            SyntaxNode::BoolExpr {
                op: lop,
                args,
                span: lspan,
            } if *lop == op => {
                *lspan = span;
                Some(*args)
            }
            _ => None,
        };
        if let Some(args) = existing {
            if let SyntaxNode::List(items) = self.ast.get_mut(args) {
                items.push(rhs.id);
            }
            return Ok(Parsed { id: lhs.id, span });
        }

        let args = self.ast.list(vec![lhs.id, rhs.id]);
        Ok(self.node(SyntaxNode::BoolExpr { op, args, span }, span))
    }

    /// `lhs [NOT] IN (expr, ...)`.
    fn parse_in(&mut self, lhs: Parsed, op: ExprOp) -> Result<Parsed, ParseError> {
        self.expect(&TokenKind::LeftParen)?;
        if self.check(&TokenKind::KwSelect) {
            return Err(ParseError::at("subqueries are not supported", self.current()));
        }
        let items = self.parse_comma_sep(Self::parse_expr_id)?;
        let end = self.expect(&TokenKind::RightParen)?;
        let span = lhs.span.merge(end);
        let rexpr = self.ast.list(items);
        Ok(self.node(
            SyntaxNode::AExpr {
                op,
                lexpr: Some(lhs.id),
                rexpr,
                span,
            },
            span,
        ))
    }
}

/// Parse a single expression from raw SQL text into a fresh tree.
///
/// The tree's root is the expression itself.
pub fn parse_expr(sql: &str) -> Result<sqlc_ast::Ast, ParseError> {
    let mut parser = Parser::from_sql(sql);
    let expr = parser.parse_expr()?;
    if !matches!(parser.peek(), TokenKind::Eof | TokenKind::Semicolon) {
        return Err(parser.err_expected("end of expression"));
    }
    let mut ast = std::mem::take(&mut parser.ast);
    ast.set_root(expr.id);
    Ok(ast)
}
