//! Syntax tree node types for sqlc query analysis.
//!
//! A parsed statement is stored in an [`Ast`]: an arena of [`SyntaxNode`]s
//! addressed by [`NodeId`]. Parent nodes refer to their children by id, so a
//! rewrite pass can swap the node in a parent's slot without touching the
//! rest of the tree, and any later pass can recognize a node by its id alone.
//!
//! Ids are handed out in push order and never reused. Two nodes built from the
//! same text (two `users.*` references, say) are structurally equal but have
//! different ids.

mod directive;
mod display;
pub mod walk;

use std::fmt;
use std::ops::Index;

pub use directive::{DIRECTIVE_SCHEMA, DirectiveKind};
pub use display::NodeDisplay;
pub use walk::{Cursor, Flow, Visit, Visitor, apply, inspect, walk};

// ---------------------------------------------------------------------------
// Span: source location tracking
// ---------------------------------------------------------------------------

/// A byte-offset range into the original SQL source text.
///
/// Every node that represents user-written syntax carries a `Span` so that
/// diagnostics can point back to the exact source location. Nodes built by a
/// rewrite pass carry [`Span::ZERO`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset of the first character (inclusive).
    pub start: u32,
    /// Byte offset one past the last character (exclusive).
    pub end: u32,
}

impl Span {
    /// Create a new span from start (inclusive) to end (exclusive) byte offsets.
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// A zero-length span at position 0, used for synthetic nodes.
    pub const ZERO: Self = Self { start: 0, end: 0 };

    /// Merge two spans into one that covers both.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        let start = if self.start < other.start {
            self.start
        } else {
            other.start
        };
        let end = if self.end > other.end {
            self.end
        } else {
            other.end
        };
        Self { start, end }
    }

    /// Length in bytes.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.end - self.start
    }

    /// Whether the span is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// The source text covered by this span, if it lies within `source`.
    #[must_use]
    pub fn slice(self, source: &str) -> Option<&str> {
        source.get(self.start as usize..self.end as usize)
    }

    /// 1-based line and column of the span start within `source`.
    ///
    /// Columns count characters, not bytes. Offsets past the end of the
    /// source clamp to the last position.
    #[must_use]
    pub fn line_col(self, source: &str) -> (u32, u32) {
        let mut line = 1;
        let mut col = 1;
        for (offset, ch) in source.char_indices() {
            if offset >= self.start as usize {
                break;
            }
            if ch == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        (line, col)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Node identity
// ---------------------------------------------------------------------------

/// Index of a node inside its [`Ast`].
///
/// Only meaningful together with the tree that issued it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in the arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

/// A possibly schema-qualified table name like `public.users` or `users`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    /// Optional schema name.
    pub schema: Option<String>,
    /// The table name.
    pub name: String,
}

impl TableName {
    /// Create an unqualified name.
    #[must_use]
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    /// Create a schema-qualified name.
    #[must_use]
    pub fn qualified(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref s) = self.schema {
            write!(f, "{s}.{}", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// The callee of a function call: `lower`, `pg_catalog.lower`, `sqlc.arg`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncName {
    /// Schema qualifier as written, if any.
    pub schema: Option<String>,
    /// Function name.
    pub name: String,
}

impl FuncName {
    /// Create an unqualified function name.
    #[must_use]
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    /// Create a schema-qualified function name.
    #[must_use]
    pub fn qualified(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// Whether the call lives under the reserved `sqlc` schema.
    #[must_use]
    pub fn is_directive(&self) -> bool {
        self.schema.as_deref() == Some(DIRECTIVE_SCHEMA)
    }

    /// The directive this name denotes, if it is one of the known ones.
    #[must_use]
    pub fn directive(&self) -> Option<DirectiveKind> {
        if self.is_directive() {
            DirectiveKind::from_name(&self.name)
        } else {
            None
        }
    }
}

impl fmt::Display for FuncName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref s) = self.schema {
            write!(f, "{s}.{}", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

/// Binary and unary expression operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    NotLike,
    /// Membership test; the right operand is a `List`.
    In,
    NotIn,
    /// Unary minus. Only valid with an absent left operand.
    Negate,
}

impl ExprOp {
    /// The operator as written in SQL.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract | Self::Negate => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Concat => "||",
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
        }
    }
}

/// Boolean connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
    Not,
}

/// Join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

/// Sort direction for ORDER BY terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Default,
    Asc,
    Desc,
}

// ---------------------------------------------------------------------------
// Statement payloads
// ---------------------------------------------------------------------------

/// `SELECT` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    pub distinct: bool,
    /// `List` of `ResTarget`.
    pub target_list: NodeId,
    /// `List` of `RangeVar` / `JoinExpr`.
    pub from_clause: NodeId,
    pub where_clause: Option<NodeId>,
    /// `List` of expressions.
    pub group_clause: NodeId,
    /// `List` of `SortBy`.
    pub sort_clause: NodeId,
    pub limit_count: Option<NodeId>,
}

/// `INSERT INTO ... VALUES` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    /// A `TableName` node.
    pub relation: NodeId,
    /// `List` of `String` column names.
    pub cols: NodeId,
    /// `List` of `List` of expressions, one per row.
    pub values_lists: NodeId,
    /// `List` of `ResTarget`.
    pub returning_list: NodeId,
}

/// `UPDATE` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStmt {
    /// A `RangeVar` node.
    pub relation: NodeId,
    /// `List` of `ResTarget` whose name is the assigned column.
    pub target_list: NodeId,
    pub where_clause: Option<NodeId>,
    /// `List` of `ResTarget`.
    pub returning_list: NodeId,
}

/// `DELETE` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    /// A `RangeVar` node.
    pub relation: NodeId,
    pub where_clause: Option<NodeId>,
    /// `List` of `ResTarget`.
    pub returning_list: NodeId,
}

/// A table reference in a FROM clause, optionally aliased.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeVar {
    pub schema: Option<String>,
    pub name: String,
    pub alias: Option<String>,
    pub span: Span,
}

impl RangeVar {
    /// The name this table is visible under in the query: its alias, or its name.
    #[must_use]
    pub fn visible_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A function call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncCall {
    pub func: FuncName,
    /// `List` of argument expressions.
    pub args: NodeId,
    /// `count(*)`-style call. `args` is empty when set.
    pub agg_star: bool,
    pub agg_distinct: bool,
    pub span: Span,
}

// ---------------------------------------------------------------------------
// SyntaxNode
// ---------------------------------------------------------------------------

/// One node of a parsed statement.
///
/// Child nodes are referenced by [`NodeId`]. Lists of children are themselves
/// nodes (`List`) so that every child position is a single id slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxNode {
    /// Root of one parsed statement.
    RawStmt { stmt: NodeId, span: Span },
    SelectStmt(SelectStmt),
    InsertStmt(InsertStmt),
    UpdateStmt(UpdateStmt),
    DeleteStmt(DeleteStmt),
    /// An output column (`expr [AS name]`) or an `UPDATE` assignment.
    ResTarget {
        name: Option<String>,
        val: NodeId,
        span: Span,
    },
    RangeVar(RangeVar),
    JoinExpr {
        kind: JoinKind,
        larg: NodeId,
        rarg: NodeId,
        quals: Option<NodeId>,
    },
    SortBy { node: NodeId, dir: SortDirection },
    /// Binary or unary operator expression. `lexpr` is absent for prefix operators.
    AExpr {
        op: ExprOp,
        lexpr: Option<NodeId>,
        rexpr: NodeId,
        span: Span,
    },
    /// `AND` / `OR` / `NOT` over a `List` of arguments.
    BoolExpr { op: BoolOp, args: NodeId, span: Span },
    /// `arg IS [NOT] NULL`.
    NullTest { arg: NodeId, not: bool, span: Span },
    /// `arg::type_name`.
    TypeCast {
        arg: NodeId,
        type_name: String,
        span: Span,
    },
    FuncCall(FuncCall),
    /// Column reference: a `List` of `String` fields, the last of which may be `AStar`.
    ColumnRef { fields: NodeId, span: Span },
    /// Positional parameter `$n` (`?` is numbered in order of appearance).
    ParamRef { number: u32, span: Span },
    /// A constant; `val` is a `String`, `Integer`, `Float`, `Boolean` or `Null` node.
    AConst { val: NodeId, span: Span },
    String(String),
    Integer(i64),
    /// Float literal kept in its source form.
    Float(String),
    Boolean(bool),
    Null,
    /// The `*` wildcard.
    AStar,
    List(Vec<NodeId>),
    TableName(TableName),
}

impl SyntaxNode {
    /// Variant name, used in diagnostics (`got ColumnRef`).
    #[must_use]
    pub const fn shape_name(&self) -> &'static str {
        match self {
            Self::RawStmt { .. } => "RawStmt",
            Self::SelectStmt(_) => "SelectStmt",
            Self::InsertStmt(_) => "InsertStmt",
            Self::UpdateStmt(_) => "UpdateStmt",
            Self::DeleteStmt(_) => "DeleteStmt",
            Self::ResTarget { .. } => "ResTarget",
            Self::RangeVar(_) => "RangeVar",
            Self::JoinExpr { .. } => "JoinExpr",
            Self::SortBy { .. } => "SortBy",
            Self::AExpr { .. } => "A_Expr",
            Self::BoolExpr { .. } => "BoolExpr",
            Self::NullTest { .. } => "NullTest",
            Self::TypeCast { .. } => "TypeCast",
            Self::FuncCall(_) => "FuncCall",
            Self::ColumnRef { .. } => "ColumnRef",
            Self::ParamRef { .. } => "ParamRef",
            Self::AConst { .. } => "A_Const",
            Self::String(_) => "String",
            Self::Integer(_) => "Integer",
            Self::Float(_) => "Float",
            Self::Boolean(_) => "Boolean",
            Self::Null => "Null",
            Self::AStar => "A_Star",
            Self::List(_) => "List",
            Self::TableName(_) => "TableName",
        }
    }

    /// Source span of the node, if it carries one.
    #[must_use]
    pub const fn span(&self) -> Option<Span> {
        match self {
            Self::RawStmt { span, .. }
            | Self::ResTarget { span, .. }
            | Self::AExpr { span, .. }
            | Self::BoolExpr { span, .. }
            | Self::NullTest { span, .. }
            | Self::TypeCast { span, .. }
            | Self::ColumnRef { span, .. }
            | Self::ParamRef { span, .. }
            | Self::AConst { span, .. }
            | Self::RangeVar(RangeVar { span, .. })
            | Self::FuncCall(FuncCall { span, .. }) => Some(*span),
            _ => None,
        }
    }

    fn span_mut(&mut self) -> Option<&mut Span> {
        match self {
            Self::RawStmt { span, .. }
            | Self::ResTarget { span, .. }
            | Self::AExpr { span, .. }
            | Self::BoolExpr { span, .. }
            | Self::NullTest { span, .. }
            | Self::TypeCast { span, .. }
            | Self::ColumnRef { span, .. }
            | Self::ParamRef { span, .. }
            | Self::AConst { span, .. }
            | Self::RangeVar(RangeVar { span, .. })
            | Self::FuncCall(FuncCall { span, .. }) => Some(span),
            _ => None,
        }
    }

    /// Child ids in their natural left-to-right order. Absent children are skipped.
    #[must_use]
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Self::RawStmt { stmt, .. } => vec![*stmt],
            Self::SelectStmt(s) => {
                let mut out = vec![s.target_list, s.from_clause];
                out.extend(s.where_clause);
                out.push(s.group_clause);
                out.push(s.sort_clause);
                out.extend(s.limit_count);
                out
            }
            Self::InsertStmt(s) => vec![s.relation, s.cols, s.values_lists, s.returning_list],
            Self::UpdateStmt(s) => {
                let mut out = vec![s.relation, s.target_list];
                out.extend(s.where_clause);
                out.push(s.returning_list);
                out
            }
            Self::DeleteStmt(s) => {
                let mut out = vec![s.relation];
                out.extend(s.where_clause);
                out.push(s.returning_list);
                out
            }
            Self::ResTarget { val, .. } => vec![*val],
            Self::JoinExpr {
                larg, rarg, quals, ..
            } => {
                let mut out = vec![*larg, *rarg];
                out.extend(*quals);
                out
            }
            Self::SortBy { node, .. } => vec![*node],
            Self::AExpr { lexpr, rexpr, .. } => {
                let mut out: Vec<NodeId> = lexpr.iter().copied().collect();
                out.push(*rexpr);
                out
            }
            Self::BoolExpr { args, .. } => vec![*args],
            Self::NullTest { arg, .. } | Self::TypeCast { arg, .. } => vec![*arg],
            Self::FuncCall(call) => vec![call.args],
            Self::ColumnRef { fields, .. } => vec![*fields],
            Self::AConst { val, .. } => vec![*val],
            Self::List(items) => items.clone(),
            Self::RangeVar(_)
            | Self::ParamRef { .. }
            | Self::String(_)
            | Self::Integer(_)
            | Self::Float(_)
            | Self::Boolean(_)
            | Self::Null
            | Self::AStar
            | Self::TableName(_) => Vec::new(),
        }
    }

    /// Mutable child slots, in the same order as [`SyntaxNode::children`].
    pub fn children_mut(&mut self) -> Vec<&mut NodeId> {
        match self {
            Self::RawStmt { stmt, .. } => vec![stmt],
            Self::SelectStmt(s) => {
                let mut out = vec![&mut s.target_list, &mut s.from_clause];
                out.extend(s.where_clause.as_mut());
                out.push(&mut s.group_clause);
                out.push(&mut s.sort_clause);
                out.extend(s.limit_count.as_mut());
                out
            }
            Self::InsertStmt(s) => vec![
                &mut s.relation,
                &mut s.cols,
                &mut s.values_lists,
                &mut s.returning_list,
            ],
            Self::UpdateStmt(s) => {
                let mut out = vec![&mut s.relation, &mut s.target_list];
                out.extend(s.where_clause.as_mut());
                out.push(&mut s.returning_list);
                out
            }
            Self::DeleteStmt(s) => {
                let mut out = vec![&mut s.relation];
                out.extend(s.where_clause.as_mut());
                out.push(&mut s.returning_list);
                out
            }
            Self::ResTarget { val, .. } => vec![val],
            Self::JoinExpr {
                larg, rarg, quals, ..
            } => {
                let mut out = vec![larg, rarg];
                out.extend(quals.as_mut());
                out
            }
            Self::SortBy { node, .. } => vec![node],
            Self::AExpr { lexpr, rexpr, .. } => {
                let mut out: Vec<&mut NodeId> = lexpr.iter_mut().collect();
                out.push(rexpr);
                out
            }
            Self::BoolExpr { args, .. } => vec![args],
            Self::NullTest { arg, .. } | Self::TypeCast { arg, .. } => vec![arg],
            Self::FuncCall(call) => vec![&mut call.args],
            Self::ColumnRef { fields, .. } => vec![fields],
            Self::AConst { val, .. } => vec![val],
            Self::List(items) => items.iter_mut().collect(),
            Self::RangeVar(_)
            | Self::ParamRef { .. }
            | Self::String(_)
            | Self::Integer(_)
            | Self::Float(_)
            | Self::Boolean(_)
            | Self::Null
            | Self::AStar
            | Self::TableName(_) => Vec::new(),
        }
    }

    /// The node with every child slot and span blanked, for shape comparison.
    fn skeleton(&self) -> Self {
        let mut copy = self.clone();
        for slot in copy.children_mut() {
            *slot = NodeId(0);
        }
        if let Some(span) = copy.span_mut() {
            *span = Span::ZERO;
        }
        copy
    }
}

// ---------------------------------------------------------------------------
// Ast: the node arena
// ---------------------------------------------------------------------------

/// Arena holding every node of one statement.
///
/// The tree is owned by whoever parsed it; passes borrow it for the duration
/// of a call. Nodes that get replaced stay in the arena but are no longer
/// reachable from the root.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<SyntaxNode>,
    root: Option<NodeId>,
}

impl Ast {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its id. The node is unreachable until linked
    /// from a parent or made the root.
    pub fn push(&mut self, node: SyntaxNode) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(node);
        id
    }

    /// Set the root node.
    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// The root node, if one has been set.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Look up a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by another tree and is out of range.
    #[must_use]
    pub fn get(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.index()]
    }

    /// Look up a node mutably.
    pub fn get_mut(&mut self, id: NodeId) -> &mut SyntaxNode {
        &mut self.nodes[id.index()]
    }

    /// Number of nodes in the arena, reachable or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Items of a `List` node. Any other node yields an empty slice.
    #[must_use]
    pub fn list_items(&self, id: NodeId) -> &[NodeId] {
        match self.get(id) {
            SyntaxNode::List(items) => items,
            _ => &[],
        }
    }

    /// The statement under a `RawStmt` root.
    #[must_use]
    pub fn statement(&self) -> Option<NodeId> {
        match self.get(self.root?) {
            SyntaxNode::RawStmt { stmt, .. } => Some(*stmt),
            _ => None,
        }
    }

    /// Render a subtree back to SQL text.
    #[must_use]
    pub fn display(&self, id: NodeId) -> NodeDisplay<'_> {
        NodeDisplay::new(self, id)
    }

    /// Deep comparison of two subtrees, ignoring node ids and spans.
    #[must_use]
    pub fn structural_eq(&self, a: NodeId, other: &Self, b: NodeId) -> bool {
        let (left, right) = (self.get(a), other.get(b));
        if left.skeleton() != right.skeleton() {
            return false;
        }
        let (lc, rc) = (left.children(), right.children());
        lc.len() == rc.len()
            && lc
                .iter()
                .zip(&rc)
                .all(|(x, y)| self.structural_eq(*x, other, *y))
    }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    /// Push a `List` node.
    pub fn list(&mut self, items: Vec<NodeId>) -> NodeId {
        self.push(SyntaxNode::List(items))
    }

    /// Push an empty `List` node.
    pub fn empty_list(&mut self) -> NodeId {
        self.list(Vec::new())
    }

    /// Push a string constant: `AConst { String }`.
    pub fn string_const(&mut self, value: impl Into<String>, span: Span) -> NodeId {
        let val = self.push(SyntaxNode::String(value.into()));
        self.push(SyntaxNode::AConst { val, span })
    }

    /// Push an integer constant.
    pub fn integer_const(&mut self, value: i64, span: Span) -> NodeId {
        let val = self.push(SyntaxNode::Integer(value));
        self.push(SyntaxNode::AConst { val, span })
    }

    /// Push a column reference from dotted name parts, e.g. `["u", "id"]`.
    pub fn column_ref<S: Into<String>>(
        &mut self,
        parts: impl IntoIterator<Item = S>,
        span: Span,
    ) -> NodeId {
        let items = parts
            .into_iter()
            .map(|p| self.push(SyntaxNode::String(p.into())))
            .collect();
        let fields = self.list(items);
        self.push(SyntaxNode::ColumnRef { fields, span })
    }

    /// Push a `table.*` column reference.
    pub fn star_ref(&mut self, table: impl Into<String>, span: Span) -> NodeId {
        let name = self.push(SyntaxNode::String(table.into()));
        let star = self.push(SyntaxNode::AStar);
        let fields = self.list(vec![name, star]);
        self.push(SyntaxNode::ColumnRef { fields, span })
    }

    /// Push a function call with the given arguments.
    pub fn func_call(&mut self, func: FuncName, args: Vec<NodeId>, span: Span) -> NodeId {
        let args = self.list(args);
        self.push(SyntaxNode::FuncCall(FuncCall {
            func,
            args,
            agg_star: false,
            agg_distinct: false,
            span,
        }))
    }
}

impl Index<NodeId> for Ast {
    type Output = SyntaxNode;

    fn index(&self, id: NodeId) -> &SyntaxNode {
        self.get(id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
