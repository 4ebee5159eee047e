//! Depth-first traversal over an [`Ast`].
//!
//! Two modes:
//!
//! - [`walk`] is read-only. A [`Visitor`] is called on each node in pre-order
//!   and decides whether to descend. Returning an error stops the walk and the
//!   error propagates out of every enclosing call.
//! - [`apply`] hands a [`Cursor`] to a pre and a post callback. The cursor can
//!   replace the current node; the parent's slot is updated on the spot, so
//!   later siblings and the parent already see the replacement. Nodes built as
//!   replacements are only descended into when the pre callback says so, which
//!   keeps a single-shot rewrite from looping on its own output.
//!
//! Both modes visit children in the order given by [`SyntaxNode::children`].
//! Absent optional children and empty lists contribute nothing.

use std::convert::Infallible;

use crate::{Ast, NodeId, SyntaxNode};

// ---------------------------------------------------------------------------
// Read-only walk
// ---------------------------------------------------------------------------

/// What a [`Visitor`] wants after seeing a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Visit the node's children.
    Children,
    /// Do not descend into this node.
    SkipChildren,
}

/// Callbacks for [`walk`].
pub trait Visitor {
    /// Error that aborts the walk.
    type Error;

    /// Called before the node's children.
    fn visit(&mut self, ast: &Ast, id: NodeId) -> Result<Visit, Self::Error>;

    /// Called after the node's children, only if `visit` returned [`Visit::Children`].
    fn leave(&mut self, _ast: &Ast, _id: NodeId) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Walk the subtree rooted at `id` in pre-order.
pub fn walk<V>(visitor: &mut V, ast: &Ast, id: NodeId) -> Result<(), V::Error>
where
    V: Visitor + ?Sized,
{
    if visitor.visit(ast, id)? == Visit::SkipChildren {
        return Ok(());
    }
    for child in ast.get(id).children() {
        walk(visitor, ast, child)?;
    }
    visitor.leave(ast, id)
}

struct Inspector<F>(F);

impl<F> Visitor for Inspector<F>
where
    F: FnMut(&Ast, NodeId) -> bool,
{
    type Error = Infallible;

    fn visit(&mut self, ast: &Ast, id: NodeId) -> Result<Visit, Infallible> {
        Ok(if (self.0)(ast, id) {
            Visit::Children
        } else {
            Visit::SkipChildren
        })
    }
}

/// Closure form of [`walk`]: `f` returns whether to descend.
pub fn inspect<F>(ast: &Ast, id: NodeId, f: F)
where
    F: FnMut(&Ast, NodeId) -> bool,
{
    let Ok(()) = walk(&mut Inspector(f), ast, id);
}

// ---------------------------------------------------------------------------
// Cursor-based rewrite
// ---------------------------------------------------------------------------

/// What an [`apply`] callback wants next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Pre: descend into the current (possibly replaced) node. Post: carry on.
    Continue,
    /// Pre: skip the current node's children. Post: same as `Continue`.
    SkipChildren,
    /// Stop the whole traversal. Replacements made so far are kept.
    Abort,
}

/// The position [`apply`] is currently at.
pub struct Cursor<'a> {
    ast: &'a mut Ast,
    node: NodeId,
    /// Parent node and the index of our slot among its children.
    slot: Option<(NodeId, usize)>,
}

impl Cursor<'_> {
    /// Id of the current node (the replacement, once replaced).
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The current node.
    #[must_use]
    pub fn get(&self) -> &SyntaxNode {
        self.ast.get(self.node)
    }

    /// The tree being traversed.
    #[must_use]
    pub fn ast(&self) -> &Ast {
        &*self.ast
    }

    /// Parent of the current node; `None` at the traversal root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.slot.map(|(parent, _)| parent)
    }

    /// Add a node to the tree without linking it, e.g. to build the children
    /// of a replacement.
    pub fn push(&mut self, node: SyntaxNode) -> NodeId {
        self.ast.push(node)
    }

    /// Replace the current node with a new one and return the new node's id.
    pub fn replace(&mut self, node: SyntaxNode) -> NodeId {
        let id = self.ast.push(node);
        self.replace_with(id);
        id
    }

    /// Replace the current node with a node already in the tree.
    pub fn replace_with(&mut self, id: NodeId) {
        if let Some((parent, index)) = self.slot {
            if let Some(slot) = self.ast.get_mut(parent).children_mut().into_iter().nth(index) {
                *slot = id;
            }
        }
        self.node = id;
    }
}

struct Applier<Pre, Post> {
    pre: Pre,
    post: Post,
    aborted: bool,
}

impl<Pre, Post> Applier<Pre, Post>
where
    Pre: FnMut(&mut Cursor<'_>) -> Flow,
    Post: FnMut(&mut Cursor<'_>) -> Flow,
{
    fn apply_node(&mut self, ast: &mut Ast, id: NodeId, slot: Option<(NodeId, usize)>) -> NodeId {
        let mut cursor = Cursor {
            ast: &mut *ast,
            node: id,
            slot,
        };
        let flow = (self.pre)(&mut cursor);
        let current = cursor.node;
        match flow {
            Flow::Abort => {
                self.aborted = true;
                return current;
            }
            Flow::SkipChildren => return current,
            Flow::Continue => {}
        }

        for (index, child) in ast.get(current).children().into_iter().enumerate() {
            self.apply_node(ast, child, Some((current, index)));
            if self.aborted {
                return current;
            }
        }

        let mut cursor = Cursor {
            ast: &mut *ast,
            node: current,
            slot,
        };
        if (self.post)(&mut cursor) == Flow::Abort {
            self.aborted = true;
        }
        cursor.node
    }
}

/// Traverse the subtree at `root` with rewrite access.
///
/// `pre` runs before a node's children, `post` after them (and only when the
/// node was descended into). Returns the id now occupying the root position,
/// which differs from `root` if a callback replaced it.
pub fn apply<Pre, Post>(ast: &mut Ast, root: NodeId, pre: Pre, post: Post) -> NodeId
where
    Pre: FnMut(&mut Cursor<'_>) -> Flow,
    Post: FnMut(&mut Cursor<'_>) -> Flow,
{
    let mut applier = Applier {
        pre,
        post,
        aborted: false,
    };
    applier.apply_node(ast, root, None)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExprOp, FuncName, Span};

    /// `lower(a) = upper(b)` wrapped in a `RawStmt`.
    fn sample() -> Ast {
        let mut ast = Ast::new();
        let a = ast.column_ref(["a"], Span::new(6, 7));
        let lower = ast.func_call(FuncName::bare("lower"), vec![a], Span::new(0, 8));
        let b = ast.column_ref(["b"], Span::new(17, 18));
        let upper = ast.func_call(FuncName::bare("upper"), vec![b], Span::new(11, 19));
        let eq = ast.push(SyntaxNode::AExpr {
            op: ExprOp::Eq,
            lexpr: Some(lower),
            rexpr: upper,
            span: Span::new(0, 19),
        });
        let root = ast.push(SyntaxNode::RawStmt {
            stmt: eq,
            span: Span::new(0, 19),
        });
        ast.set_root(root);
        ast
    }

    fn func_names(ast: &Ast) -> Vec<String> {
        let mut names = Vec::new();
        inspect(ast, ast.root().unwrap(), |ast, id| {
            if let SyntaxNode::FuncCall(call) = ast.get(id) {
                names.push(call.func.to_string());
            }
            true
        });
        names
    }

    struct Recorder {
        events: Vec<String>,
        skip: &'static str,
    }

    impl Visitor for Recorder {
        type Error = Infallible;

        fn visit(&mut self, ast: &Ast, id: NodeId) -> Result<Visit, Infallible> {
            let shape = ast.get(id).shape_name();
            self.events.push(format!("enter {shape}"));
            if shape == self.skip {
                return Ok(Visit::SkipChildren);
            }
            Ok(Visit::Children)
        }

        fn leave(&mut self, ast: &Ast, id: NodeId) -> Result<(), Infallible> {
            self.events.push(format!("leave {}", ast.get(id).shape_name()));
            Ok(())
        }
    }

    #[test]
    fn test_walk_pre_order_with_leave() {
        let ast = sample();
        let mut rec = Recorder {
            events: Vec::new(),
            skip: "FuncCall",
        };
        let Ok(()) = walk(&mut rec, &ast, ast.root().unwrap());
        assert_eq!(
            rec.events,
            vec![
                "enter RawStmt",
                "enter A_Expr",
                "enter FuncCall",
                "enter FuncCall",
                "leave A_Expr",
                "leave RawStmt",
            ]
        );
    }

    #[test]
    fn test_walk_error_stops_traversal() {
        struct FailOnColumn {
            seen: usize,
        }
        impl Visitor for FailOnColumn {
            type Error = String;
            fn visit(&mut self, ast: &Ast, id: NodeId) -> Result<Visit, String> {
                self.seen += 1;
                match ast.get(id) {
                    SyntaxNode::ColumnRef { .. } => Err(format!("column at {id}")),
                    _ => Ok(Visit::Children),
                }
            }
        }

        let ast = sample();
        let mut v = FailOnColumn { seen: 0 };
        let err = walk(&mut v, &ast, ast.root().unwrap()).unwrap_err();
        assert!(err.starts_with("column at"));
        // RawStmt, A_Expr, FuncCall, List, ColumnRef; the second call is never reached.
        assert_eq!(v.seen, 5);
    }

    #[test]
    fn test_walk_handles_empty_lists() {
        let mut ast = Ast::new();
        let empty = ast.empty_list();
        let mut count = 0;
        inspect(&ast, empty, |_, _| {
            count += 1;
            true
        });
        assert_eq!(count, 1);
    }

    #[test]
    fn test_apply_replace_updates_parent_slot() {
        let mut ast = sample();
        let root = ast.root().unwrap();
        let new_root = apply(
            &mut ast,
            root,
            |cursor| {
                if let SyntaxNode::FuncCall(call) = cursor.get() {
                    if call.func.name == "lower" {
                        let name = cursor.push(SyntaxNode::String("x".to_owned()));
                        let fields = cursor.push(SyntaxNode::List(vec![name]));
                        cursor.replace(SyntaxNode::ColumnRef {
                            fields,
                            span: Span::ZERO,
                        });
                        return Flow::SkipChildren;
                    }
                }
                Flow::Continue
            },
            |_| Flow::Continue,
        );
        assert_eq!(new_root, root);
        assert_eq!(ast.display(root).to_string(), "x = upper(b)");
        assert_eq!(func_names(&ast), vec!["upper"]);
    }

    #[test]
    fn test_apply_replace_and_descend_visits_new_children() {
        let mut ast = sample();
        let root = ast.root().unwrap();
        let mut seen = Vec::new();
        apply(
            &mut ast,
            root,
            |cursor| {
                match cursor.get() {
                    SyntaxNode::FuncCall(call) if call.func.name == "upper" => {
                        let name = cursor.push(SyntaxNode::String("c".to_owned()));
                        let fields = cursor.push(SyntaxNode::List(vec![name]));
                        let arg = cursor.push(SyntaxNode::ColumnRef {
                            fields,
                            span: Span::ZERO,
                        });
                        let args = cursor.push(SyntaxNode::List(vec![arg]));
                        cursor.replace(SyntaxNode::FuncCall(sqlc_call(args)));
                    }
                    SyntaxNode::ColumnRef { .. } => {
                        seen.push(cursor.ast().display(cursor.node()).to_string());
                    }
                    _ => {}
                }
                Flow::Continue
            },
            |_| Flow::Continue,
        );
        assert_eq!(seen, vec!["a", "c"]);
        assert_eq!(ast.display(root).to_string(), "lower(a) = sqlc.arg(c)");
    }

    fn sqlc_call(args: NodeId) -> crate::FuncCall {
        crate::FuncCall {
            func: FuncName::qualified("sqlc", "arg"),
            args,
            agg_star: false,
            agg_distinct: false,
            span: Span::ZERO,
        }
    }

    #[test]
    fn test_apply_post_sees_rewritten_children() {
        let mut ast = sample();
        let root = ast.root().unwrap();
        let mut post_shapes = Vec::new();
        apply(
            &mut ast,
            root,
            |cursor| {
                if matches!(cursor.get(), SyntaxNode::FuncCall(_)) {
                    let one = cursor.push(SyntaxNode::Integer(1));
                    cursor.replace(SyntaxNode::AConst {
                        val: one,
                        span: Span::ZERO,
                    });
                    return Flow::SkipChildren;
                }
                Flow::Continue
            },
            |cursor| {
                if let SyntaxNode::AExpr { lexpr, rexpr, .. } = cursor.get() {
                    let ast = cursor.ast();
                    post_shapes.push((
                        ast.get(lexpr.unwrap()).shape_name(),
                        ast.get(*rexpr).shape_name(),
                    ));
                }
                Flow::Continue
            },
        );
        assert_eq!(post_shapes, vec![("A_Const", "A_Const")]);
        assert_eq!(ast.display(root).to_string(), "1 = 1");
    }

    #[test]
    fn test_apply_replace_root() {
        let mut ast = sample();
        let root = ast.root().unwrap();
        let new_root = apply(
            &mut ast,
            root,
            |cursor| {
                cursor.replace(SyntaxNode::Null);
                Flow::SkipChildren
            },
            |_| Flow::Continue,
        );
        assert_ne!(new_root, root);
        assert_eq!(ast.get(new_root), &SyntaxNode::Null);
    }

    #[test]
    fn test_apply_abort_keeps_earlier_replacements() {
        let mut ast = sample();
        let root = ast.root().unwrap();
        apply(
            &mut ast,
            root,
            |cursor| match cursor.get() {
                SyntaxNode::ColumnRef { .. } => {
                    cursor.replace(SyntaxNode::AStar);
                    Flow::Abort
                }
                _ => Flow::Continue,
            },
            |_| Flow::Continue,
        );
        assert_eq!(ast.display(root).to_string(), "lower(*) = upper(b)");
    }
}
