use std::fmt;

use sqlc_ast::{
    Ast, Cursor, DirectiveKind, Flow, FuncName, NodeId, Span, SyntaxNode, TableName, apply,
};
use tracing::debug;

/// Option string marking an embed as possibly absent.
const NULLABLE: &str = "nullable";

/// One rewritten `sqlc.embed(...)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    /// Table (or alias) whose columns are embedded.
    pub table: TableName,
    /// The first argument as the rewriter read it.
    pub param: String,
    /// The `table.*` column reference that replaced the call.
    pub node: NodeId,
    /// The embed may be NULL, e.g. the right side of a `LEFT JOIN`.
    pub nullable: bool,
    /// Source span of the original call.
    pub span: Span,
}

impl Embed {
    /// The directive text this embed replaced, in canonical form.
    #[must_use]
    pub fn orig(&self) -> String {
        if self.nullable {
            format!("sqlc.embed({}, '{NULLABLE}')", self.param)
        } else {
            format!("sqlc.embed({})", self.param)
        }
    }
}

impl fmt::Display for Embed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.orig())
    }
}

/// The embeds found in one statement, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedSet(Vec<Embed>);

impl EmbedSet {
    /// The embed whose wildcard is `node`.
    ///
    /// Matches on node id only: two embeds of the same table produce equal
    /// wildcards but are told apart here.
    #[must_use]
    pub fn find(&self, node: NodeId) -> Option<&Embed> {
        self.0.iter().find(|e| e.node == node)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Embed> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a EmbedSet {
    type Item = &'a Embed;
    type IntoIter = std::slice::Iter<'a, Embed>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for EmbedSet {
    type Item = Embed;
    type IntoIter = std::vec::IntoIter<Embed>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn is_embed(func: &FuncName) -> bool {
    func.directive() == Some(DirectiveKind::Embed)
}

/// Reduce an argument to plain text.
///
/// A string constant yields its value and a column reference its dotted
/// name. Anything else, including a column reference with a `*` field,
/// yields `None`.
#[must_use]
pub fn flatten(ast: &Ast, id: NodeId) -> Option<String> {
    match ast.get(id) {
        SyntaxNode::AConst { val, .. } => match ast.get(*val) {
            SyntaxNode::String(s) => Some(s.clone()),
            _ => None,
        },
        SyntaxNode::ColumnRef { fields, .. } => {
            let mut parts = Vec::new();
            for field in ast.list_items(*fields) {
                match ast.get(*field) {
                    SyntaxNode::String(s) => parts.push(s.as_str()),
                    _ => return None,
                }
            }
            Some(parts.join("."))
        }
        _ => None,
    }
}

/// Rewrite one node if it is an embed call. Returns the record on success.
fn rewrite_embed(cursor: &mut Cursor<'_>) -> Option<Embed> {
    let SyntaxNode::FuncCall(call) = cursor.get() else {
        return None;
    };
    let span = call.span;
    let args = cursor.ast().list_items(call.args).to_vec();
    let (first, rest) = args.split_first()?;

    let param = flatten(cursor.ast(), *first).unwrap_or_default();
    let nullable = match rest {
        [option] => flatten(cursor.ast(), *option).as_deref() == Some(NULLABLE),
        _ => false,
    };

    let name = cursor.push(SyntaxNode::String(param.clone()));
    let star = cursor.push(SyntaxNode::AStar);
    let fields = cursor.push(SyntaxNode::List(vec![name, star]));
    let node = cursor.replace(SyntaxNode::ColumnRef {
        fields,
        span: Span::ZERO,
    });

    Some(Embed {
        table: TableName::bare(param.clone()),
        param,
        node,
        nullable,
        span,
    })
}

/// Replace every `sqlc.embed(...)` call in the tree with a `table.*` column
/// reference, in place.
///
/// A call with no arguments is left untouched and produces no record. A
/// second argument marks the embed nullable only when it reads `nullable`.
/// The replacement's children are not visited.
pub fn embeds(ast: &mut Ast) -> EmbedSet {
    let Some(root) = ast.root() else {
        return EmbedSet::default();
    };
    let span = tracing::debug_span!(
        target: "sqlc.rewrite",
        "embeds",
        embeds = tracing::field::Empty,
    );
    let _guard = span.enter();

    let mut found = Vec::new();
    let new_root = apply(
        ast,
        root,
        |cursor| {
            let matched = matches!(cursor.get(), SyntaxNode::FuncCall(call) if is_embed(&call.func));
            if !matched {
                return Flow::Continue;
            }
            match rewrite_embed(cursor) {
                Some(embed) => {
                    debug!(
                        target: "sqlc.rewrite",
                        table = %embed.table,
                        nullable = embed.nullable,
                        node = %embed.node,
                        "rewrote sqlc.embed"
                    );
                    found.push(embed);
                }
                None => {
                    debug!(target: "sqlc.rewrite", node = %cursor.node(), "sqlc.embed without arguments left in place");
                }
            }
            Flow::SkipChildren
        },
        |_| Flow::Continue,
    );
    if new_root != root {
        ast.set_root(new_root);
    }

    span.record("embeds", found.len() as u64);
    crate::record_embeds(found.len());
    EmbedSet(found)
}
