use std::sync::atomic::Ordering;

use sqlc_ast::{Ast, DirectiveKind, FuncCall, NodeId, SyntaxNode, Visit, Visitor, walk};
use sqlc_catalog::Catalog;
use sqlc_config::CombinedSettings;
use sqlc_error::{Result, SqlcError};
use tracing::{error, warn};

use crate::{SQLC_VALIDATE_CALLS_CHECKED_TOTAL, SQLC_VALIDATE_ERRORS_TOTAL};

const NULLABLE: &str = "nullable";

struct FuncCallVisitor<'a> {
    catalog: &'a Catalog,
    settings: &'a CombinedSettings,
    calls_checked: u64,
    tolerated: u64,
}

impl Visitor for FuncCallVisitor<'_> {
    type Error = SqlcError;

    fn visit(&mut self, ast: &Ast, id: NodeId) -> Result<Visit> {
        let SyntaxNode::FuncCall(call) = ast.get(id) else {
            return Ok(Visit::Children);
        };
        self.calls_checked += 1;

        if call.func.is_directive() {
            check_directive(ast, call)?;
            // Directive arguments are names, not SQL to check.
            return Ok(Visit::SkipChildren);
        }

        match self.catalog.resolve_func_call(ast, id) {
            Ok(_) => Ok(Visit::Children),
            Err(err) if err.is_not_found() && !self.settings.strict_function_checks() => {
                self.tolerated += 1;
                warn!(
                    target: "sqlc.validate",
                    function = %call.func,
                    start = call.span.start,
                    "unknown function tolerated; strict_function_checks is off"
                );
                Ok(Visit::Children)
            }
            Err(err) => Err(err),
        }
    }
}

/// Check a call under the `sqlc` schema.
fn check_directive(ast: &Ast, call: &FuncCall) -> Result<()> {
    let name = &call.func.name;
    let Some(kind) = DirectiveKind::from_name(name) else {
        return Err(SqlcError::function_not_found(call.func.to_string(), call.span));
    };

    let args = ast.list_items(call.args);
    let (min, max) = kind.arity();
    if args.len() < min {
        return Err(SqlcError::TooFewArguments {
            function: name.clone(),
            min,
            actual: args.len(),
            span: call.span,
        });
    }
    if args.len() > max {
        return Err(SqlcError::TooManyArguments {
            function: name.clone(),
            max,
            actual: args.len(),
            span: call.span,
        });
    }

    let first = ast.get(args[0]);
    if !matches!(first, SyntaxNode::AConst { .. } | SyntaxNode::ColumnRef { .. }) {
        return Err(SqlcError::InvalidDirectiveArgument {
            function: name.clone(),
            got: first.shape_name().to_owned(),
            span: call.span,
        });
    }

    if let Some(option) = args.get(1) {
        check_option(ast, name, *option, call)?;
    }
    Ok(())
}

/// The second argument of `sqlc.embed` may only be the string `nullable`.
fn check_option(ast: &Ast, function: &str, option: NodeId, call: &FuncCall) -> Result<()> {
    match ast.get(option) {
        SyntaxNode::AConst { val, .. } => match ast.get(*val) {
            SyntaxNode::String(s) if s == NULLABLE => Ok(()),
            SyntaxNode::String(s) => Err(SqlcError::InvalidDirectiveOption {
                function: function.to_owned(),
                got: s.clone(),
                span: call.span,
            }),
            _ => Err(SqlcError::DirectiveOptionNotString {
                function: function.to_owned(),
                span: call.span,
            }),
        },
        other => Err(SqlcError::InvalidDirectiveArgument {
            function: function.to_owned(),
            got: other.shape_name().to_owned(),
            span: call.span,
        }),
    }
}

/// Check every function call in the statement.
///
/// `sqlc.*` calls must name a known directive with a valid argument list;
/// their arguments are not examined further and the catalog is not asked
/// about them. Other calls are resolved against `catalog`. A call the
/// catalog does not know is accepted unless the package has
/// `strict_function_checks` set; any other resolution failure is an error.
///
/// Stops at the first error, which carries the span of the offending call.
pub fn func_call(catalog: &Catalog, settings: &CombinedSettings, ast: &Ast) -> Result<()> {
    let Some(root) = ast.root() else {
        return Ok(());
    };
    let span = tracing::debug_span!(
        target: "sqlc.validate",
        "func_call",
        strict = settings.strict_function_checks(),
        calls_checked = tracing::field::Empty,
        tolerated = tracing::field::Empty,
    );
    let _guard = span.enter();

    let mut visitor = FuncCallVisitor {
        catalog,
        settings,
        calls_checked: 0,
        tolerated: 0,
    };
    let result = walk(&mut visitor, ast, root);

    span.record("calls_checked", visitor.calls_checked);
    span.record("tolerated", visitor.tolerated);
    SQLC_VALIDATE_CALLS_CHECKED_TOTAL.fetch_add(visitor.calls_checked, Ordering::Relaxed);

    if let Err(err) = &result {
        SQLC_VALIDATE_ERRORS_TOTAL.fetch_add(1, Ordering::Relaxed);
        error!(
            target: "sqlc.validate",
            error = %err,
            code = err.error_code().sqlstate(),
            start = err.span().map_or(0, |s| s.start),
            "function call rejected"
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlc_ast::Span;
    use sqlc_config::{Engine, SqlPackage};

    fn lenient() -> CombinedSettings {
        CombinedSettings::default()
    }

    fn strict() -> CombinedSettings {
        let mut package = SqlPackage::new("app", Engine::PostgreSQL);
        package.strict_function_checks = true;
        CombinedSettings::for_package(package)
    }

    fn check_with(settings: &CombinedSettings, sql: &str) -> Result<()> {
        let ast = sqlc_parser::parse_one(sql).unwrap();
        func_call(&Catalog::with_builtins(), settings, &ast)
    }

    fn check(sql: &str) -> Result<()> {
        check_with(&lenient(), sql)
    }

    fn message(sql: &str) -> String {
        check(sql).unwrap_err().to_string()
    }

    fn call_span(sql: &str, call: &str) -> Span {
        let start = u32::try_from(sql.find(call).unwrap()).unwrap();
        Span::new(start, start + u32::try_from(call.len()).unwrap())
    }

    #[test]
    fn test_valid_directives() {
        for sql in [
            "SELECT * FROM users WHERE id = sqlc.arg(id)",
            "SELECT * FROM users WHERE id = sqlc.arg('id')",
            "SELECT * FROM users WHERE name = sqlc.narg(name)",
            "SELECT * FROM users WHERE id IN (sqlc.slice(ids))",
            "SELECT sqlc.embed(users) FROM users",
            "SELECT sqlc.embed(u, 'nullable') FROM users u",
            "SELECT sqlc.embed(public.users) FROM public.users",
            "UPDATE users SET name = sqlc.arg(name) WHERE id = sqlc.arg(id) RETURNING *",
        ] {
            assert!(check(sql).is_ok(), "{sql}");
        }
    }

    #[test]
    fn test_unknown_directive() {
        let sql = "SELECT sqlc.foo(x) FROM t";
        let err = check(sql).unwrap_err();
        assert_eq!(err.to_string(), "function sqlc.foo does not exist");
        assert_eq!(err.span(), Some(call_span(sql, "sqlc.foo(x)")));
    }

    #[test]
    fn test_unknown_directive_is_fatal_even_when_lenient() {
        assert!(check_with(&lenient(), "SELECT sqlc.embeds(t) FROM t").is_err());
    }

    #[test]
    fn test_embed_without_arguments() {
        let sql = "SELECT sqlc.embed() FROM t";
        let err = check(sql).unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected at least 1 parameter(s) to sqlc.embed; got 0"
        );
        assert_eq!(err.span(), Some(call_span(sql, "sqlc.embed()")));
    }

    #[test]
    fn test_too_many_arguments() {
        assert_eq!(
            message("SELECT * FROM t WHERE id = sqlc.arg(a, b)"),
            "expected at most 1 parameter(s) to sqlc.arg; got 2"
        );
        assert_eq!(
            message("SELECT sqlc.embed(t, 'nullable', 'x') FROM t"),
            "expected at most 2 parameter(s) to sqlc.embed; got 3"
        );
    }

    #[test]
    fn test_first_argument_shape() {
        assert_eq!(
            message("SELECT * FROM t WHERE id = sqlc.arg($1)"),
            "expected parameter to sqlc.arg to be string or reference; got ParamRef"
        );
        assert_eq!(
            message("SELECT * FROM t WHERE id = sqlc.slice(lower(x))"),
            "expected parameter to sqlc.slice to be string or reference; got FuncCall"
        );
    }

    #[test]
    fn test_embed_option_other_string() {
        assert_eq!(
            message("SELECT sqlc.embed(t, 'nope') FROM t"),
            "valid options for sqlc.embed are: `nullable`, got nope"
        );
    }

    #[test]
    fn test_embed_option_not_string() {
        assert_eq!(
            message("SELECT sqlc.embed(t, 1) FROM t"),
            "options for sqlc.embed must be string"
        );
    }

    #[test]
    fn test_embed_option_must_be_literal() {
        assert_eq!(
            message("SELECT sqlc.embed(t, nullable) FROM t"),
            "expected parameter to sqlc.embed to be string or reference; got ColumnRef"
        );
    }

    #[test]
    fn test_directive_arguments_not_resolved() {
        // `no_such_fn` would fail strict resolution if it were visited.
        assert!(check_with(&strict(), "SELECT sqlc.arg(no_such_fn) FROM t").is_ok());
    }

    #[test]
    fn test_unknown_function_lenient_and_strict() {
        let sql = "SELECT frobnicate(x) FROM t";
        assert!(check_with(&lenient(), sql).is_ok());

        let err = check_with(&strict(), sql).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "function frobnicate does not exist");
        assert_eq!(err.span(), Some(call_span(sql, "frobnicate(x)")));
    }

    #[test]
    fn test_wrong_arity_is_fatal_even_when_lenient() {
        let err = check_with(&lenient(), "SELECT lower(a, b) FROM t").unwrap_err();
        assert_eq!(err.to_string(), "function lower(unknown, unknown) does not exist");
    }

    #[test]
    fn test_known_functions_pass_strict() {
        assert!(check_with(&strict(), "SELECT count(*), lower(name) FROM t GROUP BY name").is_ok());
    }

    #[test]
    fn test_nested_calls_are_checked() {
        let sql = "SELECT lower(upper(sqlc.bad(x))) FROM t";
        assert_eq!(message(sql), "function sqlc.bad does not exist");
    }

    #[test]
    fn test_first_error_wins() {
        let sql = "SELECT sqlc.embed() FROM t WHERE id = sqlc.foo(x)";
        assert_eq!(
            message(sql),
            "expected at least 1 parameter(s) to sqlc.embed; got 0"
        );
    }

    #[test]
    fn test_lenient_walk_continues_past_tolerated_call() {
        let sql = "SELECT unknown_fn(sqlc.arg()) FROM t";
        assert_eq!(
            message(sql),
            "expected at least 1 parameter(s) to sqlc.arg; got 0"
        );
    }

    #[test]
    fn test_empty_tree_is_valid() {
        let ast = Ast::new();
        assert!(func_call(&Catalog::new(), &strict(), &ast).is_ok());
    }
}
