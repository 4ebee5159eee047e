//! Schema catalog consulted while checking queries.
//!
//! The catalog holds schemas, each with tables and functions. The validator
//! uses it to resolve ordinary (non-`sqlc.*`) function calls; column
//! expansion uses it to list a table's columns.
//!
//! Lookup strategy for a call `[schema.]name(args..)`:
//! 1. Qualified calls search only the named schema. Unqualified calls search
//!    the default schema, then `pg_catalog`.
//! 2. Names match case-insensitively.
//! 3. No function of that name anywhere on the path is a not-found error;
//!    a name with no overload accepting the argument count is a signature
//!    error.

use serde::{Deserialize, Serialize};
use sqlc_ast::{Ast, NodeId, SyntaxNode, TableName};
use sqlc_error::{Result, SqlcError};
use tracing::debug;

pub mod builtins;

pub use builtins::register_builtins;

/// Schema searched after the default schema for unqualified names.
pub const SYSTEM_SCHEMA: &str = "pg_catalog";

/// Schema used when a name is not qualified.
pub const DEFAULT_SCHEMA: &str = "public";

fn canonical_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Type name as written in the schema, e.g. `text` or `int8`.
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub not_null: bool,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, not_null: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            not_null,
        }
    }
}

/// A table with its columns in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    #[must_use]
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Find a column by name, case-insensitively.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| same_name(&c.name, name))
    }
}

/// One parameter of a function signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncParam {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub data_type: String,
    /// The parameter may be omitted.
    #[serde(default)]
    pub has_default: bool,
    /// The parameter absorbs any number of trailing arguments (at least one).
    #[serde(default)]
    pub variadic: bool,
}

impl FuncParam {
    /// A required positional parameter.
    #[must_use]
    pub fn required(data_type: impl Into<String>) -> Self {
        Self {
            name: None,
            data_type: data_type.into(),
            has_default: false,
            variadic: false,
        }
    }

    /// An optional positional parameter.
    #[must_use]
    pub fn optional(data_type: impl Into<String>) -> Self {
        Self {
            has_default: true,
            ..Self::required(data_type)
        }
    }

    /// A `VARIADIC` parameter.
    #[must_use]
    pub fn variadic(data_type: impl Into<String>) -> Self {
        Self {
            variadic: true,
            ..Self::required(data_type)
        }
    }
}

/// A function overload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<FuncParam>,
    pub return_type: String,
}

impl Function {
    #[must_use]
    pub fn new(name: impl Into<String>, params: Vec<FuncParam>, return_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params,
            return_type: return_type.into(),
        }
    }

    /// Fewest arguments a call must pass.
    #[must_use]
    pub fn min_args(&self) -> usize {
        self.params.iter().filter(|p| !p.has_default).count()
    }

    /// Most arguments a call may pass; `None` for variadic functions.
    #[must_use]
    pub fn max_args(&self) -> Option<usize> {
        if self.params.iter().any(|p| p.variadic) {
            None
        } else {
            Some(self.params.len())
        }
    }

    /// Whether a call with `n` arguments matches this overload.
    #[must_use]
    pub fn accepts(&self, n: usize) -> bool {
        n >= self.min_args() && self.max_args().is_none_or(|max| n <= max)
    }

    /// Whether this overload is variadic.
    #[must_use]
    pub fn is_variadic(&self) -> bool {
        self.max_args().is_none()
    }
}

/// A namespace of tables and functions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub functions: Vec<Function>,
}

impl Schema {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Find a table by name, case-insensitively.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| same_name(&t.name, name))
    }

    /// All overloads of `name`, in registration order.
    pub fn overloads<'s>(&'s self, name: &str) -> impl Iterator<Item = &'s Function> {
        self.functions.iter().filter(move |f| same_name(&f.name, name))
    }
}

/// The set of schemas known to the compiler.
///
/// Read-only once built; a shared reference can be used from several threads
/// checking different statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default = "default_schema_name")]
    pub default_schema: String,
    #[serde(default)]
    pub schemas: Vec<Schema>,
}

enum Lookup<'a> {
    Found(&'a Function),
    /// The name exists but no overload takes that many arguments.
    NoOverload,
    Missing,
}

fn default_schema_name() -> String {
    DEFAULT_SCHEMA.to_owned()
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// An empty catalog containing only the default schema.
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_schema: default_schema_name(),
            schemas: vec![Schema::new(DEFAULT_SCHEMA)],
        }
    }

    /// An empty catalog with the common PostgreSQL functions registered in
    /// `pg_catalog`.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        register_builtins(&mut catalog);
        catalog
    }

    /// Parse a catalog from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut catalog: Self = serde_json::from_str(json)
            .map_err(|e| SqlcError::invalid_config(format!("catalog: {e}")))?;
        if catalog.schema(&catalog.default_schema).is_none() {
            let name = catalog.default_schema.clone();
            catalog.schemas.push(Schema::new(name));
        }
        Ok(catalog)
    }

    /// Find a schema by name.
    #[must_use]
    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.iter().find(|s| same_name(&s.name, name))
    }

    /// Find a schema by name, creating it if absent.
    pub fn schema_mut(&mut self, name: &str) -> &mut Schema {
        let pos = match self.schemas.iter().position(|s| same_name(&s.name, name)) {
            Some(pos) => pos,
            None => {
                self.schemas.push(Schema::new(canonical_name(name)));
                self.schemas.len() - 1
            }
        };
        &mut self.schemas[pos]
    }

    /// Add a table. `schema` defaults to the default schema. A table with the
    /// same name is replaced; the previous definition is returned.
    pub fn create_table(&mut self, schema: Option<&str>, table: Table) -> Option<Table> {
        let schema_name = schema.map_or_else(|| self.default_schema.clone(), str::to_owned);
        let schema = self.schema_mut(&schema_name);
        if let Some(slot) = schema.tables.iter_mut().find(|t| same_name(&t.name, &table.name)) {
            return Some(std::mem::replace(slot, table));
        }
        schema.tables.push(table);
        None
    }

    /// Add a function overload. Overloads with the same name accumulate.
    pub fn create_function(&mut self, schema: Option<&str>, function: Function) {
        let schema_name = schema.map_or_else(|| self.default_schema.clone(), str::to_owned);
        self.schema_mut(&schema_name).functions.push(function);
    }

    fn search_path<'a>(&'a self, schema: Option<&'a str>) -> Vec<&'a str> {
        match schema {
            Some(s) => vec![s],
            None => vec![self.default_schema.as_str(), SYSTEM_SCHEMA],
        }
    }

    /// Look up a table. Unqualified names use the default schema.
    #[must_use]
    pub fn find_table(&self, name: &TableName) -> Option<&Table> {
        let schema = name.schema.as_deref().unwrap_or(&self.default_schema);
        let found = self.schema(schema).and_then(|s| s.table(&name.name));
        debug!(
            target: "sqlc.catalog",
            name = %name,
            kind = "table",
            hit = if found.is_some() { "exact" } else { "miss" },
            "catalog lookup"
        );
        found
    }

    /// Whether any function called `name` exists on the search path.
    #[must_use]
    pub fn contains_function(&self, schema: Option<&str>, name: &str) -> bool {
        self.search_path(schema)
            .into_iter()
            .filter_map(|s| self.schema(s))
            .any(|s| s.overloads(name).next().is_some())
    }

    /// Find the overload of `[schema.]name` that accepts `num_args` arguments.
    fn find_function(&self, schema: Option<&str>, name: &str, num_args: usize) -> Lookup<'_> {
        let canon = canonical_name(name);
        let mut seen = false;
        for schema in self.search_path(schema) {
            let Some(schema) = self.schema(schema) else {
                continue;
            };
            for function in schema.overloads(&canon) {
                seen = true;
                if function.accepts(num_args) {
                    debug!(
                        target: "sqlc.catalog",
                        name = %canon,
                        schema = %schema.name,
                        arity = num_args,
                        kind = "function",
                        hit = if function.is_variadic() { "variadic" } else { "exact" },
                        "catalog lookup"
                    );
                    return Lookup::Found(function);
                }
            }
        }
        debug!(
            target: "sqlc.catalog",
            name = %canon,
            arity = num_args,
            kind = "function",
            hit = if seen { "arity_mismatch" } else { "miss" },
            "catalog lookup"
        );
        if seen { Lookup::NoOverload } else { Lookup::Missing }
    }

    /// Resolve the `FuncCall` node `call` to a function overload.
    ///
    /// `count(*)` counts as one argument.
    ///
    /// # Errors
    ///
    /// [`SqlcError::FunctionNotFound`] when no function of that name exists,
    /// [`SqlcError::NoMatchingSignature`] when none of its overloads accepts
    /// the number of arguments, and [`SqlcError::Internal`] when `call` is
    /// not a function call.
    pub fn resolve_func_call(&self, ast: &Ast, call: NodeId) -> Result<&Function> {
        let SyntaxNode::FuncCall(fc) = ast.get(call) else {
            return Err(SqlcError::internal(format!(
                "expected FuncCall, got {}",
                ast.get(call).shape_name()
            )));
        };
        let num_args = if fc.agg_star {
            1
        } else {
            ast.list_items(fc.args).len()
        };
        match self.find_function(fc.func.schema.as_deref(), &fc.func.name, num_args) {
            Lookup::Found(function) => Ok(function),
            Lookup::Missing => Err(SqlcError::function_not_found(fc.func.to_string(), fc.span)),
            Lookup::NoOverload => {
                let args = vec!["unknown"; num_args].join(", ");
                Err(SqlcError::NoMatchingSignature {
                    signature: format!("{}({args})", fc.func),
                    span: fc.span,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlc_ast::{FuncName, Span};

    fn call(ast: &mut Ast, func: FuncName, n: usize) -> NodeId {
        let args = (0..n)
            .map(|i| ast.column_ref([format!("c{i}")], Span::ZERO))
            .collect();
        ast.func_call(func, args, Span::new(7, 20))
    }

    fn sample() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.create_function(
            None,
            Function::new("double_it", vec![FuncParam::required("int4")], "int4"),
        );
        catalog.create_function(
            None,
            Function::new(
                "my_func",
                vec![FuncParam::required("text"), FuncParam::variadic("text")],
                "text",
            ),
        );
        catalog.create_function(
            Some("extra"),
            Function::new("shout", vec![FuncParam::required("text")], "text"),
        );
        catalog
    }

    #[test]
    fn test_catalog_case_insensitive_lookup() {
        let catalog = sample();
        for name in ["double_it", "DOUBLE_IT", "Double_It"] {
            let mut ast = Ast::new();
            let id = call(&mut ast, FuncName::bare(name), 1);
            assert_eq!(
                catalog.resolve_func_call(&ast, id).unwrap().name,
                "double_it"
            );
        }
    }

    #[test]
    fn test_catalog_not_found_is_not_found() {
        let catalog = sample();
        let mut ast = Ast::new();
        let id = call(&mut ast, FuncName::bare("nonexistent"), 1);
        let err = catalog.resolve_func_call(&ast, id).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "function nonexistent does not exist");
        assert_eq!(err.span(), Some(Span::new(7, 20)));
    }

    #[test]
    fn test_catalog_arity_mismatch() {
        let catalog = sample();
        let mut ast = Ast::new();
        let id = call(&mut ast, FuncName::bare("double_it"), 2);
        let err = catalog.resolve_func_call(&ast, id).unwrap_err();
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "function double_it(unknown, unknown) does not exist"
        );
    }

    #[test]
    fn test_catalog_variadic_accepts_many() {
        let catalog = sample();
        for n in [2, 3, 7] {
            let mut ast = Ast::new();
            let id = call(&mut ast, FuncName::bare("my_func"), n);
            assert!(catalog.resolve_func_call(&ast, id).is_ok(), "n = {n}");
        }
        let mut ast = Ast::new();
        let id = call(&mut ast, FuncName::bare("my_func"), 1);
        assert!(catalog.resolve_func_call(&ast, id).is_err());
    }

    #[test]
    fn test_catalog_qualified_lookup_uses_only_that_schema() {
        let catalog = sample();
        let mut ast = Ast::new();
        let id = call(&mut ast, FuncName::qualified("extra", "shout"), 1);
        assert!(catalog.resolve_func_call(&ast, id).is_ok());

        let mut ast = Ast::new();
        let id = call(&mut ast, FuncName::bare("shout"), 1);
        assert!(catalog.resolve_func_call(&ast, id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_catalog_builtins_on_search_path() {
        let catalog = Catalog::with_builtins();
        let mut ast = Ast::new();
        let id = call(&mut ast, FuncName::bare("lower"), 1);
        let f = catalog.resolve_func_call(&ast, id).unwrap();
        assert_eq!(f.return_type, "text");

        let mut ast = Ast::new();
        let id = call(&mut ast, FuncName::qualified("pg_catalog", "upper"), 1);
        assert!(catalog.resolve_func_call(&ast, id).is_ok());
    }

    #[test]
    fn test_catalog_count_star() {
        let catalog = Catalog::with_builtins();
        let mut ast = Ast::new();
        let args = ast.empty_list();
        let id = ast.push(SyntaxNode::FuncCall(sqlc_ast::FuncCall {
            func: FuncName::bare("count"),
            args,
            agg_star: true,
            agg_distinct: false,
            span: Span::ZERO,
        }));
        assert_eq!(catalog.resolve_func_call(&ast, id).unwrap().return_type, "int8");
    }

    #[test]
    fn test_catalog_resolve_non_call_is_internal() {
        let catalog = sample();
        let mut ast = Ast::new();
        let id = ast.column_ref(["x"], Span::ZERO);
        let err = catalog.resolve_func_call(&ast, id).unwrap_err();
        assert!(matches!(err, SqlcError::Internal(_)));
    }

    #[test]
    fn test_catalog_tables() {
        let mut catalog = Catalog::new();
        let prev = catalog.create_table(
            None,
            Table::new("users", vec![Column::new("id", "int8", true)]),
        );
        assert!(prev.is_none());
        let prev = catalog.create_table(
            None,
            Table::new(
                "users",
                vec![
                    Column::new("id", "int8", true),
                    Column::new("name", "text", false),
                ],
            ),
        );
        assert_eq!(prev.unwrap().columns.len(), 1);

        let users = catalog.find_table(&TableName::bare("USERS")).unwrap();
        assert_eq!(users.columns.len(), 2);
        assert!(users.column("Name").is_some());
        assert!(catalog
            .find_table(&TableName::qualified("public", "users"))
            .is_some());
        assert!(catalog.find_table(&TableName::bare("posts")).is_none());
        assert!(catalog
            .find_table(&TableName::qualified("other", "users"))
            .is_none());
    }

    #[test]
    fn test_catalog_from_json() {
        let json = r#"{
            "schemas": [{
                "name": "public",
                "tables": [{
                    "name": "authors",
                    "columns": [
                        {"name": "id", "type": "bigserial", "not_null": true},
                        {"name": "bio", "type": "text"}
                    ]
                }],
                "functions": [{
                    "name": "slugify",
                    "params": [{"type": "text"}],
                    "return_type": "text"
                }]
            }]
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.default_schema, "public");
        let authors = catalog.find_table(&TableName::bare("authors")).unwrap();
        assert!(authors.columns[0].not_null);
        assert!(!authors.columns[1].not_null);
        assert!(catalog.contains_function(None, "slugify"));
        assert!(!catalog.contains_function(None, "lower"));
    }

    #[test]
    fn test_catalog_from_json_rejects_garbage() {
        let err = Catalog::from_json("{\"schemas\": 3}").unwrap_err();
        assert!(matches!(err, SqlcError::InvalidConfig { .. }));
    }

    #[test]
    fn test_catalog_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Catalog>();
    }

    #[test]
    fn test_function_arity_bounds() {
        let f = Function::new(
            "left",
            vec![FuncParam::required("text"), FuncParam::optional("int4")],
            "text",
        );
        assert_eq!((f.min_args(), f.max_args()), (1, Some(2)));
        assert!(f.accepts(1) && f.accepts(2) && !f.accepts(0) && !f.accepts(3));
    }
}
