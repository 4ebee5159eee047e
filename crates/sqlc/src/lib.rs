//! Front end of the sqlc query compiler.
//!
//! [`Compiler::compile`] takes the text of a query file and, for each
//! statement:
//!
//! 1. parses it into an [`Ast`](sqlc_ast::Ast);
//! 2. checks every function call ([`sqlc_validate::func_call`]);
//! 3. rewrites `sqlc.embed(t)` into `t.*` ([`sqlc_rewrite::embeds`]);
//! 4. expands the output list into [`OutputColumn`]s, turning each embed
//!    back into a single embedded column.
//!
//! ```
//! use sqlc::{Compiler, OutputColumn};
//! use sqlc::catalog::{Catalog, Column, Table};
//! use sqlc::config::CombinedSettings;
//!
//! let mut catalog = Catalog::with_builtins();
//! catalog.create_table(None, Table::new("users", vec![
//!     Column::new("id", "int8", true),
//!     Column::new("name", "text", true),
//! ]));
//! let compiler = Compiler::new(catalog, CombinedSettings::default());
//!
//! let query = compiler
//!     .compile("SELECT sqlc.embed(u) FROM users u WHERE u.id = sqlc.arg(id)")
//!     .remove(0)
//!     .unwrap();
//! assert!(matches!(&query.columns[0], OutputColumn::Embed(e) if e.columns.len() == 2));
//! assert_eq!(
//!     query.expanded_sql(),
//!     "SELECT u.id, u.name FROM users u WHERE u.id = sqlc.arg(id)"
//! );
//! ```

mod compiler;
mod expand;

pub use compiler::{Compiler, Query};
pub use expand::{Column, EmbedColumn, OutputColumn, UNNAMED_COLUMN};

pub use sqlc_ast as ast;
pub use sqlc_catalog as catalog;
pub use sqlc_config as config;
pub use sqlc_error::{ErrorCode, Result, SqlcError};
pub use sqlc_rewrite::{Embed, EmbedSet};

#[cfg(test)]
mod tests {
    use super::*;
    use sqlc_catalog::{Catalog, Column as CatalogColumn, Table};
    use sqlc_config::CombinedSettings;

    fn compiler() -> Compiler {
        let mut catalog = Catalog::with_builtins();
        catalog.create_table(
            None,
            Table::new(
                "authors",
                vec![
                    CatalogColumn::new("id", "int8", true),
                    CatalogColumn::new("name", "text", true),
                    CatalogColumn::new("bio", "text", false),
                ],
            ),
        );
        catalog.create_table(
            None,
            Table::new(
                "books",
                vec![
                    CatalogColumn::new("id", "int8", true),
                    CatalogColumn::new("author_id", "int8", true),
                    CatalogColumn::new("title", "text", true),
                ],
            ),
        );
        Compiler::new(catalog, CombinedSettings::default())
    }

    fn compile_one(sql: &str) -> Result<Query> {
        let mut results = compiler().compile(sql);
        assert_eq!(results.len(), 1);
        results.remove(0)
    }

    fn names(query: &Query) -> Vec<&str> {
        query.columns.iter().map(OutputColumn::name).collect()
    }

    #[test]
    fn test_embed_column() {
        let query = compile_one("SELECT sqlc.embed(authors) FROM authors").unwrap();
        assert_eq!(query.columns.len(), 1);
        let OutputColumn::Embed(embed) = &query.columns[0] else {
            unreachable!("expected an embed column");
        };
        assert_eq!(embed.name, "authors");
        assert!(!embed.nullable);
        assert_eq!(
            embed.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            ["id", "name", "bio"]
        );
        assert_eq!(
            query.expanded_sql(),
            "SELECT authors.id, authors.name, authors.bio FROM authors"
        );
    }

    #[test]
    fn test_star_expands_flat() {
        let query = compile_one("SELECT * FROM authors a JOIN books b ON b.author_id = a.id").unwrap();
        assert_eq!(names(&query), ["id", "name", "bio", "id", "author_id", "title"]);
        assert!(!query.has_embeds());
        assert_eq!(
            query.expanded_sql(),
            "SELECT * FROM authors a JOIN books b ON b.author_id = a.id"
        );
    }

    #[test]
    fn test_named_and_expression_columns() {
        let query = compile_one(
            "SELECT a.name, b.title AS book, lower(a.bio), count(*), 1 + 2, a.id::text FROM authors a JOIN books b ON b.author_id = a.id",
        )
        .unwrap();
        assert_eq!(names(&query), ["name", "book", "lower", "count", "?column?", "id"]);
        let OutputColumn::Column(book) = &query.columns[1] else {
            unreachable!("expected a plain column");
        };
        assert_eq!(book.table.as_deref(), Some("b"));
        assert_eq!(book.data_type.as_deref(), Some("text"));
        assert!(book.not_null);
        let OutputColumn::Column(count) = &query.columns[3] else {
            unreachable!("expected a plain column");
        };
        assert_eq!(count.data_type.as_deref(), Some("int8"));
    }

    #[test]
    fn test_canonical_embed_text_compiles_again() {
        let sql = "SELECT sqlc.embed(a), sqlc.embed(b, 'nullable') FROM authors a LEFT JOIN books b ON b.author_id = a.id";
        let first = compile_one(sql).unwrap();
        let canonical: Vec<String> = first.embeds.iter().map(Embed::orig).collect();
        assert_eq!(canonical, ["sqlc.embed(a)", "sqlc.embed(b, 'nullable')"]);

        let again = compile_one(&format!(
            "SELECT {} FROM authors a LEFT JOIN books b ON b.author_id = a.id",
            canonical.join(", ")
        ))
        .unwrap();
        let reparsed: Vec<String> = again.embeds.iter().map(Embed::orig).collect();
        assert_eq!(reparsed, canonical);
        assert!(again.embeds.iter().nth(1).unwrap().nullable);
    }

    #[test]
    fn test_unknown_relation() {
        let err = compile_one("SELECT sqlc.embed(x) FROM nope x").unwrap_err();
        assert_eq!(err.to_string(), "relation \"nope\" does not exist");
    }

    #[test]
    fn test_embed_of_table_not_in_from() {
        let sql = "SELECT sqlc.embed(books) FROM authors";
        let err = compile_one(sql).unwrap_err();
        assert_eq!(err.to_string(), "relation \"books\" does not exist");
        assert_eq!(err.render(sql), "1:8: relation \"books\" does not exist");
    }

    #[test]
    fn test_validation_runs_before_rewrite() {
        let err = compile_one("SELECT sqlc.embed() FROM authors").unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected at least 1 parameter(s) to sqlc.embed; got 0"
        );
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = compile_one("SELECT FROM WHERE").unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::SyntaxError);
    }
}
