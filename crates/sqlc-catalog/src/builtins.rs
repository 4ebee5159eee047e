//! Common PostgreSQL functions, registered under `pg_catalog`.
//!
//! Only arity matters to call resolution, so argument types are recorded as
//! PostgreSQL writes them but never compared.

use crate::{Catalog, FuncParam, Function, SYSTEM_SCHEMA};

fn req(ty: &str) -> FuncParam {
    FuncParam::required(ty)
}

fn opt(ty: &str) -> FuncParam {
    FuncParam::optional(ty)
}

fn var(ty: &str) -> FuncParam {
    FuncParam::variadic(ty)
}

/// Register the built-in functions into `catalog`.
pub fn register_builtins(catalog: &mut Catalog) {
    let functions = [
        // String
        Function::new("lower", vec![req("text")], "text"),
        Function::new("upper", vec![req("text")], "text"),
        Function::new("length", vec![req("text")], "int4"),
        Function::new("trim", vec![req("text"), opt("text")], "text"),
        Function::new("left", vec![req("text"), req("int4")], "text"),
        Function::new("right", vec![req("text"), req("int4")], "text"),
        Function::new("concat", vec![var("any")], "text"),
        Function::new("replace", vec![req("text"), req("text"), req("text")], "text"),
        Function::new("substr", vec![req("text"), req("int4"), opt("int4")], "text"),
        // Conditional
        Function::new("coalesce", vec![var("anyelement")], "anyelement"),
        Function::new("nullif", vec![req("anyelement"), req("anyelement")], "anyelement"),
        Function::new("greatest", vec![var("anyelement")], "anyelement"),
        Function::new("least", vec![var("anyelement")], "anyelement"),
        // Date/time
        Function::new("now", vec![], "timestamptz"),
        Function::new("date_trunc", vec![req("text"), req("timestamptz")], "timestamptz"),
        // Math
        Function::new("abs", vec![req("numeric")], "numeric"),
        Function::new("round", vec![req("numeric"), opt("int4")], "numeric"),
        // Aggregates
        Function::new("count", vec![req("any")], "int8"),
        Function::new("sum", vec![req("numeric")], "numeric"),
        Function::new("avg", vec![req("numeric")], "numeric"),
        Function::new("min", vec![req("anyelement")], "anyelement"),
        Function::new("max", vec![req("anyelement")], "anyelement"),
        Function::new("array_agg", vec![req("anyelement")], "anyarray"),
        // Arrays
        Function::new("unnest", vec![req("anyarray")], "setof anyelement"),
        Function::new("array_length", vec![req("anyarray"), req("int4")], "int4"),
    ];
    for function in functions {
        catalog.create_function(Some(SYSTEM_SCHEMA), function);
    }
}
