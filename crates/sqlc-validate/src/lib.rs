//! Read-only checks run over a parsed statement before it is rewritten.
//!
//! [`func_call`] checks every function call: `sqlc.*` directives for their
//! name, arity and argument shapes, and ordinary calls against the catalog.
//! The first problem found is returned; nothing after it is examined.

use std::sync::atomic::{AtomicU64, Ordering};

mod func_call;

pub use func_call::func_call;

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Monotonic counter of statements rejected by validation.
static SQLC_VALIDATE_ERRORS_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Monotonic counter of function calls examined.
static SQLC_VALIDATE_CALLS_CHECKED_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Point-in-time snapshot of validation metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidateMetricsSnapshot {
    pub sqlc_validate_errors_total: u64,
    pub sqlc_validate_calls_checked_total: u64,
}

/// Take a point-in-time snapshot of validation metrics.
#[must_use]
pub fn validate_metrics_snapshot() -> ValidateMetricsSnapshot {
    ValidateMetricsSnapshot {
        sqlc_validate_errors_total: SQLC_VALIDATE_ERRORS_TOTAL.load(Ordering::Relaxed),
        sqlc_validate_calls_checked_total: SQLC_VALIDATE_CALLS_CHECKED_TOTAL
            .load(Ordering::Relaxed),
    }
}

/// Reset validation metrics.
pub fn reset_validate_metrics() {
    SQLC_VALIDATE_ERRORS_TOTAL.store(0, Ordering::Relaxed);
    SQLC_VALIDATE_CALLS_CHECKED_TOTAL.store(0, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlc_catalog::Catalog;
    use sqlc_config::CombinedSettings;

    #[test]
    fn test_validate_metrics() {
        reset_validate_metrics();
        let catalog = Catalog::with_builtins();
        let settings = CombinedSettings::default();

        let ok = sqlc_parser::parse_one("SELECT lower(name), sqlc.arg(id) FROM t").unwrap();
        func_call(&catalog, &settings, &ok).unwrap();
        let bad = sqlc_parser::parse_one("SELECT sqlc.foo(x) FROM t").unwrap();
        assert!(func_call(&catalog, &settings, &bad).is_err());

        // Other tests may run concurrently and bump the counters too.
        let snap = validate_metrics_snapshot();
        assert!(snap.sqlc_validate_errors_total >= 1);
        assert!(snap.sqlc_validate_calls_checked_total >= 3);
    }
}
