//! Compiler directives written as calls under the reserved `sqlc` schema.

use std::fmt;

/// Schema qualifier reserved for compiler directives.
pub const DIRECTIVE_SCHEMA: &str = "sqlc";

/// The recognized `sqlc.*` directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// `sqlc.arg(name)`: a named parameter.
    Arg,
    /// `sqlc.narg(name)`: a nullable named parameter.
    NArg,
    /// `sqlc.slice(name)`: a parameter expanded to a list.
    Slice,
    /// `sqlc.embed(table [, 'nullable'])`: embed all columns of a table.
    Embed,
}

impl DirectiveKind {
    /// All directives, in declaration order.
    pub const ALL: [Self; 4] = [Self::Arg, Self::NArg, Self::Slice, Self::Embed];

    /// Match a directive by its exact (case-sensitive) name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "arg" => Some(Self::Arg),
            "narg" => Some(Self::NArg),
            "slice" => Some(Self::Slice),
            "embed" => Some(Self::Embed),
            _ => None,
        }
    }

    /// The directive's name without the schema.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Arg => "arg",
            Self::NArg => "narg",
            Self::Slice => "slice",
            Self::Embed => "embed",
        }
    }

    /// Accepted argument count as an inclusive `(min, max)` range.
    #[must_use]
    pub const fn arity(self) -> (usize, usize) {
        match self {
            Self::Arg | Self::NArg | Self::Slice => (1, 1),
            Self::Embed => (1, 2),
        }
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{DIRECTIVE_SCHEMA}.{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_round_trips() {
        for kind in DirectiveKind::ALL {
            assert_eq!(DirectiveKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(DirectiveKind::from_name("EMBED"), None);
        assert_eq!(DirectiveKind::from_name("foo"), None);
    }

    #[test]
    fn test_arity() {
        assert_eq!(DirectiveKind::Arg.arity(), (1, 1));
        assert_eq!(DirectiveKind::Slice.arity(), (1, 1));
        assert_eq!(DirectiveKind::Embed.arity(), (1, 2));
    }

    #[test]
    fn test_display() {
        assert_eq!(DirectiveKind::NArg.to_string(), "sqlc.narg");
    }
}
