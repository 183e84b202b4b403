//! Query classification and validation.
//!
//! `classify` inspects the leading keyword of a query and decides whether it
//! is a read, a write, or unknown. `validate` checks a query against a small
//! set of injection patterns and the expected class. Both are pure functions
//! over the query text; nothing here ever touches the database.
//!
//! The pattern set is a minimum bar inherited from the access layer this
//! replaces, not a complete SQL-injection defense.

use regex::{Regex, RegexBuilder};
use std::fmt;
use std::sync::LazyLock;

static BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"/\*.*?\*/")
        .dot_matches_new_line(true)
        .build()
        .expect("valid block comment pattern")
});

static LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"--.*$")
        .multi_line(true)
        .build()
        .expect("valid line comment pattern")
});

/// A semicolon with further non-whitespace content after it.
static MULTI_STATEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r";\s*\S").expect("valid multi-statement pattern"));

/// Extended stored procedure prefix (xp_cmdshell and friends).
static EXTENDED_PROCEDURE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\bxp_")
        .case_insensitive(true)
        .build()
        .expect("valid extended procedure pattern")
});

/// Dynamic SQL execution keyword.
static DYNAMIC_EXEC: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\bEXEC\s")
        .case_insensitive(true)
        .build()
        .expect("valid dynamic exec pattern")
});

static READ_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"^\s*SELECT\b")
        .case_insensitive(true)
        .build()
        .expect("valid read keyword pattern")
});

static WRITE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"^\s*(INSERT|UPDATE|DELETE|CREATE|DROP)\b")
        .case_insensitive(true)
        .build()
        .expect("valid write keyword pattern")
});

/// Classification of a query by its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryClass {
    /// SELECT queries.
    Read,
    /// INSERT, UPDATE, DELETE, CREATE, or DROP statements.
    Write,
    /// Anything else.
    Unknown,
}

impl fmt::Display for QueryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Reason a query failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// A semicolon followed by further content (multi-statement injection).
    MultipleStatements,
    /// A comment marker in the original query text.
    CommentInjection,
    /// An extended stored procedure prefix.
    ExtendedProcedure,
    /// A dynamic SQL execution keyword.
    DynamicExec,
    /// The leading keyword does not match the expected query class.
    WrongQueryClass,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MultipleStatements => {
                write!(f, "query contains multiple statements")
            }
            Self::CommentInjection => {
                write!(f, "query contains a comment marker")
            }
            Self::ExtendedProcedure => {
                write!(f, "query references an extended stored procedure")
            }
            Self::DynamicExec => {
                write!(f, "query uses dynamic SQL execution")
            }
            Self::WrongQueryClass => {
                write!(f, "query does not match the expected operation class")
            }
        }
    }
}

/// Result of validating a query against its expected class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The query passed every check.
    Valid,
    /// The query was rejected for the given reason.
    Invalid(InvalidReason),
}

impl ValidationOutcome {
    /// Returns true if the query passed validation.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Classifies a query by its leading keyword, case-insensitively.
///
/// Total and deterministic: every input maps to exactly one class.
pub fn classify(query: &str) -> QueryClass {
    if READ_KEYWORD.is_match(query) {
        QueryClass::Read
    } else if WRITE_KEYWORD.is_match(query) {
        QueryClass::Write
    } else {
        QueryClass::Unknown
    }
}

/// Strips comments and collapses whitespace for pattern checks.
///
/// Only the normalized form is inspected; the original text is what gets
/// executed downstream.
fn normalize(query: &str) -> String {
    let without_block = BLOCK_COMMENT.replace_all(query, "");
    let without_line = LINE_COMMENT.replace_all(&without_block, "");
    without_line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Validates a query against the injection patterns and the expected class.
///
/// Never executes anything; idempotent and side-effect-free.
pub fn validate(query: &str, expected: QueryClass) -> ValidationOutcome {
    let normalized = normalize(query);

    if MULTI_STATEMENT.is_match(&normalized) {
        return ValidationOutcome::Invalid(InvalidReason::MultipleStatements);
    }

    // Comment markers are checked in the original text: normalization has
    // already removed them, and their mere presence is what we reject.
    if query.contains("--") || query.contains("/*") {
        return ValidationOutcome::Invalid(InvalidReason::CommentInjection);
    }

    if EXTENDED_PROCEDURE.is_match(&normalized) {
        return ValidationOutcome::Invalid(InvalidReason::ExtendedProcedure);
    }

    if DYNAMIC_EXEC.is_match(&normalized) {
        return ValidationOutcome::Invalid(InvalidReason::DynamicExec);
    }

    let class_matches = match expected {
        QueryClass::Read => READ_KEYWORD.is_match(&normalized),
        QueryClass::Write => WRITE_KEYWORD.is_match(&normalized),
        QueryClass::Unknown => false,
    };

    if !class_matches {
        return ValidationOutcome::Invalid(InvalidReason::WrongQueryClass);
    }

    ValidationOutcome::Valid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_read() {
        assert_eq!(classify("SELECT * FROM users"), QueryClass::Read);
        assert_eq!(classify("  select 1"), QueryClass::Read);
        assert_eq!(classify("\n\tSeLeCt id FROM t"), QueryClass::Read);
    }

    #[test]
    fn test_classify_write() {
        assert_eq!(classify("INSERT INTO t VALUES (1)"), QueryClass::Write);
        assert_eq!(classify("update t set x = 1"), QueryClass::Write);
        assert_eq!(classify("DELETE FROM t"), QueryClass::Write);
        assert_eq!(classify("CREATE TABLE t (id int)"), QueryClass::Write);
        assert_eq!(classify("drop table t"), QueryClass::Write);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify("SHOW TABLES"), QueryClass::Unknown);
        assert_eq!(classify("EXPLAIN SELECT 1"), QueryClass::Unknown);
        assert_eq!(classify(""), QueryClass::Unknown);
        assert_eq!(classify("SELECTED wrong"), QueryClass::Unknown);
    }

    #[test]
    fn test_classify_is_deterministic() {
        for query in ["SELECT 1", "DROP TABLE t", "hello", "  sElEcT x"] {
            assert_eq!(classify(query), classify(query));
        }
    }

    #[test]
    fn test_validate_accepts_bare_select() {
        assert_eq!(
            validate("SELECT id, name FROM users WHERE id = 1", QueryClass::Read),
            ValidationOutcome::Valid
        );
    }

    #[test]
    fn test_validate_accepts_write_statements() {
        assert_eq!(
            validate("INSERT INTO users (name) VALUES ('x')", QueryClass::Write),
            ValidationOutcome::Valid
        );
        assert_eq!(
            validate("DROP TABLE users", QueryClass::Write),
            ValidationOutcome::Valid
        );
    }

    #[test]
    fn test_validate_rejects_multi_statement() {
        assert_eq!(
            validate("SELECT * FROM users; DROP TABLE users;", QueryClass::Read),
            ValidationOutcome::Invalid(InvalidReason::MultipleStatements)
        );
        assert_eq!(
            validate("SELECT 1; DELETE FROM t", QueryClass::Read),
            ValidationOutcome::Invalid(InvalidReason::MultipleStatements)
        );
    }

    #[test]
    fn test_validate_rejects_comment_markers() {
        assert_eq!(
            validate("SELECT * FROM users -- all of them", QueryClass::Read),
            ValidationOutcome::Invalid(InvalidReason::CommentInjection)
        );
        assert_eq!(
            validate("SELECT /* hidden */ * FROM users", QueryClass::Read),
            ValidationOutcome::Invalid(InvalidReason::CommentInjection)
        );
    }

    #[test]
    fn test_validate_rejects_extended_procedures() {
        assert_eq!(
            validate("SELECT xp_cmdshell('dir')", QueryClass::Read),
            ValidationOutcome::Invalid(InvalidReason::ExtendedProcedure)
        );
    }

    #[test]
    fn test_validate_rejects_dynamic_exec() {
        assert_eq!(
            validate("SELECT 1 WHERE EXEC ('DROP TABLE t')", QueryClass::Read),
            ValidationOutcome::Invalid(InvalidReason::DynamicExec)
        );
    }

    #[test]
    fn test_validate_rejects_class_mismatch() {
        assert_eq!(
            validate("DELETE FROM users", QueryClass::Read),
            ValidationOutcome::Invalid(InvalidReason::WrongQueryClass)
        );
        assert_eq!(
            validate("SELECT * FROM users", QueryClass::Write),
            ValidationOutcome::Invalid(InvalidReason::WrongQueryClass)
        );
    }

    #[test]
    fn test_validate_is_idempotent() {
        let query = "SELECT * FROM users; DROP TABLE users;";
        assert_eq!(
            validate(query, QueryClass::Read),
            validate(query, QueryClass::Read)
        );
    }

    #[test]
    fn test_validate_semicolon_then_drop_always_rejected() {
        for query in [
            "SELECT 1; DROP TABLE t",
            "SELECT 1 ; DROP TABLE t",
            "SELECT 1;DROP TABLE t",
        ] {
            assert!(
                !validate(query, QueryClass::Read).is_valid(),
                "should reject: {query}"
            );
        }
    }
}
