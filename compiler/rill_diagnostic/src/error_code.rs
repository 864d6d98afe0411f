//! Error code catalog.

use std::fmt;

/// Stable error codes, grouped by phase.
///
/// - `E1xxx`: tokenizer
/// - `E2xxx`: parser
/// - `E3xxx`: canonicalization
/// - `E4xxx`: type solving
/// - `E5xxx`: evaluation (runtime and fatal)
/// - `E9xxx`: internal compiler errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    /// Unrecognized character sequence.
    E1001,
    /// Unterminated string literal.
    E1002,
    /// Unexpected token.
    E2001,
    /// Expected an expression.
    E2002,
    /// Unclosed delimiter.
    E2003,
    /// Identifier not in scope.
    E3001,
    /// Identifier already in scope (shadowing).
    E3002,
    /// Pattern could not be canonicalized.
    E3003,
    /// Invalid top-level statement.
    E3004,
    /// Type mismatch.
    E4001,
    /// Arithmetic overflow.
    E5001,
    /// Division by zero.
    E5002,
    /// Pattern match failed at runtime.
    E5003,
    /// Value stack overflow.
    E5004,
    /// Call arity mismatch.
    E5005,
    /// Evaluated a malformed expression.
    E5006,
    /// Internal compiler error.
    E9001,
}

impl ErrorCode {
    /// The code string, e.g. `"E3001"`.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E3003 => "E3003",
            ErrorCode::E3004 => "E3004",
            ErrorCode::E4001 => "E4001",
            ErrorCode::E5001 => "E5001",
            ErrorCode::E5002 => "E5002",
            ErrorCode::E5003 => "E5003",
            ErrorCode::E5004 => "E5004",
            ErrorCode::E5005 => "E5005",
            ErrorCode::E5006 => "E5006",
            ErrorCode::E9001 => "E9001",
        }
    }

    /// Short machine-readable name, used by the `PROBLEMS` snapshot
    /// section and `EXPECTED` diagnostic matching.
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::E1001 => "tokenize_error",
            ErrorCode::E1002 => "unterminated_string",
            ErrorCode::E2001 => "parse_error",
            ErrorCode::E2002 => "expected_expression",
            ErrorCode::E2003 => "unclosed_delimiter",
            ErrorCode::E3001 => "ident_not_in_scope",
            ErrorCode::E3002 => "ident_already_in_scope",
            ErrorCode::E3003 => "pattern_not_canonicalized",
            ErrorCode::E3004 => "invalid_top_level_statement",
            ErrorCode::E4001 => "type_mismatch",
            ErrorCode::E5001 => "arithmetic_overflow",
            ErrorCode::E5002 => "division_by_zero",
            ErrorCode::E5003 => "pattern_match_failure",
            ErrorCode::E5004 => "stack_overflow",
            ErrorCode::E5005 => "arity_mismatch",
            ErrorCode::E5006 => "malformed_expression",
            ErrorCode::E9001 => "internal_compiler_error",
        }
    }

    /// Default report title.
    pub fn title(self) -> &'static str {
        match self {
            ErrorCode::E1001 => "UNRECOGNIZED CHARACTER",
            ErrorCode::E1002 => "UNTERMINATED STRING",
            ErrorCode::E2001 => "PARSE PROBLEM",
            ErrorCode::E2002 => "EXPECTED EXPRESSION",
            ErrorCode::E2003 => "UNCLOSED DELIMITER",
            ErrorCode::E3001 => "UNKNOWN NAME",
            ErrorCode::E3002 => "DUPLICATE NAME",
            ErrorCode::E3003 => "INVALID PATTERN",
            ErrorCode::E3004 => "INVALID STATEMENT",
            ErrorCode::E4001 => "TYPE MISMATCH",
            ErrorCode::E5001 => "ARITHMETIC OVERFLOW",
            ErrorCode::E5002 => "DIVISION BY ZERO",
            ErrorCode::E5003 => "UNMATCHED VALUE",
            ErrorCode::E5004 => "STACK OVERFLOW",
            ErrorCode::E5005 => "ARITY MISMATCH",
            ErrorCode::E5006 => "MALFORMED EXPRESSION",
            ErrorCode::E9001 => "INTERNAL COMPILER ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
