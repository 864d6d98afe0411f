//! Factory functions for canonicalization diagnostics.
//!
//! Phase code calls these instead of assembling [`Diagnostic`] values by
//! hand, so message wording stays in one place.

use rill_ir::Region;

use crate::{Diagnostic, ErrorCode};

/// `ident_not_in_scope`: a name was referenced but nothing binds it.
pub fn ident_not_in_scope(name: &str, region: Region) -> Diagnostic {
    Diagnostic::error(ErrorCode::E3001)
        .with_message(format!("nothing is named `{name}` in this scope"))
        .with_region(region)
        .with_hint("is there a typo, or a missing definition?")
}

/// `ident_already_in_scope`: a binding shadows an existing one.
///
/// Warning severity: canonicalization continues with the new binding.
pub fn ident_already_in_scope(name: &str, region: Region, original: Region) -> Diagnostic {
    Diagnostic::warning(ErrorCode::E3002)
        .with_message(format!("`{name}` is already bound in this scope"))
        .with_region(region)
        .with_label(crate::Label::new(original, "originally bound here"))
        .with_hint("the new binding shadows the original")
}

/// `pattern_not_canonicalized`: a pattern form is invalid in this position.
pub fn pattern_not_canonicalized(reason: &str, region: Region) -> Diagnostic {
    Diagnostic::error(ErrorCode::E3003)
        .with_message(format!("this pattern is not valid here: {reason}"))
        .with_region(region)
}

/// `invalid_top_level_statement`: a statement form the top level rejects.
pub fn invalid_top_level_statement(what: &str, region: Region) -> Diagnostic {
    Diagnostic::error(ErrorCode::E3004)
        .with_message(format!("{what} is not a valid top-level statement"))
        .with_region(region)
}
