//! Rill Canon - AST → canonical IR lowering with capture analysis.
//!
//! Canonicalization does three things in one pass over the parse tree:
//!
//! 1. **Lowering**: every parse node becomes its [`CanExpr`] equivalent,
//!    allocated in a [`CanArena`].
//! 2. **Scope resolution**: identifier references become
//!    `LookupLocal(PatternIdx)` or `LookupExternal(DeclId)`; unresolvable
//!    names become `Malformed` placeholders with a diagnostic.
//! 3. **Free-variable analysis**: for every lambda, the exact set of
//!    variables it captures from enclosing scopes, recorded in first-use
//!    order on the `Lambda` node.
//!
//! The pass always produces a complete arena; errors surface as
//! diagnostics plus `Malformed` nodes, never as an aborted lowering.
//!
//! [`CanExpr`]: rill_ir::can::CanExpr
//! [`CanArena`]: rill_ir::can::CanArena

mod free_vars;
mod lower;
mod scope;

pub use free_vars::FreeVarSet;
pub use scope::{Lookup, ScopeStack};

use rill_diagnostic::Diagnostic;
use rill_ir::ast::Ast;
use rill_ir::can::{CanArena, CanId};
use rill_ir::StringInterner;

/// Output of canonicalization: the arena, the root expression (INVALID for
/// definition-only input), and the out-of-band diagnostic list that
/// `Malformed` nodes index into.
#[derive(Debug)]
pub struct CanonResult {
    pub arena: CanArena,
    pub root: CanId,
    pub diagnostics: Vec<Diagnostic>,
}

impl CanonResult {
    /// Whether any diagnostic is an error (warnings alone don't count).
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity.is_error())
    }
}

/// Canonicalize a single expression (no top-level items).
pub fn canonicalize_expr(
    ast: &Ast,
    root: rill_ir::ast::NodeId,
    interner: &StringInterner,
) -> CanonResult {
    let mut canonicalizer = lower::Canonicalizer::new(ast, interner);
    let (can_root, free) = canonicalizer.lower_expr(root);
    debug_assert!(
        free.is_empty(),
        "top-level expression has unbound free variables: {free:?}"
    );
    canonicalizer.finish(can_root)
}

/// Canonicalize a whole file: definitions become declarations, the last
/// bare expression (if any) becomes the root.
pub fn canonicalize_file(ast: &Ast, interner: &StringInterner) -> CanonResult {
    let mut canonicalizer = lower::Canonicalizer::new(ast, interner);
    let root = canonicalizer.lower_items(&ast.items);
    canonicalizer.finish(root)
}
