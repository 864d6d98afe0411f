//! Scope frames and function contexts.
//!
//! Two parallel stacks drive name resolution and capture recording:
//!
//! - The **scope stack**: one frame per block or lambda body, mapping
//!   `Name → PatternIdx`. Lookup walks outward.
//! - The **function-context stack**: one frame per lambda being
//!   canonicalized, accumulating the captures its body forces. Multiple
//!   scopes can share one function context (a lambda body with nested
//!   blocks).
//!
//! Capture recording happens on the lookup path: when a name resolves to a
//! binding introduced at a scope depth shallower than a function context,
//! that context (and every deeper one) must capture the binding — nested
//! lambdas reach outer bindings through every intermediate environment.

use rustc_hash::FxHashMap;

use rill_ir::can::{CaptureVar, PatternIdx};
use rill_ir::{Name, Region};

/// One lexical scope: bindings introduced by a block's lets, a lambda's
/// parameters, or a match branch's pattern.
#[derive(Debug, Default)]
struct ScopeFrame {
    bindings: FxHashMap<Name, PatternIdx>,
    /// Regions of the bindings, for shadow diagnostics.
    regions: FxHashMap<Name, Region>,
}

/// Per-lambda capture accumulator.
#[derive(Debug)]
struct FunctionContext {
    /// Scope depth at which this lambda's parameter scope begins. A
    /// binding at any shallower depth is outside the lambda.
    depth: u32,
    /// Captures in first-use order, deduplicated by bound pattern.
    captures: Vec<CaptureVar>,
}

/// Result of a scope lookup.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Lookup {
    /// Found: the binding pattern and the depth of the frame holding it.
    Resolved { pattern: PatternIdx, depth: u32 },
    /// No scope frame binds this name.
    NotFound,
}

/// The paired scope / function-context stacks.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<ScopeFrame>,
    functions: Vec<FunctionContext>,
}

impl ScopeStack {
    /// Create an empty stack (top level: no scopes, no function contexts).
    pub fn new() -> Self {
        Self::default()
    }

    /// Current scope depth (number of open frames).
    pub fn depth(&self) -> u32 {
        u32::try_from(self.scopes.len()).unwrap_or(u32::MAX)
    }

    /// Open a scope (block entry, lambda body, match branch).
    pub fn push_scope(&mut self) {
        self.scopes.push(ScopeFrame::default());
    }

    /// Close the innermost scope.
    pub fn pop_scope(&mut self) {
        debug_assert!(!self.scopes.is_empty(), "pop_scope on empty scope stack");
        self.scopes.pop();
    }

    /// Open a function context for a lambda about to be canonicalized.
    ///
    /// Must be called *before* the lambda's parameter scope is pushed, so
    /// the recorded depth equals the parameter scope's depth.
    pub fn push_function(&mut self) {
        self.functions.push(FunctionContext {
            depth: self.depth(),
            captures: Vec::new(),
        });
    }

    /// Close the innermost function context, returning its capture list
    /// in first-use order.
    pub fn pop_function(&mut self) -> Vec<CaptureVar> {
        debug_assert!(
            !self.functions.is_empty(),
            "pop_function on empty function stack"
        );
        self.functions.pop().map(|f| f.captures).unwrap_or_default()
    }

    /// Bind `name` to `pattern` in the innermost scope.
    pub fn bind(&mut self, name: Name, pattern: PatternIdx, region: Region) {
        if let Some(frame) = self.scopes.last_mut() {
            frame.bindings.insert(name, pattern);
            frame.regions.insert(name, region);
        }
    }

    /// Whether a scope *in the current function context* already binds
    /// `name`; returns the original binding region for the shadow
    /// diagnostic.
    ///
    /// The scan stops at the innermost function context's boundary: a
    /// parameter of an enclosing lambda is a different binding universe,
    /// so `|x| (|x| x + 1)(x)` reuses the name without a warning. Outside
    /// any lambda, every open scope belongs to the top-level context.
    pub fn shadows(&self, name: Name) -> Option<Region> {
        let floor = self
            .functions
            .last()
            .map_or(0, |f| f.depth as usize)
            .min(self.scopes.len());
        self.scopes[floor..]
            .iter()
            .rev()
            .find_map(|frame| frame.regions.get(&name).copied())
    }

    /// Look up `name`, walking scopes outward.
    ///
    /// On resolution, capture recording runs as a side effect: the binding
    /// is added to every function context whose depth exceeds the
    /// binding's depth (deduplicated by bound pattern).
    pub fn lookup(&mut self, name: Name) -> Lookup {
        let mut found = None;
        for (i, frame) in self.scopes.iter().enumerate().rev() {
            if let Some(&pattern) = frame.bindings.get(&name) {
                found = Some((pattern, u32::try_from(i).unwrap_or(u32::MAX)));
                break;
            }
        }
        let Some((pattern, depth)) = found else {
            return Lookup::NotFound;
        };

        for context in &mut self.functions {
            if context.depth > depth
                && !context.captures.iter().any(|c| c.bound_pattern == pattern)
            {
                context.captures.push(CaptureVar {
                    name,
                    bound_pattern: pattern,
                    scope_depth: depth,
                });
            }
        }

        Lookup::Resolved { pattern, depth }
    }

    /// Whether we are inside at least one lambda.
    pub fn in_function(&self) -> bool {
        !self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rill_ir::StringInterner;

    fn p(raw: u32) -> PatternIdx {
        PatternIdx::new(raw)
    }

    #[test]
    fn lookup_walks_outward() {
        let interner = StringInterner::new();
        let x = interner.intern("x");
        let mut stack = ScopeStack::new();
        stack.push_scope();
        stack.bind(x, p(0), Region::DUMMY);
        stack.push_scope();
        assert_eq!(
            stack.lookup(x),
            Lookup::Resolved {
                pattern: p(0),
                depth: 0
            }
        );
    }

    #[test]
    fn inner_binding_shadows_outer() {
        let interner = StringInterner::new();
        let x = interner.intern("x");
        let mut stack = ScopeStack::new();
        stack.push_scope();
        stack.bind(x, p(0), Region::DUMMY);
        stack.push_scope();
        stack.bind(x, p(1), Region::DUMMY);
        assert_eq!(
            stack.lookup(x),
            Lookup::Resolved {
                pattern: p(1),
                depth: 1
            }
        );
    }

    #[test]
    fn lookup_records_captures_in_deeper_contexts() {
        let interner = StringInterner::new();
        let x = interner.intern("x");
        let mut stack = ScopeStack::new();

        // Outer lambda binds x, inner lambda looks it up.
        stack.push_function();
        stack.push_scope(); // outer params, depth 0
        stack.bind(x, p(0), Region::DUMMY);
        stack.push_function(); // inner context, depth 1
        stack.push_scope(); // inner params, depth 1

        assert!(matches!(stack.lookup(x), Lookup::Resolved { depth: 0, .. }));

        stack.pop_scope();
        let inner_captures = stack.pop_function();
        assert_eq!(inner_captures.len(), 1);
        assert_eq!(inner_captures[0].bound_pattern, p(0));
        assert_eq!(inner_captures[0].scope_depth, 0);

        stack.pop_scope();
        // The outer lambda binds x itself, so it captures nothing.
        assert!(stack.pop_function().is_empty());
    }

    #[test]
    fn nested_lambdas_all_capture_the_outer_binding() {
        let interner = StringInterner::new();
        let y = interner.intern("y");
        let mut stack = ScopeStack::new();

        stack.push_function();
        stack.push_scope();
        stack.bind(y, p(0), Region::DUMMY); // bound at depth 0
        stack.push_function(); // middle, depth 1
        stack.push_scope();
        stack.push_function(); // innermost, depth 2
        stack.push_scope();

        // A lookup from the innermost body must register the capture in
        // both the middle and innermost contexts.
        let _ = stack.lookup(y);

        stack.pop_scope();
        assert_eq!(stack.pop_function().len(), 1);
        stack.pop_scope();
        assert_eq!(stack.pop_function().len(), 1);
        stack.pop_scope();
        assert!(stack.pop_function().is_empty());
    }

    #[test]
    fn shadows_is_scoped_to_the_current_function_context() {
        let interner = StringInterner::new();
        let x = interner.intern("x");
        let mut stack = ScopeStack::new();
        stack.push_function();
        stack.push_scope();
        stack.bind(x, p(0), Region::new(1, 2));

        // An inner lambda's parameter scope: the enclosing lambda's
        // binding is a different binding universe, not a shadow.
        stack.push_function();
        stack.push_scope();
        assert_eq!(stack.shadows(x), None);

        // A block inside the inner lambda does see that lambda's own
        // bindings.
        stack.bind(x, p(1), Region::new(5, 6));
        stack.push_scope();
        assert_eq!(stack.shadows(x), Some(Region::new(5, 6)));
    }

    #[test]
    fn shadows_sees_every_scope_outside_any_function() {
        let interner = StringInterner::new();
        let x = interner.intern("x");
        let mut stack = ScopeStack::new();
        stack.push_scope();
        stack.bind(x, p(0), Region::new(1, 2));
        stack.push_scope();
        assert_eq!(stack.shadows(x), Some(Region::new(1, 2)));
    }

    #[test]
    fn captures_deduplicate_by_pattern() {
        let interner = StringInterner::new();
        let x = interner.intern("x");
        let mut stack = ScopeStack::new();
        stack.push_scope();
        stack.bind(x, p(0), Region::DUMMY);
        stack.push_function();
        stack.push_scope();
        let _ = stack.lookup(x);
        let _ = stack.lookup(x);
        stack.pop_scope();
        assert_eq!(stack.pop_function().len(), 1);
    }
}
