//! Pattern lowering and scope binding.

use rill_diagnostic::{ident_already_in_scope, pattern_not_canonicalized};
use rill_ir::ast::{ParsePattern, PatId};
use rill_ir::can::{CanPatField, CanPattern, DiagIdx, PatternIdx, PatternRange};
use rill_ir::{Name, Region};

use super::Canonicalizer;

/// One binding a pattern introduces, collected during lowering and
/// installed into the current scope by [`Canonicalizer::bind_all`].
#[derive(Copy, Clone, Debug)]
pub(crate) struct Binding {
    pub(crate) name: Name,
    pub(crate) pattern: PatternIdx,
    pub(crate) region: Region,
}

impl Canonicalizer<'_> {
    /// Lower one pattern, appending every binding it introduces to `bound`.
    pub(crate) fn lower_pattern(&mut self, pattern: PatId, bound: &mut Vec<Binding>) -> PatternIdx {
        let region = self.ast.pattern_region(pattern);
        match self.ast.pattern(pattern) {
            ParsePattern::Ident(name) => {
                let idx = self.arena.push_pattern(CanPattern::Ident(name), region);
                bound.push(Binding {
                    name,
                    pattern: idx,
                    region,
                });
                idx
            }
            ParsePattern::IntLiteral(value) => self
                .arena
                .push_pattern(CanPattern::IntLiteral(value), region),
            ParsePattern::Underscore => self.arena.push_pattern(CanPattern::Underscore, region),
            ParsePattern::Tag { name, args } => {
                let can_args = self.lower_pattern_list(args, bound);
                let can_args = self.arena.push_pattern_list(&can_args);
                self.arena
                    .push_pattern(CanPattern::Tag { name, args: can_args }, region)
            }
            ParsePattern::Record { fields } => {
                let mut can_fields = Vec::new();
                for field in self.ast.pat_field_list(fields).to_vec() {
                    let sub = if field.pattern.is_valid() {
                        self.lower_pattern(field.pattern, bound)
                    } else {
                        // Shorthand `{ x }` binds the field name directly.
                        let idx = self
                            .arena
                            .push_pattern(CanPattern::Ident(field.name), field.region);
                        bound.push(Binding {
                            name: field.name,
                            pattern: idx,
                            region: field.region,
                        });
                        idx
                    };
                    can_fields.push(CanPatField {
                        name: field.name,
                        pattern: sub,
                    });
                }
                let can_fields = self.arena.push_pat_fields(&can_fields);
                self.arena
                    .push_pattern(CanPattern::Record { fields: can_fields }, region)
            }
            ParsePattern::Tuple(elements) => {
                let can_elements = self.lower_pattern_list(elements, bound);
                let can_elements = self.arena.push_pattern_list(&can_elements);
                self.arena
                    .push_pattern(CanPattern::Tuple(can_elements), region)
            }
            ParsePattern::List { elems, rest } => {
                let can_elements = self.lower_pattern_list(elems, bound);
                let can_elements = self.arena.push_pattern_list(&can_elements);
                let can_rest = if rest.is_valid() {
                    self.lower_pattern(rest, bound)
                } else {
                    PatternIdx::INVALID
                };
                self.arena.push_pattern(
                    CanPattern::List {
                        elems: can_elements,
                        rest: can_rest,
                    },
                    region,
                )
            }
            ParsePattern::As { inner, name } => {
                // The `As` node's own index is the binding for `name`.
                let can_inner = self.lower_pattern(inner, bound);
                let idx = self.arena.push_pattern(
                    CanPattern::As {
                        inner: can_inner,
                        name,
                    },
                    region,
                );
                bound.push(Binding {
                    name,
                    pattern: idx,
                    region,
                });
                idx
            }
            ParsePattern::Alternatives(alternatives) => {
                self.lower_alternatives(alternatives, region)
            }
            ParsePattern::Malformed => {
                let diag = pattern_not_canonicalized("unparseable pattern", region);
                let idx = DiagIdx::new(
                    u32::try_from(self.diagnostics.len()).unwrap_or(u32::MAX),
                );
                self.diagnostics.push(diag);
                self.arena.push_pattern(CanPattern::Malformed(idx), region)
            }
        }
    }

    /// Lower alternatives: `1 | 2 | 3`. Alternatives may not bind names
    /// (which alternative's binding would be in scope?); any binding is a
    /// canonicalization error and the offending names are discarded.
    pub(crate) fn lower_alternatives(
        &mut self,
        alternatives: rill_ir::ast::PatRange,
        region: Region,
    ) -> PatternIdx {
        let mut inner_bound = Vec::new();
        let can_alternatives = self.lower_pattern_list(alternatives, &mut inner_bound);
        if !inner_bound.is_empty() {
            self.diagnostics.push(pattern_not_canonicalized(
                "alternatives cannot bind names",
                region,
            ));
        }
        let can_alternatives = self.arena.push_pattern_list(&can_alternatives);
        self.arena
            .push_pattern(CanPattern::Alternatives(can_alternatives), region)
    }

    /// Lower a match branch's top-level pattern list.
    ///
    /// A single pattern may bind; multiple alternatives may not.
    pub(crate) fn lower_branch_patterns(
        &mut self,
        patterns: rill_ir::ast::PatRange,
        bound: &mut Vec<Binding>,
    ) -> PatternRange {
        let ids = self.ast.pat_list(patterns).to_vec();
        if ids.len() == 1 {
            let can = self.lower_pattern(ids[0], bound);
            return self.arena.push_pattern_list(&[can]);
        }
        let mut inner_bound = Vec::new();
        let mut can_patterns = Vec::with_capacity(ids.len());
        for id in ids {
            can_patterns.push(self.lower_pattern(id, &mut inner_bound));
        }
        if !inner_bound.is_empty() {
            let region = inner_bound[0].region;
            self.diagnostics.push(pattern_not_canonicalized(
                "alternatives cannot bind names",
                region,
            ));
        }
        self.arena.push_pattern_list(&can_patterns)
    }

    fn lower_pattern_list(
        &mut self,
        patterns: rill_ir::ast::PatRange,
        bound: &mut Vec<Binding>,
    ) -> Vec<PatternIdx> {
        self.ast
            .pat_list(patterns)
            .to_vec()
            .into_iter()
            .map(|p| self.lower_pattern(p, bound))
            .collect()
    }

    /// Install collected bindings into the current scope, warning when a
    /// binding shadows one visible in an enclosing scope or a top-level
    /// declaration.
    pub(crate) fn bind_all(&mut self, bound: Vec<Binding>) {
        for binding in bound {
            if let Some(original) = self.shadowed_region(binding.name) {
                self.diagnostics.push(ident_already_in_scope(
                    self.interner.lookup(binding.name),
                    binding.region,
                    original,
                ));
            }
            self.scopes.bind(binding.name, binding.pattern, binding.region);
        }
    }

    /// The region of an existing binding this name would shadow: one in
    /// the *current function context* (enclosing lambdas are a different
    /// binding universe), or a top-level declaration.
    fn shadowed_region(&self, name: Name) -> Option<Region> {
        if let Some(region) = self.scopes.shadows(name) {
            return Some(region);
        }
        self.decl_region(name)
    }
}
