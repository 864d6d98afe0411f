//! Pattern matching against byte values.
//!
//! Matching is two-phase: [`Interpreter::try_match`] is a pure check over
//! the value's bytes; [`Interpreter::bind_pattern`] installs bindings into
//! the current binding table, materializing list elements (which live in
//! heap cells) onto the stack so every binding is a stack slot.

use rill_ir::can::{CanBranchRange, CanPattern, PatternIdx};
use rill_ir::Region;
use rill_layout::{Layout, LayoutIdx, ScalarKind};

use crate::errors::{EvalResult, FatalError, RuntimeError};
use crate::heap::{read_u32, HeapData};
use crate::interp::binop::read_int;
use crate::work::WorkItem;

use super::{EvalValue, Interpreter};

impl Interpreter<'_> {
    /// Try match branches in order; on success, bind and schedule the
    /// branch body plus the match epilogue.
    pub(super) fn match_check(
        &mut self,
        branches: CanBranchRange,
        next_branch: u16,
        region: Region,
    ) -> EvalResult<()> {
        let (offset, layout) = self.top_value()?;
        let entry_base = self.entries.len() - 1; // the scrutinee's entry
        let branch_list = self.arena.branch_list(branches).to_vec();
        let bytes = self.value_slot_bytes(offset, layout);

        for branch in branch_list.iter().skip(next_branch as usize) {
            let patterns = self.arena.pattern_list(branch.patterns).to_vec();
            let Some(&matched) = patterns
                .iter()
                .find(|&&p| self.try_match_bytes(p, &bytes, layout))
            else {
                continue;
            };

            let bound_patterns = vec![matched];
            self.bind_pattern(matched, offset, layout)?;
            self.work.push(WorkItem::MatchEnd {
                bound_patterns,
                entry_base,
            });
            self.work.push(WorkItem::EvalExpr(branch.body));
            return Ok(());
        }

        let value = crate::render::render_value(self, EvalValue { offset, layout });
        Err(RuntimeError::PatternMatchFailed { value, region }.into())
    }

    /// Pure match check for a value on the stack.
    pub(crate) fn try_match(
        &self,
        pattern: PatternIdx,
        offset: u32,
        layout: LayoutIdx,
    ) -> EvalResult<bool> {
        let bytes = self.value_slot_bytes(offset, layout);
        Ok(self.try_match_bytes(pattern, &bytes, layout))
    }

    fn value_slot_bytes(&self, offset: u32, layout: LayoutIdx) -> Vec<u8> {
        let size = self.cache.get(layout).size() as usize;
        self.stack.slice(offset, size).to_vec()
    }

    /// Pure match check over a value's bytes.
    fn try_match_bytes(&self, pattern: PatternIdx, bytes: &[u8], layout: LayoutIdx) -> bool {
        match self.arena.pattern(pattern) {
            CanPattern::Ident(_) | CanPattern::Underscore => true,
            CanPattern::IntLiteral(expected) => match self.cache.get(layout) {
                Layout::Scalar {
                    kind: ScalarKind::Int(precision),
                    ..
                } => read_int(bytes, *precision) == expected,
                _ => false,
            },
            CanPattern::Tag { name, args } => {
                let Layout::TagUnion { variants, .. } = self.cache.get(layout) else {
                    return false;
                };
                let disc = read_u32(bytes, 0) as usize;
                let Some((variant_name, payload)) = variants.get(disc) else {
                    return false;
                };
                if *variant_name != name {
                    return false;
                }
                let arg_patterns = self.arena.pattern_list(args);
                if arg_patterns.len() != payload.len() {
                    return false;
                }
                arg_patterns
                    .iter()
                    .zip(payload)
                    .all(|(&arg, &(offset, arg_layout))| {
                        let size = self.cache.get(arg_layout).size() as usize;
                        let offset = offset as usize;
                        self.try_match_bytes(arg, &bytes[offset..offset + size], arg_layout)
                    })
            }
            CanPattern::Record { fields } => {
                let Layout::Record {
                    fields: layout_fields,
                    ..
                } = self.cache.get(layout)
                else {
                    return false;
                };
                self.arena.pat_field_list(fields).iter().all(|field| {
                    layout_fields
                        .iter()
                        .find(|(_, _, name)| *name == field.name)
                        .is_some_and(|&(offset, field_layout, _)| {
                            let size = self.cache.get(field_layout).size() as usize;
                            let offset = offset as usize;
                            self.try_match_bytes(
                                field.pattern,
                                &bytes[offset..offset + size],
                                field_layout,
                            )
                        })
                })
            }
            CanPattern::Tuple(elements) => {
                let Layout::Tuple {
                    elements: layout_elements,
                    ..
                } = self.cache.get(layout)
                else {
                    return false;
                };
                let patterns = self.arena.pattern_list(elements);
                if patterns.len() != layout_elements.len() {
                    return false;
                }
                patterns.iter().zip(layout_elements).all(
                    |(&element, &(offset, element_layout))| {
                        let size = self.cache.get(element_layout).size() as usize;
                        let offset = offset as usize;
                        self.try_match_bytes(
                            element,
                            &bytes[offset..offset + size],
                            element_layout,
                        )
                    },
                )
            }
            CanPattern::List { elems, rest } => {
                let Layout::List { element, .. } = self.cache.get(layout) else {
                    return false;
                };
                let element = *element;
                let len = read_u32(bytes, 4) as usize;
                let patterns = self.arena.pattern_list(elems);
                let arity_ok = if rest.is_valid() {
                    len >= patterns.len()
                } else {
                    len == patterns.len()
                };
                if !arity_ok {
                    return false;
                }
                let handle = read_u32(bytes, 0);
                let HeapData::List {
                    bytes: cell_bytes, ..
                } = self.heap.get(handle)
                else {
                    return false;
                };
                let element_size = self.cache.get(element).size() as usize;
                patterns.iter().enumerate().all(|(i, &p)| {
                    let slot = &cell_bytes[i * element_size..(i + 1) * element_size];
                    self.try_match_bytes(p, slot, element)
                })
            }
            CanPattern::As { inner, .. } => self.try_match_bytes(inner, bytes, layout),
            CanPattern::Alternatives(alternatives) => self
                .arena
                .pattern_list(alternatives)
                .iter()
                .any(|&alt| self.try_match_bytes(alt, bytes, layout)),
            CanPattern::Malformed(_) => false,
        }
    }

    /// Install a verified pattern's bindings into the top binding table.
    ///
    /// Stack-resident sub-values bind in place; list elements are copied
    /// out of their heap cell onto the stack first (with refcount bumps),
    /// so a binding is always a stack slot.
    pub(crate) fn bind_pattern(
        &mut self,
        pattern: PatternIdx,
        offset: u32,
        layout: LayoutIdx,
    ) -> EvalResult<()> {
        match self.arena.pattern(pattern) {
            CanPattern::Ident(_) => {
                self.insert_binding(pattern, offset, layout);
                Ok(())
            }
            CanPattern::Underscore | CanPattern::IntLiteral(_) => Ok(()),
            CanPattern::As { inner, .. } => {
                self.insert_binding(pattern, offset, layout);
                self.bind_pattern(inner, offset, layout)
            }
            CanPattern::Tag { args, .. } => {
                let Layout::TagUnion { variants, .. } = self.cache.get(layout).clone() else {
                    return Err(layout_miscompute("tag pattern on a non-union value"));
                };
                let disc = self.stack.read_u32(offset) as usize;
                let Some((_, payload)) = variants.get(disc) else {
                    return Err(layout_miscompute("tag discriminant out of range"));
                };
                let payload = payload.clone();
                for (&arg, (arg_offset, arg_layout)) in
                    self.arena.pattern_list(args).to_vec().iter().zip(payload)
                {
                    self.bind_pattern(arg, offset + arg_offset, arg_layout)?;
                }
                Ok(())
            }
            CanPattern::Record { fields } => {
                let Layout::Record {
                    fields: layout_fields,
                    ..
                } = self.cache.get(layout).clone()
                else {
                    return Err(layout_miscompute("record pattern on a non-record value"));
                };
                for field in self.arena.pat_field_list(fields).to_vec() {
                    let Some(&(field_offset, field_layout, _)) = layout_fields
                        .iter()
                        .find(|(_, _, name)| *name == field.name)
                    else {
                        return Err(layout_miscompute("record field missing from layout"));
                    };
                    self.bind_pattern(field.pattern, offset + field_offset, field_layout)?;
                }
                Ok(())
            }
            CanPattern::Tuple(elements) => {
                let Layout::Tuple {
                    elements: layout_elements,
                    ..
                } = self.cache.get(layout).clone()
                else {
                    return Err(layout_miscompute("tuple pattern on a non-tuple value"));
                };
                for (&element, (element_offset, element_layout)) in self
                    .arena
                    .pattern_list(elements)
                    .to_vec()
                    .iter()
                    .zip(layout_elements)
                {
                    self.bind_pattern(element, offset + element_offset, element_layout)?;
                }
                Ok(())
            }
            CanPattern::List { elems, rest } => {
                let Layout::List { element, .. } = self.cache.get(layout).clone() else {
                    return Err(layout_miscompute("list pattern on a non-list value"));
                };
                let handle = self.stack.read_u32(offset);
                let element_size = self.cache.get(element).size() as usize;
                let element_align = self.cache.get(element).align() as usize;
                let patterns = self.arena.pattern_list(elems).to_vec();

                // Materialize each matched element onto the stack.
                for (i, &p) in patterns.iter().enumerate() {
                    let slot_bytes = {
                        let HeapData::List { bytes, .. } = self.heap.get(handle) else {
                            return Err(layout_miscompute("list handle names a non-list cell"));
                        };
                        bytes[i * element_size..(i + 1) * element_size].to_vec()
                    };
                    let slot = self.stack.alloc(element_size, element_align)?;
                    self.stack.write(slot, &slot_bytes);
                    self.heap.retain_value(&slot_bytes, element, self.cache);
                    self.push_value(slot, element);
                    self.bind_pattern(p, slot, element)?;
                }

                if rest.is_valid() {
                    // The rest binding is a fresh list of the remaining
                    // elements.
                    let (rest_bytes, len) = {
                        let HeapData::List { bytes, len, .. } = self.heap.get(handle) else {
                            return Err(layout_miscompute("list handle names a non-list cell"));
                        };
                        (
                            bytes[patterns.len() * element_size..].to_vec(),
                            *len as usize - patterns.len(),
                        )
                    };
                    for i in 0..len {
                        let slot = &rest_bytes[i * element_size..(i + 1) * element_size];
                        self.heap.retain_value(slot, element, self.cache);
                    }
                    let rest_len = u32::try_from(len).unwrap_or(u32::MAX);
                    let rest_handle = self.heap.alloc(HeapData::List {
                        element,
                        len: rest_len,
                        bytes: rest_bytes,
                    });
                    let slot = self
                        .stack
                        .alloc(rill_layout::LIST_SLOT_SIZE as usize, 4)?;
                    self.stack.write_u32(slot, rest_handle);
                    self.stack.write_u32(slot + 4, rest_len);
                    self.stack.write_u32(slot + 8, rest_len);
                    self.push_value(slot, layout);
                    self.bind_pattern(rest, slot, layout)?;
                }
                Ok(())
            }
            CanPattern::Alternatives(_) | CanPattern::Malformed(_) => {
                // Alternatives bind nothing (enforced during
                // canonicalization); malformed patterns never match.
                Ok(())
            }
        }
    }

    fn insert_binding(&mut self, pattern: PatternIdx, offset: u32, layout: LayoutIdx) {
        if let Some(table) = self.tables.last_mut() {
            table.insert(pattern.raw(), (offset, layout));
        }
    }

    /// Every binder (`Ident`, `As`) a pattern introduces.
    pub(crate) fn collect_binders(&self, pattern: PatternIdx) -> Vec<PatternIdx> {
        let mut out = Vec::new();
        self.collect_binders_into(pattern, &mut out);
        out
    }

    fn collect_binders_into(&self, pattern: PatternIdx, out: &mut Vec<PatternIdx>) {
        match self.arena.pattern(pattern) {
            CanPattern::Ident(_) => out.push(pattern),
            CanPattern::As { inner, .. } => {
                out.push(pattern);
                self.collect_binders_into(inner, out);
            }
            CanPattern::Tag { args, .. } => {
                for &arg in self.arena.pattern_list(args) {
                    self.collect_binders_into(arg, out);
                }
            }
            CanPattern::Record { fields } => {
                for field in self.arena.pat_field_list(fields) {
                    self.collect_binders_into(field.pattern, out);
                }
            }
            CanPattern::Tuple(elements) => {
                for &element in self.arena.pattern_list(elements) {
                    self.collect_binders_into(element, out);
                }
            }
            CanPattern::List { elems, rest } => {
                for &element in self.arena.pattern_list(elems) {
                    self.collect_binders_into(element, out);
                }
                if rest.is_valid() {
                    self.collect_binders_into(rest, out);
                }
            }
            CanPattern::IntLiteral(_)
            | CanPattern::Underscore
            | CanPattern::Alternatives(_)
            | CanPattern::Malformed(_) => {}
        }
    }
}

fn layout_miscompute(message: &str) -> crate::errors::EvalError {
    FatalError::Internal {
        message: message.to_owned(),
    }
    .into()
}
