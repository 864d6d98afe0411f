//! The call protocol: call frames, parameter binding, cleanup.
//!
//! Every call follows the same phases regardless of how the callee was
//! produced (named declaration, parameter, capture, or an immediately
//! applied lambda): evaluate the callee, write an explicit call frame,
//! evaluate arguments, bind parameters *and* captures into one fresh
//! binding table, evaluate the body, copy the result to the reserved
//! return slot, then release and pop everything but the result.
//!
//! The 24-byte frame (`function_pos`, `function_layout`,
//! `return_layout`, `arg_count`, padding) is written to the value stack
//! so parameter binding recovers the callee position without walking the
//! stack backwards.

use smallvec::SmallVec;

use rill_ir::can::{CanExpr, CanId};
use rill_ir::Region;
use rill_layout::{align_up, Layout, LayoutIdx, CLOSURE_HEADER_SIZE};

use crate::errors::{EvalResult, FatalError, RuntimeError};
use crate::work::WorkItem;

use super::{BindingTable, FrameInfo, Interpreter, StackEntry};

/// Size of the call frame record on the value stack.
pub(crate) const CALL_FRAME_SIZE: usize = 24;

impl Interpreter<'_> {
    /// Phase 2: the closure is on top of the stack; write the frame and
    /// reserve the return slot below the upcoming arguments.
    pub(super) fn push_call_frame(
        &mut self,
        arg_count: u16,
        return_layout: LayoutIdx,
        _region: Region,
    ) -> EvalResult<()> {
        let (closure_offset, closure_layout) = self.top_value()?;
        if !matches!(self.cache.get(closure_layout), Layout::Closure { .. }) {
            return Err(FatalError::NotCallable.into());
        }

        let frame_offset = self.stack.alloc(CALL_FRAME_SIZE, 4)?;
        self.stack.write_u32(frame_offset, closure_offset);
        self.stack.write_u32(frame_offset + 4, closure_layout.raw());
        self.stack.write_u32(frame_offset + 8, return_layout.raw());
        self.stack
            .write_u32(frame_offset + 12, u32::from(arg_count));
        self.entries.push(StackEntry::Frame {
            offset: frame_offset,
        });
        let frame_entry = self.entries.len() - 1;

        let return_size = self.cache.get(return_layout).size() as usize;
        let return_align = self.cache.get(return_layout).align() as usize;
        let return_offset = self.stack.alloc(return_size, return_align)?;

        self.frames.push(FrameInfo {
            closure_offset,
            closure_layout,
            return_offset,
            return_layout,
            arg_count,
            frame_entry,
        });
        Ok(())
    }

    /// Phase 4: open the per-call binding table.
    ///
    /// The frame recovers the closure; the closure's header recovers the
    /// body, the parameter list, and the environment. Parameters and
    /// captures install into one table, so `LookupLocal` is uniform no
    /// matter where a variable came from.
    pub(super) fn bind_parameters(&mut self, region: Region) -> EvalResult<()> {
        let Some(frame) = self.frames.last() else {
            return Err(FatalError::Internal {
                message: "bind_parameters without a call frame".to_owned(),
            }
            .into());
        };
        let closure_offset = frame.closure_offset;
        let frame_entry = frame.frame_entry;
        let arg_count = frame.arg_count as usize;

        // Read the closure header back from its bytes.
        let body_ref = self.stack.read_u32(closure_offset);
        let params_ref = self.stack.read_u32(closure_offset + 4);
        let lambda = CanId::new(params_ref);
        let CanExpr::Lambda {
            params, captures, ..
        } = self.arena.expr(lambda)
        else {
            return Err(FatalError::Internal {
                message: "closure params_ref does not name a lambda".to_owned(),
            }
            .into());
        };

        let param_patterns = self.arena.pattern_list(params).to_vec();
        if param_patterns.len() != arg_count {
            return Err(FatalError::ArityMismatch {
                expected: param_patterns.len(),
                found: arg_count,
            }
            .into());
        }

        // Argument slots sit above the frame entry, in reverse source
        // order (they were evaluated last-to-first).
        let mut arg_slots: SmallVec<[(u32, LayoutIdx); 4]> = SmallVec::new();
        for i in 0..arg_count {
            let entry = self.entries[frame_entry + 1 + (arg_count - 1 - i)];
            arg_slots.push(entry.as_value()?);
        }

        self.tables.push(BindingTable::default());

        for (&pattern, &(offset, layout)) in param_patterns.iter().zip(&arg_slots) {
            if !self.try_match(pattern, offset, layout)? {
                let value =
                    crate::render::render_value(self, super::EvalValue { offset, layout });
                return Err(RuntimeError::PatternMatchFailed { value, region }.into());
            }
            self.bind_pattern(pattern, offset, layout)?;
        }

        // Pre-install captures: binding-table entries point straight into
        // the closure's environment bytes.
        let env = match self.cache.get(frame_layout(self)?).clone() {
            Layout::Closure { env, .. } => env,
            _ => Vec::new(),
        };
        let capture_vars = self.arena.capture_list(captures).to_vec();
        debug_assert_eq!(capture_vars.len(), env.len());
        if let Some(table) = self.tables.last_mut() {
            for (capture, (env_offset, env_layout)) in capture_vars.iter().zip(env) {
                table.insert(
                    capture.bound_pattern.raw(),
                    (closure_offset + CLOSURE_HEADER_SIZE + env_offset, env_layout),
                );
            }
        }

        // Phase 5: the body.
        self.work.push(WorkItem::EvalExpr(CanId::new(body_ref)));
        Ok(())
    }

    /// Phase 6: move the body's result into the reserved return slot.
    ///
    /// This is a move, not a copy: the result entry is consumed and no
    /// refcounts change hands.
    pub(super) fn copy_result_to_return_space(&mut self) -> EvalResult<()> {
        let Some(frame) = self.frames.last() else {
            return Err(FatalError::Internal {
                message: "copy_result without a call frame".to_owned(),
            }
            .into());
        };
        let return_offset = frame.return_offset;
        let return_layout = frame.return_layout;
        let (result_offset, result_layout) = self.pop_value()?;
        debug_assert_eq!(
            self.cache.get(result_layout).size(),
            self.cache.get(return_layout).size(),
            "return layout disagrees with the body's result layout"
        );
        let size = self.cache.get(return_layout).size() as usize;
        self.stack.copy_within(result_offset, return_offset, size);
        self.stack.reset_to(result_offset as usize);
        Ok(())
    }

    /// Phase 7: release arguments, materialized parameter bindings, and
    /// the closure environment; pop the frame, the binding table, and
    /// everything above the closure; leave only the returned value.
    pub(super) fn cleanup_function(&mut self) -> EvalResult<()> {
        let Some(frame) = self.frames.pop() else {
            return Err(FatalError::Internal {
                message: "cleanup without a call frame".to_owned(),
            }
            .into());
        };
        self.tables.pop();

        // Everything above the frame entry is dead: argument slots plus
        // any slots materialized while binding parameters.
        let dead: Vec<StackEntry> = self.entries.drain(frame.frame_entry + 1..).collect();
        for entry in &dead {
            if let StackEntry::Value { offset, layout } = *entry {
                self.release_slot(offset, layout);
            }
        }
        // Drop the frame entry and the closure value (releasing its
        // captured environment).
        self.entries.pop();
        let closure_entry = self.entries.pop();
        debug_assert!(matches!(closure_entry, Some(StackEntry::Value { .. })));
        self.release_slot(frame.closure_offset, frame.closure_layout);

        // Slide the returned value down over the reclaimed region.
        let return_size = self.cache.get(frame.return_layout).size() as usize;
        let return_align = self.cache.get(frame.return_layout).align();
        let dst = align_up(frame.closure_offset, return_align);
        self.stack
            .copy_within(frame.return_offset, dst, return_size);
        self.stack.reset_to(dst as usize + return_size);
        self.push_value(dst, frame.return_layout);
        Ok(())
    }
}

/// The closure layout of the innermost frame.
fn frame_layout(interp: &Interpreter<'_>) -> EvalResult<LayoutIdx> {
    interp
        .frames
        .last()
        .map(|frame| frame.closure_layout)
        .ok_or_else(|| {
            FatalError::Internal {
                message: "no active call frame".to_owned(),
            }
            .into()
        })
}
