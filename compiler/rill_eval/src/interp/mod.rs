//! The work-item scheduler and interpreter.
//!
//! A tight loop: pop a work item, dispatch on its kind, possibly push
//! further items. Values live on the byte [`ValueStack`]; a parallel
//! *layout stack* ([`StackEntry`]) records the offset and layout of every
//! live value slot so completions know what they are consuming.

mod aggregate;
pub(crate) mod binop;
mod call;
mod pattern;

use rustc_hash::FxHashMap;

use rill_diagnostic::Diagnostic;
use rill_ir::can::{CanArena, CanExpr, CanId, CanStmt, CanStrSegment};
use rill_ir::{Region, StringInterner};
use rill_layout::{align_up, Layout, LayoutCache, LayoutIdx};
use rill_types::TypeCheckResult;

use crate::errors::{EvalResult, FatalError, RuntimeError};
use crate::heap::{encode_str, Heap};
use crate::value_stack::ValueStack;
use crate::work::WorkItem;

/// One slot on the layout stack.
#[derive(Copy, Clone, Debug)]
pub(crate) enum StackEntry {
    /// A live value.
    Value { offset: u32, layout: LayoutIdx },
    /// A 24-byte call frame record.
    Frame {
        #[allow(dead_code)]
        offset: u32,
    },
}

impl StackEntry {
    pub(crate) fn as_value(self) -> EvalResult<(u32, LayoutIdx)> {
        match self {
            StackEntry::Value { offset, layout } => Ok((offset, layout)),
            StackEntry::Frame { .. } => Err(FatalError::Internal {
                message: "expected a value on the layout stack, found a call frame".to_owned(),
            }
            .into()),
        }
    }
}

/// Bookkeeping for one in-flight call.
#[derive(Debug)]
pub(crate) struct FrameInfo {
    pub(crate) closure_offset: u32,
    pub(crate) closure_layout: LayoutIdx,
    pub(crate) return_offset: u32,
    pub(crate) return_layout: LayoutIdx,
    pub(crate) arg_count: u16,
    /// Index of the `Frame` entry on the layout stack.
    pub(crate) frame_entry: usize,
}

/// Per-call binding table: `PatternIdx` raw → value slot.
pub(crate) type BindingTable = FxHashMap<u32, (u32, LayoutIdx)>;

/// The evaluation result: a value slot plus its layout.
#[derive(Copy, Clone, Debug)]
pub struct EvalValue {
    pub offset: u32,
    pub layout: LayoutIdx,
}

/// Layout-directed stack interpreter for one canonicalized program.
pub struct Interpreter<'a> {
    pub(crate) arena: &'a CanArena,
    pub(crate) types: &'a TypeCheckResult,
    pub(crate) cache: &'a mut LayoutCache,
    pub(crate) interner: &'a StringInterner,
    /// Canonicalization diagnostics; `Malformed` nodes index into this.
    diagnostics: &'a [Diagnostic],
    pub(crate) stack: ValueStack,
    pub(crate) heap: Heap,
    work: Vec<WorkItem>,
    pub(crate) entries: Vec<StackEntry>,
    pub(crate) frames: Vec<FrameInfo>,
    pub(crate) tables: Vec<BindingTable>,
    /// Declaration slots, by `DeclId` index.
    globals: Vec<Option<(u32, LayoutIdx)>>,
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter with the default stack capacity.
    pub fn new(
        arena: &'a CanArena,
        types: &'a TypeCheckResult,
        cache: &'a mut LayoutCache,
        interner: &'a StringInterner,
        diagnostics: &'a [Diagnostic],
    ) -> Self {
        Self::with_stack(
            arena,
            types,
            cache,
            interner,
            diagnostics,
            ValueStack::new(),
        )
    }

    /// Create an interpreter over an explicit value stack.
    pub fn with_stack(
        arena: &'a CanArena,
        types: &'a TypeCheckResult,
        cache: &'a mut LayoutCache,
        interner: &'a StringInterner,
        diagnostics: &'a [Diagnostic],
        stack: ValueStack,
    ) -> Self {
        Interpreter {
            arena,
            types,
            cache,
            interner,
            diagnostics,
            stack,
            heap: Heap::new(),
            work: Vec::new(),
            entries: Vec::new(),
            frames: Vec::new(),
            tables: vec![BindingTable::default()],
            globals: Vec::new(),
        }
    }

    /// Evaluate the whole program: declarations in order, then the root.
    ///
    /// Declaration values stay resident on the stack (they are the
    /// globals `LookupExternal` copies from); the root's value is the
    /// returned slot, on top of everything else.
    pub fn eval_program(&mut self, root: CanId) -> EvalResult<EvalValue> {
        tracing::trace!(decls = self.arena.decls().len(), "evaluating program");
        for (i, decl) in self.arena.decls().iter().enumerate() {
            if !decl.body.is_valid() {
                continue;
            }
            self.run(decl.body)?;
            let entry = self.top_value()?;
            self.globals.resize(self.globals.len().max(i + 1), None);
            self.globals[i] = Some(entry);
        }
        if !root.is_valid() {
            // Definition-only input evaluates to unit.
            let layout = self.unit_layout();
            let offset = self.stack.alloc(0, 1)?;
            self.push_value(offset, layout);
            return Ok(EvalValue { offset, layout });
        }
        let watermark = self.entries.len();
        self.run(root)?;
        debug_assert_eq!(
            self.entries.len(),
            watermark + 1,
            "stack neutrality: expected exactly one result value"
        );
        let (offset, layout) = self.top_value()?;
        Ok(EvalValue { offset, layout })
    }

    /// Run the scheduler until the work list drains.
    fn run(&mut self, expr: CanId) -> EvalResult<()> {
        debug_assert!(self.work.is_empty());
        self.work.push(WorkItem::EvalExpr(expr));
        while let Some(item) = self.work.pop() {
            if let Err(e) = self.step(item) {
                // Abandon in-flight work; the caller owns recovery.
                self.work.clear();
                return Err(e);
            }
        }
        Ok(())
    }

    fn step(&mut self, item: WorkItem) -> EvalResult<()> {
        match item {
            WorkItem::EvalExpr(id) => self.eval_expr(id),
            WorkItem::BinopDone { op, region } => self.binop_done(op, region),
            WorkItem::ShortCircuit { op, rhs } => self.short_circuit(op, rhs),
            WorkItem::UnaryDone { op, region } => self.unary_done(op, region),
            WorkItem::IfCheckCondition {
                then_branch,
                else_branch,
            } => self.if_check_condition(then_branch, else_branch),
            WorkItem::BindLocal { pattern, region } => self.bind_local(pattern, region),
            WorkItem::DiscardValue => self.discard_value(),
            WorkItem::BlockEnd {
                let_patterns,
                entry_base,
            } => self.region_epilogue(&let_patterns, entry_base),
            WorkItem::PushUnit => {
                let layout = self.unit_layout();
                let offset = self.stack.alloc(0, 1)?;
                self.push_value(offset, layout);
                Ok(())
            }
            WorkItem::PushCallFrame {
                arg_count,
                return_layout,
                region,
            } => self.push_call_frame(arg_count, return_layout, region),
            WorkItem::BindParameters { region } => self.bind_parameters(region),
            WorkItem::CopyResultToReturnSpace => self.copy_result_to_return_space(),
            WorkItem::CleanupFunction => self.cleanup_function(),
            WorkItem::MakeRecord { layout, names } => self.make_record(layout, &names),
            WorkItem::MakeTuple { layout, count } => self.make_tuple(layout, count),
            WorkItem::MakeList { layout, count } => self.make_list(layout, count),
            WorkItem::MakeTag {
                layout,
                name,
                count,
            } => self.make_tag(layout, name, count),
            WorkItem::MatchCheck {
                branches,
                next_branch,
                region,
            } => self.match_check(branches, next_branch, region),
            WorkItem::MatchEnd {
                bound_patterns,
                entry_base,
            } => self.region_epilogue(&bound_patterns, entry_base),
        }
    }

    // Expression dispatch

    fn eval_expr(&mut self, id: CanId) -> EvalResult<()> {
        let region = self.arena.expr_region(id);
        match self.arena.expr(id) {
            CanExpr::Int { value, precision } => {
                let layout = self.expr_layout(id);
                let size = precision.size();
                let offset = self.stack.alloc(size, precision.align())?;
                let bytes = value.to_le_bytes();
                self.stack.write(offset, &bytes[..size]);
                self.push_value(offset, layout);
                Ok(())
            }
            CanExpr::Frac { value, precision } => {
                let layout = self.expr_layout(id);
                let offset = self.stack.alloc(precision.size(), precision.align())?;
                match precision {
                    rill_ir::can::FracPrecision::F64 => {
                        self.stack.write(offset, &value.to_le_bytes());
                    }
                    rill_ir::can::FracPrecision::F32 => {
                        let narrowed = f64::from_bits(value);
                        // Fractional literals are stored as f64 bits;
                        // truncate to f32 for narrow slots.
                        #[expect(clippy::cast_possible_truncation, reason = "f32 literal slot")]
                        let bits = (narrowed as f32).to_bits();
                        self.stack.write(offset, &bits.to_le_bytes());
                    }
                }
                self.push_value(offset, layout);
                Ok(())
            }
            CanExpr::Bool(value) => {
                let layout = self.expr_layout(id);
                let offset = self.stack.alloc(1, 1)?;
                self.stack.write(offset, &[u8::from(value)]);
                self.push_value(offset, layout);
                Ok(())
            }
            CanExpr::Str(segments) => {
                let mut text = String::new();
                for segment in self.arena.str_segment_list(segments) {
                    let CanStrSegment::Literal(piece) = segment;
                    text.push_str(self.interner.lookup(*piece));
                }
                let layout = self.expr_layout(id);
                let slot = encode_str(&text, &mut self.heap);
                let offset = self
                    .stack
                    .alloc(rill_layout::STR_SLOT_SIZE as usize, 8)?;
                self.stack.write(offset, &slot);
                self.push_value(offset, layout);
                Ok(())
            }
            CanExpr::LookupLocal(pattern) => {
                let Some(&(src, layout)) = self
                    .tables
                    .last()
                    .and_then(|table| table.get(&pattern.raw()))
                else {
                    return Err(FatalError::Internal {
                        message: format!("no binding for pattern p{}", pattern.raw()),
                    }
                    .into());
                };
                self.copy_value(src, layout)
            }
            CanExpr::LookupExternal(decl) => {
                let Some(Some((src, layout))) = self.globals.get(decl.index()).copied() else {
                    return Err(FatalError::Internal {
                        message: format!("declaration d{} has no value", decl.raw()),
                    }
                    .into());
                };
                self.copy_value(src, layout)
            }
            CanExpr::Lambda { captures, .. } => self.make_closure(id, captures),
            CanExpr::Call { callee, args } => {
                let return_layout = self.expr_layout(id);
                let arg_ids = self.arena.expr_list(args).to_vec();
                let arg_count = u16::try_from(arg_ids.len()).unwrap_or(u16::MAX);
                self.work.push(WorkItem::CleanupFunction);
                self.work.push(WorkItem::CopyResultToReturnSpace);
                self.work.push(WorkItem::BindParameters { region });
                // Pushed in source order, popped (evaluated) in reverse
                // source order, so args pop in forward order at binding.
                for &arg in &arg_ids {
                    self.work.push(WorkItem::EvalExpr(arg));
                }
                self.work.push(WorkItem::PushCallFrame {
                    arg_count,
                    return_layout,
                    region,
                });
                self.work.push(WorkItem::EvalExpr(callee));
                Ok(())
            }
            CanExpr::Binop { op, lhs, rhs } => {
                if op.is_short_circuit() {
                    self.work.push(WorkItem::ShortCircuit { op, rhs });
                    self.work.push(WorkItem::EvalExpr(lhs));
                } else {
                    self.work.push(WorkItem::BinopDone { op, region });
                    self.work.push(WorkItem::EvalExpr(rhs));
                    self.work.push(WorkItem::EvalExpr(lhs));
                }
                Ok(())
            }
            CanExpr::Unary { op, operand } => {
                self.work.push(WorkItem::UnaryDone { op, region });
                self.work.push(WorkItem::EvalExpr(operand));
                Ok(())
            }
            CanExpr::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.work.push(WorkItem::IfCheckCondition {
                    then_branch,
                    else_branch,
                });
                self.work.push(WorkItem::EvalExpr(cond));
                Ok(())
            }
            CanExpr::Block { stmts, tail } => {
                let stmts = self.arena.stmt_list(stmts).to_vec();
                let let_patterns: Vec<_> = stmts
                    .iter()
                    .filter_map(|stmt| match stmt {
                        CanStmt::Let { pattern, .. } => Some(*pattern),
                        CanStmt::Expr(_) => None,
                    })
                    .collect();
                self.work.push(WorkItem::BlockEnd {
                    let_patterns,
                    entry_base: self.entries.len(),
                });
                if tail.is_valid() {
                    self.work.push(WorkItem::EvalExpr(tail));
                } else {
                    self.work.push(WorkItem::PushUnit);
                }
                for stmt in stmts.iter().rev() {
                    match *stmt {
                        CanStmt::Let { pattern, value } => {
                            self.work.push(WorkItem::BindLocal {
                                pattern,
                                region: self.arena.expr_region(value),
                            });
                            self.work.push(WorkItem::EvalExpr(value));
                        }
                        CanStmt::Expr(e) => {
                            self.work.push(WorkItem::DiscardValue);
                            self.work.push(WorkItem::EvalExpr(e));
                        }
                    }
                }
                Ok(())
            }
            CanExpr::Record { fields } => {
                let layout = self.expr_layout(id);
                let fields = self.arena.field_list(fields).to_vec();
                self.work.push(WorkItem::MakeRecord {
                    layout,
                    names: fields.iter().map(|f| f.name).collect(),
                });
                for field in fields.iter().rev() {
                    self.work.push(WorkItem::EvalExpr(field.value));
                }
                Ok(())
            }
            CanExpr::Tuple(elements) => {
                let layout = self.expr_layout(id);
                let elements = self.arena.expr_list(elements).to_vec();
                self.work.push(WorkItem::MakeTuple {
                    layout,
                    count: u16::try_from(elements.len()).unwrap_or(u16::MAX),
                });
                for &element in elements.iter().rev() {
                    self.work.push(WorkItem::EvalExpr(element));
                }
                Ok(())
            }
            CanExpr::List(elements) => {
                let layout = self.expr_layout(id);
                let elements = self.arena.expr_list(elements).to_vec();
                self.work.push(WorkItem::MakeList {
                    layout,
                    count: u16::try_from(elements.len()).unwrap_or(u16::MAX),
                });
                for &element in elements.iter().rev() {
                    self.work.push(WorkItem::EvalExpr(element));
                }
                Ok(())
            }
            CanExpr::Tag { name, payload } => {
                let layout = self.expr_layout(id);
                let payload = self.arena.expr_list(payload).to_vec();
                self.work.push(WorkItem::MakeTag {
                    layout,
                    name,
                    count: u16::try_from(payload.len()).unwrap_or(u16::MAX),
                });
                for &arg in payload.iter().rev() {
                    self.work.push(WorkItem::EvalExpr(arg));
                }
                Ok(())
            }
            CanExpr::Match {
                scrutinee,
                branches,
            } => {
                self.work.push(WorkItem::MatchCheck {
                    branches,
                    next_branch: 0,
                    region,
                });
                self.work.push(WorkItem::EvalExpr(scrutinee));
                Ok(())
            }
            CanExpr::Malformed(diag) => {
                let diagnostic = self
                    .diagnostics
                    .get(diag.index())
                    .cloned()
                    .unwrap_or_else(|| {
                        rill_diagnostic::Diagnostic::error(
                            rill_diagnostic::ErrorCode::E5006,
                        )
                        .with_message("malformed expression")
                        .with_region(region)
                    });
                Err(RuntimeError::MalformedExpression {
                    diagnostic: Box::new(diagnostic),
                }
                .into())
            }
        }
    }

    // Simple completions

    fn if_check_condition(&mut self, then_branch: CanId, else_branch: CanId) -> EvalResult<()> {
        let (offset, _) = self.pop_value()?;
        let truthy = self.stack.slice(offset, 1)[0] != 0;
        self.stack.reset_to(offset as usize);
        self.work.push(WorkItem::EvalExpr(if truthy {
            then_branch
        } else {
            else_branch
        }));
        Ok(())
    }

    fn discard_value(&mut self) -> EvalResult<()> {
        let (offset, layout) = self.pop_value()?;
        self.release_slot(offset, layout);
        self.stack.reset_to(offset as usize);
        Ok(())
    }

    /// Shared epilogue for blocks and matches: release every value slot
    /// between `entry_base` and the result, slide the result down, drop
    /// the region's bindings from the table.
    fn region_epilogue(
        &mut self,
        bound_patterns: &[rill_ir::can::PatternIdx],
        entry_base: usize,
    ) -> EvalResult<()> {
        let (result_offset, result_layout) = self.pop_value()?;
        let result_size = self.cache.get(result_layout).size() as usize;
        let result_align = self.cache.get(result_layout).align();

        // Release the slots the region owned (let values, scrutinee,
        // materialized match bindings). The result itself was produced by
        // copy (with refcount bumps), so aliasing is safe.
        let dead: Vec<StackEntry> = self.entries.drain(entry_base..).collect();
        let mut base = result_offset;
        for entry in &dead {
            if let StackEntry::Value { offset, layout } = *entry {
                self.release_slot(offset, layout);
                base = base.min(offset);
            }
        }

        for pattern in bound_patterns {
            let binders = self.collect_binders(*pattern);
            if let Some(table) = self.tables.last_mut() {
                for binder in binders {
                    table.remove(&binder.raw());
                }
            }
        }

        let dst = align_up(base, result_align);
        if dst != result_offset {
            self.stack.copy_within(result_offset, dst, result_size);
        }
        self.stack.reset_to(dst as usize + result_size);
        self.push_value(dst, result_layout);
        Ok(())
    }

    // Closure construction

    fn make_closure(
        &mut self,
        lambda: CanId,
        captures: rill_ir::can::CaptureRange,
    ) -> EvalResult<()> {
        let layout_idx = self.expr_layout(lambda);
        let Layout::Closure {
            body_ref,
            params_ref,
            env,
            env_size,
            size,
            align,
        } = self.cache.get(layout_idx).clone()
        else {
            return Err(FatalError::Internal {
                message: "lambda node without a closure layout".to_owned(),
            }
            .into());
        };

        let offset = self.stack.alloc(size as usize, align as usize)?;
        self.stack.write_u32(offset, body_ref);
        self.stack.write_u32(offset + 4, params_ref);
        self.stack.write_u32(offset + 8, env_size);

        let capture_vars = self.arena.capture_list(captures).to_vec();
        debug_assert_eq!(capture_vars.len(), env.len());
        for (capture, (env_offset, env_layout)) in capture_vars.iter().zip(env) {
            let Some(&(src, src_layout)) = self
                .tables
                .last()
                .and_then(|table| table.get(&capture.bound_pattern.raw()))
            else {
                return Err(FatalError::Internal {
                    message: format!(
                        "capture `{}` has no binding at closure construction",
                        self.interner.lookup(capture.name)
                    ),
                }
                .into());
            };
            debug_assert_eq!(src_layout, env_layout);
            let member_size = self.cache.get(env_layout).size() as usize;
            let dst = offset + rill_layout::CLOSURE_HEADER_SIZE + env_offset;
            self.stack.copy_within(src, dst, member_size);
            let bytes = self.stack.slice(dst, member_size).to_vec();
            self.heap.retain_value(&bytes, env_layout, self.cache);
        }

        self.push_value(offset, layout_idx);
        Ok(())
    }

    // Helpers

    /// Copy a value into a fresh slot on top of the stack, bumping
    /// refcounts for refcounted contents.
    pub(crate) fn copy_value(&mut self, src: u32, layout: LayoutIdx) -> EvalResult<()> {
        let size = self.cache.get(layout).size() as usize;
        let align = self.cache.get(layout).align() as usize;
        let dst = self.stack.alloc(size, align)?;
        self.stack.copy_within(src, dst, size);
        let bytes = self.stack.slice(dst, size).to_vec();
        self.heap.retain_value(&bytes, layout, self.cache);
        self.push_value(dst, layout);
        Ok(())
    }

    /// Release a slot's heap references (the bytes stay until reset).
    pub(crate) fn release_slot(&mut self, offset: u32, layout: LayoutIdx) {
        let size = self.cache.get(layout).size() as usize;
        let bytes = self.stack.slice(offset, size).to_vec();
        self.heap.release_value(&bytes, layout, self.cache);
    }

    pub(crate) fn push_value(&mut self, offset: u32, layout: LayoutIdx) {
        self.entries.push(StackEntry::Value { offset, layout });
    }

    pub(crate) fn pop_value(&mut self) -> EvalResult<(u32, LayoutIdx)> {
        match self.entries.pop() {
            Some(entry) => entry.as_value(),
            None => Err(FatalError::Internal {
                message: "layout stack underflow".to_owned(),
            }
            .into()),
        }
    }

    pub(crate) fn top_value(&self) -> EvalResult<(u32, LayoutIdx)> {
        match self.entries.last() {
            Some(entry) => entry.as_value(),
            None => Err(FatalError::Internal {
                message: "layout stack is empty".to_owned(),
            }
            .into()),
        }
    }

    pub(crate) fn expr_layout(&mut self, id: CanId) -> LayoutIdx {
        self.cache
            .layout_of(self.types.expr_type(id), self.types, self.arena)
    }

    pub(crate) fn unit_layout(&mut self) -> LayoutIdx {
        self.cache.intern(Layout::Record {
            fields: Vec::new(),
            size: 0,
            align: 1,
        })
    }

    pub(crate) fn bool_layout(&mut self) -> LayoutIdx {
        self.cache.intern(Layout::Scalar {
            kind: rill_layout::ScalarKind::Bool,
            size: 1,
            align: 1,
        })
    }

    /// Number of live heap cells (test observability).
    pub fn live_heap_cells(&self) -> usize {
        self.heap.live_count()
    }

    /// Read a result value's bytes (render support).
    pub fn value_bytes(&self, value: EvalValue) -> &[u8] {
        let size = self.cache.get(value.layout).size() as usize;
        self.stack.slice(value.offset, size)
    }

    /// Dispose of a result value, releasing its heap references.
    ///
    /// Used by invariant tests; a REPL line simply drops the whole
    /// interpreter after rendering.
    pub fn dispose(&mut self, value: EvalValue) {
        self.release_slot(value.offset, value.layout);
        self.stack.reset_to(value.offset as usize);
        if matches!(self.entries.last(), Some(StackEntry::Value { .. })) {
            self.entries.pop();
        }
    }

    fn bind_local(&mut self, pattern: rill_ir::can::PatternIdx, region: Region) -> EvalResult<()> {
        let (offset, layout) = self.top_value()?;
        if !self.try_match(pattern, offset, layout)? {
            let value = crate::render::render_value(self, EvalValue { offset, layout });
            return Err(RuntimeError::PatternMatchFailed { value, region }.into());
        }
        self.bind_pattern(pattern, offset, layout)
    }
}
