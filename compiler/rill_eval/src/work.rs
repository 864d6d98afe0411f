//! Work items for the interpreter's explicit scheduler.
//!
//! The scheduler pops items LIFO. Compound expressions push a completion
//! item first and their sub-expression evaluations after it, so the
//! sub-results are on the value stack by the time the completion runs.
//! This replaces host-call-stack recursion, bounding stack growth for
//! deeply nested expressions and making evaluation state inspectable.

use rill_ir::ast::BinOp;
use rill_ir::can::{CanBranchRange, CanId, PatternIdx};
use rill_ir::Region;
use rill_layout::LayoutIdx;

/// One unit of scheduled interpreter work.
#[derive(Clone, Debug)]
pub enum WorkItem {
    /// Evaluate an expression, leaving its value on top of the stack.
    EvalExpr(CanId),
    /// Arithmetic/comparison completion: consume the top two values,
    /// push the result.
    BinopDone { op: BinOp, region: Region },
    /// `and`/`or`: inspect the evaluated lhs, short-circuit or schedule
    /// the rhs.
    ShortCircuit { op: BinOp, rhs: CanId },
    /// Unary completion: consume the top value, push the result.
    UnaryDone {
        op: rill_ir::ast::UnaryOp,
        region: Region,
    },
    /// Inspect and pop the condition, schedule the matching branch.
    IfCheckCondition {
        then_branch: CanId,
        else_branch: CanId,
    },
    /// Bind a block `let` pattern to the value on top of the stack. The
    /// value stays in place as the binding's storage.
    BindLocal { pattern: PatternIdx, region: Region },
    /// Pop and release a bare statement's value.
    DiscardValue,
    /// Block epilogue: release let slots, slide the tail result down to
    /// the block base, drop the block's bindings from the table.
    BlockEnd {
        /// `PatternIdx` of each `let`, for binding-table removal.
        let_patterns: Vec<PatternIdx>,
        /// Layout-stack length at block entry.
        entry_base: usize,
    },
    /// Push the unit value (block with no tail).
    PushUnit,
    /// Write the 24-byte call frame; the closure is on top of the stack.
    PushCallFrame {
        arg_count: u16,
        return_layout: LayoutIdx,
        region: Region,
    },
    /// Read the call frame and closure, open the per-call binding table
    /// (parameters + captures), schedule the body.
    BindParameters { region: Region },
    /// Copy the body's result into the reserved return slot.
    CopyResultToReturnSpace,
    /// Release arguments and closure environment, pop frame/args/closure,
    /// leave only the returned value; pop the binding table.
    CleanupFunction,
    /// Aggregate completions: consume the element values, build the
    /// aggregate in place. Record fields are matched to layout offsets by
    /// name (the layout's field order is the *type's* order, which can
    /// differ from this literal's source order).
    MakeRecord {
        layout: LayoutIdx,
        names: Vec<rill_ir::Name>,
    },
    MakeTuple { layout: LayoutIdx, count: u16 },
    MakeList { layout: LayoutIdx, count: u16 },
    MakeTag {
        layout: LayoutIdx,
        name: rill_ir::Name,
        count: u16,
    },
    /// Try match branches from `next_branch` against the scrutinee on top
    /// of the stack.
    MatchCheck {
        branches: CanBranchRange,
        next_branch: u16,
        region: Region,
    },
    /// Match epilogue: release the scrutinee and materialized bindings,
    /// slide the branch result down.
    MatchEnd {
        bound_patterns: Vec<PatternIdx>,
        entry_base: usize,
    },
}
