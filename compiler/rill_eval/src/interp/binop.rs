//! Arithmetic and comparison completions.
//!
//! A completion consumes the top two stack slots (rhs on top), computes
//! with the operands' precision, pops them (releasing refcounted
//! strings), and pushes the result.

use rill_ir::ast::{BinOp, UnaryOp};
use rill_ir::can::IntPrecision;
use rill_ir::Region;
use rill_layout::{Layout, ScalarKind};

use crate::errors::{EvalResult, FatalError, RuntimeError};
use crate::heap::{decode_str, encode_str};
use crate::work::WorkItem;

use super::Interpreter;

/// Sign-extend a little-endian slot of `size` bytes into an `i64`.
pub(crate) fn read_int(bytes: &[u8], precision: IntPrecision) -> i64 {
    let size = precision.size();
    let mut buf = [0u8; 8];
    buf[..size].copy_from_slice(&bytes[..size]);
    let raw = i64::from_le_bytes(buf);
    if precision.is_signed() && size < 8 {
        // Sign-extend from the slot's top bit.
        let shift = (8 - size) * 8;
        (raw << shift) >> shift
    } else {
        raw
    }
}

/// Read an `f64` from a fraction slot.
pub(crate) fn read_frac(bytes: &[u8], precision: rill_ir::can::FracPrecision) -> f64 {
    match precision {
        rill_ir::can::FracPrecision::F64 => f64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]),
        rill_ir::can::FracPrecision::F32 => {
            f64::from(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        }
    }
}

impl Interpreter<'_> {
    pub(super) fn binop_done(&mut self, op: BinOp, region: Region) -> EvalResult<()> {
        let (rhs_offset, rhs_layout) = self.pop_value()?;
        let (lhs_offset, lhs_layout) = self.pop_value()?;
        let lhs = self.cache.get(lhs_layout).clone();

        match lhs {
            Layout::Scalar {
                kind: ScalarKind::Int(precision),
                size,
                ..
            } => {
                let a = read_int(self.stack.slice(lhs_offset, size as usize), precision);
                let b = read_int(self.stack.slice(rhs_offset, size as usize), precision);
                self.stack.reset_to(lhs_offset as usize);
                match int_result(op, a, b, region)? {
                    Computed::Int(value) => {
                        let offset = self
                            .stack
                            .alloc(size as usize, precision.align())?;
                        self.stack.write(offset, &value.to_le_bytes()[..size as usize]);
                        self.push_value(offset, lhs_layout);
                    }
                    Computed::Bool(value) => self.push_bool(value)?,
                    Computed::Frac(_) => {
                        return Err(FatalError::Internal {
                            message: "integer operands produced a fraction".to_owned(),
                        }
                        .into())
                    }
                }
                Ok(())
            }
            Layout::Scalar {
                kind: ScalarKind::Frac(precision),
                size,
                ..
            } => {
                let a = read_frac(self.stack.slice(lhs_offset, size as usize), precision);
                let b = read_frac(self.stack.slice(rhs_offset, size as usize), precision);
                self.stack.reset_to(lhs_offset as usize);
                match frac_result(op, a, b, region)? {
                    Computed::Frac(value) => {
                        let offset = self.stack.alloc(8, 8)?;
                        self.stack.write(offset, &value.to_le_bytes());
                        self.push_value(offset, lhs_layout);
                    }
                    Computed::Bool(value) => self.push_bool(value)?,
                    Computed::Int(_) => {
                        return Err(FatalError::Internal {
                            message: "fraction operands produced an integer".to_owned(),
                        }
                        .into())
                    }
                }
                Ok(())
            }
            Layout::Scalar {
                kind: ScalarKind::Bool,
                ..
            } => {
                let a = self.stack.slice(lhs_offset, 1)[0] != 0;
                let b = self.stack.slice(rhs_offset, 1)[0] != 0;
                self.stack.reset_to(lhs_offset as usize);
                match op {
                    BinOp::Eq => self.push_bool(a == b),
                    BinOp::Ne => self.push_bool(a != b),
                    _ => Err(RuntimeError::UnsupportedOperation {
                        op: op.symbol(),
                        region,
                    }
                    .into()),
                }
            }
            Layout::Scalar {
                kind: ScalarKind::Str,
                size,
                ..
            } => {
                let a = decode_str(self.stack.slice(lhs_offset, size as usize), &self.heap)
                    .to_owned();
                let b = decode_str(self.stack.slice(rhs_offset, size as usize), &self.heap)
                    .to_owned();
                // Operands are consumed: release heap-backed slots.
                self.release_slot(rhs_offset, rhs_layout);
                self.release_slot(lhs_offset, lhs_layout);
                self.stack.reset_to(lhs_offset as usize);
                match op {
                    BinOp::Add => {
                        let mut joined = a;
                        joined.push_str(&b);
                        let slot = encode_str(&joined, &mut self.heap);
                        let offset = self
                            .stack
                            .alloc(rill_layout::STR_SLOT_SIZE as usize, 8)?;
                        self.stack.write(offset, &slot);
                        self.push_value(offset, lhs_layout);
                        Ok(())
                    }
                    BinOp::Eq => self.push_bool(a == b),
                    BinOp::Ne => self.push_bool(a != b),
                    _ => Err(RuntimeError::UnsupportedOperation {
                        op: op.symbol(),
                        region,
                    }
                    .into()),
                }
            }
            _ => Err(RuntimeError::UnsupportedOperation {
                op: op.symbol(),
                region,
            }
            .into()),
        }
    }

    pub(super) fn short_circuit(&mut self, op: BinOp, rhs: rill_ir::can::CanId) -> EvalResult<()> {
        let (offset, _) = self.pop_value()?;
        let lhs = self.stack.slice(offset, 1)[0] != 0;
        self.stack.reset_to(offset as usize);
        let decided = match op {
            BinOp::And => !lhs,
            BinOp::Or => lhs,
            _ => {
                return Err(FatalError::Internal {
                    message: "short-circuit completion for a strict operator".to_owned(),
                }
                .into())
            }
        };
        if decided {
            self.push_bool(lhs)
        } else {
            self.work.push(WorkItem::EvalExpr(rhs));
            Ok(())
        }
    }

    pub(super) fn unary_done(&mut self, op: UnaryOp, region: Region) -> EvalResult<()> {
        let (offset, layout) = self.pop_value()?;
        let shape = self.cache.get(layout).clone();
        match (op, shape) {
            (
                UnaryOp::Neg,
                Layout::Scalar {
                    kind: ScalarKind::Int(precision),
                    size,
                    ..
                },
            ) => {
                let value = read_int(self.stack.slice(offset, size as usize), precision);
                let negated = value.checked_neg().ok_or(RuntimeError::ArithmeticOverflow {
                    op: "-",
                    region,
                })?;
                self.stack.reset_to(offset as usize);
                let dst = self.stack.alloc(size as usize, precision.align())?;
                self.stack
                    .write(dst, &negated.to_le_bytes()[..size as usize]);
                self.push_value(dst, layout);
                Ok(())
            }
            (
                UnaryOp::Neg,
                Layout::Scalar {
                    kind: ScalarKind::Frac(precision),
                    size,
                    ..
                },
            ) => {
                let value = read_frac(self.stack.slice(offset, size as usize), precision);
                self.stack.reset_to(offset as usize);
                let dst = self.stack.alloc(8, 8)?;
                self.stack.write(dst, &(-value).to_le_bytes());
                self.push_value(dst, layout);
                Ok(())
            }
            (
                UnaryOp::Not,
                Layout::Scalar {
                    kind: ScalarKind::Bool,
                    ..
                },
            ) => {
                let value = self.stack.slice(offset, 1)[0] != 0;
                self.stack.reset_to(offset as usize);
                self.push_bool(!value)
            }
            _ => Err(RuntimeError::UnsupportedOperation {
                op: op.symbol(),
                region,
            }
            .into()),
        }
    }

    fn push_bool(&mut self, value: bool) -> EvalResult<()> {
        let layout = self.bool_layout();
        let offset = self.stack.alloc(1, 1)?;
        self.stack.write(offset, &[u8::from(value)]);
        self.push_value(offset, layout);
        Ok(())
    }
}

enum Computed {
    Int(i64),
    Frac(f64),
    Bool(bool),
}

fn int_result(op: BinOp, a: i64, b: i64, region: Region) -> EvalResult<Computed> {
    let overflow = |op: &'static str| RuntimeError::ArithmeticOverflow { op, region };
    Ok(match op {
        BinOp::Add => Computed::Int(a.checked_add(b).ok_or_else(|| overflow("+"))?),
        BinOp::Sub => Computed::Int(a.checked_sub(b).ok_or_else(|| overflow("-"))?),
        BinOp::Mul => Computed::Int(a.checked_mul(b).ok_or_else(|| overflow("*"))?),
        BinOp::DivTrunc => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero { region }.into());
            }
            Computed::Int(a.checked_div(b).ok_or_else(|| overflow("//"))?)
        }
        BinOp::Rem => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero { region }.into());
            }
            Computed::Int(a.checked_rem(b).ok_or_else(|| overflow("%"))?)
        }
        BinOp::Div => {
            return Err(RuntimeError::UnsupportedOperation { op: "/", region }.into());
        }
        BinOp::Eq => Computed::Bool(a == b),
        BinOp::Ne => Computed::Bool(a != b),
        BinOp::Lt => Computed::Bool(a < b),
        BinOp::Le => Computed::Bool(a <= b),
        BinOp::Gt => Computed::Bool(a > b),
        BinOp::Ge => Computed::Bool(a >= b),
        BinOp::And | BinOp::Or => {
            return Err(FatalError::Internal {
                message: "strict completion for a short-circuit operator".to_owned(),
            }
            .into())
        }
    })
}

#[expect(clippy::float_cmp, reason = "IEEE equality is the language's `==`")]
fn frac_result(op: BinOp, a: f64, b: f64, region: Region) -> EvalResult<Computed> {
    Ok(match op {
        BinOp::Add => Computed::Frac(a + b),
        BinOp::Sub => Computed::Frac(a - b),
        BinOp::Mul => Computed::Frac(a * b),
        BinOp::Div => Computed::Frac(a / b),
        BinOp::Eq => Computed::Bool(a == b),
        BinOp::Ne => Computed::Bool(a != b),
        BinOp::Lt => Computed::Bool(a < b),
        BinOp::Le => Computed::Bool(a <= b),
        BinOp::Gt => Computed::Bool(a > b),
        BinOp::Ge => Computed::Bool(a >= b),
        BinOp::DivTrunc | BinOp::Rem => {
            return Err(RuntimeError::UnsupportedOperation {
                op: op.symbol(),
                region,
            }
            .into())
        }
        BinOp::And | BinOp::Or => {
            return Err(FatalError::Internal {
                message: "strict completion for a short-circuit operator".to_owned(),
            }
            .into())
        }
    })
}
