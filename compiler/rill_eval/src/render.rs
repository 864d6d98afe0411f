//! Rendering runtime values for display.
//!
//! The REPL prints `value : Type`; this module produces the value half by
//! walking the result's layout over its bytes.

use std::fmt::Write as _;

use rill_layout::{Layout, LayoutIdx, ScalarKind};

use crate::heap::{decode_str, read_u32, HeapData};
use crate::interp::binop::{read_frac, read_int};
use crate::interp::{EvalValue, Interpreter};

/// Render a result value.
pub fn render_value(interp: &Interpreter<'_>, value: EvalValue) -> String {
    let size = interp.cache.get(value.layout).size() as usize;
    let bytes = interp.stack.slice(value.offset, size).to_vec();
    let mut out = String::new();
    render_bytes(interp, &bytes, value.layout, &mut out);
    out
}

fn render_bytes(interp: &Interpreter<'_>, bytes: &[u8], layout: LayoutIdx, out: &mut String) {
    match interp.cache.get(layout).clone() {
        Layout::Scalar { kind, .. } => match kind {
            ScalarKind::Bool => {
                let _ = write!(out, "{}", bytes[0] != 0);
            }
            ScalarKind::Int(precision) => {
                let value = read_int(bytes, precision);
                if precision.is_signed() {
                    let _ = write!(out, "{value}");
                } else {
                    #[expect(clippy::cast_sign_loss, reason = "unsigned slot read back raw")]
                    let unsigned = value as u64;
                    let _ = write!(out, "{unsigned}");
                }
            }
            ScalarKind::Frac(precision) => {
                let value = read_frac(bytes, precision);
                let _ = write!(out, "{value:?}");
            }
            ScalarKind::Str => {
                let text = decode_str(bytes, &interp.heap);
                let _ = write!(out, "{text:?}");
            }
        },
        Layout::Record { fields, .. } => {
            if fields.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{ ");
            for (i, (offset, field_layout, name)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{}: ", interp.interner.lookup(*name));
                let size = interp.cache.get(*field_layout).size() as usize;
                let offset = *offset as usize;
                render_bytes(interp, &bytes[offset..offset + size], *field_layout, out);
            }
            out.push_str(" }");
        }
        Layout::Tuple { elements, .. } => {
            out.push('(');
            for (i, (offset, element_layout)) in elements.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let size = interp.cache.get(*element_layout).size() as usize;
                let offset = *offset as usize;
                render_bytes(interp, &bytes[offset..offset + size], *element_layout, out);
            }
            out.push(')');
        }
        Layout::List { element, .. } => {
            let handle = read_u32(bytes, 0);
            let HeapData::List {
                bytes: cell_bytes,
                len,
                ..
            } = interp.heap.get(handle)
            else {
                out.push_str("[]");
                return;
            };
            let element_size = interp.cache.get(element).size() as usize;
            out.push('[');
            for i in 0..*len as usize {
                if i > 0 {
                    out.push_str(", ");
                }
                let slot = &cell_bytes[i * element_size..(i + 1) * element_size];
                render_bytes(interp, slot, element, out);
            }
            out.push(']');
        }
        Layout::TagUnion { variants, .. } => {
            let disc = read_u32(bytes, 0) as usize;
            let Some((name, payload)) = variants.get(disc) else {
                out.push_str("<tag>");
                return;
            };
            out.push_str(interp.interner.lookup(*name));
            if !payload.is_empty() {
                out.push('(');
                for (i, (offset, element_layout)) in payload.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let size = interp.cache.get(*element_layout).size() as usize;
                    let offset = *offset as usize;
                    render_bytes(interp, &bytes[offset..offset + size], *element_layout, out);
                }
                out.push(')');
            }
        }
        Layout::Closure { .. } => out.push_str("<function>"),
        Layout::Error => out.push_str("<error>"),
    }
}
