//! Human-readable type rendering.
//!
//! Used by the REPL (`42 : Int`), type-mismatch messages, and the `TYPES`
//! snapshot section.

use rill_ir::can::{FracPrecision, IntPrecision};
use rill_ir::StringInterner;

use crate::pool::{Pool, Type, TypeIdx};

/// Render a solved type.
pub fn type_string(pool: &Pool, idx: TypeIdx, interner: &StringInterner) -> String {
    if !idx.is_valid() {
        return "?".to_owned();
    }
    render(pool, idx, interner, false)
}

fn render(pool: &Pool, idx: TypeIdx, interner: &StringInterner, nested: bool) -> String {
    match pool.resolved(idx) {
        Type::Var | Type::Link(_) => "*".to_owned(),
        Type::Int(IntPrecision::I64) => "Int".to_owned(),
        Type::Int(precision) => format!("Int {}", precision.type_name()),
        Type::Frac(FracPrecision::F64) => "Frac".to_owned(),
        Type::Frac(precision) => format!("Frac {}", precision.type_name()),
        Type::Bool => "Bool".to_owned(),
        Type::Str => "Str".to_owned(),
        Type::Record(fields) => {
            if fields.is_empty() {
                return "{}".to_owned();
            }
            let body = fields
                .iter()
                .map(|(name, ty)| {
                    format!("{} : {}", interner.lookup(*name), render(pool, *ty, interner, false))
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{ {body} }}")
        }
        Type::Tuple(elements) => {
            let body = elements
                .iter()
                .map(|ty| render(pool, *ty, interner, false))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({body})")
        }
        Type::List(element) => {
            let inner = render(pool, *element, interner, true);
            format!("List {inner}")
        }
        Type::TagUnion(variants) => {
            let body = variants
                .iter()
                .map(|(name, payload)| {
                    if payload.is_empty() {
                        interner.lookup(*name).to_owned()
                    } else {
                        let args = payload
                            .iter()
                            .map(|ty| render(pool, *ty, interner, true))
                            .collect::<Vec<_>>()
                            .join(" ");
                        format!("{} {args}", interner.lookup(*name))
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("[{body}]")
        }
        Type::Func { params, ret, .. } => {
            let params_str = params
                .iter()
                .map(|ty| render(pool, *ty, interner, true))
                .collect::<Vec<_>>()
                .join(", ");
            let ret_str = render(pool, *ret, interner, true);
            if nested {
                format!("({params_str} -> {ret_str})")
            } else {
                format!("{params_str} -> {ret_str}")
            }
        }
        Type::Error => "<error>".to_owned(),
    }
}
