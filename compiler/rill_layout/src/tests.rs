use pretty_assertions::assert_eq;
use rill_ir::StringInterner;

use super::*;

fn pipeline(source: &str) -> (rill_canon::CanonResult, TypeCheckResult, StringInterner) {
    let interner = StringInterner::new();
    let parsed = rill_parse::parse_expr(source, &interner);
    assert!(!parsed.has_errors(), "parse errors: {:?}", parsed.errors);
    let canon = rill_canon::canonicalize_expr(&parsed.ast, parsed.root, &interner);
    assert!(!canon.has_errors(), "canon errors: {:?}", canon.diagnostics);
    let types = rill_types::solve(&canon.arena, canon.root, &interner);
    assert!(!types.has_errors(), "type errors: {:?}", types.diagnostics);
    (canon, types, interner)
}

#[test]
fn align_up_rounds_to_boundaries() {
    assert_eq!(align_up(0, 8), 0);
    assert_eq!(align_up(1, 8), 8);
    assert_eq!(align_up(8, 8), 8);
    assert_eq!(align_up(9, 4), 12);
    assert_eq!(align_up(5, 1), 5);
}

#[test]
fn int_layout_is_eight_bytes() {
    let (canon, types, _) = pipeline("42");
    let mut cache = LayoutCache::new();
    let idx = cache.layout_of(types.expr_type(canon.root), &types, &canon.arena);
    let layout = cache.get(idx);
    assert_eq!(layout.size(), 8);
    assert_eq!(layout.align(), 8);
    assert!(!layout.is_refcounted());
}

#[test]
fn bool_layout_is_one_byte() {
    let (canon, types, _) = pipeline("true");
    let mut cache = LayoutCache::new();
    let idx = cache.layout_of(types.expr_type(canon.root), &types, &canon.arena);
    assert_eq!(cache.get(idx).size(), 1);
}

#[test]
fn str_layout_is_the_sso_slot() {
    let (canon, types, _) = pipeline("\"hello\"");
    let mut cache = LayoutCache::new();
    let idx = cache.layout_of(types.expr_type(canon.root), &types, &canon.arena);
    let layout = cache.get(idx);
    assert_eq!(layout.size(), STR_SLOT_SIZE);
    assert!(layout.is_refcounted());
}

#[test]
fn record_fields_pack_with_alignment() {
    // bool (1 byte) then int (8 bytes, aligned to 8) → size 16, align 8.
    let (canon, types, _) = pipeline("{ a: true, b: 2 }");
    let mut cache = LayoutCache::new();
    let idx = cache.layout_of(types.expr_type(canon.root), &types, &canon.arena);
    match cache.get(idx) {
        Layout::Record {
            fields,
            size,
            align,
        } => {
            assert_eq!(fields[0].0, 0);
            assert_eq!(fields[1].0, 8);
            assert_eq!(*size, 16);
            assert_eq!(*align, 8);
        }
        other => panic!("expected record layout, got {other:?}"),
    }
}

#[test]
fn unit_record_is_zero_sized() {
    let (canon, types, _) = pipeline("()");
    let mut cache = LayoutCache::new();
    let idx = cache.layout_of(types.expr_type(canon.root), &types, &canon.arena);
    assert_eq!(cache.get(idx).size(), 0);
}

#[test]
fn same_type_shares_one_layout_entry() {
    // Two separately allocated Int types resolve to one layout index.
    let (canon, types, _) = pipeline("(1 + 2) * (3 + 4)");
    let mut cache = LayoutCache::new();
    let mut indices = Vec::new();
    for (id, _) in canon.arena.expr_iter() {
        let ty = types.expr_type(id);
        if ty.is_valid() {
            indices.push(cache.layout_of(ty, &types, &canon.arena));
        }
    }
    assert!(!indices.is_empty());
    let first = indices[0];
    assert!(indices.iter().all(|&idx| idx == first));
}

#[test]
fn closure_env_size_sums_capture_layouts() {
    // Inner lambda captures one i64: env_size 8, slot = 12 + 8 padded.
    let (canon, types, _) = pipeline("|x| |y| x + y");
    let mut cache = LayoutCache::new();
    let mut closure_sizes = Vec::new();
    for (id, expr) in canon.arena.expr_iter() {
        if matches!(expr, rill_ir::can::CanExpr::Lambda { .. }) {
            let idx = cache.layout_of(types.expr_type(id), &types, &canon.arena);
            if let Layout::Closure { env_size, size, .. } = cache.get(idx) {
                closure_sizes.push((*env_size, *size));
            }
        }
    }
    // Inner (captures x: 8 bytes) and outer (no captures).
    assert!(closure_sizes.contains(&(8, 24)), "got {closure_sizes:?}");
    assert!(closure_sizes.contains(&(0, 12)), "got {closure_sizes:?}");
}

#[test]
fn list_layout_is_the_three_word_slot() {
    let (canon, types, _) = pipeline("[1, 2, 3]");
    let mut cache = LayoutCache::new();
    let idx = cache.layout_of(types.expr_type(canon.root), &types, &canon.arena);
    match cache.get(idx) {
        Layout::List { size, .. } => assert_eq!(*size, LIST_SLOT_SIZE),
        other => panic!("expected list layout, got {other:?}"),
    }
    assert!(cache.get(idx).is_refcounted());
}

#[test]
fn tag_union_has_discriminant_plus_payload() {
    let (canon, types, _) = pipeline("if true Ok(1) else Err(0)");
    let mut cache = LayoutCache::new();
    let idx = cache.layout_of(types.expr_type(canon.root), &types, &canon.arena);
    match cache.get(idx) {
        Layout::TagUnion {
            variants,
            size,
            align,
        } => {
            assert_eq!(variants.len(), 2);
            // disc (4) + pad (4) + i64 payload (8) = 16.
            assert_eq!(*size, 16);
            assert_eq!(*align, 8);
        }
        other => panic!("expected tag union layout, got {other:?}"),
    }
}
