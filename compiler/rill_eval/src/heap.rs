//! Refcounted heap for strings and lists.
//!
//! Stack slots never own variable-length data directly: long strings and
//! all lists live in heap cells addressed by `u32` handles. Cells carry a
//! reference count; the interpreter increments on alias (lookup copies,
//! argument passing, capture into a closure environment, storage into an
//! aggregate) and decrements on drop. A cell freed at refcount zero
//! recursively releases the references its payload holds.
//!
//! Strings use small-string optimization: values up to
//! [`STR_INLINE_MAX`](rill_layout::STR_INLINE_MAX) bytes are stored inline
//! in the 24-byte stack slot and never touch the heap.

use rill_layout::{Layout, LayoutCache, LayoutIdx, ScalarKind, STR_HEAP_MARKER, STR_INLINE_MAX};

/// Heap cell payload.
#[derive(Clone, Debug)]
pub enum HeapData {
    Str(String),
    List {
        element: LayoutIdx,
        len: u32,
        /// Packed element values, `len * element_size` bytes.
        bytes: Vec<u8>,
    },
}

#[derive(Debug)]
struct HeapCell {
    refcount: u32,
    data: HeapData,
}

/// Slab of refcounted cells with free-slot reuse.
#[derive(Default, Debug)]
pub struct Heap {
    cells: Vec<Option<HeapCell>>,
    free: Vec<u32>,
}

impl Heap {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a cell with refcount 1, returning its handle.
    pub fn alloc(&mut self, data: HeapData) -> u32 {
        let cell = HeapCell { refcount: 1, data };
        if let Some(handle) = self.free.pop() {
            self.cells[handle as usize] = Some(cell);
            handle
        } else {
            let handle = u32::try_from(self.cells.len()).unwrap_or(u32::MAX);
            self.cells.push(Some(cell));
            handle
        }
    }

    /// Read a cell's payload.
    pub fn get(&self, handle: u32) -> &HeapData {
        match &self.cells[handle as usize] {
            Some(cell) => &cell.data,
            None => panic!("use of freed heap cell {handle}"),
        }
    }

    /// Current refcount (test observability).
    pub fn refcount(&self, handle: u32) -> u32 {
        self.cells[handle as usize]
            .as_ref()
            .map_or(0, |cell| cell.refcount)
    }

    /// Number of live cells (test observability).
    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Increment a cell's refcount.
    pub fn incref(&mut self, handle: u32) {
        if let Some(cell) = self.cells.get_mut(handle as usize).and_then(Option::as_mut) {
            cell.refcount += 1;
        }
    }

    /// Decrement a cell's refcount, freeing at zero.
    ///
    /// Freeing a list releases each element's own heap references first.
    pub fn decref(&mut self, handle: u32, cache: &LayoutCache) {
        let Some(cell) = self.cells.get_mut(handle as usize).and_then(Option::as_mut) else {
            return;
        };
        debug_assert!(cell.refcount > 0, "decref of dead cell {handle}");
        cell.refcount -= 1;
        if cell.refcount > 0 {
            return;
        }
        let data = match self.cells[handle as usize].take() {
            Some(cell) => cell.data,
            None => return,
        };
        self.free.push(handle);
        if let HeapData::List {
            element,
            len,
            bytes,
        } = data
        {
            let element_size = cache.get(element).size() as usize;
            for i in 0..len as usize {
                let slot = &bytes[i * element_size..(i + 1) * element_size];
                self.release_value(slot, element, cache);
            }
        }
    }

    /// Increment every heap reference reachable from a value's bytes.
    pub fn retain_value(&mut self, bytes: &[u8], layout: LayoutIdx, cache: &LayoutCache) {
        match cache.get(layout).clone() {
            Layout::Scalar {
                kind: ScalarKind::Str,
                ..
            } => {
                if let Some(handle) = str_heap_handle(bytes) {
                    self.incref(handle);
                }
            }
            Layout::List { .. } => {
                self.incref(read_u32(bytes, 0));
            }
            Layout::Record { fields, .. } => {
                for (offset, field_layout, _) in fields {
                    let size = cache.get(field_layout).size() as usize;
                    let offset = offset as usize;
                    self.retain_value(&bytes[offset..offset + size], field_layout, cache);
                }
            }
            Layout::Tuple { elements, .. } => {
                for (offset, element_layout) in elements {
                    let size = cache.get(element_layout).size() as usize;
                    let offset = offset as usize;
                    self.retain_value(&bytes[offset..offset + size], element_layout, cache);
                }
            }
            Layout::TagUnion { variants, .. } => {
                let disc = read_u32(bytes, 0) as usize;
                if let Some((_, payload)) = variants.get(disc) {
                    for (offset, element_layout) in payload {
                        let size = cache.get(*element_layout).size() as usize;
                        let offset = *offset as usize;
                        self.retain_value(&bytes[offset..offset + size], *element_layout, cache);
                    }
                }
            }
            Layout::Closure { env, .. } => {
                for (offset, element_layout) in env {
                    let size = cache.get(element_layout).size() as usize;
                    let offset = rill_layout::CLOSURE_HEADER_SIZE as usize + offset as usize;
                    self.retain_value(&bytes[offset..offset + size], element_layout, cache);
                }
            }
            Layout::Scalar { .. } | Layout::Error => {}
        }
    }

    /// Decrement every heap reference reachable from a value's bytes.
    pub fn release_value(&mut self, bytes: &[u8], layout: LayoutIdx, cache: &LayoutCache) {
        match cache.get(layout).clone() {
            Layout::Scalar {
                kind: ScalarKind::Str,
                ..
            } => {
                if let Some(handle) = str_heap_handle(bytes) {
                    self.decref(handle, cache);
                }
            }
            Layout::List { .. } => {
                self.decref(read_u32(bytes, 0), cache);
            }
            Layout::Record { fields, .. } => {
                for (offset, field_layout, _) in fields {
                    let size = cache.get(field_layout).size() as usize;
                    let offset = offset as usize;
                    self.release_value(&bytes[offset..offset + size], field_layout, cache);
                }
            }
            Layout::Tuple { elements, .. } => {
                for (offset, element_layout) in elements {
                    let size = cache.get(element_layout).size() as usize;
                    let offset = offset as usize;
                    self.release_value(&bytes[offset..offset + size], element_layout, cache);
                }
            }
            Layout::TagUnion { variants, .. } => {
                let disc = read_u32(bytes, 0) as usize;
                if let Some((_, payload)) = variants.get(disc) {
                    for (offset, element_layout) in payload {
                        let size = cache.get(*element_layout).size() as usize;
                        let offset = *offset as usize;
                        self.release_value(&bytes[offset..offset + size], *element_layout, cache);
                    }
                }
            }
            Layout::Closure { env, .. } => {
                for (offset, element_layout) in env {
                    let size = cache.get(element_layout).size() as usize;
                    let offset = rill_layout::CLOSURE_HEADER_SIZE as usize + offset as usize;
                    self.release_value(&bytes[offset..offset + size], element_layout, cache);
                }
            }
            Layout::Scalar { .. } | Layout::Error => {}
        }
    }
}

/// Read a little-endian `u32` out of a byte slice.
#[inline]
pub fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// The heap handle of a string slot, or `None` when the string is inline.
#[inline]
pub fn str_heap_handle(slot: &[u8]) -> Option<u32> {
    if slot[rill_layout::STR_SLOT_SIZE as usize - 1] == STR_HEAP_MARKER {
        Some(read_u32(slot, 0))
    } else {
        None
    }
}

/// Encode a string into a 24-byte slot, spilling to the heap when longer
/// than the inline budget.
pub fn encode_str(text: &str, heap: &mut Heap) -> [u8; rill_layout::STR_SLOT_SIZE as usize] {
    let mut slot = [0u8; rill_layout::STR_SLOT_SIZE as usize];
    let bytes = text.as_bytes();
    if bytes.len() <= STR_INLINE_MAX as usize {
        slot[..bytes.len()].copy_from_slice(bytes);
        slot[rill_layout::STR_SLOT_SIZE as usize - 1] =
            u8::try_from(bytes.len()).unwrap_or(STR_INLINE_MAX as u8);
    } else {
        let handle = heap.alloc(HeapData::Str(text.to_owned()));
        slot[..4].copy_from_slice(&handle.to_le_bytes());
        slot[rill_layout::STR_SLOT_SIZE as usize - 1] = STR_HEAP_MARKER;
    }
    slot
}

/// Decode a string slot (inline or heap-backed).
pub fn decode_str<'a>(slot: &'a [u8], heap: &'a Heap) -> &'a str {
    match str_heap_handle(slot) {
        Some(handle) => match heap.get(handle) {
            HeapData::Str(s) => s.as_str(),
            HeapData::List { .. } => "",
        },
        None => {
            let len = slot[rill_layout::STR_SLOT_SIZE as usize - 1] as usize;
            std::str::from_utf8(&slot[..len]).unwrap_or("")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_strings_stay_inline() {
        let mut heap = Heap::new();
        let slot = encode_str("hello", &mut heap);
        assert_eq!(heap.live_count(), 0);
        assert_eq!(decode_str(&slot, &heap), "hello");
    }

    #[test]
    fn long_strings_spill_to_heap() {
        let mut heap = Heap::new();
        let text = "a string comfortably longer than twenty-three bytes";
        let slot = encode_str(text, &mut heap);
        assert_eq!(heap.live_count(), 1);
        assert_eq!(decode_str(&slot, &heap), text);
    }

    #[test]
    fn refcount_reaches_zero_frees_the_cell() {
        let mut heap = Heap::new();
        let cache = LayoutCache::new();
        let handle = heap.alloc(HeapData::Str("x".repeat(40)));
        heap.incref(handle);
        heap.decref(handle, &cache);
        assert_eq!(heap.live_count(), 1);
        heap.decref(handle, &cache);
        assert_eq!(heap.live_count(), 0);
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut heap = Heap::new();
        let cache = LayoutCache::new();
        let a = heap.alloc(HeapData::Str("first".repeat(10)));
        heap.decref(a, &cache);
        let b = heap.alloc(HeapData::Str("second".repeat(10)));
        assert_eq!(a, b);
    }
}
