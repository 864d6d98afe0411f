//! Aggregate completions: records, tuples, lists, tags.
//!
//! Each completion consumes its element slots (move semantics: bytes are
//! relocated, refcounts untouched), assembles the aggregate in a scratch
//! buffer, then rebuilds the stack from the first element's base so the
//! aggregate is the only remaining value.

use rill_ir::Name;
use rill_layout::{Layout, LayoutIdx, LIST_SLOT_SIZE};

use crate::errors::{EvalResult, FatalError};
use crate::heap::HeapData;

use super::Interpreter;

impl Interpreter<'_> {
    /// Pop `count` element entries, returning them in evaluation order
    /// together with the lowest slot offset (the rebuild base).
    fn take_elements(&mut self, count: usize) -> EvalResult<(Vec<(u32, LayoutIdx)>, u32)> {
        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            elements.push(self.pop_value()?);
        }
        elements.reverse();
        let base = elements
            .first()
            .map_or_else(|| u32::try_from(self.stack.used()).unwrap_or(u32::MAX), |e| e.0);
        Ok((elements, base))
    }

    /// Copy each element's bytes into `buffer` at its layout offset.
    fn pack(&self, elements: &[(u32, LayoutIdx)], offsets: &[u32], buffer: &mut [u8]) {
        for ((slot, layout), &offset) in elements.iter().zip(offsets) {
            let size = self.cache.get(*layout).size() as usize;
            let offset = offset as usize;
            buffer[offset..offset + size].copy_from_slice(self.stack.slice(*slot, size));
        }
    }

    fn finish_aggregate(
        &mut self,
        base: u32,
        layout: LayoutIdx,
        buffer: &[u8],
    ) -> EvalResult<()> {
        let align = self.cache.get(layout).align() as usize;
        self.stack.reset_to(base as usize);
        let offset = self.stack.alloc(buffer.len(), align)?;
        self.stack.write(offset, buffer);
        self.push_value(offset, layout);
        Ok(())
    }

    pub(super) fn make_record(&mut self, layout: LayoutIdx, names: &[Name]) -> EvalResult<()> {
        let Layout::Record { fields, size, .. } = self.cache.get(layout).clone() else {
            return Err(FatalError::Internal {
                message: "record literal without a record layout".to_owned(),
            }
            .into());
        };
        let (elements, base) = self.take_elements(names.len())?;
        // Elements arrive in this literal's source order; the layout's
        // field order is the type's. Match by name.
        let mut offsets = Vec::with_capacity(names.len());
        for name in names {
            let Some((offset, _, _)) = fields.iter().find(|(_, _, n)| n == name) else {
                return Err(FatalError::Internal {
                    message: "record field missing from its layout".to_owned(),
                }
                .into());
            };
            offsets.push(*offset);
        }
        let mut buffer = vec![0u8; size as usize];
        self.pack(&elements, &offsets, &mut buffer);
        self.finish_aggregate(base, layout, &buffer)
    }

    pub(super) fn make_tuple(&mut self, layout: LayoutIdx, count: u16) -> EvalResult<()> {
        let Layout::Tuple {
            elements: slots,
            size,
            ..
        } = self.cache.get(layout).clone()
        else {
            return Err(FatalError::Internal {
                message: "tuple literal without a tuple layout".to_owned(),
            }
            .into());
        };
        let (elements, base) = self.take_elements(count as usize)?;
        let offsets: Vec<u32> = slots.iter().map(|(offset, _)| *offset).collect();
        let mut buffer = vec![0u8; size as usize];
        self.pack(&elements, &offsets, &mut buffer);
        self.finish_aggregate(base, layout, &buffer)
    }

    pub(super) fn make_list(&mut self, layout: LayoutIdx, count: u16) -> EvalResult<()> {
        let Layout::List { element, .. } = self.cache.get(layout).clone() else {
            return Err(FatalError::Internal {
                message: "list literal without a list layout".to_owned(),
            }
            .into());
        };
        let (elements, base) = self.take_elements(count as usize)?;
        let element_size = self.cache.get(element).size() as usize;
        let mut bytes = vec![0u8; element_size * elements.len()];
        for (i, (slot, _)) in elements.iter().enumerate() {
            bytes[i * element_size..(i + 1) * element_size]
                .copy_from_slice(self.stack.slice(*slot, element_size));
        }
        let len = u32::try_from(elements.len()).unwrap_or(u32::MAX);
        let handle = self.heap.alloc(HeapData::List {
            element,
            len,
            bytes,
        });

        self.stack.reset_to(base as usize);
        let offset = self.stack.alloc(LIST_SLOT_SIZE as usize, 4)?;
        self.stack.write_u32(offset, handle);
        self.stack.write_u32(offset + 4, len);
        self.stack.write_u32(offset + 8, len); // capacity == length
        self.push_value(offset, layout);
        Ok(())
    }

    pub(super) fn make_tag(&mut self, layout: LayoutIdx, name: Name, count: u16) -> EvalResult<()> {
        let Layout::TagUnion { variants, size, .. } = self.cache.get(layout).clone() else {
            return Err(FatalError::Internal {
                message: "tag literal without a tag-union layout".to_owned(),
            }
            .into());
        };
        let Some(disc) = variants.iter().position(|(n, _)| *n == name) else {
            return Err(FatalError::Internal {
                message: "tag variant missing from its layout".to_owned(),
            }
            .into());
        };
        let (elements, base) = self.take_elements(count as usize)?;
        let payload = &variants[disc].1;
        let offsets: Vec<u32> = payload.iter().map(|(offset, _)| *offset).collect();
        let mut buffer = vec![0u8; size as usize];
        buffer[..4].copy_from_slice(&u32::try_from(disc).unwrap_or(0).to_le_bytes());
        self.pack(&elements, &offsets, &mut buffer);
        self.finish_aggregate(base, layout, &buffer)
    }
}
