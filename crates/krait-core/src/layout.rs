//! Runtime-private object layout
//!
//! Every heap allocation starts with an [`ObjHeader`]; the object's slot
//! payload follows immediately after it:
//!
//! ```text
//! ┌─────────────────────────────────────────┐  ← ObjRef points here
//! │ ObjHeader { tag: u32, slots: u32 }      │     (type tag at offset 0)
//! ├─────────────────────────────────────────┤
//! │ slot 0 (Value)                          │
//! │ slot 1 (Value)                          │
//! │ ...                                     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! This module is the only place in the repository where these offsets are
//! assumed. They are re-derived from the header definition at compile time
//! and validated by const assertions, so a layout change in one build is
//! either picked up here or refuses to compile. Code that writes through
//! these offsets while an object is live (the no-restrict cast does) gets
//! no further checking: if the assumed layout ever disagrees with the heap's
//! actual layout, behavior is undefined. That risk is accepted, not
//! recoverable.

use crate::value::Value;
use std::mem;

/// Object header preceding every slot payload
///
/// The `tag` field is the runtime type tag: the raw id of the class the
/// object is dispatched as. `slots` is the payload length in slots. The
/// forced alignment keeps every allocation 8-byte aligned, which the tagged
/// value encoding relies on.
#[repr(C, align(8))]
pub struct ObjHeader {
    pub(crate) tag: u32,
    pub(crate) slots: u32,
}

/// Byte offset of the type tag inside an object
pub const TYPE_TAG_OFFSET: usize = 0;

/// Size of the object header in bytes
pub const HEADER_SIZE: usize = mem::size_of::<ObjHeader>();

/// Size of one object slot in bytes
pub const SLOT_SIZE: usize = mem::size_of::<Value>();

// Re-validate the assumed layout against the actual header definition.
const _: () = assert!(mem::offset_of!(ObjHeader, tag) == TYPE_TAG_OFFSET);
const _: () = assert!(HEADER_SIZE % mem::align_of::<Value>() == 0);

/// Byte offset of a slot inside an object
#[inline]
pub const fn slot_offset(index: usize) -> usize {
    HEADER_SIZE + index * SLOT_SIZE
}

/// Read an object's type tag.
///
/// # Safety
///
/// `obj` must point at a live allocation produced by [`crate::heap::Heap`].
#[inline]
pub unsafe fn read_type_tag(obj: *const u8) -> u32 {
    obj.add(TYPE_TAG_OFFSET).cast::<u32>().read()
}

/// Overwrite an object's type tag in place.
///
/// # Safety
///
/// `obj` must point at a live allocation produced by [`crate::heap::Heap`].
/// The caller asserts, unchecked, that the object's slot payload is layout
/// compatible with the class the new tag names.
#[inline]
pub unsafe fn write_type_tag(obj: *mut u8, tag: u32) {
    obj.add(TYPE_TAG_OFFSET).cast::<u32>().write(tag);
}

/// Read an object's slot count from its header.
///
/// # Safety
///
/// `obj` must point at a live allocation produced by [`crate::heap::Heap`].
#[inline]
pub unsafe fn read_slot_count(obj: *const u8) -> u32 {
    obj.add(mem::offset_of!(ObjHeader, slots)).cast::<u32>().read()
}

/// Read a slot value.
///
/// # Safety
///
/// `obj` must point at a live allocation and `index` must be within the
/// object's slot count.
#[inline]
pub unsafe fn read_slot(obj: *const u8, index: usize) -> Value {
    obj.add(slot_offset(index)).cast::<Value>().read()
}

/// Write a slot value.
///
/// # Safety
///
/// `obj` must point at a live allocation and `index` must be within the
/// object's slot count.
#[inline]
pub unsafe fn write_slot(obj: *mut u8, index: usize, value: Value) {
    obj.add(slot_offset(index)).cast::<Value>().write(value);
}
