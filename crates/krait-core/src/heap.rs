//! Heap allocator and object references
//!
//! The heap hands out [`ObjRef`] values: thin, copyable pointers to
//! header-prefixed allocations (see [`crate::layout`]). Allocations are
//! owned by the heap and freed when it is dropped; there is no collector.

use crate::layout::{self, ObjHeader};
use crate::value::Value;
use crate::{CoreError, CoreResult};
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::fmt;
use std::ptr::NonNull;

/// A reference to a heap-allocated object
///
/// # Safety
///
/// - The pointer must always point at memory allocated by a [`Heap`]
/// - The referent lives until the owning heap is dropped; holding an
///   `ObjRef` past that point and using it is undefined behavior
/// - An `ObjRef` is confined to the thread owning its runtime
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef(NonNull<u8>);

impl ObjRef {
    /// Wrap a raw allocation pointer (used by the heap allocator).
    ///
    /// # Safety
    ///
    /// The pointer must point at a live, header-initialized allocation.
    #[inline]
    unsafe fn from_raw(ptr: NonNull<u8>) -> Self {
        Self(ptr)
    }

    /// Rebuild a reference from an address previously taken via [`Self::addr`].
    #[inline]
    pub(crate) fn from_addr(addr: usize) -> Option<Self> {
        NonNull::new(addr as *mut u8).map(Self)
    }

    /// Get the address as usize (for tagging/comparison)
    #[inline]
    pub fn addr(&self) -> usize {
        self.0.as_ptr() as usize
    }

    /// Get the raw allocation pointer
    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.0.as_ptr()
    }

    /// Read the raw class id this object is currently tagged with
    #[inline]
    pub fn raw_tag(&self) -> u32 {
        unsafe { layout::read_type_tag(self.as_ptr()) }
    }

    /// Number of slots in this object's payload
    #[inline]
    pub fn slot_count(&self) -> usize {
        unsafe { layout::read_slot_count(self.as_ptr()) as usize }
    }

    /// Read a slot, bounds-checked against the header
    pub fn get(&self, index: usize) -> CoreResult<Value> {
        let len = self.slot_count();
        if index < len {
            Ok(unsafe { layout::read_slot(self.as_ptr(), index) })
        } else {
            Err(CoreError::SlotOutOfBounds { index, len })
        }
    }

    /// Write a slot, bounds-checked against the header
    ///
    /// Writes go through a raw pointer, so a shared `ObjRef` suffices; the
    /// heap's memory is never aliased by Rust references.
    pub fn set(&self, index: usize, value: Value) -> CoreResult<()> {
        let len = self.slot_count();
        if index < len {
            unsafe { layout::write_slot(self.as_ptr(), index, value) };
            Ok(())
        } else {
            Err(CoreError::SlotOutOfBounds { index, len })
        }
    }

    /// Wrap this reference as a tagged [`Value`]
    #[inline]
    pub fn as_value(&self) -> Value {
        Value::obj(*self)
    }
}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjRef").field(&self.0).finish()
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjRef({:#x})", self.addr())
    }
}

/// Heap allocator for runtime objects
pub struct Heap {
    /// All allocations and their layouts, for deallocation on drop
    allocations: Vec<(NonNull<u8>, Layout)>,

    /// Total bytes allocated
    allocated_bytes: usize,
}

impl Heap {
    /// Create a new empty heap
    pub fn new() -> Self {
        Self {
            allocations: Vec::new(),
            allocated_bytes: 0,
        }
    }

    /// Allocate an object with the given raw class tag and slot count.
    ///
    /// The payload comes back zeroed, which the value encoding defines as
    /// all-null slots. This is also the bare allocation path used for cast
    /// sentinels: no constructor runs.
    ///
    /// # Panics
    ///
    /// Panics if the allocator reports out of memory.
    pub fn alloc(&mut self, raw_tag: u32, slots: usize) -> ObjRef {
        let combined = Self::layout_for(slots);

        let ptr = unsafe { alloc_zeroed(combined) };
        let Some(ptr) = NonNull::new(ptr) else {
            panic!("Out of memory");
        };

        // Initialize the header; slots stay zeroed (= null values)
        unsafe {
            ptr.as_ptr().cast::<ObjHeader>().write(ObjHeader {
                tag: raw_tag,
                slots: slots as u32,
            });
        }

        self.allocations.push((ptr, combined));
        self.allocated_bytes += combined.size();

        unsafe { ObjRef::from_raw(ptr) }
    }

    fn layout_for(slots: usize) -> Layout {
        let header = Layout::new::<ObjHeader>();
        let payload = Layout::array::<Value>(slots).expect("Failed to calculate layout");
        let (combined, payload_offset) = header.extend(payload).expect("Failed to calculate layout");
        debug_assert_eq!(payload_offset, layout::slot_offset(0));
        combined
    }

    /// Get total allocated bytes
    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes
    }

    /// Get number of live allocations
    pub fn allocation_count(&self) -> usize {
        self.allocations.len()
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        for (ptr, combined) in self.allocations.drain(..) {
            unsafe { dealloc(ptr.as_ptr(), combined) };
        }
    }
}
