//! No-restrict cast
//!
//! Rewrites an object's embedded type tag so dispatch treats it as an
//! instance of another class. The tag value is copied from a template: a
//! cached zero-initialized sentinel of the target class, or any
//! already-constructed instance of it. No slot is touched or validated;
//! the caller asserts layout compatibility, unchecked.

use dashmap::DashMap;
use krait_core::{layout, ClassId, CoreResult, ObjRef, Runtime, Value};

/// Cache of per-class cast sentinels
///
/// One zero-initialized, never-escaping instance per distinct target class,
/// created on first use and kept for the toolkit's lifetime. Insertion is
/// insert-if-absent; a duplicate sentinel created under a racing first use
/// would be interchangeable with the cached one, so the race is harmless.
pub(crate) struct SentinelCache {
    map: DashMap<u32, Value>,
}

impl SentinelCache {
    pub(crate) fn new() -> Self {
        Self {
            map: DashMap::new(),
        }
    }

    /// Sentinel for `class`, creating it through the bare allocation path
    /// on first use. Fails when the class cannot be bare-allocated
    /// (unknown or abstract).
    pub(crate) fn get_or_create(&self, rt: &mut Runtime, class: ClassId) -> CoreResult<ObjRef> {
        if let Some(existing) = self.map.get(&class.as_u32()).and_then(|v| v.as_obj()) {
            return Ok(existing);
        }
        let sentinel = rt.allocate_bare(class)?;
        self.map
            .entry(class.as_u32())
            .or_insert_with(|| sentinel.as_value());
        Ok(sentinel)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }
}

/// Rewrite `obj`'s type tag to match an already-constructed instance of the
/// target class.
///
/// Returns the same reference; the tag write is the only mutation. After
/// the call, type dispatch on `obj` resolves against the template's class.
/// The object's slots are neither touched nor validated against the target
/// class's layout; on a mismatch, later slot access is undefined.
pub fn cast_unchecked_like(template: ObjRef, obj: ObjRef) -> ObjRef {
    unsafe {
        let tag = layout::read_type_tag(template.as_ptr());
        layout::write_type_tag(obj.as_ptr(), tag);
    }
    obj
}
