//! Value representation using tagged words (64-bit)
//!
//! Values are stored in 64 bits with the lowest 3 bits used as a type tag.
//!
//! # Encoding Strategy
//!
//! ```text
//! null:     0000000000000000000000000000000000000000000000000000000000000
//! i32:      000000000000000000000000000000iiiiiiiiiiiiiiiiiiiiiiiiiii001
//! bool:     00000000000000000000000000000000000000000000000000000000b010
//! str:      000000000000000000000000000000ssssssssssssssssssssssssss011
//! object:   ppppppppppppppppppppppppppppppppppppppppppppppppppppppppp100
//! ```
//!
//! Object pointers must be 8-byte aligned (guaranteed by the heap), so the
//! low 3 bits of the address are free to carry the tag. `null` is the
//! all-zero word: zero-initialized object memory reads back as null slots,
//! which is what the bare allocation path relies on.

use crate::heap::ObjRef;
use crate::strings::StrId;
use std::fmt;

/// Tagged word value representation
///
/// Values are encoded in 64 bits with tag bits in the lowest 3 bits.
/// This allows for efficient type checking and inline storage of small
/// values.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Value(u64);

impl Value {
    // Tag constants (lowest 3 bits)
    const TAG_MASK: u64 = 0b111;
    const TAG_NULL: u64 = 0b000;
    const TAG_I32: u64 = 0b001;
    const TAG_BOOL: u64 = 0b010;
    const TAG_STR: u64 = 0b011;
    const TAG_PTR: u64 = 0b100;

    // Special values
    const NULL: u64 = Self::TAG_NULL;
    const TRUE: u64 = (1 << 3) | Self::TAG_BOOL;
    const FALSE: u64 = Self::TAG_BOOL;

    /// Create a null value
    #[inline]
    pub const fn null() -> Self {
        Value(Self::NULL)
    }

    /// Create a boolean value
    #[inline]
    pub const fn bool(b: bool) -> Self {
        Value(if b { Self::TRUE } else { Self::FALSE })
    }

    /// Create an i32 value
    #[inline]
    pub const fn i32(i: i32) -> Self {
        // Payload in the upper 32 bits, tag in the low bits
        Value((((i as i64) as u64) << 32) | Self::TAG_I32)
    }

    /// Create an interned-string value
    #[inline]
    pub const fn str(id: StrId) -> Self {
        Value(((id.as_u32() as u64) << 32) | Self::TAG_STR)
    }

    /// Create an object value from a heap reference
    #[inline]
    pub fn obj(obj: ObjRef) -> Self {
        let addr = obj.addr() as u64;
        debug_assert_eq!(addr & Self::TAG_MASK, 0, "Object must be 8-byte aligned");
        Value(addr | Self::TAG_PTR)
    }

    /// Check if this value is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        (self.0 & Self::TAG_MASK) == Self::TAG_NULL
    }

    /// Check if this value is a boolean
    #[inline]
    pub const fn is_bool(&self) -> bool {
        (self.0 & Self::TAG_MASK) == Self::TAG_BOOL
    }

    /// Check if this value is an i32
    #[inline]
    pub const fn is_i32(&self) -> bool {
        (self.0 & Self::TAG_MASK) == Self::TAG_I32
    }

    /// Check if this value is an interned string
    #[inline]
    pub const fn is_str(&self) -> bool {
        (self.0 & Self::TAG_MASK) == Self::TAG_STR
    }

    /// Check if this value is a heap object
    #[inline]
    pub const fn is_obj(&self) -> bool {
        (self.0 & Self::TAG_MASK) == Self::TAG_PTR
    }

    /// Extract boolean value
    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        if self.is_bool() {
            Some((self.0 >> 3) != 0)
        } else {
            None
        }
    }

    /// Extract i32 value
    #[inline]
    pub const fn as_i32(&self) -> Option<i32> {
        if self.is_i32() {
            Some((self.0 >> 32) as i32)
        } else {
            None
        }
    }

    /// Extract interned-string id
    #[inline]
    pub const fn as_str_id(&self) -> Option<StrId> {
        if self.is_str() {
            Some(StrId::new((self.0 >> 32) as u32))
        } else {
            None
        }
    }

    /// Extract object reference
    ///
    /// Returns `None` when this value is not a heap object. The returned
    /// reference carries the same validity caveats as [`ObjRef`] itself.
    #[inline]
    pub fn as_obj(&self) -> Option<ObjRef> {
        if self.is_obj() {
            ObjRef::from_addr((self.0 & !Self::TAG_MASK) as usize)
        } else {
            None
        }
    }

    /// Get raw bits (for debugging)
    #[inline]
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Get tag bits
    #[inline]
    pub const fn tag(&self) -> u64 {
        self.0 & Self::TAG_MASK
    }

    /// Get type name for debugging
    pub const fn type_name(&self) -> &'static str {
        match self.tag() {
            Self::TAG_NULL => "null",
            Self::TAG_BOOL => "bool",
            Self::TAG_I32 => "i32",
            Self::TAG_STR => "str",
            Self::TAG_PTR => "object",
            _ => "unknown",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag() {
            Self::TAG_NULL => write!(f, "null"),
            Self::TAG_BOOL => write!(f, "bool({})", (self.0 >> 3) != 0),
            Self::TAG_I32 => write!(f, "i32({})", (self.0 >> 32) as i32),
            Self::TAG_STR => write!(f, "str(#{})", (self.0 >> 32) as u32),
            Self::TAG_PTR => write!(f, "obj({:#x})", self.0 & !Self::TAG_MASK),
            _ => write!(f, "Value({:#x})", self.0),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag() {
            Self::TAG_NULL => write!(f, "null"),
            Self::TAG_BOOL => write!(f, "{}", (self.0 >> 3) != 0),
            Self::TAG_I32 => write!(f, "{}", (self.0 >> 32) as i32),
            Self::TAG_STR => write!(f, "str#{}", (self.0 >> 32) as u32),
            Self::TAG_PTR => write!(f, "[object@{:#x}]", self.0 & !Self::TAG_MASK),
            _ => write!(f, "<??>"),
        }
    }
}

// Default is null, matching zero-initialized slot memory
impl Default for Value {
    fn default() -> Self {
        Value::null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_null() {
        let v = Value::null();
        assert!(v.is_null());
        assert!(!v.is_bool());
        assert!(!v.is_i32());
        assert!(!v.is_str());
        assert!(!v.is_obj());
        assert_eq!(v.type_name(), "null");
        // Zeroed memory must read back as null
        assert_eq!(v.raw(), 0);
    }

    #[test]
    fn test_value_bool() {
        let t = Value::bool(true);
        assert!(t.is_bool());
        assert_eq!(t.as_bool(), Some(true));

        let f = Value::bool(false);
        assert!(f.is_bool());
        assert_eq!(f.as_bool(), Some(false));
        assert!(!f.is_null());
    }

    #[test]
    fn test_value_i32() {
        let v = Value::i32(42);
        assert!(v.is_i32());
        assert_eq!(v.as_i32(), Some(42));

        assert_eq!(Value::i32(-100).as_i32(), Some(-100));
        assert_eq!(Value::i32(0).as_i32(), Some(0));
        assert_eq!(Value::i32(i32::MIN).as_i32(), Some(i32::MIN));
        assert_eq!(Value::i32(i32::MAX).as_i32(), Some(i32::MAX));
    }

    #[test]
    fn test_value_str() {
        let v = Value::str(StrId::new(7));
        assert!(v.is_str());
        assert_eq!(v.as_str_id(), Some(StrId::new(7)));
        assert_eq!(v.as_i32(), None);
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::null(), Value::null());
        assert_eq!(Value::i32(42), Value::i32(42));
        assert_eq!(Value::str(StrId::new(1)), Value::str(StrId::new(1)));
        assert_ne!(Value::bool(true), Value::bool(false));
        assert_ne!(Value::i32(1), Value::i32(2));
        assert_ne!(Value::null(), Value::bool(false));
        assert_ne!(Value::i32(0), Value::null());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(format!("{}", Value::null()), "null");
        assert_eq!(format!("{}", Value::bool(true)), "true");
        assert_eq!(format!("{}", Value::i32(-10)), "-10");
    }

    #[test]
    fn test_value_size() {
        // Value must stay a single machine word
        assert_eq!(std::mem::size_of::<Value>(), 8);
    }

    #[test]
    fn test_value_copy() {
        let v1 = Value::i32(42);
        let v2 = v1;
        assert_eq!(v1.as_i32(), v2.as_i32());
    }
}
