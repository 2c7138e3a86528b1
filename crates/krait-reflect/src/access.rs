//! Accessibility patcher
//!
//! Flips a descriptor's access flag with a direct byte write at a fixed
//! offset into the descriptor's raw representation, skipping the checked
//! accessibility API and whatever it would refuse (sealed-class
//! encapsulation included).
//!
//! The offset is derived here, once, from the descriptor definition itself;
//! nothing else in the repository assumes it. If the derived offset ever
//! disagreed with the live representation the write would corrupt the
//! descriptor; that failure mode is undefined and not part of the error
//! model.

use crate::member::{Member, RawMember};
use std::mem;

/// Byte offset of the access flag inside the raw descriptor
pub(crate) const fn access_flag_offset() -> usize {
    mem::offset_of!(RawMember, accessible)
}

/// Unconditionally set a descriptor's access flag.
///
/// Succeeds for any member, of any visibility, on any class; subsequent
/// reflective get/set/invoke through the descriptor observe the new flag.
/// Only the descriptor instance passed in is mutated; the class definition
/// and other descriptors for the same member are untouched.
pub fn force_accessible(member: &Member, enabled: bool) {
    let base = member.raw_ptr().cast::<u8>();
    // The flag byte sits inside a Cell, so writing through a shared
    // descriptor is legal; bool is one byte with 1 = true.
    unsafe {
        base.add(access_flag_offset()).write(enabled as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::MemberKind;
    use crate::ReflectError;
    use krait_core::class::{ClassBuilder, TypeDesc, Visibility};
    use krait_core::{ClassId, CoreError, Runtime};

    #[test]
    fn test_flag_offset_is_leading() {
        assert_eq!(access_flag_offset(), 0);
    }

    #[test]
    fn test_force_toggles_flag() {
        let m = Member::new(MemberKind::Method, ClassId::from_raw(3), 1);
        assert!(!m.is_accessible());

        force_accessible(&m, true);
        assert!(m.is_accessible());

        force_accessible(&m, false);
        assert!(!m.is_accessible());
    }

    #[test]
    fn test_force_leaves_rest_of_descriptor_intact() {
        let m = Member::new(MemberKind::Constructor, ClassId::from_raw(9), 4);
        force_accessible(&m, true);
        assert_eq!(m.kind(), MemberKind::Constructor);
        assert_eq!(m.declaring(), ClassId::from_raw(9));
        assert_eq!(m.index(), 4);
    }

    #[test]
    fn test_force_succeeds_where_checked_api_refuses() {
        let mut rt = Runtime::new();
        let class = rt
            .register(ClassBuilder::new("Vault").sealed().field(
                "combination",
                TypeDesc::I32,
                Visibility::Private,
            ))
            .unwrap();

        let m = Member::new(MemberKind::Field, class, 0);
        assert!(matches!(
            m.try_set_accessible(&rt, true),
            Err(ReflectError::Runtime(CoreError::AccessDenied { .. }))
        ));

        force_accessible(&m, true);
        assert!(m.is_accessible());
    }
}
