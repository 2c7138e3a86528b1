//! Member descriptors
//!
//! A [`Member`] is a caller-owned handle to one declared field, method, or
//! constructor. It carries its own access flag: opening a descriptor never
//! changes the class definition, so two descriptors for the same member are
//! independent.
//!
//! The raw representation is `#[repr(C)]` with the access flag as the first
//! field, giving the flag a fixed byte offset that the patcher
//! (see [`crate::access`]) writes through directly.

use crate::{ReflectError, ReflectResult};
use krait_core::class::{ClassFlags, TypeDesc, Visibility};
use krait_core::{ClassId, CoreError, Runtime};
use std::cell::Cell;
use std::fmt;
use std::ptr::NonNull;

/// Which kind of member a descriptor names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MemberKind {
    /// A field
    Field = 0,
    /// A method
    Method = 1,
    /// A constructor
    Constructor = 2,
}

/// Raw descriptor representation.
///
/// `accessible` must stay the first field: the patcher assumes its offset
/// is stable across all descriptors of a build. The `Cell` makes the flag
/// byte legally mutable through a shared descriptor.
#[repr(C)]
pub(crate) struct RawMember {
    pub(crate) accessible: Cell<bool>,
    pub(crate) kind: MemberKind,
    pub(crate) declaring: ClassId,
    pub(crate) index: u32,
}

/// A caller-owned handle to one declared member
///
/// Descriptors are deliberately not `Sync`: the access flag is a plain
/// field write with no atomicity guarantee, so a descriptor stays confined
/// to one thread.
pub struct Member {
    raw: Box<RawMember>,
}

impl Member {
    pub(crate) fn new(kind: MemberKind, declaring: ClassId, index: u32) -> Self {
        Self {
            raw: Box::new(RawMember {
                accessible: Cell::new(false),
                kind,
                declaring,
                index,
            }),
        }
    }

    /// Kind of member this descriptor names
    pub fn kind(&self) -> MemberKind {
        self.raw.kind
    }

    /// Declaring class
    pub fn declaring(&self) -> ClassId {
        self.raw.declaring
    }

    /// Index of the member in the declaring class's declaration table
    pub fn index(&self) -> u32 {
        self.raw.index
    }

    /// Current state of the access flag
    pub fn is_accessible(&self) -> bool {
        self.raw.accessible.get()
    }

    /// Pointer to the raw representation (for the patcher)
    pub(crate) fn raw_ptr(&self) -> *mut RawMember {
        NonNull::from(&*self.raw).as_ptr()
    }

    /// Declared visibility of the member this descriptor names
    pub fn visibility(&self, rt: &Runtime) -> ReflectResult<Visibility> {
        let class = rt.classes().get_or_err(self.raw.declaring)?;
        let index = self.raw.index as usize;
        let vis = match self.raw.kind {
            MemberKind::Field => class.fields().get(index).map(|f| f.visibility),
            MemberKind::Method => class.methods().get(index).map(|m| m.visibility),
            MemberKind::Constructor => class.ctors().get(index).map(|c| c.visibility),
        };
        vis.ok_or_else(|| ReflectError::MemberNotFound {
            class: class.name().to_string(),
            member: format!("#{index}"),
        })
    }

    /// Name of the member this descriptor names (constructors report
    /// `<init>`)
    pub fn name(&self, rt: &Runtime) -> ReflectResult<String> {
        let class = rt.classes().get_or_err(self.raw.declaring)?;
        let index = self.raw.index as usize;
        let name = match self.raw.kind {
            MemberKind::Field => class.fields().get(index).map(|f| f.name.clone()),
            MemberKind::Method => class.methods().get(index).map(|m| m.name.clone()),
            MemberKind::Constructor => class.ctors().get(index).map(|_| "<init>".to_string()),
        };
        name.ok_or_else(|| ReflectError::MemberNotFound {
            class: class.name().to_string(),
            member: format!("#{index}"),
        })
    }

    /// Slot index and declared type of a field member
    pub(crate) fn field_info(&self, rt: &Runtime) -> ReflectResult<(usize, TypeDesc)> {
        if self.raw.kind != MemberKind::Field {
            return Err(ReflectError::Runtime(CoreError::TypeMismatch(
                "descriptor does not name a field".to_string(),
            )));
        }
        let class = rt.classes().get_or_err(self.raw.declaring)?;
        let index = self.raw.index as usize;
        class
            .fields()
            .get(index)
            .map(|f| (f.slot, f.ty))
            .ok_or_else(|| ReflectError::MemberNotFound {
                class: class.name().to_string(),
                member: format!("#{index}"),
            })
    }

    /// Open or close this descriptor through the checked accessibility API.
    ///
    /// Refuses to open a non-public member of a sealed class; that refusal
    /// is exactly what [`crate::access::force_accessible`] exists to skip.
    pub fn try_set_accessible(&self, rt: &Runtime, enabled: bool) -> ReflectResult<()> {
        if enabled {
            let class = rt.classes().get_or_err(self.raw.declaring)?;
            let visibility = self.visibility(rt)?;
            if class.flags().contains(ClassFlags::SEALED) && !visibility.is_public() {
                return Err(ReflectError::Runtime(CoreError::AccessDenied {
                    class: class.name().to_string(),
                    member: self.name(rt)?,
                }));
            }
        }
        self.raw.accessible.set(enabled);
        Ok(())
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("kind", &self.raw.kind)
            .field("declaring", &self.raw.declaring)
            .field("index", &self.raw.index)
            .field("accessible", &self.raw.accessible.get())
            .finish()
    }
}
