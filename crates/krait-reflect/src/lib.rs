//! Krait Introspection Toolkit
//!
//! This crate provides low-level object introspection and access-control
//! bypass over a [`krait_core::Runtime`]:
//! - Member resolution that returns pre-opened descriptors, regardless of
//!   declared visibility
//! - An accessibility patcher that flips a descriptor's access flag with a
//!   raw-offset write, skipping the checked API entirely
//! - A caller-stack walker that identifies the first frame outside the
//!   toolkit and outside caller-sensitive classes
//! - A no-restrict cast that rewrites an object's type tag in place
//! - An instantiator for closed (enumerated) classes through their hidden
//!   synthetic constructor
//!
//! All bypass operations hang off the [`Introspector`] capability object,
//! so their use sites stay auditable; none of them are ambient.
//!
//! The toolkit trusts its caller: a no-restrict cast between classes with
//! incompatible slot layouts is not detected and leaves the object in a
//! state where slot access is undefined.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod access;
pub mod caller;
pub mod cast;
mod enums;
mod introspector;
pub mod member;
pub mod resolve;

pub use access::force_accessible;
pub use caller::{
    caller_class, caller_class_at, require_caller_class, require_caller_class_at, FrameFilter,
    SensitivityRegistry,
};
pub use cast::cast_unchecked_like;
pub use introspector::Introspector;
pub use member::{Member, MemberKind};
pub use resolve::{
    resolve_constructor, resolve_constructor_fuzzy, resolve_field, resolve_method,
};

use krait_core::CoreError;

/// Toolkit errors
#[derive(Debug, thiserror::Error)]
pub enum ReflectError {
    /// No member with the requested signature (or matching the supplied
    /// arguments, on the fuzzy path) is declared on the class
    #[error("No member {member} with matching signature on class {class}")]
    MemberNotFound {
        /// Class the lookup ran against
        class: String,
        /// Requested member name
        member: String,
    },

    /// The stack walk found no qualifying caller frame
    #[error("No qualifying caller frame on the stack")]
    CallerNotFound,

    /// The cast sentinel for the target class could not be created
    #[error("Failed to prepare cast template")]
    CastPreparation(#[source] CoreError),

    /// Constructor invocation failed
    #[error("Constructor invocation failed")]
    Instantiation(#[source] CoreError),

    /// Runtime error surfaced unchanged (access refusals, type mismatches,
    /// unknown classes)
    #[error(transparent)]
    Runtime(#[from] CoreError),
}

/// Toolkit result
pub type ReflectResult<T> = Result<T, ReflectError>;
