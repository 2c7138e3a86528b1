//! Krait Core Runtime Substrate
//!
//! This crate provides the runtime substrate that the Krait toolkit
//! introspects, including:
//! - Tagged value representation
//! - Heap allocator and object references
//! - Class and object model (fields, methods, constructors, visibility)
//! - Class registry and string interning
//! - Call-frame stack

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod class;
pub mod frames;
pub mod heap;
pub mod layout;
pub mod registry;
pub mod runtime;
pub mod strings;
pub mod value;

pub use class::{
    Builtin, Class, ClassBuilder, ClassFlags, ClassId, CtorBody, CtorDef, CtorFn, FieldDef,
    MemberFlags, MethodBody, MethodDef, NativeFn, TypeDesc, Visibility,
};
pub use frames::{Frame, FrameStack};
pub use heap::{Heap, ObjRef};
pub use registry::ClassRegistry;
pub use runtime::Runtime;
pub use strings::{StrId, StringPool};
pub use value::Value;

/// Runtime errors
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Call-frame stack exceeded its depth limit
    #[error("Stack overflow")]
    StackOverflow,

    /// No class registered under the given name
    #[error("Class not found: {0}")]
    ClassNotFound(String),

    /// A class with this name is already registered
    #[error("Class already registered: {0}")]
    DuplicateClass(String),

    /// No method with the given name is reachable on the receiver's class
    #[error("No method {method} on class {class}")]
    MethodNotFound {
        /// Class the dispatch started from
        class: String,
        /// Requested method name
        method: String,
    },

    /// Object slot index outside the object's slot count
    #[error("Slot {index} out of bounds (object has {len} slots)")]
    SlotOutOfBounds {
        /// Requested slot index
        index: usize,
        /// Number of slots the object actually has
        len: usize,
    },

    /// Wrong number of arguments for an invocation
    #[error("Expected {expected} arguments, got {got}")]
    ArityMismatch {
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// Value incompatible with a declared type
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Class cannot be instantiated through the bare allocation path
    #[error("Class {0} cannot be instantiated")]
    Uninstantiable(String),

    /// The checked accessibility API refused to open a member
    #[error("Access to {class}.{member} denied")]
    AccessDenied {
        /// Declaring class name
        class: String,
        /// Member name
        member: String,
    },
}

/// Runtime result
pub type CoreResult<T> = Result<T, CoreError>;
