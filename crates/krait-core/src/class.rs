//! Class and member model
//!
//! Classes describe the shape of heap objects: named, typed, visibility-
//! scoped field slots, methods, and constructors. Closed (enumerated)
//! classes additionally carry their canonical set of values, materialized
//! when the class is registered.

use crate::heap::ObjRef;
use crate::registry::ClassRegistry;
use crate::runtime::Runtime;
use crate::value::Value;
use crate::CoreResult;
use bitflags::bitflags;

/// Class identifier: the raw value written into object type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(u32);

impl ClassId {
    /// Wrap a raw tag value
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        ClassId(raw)
    }

    /// Get the raw tag value
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

bitflags! {
    /// Class-level attribute flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClassFlags: u16 {
        /// Closed (enumerated) class: its complete value set is declared
        /// with the class
        const CLOSED_ENUM = 1 << 0;
        /// Encapsulated class: the checked accessibility API refuses to
        /// open its non-public members
        const SEALED = 1 << 1;
        /// No instances may be created, not even through bare allocation
        const ABSTRACT = 1 << 2;
        /// Frames of this class are skipped when searching for the true
        /// caller
        const CALLER_SENSITIVE = 1 << 3;
    }
}

bitflags! {
    /// Member-level attribute flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MemberFlags: u8 {
        /// Member is invoked without a receiver
        const STATIC = 1 << 0;
        /// Member was generated by the runtime, not declared by the user
        const SYNTHETIC = 1 << 1;
    }
}

/// Declared member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Visible everywhere
    Public,
    /// Visible within the defining module
    Module,
    /// Visible only inside the declaring class
    Private,
}

impl Visibility {
    /// Whether reflective access requires an opened descriptor
    #[inline]
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// Declared type of a field or parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDesc {
    /// 32-bit integer
    I32,
    /// Boolean
    Bool,
    /// Interned string
    Str,
    /// Reference to an instance of the class or one of its subclasses
    Ref(ClassId),
}

impl TypeDesc {
    /// Whether a runtime value is acceptable for this declared type.
    ///
    /// Primitives match exactly; `null` is acceptable wherever a reference
    /// (string or object) is expected; object references match the declared
    /// class or any subclass.
    pub fn admits(&self, value: Value, classes: &ClassRegistry) -> bool {
        match self {
            TypeDesc::I32 => value.is_i32(),
            TypeDesc::Bool => value.is_bool(),
            TypeDesc::Str => value.is_str() || value.is_null(),
            TypeDesc::Ref(class) => {
                value.is_null()
                    || value
                        .as_obj()
                        .map(|obj| classes.is_assignable(*class, ClassId::from_raw(obj.raw_tag())))
                        .unwrap_or(false)
            }
        }
    }
}

/// Native method body
pub type NativeFn = fn(&mut Runtime, Value, &[Value]) -> CoreResult<Value>;

/// Native constructor body, run against a freshly allocated instance
pub type CtorFn = fn(&mut Runtime, ObjRef, &[Value]) -> CoreResult<()>;

/// Method bodies the runtime knows how to run
#[derive(Clone, Copy)]
pub enum MethodBody {
    /// Host function
    Native(NativeFn),
    /// Body recognized and executed by the runtime itself
    Builtin(Builtin),
}

/// Runtime-recognized builtin method bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// Static accessor returning a fresh array of a closed class's
    /// canonical values
    EnumValues,
    /// Accessor reading a closed-class instance's name slot
    EnumName,
    /// Accessor reading a closed-class instance's ordinal slot
    EnumOrdinal,
}

/// Constructor bodies the runtime knows how to run
#[derive(Clone, Copy)]
pub enum CtorBody {
    /// Host function
    Native(CtorFn),
    /// Write each argument to the slot of the same index, in order.
    /// The generated constructor of closed classes uses this.
    FieldwiseInit,
}

/// Field definition
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: TypeDesc,
    /// Declared visibility
    pub visibility: Visibility,
    /// Absolute slot index (inherited slots included)
    pub slot: usize,
}

/// Method definition
#[derive(Clone)]
pub struct MethodDef {
    /// Method name
    pub name: String,
    /// Declared parameter types
    pub params: Vec<TypeDesc>,
    /// Declared visibility
    pub visibility: Visibility,
    /// Member attribute flags
    pub flags: MemberFlags,
    /// Body
    pub body: MethodBody,
}

/// Constructor definition
#[derive(Clone)]
pub struct CtorDef {
    /// Declared parameter types
    pub params: Vec<TypeDesc>,
    /// Declared visibility
    pub visibility: Visibility,
    /// Member attribute flags
    pub flags: MemberFlags,
    /// Body
    pub body: CtorBody,
}

/// Class definition metadata
pub struct Class {
    pub(crate) id: ClassId,
    pub(crate) name: String,
    pub(crate) parent: Option<ClassId>,
    pub(crate) flags: ClassFlags,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) methods: Vec<MethodDef>,
    pub(crate) ctors: Vec<CtorDef>,
    /// Total slot count, inherited slots included
    pub(crate) slot_count: usize,
    /// Canonical values of a closed class (materialized at registration)
    pub(crate) variants: Vec<Value>,
}

impl Class {
    /// Class id
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent class, if any
    pub fn parent(&self) -> Option<ClassId> {
        self.parent
    }

    /// Class flags
    pub fn flags(&self) -> ClassFlags {
        self.flags
    }

    /// Declared fields (own only, not inherited)
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Declared methods (own only)
    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    /// Declared constructors
    pub fn ctors(&self) -> &[CtorDef] {
        &self.ctors
    }

    /// Total slot count, inherited slots included
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Canonical values of a closed class
    pub fn variants(&self) -> &[Value] {
        &self.variants
    }

    /// Find an own field by name
    pub fn field_named(&self, name: &str) -> Option<(u32, &FieldDef)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == name)
            .map(|(i, f)| (i as u32, f))
    }

    /// Find an own method by exact name and parameter signature
    pub fn method_matching(&self, name: &str, params: &[TypeDesc]) -> Option<(u32, &MethodDef)> {
        self.methods
            .iter()
            .enumerate()
            .find(|(_, m)| m.name == name && m.params == params)
            .map(|(i, m)| (i as u32, m))
    }

    /// Find the first own method with the given name (dispatch order)
    pub fn method_named(&self, name: &str) -> Option<(u32, &MethodDef)> {
        self.methods
            .iter()
            .enumerate()
            .find(|(_, m)| m.name == name)
            .map(|(i, m)| (i as u32, m))
    }

    /// Find a constructor by exact parameter signature
    pub fn ctor_matching(&self, params: &[TypeDesc]) -> Option<(u32, &CtorDef)> {
        self.ctors
            .iter()
            .enumerate()
            .find(|(_, c)| c.params == params)
            .map(|(i, c)| (i as u32, c))
    }
}

/// Builder for class definitions
///
/// Registration (see [`Runtime::register`]) assigns the id, resolves slot
/// indices against the parent, generates the synthetic members of closed
/// classes and materializes their canonical values.
pub struct ClassBuilder {
    pub(crate) name: String,
    pub(crate) parent: Option<ClassId>,
    pub(crate) flags: ClassFlags,
    pub(crate) fields: Vec<(String, TypeDesc, Visibility)>,
    pub(crate) methods: Vec<MethodDef>,
    pub(crate) ctors: Vec<CtorDef>,
    pub(crate) variants: Vec<(String, Vec<Value>)>,
}

impl ClassBuilder {
    /// Start a plain class definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            flags: ClassFlags::empty(),
            fields: Vec::new(),
            methods: Vec::new(),
            ctors: Vec::new(),
            variants: Vec::new(),
        }
    }

    /// Start a closed (enumerated) class definition
    pub fn enum_class(name: impl Into<String>) -> Self {
        let mut builder = Self::new(name);
        builder.flags |= ClassFlags::CLOSED_ENUM;
        builder
    }

    /// Set the parent class
    pub fn parent(mut self, parent: ClassId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Mark the class sealed (encapsulated)
    pub fn sealed(mut self) -> Self {
        self.flags |= ClassFlags::SEALED;
        self
    }

    /// Mark the class abstract
    pub fn abstract_(mut self) -> Self {
        self.flags |= ClassFlags::ABSTRACT;
        self
    }

    /// Mark the class caller-sensitive
    pub fn caller_sensitive(mut self) -> Self {
        self.flags |= ClassFlags::CALLER_SENSITIVE;
        self
    }

    /// Declare a field
    pub fn field(mut self, name: impl Into<String>, ty: TypeDesc, visibility: Visibility) -> Self {
        self.fields.push((name.into(), ty, visibility));
        self
    }

    /// Declare an instance method with a native body
    pub fn method(
        mut self,
        name: impl Into<String>,
        params: Vec<TypeDesc>,
        visibility: Visibility,
        body: NativeFn,
    ) -> Self {
        self.methods.push(MethodDef {
            name: name.into(),
            params,
            visibility,
            flags: MemberFlags::empty(),
            body: MethodBody::Native(body),
        });
        self
    }

    /// Declare a static method with a native body
    pub fn static_method(
        mut self,
        name: impl Into<String>,
        params: Vec<TypeDesc>,
        visibility: Visibility,
        body: NativeFn,
    ) -> Self {
        self.methods.push(MethodDef {
            name: name.into(),
            params,
            visibility,
            flags: MemberFlags::STATIC,
            body: MethodBody::Native(body),
        });
        self
    }

    /// Declare a method with an explicit definition
    pub fn method_def(mut self, def: MethodDef) -> Self {
        self.methods.push(def);
        self
    }

    /// Declare a constructor with a native body
    pub fn ctor(mut self, params: Vec<TypeDesc>, visibility: Visibility, body: CtorFn) -> Self {
        self.ctors.push(CtorDef {
            params,
            visibility,
            flags: MemberFlags::empty(),
            body: CtorBody::Native(body),
        });
        self
    }

    /// Declare a canonical value of a closed class.
    ///
    /// `extra` supplies the class's own field values, in declaration order;
    /// name and ordinal slots are filled by the runtime.
    pub fn variant(mut self, name: impl Into<String>, extra: Vec<Value>) -> Self {
        self.variants.push((name.into(), extra));
        self
    }
}
