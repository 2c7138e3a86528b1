//! Runtime execution context
//!
//! A [`Runtime`] owns one heap, one class registry, one string pool and one
//! call-frame stack. It is driven by a single thread at a time (`&mut`
//! threading): every execution context has its own heap and its own stack,
//! so frame walks always see the driving thread's frames.

use crate::class::{
    Builtin, Class, ClassBuilder, ClassFlags, ClassId, CtorBody, MemberFlags, MethodBody,
    MethodDef, TypeDesc, Visibility,
};
use crate::frames::{Frame, FrameStack};
use crate::heap::{Heap, ObjRef};
use crate::registry::ClassRegistry;
use crate::strings::{StrId, StringPool};
use crate::value::Value;
use crate::{CoreError, CoreResult};

/// Slot index of the name field on closed-class instances
pub const ENUM_NAME_SLOT: usize = 0;
/// Slot index of the ordinal field on closed-class instances
pub const ENUM_ORDINAL_SLOT: usize = 1;

/// Runtime execution context
pub struct Runtime {
    heap: Heap,
    classes: ClassRegistry,
    strings: StringPool,
    frames: FrameStack,
    object_class: ClassId,
    enum_class: ClassId,
    array_class: ClassId,
}

impl Runtime {
    /// Create a runtime with the built-in classes registered
    pub fn new() -> Self {
        let mut rt = Self {
            heap: Heap::new(),
            classes: ClassRegistry::new(),
            strings: StringPool::new(),
            frames: FrameStack::new(),
            object_class: ClassId::from_raw(0),
            enum_class: ClassId::from_raw(0),
            array_class: ClassId::from_raw(0),
        };
        rt.bootstrap();
        rt
    }

    fn bootstrap(&mut self) {
        // Registration of the built-ins cannot fail on an empty registry.
        let object = self
            .register(ClassBuilder::new("Object"))
            .unwrap_or_else(|e| panic!("bootstrap failed: {e}"));
        self.object_class = object;

        let enum_base = self
            .register(
                ClassBuilder::new("Enum")
                    .parent(object)
                    .abstract_()
                    .field("name", TypeDesc::Str, Visibility::Private)
                    .field("ordinal", TypeDesc::I32, Visibility::Private)
                    .method_def(MethodDef {
                        name: "name".to_string(),
                        params: vec![],
                        visibility: Visibility::Public,
                        flags: MemberFlags::empty(),
                        body: MethodBody::Builtin(Builtin::EnumName),
                    })
                    .method_def(MethodDef {
                        name: "ordinal".to_string(),
                        params: vec![],
                        visibility: Visibility::Public,
                        flags: MemberFlags::empty(),
                        body: MethodBody::Builtin(Builtin::EnumOrdinal),
                    }),
            )
            .unwrap_or_else(|e| panic!("bootstrap failed: {e}"));
        self.enum_class = enum_base;

        let array = self
            .register(ClassBuilder::new("Array").parent(object).sealed())
            .unwrap_or_else(|e| panic!("bootstrap failed: {e}"));
        self.array_class = array;
    }

    /// The root `Object` class
    pub fn object_class(&self) -> ClassId {
        self.object_class
    }

    /// The `Enum` base class of all closed classes
    pub fn enum_class(&self) -> ClassId {
        self.enum_class
    }

    /// The built-in `Array` class
    pub fn array_class(&self) -> ClassId {
        self.array_class
    }

    /// Class registry
    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    /// Heap (read-only statistics access)
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Call-frame stack
    pub fn frames(&self) -> &FrameStack {
        &self.frames
    }

    /// Push an invocation record
    pub fn push_frame(&mut self, frame: Frame) -> CoreResult<()> {
        self.frames.push(frame)
    }

    /// Pop the most recent invocation record
    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Intern a string as a value
    pub fn intern(&mut self, s: &str) -> Value {
        Value::str(self.strings.intern(s))
    }

    /// Resolve an interned string id
    pub fn string_of(&self, id: StrId) -> Option<&str> {
        self.strings.resolve(id)
    }

    /// Resolve a string value to its text
    pub fn resolve_str(&self, value: Value) -> Option<&str> {
        value.as_str_id().and_then(|id| self.strings.resolve(id))
    }

    /// Look up a class id by name
    pub fn class_for_name(&self, name: &str) -> CoreResult<ClassId> {
        self.classes
            .by_name(name)
            .ok_or_else(|| CoreError::ClassNotFound(name.to_string()))
    }

    /// Register a class definition.
    ///
    /// Assigns the id, resolves slot indices against the parent chain, and
    /// for closed classes generates the synthetic members (the hidden
    /// constructor and the static `values` accessor) and materializes the
    /// canonical values with sequential ordinals.
    pub fn register(&mut self, builder: ClassBuilder) -> CoreResult<ClassId> {
        let ClassBuilder {
            name,
            mut parent,
            flags,
            fields,
            mut methods,
            mut ctors,
            variants,
        } = builder;

        let is_enum = flags.contains(ClassFlags::CLOSED_ENUM);
        if is_enum && parent.is_none() {
            parent = Some(self.enum_class);
        }

        let parent_slots = match parent {
            Some(p) => self.classes.get_or_err(p)?.slot_count(),
            None => 0,
        };

        let field_defs: Vec<crate::class::FieldDef> = fields
            .into_iter()
            .enumerate()
            .map(|(i, (fname, ty, visibility))| crate::class::FieldDef {
                name: fname,
                ty,
                visibility,
                slot: parent_slots + i,
            })
            .collect();
        let slot_count = parent_slots + field_defs.len();

        if is_enum {
            let mut full_params = self.inherited_slot_types(parent)?;
            full_params.extend(field_defs.iter().map(|f| f.ty));
            ctors.push(crate::class::CtorDef {
                params: full_params,
                visibility: Visibility::Private,
                flags: MemberFlags::SYNTHETIC,
                body: CtorBody::FieldwiseInit,
            });
            methods.push(MethodDef {
                name: "values".to_string(),
                params: vec![],
                visibility: Visibility::Public,
                flags: MemberFlags::STATIC | MemberFlags::SYNTHETIC,
                body: MethodBody::Builtin(Builtin::EnumValues),
            });
        }

        let class = Class {
            id: ClassId::from_raw(0),
            name,
            parent,
            flags,
            fields: field_defs,
            methods,
            ctors,
            slot_count,
            variants: Vec::new(),
        };
        let id = self.classes.insert(class)?;

        for (ordinal, (vname, extra)) in variants.into_iter().enumerate() {
            let name_value = self.intern(&vname);
            let mut args = vec![name_value, Value::i32(ordinal as i32)];
            args.extend(extra);

            let obj = self.allocate_bare(id)?;
            self.fieldwise_init(obj, &args)?;
            if let Some(class) = self.classes.get_mut(id) {
                class.variants.push(obj.as_value());
            }
        }

        Ok(id)
    }

    /// Declared types of every inherited slot, in slot order
    fn inherited_slot_types(&self, parent: Option<ClassId>) -> CoreResult<Vec<TypeDesc>> {
        let mut pairs: Vec<(usize, TypeDesc)> = Vec::new();
        let mut current = parent;
        while let Some(id) = current {
            let class = self.classes.get_or_err(id)?;
            pairs.extend(class.fields().iter().map(|f| (f.slot, f.ty)));
            current = class.parent();
        }
        pairs.sort_by_key(|(slot, _)| *slot);
        if pairs.iter().enumerate().any(|(i, (slot, _))| *slot != i) {
            return Err(CoreError::TypeMismatch(
                "non-contiguous field slots in parent chain".to_string(),
            ));
        }
        Ok(pairs.into_iter().map(|(_, ty)| ty).collect())
    }

    /// Allocate an instance without running any constructor.
    ///
    /// Slots come back null. This is the bare allocation path used both by
    /// constructors (before their body runs) and by cast sentinels.
    pub fn allocate_bare(&mut self, class: ClassId) -> CoreResult<ObjRef> {
        let c = self.classes.get_or_err(class)?;
        if c.flags().contains(ClassFlags::ABSTRACT) {
            return Err(CoreError::Uninstantiable(c.name().to_string()));
        }
        let slots = c.slot_count();
        Ok(self.heap.alloc(class.as_u32(), slots))
    }

    /// Allocate an array object holding the given elements
    pub fn alloc_array(&mut self, elements: &[Value]) -> ObjRef {
        let obj = self.heap.alloc(self.array_class.as_u32(), elements.len());
        for (i, v) in elements.iter().enumerate() {
            // Bounds hold by construction
            let _ = obj.set(i, *v);
        }
        obj
    }

    /// Read an array object's elements
    pub fn array_elements(&self, array: ObjRef) -> CoreResult<Vec<Value>> {
        (0..array.slot_count()).map(|i| array.get(i)).collect()
    }

    fn fieldwise_init(&mut self, obj: ObjRef, args: &[Value]) -> CoreResult<()> {
        let slots = obj.slot_count();
        if args.len() != slots {
            return Err(CoreError::ArityMismatch {
                expected: slots,
                got: args.len(),
            });
        }
        for (i, v) in args.iter().enumerate() {
            obj.set(i, *v)?;
        }
        Ok(())
    }

    fn check_args(&self, params: &[TypeDesc], args: &[Value]) -> CoreResult<()> {
        if params.len() != args.len() {
            return Err(CoreError::ArityMismatch {
                expected: params.len(),
                got: args.len(),
            });
        }
        for (i, (param, arg)) in params.iter().zip(args).enumerate() {
            if !param.admits(*arg, &self.classes) {
                return Err(CoreError::TypeMismatch(format!(
                    "argument {i} ({}) does not match declared parameter type",
                    arg.type_name()
                )));
            }
        }
        Ok(())
    }

    /// Run a constructor of `class` against a fresh instance.
    ///
    /// Pushes an invocation record for the duration of the body.
    pub fn construct(
        &mut self,
        class: ClassId,
        ctor_index: usize,
        args: &[Value],
    ) -> CoreResult<Value> {
        let c = self.classes.get_or_err(class)?;
        let ctor = c
            .ctors()
            .get(ctor_index)
            .ok_or_else(|| CoreError::MethodNotFound {
                class: c.name().to_string(),
                method: "<init>".to_string(),
            })?;
        let params = ctor.params.clone();
        let body = ctor.body;
        self.check_args(&params, args)?;

        let obj = self.allocate_bare(class)?;
        self.frames.push(Frame::new(class, "<init>"))?;
        let result = match body {
            CtorBody::Native(f) => f(self, obj, args),
            CtorBody::FieldwiseInit => self.fieldwise_init(obj, args),
        };
        self.frames.pop();
        result.map(|()| obj.as_value())
    }

    /// Invoke a method of `class` by declaration index.
    ///
    /// Static methods take a null receiver; instance methods require a
    /// receiver assignable to the declaring class. Pushes an invocation
    /// record for the duration of the body.
    pub fn invoke(
        &mut self,
        class: ClassId,
        method_index: usize,
        recv: Value,
        args: &[Value],
    ) -> CoreResult<Value> {
        let c = self.classes.get_or_err(class)?;
        let m = c
            .methods()
            .get(method_index)
            .ok_or_else(|| CoreError::MethodNotFound {
                class: c.name().to_string(),
                method: format!("#{method_index}"),
            })?;
        let is_static = m.flags.contains(MemberFlags::STATIC);
        let params = m.params.clone();
        let name = m.name.clone();
        let body = m.body;

        if is_static {
            if !recv.is_null() {
                return Err(CoreError::TypeMismatch(
                    "static method invoked with a receiver".to_string(),
                ));
            }
        } else {
            let recv_class = recv
                .as_obj()
                .map(|o| ClassId::from_raw(o.raw_tag()))
                .ok_or_else(|| {
                    CoreError::TypeMismatch("instance method requires an object receiver".to_string())
                })?;
            if !self.classes.is_assignable(class, recv_class) {
                return Err(CoreError::TypeMismatch(
                    "receiver is not an instance of the declaring class".to_string(),
                ));
            }
        }
        self.check_args(&params, args)?;

        self.frames.push(Frame::new(class, name))?;
        let result = self.run_body(body, class, recv, args);
        self.frames.pop();
        result
    }

    fn run_body(
        &mut self,
        body: MethodBody,
        declaring: ClassId,
        recv: Value,
        args: &[Value],
    ) -> CoreResult<Value> {
        match body {
            MethodBody::Native(f) => f(self, recv, args),
            MethodBody::Builtin(Builtin::EnumValues) => {
                let variants = self.classes.get_or_err(declaring)?.variants().to_vec();
                Ok(self.alloc_array(&variants).as_value())
            }
            MethodBody::Builtin(Builtin::EnumName) => self.enum_slot(recv, ENUM_NAME_SLOT),
            MethodBody::Builtin(Builtin::EnumOrdinal) => self.enum_slot(recv, ENUM_ORDINAL_SLOT),
        }
    }

    fn enum_slot(&self, recv: Value, slot: usize) -> CoreResult<Value> {
        recv.as_obj()
            .ok_or_else(|| CoreError::TypeMismatch("expected a closed-class instance".to_string()))?
            .get(slot)
    }

    /// Virtual dispatch: resolve `method` against the receiver's current
    /// type tag, walking the parent chain, then invoke it.
    pub fn dispatch(&mut self, recv: ObjRef, method: &str, args: &[Value]) -> CoreResult<Value> {
        let start = ClassId::from_raw(recv.raw_tag());
        let mut found: Option<(ClassId, usize)> = None;
        let mut current = Some(start);
        while let Some(id) = current {
            let class = self.classes.get_or_err(id)?;
            if let Some((index, _)) = class.method_named(method) {
                found = Some((id, index as usize));
                break;
            }
            current = class.parent();
        }
        match found {
            Some((declaring, index)) => self.invoke(declaring, index, recv.as_value(), args),
            None => Err(CoreError::MethodNotFound {
                class: self
                    .classes
                    .get(start)
                    .map(|c| c.name().to_string())
                    .unwrap_or_else(|| format!("#{}", start.as_u32())),
                method: method.to_string(),
            }),
        }
    }

    /// Canonical values of a closed class
    pub fn enum_variants(&self, class: ClassId) -> CoreResult<&[Value]> {
        let c = self.classes.get_or_err(class)?;
        if !c.flags().contains(ClassFlags::CLOSED_ENUM) {
            return Err(CoreError::TypeMismatch(format!(
                "{} is not a closed class",
                c.name()
            )));
        }
        Ok(c.variants())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
