//! The toolkit capability object
//!
//! Every bypass operation (forced resolution, reflective member access,
//! no-restrict casts, closed-class instantiation, caller identification)
//! is a method on [`Introspector`]. Holding one is the capability; there is
//! no ambient global equivalent, so call sites stay auditable.

use crate::caller::{self, SensitivityRegistry};
use crate::cast::{cast_unchecked_like, SentinelCache};
use crate::enums;
use crate::member::{Member, MemberKind};
use crate::resolve;
use crate::{ReflectError, ReflectResult};
use krait_core::class::{ClassBuilder, TypeDesc};
use krait_core::{ClassId, CoreError, Frame, ObjRef, Runtime, Value};

/// Capability object for introspection and access bypass
///
/// One `Introspector` serves one runtime for the runtime's lifetime. Its
/// sentinel cache and sensitivity registry are shared state scoped to the
/// toolkit instance; the frame stack it walks always belongs to the runtime
/// passed into each call.
pub struct Introspector {
    dispatcher: ClassId,
    sensitivity: SensitivityRegistry,
    sentinels: SentinelCache,
}

impl Introspector {
    /// Install the toolkit into a runtime.
    ///
    /// Registers the toolkit's dispatcher class, which every reflective
    /// invocation pushes a frame for. The dispatcher is caller-sensitive,
    /// so toolkit frames never surface from caller searches.
    pub fn install(rt: &mut Runtime) -> ReflectResult<Self> {
        let dispatcher = rt.register(
            ClassBuilder::new("krait.reflect.Dispatcher")
                .abstract_()
                .caller_sensitive(),
        )?;
        Ok(Self {
            dispatcher,
            sensitivity: SensitivityRegistry::new(),
            sentinels: SentinelCache::new(),
        })
    }

    /// The toolkit's dispatcher class
    pub fn dispatcher_class(&self) -> ClassId {
        self.dispatcher
    }

    /// The frame-filter registry consulted by caller searches
    pub fn sensitivity(&self) -> &SensitivityRegistry {
        &self.sensitivity
    }

    // ── Member resolution ───────────────────────────────────────────────

    /// Resolve a field declared on `class`; the descriptor comes back open
    pub fn resolve_field(&self, rt: &Runtime, class: ClassId, name: &str) -> ReflectResult<Member> {
        resolve::resolve_field(rt, class, name)
    }

    /// Resolve a method by exact signature; the descriptor comes back open
    pub fn resolve_method(
        &self,
        rt: &Runtime,
        class: ClassId,
        name: &str,
        params: &[TypeDesc],
    ) -> ReflectResult<Member> {
        resolve::resolve_method(rt, class, name, params)
    }

    /// Resolve a constructor by exact signature; the descriptor comes back
    /// open
    pub fn resolve_constructor(
        &self,
        rt: &Runtime,
        class: ClassId,
        params: &[TypeDesc],
    ) -> ReflectResult<Member> {
        resolve::resolve_constructor(rt, class, params)
    }

    /// Resolve a constructor by actual argument values; the descriptor
    /// comes back open
    pub fn resolve_constructor_fuzzy(
        &self,
        rt: &Runtime,
        class: ClassId,
        args: &[Value],
    ) -> ReflectResult<Member> {
        resolve::resolve_constructor_fuzzy(rt, class, args)
    }

    // ── Caller identification ───────────────────────────────────────────

    /// Class of the frame at a fixed depth (0 = most recent)
    pub fn caller_class_at(&self, rt: &Runtime, depth: usize) -> Option<ClassId> {
        caller::caller_class_at(rt, depth)
    }

    /// First frame class that is neither toolkit-internal nor
    /// caller-sensitive
    pub fn caller_class(&self, rt: &Runtime) -> Option<ClassId> {
        caller::caller_class(rt, &self.sensitivity)
    }

    /// Like [`Self::caller_class_at`], failing with `CallerNotFound`
    pub fn require_caller_class_at(&self, rt: &Runtime, depth: usize) -> ReflectResult<ClassId> {
        caller::require_caller_class_at(rt, depth)
    }

    /// Like [`Self::caller_class`], failing with `CallerNotFound`
    pub fn require_caller_class(&self, rt: &Runtime) -> ReflectResult<ClassId> {
        caller::require_caller_class(rt, &self.sensitivity)
    }

    /// Look a class up by name on behalf of the current caller.
    ///
    /// Fails with `ClassNotFound` when no qualifying caller frame exists;
    /// an anonymous lookup resolves nothing.
    pub fn caller_scoped_class(&self, rt: &Runtime, name: &str) -> ReflectResult<ClassId> {
        if caller::caller_class(rt, &self.sensitivity).is_none() {
            return Err(ReflectError::Runtime(CoreError::ClassNotFound(
                name.to_string(),
            )));
        }
        rt.class_for_name(name).map_err(Into::into)
    }

    // ── Reflective member access ────────────────────────────────────────

    fn check_access(&self, rt: &Runtime, member: &Member) -> ReflectResult<()> {
        if member.is_accessible() || member.visibility(rt)?.is_public() {
            return Ok(());
        }
        let class = rt
            .classes()
            .get(member.declaring())
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| format!("#{}", member.declaring().as_u32()));
        Err(ReflectError::Runtime(CoreError::AccessDenied {
            class,
            member: member.name(rt)?,
        }))
    }

    /// Read a field through a descriptor
    pub fn get_field(&self, rt: &Runtime, member: &Member, recv: ObjRef) -> ReflectResult<Value> {
        self.check_access(rt, member)?;
        let (slot, _) = member.field_info(rt)?;
        self.check_receiver(rt, member.declaring(), recv)?;
        recv.get(slot).map_err(Into::into)
    }

    /// Write a field through a descriptor
    pub fn set_field(
        &self,
        rt: &Runtime,
        member: &Member,
        recv: ObjRef,
        value: Value,
    ) -> ReflectResult<()> {
        self.check_access(rt, member)?;
        let (slot, ty) = member.field_info(rt)?;
        self.check_receiver(rt, member.declaring(), recv)?;
        if !ty.admits(value, rt.classes()) {
            return Err(ReflectError::Runtime(CoreError::TypeMismatch(format!(
                "value ({}) does not match the field's declared type",
                value.type_name()
            ))));
        }
        recv.set(slot, value).map_err(Into::into)
    }

    fn check_receiver(&self, rt: &Runtime, declaring: ClassId, recv: ObjRef) -> ReflectResult<()> {
        let recv_class = ClassId::from_raw(recv.raw_tag());
        if rt.classes().is_assignable(declaring, recv_class) {
            Ok(())
        } else {
            Err(ReflectError::Runtime(CoreError::TypeMismatch(
                "receiver is not an instance of the declaring class".to_string(),
            )))
        }
    }

    /// Invoke a method through a descriptor.
    ///
    /// Static methods take a null receiver. A dispatcher frame is pushed
    /// for the duration, so caller searches started inside the callee skip
    /// the toolkit.
    pub fn invoke(
        &self,
        rt: &mut Runtime,
        member: &Member,
        recv: Value,
        args: &[Value],
    ) -> ReflectResult<Value> {
        if member.kind() != MemberKind::Method {
            return Err(ReflectError::Runtime(CoreError::TypeMismatch(
                "descriptor does not name a method".to_string(),
            )));
        }
        self.check_access(rt, member)?;

        rt.push_frame(Frame::new(self.dispatcher, "invoke"))?;
        let result = rt.invoke(member.declaring(), member.index() as usize, recv, args);
        rt.pop_frame();
        result.map_err(Into::into)
    }

    /// Run a constructor through a descriptor, returning the new instance.
    ///
    /// Every failure of the invocation itself comes back as
    /// `Instantiation` wrapping the cause.
    pub fn construct(
        &self,
        rt: &mut Runtime,
        member: &Member,
        args: &[Value],
    ) -> ReflectResult<Value> {
        if member.kind() != MemberKind::Constructor {
            return Err(ReflectError::Runtime(CoreError::TypeMismatch(
                "descriptor does not name a constructor".to_string(),
            )));
        }
        self.check_access(rt, member)?;

        rt.push_frame(Frame::new(self.dispatcher, "construct"))?;
        let result = rt.construct(member.declaring(), member.index() as usize, args);
        rt.pop_frame();
        result.map_err(ReflectError::Instantiation)
    }

    // ── No-restrict cast ────────────────────────────────────────────────

    /// Rewrite `obj`'s type tag to the target class, templating the tag
    /// from the class's cached sentinel.
    ///
    /// Creates the sentinel on first use through the bare allocation path;
    /// failure to create it is `CastPreparation`. Returns the same
    /// reference, mutated in place.
    pub fn cast_unchecked(
        &self,
        rt: &mut Runtime,
        target: ClassId,
        obj: ObjRef,
    ) -> ReflectResult<ObjRef> {
        let sentinel = self
            .sentinels
            .get_or_create(rt, target)
            .map_err(ReflectError::CastPreparation)?;
        Ok(cast_unchecked_like(sentinel, obj))
    }

    // ── Closed-class instantiation ──────────────────────────────────────

    /// Enumerate a closed class's values through its generated accessor
    pub fn enum_values(&self, rt: &mut Runtime, class: ClassId) -> ReflectResult<Vec<Value>> {
        enums::enum_values(self, rt, class)
    }

    /// Build a new value of a closed class through its hidden synthetic
    /// constructor.
    ///
    /// The result carries the next sequential ordinal but is not added to
    /// the class's canonical value set.
    pub fn new_enum_value(
        &self,
        rt: &mut Runtime,
        class: ClassId,
        name: &str,
        extra: &[Value],
    ) -> ReflectResult<Value> {
        enums::new_enum_value(self, rt, class, name, extra)
    }
}
