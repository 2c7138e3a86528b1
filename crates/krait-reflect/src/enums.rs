//! Closed-class instantiation
//!
//! Builds new logical values of closed (enumerated) classes through the
//! hidden synthetic constructor the class's own declaration forbids
//! calling. The new value carries the next sequential ordinal but is never
//! added to the class's canonical value set.

use crate::access::force_accessible;
use crate::introspector::Introspector;
use crate::resolve;
use crate::{ReflectError, ReflectResult};
use krait_core::{ClassId, CoreError, Runtime, Value};

/// Enumerate a closed class's values through its generated accessor.
///
/// Resolves the static `values` method reflectively and invokes it, so the
/// result is the same fresh snapshot any caller of the accessor would see.
pub(crate) fn enum_values(
    ix: &Introspector,
    rt: &mut Runtime,
    class: ClassId,
) -> ReflectResult<Vec<Value>> {
    let accessor = resolve::resolve_method(rt, class, "values", &[])?;
    let array = ix.invoke(rt, &accessor, Value::null(), &[])?;
    let array = array.as_obj().ok_or_else(|| {
        ReflectError::Runtime(CoreError::TypeMismatch(
            "values accessor did not return an array".to_string(),
        ))
    })?;
    rt.array_elements(array).map_err(Into::into)
}

/// Build a new value of a closed class.
///
/// Assembles `[name, ordinal, extra...]` with the ordinal taken from the
/// current value count, fuzzy-matches the synthetic constructor against
/// those arguments, forces it open, and runs it. Constructor failures come
/// back as `Instantiation`; a missing match comes back as `MemberNotFound`.
pub(crate) fn new_enum_value(
    ix: &Introspector,
    rt: &mut Runtime,
    class: ClassId,
    name: &str,
    extra: &[Value],
) -> ReflectResult<Value> {
    let ordinal = enum_values(ix, rt, class)?.len() as i32;

    let mut args = Vec::with_capacity(2 + extra.len());
    args.push(rt.intern(name));
    args.push(Value::i32(ordinal));
    args.extend_from_slice(extra);

    let ctor = resolve::resolve_constructor_fuzzy(rt, class, &args)?;
    force_accessible(&ctor, true);
    ix.construct(rt, &ctor, &args)
}
