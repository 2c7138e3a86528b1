//! Member resolution
//!
//! Looks members up against a class's own declaration tables (supertypes
//! are not searched) and hands back descriptors that have already been
//! forced open: the caller can get/set/invoke immediately, whatever the
//! declared visibility was.

use crate::access::force_accessible;
use crate::member::{Member, MemberKind};
use crate::{ReflectError, ReflectResult};
use krait_core::class::TypeDesc;
use krait_core::{ClassId, Runtime, Value};

fn class_label(rt: &Runtime, class: ClassId) -> String {
    rt.classes()
        .get(class)
        .map(|c| c.name().to_string())
        .unwrap_or_else(|| format!("#{}", class.as_u32()))
}

fn not_found(rt: &Runtime, class: ClassId, member: &str) -> ReflectError {
    ReflectError::MemberNotFound {
        class: class_label(rt, class),
        member: member.to_string(),
    }
}

fn opened(kind: MemberKind, declaring: ClassId, index: u32) -> Member {
    let member = Member::new(kind, declaring, index);
    force_accessible(&member, true);
    member
}

/// Resolve a field declared on `class` by name.
///
/// The returned descriptor is already open.
pub fn resolve_field(rt: &Runtime, class: ClassId, name: &str) -> ReflectResult<Member> {
    let c = rt.classes().get_or_err(class)?;
    let (index, _) = c.field_named(name).ok_or_else(|| not_found(rt, class, name))?;
    Ok(opened(MemberKind::Field, class, index))
}

/// Resolve a method declared on `class` by exact name and parameter
/// signature.
///
/// The returned descriptor is already open.
pub fn resolve_method(
    rt: &Runtime,
    class: ClassId,
    name: &str,
    params: &[TypeDesc],
) -> ReflectResult<Member> {
    let c = rt.classes().get_or_err(class)?;
    let (index, _) = c
        .method_matching(name, params)
        .ok_or_else(|| not_found(rt, class, name))?;
    Ok(opened(MemberKind::Method, class, index))
}

/// Resolve a constructor declared on `class` by exact parameter signature.
///
/// The returned descriptor is already open.
pub fn resolve_constructor(
    rt: &Runtime,
    class: ClassId,
    params: &[TypeDesc],
) -> ReflectResult<Member> {
    let c = rt.classes().get_or_err(class)?;
    let (index, _) = c
        .ctor_matching(params)
        .ok_or_else(|| not_found(rt, class, "<init>"))?;
    Ok(opened(MemberKind::Constructor, class, index))
}

/// Resolve a constructor by actual argument values instead of declared
/// parameter types.
///
/// Picks the first declared constructor whose parameter count matches and
/// whose every declared parameter type is assignable from the corresponding
/// argument's runtime type; declaration order breaks ties. The returned
/// descriptor is already open.
pub fn resolve_constructor_fuzzy(
    rt: &Runtime,
    class: ClassId,
    args: &[Value],
) -> ReflectResult<Member> {
    let c = rt.classes().get_or_err(class)?;
    let found = c.ctors().iter().enumerate().find(|(_, ctor)| {
        ctor.params.len() == args.len()
            && ctor
                .params
                .iter()
                .zip(args)
                .all(|(param, arg)| param.admits(*arg, rt.classes()))
    });
    let (index, _) = found.ok_or_else(|| not_found(rt, class, "<init>"))?;
    Ok(opened(MemberKind::Constructor, class, index as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use krait_core::class::{ClassBuilder, Visibility};
    use krait_core::CoreError;

    fn packet_class(rt: &mut Runtime) -> ClassId {
        rt.register(
            ClassBuilder::new("Packet")
                .field("seq", TypeDesc::I32, Visibility::Private)
                .field("ack", TypeDesc::Bool, Visibility::Private)
                .ctor(
                    vec![TypeDesc::I32],
                    Visibility::Public,
                    |_rt, obj, args| obj.set(0, args[0]),
                )
                .ctor(
                    vec![TypeDesc::I32, TypeDesc::Bool],
                    Visibility::Private,
                    |_rt, obj, args| {
                        obj.set(0, args[0])?;
                        obj.set(1, args[1])
                    },
                )
                .method("checksum", vec![], Visibility::Private, |_rt, recv, _| {
                    recv.as_obj()
                        .ok_or_else(|| CoreError::TypeMismatch("receiver".into()))?
                        .get(0)
                }),
        )
        .unwrap()
    }

    #[test]
    fn test_resolved_members_come_back_open() {
        let mut rt = Runtime::new();
        let packet = packet_class(&mut rt);

        let field = resolve_field(&rt, packet, "seq").unwrap();
        assert!(field.is_accessible());
        assert_eq!(field.kind(), MemberKind::Field);

        let method = resolve_method(&rt, packet, "checksum", &[]).unwrap();
        assert!(method.is_accessible());

        let ctor = resolve_constructor(&rt, packet, &[TypeDesc::I32]).unwrap();
        assert!(ctor.is_accessible());
        assert_eq!(ctor.index(), 0);
    }

    #[test]
    fn test_exact_match_requires_exact_signature() {
        let mut rt = Runtime::new();
        let packet = packet_class(&mut rt);

        assert!(matches!(
            resolve_method(&rt, packet, "checksum", &[TypeDesc::I32]),
            Err(ReflectError::MemberNotFound { .. })
        ));
        assert!(matches!(
            resolve_method(&rt, packet, "doesNotExist", &[]),
            Err(ReflectError::MemberNotFound { .. })
        ));
        assert!(matches!(
            resolve_field(&rt, packet, "missing"),
            Err(ReflectError::MemberNotFound { .. })
        ));
    }

    #[test]
    fn test_exact_match_ignores_supertypes() {
        let mut rt = Runtime::new();
        let base = rt
            .register(ClassBuilder::new("Base").field(
                "inherited",
                TypeDesc::I32,
                Visibility::Public,
            ))
            .unwrap();
        let child = rt
            .register(ClassBuilder::new("Child").parent(base))
            .unwrap();

        assert!(resolve_field(&rt, base, "inherited").is_ok());
        assert!(matches!(
            resolve_field(&rt, child, "inherited"),
            Err(ReflectError::MemberNotFound { .. })
        ));
    }

    #[test]
    fn test_fuzzy_matches_by_argument_runtime_types() {
        let mut rt = Runtime::new();
        let packet = packet_class(&mut rt);

        let one = resolve_constructor_fuzzy(&rt, packet, &[Value::i32(5)]).unwrap();
        assert_eq!(one.index(), 0);

        let two =
            resolve_constructor_fuzzy(&rt, packet, &[Value::i32(5), Value::bool(true)]).unwrap();
        assert_eq!(two.index(), 1);
        assert!(two.is_accessible());

        assert!(matches!(
            resolve_constructor_fuzzy(&rt, packet, &[Value::bool(true)]),
            Err(ReflectError::MemberNotFound { .. })
        ));
    }

    #[test]
    fn test_fuzzy_tie_break_is_declaration_order() {
        let mut rt = Runtime::new();
        // Two constructors that both admit a null argument
        let holder = rt
            .register(
                ClassBuilder::new("Holder")
                    .field("s", TypeDesc::Str, Visibility::Private)
                    .ctor(vec![TypeDesc::Str], Visibility::Public, |_rt, obj, args| {
                        obj.set(0, args[0])
                    })
                    .ctor(vec![TypeDesc::Str], Visibility::Private, |_rt, obj, args| {
                        obj.set(0, args[0])
                    }),
            )
            .unwrap();

        let m = resolve_constructor_fuzzy(&rt, holder, &[Value::null()]).unwrap();
        assert_eq!(m.index(), 0);
    }

    #[test]
    fn test_fuzzy_admits_subclass_arguments() {
        let mut rt = Runtime::new();
        let base = rt.register(ClassBuilder::new("Shape")).unwrap();
        let circle = rt
            .register(ClassBuilder::new("Circle").parent(base))
            .unwrap();
        let holder = rt
            .register(
                ClassBuilder::new("ShapeHolder")
                    .field("shape", TypeDesc::Ref(base), Visibility::Private)
                    .ctor(
                        vec![TypeDesc::Ref(base)],
                        Visibility::Public,
                        |_rt, obj, args| obj.set(0, args[0]),
                    ),
            )
            .unwrap();

        let arg = rt.allocate_bare(circle).unwrap().as_value();
        assert!(resolve_constructor_fuzzy(&rt, holder, &[arg]).is_ok());
    }
}
