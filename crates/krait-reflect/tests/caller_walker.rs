//! Integration tests for caller identification through reflective calls
//!
//! Tests cover:
//! - A caller-sensitive library class finding its true caller while its own
//!   frames and the toolkit's dispatcher frames are skipped
//! - Fixed-depth determinism across repeated walks
//! - The or-fail variants

use krait_core::class::{ClassBuilder, Visibility};
use krait_core::{CoreError, Frame, Runtime, Value};
use krait_reflect::{caller_class, Introspector, ReflectError, SensitivityRegistry};

/// Native body: report the first non-sensitive frame's class id, or null.
fn who_called_me(rt: &mut Runtime, _recv: Value, _args: &[Value]) -> Result<Value, CoreError> {
    let sensitivity = SensitivityRegistry::new();
    Ok(caller_class(rt, &sensitivity)
        .map(|c| Value::i32(c.as_u32() as i32))
        .unwrap_or(Value::null()))
}

#[test]
fn test_true_caller_found_through_reflective_invocation() {
    let mut rt = Runtime::new();
    let ix = Introspector::install(&mut rt).unwrap();

    let app = rt.register(ClassBuilder::new("App")).unwrap();
    let lib = rt
        .register(
            ClassBuilder::new("Lib")
                .caller_sensitive()
                .static_method("whoCalledMe", vec![], Visibility::Public, who_called_me),
        )
        .unwrap();

    // Simulate App code being the active caller when it reaches for Lib
    rt.push_frame(Frame::new(app, "main")).unwrap();

    let m = ix.resolve_method(&rt, lib, "whoCalledMe", &[]).unwrap();
    let result = ix.invoke(&mut rt, &m, Value::null(), &[]).unwrap();

    // During the call the stack was [App, Dispatcher, Lib]: the library's
    // own frame and the toolkit's frame were skipped, App was reported.
    assert_eq!(result, Value::i32(app.as_u32() as i32));

    rt.pop_frame();
}

#[test]
fn test_no_external_caller_reports_absent() {
    let mut rt = Runtime::new();
    let ix = Introspector::install(&mut rt).unwrap();

    let lib = rt
        .register(
            ClassBuilder::new("Lib")
                .caller_sensitive()
                .static_method("whoCalledMe", vec![], Visibility::Public, who_called_me),
        )
        .unwrap();

    // No application frame below: every frame on the stack is sensitive
    let m = ix.resolve_method(&rt, lib, "whoCalledMe", &[]).unwrap();
    let result = ix.invoke(&mut rt, &m, Value::null(), &[]).unwrap();
    assert_eq!(result, Value::null());
}

#[test]
fn test_walker_never_reports_sensitive_classes() {
    let mut rt = Runtime::new();
    let ix = Introspector::install(&mut rt).unwrap();

    let app = rt.register(ClassBuilder::new("App")).unwrap();
    let lib = rt
        .register(ClassBuilder::new("Lib").caller_sensitive())
        .unwrap();

    rt.push_frame(Frame::new(app, "main")).unwrap();
    rt.push_frame(Frame::new(lib, "layer1")).unwrap();
    rt.push_frame(Frame::new(lib, "layer2")).unwrap();
    rt.push_frame(Frame::new(ix.dispatcher_class(), "invoke"))
        .unwrap();

    let found = ix.caller_class(&rt).unwrap();
    assert_eq!(found, app);
}

#[test]
fn test_fixed_depth_walks_are_deterministic() {
    let mut rt = Runtime::new();
    let ix = Introspector::install(&mut rt).unwrap();

    let a = rt.register(ClassBuilder::new("A")).unwrap();
    let b = rt.register(ClassBuilder::new("B")).unwrap();
    rt.push_frame(Frame::new(a, "outer")).unwrap();
    rt.push_frame(Frame::new(b, "inner")).unwrap();

    for _ in 0..3 {
        assert_eq!(ix.caller_class_at(&rt, 0), Some(b));
        assert_eq!(ix.caller_class_at(&rt, 1), Some(a));
        assert_eq!(ix.caller_class_at(&rt, 2), None);
    }
}

#[test]
fn test_or_fail_variants() {
    let mut rt = Runtime::new();
    let ix = Introspector::install(&mut rt).unwrap();
    let app = rt.register(ClassBuilder::new("App")).unwrap();

    assert!(matches!(
        ix.require_caller_class(&rt),
        Err(ReflectError::CallerNotFound)
    ));
    assert!(matches!(
        ix.require_caller_class_at(&rt, 5),
        Err(ReflectError::CallerNotFound)
    ));

    rt.push_frame(Frame::new(app, "main")).unwrap();
    assert_eq!(ix.require_caller_class(&rt).unwrap(), app);
    assert_eq!(ix.require_caller_class_at(&rt, 0).unwrap(), app);
}
