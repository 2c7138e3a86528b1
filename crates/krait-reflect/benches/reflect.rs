use criterion::{black_box, criterion_group, criterion_main, Criterion};
use krait_core::class::{ClassBuilder, TypeDesc, Visibility};
use krait_core::{Runtime, Value};
use krait_reflect::Introspector;

fn setup() -> (Runtime, Introspector, krait_core::ClassId) {
    let mut rt = Runtime::new();
    let ix = Introspector::install(&mut rt).unwrap();
    let packet = rt
        .register(
            ClassBuilder::new("Packet")
                .field("seq", TypeDesc::I32, Visibility::Private)
                .ctor(vec![TypeDesc::I32], Visibility::Public, |_rt, obj, args| {
                    obj.set(0, args[0])
                })
                .method("checksum", vec![], Visibility::Private, |_rt, recv, _| {
                    recv.as_obj().unwrap().get(0)
                }),
        )
        .unwrap();
    (rt, ix, packet)
}

fn bench_resolve_and_invoke(c: &mut Criterion) {
    let (mut rt, ix, packet) = setup();
    let obj = rt.construct(packet, 0, &[Value::i32(7)]).unwrap();

    c.bench_function("resolve_method", |b| {
        b.iter(|| {
            ix.resolve_method(black_box(&rt), packet, black_box("checksum"), &[])
                .unwrap()
        });
    });

    let m = ix.resolve_method(&rt, packet, "checksum", &[]).unwrap();
    c.bench_function("invoke_private_method", |b| {
        b.iter(|| ix.invoke(&mut rt, &m, black_box(obj), &[]).unwrap());
    });
}

fn bench_cast(c: &mut Criterion) {
    let (mut rt, ix, packet) = setup();
    let other = rt
        .register(ClassBuilder::new("Frame").field(
            "seq",
            TypeDesc::I32,
            Visibility::Private,
        ))
        .unwrap();
    let obj = rt.allocate_bare(packet).unwrap();

    c.bench_function("cast_unchecked_roundtrip", |b| {
        b.iter(|| {
            ix.cast_unchecked(&mut rt, black_box(other), obj).unwrap();
            ix.cast_unchecked(&mut rt, black_box(packet), obj).unwrap();
        });
    });
}

criterion_group!(benches, bench_resolve_and_invoke, bench_cast);
criterion_main!(benches);
