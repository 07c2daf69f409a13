use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lumen_core::{Component, ComponentConfig};
use serde_json::json;

fn bench_text_toggle(c: &mut Criterion) {
    c.bench_function("text_binding_update", |b| {
        let component = Component::new(ComponentConfig::new("bench-text", "<p>{v}</p>")).unwrap();
        component.set_property("v", json!(0));
        component.mount();
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            component.set_property("v", json!(i));
            black_box(component.root());
        });
    });
}

fn bench_repeat_resize(c: &mut Criterion) {
    c.bench_function("repeat_resize_50", |b| {
        let component = Component::new(ComponentConfig::new(
            "bench-repeat",
            r#"<li repeat="{n}">{$key}</li>"#,
        ))
        .unwrap();
        component.set_property("n", json!(50));
        component.mount();
        let mut grow = false;
        b.iter(|| {
            grow = !grow;
            component.set_property("n", json!(if grow { 50 } else { 40 }));
            black_box(component.root());
        });
    });
}

fn bench_noop_update(c: &mut Criterion) {
    c.bench_function("noop_force_update", |b| {
        let component = Component::new(ComponentConfig::new(
            "bench-noop",
            r#"<div title="{t}"><span>{t}</span></div>"#,
        ))
        .unwrap();
        component.set_property("t", json!("same"));
        component.mount();
        b.iter(|| {
            component.force_update();
            black_box(component.track_count());
        });
    });
}

criterion_group!(benches, bench_text_toggle, bench_repeat_resize, bench_noop_update);
criterion_main!(benches);
