//! Benchmarks for apply passes over generated pages.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use behaviour_engine::memory::{Document, Element};
use behaviour_engine::BehaviourRegistry;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

/// A page with `rows` table rows, every tenth one carrying a tooltip link.
fn build_page(rows: usize) -> (Document, Element) {
    let doc = Document::new();
    let table = Element::new("table").with_id("history").with_class("sortable");
    for i in 0..rows {
        let mut row = Element::new("tr").with_class("build-row");
        if i % 10 == 0 {
            row = row.with_child(Element::new("a").with_attr("tooltip", "details"));
        }
        table.append_child(row);
    }
    doc.root().append_child(table.clone());
    (doc, table)
}

fn registry_for(doc: Document) -> BehaviourRegistry<Document> {
    let registry = BehaviourRegistry::new(doc);
    registry.specify("TABLE.sortable", "sortable", 0, |_: &Element| Ok(()));
    registry.specify("TR.build-row", "rows", 1, |_: &Element| Ok(()));
    registry.specify("A[tooltip]", "tooltip", 2, |_: &Element| Ok(()));
    registry.specify("table > tr a", "links", 3, |_: &Element| Ok(()));
    registry
}

fn bench_apply_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_document");
    for rows in [10, 100, 1000] {
        let (doc, _) = build_page(rows);
        let registry = registry_for(doc);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| black_box(registry.apply().unwrap()))
        });
    }
    group.finish();
}

fn bench_apply_subtree(c: &mut Criterion) {
    let (doc, table) = build_page(1000);
    let registry = registry_for(doc);
    let rows: Vec<Element> = table.children().into_iter().take(20).collect();

    c.bench_function("apply_subtree_20_rows", |b| {
        b.iter(|| black_box(registry.apply_subtree(rows.clone(), true).unwrap()))
    });
}

criterion_group!(benches, bench_apply_document, bench_apply_subtree);
criterion_main!(benches);
