#![allow(clippy::expect_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fmt::Write;
use tixi::{DocumentHandle, StorageMode, Tixi, TixiOptions};

// ---------------------------------------------------------------------------
// Document generators
// ---------------------------------------------------------------------------

/// Generates a document with `n` wings, each carrying a uID, a span and a
/// short coordinate vector.
fn make_wings_xml(n: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<cpacs><wings>\n");
    for i in 0..n {
        let _ = writeln!(
            xml,
            "  <wing uID=\"wing{i}\"><span>{}.5</span>\
             <x mapType=\"vector\">0;1.5;3;4.5;6</x></wing>",
            10 + i
        );
    }
    xml.push_str("</wings></cpacs>\n");
    xml
}

fn open(tixi: &mut Tixi, xml: &str) -> DocumentHandle {
    tixi.import_from_string(xml).expect("benchmark document parses")
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_import(c: &mut Criterion) {
    let xml = make_wings_xml(1000);
    c.bench_function("import_1000_wings", |b| {
        b.iter(|| {
            let mut tixi = Tixi::new();
            black_box(open(&mut tixi, black_box(&xml)));
        });
    });
}

fn bench_typed_reads(c: &mut Criterion) {
    let mut tixi = Tixi::new();
    let h = open(&mut tixi, &make_wings_xml(200));
    c.bench_function("get_double_element", |b| {
        b.iter(|| {
            black_box(
                tixi.get_double_element(h, black_box("/cpacs/wings/wing[150]/span"))
                    .expect("span exists"),
            )
        });
    });
    c.bench_function("get_float_vector", |b| {
        b.iter(|| {
            black_box(
                tixi.get_float_vector(h, black_box("/cpacs/wings/wing[150]/x"), 5)
                    .expect("vector exists"),
            )
        });
    });
}

fn bench_cached_queries(c: &mut Criterion) {
    let xml = make_wings_xml(200);
    let mut plain = Tixi::new();
    let p = open(&mut plain, &xml);
    let mut cached = Tixi::with_options(TixiOptions::default().xpath_cache(true));
    let q = open(&mut cached, &xml);

    let mut group = c.benchmark_group("repeated_query");
    group.bench_function("uncached", |b| {
        b.iter(|| black_box(plain.xpath_evaluate_node_number(p, "//wing/span").expect("query")));
    });
    group.bench_function("cached", |b| {
        b.iter(|| black_box(cached.xpath_evaluate_node_number(q, "//wing/span").expect("query")));
    });
    group.finish();
}

fn bench_uid_lookup(c: &mut Criterion) {
    let mut tixi = Tixi::new();
    let h = open(&mut tixi, &make_wings_xml(500));
    c.bench_function("uid_get_xpath", |b| {
        b.iter(|| black_box(tixi.uid_get_xpath(h, black_box("wing400")).expect("uid exists")));
    });
}

fn bench_matrix_roundtrip(c: &mut Criterion) {
    let values: Vec<f64> = (0..400).map(f64::from).collect();
    c.bench_function("matrix_20x20_write_read", |b| {
        b.iter(|| {
            let mut tixi = Tixi::new();
            let h = tixi.create_document("cpacs").expect("valid root name");
            tixi.add_float_matrix(
                h,
                "/cpacs",
                None,
                None,
                None,
                20,
                20,
                &values,
                StorageMode::RowWise,
                None,
            )
            .expect("matrix written");
            black_box(
                tixi.get_float_matrix(h, "/cpacs/matrix", None, None, 20, 20, StorageMode::RowWise)
                    .expect("matrix read"),
            )
        });
    });
}

fn bench_export(c: &mut Criterion) {
    let mut tixi = Tixi::new();
    let h = open(&mut tixi, &make_wings_xml(1000));
    c.bench_function("export_1000_wings", |b| {
        b.iter(|| black_box(tixi.export_document_as_string(h).expect("handle valid")));
    });
}

criterion_group!(parsing, bench_import, bench_export);

criterion_group!(access, bench_typed_reads, bench_cached_queries, bench_uid_lookup);

criterion_group!(numeric, bench_matrix_roundtrip);

criterion_main!(parsing, access, numeric);
