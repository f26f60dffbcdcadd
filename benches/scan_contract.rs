//! This bench test scans and extracts key points from a large multi-page
//! finance contract.

#![allow(missing_docs)]

use criterion::{Criterion, criterion_group, criterion_main};
use dutycheck::{Config, Document};

const PAGE: &str = "RETAIL INSTALLMENT SALE CONTRACT. Amount Financed: $18,500.00. \
    Your monthly payment\nwill be $365.45 for a term of 60 months. \
    Annual Percentage Rate (APR)      6.9%. A late fee of $25.00 applies to \
    payments over 10 days late. The seller may require GAP insurance! \
    Early termination fee: $350.00 if you end the contract early. \
    Is there a final payment? See the schedule below.\n";

/// Generates a document of many near-identical pages
fn large_contract(pages: usize) -> String {
    let pages = (0..pages)
        .map(|i| format!("Page {i}\n{}", PAGE.repeat(20)))
        .collect();
    Document::from_pages(pages).text()
}

fn scan_contract(c: &mut Criterion) {
    let config = Config::default();
    let scanner = config.clause_scanner().unwrap();
    let extractor = config.key_point_extractor().unwrap();
    let text = large_contract(50);

    c.bench_function("clause scan", |b| {
        b.iter(|| scanner.scan(std::hint::black_box(&text)).unwrap());
    });

    c.bench_function("key point extraction", |b| {
        b.iter(|| extractor.extract(std::hint::black_box(&text)));
    });
}

criterion_group!(benches, scan_contract);
criterion_main!(benches);
