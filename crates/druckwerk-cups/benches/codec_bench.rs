// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for IPP message encoding and parsing in the
// druckwerk-cups crate.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use druckwerk_cups::message::{IppMessage, Operation, status};
use druckwerk_cups::parser;
use druckwerk_cups::tag::DelimiterTag;
use druckwerk_cups::value::IppValue;

/// A Get-Printer-Attributes-shaped response with a realistic attribute load.
fn printer_attributes_response() -> IppMessage {
    let mut msg = IppMessage::response(status::SUCCESSFUL_OK, 1);
    msg.add_group(DelimiterTag::OperationAttributes)
        .charset("attributes-charset", "utf-8")
        .natural_language("attributes-natural-language", "en")
        .text("status-message", "successful-ok");
    msg.add_group(DelimiterTag::PrinterAttributes)
        .uri("printer-uri-supported", "ipp://localhost:631/printers/lp")
        .name_attr("printer-name", "LaserJet")
        .text("printer-info", "Second floor laser printer")
        .text("printer-location", "Copy room")
        .enum_attr("printer-state", 3)
        .keyword("printer-state-reasons", "none")
        .boolean("printer-is-accepting-jobs", true)
        .keyword("media-supported", "iso_a4_210x297mm")
        .additional(IppValue::Keyword("iso_a3_297x420mm".into()))
        .additional(IppValue::Keyword("iso_a5_148x210mm".into()))
        .additional(IppValue::Keyword("na_letter_8.5x11in".into()))
        .additional(IppValue::Keyword("na_legal_8.5x14in".into()))
        .mime_media_type("document-format-supported", "application/pdf")
        .additional(IppValue::MimeMediaType("image/jpeg".into()))
        .additional(IppValue::MimeMediaType("image/png".into()))
        .additional(IppValue::MimeMediaType("text/plain".into()))
        .attr(
            "printer-resolution-supported",
            IppValue::Resolution {
                x: 600,
                y: 600,
                unit: druckwerk_cups::value::ResolutionUnit::Dpi,
            },
        )
        .additional(IppValue::Resolution {
            x: 1200,
            y: 1200,
            unit: druckwerk_cups::value::ResolutionUnit::Dpi,
        });
    msg
}

fn bench_encode(c: &mut Criterion) {
    let minimal = IppMessage::request(Operation::GetPrinterAttributes, 42);
    c.bench_function("encode (minimal request)", |b| {
        b.iter(|| black_box(&minimal).encode());
    });

    let loaded = printer_attributes_response();
    c.bench_function("encode (printer attributes)", |b| {
        b.iter(|| black_box(&loaded).encode());
    });
}

fn bench_parse(c: &mut Criterion) {
    let minimal = IppMessage::request(Operation::GetPrinterAttributes, 42).encode();
    c.bench_function("parse (minimal request)", |b| {
        b.iter(|| {
            let result = parser::decode(black_box(&minimal));
            assert!(result.is_ok());
        });
    });

    let loaded = printer_attributes_response().encode();
    c.bench_function("parse (printer attributes)", |b| {
        b.iter(|| {
            let result = parser::decode(black_box(&loaded));
            assert!(result.is_ok());
        });
    });

    // A Print-Job request with a 4 KiB document appended after the
    // end-of-attributes tag, exercising the trailing-bytes path.
    let mut with_doc = IppMessage::request(Operation::PrintJob, 100);
    with_doc
        .add_group(DelimiterTag::OperationAttributes)
        .charset("attributes-charset", "utf-8")
        .natural_language("attributes-natural-language", "en")
        .name_attr("job-name", "Benchmark Print Job");
    let mut bytes = with_doc.encode();
    bytes.extend_from_slice(&vec![0xabu8; 4096]);
    c.bench_function("parse (4 KiB document trailer)", |b| {
        b.iter(|| {
            let result = parser::decode(black_box(&bytes));
            assert!(result.is_ok());
        });
    });
}

criterion_group!(benches, bench_encode, bench_parse);
criterion_main!(benches);
