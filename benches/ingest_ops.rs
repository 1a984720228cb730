//! Benchmarks for markup stripping, batch parsing and prompt assembly.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use quill::batch::parse_batch;
use quill::ingest::markup::strip_markup;
use quill::ingest::{IngestConfig, Normalizer, UploadedResource};
use quill::prompt::{CitationSet, PolicyTable, PromptAssembler, PromptInput, RequestType};

fn sample_html() -> String {
    let mut html = String::from("<html><head><style>p { color: red; }</style>");
    html.push_str("<script>var x = '<p>not text</p>';</script></head><body>");
    for i in 0..500 {
        html.push_str(&format!(
            "<div class=\"c{i}\"><p>Paragraph {i} &amp; notes &lt;draft&gt;</p>\n\t<br/></div>"
        ));
    }
    html.push_str("</body></html>");
    html
}

fn sample_batch() -> String {
    (0..200)
        .map(|i| format!("Student {i}\nI think the reading on week {i} made a fair point.\n"))
        .collect::<Vec<_>>()
        .join("---\n")
}

fn bench_strip_markup(c: &mut Criterion) {
    let html = sample_html();
    c.bench_function("strip_markup_500_blocks", |bench| {
        bench.iter(|| black_box(strip_markup(&html)))
    });
}

fn bench_parse_batch(c: &mut Criterion) {
    let raw = sample_batch();
    c.bench_function("parse_batch_200_posts", |bench| {
        bench.iter(|| black_box(parse_batch(&raw)))
    });
}

fn bench_assemble(c: &mut Criterion) {
    let normalizer = Normalizer::new(IngestConfig::default());
    let resources = vec![
        UploadedResource::new("notes.html", "text/html", sample_html().into_bytes()),
        UploadedResource::new("r.pdf", "application/pdf", vec![0u8; 64 * 1024])
            .with_source_url("https://example.org/r"),
    ];
    let fragments = normalizer.normalize_all(&resources).unwrap();
    let citations = CitationSet::from_resources(&resources);
    let assembler = PromptAssembler::new(PolicyTable::bundled().unwrap());
    let input = PromptInput {
        request_type: RequestType::Paper,
        context: "Week 5",
        additional_instructions: "Focus on evidence handling.",
        page_count: Some("3"),
        reply_to: "",
        citations: &citations,
    };

    c.bench_function("assemble_paper_two_files", |bench| {
        bench.iter(|| black_box(assembler.assemble(&input, &fragments).unwrap()))
    });
}

criterion_group!(benches, bench_strip_markup, bench_parse_batch, bench_assemble);
criterion_main!(benches);
