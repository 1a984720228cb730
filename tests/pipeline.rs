//! End-to-end tests for the generation pipeline.
//!
//! A scripted in-memory boundary stands in for the hosted model, so these
//! tests see exactly what would have been sent: system text, fragment order,
//! attachments and the task directive.

use std::sync::{Arc, Mutex};

use quill::batch::{BatchOrchestrator, SharedContext, parse_batch};
use quill::error::ErrorKind;
use quill::generate::{GenerationForm, Generator};
use quill::ingest::{IngestConfig, Normalizer, PdfMode, PromptFragment, UploadedResource};
use quill::llm::{Boundary, CompletionRequest, GenerationInvoker, InvokeError, InvokeResult};
use quill::prompt::{PolicyTable, PromptAssembler};

#[derive(Debug, Clone)]
struct Call {
    model: String,
    system: String,
    content: Vec<PromptFragment>,
}

impl Call {
    fn task(&self) -> &str {
        self.content
            .last()
            .and_then(PromptFragment::as_text)
            .unwrap_or_default()
    }
}

/// Records every call; answers with a canned reply or a scripted failure.
#[derive(Default)]
struct Scripted {
    calls: Mutex<Vec<Call>>,
    fail_on: Option<&'static str>,
}

impl Scripted {
    fn failing_on(marker: &'static str) -> Self {
        Self {
            fail_on: Some(marker),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl Boundary for Scripted {
    fn complete(&self, request: &CompletionRequest<'_>) -> InvokeResult<String> {
        let call = Call {
            model: request.model.to_string(),
            system: request.system.to_string(),
            content: request.content.to_vec(),
        };
        let fail = self.fail_on.is_some_and(|m| call.task().contains(m));
        self.calls.lock().unwrap().push(call);
        if fail {
            return Err(InvokeError::Unreachable {
                url: "http://provider.invalid".into(),
                message: "connection refused".into(),
            });
        }
        Ok("Sure, here is a reply.".into())
    }
}

fn generator(boundary: Arc<Scripted>, pdf_mode: PdfMode) -> Generator {
    Generator::new(
        Normalizer::new(IngestConfig {
            pdf_mode,
            ..Default::default()
        }),
        PromptAssembler::new(PolicyTable::bundled().unwrap()),
        GenerationInvoker::new(boundary, "gpt-4o"),
    )
}

fn form(request_type: &str) -> GenerationForm {
    GenerationForm {
        request_type: request_type.into(),
        ..Default::default()
    }
}

fn pdf() -> UploadedResource {
    UploadedResource::new("ch4.pdf", "application/pdf", b"%PDF-1.4 fake".to_vec())
}

#[test]
fn unknown_type_never_reaches_boundary() {
    let boundary = Arc::new(Scripted::default());
    let generator = generator(boundary.clone(), PdfMode::Attach);

    for request_type in ["Discussion", "essay", ""] {
        let mut f = form(request_type);
        f.files = vec![pdf()];
        let err = f
            .into_request()
            .and_then(|request| generator.generate(&request))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputShape);
    }
    assert!(boundary.calls().is_empty());
}

#[test]
fn attach_mode_passes_pdf_as_document_in_order() {
    let boundary = Arc::new(Scripted::default());
    let generator = generator(boundary.clone(), PdfMode::Attach);

    let mut f = form("discussion");
    f.context = "Week 4".into();
    f.files = vec![
        UploadedResource::new("a.txt", "text/plain", b"first file".to_vec()),
        pdf(),
        UploadedResource::new("c.html", "text/html", b"<p>third &amp; last</p>".to_vec()),
    ];
    generator.generate(&f.into_request().unwrap()).unwrap();

    let calls = boundary.calls();
    assert_eq!(calls.len(), 1);
    let content = &calls[0].content;
    assert_eq!(content.len(), 5);
    assert!(content[0].as_text().unwrap().starts_with("ADDITIONAL CONTEXT:"));
    assert!(content[1].as_text().unwrap().contains("first file"));
    match &content[2] {
        PromptFragment::Document {
            filename,
            media_type,
            data,
        } => {
            assert_eq!(filename, "ch4.pdf");
            assert_eq!(media_type, "application/pdf");
            assert_eq!(data, b"%PDF-1.4 fake");
        }
        other => panic!("expected embedded document, got {other:?}"),
    }
    assert!(content[3].as_text().unwrap().contains("third & last"));
    assert!(calls[0].system.contains("250-400 words"));
}

#[test]
fn placeholder_mode_always_yields_text_for_pdf() {
    let boundary = Arc::new(Scripted::default());
    let generator = generator(boundary.clone(), PdfMode::Placeholder);

    let mut f = form("paper");
    f.files = vec![pdf()];
    generator.generate(&f.into_request().unwrap()).unwrap();

    let calls = boundary.calls();
    let content = &calls[0].content;
    assert!(
        content
            .iter()
            .all(|f| matches!(f, PromptFragment::Text { .. }))
    );
    assert!(content[0].as_text().unwrap().contains("ch4.pdf"));
}

#[test]
fn citation_directive_tracks_source_urls() {
    let boundary = Arc::new(Scripted::default());
    let generator = generator(boundary.clone(), PdfMode::Attach);

    let mut cited = form("discussion");
    cited.files = vec![pdf()];
    cited.file_sources =
        Some(r#"[{"filename":"ch4.pdf","sourceUrl":"https://example.edu/ch4"}]"#.into());
    generator.generate(&cited.into_request().unwrap()).unwrap();

    let mut cleared = form("discussion");
    cleared.files = vec![pdf()];
    cleared.file_sources = Some(r#"[{"filename":"ch4.pdf","sourceUrl":"  "}]"#.into());
    generator.generate(&cleared.into_request().unwrap()).unwrap();

    let mut malformed = form("discussion");
    malformed.files = vec![pdf()];
    malformed.file_sources = Some("[{not json".into());
    generator.generate(&malformed.into_request().unwrap()).unwrap();

    let calls = boundary.calls();
    assert!(calls[0].task().contains("APA7"));
    assert!(calls[0].task().contains("\"ch4.pdf\": https://example.edu/ch4"));
    assert!(!calls[0].system.contains("https://example.edu/ch4"));
    assert!(!calls[1].task().contains("APA7"));
    assert!(!calls[2].task().contains("APA7"));
}

#[test]
fn paper_page_count_falls_back_to_two() {
    let boundary = Arc::new(Scripted::default());
    let generator = generator(boundary.clone(), PdfMode::Attach);

    for pages in ["3", "abc", "0", "2.5"] {
        let mut f = form("paper");
        f.page_count = Some(pages.into());
        generator.generate(&f.into_request().unwrap()).unwrap();
    }

    let calls = boundary.calls();
    assert!(calls[0].task().contains("825"));
    assert!(calls[0].task().contains("3-page"));
    for call in &calls[1..] {
        assert!(call.task().contains("550"));
        assert!(call.task().contains("2-page"));
    }
}

#[test]
fn reply_embeds_post_and_additional_instructions_verbatim() {
    let boundary = Arc::new(Scripted::default());
    let generator = generator(boundary.clone(), PdfMode::Attach);

    let mut f = form("response");
    f.discussion_post = Some("I think patrol reports matter most.".into());
    f.additional_instructions = "Mention {words} literally.".into();
    generator.generate(&f.into_request().unwrap()).unwrap();

    let task = boundary.calls()[0].task().to_string();
    assert!(task.contains("POST TO RESPOND TO:\nI think patrol reports matter most."));
    assert!(task.contains("CONTEXT: Mention {words} literally."));
}

#[test]
fn boundary_failure_surfaces_verbatim_for_single_generation() {
    let boundary = Arc::new(Scripted::failing_on("POST TO RESPOND TO"));
    let generator = generator(boundary, PdfMode::Attach);

    let mut f = form("response");
    f.discussion_post = Some(String::new());
    let err = generator.generate(&f.into_request().unwrap()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Boundary);
    assert!(err.to_string().contains("connection refused"));
}

#[test]
fn batch_run_shares_uploads_and_isolates_failures() {
    let boundary = Arc::new(Scripted::failing_on("Boom"));
    let generator = generator(boundary.clone(), PdfMode::Attach);

    let items = parse_batch("Trevor\nHello there.\n---\nRiley\nBoom goes the post.\n---\nMissing. Post two?");
    let shared = SharedContext {
        context: "Unit 2".into(),
        additional_instructions: String::new(),
        resources: vec![pdf().with_source_url("https://example.edu/ch4")],
        model: Some("gpt-5.2".into()),
    };

    let mut progress = Vec::new();
    let results = BatchOrchestrator::new(&generator).run_all(&items, &shared, |event| {
        progress.push((event.processed, event.total));
    });

    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].display_name, "Trevor");
    assert!(results[0].output_text().is_some());
    assert!(results[1].failure_reason().unwrap().contains("connection refused"));
    assert_eq!(results[2].display_name, "Response 3");
    assert!(results[2].output_text().is_some());

    let calls = boundary.calls();
    assert_eq!(calls.len(), 3);
    for call in &calls {
        assert_eq!(call.model, "gpt-5.2");
        assert!(
            call.content
                .iter()
                .any(|f| matches!(f, PromptFragment::Document { filename, .. } if filename == "ch4.pdf"))
        );
        assert!(call.task().contains("https://example.edu/ch4"));
    }
}
