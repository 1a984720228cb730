//! Sequential batch execution with per-item failure isolation.
//!
//! Uploads are normalized once per run and the fragments reused for every
//! item. Items run strictly in order, one boundary call at a time; a failed
//! item records its reason and the run continues.

use crate::batch::parser::BatchWorkItem;
use crate::error::QuillResult;
use crate::generate::Generator;
use crate::ingest::{PromptFragment, UploadedResource};
use crate::prompt::{CitationSet, PromptInput, RequestType};

/// Inputs shared by every item of a run.
#[derive(Debug, Clone, Default)]
pub struct SharedContext {
    pub context: String,
    pub additional_instructions: String,
    pub resources: Vec<UploadedResource>,
    pub model: Option<String>,
}

/// What happened to one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Output(String),
    Failed(String),
}

/// The result of one generation within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub display_name: String,
    pub input_echo: String,
    pub outcome: Outcome,
}

impl GenerationResult {
    pub fn output_text(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Output(text) => Some(text),
            Outcome::Failed(_) => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failed(reason) => Some(reason),
            Outcome::Output(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }
}

/// Progress notification emitted after each item completes.
#[derive(Debug, Clone)]
pub struct BatchEvent {
    /// Zero-based position of the item.
    pub index: usize,
    /// Items completed so far, including this one.
    pub processed: usize,
    pub total: usize,
    pub result: GenerationResult,
}

/// Drives a batch through a [`Generator`].
#[derive(Debug, Clone, Copy)]
pub struct BatchOrchestrator<'g> {
    generator: &'g Generator,
}

impl<'g> BatchOrchestrator<'g> {
    pub fn new(generator: &'g Generator) -> Self {
        Self { generator }
    }

    /// Lazily process items, yielding one event per completed item.
    pub fn events<'a>(
        &self,
        items: &'a [BatchWorkItem],
        shared: &'a SharedContext,
    ) -> BatchRun<'a>
    where
        'g: 'a,
    {
        BatchRun {
            generator: self.generator,
            items,
            shared,
            fragments: None,
            next: 0,
        }
    }

    /// Process every item, calling `on_progress` after each one.
    pub fn run_all(
        &self,
        items: &[BatchWorkItem],
        shared: &SharedContext,
        mut on_progress: impl FnMut(&BatchEvent),
    ) -> Vec<GenerationResult> {
        self.events(items, shared)
            .map(|event| {
                on_progress(&event);
                event.result
            })
            .collect()
    }
}

/// Iterator over a running batch. Each `next` performs one boundary call.
pub struct BatchRun<'a> {
    generator: &'a Generator,
    items: &'a [BatchWorkItem],
    shared: &'a SharedContext,
    /// Normalized uploads, or the failure message shared by every item.
    fragments: Option<Result<Vec<PromptFragment>, String>>,
    next: usize,
}

impl BatchRun<'_> {
    fn run_item(&mut self, item: &BatchWorkItem) -> Outcome {
        let (generator, shared) = (self.generator, self.shared);
        let fragments = self.fragments.get_or_insert_with(|| {
            generator
                .normalizer()
                .normalize_all(&shared.resources)
                .map_err(|e| e.to_string())
        });
        match fragments {
            Ok(fragments) => match complete_item(generator, shared, item, fragments) {
                Ok(text) => Outcome::Output(text),
                Err(e) => Outcome::Failed(e.to_string()),
            },
            Err(reason) => Outcome::Failed(reason.clone()),
        }
    }
}

fn complete_item(
    generator: &Generator,
    shared: &SharedContext,
    item: &BatchWorkItem,
    fragments: &[PromptFragment],
) -> QuillResult<String> {
    let citations = CitationSet::from_resources(&shared.resources);
    let input = PromptInput {
        request_type: RequestType::BatchItem,
        context: &shared.context,
        additional_instructions: &shared.additional_instructions,
        page_count: None,
        reply_to: &item.post_body,
        citations: &citations,
    };
    generator.complete(&input, fragments, shared.model.as_deref())
}

impl Iterator for BatchRun<'_> {
    type Item = BatchEvent;

    fn next(&mut self) -> Option<BatchEvent> {
        let items = self.items;
        let item = items.get(self.next)?;
        let index = self.next;
        self.next += 1;

        let outcome = self.run_item(item);
        let total = items.len();
        match &outcome {
            Outcome::Output(_) => tracing::info!(
                index = index + 1,
                total,
                name = %item.display_name,
                "batch item done"
            ),
            Outcome::Failed(reason) => tracing::warn!(
                index = index + 1,
                total,
                name = %item.display_name,
                error = %reason,
                "batch item failed"
            ),
        }

        Some(BatchEvent {
            index,
            processed: index + 1,
            total,
            result: GenerationResult {
                display_name: item.display_name.clone(),
                input_echo: item.post_body.clone(),
                outcome,
            },
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.items.len() - self.next;
        (remaining, Some(remaining))
    }
}
