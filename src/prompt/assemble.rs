//! Prompt assembly.
//!
//! Output ordering is fixed:
//!
//! 1. system: persona preamble, then the type's style block and banned lists
//! 2. user: free-text context (if any)
//! 3. user: one fragment per normalized upload, in upload order
//! 4. user: the task text, made of the type directive, the user's additional
//!    instructions (verbatim) and, when citations exist, the references
//!    directive

use crate::ingest::PromptFragment;
use crate::prompt::citation::CitationSet;
use crate::prompt::error::PromptResult;
use crate::prompt::policy::{LengthPolicy, PolicyTable, StylePolicy};
use crate::prompt::request::RequestType;

/// Everything the assembler needs besides the fragments.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub request_type: RequestType,
    /// Free-text context typed by the user.
    pub context: &'a str,
    /// Additional instructions, passed through unsanitized.
    pub additional_instructions: &'a str,
    /// Raw page count as typed; only `paper` reads it.
    pub page_count: Option<&'a str>,
    /// The post being replied to; only reply types read it.
    pub reply_to: &'a str,
    pub citations: &'a CitationSet,
}

/// The two prompt halves, ready for the inference boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub request_type: RequestType,
    pub system_instructions: String,
    /// Ordered user content. The last entry is always the task text.
    pub content: Vec<PromptFragment>,
}

impl AssembledPrompt {
    /// Flattened view of the user content, documents shown by filename.
    pub fn task_instructions(&self) -> String {
        self.content
            .iter()
            .map(|fragment| match fragment {
                PromptFragment::Text { text } => text.clone(),
                PromptFragment::Document { filename, .. } => {
                    format!("[attached document: {filename}]")
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Number of embedded-document attachments.
    pub fn attachment_count(&self) -> usize {
        self.content
            .iter()
            .filter(|f| matches!(f, PromptFragment::Document { .. }))
            .count()
    }
}

/// Resolve a raw page count; anything but a positive integer falls back.
pub fn resolve_pages(raw: Option<&str>, default_pages: u32) -> u32 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|&n| n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(default_pages)
}

/// Resolved length target for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LengthTarget {
    words: String,
    pages: Option<u32>,
}

fn length_target(policy: &LengthPolicy, page_count: Option<&str>) -> LengthTarget {
    match policy {
        LengthPolicy::Fixed { words } => LengthTarget {
            words: words.clone(),
            pages: None,
        },
        LengthPolicy::PerPage {
            words_per_page,
            default_pages,
        } => {
            let pages = resolve_pages(page_count, *default_pages);
            LengthTarget {
                words: (u64::from(pages) * u64::from(*words_per_page)).to_string(),
                pages: Some(pages),
            }
        }
    }
}

fn fill(template: &str, target: &LengthTarget, post: &str) -> String {
    let pages = target.pages.map(|p| p.to_string()).unwrap_or_default();
    template
        .trim()
        .replace("{words}", &target.words)
        .replace("{pages}", &pages)
        .replace("{post}", post)
}

/// Builds prompts from a [`PolicyTable`].
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    table: PolicyTable,
}

impl PromptAssembler {
    pub fn new(table: PolicyTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    /// Assemble the system and task halves for one request.
    pub fn assemble(
        &self,
        input: &PromptInput<'_>,
        fragments: &[PromptFragment],
    ) -> PromptResult<AssembledPrompt> {
        let policy = self.table.get(input.request_type)?;
        let target = length_target(&policy.length, input.page_count);

        let system_instructions = self.system_instructions(policy, &target);

        let mut content = Vec::with_capacity(fragments.len() + 2);
        let context = input.context.trim();
        if !context.is_empty() {
            content.push(PromptFragment::text(format!("ADDITIONAL CONTEXT:\n{context}")));
        }
        content.extend(fragments.iter().cloned());
        content.push(PromptFragment::text(task_text(policy, &target, input)));

        Ok(AssembledPrompt {
            request_type: input.request_type,
            system_instructions,
            content,
        })
    }

    fn system_instructions(&self, policy: &StylePolicy, target: &LengthTarget) -> String {
        let mut sections = vec![
            self.table.persona().trim().to_string(),
            fill(&policy.system_block, target, ""),
            format!("BANNED: {}", policy.banned_terms.join(", ")),
        ];
        if !policy.banned_patterns.is_empty() {
            sections.push(bullet_list("BANNED PATTERNS:", &policy.banned_patterns));
        }
        if !policy.style_examples.is_empty() {
            sections.push(bullet_list("WRITE LIKE THIS INSTEAD:", &policy.style_examples));
        }
        sections.join("\n\n")
    }
}

fn task_text(policy: &StylePolicy, target: &LengthTarget, input: &PromptInput<'_>) -> String {
    let mut directive = fill(&policy.task_directive, target, input.reply_to);
    let citing = !input.citations.is_empty();
    if citing && !policy.citation_note.is_empty() {
        directive.push('\n');
        directive.push_str(&policy.citation_note);
    }

    let mut sections = vec![directive];
    if !input.additional_instructions.trim().is_empty() {
        sections.push(format!(
            "{}: {}",
            policy.instructions_label, input.additional_instructions
        ));
    }
    if let Some(references) = input.citations.directive() {
        sections.push(references);
    }
    sections.join("\n\n")
}

fn bullet_list(title: &str, items: &[String]) -> String {
    let mut out = String::from(title);
    for item in items {
        out.push_str("\n- ");
        out.push_str(item);
    }
    out
}
