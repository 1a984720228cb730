//! The single-generation pipeline: validate, normalize, cite, assemble, invoke.

use std::sync::Arc;

use crate::config::QuillConfig;
use crate::error::QuillResult;
use crate::ingest::{Normalizer, PromptFragment, UploadedResource};
use crate::llm::{GenerationInvoker, OpenAiClient};
use crate::prompt::{
    CitationSet, FileSource, PolicyTable, PromptAssembler, PromptError, PromptInput, RequestType,
    parse_file_sources,
};

/// Form fields exactly as they arrive, before validation.
#[derive(Debug, Clone, Default)]
pub struct GenerationForm {
    pub request_type: String,
    pub context: String,
    pub additional_instructions: String,
    pub page_count: Option<String>,
    pub discussion_post: Option<String>,
    /// Raw `fileSources` JSON.
    pub file_sources: Option<String>,
    pub model: Option<String>,
    pub files: Vec<UploadedResource>,
}

impl GenerationForm {
    /// Validate the form. The request type is checked first so an unknown
    /// type fails before any upload is touched.
    pub fn into_request(mut self) -> QuillResult<GenerationRequest> {
        let request_type: RequestType = self.request_type.parse()?;

        let reply_to = match (request_type.is_reply(), self.discussion_post.take()) {
            (true, None) => {
                return Err(PromptError::MissingField {
                    field: "discussionPost".into(),
                    request_type: request_type.to_string(),
                }
                .into());
            }
            (_, post) => post.unwrap_or_default(),
        };

        let resources = self.take_resources();

        Ok(GenerationRequest {
            request_type,
            context: self.context,
            additional_instructions: self.additional_instructions,
            page_count: self.page_count,
            reply_to,
            resources,
            model: self.model,
        })
    }

    /// Move the uploads out, with `fileSources` URLs attached by position.
    pub fn take_resources(&mut self) -> Vec<UploadedResource> {
        let mut resources = std::mem::take(&mut self.files);
        if let Some(json) = self.file_sources.as_deref() {
            attach_sources(&mut resources, &parse_file_sources(json));
        }
        resources
    }
}

/// Copy source URLs onto resources by position.
pub fn attach_sources(resources: &mut [UploadedResource], sources: &[FileSource]) {
    for (resource, source) in resources.iter_mut().zip(sources) {
        if resource.name != source.filename {
            tracing::debug!(
                resource = %resource.name,
                source = %source.filename,
                "fileSources entry name differs from upload at same position"
            );
        }
        resource.source_url = source.source_url.clone();
    }
}

/// A validated generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub request_type: RequestType,
    pub context: String,
    pub additional_instructions: String,
    pub page_count: Option<String>,
    /// The post being answered; empty for non-reply types.
    pub reply_to: String,
    pub resources: Vec<UploadedResource>,
    pub model: Option<String>,
}

/// Completion text plus the type it was generated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutput {
    pub request_type: RequestType,
    pub content: String,
}

/// Owns the three pipeline stages. Cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Generator {
    normalizer: Normalizer,
    assembler: PromptAssembler,
    invoker: GenerationInvoker,
}

impl Generator {
    pub fn new(
        normalizer: Normalizer,
        assembler: PromptAssembler,
        invoker: GenerationInvoker,
    ) -> Self {
        Self {
            normalizer,
            assembler,
            invoker,
        }
    }

    /// Build the production pipeline: configured policies, OpenAI provider.
    pub fn from_config(config: &QuillConfig) -> QuillResult<Self> {
        let table = match &config.policies {
            Some(path) => PolicyTable::from_path(path)?,
            None => PolicyTable::bundled()?,
        };

        let api_key = config.provider.api_key();
        if api_key.is_none() {
            tracing::warn!(
                var = %config.provider.api_key_env,
                "no API key in environment, provider calls will be unauthenticated"
            );
        }
        let model = config.provider.model.clone();
        let client = OpenAiClient::new(config.provider.clone(), api_key);

        Ok(Self::new(
            Normalizer::new(config.ingest),
            PromptAssembler::new(table),
            GenerationInvoker::new(Arc::new(client), model),
        ))
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn invoker(&self) -> &GenerationInvoker {
        &self.invoker
    }

    /// Run one generation end to end. Any failure aborts the request.
    pub fn generate(&self, request: &GenerationRequest) -> QuillResult<GenerationOutput> {
        let fragments = self.normalizer.normalize_all(&request.resources)?;
        let citations = CitationSet::from_resources(&request.resources);

        let input = PromptInput {
            request_type: request.request_type,
            context: &request.context,
            additional_instructions: &request.additional_instructions,
            page_count: request.page_count.as_deref(),
            reply_to: &request.reply_to,
            citations: &citations,
        };
        let content = self.complete(&input, &fragments, request.model.as_deref())?;

        Ok(GenerationOutput {
            request_type: request.request_type,
            content,
        })
    }

    /// Assemble and invoke with fragments that were normalized already.
    pub(crate) fn complete(
        &self,
        input: &PromptInput<'_>,
        fragments: &[PromptFragment],
        model: Option<&str>,
    ) -> QuillResult<String> {
        let prompt = self.assembler.assemble(input, fragments)?;
        Ok(self.invoker.invoke(&prompt, model)?)
    }
}
