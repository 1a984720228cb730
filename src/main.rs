//! quill CLI: generate discussion posts, papers and replies from course material.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr};

use quill::batch::{BatchOrchestrator, SharedContext, parse_batch};
use quill::config::QuillConfig;
use quill::generate::{GenerationForm, Generator};
use quill::paths::QuillPaths;
use quill::prompt::{PolicyTable, RequestType};
use quill::session::{SessionSnapshot, StoredFile};

#[derive(Parser)]
#[command(name = "quill", version, about = "Coursework writing assistant")]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/quill/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one piece of writing. Unset fields fall back to the saved session.
    Generate {
        /// discussion, paper, response or batch-item.
        #[arg(long = "type", default_value = "discussion")]
        request_type: String,

        /// Free-text context.
        #[arg(long)]
        context: Option<String>,

        /// Additional instructions, passed through verbatim.
        #[arg(long)]
        instructions: Option<String>,

        /// Page count for papers.
        #[arg(long)]
        pages: Option<String>,

        /// The post to reply to (response type).
        #[arg(long)]
        post: Option<String>,

        /// Extra files for this call only, after the session's stored files.
        #[arg(long = "file")]
        files: Vec<PathBuf>,

        /// Source URL for a file, as INDEX=URL. Indices cover stored files first.
        #[arg(long = "source", value_parser = parse_source)]
        sources: Vec<(usize, String)>,

        /// Model override.
        #[arg(long)]
        model: Option<String>,
    },

    /// Reply to many posts separated by `---` lines.
    Batch {
        /// File holding the posts.
        #[arg(long)]
        posts: PathBuf,

        #[arg(long)]
        context: Option<String>,

        #[arg(long)]
        instructions: Option<String>,

        #[arg(long)]
        model: Option<String>,
    },

    /// Print the work items parsed from a batch file as JSON.
    ParseBatch {
        file: PathBuf,
    },

    /// Inspect or edit the saved session.
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Print the active style-policy table as TOML.
    Policies,
}

#[derive(Subcommand)]
enum SessionAction {
    /// Show saved fields and stored files.
    Show,
    /// Store files for later generations.
    Add {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Set or clear (empty URL) the source URL of a stored file.
    Source { index: usize, url: String },
    /// Remove a stored file.
    Remove { index: usize },
    /// Delete the saved session entirely.
    Reset,
}

fn parse_source(raw: &str) -> std::result::Result<(usize, String), String> {
    let (index, url) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=URL, got \"{raw}\""))?;
    let index = index
        .trim()
        .parse()
        .map_err(|_| format!("invalid index \"{index}\""))?;
    Ok((index, url.trim().to_string()))
}

fn non_empty(value: &str) -> Option<String> {
    (!value.trim().is_empty()).then(|| value.to_string())
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", path.display()))
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let paths = QuillPaths::resolve()?;
    let config_path = cli.config.clone().unwrap_or_else(|| paths.config_file());
    let config = QuillConfig::load_or_default(&config_path)?;
    let session_path = paths.session_file();

    match cli.command {
        Commands::Generate {
            request_type,
            context,
            instructions,
            pages,
            post,
            files,
            sources,
            model,
        } => {
            let mut session = SessionSnapshot::load(&session_path)?;

            let mut resources = session.resources()?;
            for path in &files {
                resources.push(StoredFile::read(path)?.to_resource()?);
            }
            for (index, url) in sources {
                let len = resources.len();
                let resource = resources
                    .get_mut(index)
                    .ok_or_else(|| miette::miette!("no file at index {index} ({len} files)"))?;
                resource.source_url = url;
            }

            let form = GenerationForm {
                request_type,
                context: context.unwrap_or_else(|| session.context.clone()),
                additional_instructions: instructions
                    .unwrap_or_else(|| session.additional_instructions.clone()),
                page_count: pages.or_else(|| non_empty(&session.page_count)),
                discussion_post: post.or_else(|| non_empty(&session.discussion_post)),
                file_sources: None,
                model: model.or_else(|| non_empty(&session.ai_model)),
                files: resources,
            };
            let request = form.into_request()?;

            let generator = Generator::from_config(&config)?;
            let output = generator.generate(&request)?;
            println!("{}", output.content);

            session.context = request.context;
            session.additional_instructions = request.additional_instructions;
            if let Some(pages) = request.page_count {
                session.page_count = pages;
            }
            if request.request_type.is_reply() {
                session.discussion_post = request.reply_to;
            }
            session.ai_model = request.model.unwrap_or_default();
            session.active_tab = output.request_type.to_string();
            session.generated_content = output.content;
            session.save(&session_path)?;
        }

        Commands::Batch {
            posts,
            context,
            instructions,
            model,
        } => {
            let session = SessionSnapshot::load(&session_path)?;
            let items = parse_batch(&read_text(&posts)?);
            if items.is_empty() {
                eprintln!("No posts found in {}", posts.display());
                return Ok(());
            }

            let shared = SharedContext {
                context: context.unwrap_or_else(|| session.context.clone()),
                additional_instructions: instructions
                    .unwrap_or_else(|| session.additional_instructions.clone()),
                resources: session.resources()?,
                model: model.or_else(|| non_empty(&session.ai_model)),
            };

            let generator = Generator::from_config(&config)?;
            let mut stdout = std::io::stdout().lock();
            let mut failed = 0usize;
            for event in BatchOrchestrator::new(&generator).events(&items, &shared) {
                eprintln!(
                    "[{}/{}] {}",
                    event.processed, event.total, event.result.display_name
                );
                let result = event.result;
                let body = match (result.output_text(), result.failure_reason()) {
                    (Some(text), _) => text.to_string(),
                    (None, reason) => {
                        failed += 1;
                        format!("Error: {}", reason.unwrap_or_default())
                    }
                };
                writeln!(stdout, "=== {} ===\n{}\n", result.display_name, body).into_diagnostic()?;
            }
            if failed > 0 {
                eprintln!("{failed} of {} posts failed", items.len());
            }
        }

        Commands::ParseBatch { file } => {
            let items = parse_batch(&read_text(&file)?);
            let json = serde_json::to_string_pretty(&items).into_diagnostic()?;
            println!("{json}");
        }

        Commands::Session { action } => match action {
            SessionAction::Show => {
                let session = SessionSnapshot::load(&session_path)?;
                println!("Session: {}", session_path.display());
                println!("  tab:          {}", session.active_tab);
                println!("  model:        {}", non_empty(&session.ai_model).unwrap_or_else(|| config.provider.model.clone()));
                println!("  page count:   {}", session.page_count);
                println!("  context:      {} chars", session.context.chars().count());
                println!("  instructions: {} chars", session.additional_instructions.chars().count());
                println!("  post:         {} chars", session.discussion_post.chars().count());
                println!("  last output:  {} chars", session.generated_content.chars().count());
                if session.stored_files.is_empty() {
                    println!("  files:        (none)");
                } else {
                    println!("  files:");
                    for (i, file) in session.stored_files.iter().enumerate() {
                        let source = if file.source_url.is_empty() {
                            String::new()
                        } else {
                            format!("  <{}>", file.source_url)
                        };
                        println!("    [{i}] {} ({}){source}", file.name, file.content_type);
                    }
                }
            }
            SessionAction::Add { files } => {
                let mut session = SessionSnapshot::load(&session_path)?;
                for path in &files {
                    let file = StoredFile::read(path)?;
                    println!("Added [{}] {}", session.stored_files.len(), file.name);
                    session.add_file(file);
                }
                session.save(&session_path)?;
            }
            SessionAction::Source { index, url } => {
                let mut session = SessionSnapshot::load(&session_path)?;
                session.set_source(index, url.trim())?;
                session.save(&session_path)?;
            }
            SessionAction::Remove { index } => {
                let mut session = SessionSnapshot::load(&session_path)?;
                let removed = session.remove_file(index)?;
                session.save(&session_path)?;
                println!("Removed {}", removed.name);
            }
            SessionAction::Reset => {
                if SessionSnapshot::reset(&session_path)? {
                    println!("Session cleared.");
                } else {
                    println!("No saved session.");
                }
            }
        },

        Commands::Policies => {
            let table = match &config.policies {
                Some(path) => PolicyTable::from_path(path)?,
                None => PolicyTable::bundled()?,
            };
            let toml = table.to_toml()?;
            println!("# request types: {}", RequestType::ALL.map(|t| t.as_str()).join(", "));
            print!("{toml}");
        }
    }

    Ok(())
}
