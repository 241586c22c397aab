// ============================================================================
// File: src/app.rs
// Interactive search and chat loops
// ============================================================================

use anyhow::{anyhow, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

use crate::client::AnswerClient;
use crate::config::Config;
use crate::error::ClientError;
use crate::markdown::{MarkdownExporter, Transcript};
use crate::models::AnswerResult;
use crate::parser::parse_answer;
use crate::render::{render_answer, render_source_preview, render_sources};
use crate::session::{ChatContext, SearchContext};
use crate::transport::HttpTransport;

pub struct App {
    client: AnswerClient<HttpTransport>,
    max_sources_shown: usize,
    timeout: Option<Duration>,
    output: Option<PathBuf>,
}

impl App {
    pub fn new(config: Config, timeout: Option<Duration>, output: Option<PathBuf>) -> Result<Self> {
        let endpoints = config.endpoints.clone();
        let max_sources_shown = config.max_sources_shown;
        let transport = HttpTransport::new(config)?;

        Ok(Self {
            client: AnswerClient::new(transport, endpoints),
            max_sources_shown,
            timeout,
            output,
        })
    }

    /// One search, printed, then exit
    pub async fn search_once(&self, query: &str) -> Result<()> {
        let mut ctx = SearchContext::new();
        let result = self
            .request("Searching...", self.client.search(&mut ctx, query))
            .await?;
        self.display_result(&result);
        self.export_search(&ctx)
    }

    /// Search, then treat every further line as a follow-up until `/new` or `/quit`
    pub async fn run_ask(&self, initial: Option<String>) -> Result<()> {
        self.print_header(
            "SEARCH",
            "Type a question. /new <query> starts over, /sources lists every source, /quit exits.",
        );
        let mut ctx = SearchContext::new();
        let mut input = stdin_lines();

        if let Some(query) = initial {
            self.search_and_show(&mut ctx, &query).await;
        }

        loop {
            debug!(state = ?ctx.tracker.state(), "awaiting input");
            let prompt = if ctx.has_active_session() { "follow-up ›" } else { "search ›" };
            let Some(line) = read_line(&mut input, prompt).await? else {
                break;
            };
            let line = line.trim();

            match line {
                "" => continue,
                "/quit" | "/exit" => break,
                "/sources" => {
                    if ctx.sources().is_empty() {
                        println!("{}", "No sources yet.".bright_black());
                    } else {
                        print!("{}", render_sources(ctx.sources(), ctx.sources().len()));
                    }
                    continue;
                }
                _ => {}
            }

            if let Some(rest) = line.strip_prefix("/new") {
                if let Some(id) = ctx.current_session_id() {
                    debug!(session = id, "leaving search session");
                }
                ctx.reset();
                println!("{}", "New search started.".bright_black());
                let query = rest.trim();
                if !query.is_empty() {
                    self.search_and_show(&mut ctx, query).await;
                }
            } else if ctx.has_active_session() {
                let outcome = self
                    .request("Thinking...", self.client.follow_up(&mut ctx, line, None))
                    .await;
                self.show_or_report(outcome);
            } else {
                self.search_and_show(&mut ctx, line).await;
            }
        }

        self.export_search(&ctx)
    }

    /// Chat until `/quit`
    pub async fn run_chat(&self) -> Result<()> {
        self.print_header(
            "CHAT",
            "/new starts a conversation, /list shows them, /switch <id>, /delete <id>, /quit exits.",
        );
        let mut ctx = ChatContext::new();
        let mut input = stdin_lines();

        loop {
            let Some(line) = read_line(&mut input, "you ›").await? else {
                break;
            };
            let line = line.trim();
            let (command, arg) = line.split_once(' ').unwrap_or((line, ""));

            match command {
                "" => {}
                "/quit" | "/exit" => break,
                "/new" => {
                    ctx.new_chat();
                    println!("{}", "New conversation.".bright_black());
                }
                "/list" => self.list_conversations(&ctx),
                "/switch" => {
                    if !ctx.select(arg.trim()) {
                        println!("{} no conversation '{}'", "✗".red().bold(), arg.trim());
                    }
                }
                "/delete" => {
                    if !ctx.delete(arg.trim()) {
                        println!("{} no conversation '{}'", "✗".red().bold(), arg.trim());
                    }
                }
                _ => {
                    debug!(session = ?ctx.current_session_id(), "sending chat turn");
                    let start = Instant::now();
                    match self
                        .request("Thinking...", self.client.chat(&mut ctx, line, None))
                        .await
                    {
                        Ok(turn) => {
                            debug!(
                                message = %turn.message.id,
                                session = %turn.result.session_id,
                                "chat turn appended"
                            );
                            println!(
                                "\n{} {}",
                                "●".bright_cyan(),
                                format!("({:.1}s)", start.elapsed().as_secs_f32()).bright_black()
                            );
                            let nodes = parse_answer(&turn.result.answer, &turn.result.sources);
                            println!("{}", render_answer(&nodes));
                            if !turn.result.sources.is_empty() {
                                println!("{}", render_source_preview(&turn.result.sources));
                            }
                            println!();
                        }
                        Err(e) => report(&e),
                    }
                }
            }
        }

        if let (Some(path), Some(session)) = (&self.output, ctx.conversations.current()) {
            MarkdownExporter::new(Transcript::Chat(session)).export(path)?;
            print_exported(path);
        }
        Ok(())
    }

    async fn search_and_show(&self, ctx: &mut SearchContext, query: &str) {
        let outcome = self
            .request("Searching...", self.client.search(ctx, query))
            .await;
        self.show_or_report(outcome);
    }

    fn show_or_report(&self, outcome: Result<AnswerResult>) {
        match outcome {
            Ok(result) => self.display_result(&result),
            Err(e) => report(&e),
        }
    }

    /// Await a client call behind a spinner, racing the optional deadline
    async fn request<T, F>(&self, label: &str, call: F) -> Result<T>
    where
        F: Future<Output = crate::error::Result<T>>,
    {
        let spinner = create_spinner(label);
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| anyhow!("No response after {}s", limit.as_secs())),
            None => Ok(call.await),
        };
        spinner.finish_and_clear();
        Ok(outcome??)
    }

    fn display_result(&self, result: &AnswerResult) {
        debug!(session = %result.session_id, sources = result.sources.len(), "displaying answer");
        println!();
        if result.answer.is_empty() {
            println!("{}", "No answer available for this query.".bright_black());
        } else {
            let nodes = parse_answer(&result.answer, &result.sources);
            println!("{}", render_answer(&nodes));
        }
        println!();
        print!("{}", render_sources(&result.sources, self.max_sources_shown));
        println!();
    }

    fn list_conversations(&self, ctx: &ChatContext) {
        if ctx.conversations.is_empty() {
            println!("{}", "No conversations yet.".bright_black());
            return;
        }
        for session in ctx.conversations.sessions() {
            let marker = if ctx.conversations.current_id() == Some(session.id.as_str()) {
                "●".bright_cyan()
            } else {
                " ".normal()
            };
            println!(
                "{} {} {} {}",
                marker,
                session.title.bright_white(),
                session.id.bright_black(),
                format!("({} messages)", session.messages.len()).bright_black()
            );
        }
    }

    fn export_search(&self, ctx: &SearchContext) -> Result<()> {
        if let Some(path) = &self.output {
            if !ctx.turns().is_empty() {
                MarkdownExporter::new(Transcript::Search(ctx.turns())).export(path)?;
                print_exported(path);
            }
        }
        Ok(())
    }

    fn print_header(&self, mode: &str, help: &str) {
        println!("{}", "\n═══════════════════════════════════════".bright_blue());
        println!("{}", format!("       SUBFEED {}", mode).bright_white().bold());
        println!("{}", "═══════════════════════════════════════".bright_blue());
        println!("{}\n", help.bright_black());
    }
}

fn stdin_lines() -> Lines<BufReader<Stdin>> {
    BufReader::new(tokio::io::stdin()).lines()
}

/// Prompt and read one line; `None` at end of input
async fn read_line(input: &mut Lines<BufReader<Stdin>>, prompt: &str) -> Result<Option<String>> {
    print!("{} ", prompt.green().bold());
    std::io::stdout().flush()?;
    Ok(input.next_line().await?)
}

fn report(err: &anyhow::Error) {
    println!("{} {}", "✗".red().bold(), err.to_string().red());
    if err
        .downcast_ref::<ClientError>()
        .is_some_and(ClientError::is_no_active_session)
    {
        println!("{}", "Ask a question first, or use /new <query>.".bright_black());
    }
}

fn print_exported(path: &Path) {
    println!(
        "\n{} Transcript exported to: {}",
        "✓".green().bold(),
        path.display().to_string().bright_cyan()
    );
}

fn create_spinner(label: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(label.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
