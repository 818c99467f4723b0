//! CLI entrypoint for Ledger Assistant
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Result, bail};
use clap::Parser;
use ledger_application::{AssistantEngine, PendingActionWorkflow};
use ledger_domain::UserId;
use ledger_infrastructure::{
    AnthropicProvider, BusinessStore, ConfigLoader, FileSettingsSource, InMemoryConversationStore,
    InMemoryPendingActionStore, JsonlConversationLogger, Severity, ToolRegistry,
};
use ledger_presentation::{
    ChatRepl, ChatSession, Cli, ConsoleFormatter, ConsoleRenderer, EventSink, NdjsonWriter,
    OutputFormat, WaitingSpinner,
};
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Log to stderr, or to daily files under `log_dir`. The returned guard
/// must live until exit so buffered lines are flushed.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"), // -vvv or more
        }
    };

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "ledger-assistant.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(io::stderr)
                .init();
            None
        }
    }
}

/// Periodically flip overdue actions to `EXPIRED`. Lookups already treat
/// them as gone; this only tidies storage.
fn spawn_expiry_sweep(workflow: PendingActionWorkflow, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if let Err(e) = workflow.expire_old_actions().await {
                warn!(error = %e, "Pending action sweep failed");
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.verbose, cli.log_dir.as_deref());

    if cli.show_config {
        println!("Configuration sources (lowest to highest priority):");
        for source in ConfigLoader::describe_sources(cli.config.as_ref()) {
            println!("  {}", source);
        }
        return Ok(());
    }

    info!("Starting Ledger Assistant");

    // === Configuration ===
    let config = match ConfigLoader::load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => bail!("Failed to load configuration: {}", e),
    };
    let mut has_errors = false;
    for issue in config.validate() {
        match issue.severity {
            Severity::Warning => warn!("{}", issue),
            Severity::Error => {
                error!("{}", issue);
                has_errors = true;
            }
        }
    }
    if has_errors {
        bail!("Invalid configuration. Run with --show-config to see which files were read.");
    }

    // === Dependency Injection ===
    let user_id = UserId::new(config.assistant.user_id.clone());
    let store = Arc::new(BusinessStore::with_sample_data(&user_id));
    let tools = ToolRegistry::builder()
        .register_invoice_tools(Arc::clone(&store))
        .register_reminder_tools(Arc::clone(&store))
        .build();

    let mut engine = AssistantEngine::new(
        Arc::new(AnthropicProvider::new()),
        Arc::new(tools),
        Arc::new(InMemoryConversationStore::new()),
        Arc::new(InMemoryPendingActionStore::new()),
        Arc::new(FileSettingsSource::new(cli.config.clone())),
    )
    .with_params(config.assistant.to_engine_params())
    .with_entity_resolver(store);

    if let Some(dir) = &config.assistant.transcript_dir {
        match JsonlConversationLogger::in_dir(dir) {
            Some(logger) => {
                info!(path = %logger.path().display(), "Writing conversation transcript");
                engine = engine.with_conversation_logger(Arc::new(logger));
            }
            None => warn!(dir = %dir.display(), "Transcript directory unavailable, not logging"),
        }
    }

    let mut session = ChatSession::new(engine, user_id);
    let streaming = !cli.no_stream;

    // Chat mode
    if cli.chat {
        if config.assistant.sweep_interval_secs > 0 {
            spawn_expiry_sweep(
                session.engine().pending_actions(),
                Duration::from_secs(config.assistant.sweep_interval_secs),
            );
        }
        let mut repl = ChatRepl::new(session)
            .with_streaming(streaming)
            .with_model(config.provider.model.clone());
        repl.run().await?;
        return Ok(());
    }

    // Single message mode - message is required
    let message = match cli.message.as_deref() {
        Some(m) if !m.trim().is_empty() => m.to_string(),
        _ => bail!("Message is required. Use --chat for interactive mode."),
    };

    let show_spinner =
        !cli.quiet && cli.output_format() == OutputFormat::Console && io::stderr().is_terminal();
    let mut spinner = if show_spinner {
        WaitingSpinner::start("Thinking...")
    } else {
        WaitingSpinner::hidden()
    };

    match (cli.output_format(), streaming) {
        (OutputFormat::Json, true) => {
            let mut sink = NdjsonWriter::new(io::stdout());
            session.stream(&message, &mut sink, &mut spinner).await?;
        }
        (OutputFormat::Json, false) => {
            let reply = session.send(&message).await?;
            NdjsonWriter::new(io::stdout()).write_value(&reply)?;
        }
        (OutputFormat::Console, true) => {
            let mut sink = ConsoleRenderer::new(io::stdout());
            let deferred = session
                .stream(&message, &mut sink as &mut dyn EventSink, &mut spinner)
                .await?;
            if deferred > 0 {
                println!();
                println!("Pending actions can only be approved in chat mode (--chat).");
            }
        }
        (OutputFormat::Console, false) => {
            let reply = session.send(&message).await?;
            spinner.stop();
            println!("{}", ConsoleFormatter::format_reply(&reply, chrono::Utc::now()));
            if !reply.pending_actions.is_empty() {
                println!("Pending actions can only be approved in chat mode (--chat).");
            }
        }
    }

    Ok(())
}
