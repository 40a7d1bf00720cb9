//! Interactive REPL for the deep-research agent engine.
//!
//! Owns everything the core explicitly leaves out: environment-variable
//! configuration, the concrete provider/tool/repository adapters, and the
//! command loop itself. The core crates only ever see already-resolved
//! values and trait objects.

mod config;
mod error;

use std::io::Write as _;
use std::sync::Arc;

use layer0::{CancelToken, EventBus, EventType, Session, SessionId};
use research_bus::LocalEventBus;
use research_core::{ResearchService, SessionService};
use research_llm_anthropic::Anthropic;
use research_session_fs::FsSessionRepository;
use research_tool::builtin::{FetchTool, HttpProvider, SearchTool};
use research_tool::ToolRegistry;

use crate::config::CliConfig;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    match run().await {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            eprintln!("deepagent: {err}");
            std::process::exit(1);
        }
    }
}

/// REPL state that survives across commands within one process lifetime.
struct Repl {
    service: ResearchService<Anthropic>,
    sessions: SessionService,
    current: Option<Session>,
    verbose: bool,
}

async fn run() -> Result<(), CliError> {
    let config = CliConfig::from_env()?;

    let provider =
        Anthropic::new(config.llm_api_key.clone()).model(config.model.clone()).with_timeout(config.request_timeout);

    let mut tools = ToolRegistry::new();
    if let Some(search_api_key) = &config.search_api_key {
        let http = HttpProvider::new(config.search_endpoint.clone(), search_api_key.clone());
        tools.register(Arc::new(SearchTool::new(http.clone())));
        tools.register(Arc::new(FetchTool::new(http)));
    }

    let bus: Arc<dyn EventBus> = Arc::new(LocalEventBus::new());
    let service = ResearchService::new(provider, Arc::new(tools), Arc::clone(&bus), config.engine.clone());

    std::fs::create_dir_all(&config.state_dir)?;
    let repo = Arc::new(FsSessionRepository::new(&config.state_dir));
    let sessions = SessionService::new(repo);

    let current = sessions.load_last().await.ok().flatten();
    let mut repl = Repl { service, sessions, current, verbose: false };

    println!("deepagent — type /help for commands, /quit to exit.");
    repl_loop(&mut repl, bus).await
}

async fn repl_loop(repl: &mut Repl, bus: Arc<dyn EventBus>) -> Result<(), CliError> {
    let stdin = tokio::io::stdin();
    let mut lines = tokio::io::AsyncBufReadExt::lines(tokio::io::BufReader::new(stdin));

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let line = tokio::select! {
            line = lines.next_line() => line.map_err(CliError::Io)?,
            _ = tokio::signal::ctrl_c() => {
                println!("\ninterrupted, persisting session...");
                persist_current(repl).await;
                return Ok(());
            }
        };

        let Some(line) = line else {
            persist_current(repl).await;
            return Ok(());
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if matches!(line, "/quit" | "/exit") {
            persist_current(repl).await;
            return Ok(());
        }

        if let Err(err) = dispatch(repl, line, &bus).await {
            eprintln!("error: {err}");
        }
    }
}

async fn persist_current(repl: &Repl) {
    if let Some(session) = &repl.current {
        if let Err(err) = repl.sessions.save(session).await {
            eprintln!("warning: failed to persist session: {err}");
        }
    }
}

async fn dispatch(repl: &mut Repl, line: &str, bus: &Arc<dyn EventBus>) -> Result<(), CliError> {
    let (command, rest) = split_command(line);

    match command {
        "/help" => {
            print_help();
            Ok(())
        }
        "/verbose" => {
            repl.verbose = !repl.verbose;
            println!("verbose mode {}", if repl.verbose { "on" } else { "off" });
            if repl.verbose {
                spawn_verbose_listener(bus).await;
            }
            Ok(())
        }
        "/model" => {
            if rest.is_empty() {
                println!("{}", repl.service.model());
            } else {
                repl.service.set_model(rest.to_string());
                println!("model set to {rest}");
            }
            Ok(())
        }
        "/sessions" => cmd_sessions(repl).await,
        "/load" => cmd_load(repl, rest).await,
        "/fast" => cmd_fast(repl, rest).await,
        "/deep" => cmd_deep(repl, rest).await,
        "/rerun" => cmd_rerun(repl, rest).await,
        "/recompile" => cmd_recompile(repl, rest).await,
        "/expand" => cmd_expand(repl, rest).await,
        other if other.starts_with('/') => {
            println!("unknown command: {other} (try /help)");
            Ok(())
        }
        _ => cmd_expand(repl, line).await,
    }
}

fn split_command(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) if cmd.starts_with('/') => (cmd, rest.trim()),
        _ if line.starts_with('/') => (line, ""),
        _ => ("", line),
    }
}

async fn cmd_sessions(repl: &Repl) -> Result<(), CliError> {
    let summaries = repl.sessions.list().await?;
    if summaries.is_empty() {
        println!("no sessions yet");
        return Ok(());
    }
    for summary in summaries {
        println!(
            "{}  [{:?}]  {}  ({})",
            summary.id.as_str(),
            summary.status,
            truncate_for_display(&summary.query, 60),
            summary.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

async fn cmd_load(repl: &mut Repl, rest: &str) -> Result<(), CliError> {
    if rest.is_empty() {
        println!("usage: /load <id>");
        return Ok(());
    }
    let session = repl.sessions.load(&SessionId::new(rest)).await?;
    println!("loaded session {} ({:?})", session.id.as_str(), session.status);
    repl.current = Some(session);
    Ok(())
}

async fn cmd_fast(repl: &mut Repl, rest: &str) -> Result<(), CliError> {
    if rest.is_empty() {
        println!("usage: /fast <query>");
        return Ok(());
    }
    let session = repl.service.run_fast(rest, &CancelToken::new()).await;
    print_report(&session);
    repl.sessions.save(&session).await?;
    repl.current = Some(session);
    Ok(())
}

async fn cmd_deep(repl: &mut Repl, rest: &str) -> Result<(), CliError> {
    if rest.is_empty() {
        println!("usage: /deep <query>");
        return Ok(());
    }
    let session = repl.service.run_deep(rest, &CancelToken::new()).await;
    print_report(&session);
    repl.sessions.save(&session).await?;
    repl.current = Some(session);
    Ok(())
}

async fn cmd_rerun(repl: &mut Repl, rest: &str) -> Result<(), CliError> {
    let Some(session) = repl.current.as_mut() else {
        println!("no active session; /load or run one first");
        return Ok(());
    };
    let Ok(worker_num) = rest.trim().parse::<usize>() else {
        println!("usage: /rerun <worker number>");
        return Ok(());
    };
    let Some(index) = session.workers.iter().position(|w| w.worker_num as usize == worker_num) else {
        println!("no worker numbered {worker_num} in the current session");
        return Ok(());
    };

    repl.service
        .rerun_worker(session, index, &CancelToken::new())
        .await
        .map_err(|e| CliError::Config(e.to_string()))?;
    println!("worker {worker_num} rerun; session is now version {}", session.version);
    repl.sessions.save(session).await?;
    Ok(())
}

async fn cmd_recompile(repl: &mut Repl, rest: &str) -> Result<(), CliError> {
    let Some(session) = repl.current.as_mut() else {
        println!("no active session; /load or run one first");
        return Ok(());
    };
    let instructions = if rest.is_empty() { None } else { Some(rest) };
    repl.service
        .recompile(session, instructions)
        .await
        .map_err(|e| CliError::Config(e.to_string()))?;
    println!("{}", session.report);
    repl.sessions.save(session).await?;
    Ok(())
}

async fn cmd_expand(repl: &mut Repl, follow_up: &str) -> Result<(), CliError> {
    let Some(parent) = repl.current.as_mut() else {
        println!("no active session to expand; run /fast or /deep first");
        return Ok(());
    };
    if follow_up.is_empty() {
        println!("usage: /expand <text>, or just type a follow-up");
        return Ok(());
    }
    let child = repl.service.expand(parent, follow_up);
    repl.sessions.save(parent).await?;

    let ran = repl.service.run_expansion(child, &CancelToken::new()).await;
    print_report(&ran);
    repl.sessions.save(&ran).await?;
    repl.current = Some(ran);
    Ok(())
}

fn print_report(session: &Session) {
    println!("--- session {} [{:?}] ---", session.id.as_str(), session.status);
    if session.report.is_empty() {
        println!("(no report produced)");
    } else {
        println!("{}", session.report);
    }
}

fn truncate_for_display(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    }
}

async fn spawn_verbose_listener(bus: &Arc<dyn EventBus>) {
    let mut subscription = bus.subscribe(&[EventType::WorkerStarted, EventType::WorkerComplete, EventType::WorkerFailed, EventType::ToolCallComplete, EventType::IterationComplete]).await;
    tokio::spawn(async move {
        while let Some(event) = subscription.recv().await {
            println!("[event] {:?}", event.data);
        }
    });
}

fn print_help() {
    println!(
        "/fast <query>        single-worker research\n\
/deep <query>        planned multi-worker research\n\
<text> or /expand     continue the current session with a follow-up\n\
/sessions             list saved sessions, newest first\n\
/load <id>            load a saved session\n\
/rerun <n>            re-run worker n of the current session\n\
/recompile [notes]    re-synthesize the report from existing worker output\n\
/model [name]         show or set the active model\n\
/verbose              toggle event-bus logging\n\
/help                 this message\n\
/quit                 exit, persisting the current session"
    );
}
