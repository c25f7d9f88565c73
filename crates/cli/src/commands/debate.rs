//! `symposium debate`: single-shot or interactive debates.

use std::collections::HashMap;
use std::io::Write;
use symposium_agent::{DebateAnswer, DebateApi, DebateEvent, DebateOutcome, RunOutcome};
use symposium_core::turn::Turn;
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;

use super::ConfigPaths;

/// Command-line overrides for one invocation.
pub struct DebateArgs {
    pub topic: Option<String>,
    pub rounds: Option<u32>,
    pub summary: Option<bool>,
    pub tools: Option<bool>,
    pub seed: Option<u64>,
    pub json: bool,
}

pub async fn run(paths: &ConfigPaths, args: DebateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = paths.load()?;
    if let Some(tools) = args.tools {
        config.settings.tools.enabled = tools;
    }
    if let Some(seed) = args.seed {
        config.settings.orchestrator.seed = Some(seed);
    }
    let api = DebateApi::new(config);

    match &args.topic {
        Some(topic) => debate_once(&api, topic, &args).await,
        None => interactive(&api, &args).await,
    }
}

async fn debate_once(api: &DebateApi, topic: &str, args: &DebateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut request = api.session(topic);
    if let Some(rounds) = args.rounds {
        request.rounds = rounds;
    }
    if let Some(summary) = args.summary {
        request.enable_summary = summary;
    }

    let names: HashMap<String, String> = api
        .config()
        .personas
        .iter()
        .map(|p| (p.id.clone(), p.name.clone()))
        .collect();

    let mut orchestrator = api.orchestrator()?;
    let printer = if args.json {
        None
    } else {
        let (tx, mut rx) = mpsc::channel(32);
        orchestrator = orchestrator.with_events(tx);
        Some(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                print_event(&event, &names);
            }
        }))
    };

    // Ctrl+C stops the debate at the next turn boundary
    let token = orchestrator.cancellation_token();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let result = orchestrator.run(request).await;
    watcher.abort();
    drop(orchestrator);
    if let Some(printer) = printer {
        printer.await?;
    }

    let outcome = result?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&DebateAnswer::from(&outcome))?);
    } else {
        print_footer(&outcome);
    }
    Ok(())
}

async fn interactive(api: &DebateApi, args: &DebateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = &api.config().settings;
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        Symposium — Interactive Debate        ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Backend:   {}", settings.model.backend);
    println!("  Model:     {}", settings.model.name);
    println!("  Roster:    {}", api.config().roster().join(", "));
    println!("  Rounds:    {}", args.rounds.unwrap_or(settings.rounds));
    println!("  Tools:     {}", if settings.tools.enabled { "on" } else { "off" });
    println!();
    println!("  Type a topic and press Enter.");
    println!("  Type 'quit' or 'exit' to leave.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  Topic > ");
        std::io::stdout().flush()?;

        let interrupt = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        let Some(line) = next_topic(&mut lines, interrupt).await? else {
            break;
        };
        let topic = line.trim();
        if topic.is_empty() {
            continue;
        }
        if matches!(topic.to_lowercase().as_str(), "quit" | "exit") {
            break;
        }

        debate_once(api, topic, args).await?;
    }

    println!();
    println!("  Goodbye.");
    println!();
    Ok(())
}

/// The next input line, or `None` at end of input or once `interrupt`
/// completes. Ctrl+C at the prompt goes through `interrupt`.
async fn next_topic<R: AsyncBufRead + Unpin>(
    lines: &mut Lines<R>,
    interrupt: impl Future<Output = ()>,
) -> std::io::Result<Option<String>> {
    tokio::select! {
        line = lines.next_line() => line,
        () = interrupt => Ok(None),
    }
}

fn display_name<'a>(names: &'a HashMap<String, String>, id: &'a str) -> &'a str {
    names.get(id).map(String::as_str).unwrap_or(id)
}

fn print_event(event: &DebateEvent, names: &HashMap<String, String>) {
    match event {
        DebateEvent::Started { topic, rounds, roster, .. } => {
            let speakers: Vec<&str> = roster.iter().map(|id| display_name(names, id)).collect();
            println!();
            println!("  Topic:  {topic}");
            println!("  {} rounds with {}", rounds, speakers.join(", "));
        }
        DebateEvent::Turn { turn } => {
            if turn.turn_index == 0 {
                println!();
                println!("  ── Round {} ──", turn.round_index);
            }
            print_turn(turn, display_name(names, &turn.speaker));
        }
        DebateEvent::Summary { turn } => {
            println!();
            println!("  ── Summary ──");
            print_turn(turn, display_name(names, &turn.speaker));
        }
        DebateEvent::Completed { .. } => {}
    }
}

fn print_turn(turn: &Turn, name: &str) {
    println!();
    if turn.is_failed() {
        println!("  {name} > (no response)");
        return;
    }
    for invocation in &turn.tool_invocations {
        let status = if invocation.success { "ok" } else { "failed" };
        println!("  [{} \"{}\" {}]", invocation.tool, invocation.query, status);
    }
    for line in turn.content.lines() {
        println!("  {name} > {line}");
    }
}

fn print_footer(outcome: &DebateOutcome) {
    println!();
    if outcome.outcome == RunOutcome::Cancelled {
        println!("  Debate cancelled after {} turns.", outcome.transcript.len());
    }
    let failed = outcome.transcript.iter().filter(|t| t.is_failed()).count();
    if failed > 0 {
        println!("  {failed} turn(s) failed; see the log for details.");
    }
    if outcome.persistence_degraded {
        println!("  Transcript could not be saved in full.");
    }
    println!("  Session: {}", outcome.session.id);
    println!();
}
