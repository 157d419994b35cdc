use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::info;

use courier_core::domain::{HttpTask, Notification, NotifyOutcome, TaskMessage};
use courier_core::impls::{InMemoryTransport, ScriptedHttpClient, SentReply};
use courier_core::observability::init_tracing;
use courier_core::{WorkerBuilder, WorkerConfig, WorkerGroup};

#[derive(Debug, Parser)]
#[command(name = "courier", version, about = "Run HTTP request tasks and report the outcome")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run tasks from a JSON-lines file (or `-` for stdin) through the worker.
    Run {
        /// One delivery per line: {"correlation_id": .., "reply_to": .., "body": {"parameters": {..}}}
        #[arg(long, default_value = "-")]
        tasks: String,

        /// Optional TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the number of workers.
        #[arg(long)]
        workers: Option<usize>,

        /// Override the request timeout (seconds).
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Do not touch the network: every request "returns" this status.
        #[arg(long)]
        simulate_status: Option<u16>,
    },

    /// Validate a single task body and print the resolved request.
    Check {
        /// Task body as JSON.
        body: String,
    },
}

/// One inbound line for `run`.
#[derive(Debug, Deserialize)]
struct InboundLine {
    #[serde(default)]
    correlation_id: Option<String>,
    #[serde(default = "default_reply_to")]
    reply_to: String,
    body: serde_json::Value,
}

fn default_reply_to() -> String {
    "reply".to_string()
}

/// One outbound line printed by `run`.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum OutboundLine<'a> {
    Reply(&'a SentReply),
    Notification(&'a Notification),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing("info");

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            tasks,
            config,
            workers,
            timeout_secs,
            simulate_status,
        } => {
            let mut config = match config {
                Some(path) => WorkerConfig::load(&path)?,
                None => WorkerConfig::default(),
            };
            if let Some(n) = workers {
                config.workers = n;
            }
            if let Some(secs) = timeout_secs {
                config.request_timeout_secs = secs;
            }
            config.validate()?;
            run(&tasks, config, simulate_status).await
        }
        Command::Check { body } => check(&body),
    }
}

async fn run(tasks: &str, config: WorkerConfig, simulate_status: Option<u16>) -> Result<ExitCode> {
    let lines = read_lines(tasks)?;

    let transport = Arc::new(InMemoryTransport::new(config.receive_timeout()));
    for (n, line) in lines.iter().enumerate() {
        let inbound: InboundLine = serde_json::from_str(line)
            .with_context(|| format!("line {}: invalid delivery", n + 1))?;
        let correlation_id = inbound
            .correlation_id
            .unwrap_or_else(|| ulid::Ulid::new().to_string());
        let body = serde_json::to_vec(&inbound.body)?;
        transport.push(correlation_id, inbound.reply_to, body).await;
    }
    transport.close().await;
    info!(tasks = lines.len(), workers = config.workers, "starting");

    let mut builder = WorkerBuilder::new()
        .transport(transport.clone())
        .config(config.clone());
    if let Some(status) = simulate_status {
        builder = builder.http_client(Arc::new(ScriptedHttpClient::with_status(status)));
    }
    let worker = Arc::new(builder.build()?);

    let counts = WorkerGroup::spawn(config.workers, worker).join().await;
    info!(
        received = counts.received,
        completed = counts.completed,
        failed = counts.failed,
        "done"
    );

    for reply in transport.replies().await {
        println!("{}", serde_json::to_string(&OutboundLine::Reply(&reply))?);
    }
    for notification in transport.notifications().await {
        println!(
            "{}",
            serde_json::to_string(&OutboundLine::Notification(&notification))?
        );
        if notification.outcome == NotifyOutcome::Failed {
            eprintln!(
                "error: {}: {}",
                notification.correlation_id, notification.message
            );
        }
    }

    Ok(if counts.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn check(body: &str) -> Result<ExitCode> {
    let message = TaskMessage::from_slice(body.as_bytes())?;
    match HttpTask::parse(&message) {
        Ok(task) => {
            println!("{} (expect {})", task.command, task.expected_code);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("error: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn read_lines(source: &str) -> Result<Vec<String>> {
    let reader: Box<dyn Read> = if source == "-" {
        Box::new(std::io::stdin())
    } else {
        let path = Path::new(source);
        Box::new(
            std::fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?,
        )
    };

    let mut lines = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line.context("failed to read tasks")?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_run_flags() {
        let cli = Cli::parse_from([
            "courier",
            "run",
            "--tasks",
            "tasks.jsonl",
            "--workers",
            "3",
            "--simulate-status",
            "204",
        ]);
        match cli.command {
            Command::Run {
                tasks,
                workers,
                simulate_status,
                ..
            } => {
                assert_eq!(tasks, "tasks.jsonl");
                assert_eq!(workers, Some(3));
                assert_eq!(simulate_status, Some(204));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn inbound_line_defaults() {
        let line: InboundLine =
            serde_json::from_str(r#"{"body": {"parameters": {"subcommand": "Get", "url": "http://x"}}}"#)
                .unwrap();
        assert!(line.correlation_id.is_none());
        assert_eq!(line.reply_to, "reply");
    }

    #[test]
    fn outbound_lines_are_tagged() {
        let reply = SentReply {
            destination: "r".into(),
            correlation_id: "c-1".into(),
            report: courier_core::domain::StatusReport::Started,
        };
        let v = serde_json::to_value(OutboundLine::Reply(&reply)).unwrap();
        assert_eq!(v["kind"], "reply");
        assert_eq!(v["report"]["status"], "started");
    }
}
