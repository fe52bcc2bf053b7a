use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use serde::Serialize;

use authz_engine::authz::Effect;
use authz_engine::document::PolicyDocument;
use authz_engine::config;

#[derive(Parser, Debug)]
#[command(author, version, about = "evaluate a policy document", long_about = None)]
struct Cli {
    /// Path to the JSON policy document
    file: PathBuf,
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
    /// Override the document's root default decision.
    /// Falls back to AUTHZ_DEFAULT_DECISION, then to the document itself
    #[arg(long, value_enum)]
    default: Option<DefaultDecision>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DefaultDecision {
    Permit,
    Deny,
}

impl From<DefaultDecision> for Effect {
    fn from(value: DefaultDecision) -> Self {
        match value {
            DefaultDecision::Permit => Effect::Permit,
            DefaultDecision::Deny => Effect::Deny,
        }
    }
}

#[derive(Serialize)]
struct Report {
    decision: Effect,
    messages: Vec<String>,
    advice: Vec<String>,
    context: Vec<String>,
}

fn main() -> ExitCode {
    load_env();
    init_tracing();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(Effect::Permit) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(2),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<Effect> {
    let input = fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    let mut document = PolicyDocument::from_json(&input)?;
    if let Some(default) = cli.default {
        document.default = default.into();
    } else if let Some(default) = config::default_decision_from_env()? {
        document.default = default;
    }

    let (mut manager, fired) = document.build()?;
    let decision = manager.decide()?;

    let mut context: Vec<String> = manager
        .authorized_context()
        .keys()
        .map(|key| key.to_string())
        .collect();
    context.sort();

    let report = Report {
        decision,
        messages: manager.authorization_messages().to_vec(),
        advice: fired.labels(),
        context,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("decision: {}", report.decision);
        for message in &report.messages {
            println!("message:  {message}");
        }
        for label in &report.advice {
            println!("advice:   {label}");
        }
        if !report.context.is_empty() {
            println!("context:  {}", report.context.join(", "));
        }
    }

    Ok(decision)
}

fn load_env() {
    if dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
