//! ai-synth CLI: 以标准模式或 Pro 模式（Best-of-N）回答提示词的命令行工具
//!
//! Usage:
//!   ai-synth-cli ask [OPTIONS] <prompt...>     Answer a prompt
//!   ai-synth-cli config [--config <path>]      Show the resolved configuration
//!   ai-synth-cli version | help

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

use ai_synth::telemetry::TracingRunSink;
use ai_synth::{BestOfN, CompletionRequest, Message, ResponseMode, SynthConfig};

const DEFAULT_CONFIG_FILE: &str = "ai-synth.yaml";

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    init_tracing();

    let result = match args[1].as_str() {
        "ask" => cmd_ask(&args[2..]).await,
        "config" => cmd_config(&args[2..]),
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(true)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(true)
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            Ok(false)
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_usage() {
    println!(
        r#"ai-synth-cli: Best-of-N 响应合成命令行工具

USAGE:
    ai-synth-cli <COMMAND> [OPTIONS]

COMMANDS:
    ask [OPTIONS] <prompt...>   Answer a prompt (pro mode by default)
    config [--config <path>]    Show the resolved configuration
    version                     Show version information
    help                        Show this help message

ASK OPTIONS:
    --config <path>             Configuration file (default: ./{DEFAULT_CONFIG_FILE})
    --candidates <n>            Number of candidates (1-10)
    --standard                  Single completion call, no synthesis
    --system <text>             System instruction
    --verbose                   Print every candidate's status

ENVIRONMENT:
    AI_SYNTH_CONFIG             Configuration file path
    AI_SYNTH_API_STYLE          openai_compatible | anthropic_messages | gemini_generate
    AI_SYNTH_BASE_URL           Endpoint base URL
    AI_SYNTH_MODEL              Model identifier
    AI_SYNTH_CANDIDATES         Default candidate count
    AI_HTTP_TIMEOUT_SECS        Per-call timeout
    AI_PROXY_URL                HTTP proxy
    <PROVIDER>_API_KEY          API key fallback
    RUST_LOG                    Log filter (default: warn)"#
    );
}

fn cmd_version() {
    println!("ai-synth-cli {}", env!("CARGO_PKG_VERSION"));
}

#[derive(Debug, Default)]
struct AskArgs {
    config: Option<PathBuf>,
    candidates: Option<usize>,
    standard: bool,
    system: Option<String>,
    verbose: bool,
    prompt: Vec<String>,
}

fn parse_ask_args(args: &[String]) -> anyhow::Result<AskArgs> {
    let mut out = AskArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                out.config = Some(PathBuf::from(iter.next().context("--config needs a path")?))
            }
            "--candidates" | "-n" => {
                let raw = iter.next().context("--candidates needs a number")?;
                let n: usize = raw
                    .parse()
                    .with_context(|| format!("invalid candidate count: {raw}"))?;
                if n == 0 {
                    bail!("--candidates must be at least 1");
                }
                out.candidates = Some(n);
            }
            "--standard" => out.standard = true,
            "--system" => {
                out.system = Some(iter.next().context("--system needs text")?.clone())
            }
            "--verbose" | "-v" => out.verbose = true,
            "--" => {
                out.prompt.extend(iter.by_ref().cloned());
            }
            flag if flag.starts_with("--") => bail!("unknown option: {flag}"),
            word => out.prompt.push(word.to_string()),
        }
    }
    Ok(out)
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    if let Ok(p) = std::env::var("AI_SYNTH_CONFIG") {
        return Some(PathBuf::from(p));
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    local.exists().then_some(local)
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<SynthConfig> {
    let config = match resolve_config_path(explicit) {
        Some(path) => {
            let mut cfg = SynthConfig::from_yaml_file(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            cfg.apply_env_overrides()?;
            cfg
        }
        None => SynthConfig::from_env().context("no config file found and environment incomplete")?,
    };
    config.validate()?;
    Ok(config)
}

async fn cmd_ask(args: &[String]) -> anyhow::Result<bool> {
    let ask = parse_ask_args(args)?;
    if ask.prompt.is_empty() {
        bail!("missing prompt (usage: ai-synth-cli ask [OPTIONS] <prompt...>)");
    }
    let config = load_config(ask.config.as_deref())?;

    let mut builder = CompletionRequest::builder(config.provider.model.clone())
        .temperature(config.best_of_n.standard_temperature);
    if let Some(system) = &ask.system {
        builder = builder.message(Message::system(system.clone()));
    }
    let request = builder.message(Message::user(ask.prompt.join(" "))).build()?;

    let mode = if ask.standard {
        ResponseMode::Standard
    } else {
        ResponseMode::Pro {
            candidates: ask
                .candidates
                .unwrap_or(config.best_of_n.default_candidates),
        }
    };

    let pipeline = BestOfN::from_config(&config)?.with_sink(Arc::new(TracingRunSink));
    let outcome = pipeline.respond(&request, mode).await;

    if ask.verbose {
        for (i, candidate) in outcome.candidates.iter().enumerate() {
            match candidate {
                Ok(text) => eprintln!("[candidate {}] ok ({} chars)", i + 1, text.len()),
                Err(f) => eprintln!("[candidate {}] {}: {}", i + 1, f.kind, f.reason),
            }
        }
        eprintln!("[elapsed] {} ms", outcome.elapsed_ms());
    }

    match outcome.final_answer {
        Ok(text) => {
            println!("{text}");
            Ok(true)
        }
        Err(failure) => {
            eprintln!("Error ({}): {}", failure.kind, failure.reason);
            Ok(false)
        }
    }
}

fn cmd_config(args: &[String]) -> anyhow::Result<bool> {
    let mut explicit = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            explicit = Some(PathBuf::from(iter.next().context("--config needs a path")?));
        }
    }
    let config = load_config(explicit.as_deref())?;
    print!("{}", serde_yaml::to_string(&config)?);
    println!(
        "# api key: {}",
        if config.provider.resolve_api_key().is_some() {
            "found"
        } else {
            "not found"
        }
    );
    Ok(true)
}
