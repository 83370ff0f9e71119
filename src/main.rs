use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use serde::Serialize;
use tracing::info;

use menustat::config::{Config, OutputFormat, load_config, load_config_from_path};
use menustat::event::{Event, EventHandler};
use menustat::format::{memory_detail, status_line};
use menustat::logging;
use menustat::system::command::ShellRunner;
use menustat::system::publish::icon_options;
use menustat::system::sampler::Sampler;
use menustat::system::scheduler;
use menustat::system::snapshot::Snapshot;

#[derive(Parser)]
#[command(
    name = "menustat",
    about = "Samples CPU, memory, and network usage for a menu bar"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sampling interval in milliseconds
    #[arg(long)]
    interval: Option<u64>,

    /// Output format for each update
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Run a single pass, print it, and exit.
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    event: &'a str,
    interval: u64,
    history_len: usize,
    latest: Option<&'a Snapshot>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_tracing(cli.log_json)?;
    let config = load_config_for_cli(&cli)?;
    let format = config.output.format;

    let (mut events, publisher) = EventHandler::new();
    let publisher = Arc::new(publisher);
    let runner = ShellRunner::from_settings(&config);
    let mut sampler = Sampler::new(runner, &config, publisher.clone())
        .with_commands(config.commands.to_command_set());
    sampler.set_icon_renderer(publisher);

    if cli.once {
        let snapshot = sampler.run_pass().await;
        print_once(&snapshot, sampler.interval().get_ms(), format)?;
        return Ok(());
    }

    let handle = scheduler::start(sampler);

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(event) => print_event(&event, format)?,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received; stopping sampler");
                break;
            }
        }
    }

    let sampler = handle.stop().await?;
    info!(recorded = sampler.history().len(), "shutdown complete");
    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(interval) = cli.interval {
        config.general.interval_ms = interval;
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }

    if config.general.interval_ms == 0 {
        return Err(eyre!("--interval must be greater than 0"));
    }
    if config.general.command_timeout_ms == 0 {
        return Err(eyre!("general.command_timeout_ms must be greater than 0"));
    }

    Ok(config)
}

fn print_event(event: &Event, format: OutputFormat) -> Result<()> {
    match (event, format) {
        (Event::Icons(icons), OutputFormat::Text) => println!("{}", status_line(icons)),
        (Event::Stats { name, payload }, OutputFormat::Json) => {
            let line = JsonLine {
                event: name,
                interval: payload.interval,
                history_len: payload.results.len(),
                latest: payload.results.last(),
            };
            println!("{}", serde_json::to_string(&line)?);
        }
        _ => {}
    }
    Ok(())
}

fn print_once(snapshot: &Snapshot, interval: u64, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{}", status_line(&icon_options(snapshot)));
            if let Some(detail) = memory_detail(snapshot) {
                println!("{detail}");
            }
        }
        OutputFormat::Json => {
            let line = JsonLine {
                event: menustat::system::publish::STATS_UPDATED,
                interval,
                history_len: 1,
                latest: Some(snapshot),
            };
            println!("{}", serde_json::to_string(&line)?);
        }
    }
    Ok(())
}
