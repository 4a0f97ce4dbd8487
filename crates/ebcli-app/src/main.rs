//! ebcli entry point.
//!
//! Reads and writes CSR registers on a LiteX target over Etherbone/UDP.
//! Commands come from `--exec`, a `--script` file and the interactive
//! console, in that order. `quit` in any of them ends the run.

mod repl;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use ebcli_net::UdpConnector;
use ebcli_terminal::script::{run_file, run_inline};
use ebcli_terminal::{CommandRouter, Flow, Session, Style, StyleMode};
use ebcli_types::config::{CliConfig, expand_tilde};
use ebcli_types::target::Target;

#[derive(Parser, Debug)]
#[command(name = "ebcli", version)]
#[command(about = "LiteX Etherbone/UDP register access")]
struct Args {
    /// FPGA target host[:port] [default: 192.168.1.50:1234]
    #[arg(short, long)]
    target: Option<String>,

    /// CSR CSV file
    #[arg(short, long)]
    csr: Option<PathBuf>,

    /// Execute semicolon-delimited commands
    #[arg(short, long)]
    exec: Option<String>,

    /// Interactive command mode
    #[arg(short, long)]
    interactive: bool,

    /// Script file to execute
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Config file [default: <config dir>/ebcli/config.toml]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read reply timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl Args {
    /// Whether any command source was given.
    fn has_work(&self) -> bool {
        self.interactive || self.script.is_some() || self.exec.is_some()
    }

    /// File config with command-line overrides applied.
    fn resolve_config(&self) -> Result<CliConfig> {
        let mut config = CliConfig::load(self.config.as_deref())?;
        if let Some(target) = &self.target {
            config.target = target.clone();
        }
        match &self.csr {
            Some(csr) => config.csr = Some(csr.clone()),
            None => {
                config.csr = config
                    .csr
                    .map(|p| expand_tilde(&p.to_string_lossy()));
            },
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout_ms = ms;
        }
        anyhow::ensure!(config.timeout_ms > 0, "timeout must be at least 1 ms");
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    if !args.has_work() {
        Args::command().print_help()?;
        return Ok(());
    }

    let config = args.resolve_config()?;
    let target: Target = config.target.parse()?;
    let connector = UdpConnector::new(Duration::from_millis(config.timeout_ms));
    log::info!("connecting to {target}");
    let session = Session::open(
        Box::new(connector),
        target,
        config.csr.as_deref(),
        args.interactive,
    )
    .with_context(|| format!("cannot open session to {}", config.target))?;

    let style = if args.interactive {
        Style::new(StyleMode::Interactive)
    } else {
        Style::new(StyleMode::Plain)
    };
    let mut router = CommandRouter::with_builtins(session.into_shared(), style);

    let result = run_stages(&args, &config, &mut router);
    if let Err(e) = router.close() {
        log::warn!("closing transport: {e}");
    }
    result
}

/// Run exec, script and interactive stages until one of them quits.
fn run_stages(args: &Args, config: &CliConfig, router: &mut CommandRouter) -> Result<()> {
    let mut out = io::stdout();

    if let Some(commands) = &args.exec {
        if run_inline(router, commands, &mut out)? == Flow::Quit {
            return Ok(());
        }
    }
    if let Some(path) = &args.script {
        if run_file(router, path, &mut out)? == Flow::Quit {
            return Ok(());
        }
    }
    if args.interactive {
        repl::run(router, config)?;
    }
    Ok(())
}
