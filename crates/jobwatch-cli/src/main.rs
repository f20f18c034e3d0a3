use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use jobwatch_sync::{inspect_seen, run_watch, LoopKind, RunOptions, WatchConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "jobwatch")]
#[command(about = "Watch job boards and company career pages, notify on new postings")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the board and company loops side by side.
    Run(RunArgs),
    /// Run only the job-board loop (chat webhook notifications).
    Boards(RunArgs),
    /// Run only the company career-page loop (email notifications).
    Companies(RunArgs),
    /// Show what a loop has already seen.
    Seen {
        #[arg(long = "loop", value_enum)]
        which: LoopArg,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Debug, Default, Args)]
struct RunArgs {
    /// Run one cycle per loop and exit.
    #[arg(long)]
    once: bool,
    /// Log notifications instead of sending them; the seen-set file is not written.
    #[arg(long)]
    dry_run: bool,
}

impl From<&RunArgs> for RunOptions {
    fn from(args: &RunArgs) -> Self {
        RunOptions {
            once: args.once,
            dry_run: args.dry_run,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LoopArg {
    Boards,
    Companies,
}

impl From<LoopArg> for LoopKind {
    fn from(arg: LoopArg) -> Self {
        match arg {
            LoopArg::Boards => LoopKind::Boards,
            LoopArg::Companies => LoopKind::Companies,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,jobwatch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();
    let config = WatchConfig::from_env()?;

    let (kinds, args) = match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => (vec![LoopKind::Boards, LoopKind::Companies], args),
        Commands::Boards(args) => (vec![LoopKind::Boards], args),
        Commands::Companies(args) => (vec![LoopKind::Companies], args),
        Commands::Seen { which, limit } => {
            let kind = LoopKind::from(which);
            let seen = inspect_seen(&config, kind).await;
            println!("{} loop: {} seen identifiers", kind.name(), seen.len());
            for (identifier, first_seen) in seen.newest(limit) {
                println!("  {}  {}", first_seen.to_rfc3339(), identifier);
            }
            return Ok(());
        }
    };

    let shutdown = CancellationToken::new();
    tokio::spawn(forward_shutdown_signal(shutdown.clone()));

    tracing::info!(
        loops = ?kinds.iter().map(|k| k.name()).collect::<Vec<_>>(),
        once = args.once,
        dry_run = args.dry_run,
        "starting jobwatch"
    );
    run_watch(&config, &kinds, RunOptions::from(&args), shutdown).await?;
    tracing::info!("jobwatch stopped");
    Ok(())
}

async fn forward_shutdown_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot listen for SIGTERM; only ctrl-c stops the loops");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("received shutdown signal");
    shutdown.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_run() {
        let cli = Cli::try_parse_from(["jobwatch"]).expect("parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from(["jobwatch", "companies", "--once", "--dry-run"]).expect("parse");
        match cli.command {
            Some(Commands::Companies(args)) => assert!(args.once && args.dry_run),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn seen_requires_loop_name() {
        assert!(Cli::try_parse_from(["jobwatch", "seen"]).is_err());
        let cli = Cli::try_parse_from(["jobwatch", "seen", "--loop", "boards"]).expect("parse");
        assert!(matches!(
            cli.command,
            Some(Commands::Seen { which: LoopArg::Boards, limit: 10 })
        ));
    }
}
