use clap::Parser;
use reach_poster::config::Config;
use reach_poster::daemon;
use reach_poster::error::Result;

#[derive(Parser, Debug)]
#[command(name = "reach-posterd")]
#[command(about = "Reach Poster HTTP service and schedule poller")]
struct Cli {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// JSON config file; the environment is used when omitted.
    #[arg(long, env = "REACH_POSTER_CONFIG")]
    config: Option<String>,

    #[arg(long)]
    db: Option<String>,

    /// Serve the API without firing schedules.
    #[arg(long, default_value_t = false)]
    no_scheduler: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    reach_poster::logging::init_tracing("reach_posterd");
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.db_path = Some(db);
    }
    if cli.no_scheduler {
        config.scheduler.enabled = false;
    }
    tracing::info!(
        version = reach_poster::VERSION,
        git_sha = reach_poster::GIT_SHA,
        db_path = %config.db_path(),
        "Starting reach-posterd"
    );

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutdown requested");
    };
    daemon::run_with_shutdown(&cli.host, cli.port, config, shutdown).await
}
