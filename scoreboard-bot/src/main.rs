//! scoreboard-bot binary: ledger, Telegram poller and web leaderboard in
//! one process

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scoreboard_bot::{
    chat::Dispatcher,
    config::Args,
    dashboard::{create_router, DashboardState},
    telegram::{Poller, TelegramClient},
};
use scoreboard_ledger::{Leaderboard, LedgerDb, ScoringEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("scoreboard_bot={0},scoreboard_ledger={0},info", log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let policy = args.scoring_policy();

    info!("======================================");
    info!("  Mentoring report scoreboard");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Database: {}", args.database_path.display());
    info!("Reader connections: {}", args.reader_connections);
    info!("Report marker: {}", policy.marker);
    info!("Points per report: {}", policy.award);
    info!("======================================");

    let db = Arc::new(LedgerDb::open(&args.database_path, args.reader_connections)?);

    match db.check_consistency(policy.award) {
        Ok(issues) if issues.is_empty() => info!("Ledger consistency check passed"),
        Ok(issues) => {
            for issue in &issues {
                warn!(
                    handle = %issue.handle,
                    score = ?issue.score,
                    total = ?issue.total_submissions,
                    rows = issue.submission_rows,
                    "Participant aggregate disagrees with submission rows"
                );
            }
        }
        Err(e) => warn!(error = %e, "Ledger consistency check failed to run"),
    }

    let engine = Arc::new(ScoringEngine::new(db.clone(), policy.clone()));
    let leaderboard = Arc::new(Leaderboard::new(db.clone()));

    let client = Arc::new(TelegramClient::new(
        &args.telegram_api_url,
        &args.token,
        args.poll_timeout_secs,
    )?);

    let bot_username = match client.get_me().await {
        Ok(me) => {
            info!(username = ?me.username, "Authenticated with Telegram");
            me.username
        }
        Err(e) => {
            warn!(error = %e, "getMe failed, accepting commands addressed to any bot");
            None
        }
    };

    let dispatcher = Arc::new(Dispatcher::new(
        engine,
        leaderboard.clone(),
        args.scoreboard_limit,
        bot_username,
    ));
    let poller = Poller::new(client.clone(), client, dispatcher);
    let poller_task = tokio::spawn(poller.run());

    let app = create_router(Arc::new(DashboardState::new(leaderboard, policy)));
    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!("Web leaderboard listening on http://{}", args.listen);

    tokio::select! {
        result = async { axum::serve(listener, app).await } => {
            if let Err(e) = result {
                error!(error = %e, "HTTP server stopped");
            }
        }
        result = poller_task => {
            if let Err(e) = result {
                error!(error = %e, "Telegram poller stopped");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!("Closing ledger");
    Ok(())
}
