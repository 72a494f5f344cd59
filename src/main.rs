use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use querycache_console::{
    AppState, Args, Command,
    core::{
        api_client::{CacheApi, HttpCacheApi},
        config::ConsoleConfig,
        playground::QueryPlayground,
        render::ResultView,
        stats_poller::StatsPoller,
    },
    logging, web,
};
use serde::Serialize;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();
    logging::init(&args.log_level);

    let config = ConsoleConfig::from_args(&args).context("invalid console configuration")?;

    match args.command() {
        Command::Serve => serve(&config, args.port).await,
        Command::Watch => watch(&config).await,
        Command::Stats => {
            let snapshot = HttpCacheApi::new(&config.api_url)
                .fetch_stats()
                .await
                .context("failed to fetch statistics")?;
            print!("{snapshot}");
            Ok(())
        }
        Command::Query { sql } => {
            let playground = QueryPlayground::new(HttpCacheApi::new(&config.api_url), &config);
            playground.set_sql(sql);
            let result = playground.execute().await?;
            print!("{}", ResultView::from_result(Some(&result)));
            Ok(())
        }
        Command::ClearCache { clear_db } => {
            let playground = QueryPlayground::new(HttpCacheApi::new(&config.api_url), &config);
            let outcome = playground.clear_cache(clear_db).await;
            if !outcome.cleared {
                anyhow::bail!(outcome.message);
            }
            println!("{}", outcome.message);
            Ok(())
        }
        Command::Parse { sql } => {
            let parsed = HttpCacheApi::new(&config.api_url).parse_query(&sql).await?;
            print_json(&parsed)
        }
        Command::Invalidate { sql } => {
            let report = HttpCacheApi::new(&config.api_url).invalidate(&sql).await?;
            print_json(&report)
        }
        Command::Health => {
            let health = HttpCacheApi::new(&config.api_url).health().await?;
            print_json(&health)
        }
    }
}

async fn serve(config: &ConsoleConfig, port: u16) -> anyhow::Result<()> {
    let app_state = AppState::new(config);
    app_state.poller.start();

    let app = web::router(app_state.clone());
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind console port {port}"))?;

    info!(api_url = %config.api_url, "Console API running on http://0.0.0.0:{port}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    app_state.poller.stop();
    Ok(())
}

async fn watch(config: &ConsoleConfig) -> anyhow::Result<()> {
    let poller = StatsPoller::new(HttpCacheApi::new(&config.api_url), config);
    let mut updates = poller.subscribe();
    poller.start();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = updates.changed() => {
                if !changed {
                    break;
                }
                // Clear the screen and home the cursor before redrawing.
                print!("\x1B[2J\x1B[H{}", poller.view());
            }
        }
    }

    poller.stop();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
