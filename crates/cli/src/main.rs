use clap::Parser;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use colcap_core::domain::response::ErrorEnvelope;
use colcap_core::error::AggregateError;
use colcap_core::pipeline::Aggregator;

#[derive(Debug, Parser)]
#[command(name = "colcap_cli")]
struct Args {
    /// First day of the range (YYYY-MM-DD). Defaults to 90 days before the end date.
    #[arg(long)]
    start_date: Option<String>,

    /// Last day of the range (YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long)]
    end_date: Option<String>,

    /// Fetch news months one at a time instead of through the worker pool.
    #[arg(long)]
    sequential: bool,

    /// Print only the correlation view.
    #[arg(long)]
    correlation_only: bool,

    /// Use the seeded simulated collaborators regardless of UPSTREAM_MODE.
    #[arg(long)]
    simulated: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = colcap_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    if args.simulated {
        settings.upstream_mode = colcap_core::config::UpstreamMode::Simulated;
    }

    let aggregator = Aggregator::from_settings(&settings)?;
    let range = colcap_core::time::calendar::resolve_range(
        args.start_date.as_deref(),
        args.end_date.as_deref(),
        chrono::Utc::now(),
    );

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("cli_run", %request_id, correlation_only = args.correlation_only);
    let parallel = !args.sequential;

    let output = async {
        let range = range?;
        if args.correlation_only {
            let report = aggregator.correlation(range, parallel).await?;
            to_json(&report)
        } else {
            let report = aggregator.aggregate(range, parallel).await?;
            to_json(&report)
        }
    }
    .instrument(span)
    .await;

    match output {
        Ok(json) => {
            println!("{json}");
            Ok(())
        }
        Err(err) => {
            if !err.is_client_error() {
                sentry_anyhow::capture_anyhow(&anyhow::anyhow!(err.to_string()));
            }
            tracing::error!(error = %err, "aggregation failed");
            println!("{}", to_json(&ErrorEnvelope::new(err.to_string()))?);
            drop(_sentry_guard);
            std::process::exit(if err.is_client_error() { 2 } else { 1 });
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, AggregateError> {
    serde_json::to_string_pretty(value).map_err(|e| AggregateError::Unexpected(e.to_string()))
}

fn init_sentry(settings: &colcap_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
