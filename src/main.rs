use std::sync::Arc;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use disaster_notify::api::{self, AppState, PageConfig};
use disaster_notify::config::AppConfig;
use disaster_notify::knowledge::{self, GuidanceGenerator};
use disaster_notify::shelter::ShelterClient;
use disaster_notify::store::Registry;
use disaster_notify::telephony::{Telephony, TwilioClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    let _log_guard = init_tracing(&config);

    eprintln!("🚨 Disaster Notify v{}", env!("CARGO_PKG_VERSION"));

    // ── Registry ─────────────────────────────────────────────────────────
    let registry = Registry::open(&config.database_path)
        .await
        .with_context(|| format!("failed to open database at {}", config.database_path.display()))?;
    eprintln!("   Database: {}", config.database_path.display());

    // ── Knowledge base ───────────────────────────────────────────────────
    let knowledge = knowledge::bootstrap(config.upstage.as_ref(), &config.knowledge).await;
    eprintln!(
        "   Guidance: {}",
        if knowledge.is_some() { "enabled" } else { "disabled (fallback notice)" }
    );
    let generator = Arc::new(GuidanceGenerator::new(knowledge));

    // ── Telephony ────────────────────────────────────────────────────────
    let telephony: Option<Arc<dyn Telephony>> = match &config.twilio {
        Some(twilio) => {
            eprintln!("   Twilio: {}", twilio.from_number);
            Some(Arc::new(TwilioClient::new(twilio)) as Arc<dyn Telephony>)
        }
        None => {
            tracing::warn!("Twilio credentials not set, SMS and calls disabled");
            eprintln!("   Twilio: not configured");
            None
        }
    };

    let shelters = Arc::new(ShelterClient::new(config.shelter.clone())?);
    if !shelters.is_configured() {
        tracing::warn!("SAFETY_DATA_SERVICE_KEY not set, shelter lookup disabled");
    }

    let state = AppState {
        registry,
        generator,
        telephony,
        shelters,
        pages: Arc::new(PageConfig {
            static_dir: config.static_dir.clone(),
            kakao_map_app_key: config.kakao_map_app_key.clone().unwrap_or_default(),
        }),
    };
    let app = api::router(state, &config.cors_origins);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    eprintln!("   API: http://{addr}/api");
    eprintln!("   Webhooks: http://{addr}/twilio/{{sms,voice,handle-gather}}\n");
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Console logging, plus a daily rolling file when a log directory is set.
/// The returned guard flushes the file writer and must outlive the server.
fn init_tracing(config: &AppConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_target(false);

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "disaster-notify.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(console).init();
            None
        }
    }
}
