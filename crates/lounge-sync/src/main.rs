use tracing_subscriber::EnvFilter;

use lounge_core::config::MotionConfig;
use lounge_sync::config::SimConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = SimConfig::load();
    tracing::info!(
        room = %config.room,
        participants = config.participants,
        ticks = config.ticks,
        "Lounge simulator starting"
    );

    match lounge_sync::sim::run(&config, MotionConfig::load()).await {
        Ok(reports) => {
            for r in reports {
                tracing::info!(
                    player_id = r.id,
                    x = r.position.x,
                    y = r.position.y,
                    remotes = r.remotes_visible,
                    joins = r.joins_seen,
                    departures = r.departures_seen,
                    "Participant finished"
                );
            }
        },
        Err(e) => tracing::error!(error = %e, "Simulation failed"),
    }
}
