mod headless;
mod tui;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use unitsync::{
    DEFAULT_NAME, Destination, GameLoop, NetworkEndpoint, ReplicationEngine, SessionConfig,
    SpawnRng,
};

use headless::{Headless, NoInput};
use tui::LogPanel;

#[derive(Parser)]
#[command(name = "unitsync")]
#[command(about = "Peer-to-peer unit sandbox")]
struct Args {
    #[arg(help = "Port to host on, or address:port of the master to join")]
    destination: Option<String>,

    #[arg(help = "Player name")]
    name: Option<String>,

    #[arg(long, help = "Run without the terminal UI")]
    headless: bool,

    #[arg(long, help = "Master: start once --min-peers peers have joined")]
    auto_start: bool,

    #[arg(long, default_value_t = 0, help = "Peers required before the master may start")]
    min_peers: usize,

    #[arg(long, default_value_t = 500, help = "Action flush interval in ms")]
    flush_ms: u64,

    #[arg(long, help = "Seed for random spawn points")]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_panel = LogPanel::new();
    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        log_panel.install(log::LevelFilter::Info)?;
    }

    let name = args
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_NAME.to_string());
    let destination = Destination::parse(args.destination.as_deref().unwrap_or(""))?;

    let endpoint = match destination {
        Destination::Listen(port) => NetworkEndpoint::listen(port)?,
        Destination::Connect(_) => NetworkEndpoint::ephemeral()?,
    };

    let config = SessionConfig {
        flush_interval: Duration::from_millis(args.flush_ms),
        min_peers_to_start: args.min_peers,
        ..SessionConfig::with_name(name)
    };
    let mut engine = ReplicationEngine::new(endpoint, config);
    match destination {
        Destination::Listen(_) => engine.init_as_master()?,
        Destination::Connect(master) => engine.init_as_peer(master)?,
    }

    let rng = args.seed.map_or_else(SpawnRng::from_entropy, SpawnRng::new);
    let auto_start = wants_auto_start(args.auto_start, args.headless, &destination);

    if args.headless {
        if auto_start && !args.auto_start {
            log::info!("headless master without input, starting once peers are in");
        }
        let mut game =
            GameLoop::new(engine, NoInput, Headless::new(), rng).with_auto_start(auto_start);
        game.run()?;
    } else {
        let (input, renderer) = tui::open(log_panel)?;
        let mut game = GameLoop::new(engine, input, renderer, rng).with_auto_start(auto_start);
        game.run()?;
    }

    Ok(())
}

/// A headless master has no way to press start, so it always auto-starts.
fn wants_auto_start(auto_start: bool, headless: bool, destination: &Destination) -> bool {
    let hosting = matches!(destination, Destination::Listen(_));
    auto_start || (headless && hosting)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auto_start(argv: &[&str]) -> bool {
        let args = Args::parse_from(argv);
        let destination = Destination::parse(args.destination.as_deref().unwrap_or("")).unwrap();
        wants_auto_start(args.auto_start, args.headless, &destination)
    }

    #[test]
    fn headless_master_always_auto_starts() {
        assert!(auto_start(&["client", "--headless"]));
        assert!(auto_start(&["client", "9000", "--headless"]));
        assert!(!auto_start(&["client", "9000"]));
        assert!(auto_start(&["client", "9000", "--auto-start"]));
    }

    #[test]
    fn headless_peer_waits_for_the_master() {
        assert!(!auto_start(&["client", "127.0.0.1:9000", "Guest", "--headless"]));
    }
}
