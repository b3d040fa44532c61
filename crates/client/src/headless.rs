use std::io;
use std::time::{Duration, Instant};

use unitsync::{InputEvent, InputSource, NetEvent, Renderer, SessionStatus, UnitWorld};

const STATUS_INTERVAL: Duration = Duration::from_secs(5);

pub struct NoInput;

impl InputSource for NoInput {
    fn poll(&mut self) -> io::Result<Vec<InputEvent>> {
        Ok(Vec::new())
    }
}

/// Logs a status line every few seconds instead of drawing.
pub struct Headless {
    last_status: Instant,
}

impl Headless {
    pub fn new() -> Self {
        Self {
            last_status: Instant::now(),
        }
    }
}

impl Renderer for Headless {
    fn render(
        &mut self,
        world: &UnitWorld,
        status: &SessionStatus,
        _events: &[NetEvent],
    ) -> io::Result<()> {
        if self.last_status.elapsed() < STATUS_INTERVAL {
            return Ok(());
        }
        self.last_status = Instant::now();

        log::info!(
            "{} [{} / {}] peers: {}  units: {}  queued: {}",
            status.name,
            status.role.map_or("unbound", |r| r.as_str()),
            status.state.as_str(),
            status.peer_count,
            world.unit_count(),
            status.queued
        );
        Ok(())
    }
}
