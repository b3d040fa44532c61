use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use log::{Level, LevelFilter, Log, Metadata, Record};

const MAX_LINES: usize = 200;

#[derive(Debug, Clone)]
pub struct LogLine {
    pub level: Level,
    pub text: String,
}

/// Log records kept in memory so they can be drawn inside the UI instead of
/// scribbling over the alternate screen.
#[derive(Debug, Clone, Default)]
pub struct LogPanel {
    lines: Arc<Mutex<VecDeque<LogLine>>>,
}

impl LogPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, level: LevelFilter) -> io::Result<()> {
        let logger = PanelLogger {
            panel: self.clone(),
            level,
        };
        log::set_logger(Box::leak(Box::new(logger)))
            .map_err(|e| io::Error::other(e.to_string()))?;
        log::set_max_level(level);
        Ok(())
    }

    pub fn push(&self, level: Level, text: String) {
        if let Ok(mut lines) = self.lines.lock() {
            if lines.len() == MAX_LINES {
                lines.pop_front();
            }
            lines.push_back(LogLine { level, text });
        }
    }

    /// The newest `count` lines, oldest first.
    pub fn tail(&self, count: usize) -> Vec<LogLine> {
        match self.lines.lock() {
            Ok(lines) => {
                let skip = lines.len().saturating_sub(count);
                lines.iter().skip(skip).cloned().collect()
            }
            Err(_) => Vec::new(),
        }
    }
}

struct PanelLogger {
    panel: LogPanel,
    level: LevelFilter,
}

impl Log for PanelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.panel.push(record.level(), record.args().to_string());
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_newest_lines() {
        let panel = LogPanel::new();
        for i in 0..MAX_LINES + 5 {
            panel.push(Level::Info, format!("line {}", i));
        }

        let tail = panel.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[1].text, format!("line {}", MAX_LINES + 4));
        assert_eq!(panel.tail(usize::MAX).len(), MAX_LINES);
    }
}
