use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    /// The tick interval elapsed; background completions should be pumped.
    Tick,
}

/// Terminal input multiplexed with a steady tick, so timers and lookups
/// finishing while the user is idle still reach the screen.
pub struct EventHandler {
    tick_rate: Duration,
    last_tick: Instant,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        Self {
            tick_rate,
            last_tick: Instant::now(),
        }
    }

    pub fn next(&mut self) -> Result<AppEvent> {
        let timeout = self.tick_rate.saturating_sub(self.last_tick.elapsed());
        if event::poll(timeout)? {
            match event::read()? {
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    return Ok(AppEvent::Key(key));
                }
                CrosstermEvent::Resize(w, h) => return Ok(AppEvent::Resize(w, h)),
                _ => {}
            }
        }
        self.last_tick = Instant::now();
        Ok(AppEvent::Tick)
    }
}
