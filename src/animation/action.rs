use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LoopMode {
    #[default]
    Once,
    Loop,
    PingPong,
}

/// A loop boundary crossed while advancing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wrap {
    /// Timeline time of the edge the playhead ran into.
    pub edge: f32,
    /// Timeline time the new playthrough starts from.
    pub restart: f32,
}

/// Result of advancing a [`PlaybackClock`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockStep {
    /// Timeline time before the step.
    pub previous: f32,
    /// Timeline time to evaluate at.
    pub time: f32,
    /// Set when a new playthrough began during this step.
    pub wrap: Option<Wrap>,
    /// Playback reached the end and stopped (`LoopMode::Once` only).
    pub finished: bool,
}

/// Drives the timeline time of one schedule.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    /// Unwrapped playback time, accumulated from scaled deltas.
    elapsed: f32,
    duration: f32,

    pub time_scale: f32,
    pub loop_mode: LoopMode,
    pub paused: bool,
}

impl PlaybackClock {
    #[must_use]
    pub fn new(duration: f32, loop_mode: LoopMode, time_scale: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration: duration.max(0.0),
            time_scale,
            loop_mode,
            paused: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Current timeline time, wrapped according to the loop mode.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.wrap(self.elapsed)
    }

    /// Jumps to `time` without wrapping bookkeeping.
    pub fn seek(&mut self, time: f32) {
        self.elapsed = time;
    }

    /// Core logic: advance time.
    pub fn advance(&mut self, dt: f32) -> ClockStep {
        let previous = self.time();
        if self.paused {
            return ClockStep {
                previous,
                time: previous,
                wrap: None,
                finished: false,
            };
        }

        let before = self.cycle(self.elapsed);
        // 1. Accumulate time
        let delta = dt * self.time_scale;
        self.elapsed += delta;

        // 2. Handle loop mode
        let mut finished = false;
        if self.loop_mode == LoopMode::Once {
            // Play once, stop at end or start
            if self.elapsed >= self.duration {
                self.elapsed = self.duration;
                self.paused = true;
                finished = true;
            } else if self.elapsed < 0.0 {
                self.elapsed = 0.0;
                self.paused = true;
                finished = true;
            }
        }

        let after = self.cycle(self.elapsed);
        let wrap = (after != before).then(|| {
            // The boundary crossed sits at `boundary * duration` in elapsed time.
            let boundary = if delta >= 0.0 { after } else { before };
            match self.loop_mode {
                LoopMode::PingPong => {
                    let edge = if boundary % 2 == 0 { 0.0 } else { self.duration };
                    Wrap { edge, restart: edge }
                }
                _ if delta >= 0.0 => Wrap {
                    edge: self.duration,
                    restart: 0.0,
                },
                _ => Wrap {
                    edge: 0.0,
                    restart: self.duration,
                },
            }
        });

        ClockStep {
            previous,
            time: self.time(),
            wrap,
            finished,
        }
    }

    fn cycle(&self, elapsed: f32) -> i64 {
        if self.loop_mode == LoopMode::Once || self.duration <= 0.0 {
            0
        } else {
            (elapsed / self.duration).floor() as i64
        }
    }

    fn wrap(&self, elapsed: f32) -> f32 {
        let duration = self.duration;
        if duration <= 0.0 {
            return 0.0;
        }
        match self.loop_mode {
            LoopMode::Once => elapsed.clamp(0.0, duration),
            // Standard loop: modulo, also for reverse playback
            LoopMode::Loop => elapsed.rem_euclid(duration),
            LoopMode::PingPong => {
                let double_duration = duration * 2.0;
                // Normalize time into [0, 2*duration) cycle
                let t = elapsed.rem_euclid(double_duration);
                // In the second half of the cycle, reverse direction
                if t > duration { double_duration - t } else { t }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn once_stops_at_end() {
        let mut clock = PlaybackClock::new(2.0, LoopMode::Once, 1.0);
        assert!(!clock.advance(1.5).finished);
        let step = clock.advance(1.0);
        assert!(step.finished);
        assert_eq!(step.time, 2.0);
        assert!(clock.paused);
    }

    #[test]
    fn loop_wraps_and_reports_new_playthrough() {
        let mut clock = PlaybackClock::new(2.0, LoopMode::Loop, 1.0);
        assert!(clock.advance(1.5).wrap.is_none());
        let step = clock.advance(1.0);
        assert_eq!(
            step.wrap,
            Some(Wrap {
                edge: 2.0,
                restart: 0.0
            })
        );
        assert!((step.time - 0.5).abs() < 1e-5);
    }

    #[test]
    fn ping_pong_reflects() {
        let mut clock = PlaybackClock::new(2.0, LoopMode::PingPong, 1.0);
        let step = clock.advance(2.5);
        assert_eq!(step.wrap.map(|w| w.edge), Some(2.0));
        assert!((step.time - 1.5).abs() < 1e-5);
        let step = clock.advance(1.0);
        assert!((step.time - 0.5).abs() < 1e-5);
    }
}
