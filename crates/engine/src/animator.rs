//! Step-by-step playback of a [`Trace`] over the grid.
//!
//! The animator is a plain state machine driven by the caller's event loop:
//! nothing runs in the background. Each call to [`Animator::advance`] applies
//! every tick due at the given instant, so a slow frame catches up instead of
//! drifting.
//!
//! Schedule for a trace with `n` visited cells and `m` path cells started at
//! `t0` (`v`, `d`, `p` are the [`AnimationTiming`] fields):
//!
//! ```text
//! t0 + k*v              visited[k-1] revealed, 1 <= k <= n
//! t0 + (n+1)*v          visited exhausted, pause begins
//! t0 + (n+1)*v + d      pause over
//! ... + j*p             path[j-1] revealed, 1 <= j <= m
//! ... + (m+1)*p         playback finished
//! ```

use std::time::{Duration, Instant};

use crate::grid::Position;
use crate::verify::Trace;

/// Tick intervals for playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationTiming {
    /// Interval between revealed visited cells
    pub visited_tick: Duration,
    /// Pause between the visited and path phases
    pub path_delay: Duration,
    /// Interval between revealed path cells
    pub path_tick: Duration,
}

impl Default for AnimationTiming {
    fn default() -> Self {
        Self {
            visited_tick: Duration::from_millis(20),
            path_delay: Duration::from_millis(100),
            path_tick: Duration::from_millis(50),
        }
    }
}

/// What the animator is doing right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Revealing visited cells, or pausing after the last one
    RevealingVisited,
    RevealingPath,
}

/// Identifies one playback. Every `start` issues a larger id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlaybackId(u64);

/// Cells revealed so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnimationState {
    pub visited: Vec<Position>,
    pub path: Vec<Position>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Visited { next: usize },
    Pause,
    Path { next: usize },
}

#[derive(Debug)]
struct Playback {
    id: PlaybackId,
    trace: Trace,
    stage: Stage,
    due: Instant,
}

#[derive(Debug)]
pub struct Animator {
    timing: AnimationTiming,
    state: AnimationState,
    playback: Option<Playback>,
    last_id: u64,
}

impl Animator {
    pub fn new(timing: AnimationTiming) -> Self {
        Self { timing, state: AnimationState::default(), playback: None, last_id: 0 }
    }

    pub fn timing(&self) -> AnimationTiming {
        self.timing
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        match self.playback.as_ref().map(|p| p.stage) {
            None => Phase::Idle,
            Some(Stage::Visited { .. }) | Some(Stage::Pause) => Phase::RevealingVisited,
            Some(Stage::Path { .. }) => Phase::RevealingPath,
        }
    }

    /// Id of the running playback, if any.
    pub fn current(&self) -> Option<PlaybackId> {
        self.playback.as_ref().map(|p| p.id)
    }

    /// Begin playing `trace`, replacing any running playback and clearing the
    /// revealed state.
    pub fn start(&mut self, trace: Trace, now: Instant) -> PlaybackId {
        self.last_id += 1;
        let id = PlaybackId(self.last_id);
        if let Some(old) = self.playback.take() {
            log::debug!("playback {:?} superseded by {:?}", old.id, id);
        }
        self.state = AnimationState::default();
        self.playback = Some(Playback {
            id,
            trace,
            stage: Stage::Visited { next: 0 },
            due: now + self.timing.visited_tick,
        });
        id
    }

    /// Stop the running playback. Revealed cells stay on screen.
    pub fn cancel(&mut self) {
        if let Some(old) = self.playback.take() {
            log::debug!("playback {:?} cancelled", old.id);
        }
    }

    /// Stop playback and clear the revealed cells.
    pub fn clear(&mut self) {
        self.cancel();
        self.state = AnimationState::default();
    }

    /// Reveal the rest of the running playback at once.
    pub fn finish(&mut self) {
        if let Some(playback) = self.playback.take() {
            self.state.visited = playback.trace.visited;
            self.state.path = playback.trace.path;
        }
    }

    /// When the next tick is due, if a playback is running.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.playback.as_ref().map(|p| p.due)
    }

    /// Apply every tick due at `now`. Returns whether anything changed.
    pub fn advance(&mut self, now: Instant) -> bool {
        let timing = self.timing;
        let mut changed = false;

        while let Some(playback) = self.playback.as_mut() {
            if playback.due > now {
                break;
            }
            changed = true;
            let mut done = false;
            match playback.stage {
                Stage::Visited { next } => match playback.trace.visited.get(next) {
                    Some(&pos) => {
                        self.state.visited.push(pos);
                        playback.stage = Stage::Visited { next: next + 1 };
                        playback.due += timing.visited_tick;
                    }
                    None => {
                        playback.stage = Stage::Pause;
                        playback.due += timing.path_delay;
                    }
                },
                Stage::Pause => {
                    playback.stage = Stage::Path { next: 0 };
                    playback.due += timing.path_tick;
                }
                Stage::Path { next } => match playback.trace.path.get(next) {
                    Some(&pos) => {
                        self.state.path.push(pos);
                        playback.stage = Stage::Path { next: next + 1 };
                        playback.due += timing.path_tick;
                    }
                    None => done = true,
                },
            }
            if done {
                self.playback = None;
            }
        }

        changed
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(AnimationTiming::default())
    }
}
