// src/machine.rs
//
// The driver-side state: which phase we are in, the user's delay setting,
// and the throttle that decides which swaps get a frame.

use std::time::Instant;

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    board::Board,
    engine,
    tuning::{DELAY_MAX, DELAY_MIN, MAX_SCRAMBLE, SCRAMBLE_REDRAW_EVERY},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Waiting,
    Scramble,
    Sort,
}

impl Phase {
    pub fn status(self) -> &'static str {
        match self {
            Phase::Waiting => "Press Space to begin, or change the delay with the arrow keys.",
            Phase::Scramble => "Scrambling...",
            Phase::Sort => "Sorting...",
        }
    }

    /// Swaps per presented frame while in this phase.
    fn cadence(self, delay: FrameDelay) -> u32 {
        match self {
            Phase::Waiting => 1,
            Phase::Scramble => SCRAMBLE_REDRAW_EVERY,
            Phase::Sort => delay.get(),
        }
    }
}

/// Swaps per frame during the sort. Always within `DELAY_MIN..=DELAY_MAX`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameDelay(u32);

impl FrameDelay {
    pub fn new(v: u32) -> Self {
        Self(v.clamp(DELAY_MIN, DELAY_MAX))
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    pub fn increase(&mut self) {
        *self = Self::new(self.0.saturating_add(1));
    }

    pub fn decrease(&mut self) {
        *self = Self::new(self.0.saturating_sub(1));
    }
}

impl Default for FrameDelay {
    fn default() -> Self {
        Self(DELAY_MIN)
    }
}

/// Counts swaps and fires once per cadence.
#[derive(Default, Debug)]
struct Throttle {
    count: u32,
}

impl Throttle {
    fn tick(&mut self, cadence: u32) -> bool {
        self.count += 1;
        if self.count >= cadence.max(1) {
            self.count = 0;
            true
        } else {
            false
        }
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

/// Everything a presenter needs to draw one frame.
pub struct Frame<'a> {
    pub board: &'a Board,
    pub phase: Phase,
    pub delay: FrameDelay,
}

/// The view side. Called whenever the throttle lets a swap through, and once
/// per driver tick.
pub trait Present {
    fn present(&mut self, frame: &Frame<'_>);
}

#[derive(Default, Debug, Clone, Copy)]
pub struct SwapStats {
    pub total: u64,
    pub this_run: u64,
}

/// The board together with the state machine that drives it.
pub struct Session {
    board: Board,
    phase: Phase,
    delay: FrameDelay,
    passes: u32,
    throttle: Throttle,
    stats: SwapStats,
    rng: StdRng,
    run_started: Option<Instant>,
}

impl Session {
    pub fn new(board: Board, delay: FrameDelay, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self {
            board,
            phase: Phase::Waiting,
            delay,
            passes: 0,
            throttle: Throttle::default(),
            stats: SwapStats::default(),
            rng,
            run_started: None,
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn delay(&self) -> FrameDelay {
        self.delay
    }

    #[inline]
    pub fn passes(&self) -> u32 {
        self.passes
    }

    #[inline]
    pub fn stats(&self) -> SwapStats {
        self.stats
    }

    pub fn frame(&self) -> Frame<'_> {
        Frame {
            board: &self.board,
            phase: self.phase,
            delay: self.delay,
        }
    }

    pub fn increase_delay(&mut self) {
        self.delay.increase();
    }

    pub fn decrease_delay(&mut self) {
        self.delay.decrease();
    }

    /// Start signal. Ignored unless waiting.
    pub fn start(&mut self) -> bool {
        if self.phase != Phase::Waiting {
            log::debug!("start ignored while {:?}", self.phase);
            return false;
        }
        if self.board.is_empty() {
            log::warn!("image has no columns, nothing to scramble");
        }
        self.passes = 0;
        self.stats.this_run = 0;
        self.run_started = Some(Instant::now());
        self.enter(Phase::Scramble);
        true
    }

    /// One driver tick. The sort phase finishes the whole sort here, handing
    /// throttled frames to `presenter` as it goes.
    pub fn tick<P: Present + ?Sized>(&mut self, presenter: &mut P) {
        match self.phase {
            Phase::Waiting => {}
            Phase::Scramble => {
                if self.passes < MAX_SCRAMBLE {
                    {
                        let mut on_swap = observer(
                            &mut self.throttle,
                            &mut self.stats,
                            self.phase,
                            self.delay,
                            presenter,
                        );
                        engine::scramble_pass(&mut self.board, &mut self.rng, &mut on_swap);
                    }
                    self.passes += 1;
                } else {
                    self.passes = 0;
                    self.enter(Phase::Sort);
                }
            }
            Phase::Sort => {
                {
                    let mut on_swap = observer(
                        &mut self.throttle,
                        &mut self.stats,
                        self.phase,
                        self.delay,
                        presenter,
                    );
                    engine::quicksort(&mut self.board, &mut on_swap);
                }
                debug_assert!(self.board.is_sorted());

                let elapsed = self.run_started.take().map(|t| t.elapsed());
                log::info!(
                    "sorted {} columns, {} swaps this run, {:.2?}",
                    self.board.width(),
                    self.stats.this_run,
                    elapsed.unwrap_or_default()
                );
                self.enter(Phase::Waiting);
            }
        }
    }

    fn enter(&mut self, next: Phase) {
        log::info!("{:?} -> {:?}", self.phase, next);
        self.phase = next;
        self.throttle.reset();
    }
}

/// Builds the per-swap callback from the session fields the engines leave
/// alone, so the board and rng stay free for them.
fn observer<'a, P: Present + ?Sized>(
    throttle: &'a mut Throttle,
    stats: &'a mut SwapStats,
    phase: Phase,
    delay: FrameDelay,
    presenter: &'a mut P,
) -> impl FnMut(&Board) + 'a {
    let cadence = phase.cadence(delay);
    move |board: &Board| {
        stats.total += 1;
        stats.this_run += 1;
        if throttle.tick(cadence) {
            presenter.present(&Frame {
                board,
                phase,
                delay,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::{assert_mirrored, tagged};

    #[derive(Default)]
    struct Recorder {
        frames: Vec<Phase>,
    }

    impl Present for Recorder {
        fn present(&mut self, frame: &Frame<'_>) {
            self.frames.push(frame.phase);
        }
    }

    fn session(width: usize) -> Session {
        Session::new(tagged(width, 2), FrameDelay::default(), Some(42))
    }

    #[test]
    fn delay_clamps_at_both_ends() {
        let mut d = FrameDelay::default();
        assert_eq!(d.get(), 1);
        for _ in 0..40 {
            d.increase();
        }
        assert_eq!(d.get(), 32);
        for _ in 0..40 {
            d.decrease();
        }
        assert_eq!(d.get(), 1);
        assert_eq!(FrameDelay::new(0).get(), 1);
        assert_eq!(FrameDelay::new(99).get(), 32);
    }

    #[test]
    fn throttle_fires_every_cadence() {
        let mut t = Throttle::default();
        let fired: Vec<bool> = (0..8).map(|_| t.tick(4)).collect();
        assert_eq!(fired, [false, false, false, true, false, false, false, true]);
        assert!(t.tick(1));
        assert!(t.tick(0));
    }

    #[test]
    fn start_only_from_waiting() {
        let mut s = session(10);
        let mut r = Recorder::default();
        assert!(s.start());
        assert_eq!(s.phase(), Phase::Scramble);
        s.tick(&mut r);
        assert!(!s.start());
        assert_eq!(s.passes(), 1);
    }

    #[test]
    fn waiting_tick_does_nothing() {
        let mut s = session(10);
        let mut r = Recorder::default();
        s.tick(&mut r);
        assert_eq!(s.phase(), Phase::Waiting);
        assert_eq!(s.stats().total, 0);
        assert!(r.frames.is_empty());
    }

    #[test]
    fn scramble_runs_exactly_max_passes_then_sorts() {
        let mut s = session(64);
        let mut r = Recorder::default();
        s.start();

        for pass in 1..=MAX_SCRAMBLE {
            s.tick(&mut r);
            assert_eq!(s.phase(), Phase::Scramble);
            assert_eq!(s.passes(), pass);
        }
        assert_eq!(s.stats().total, 64 * MAX_SCRAMBLE as u64);

        s.tick(&mut r);
        assert_eq!(s.phase(), Phase::Sort);
        assert_eq!(s.passes(), 0);

        s.tick(&mut r);
        assert_eq!(s.phase(), Phase::Waiting);
        assert!(s.board().is_sorted());
        assert_eq!(s.board(), &tagged(64, 2));
        assert_mirrored(s.board());
    }

    #[test]
    fn scramble_presents_every_32nd_swap() {
        let mut s = session(64);
        let mut r = Recorder::default();
        s.start();
        s.tick(&mut r);
        assert_eq!(r.frames, vec![Phase::Scramble; 2]);
    }

    #[test]
    fn sort_presents_every_delay_swaps() {
        let mut s = session(64);
        s.start();
        let mut quiet = Recorder::default();
        for _ in 0..=MAX_SCRAMBLE {
            s.tick(&mut quiet);
        }
        for _ in 0..7 {
            s.increase_delay();
        }
        assert_eq!(s.delay().get(), 8);

        let before = s.stats().total;
        let mut r = Recorder::default();
        s.tick(&mut r);
        let swaps = s.stats().total - before;

        assert_eq!(r.frames.len() as u64, swaps / 8);
        assert!(r.frames.iter().all(|&p| p == Phase::Sort));
    }

    #[test]
    fn empty_board_cycles_without_swapping() {
        let board = Board::new(0, 5, Vec::new()).unwrap();
        let mut s = Session::new(board, FrameDelay::default(), Some(1));
        let mut r = Recorder::default();
        s.start();
        for _ in 0..=MAX_SCRAMBLE + 1 {
            s.tick(&mut r);
        }
        assert_eq!(s.phase(), Phase::Waiting);
        assert_eq!(s.stats().total, 0);
        assert!(r.frames.is_empty());
    }

    #[test]
    fn second_run_restores_again() {
        let mut s = session(33);
        let mut r = Recorder::default();
        for _ in 0..2 {
            s.start();
            for _ in 0..=MAX_SCRAMBLE + 1 {
                s.tick(&mut r);
            }
            assert_eq!(s.phase(), Phase::Waiting);
            assert_eq!(s.board(), &tagged(33, 2));
        }
    }
}
