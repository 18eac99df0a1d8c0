// Window, keyboard and frame pacing around a `Session`.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use pollster::block_on;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow},
    keyboard::{Key, NamedKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    gfx::{Gfx, GfxError},
    machine::{Frame, Phase, Present, Session},
    tuning::{MAX_SCRAMBLE, TARGET_FPS},
};

/// Fatal errors raised while opening the window, before any frame is drawn.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("cannot create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error(transparent)]
    Gfx(#[from] GfxError),
}

/// Presents frames to the window. Lives only for the duration of one tick.
struct Screen<'a> {
    gfx: &'a mut Gfx,
    debug_lines: &'a [String],
    frames: &'a mut u64,
}

impl Present for Screen<'_> {
    fn present(&mut self, frame: &Frame<'_>) {
        self.gfx.draw(frame, self.debug_lines);
        *self.frames += 1;
    }
}

/// Once-a-second counters for `--debug`.
struct DebugStats {
    sys: System,
    last: Instant,
    frames: u64,
    swaps_at_last: u64,
    lines: Vec<String>,
}

impl DebugStats {
    fn new() -> Self {
        let mut sys = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        sys.refresh_all();
        Self {
            sys,
            last: Instant::now(),
            frames: 0,
            swaps_at_last: 0,
            lines: Vec::with_capacity(5),
        }
    }

    fn maybe_refresh(&mut self, session: &Session) {
        let swaps_total = session.stats().total;
        let elapsed = self.last.elapsed();
        if elapsed < Duration::from_secs(1) {
            return;
        }
        self.sys.refresh_cpu_all();
        self.sys.refresh_memory();

        let secs = elapsed.as_secs_f64();
        let fps = self.frames as f64 / secs;
        let sps = (swaps_total - self.swaps_at_last) as f64 / secs;
        let cpu = self.sys.global_cpu_usage();
        let mem_total = self.sys.total_memory();
        let mem_pct = if mem_total > 0 {
            self.sys.used_memory() as f64 / mem_total as f64 * 100.0
        } else {
            0.0
        };

        self.lines.clear();
        self.lines.push(format!("FPS {fps:.0}"));
        self.lines.push(format!("Swaps/s {sps:.0}"));
        self.lines.push(format!("CPU {cpu:.1}%"));
        self.lines.push(format!("MEM {mem_pct:.1}%"));
        if session.phase() == Phase::Scramble {
            self.lines.push(format!("Pass {}/{}", session.passes(), MAX_SCRAMBLE));
        }
        log::debug!("fps {fps:.0} | swaps/s {sps:.0} | cpu {cpu:.1}% | mem {mem_pct:.1}%");

        self.frames = 0;
        self.swaps_at_last = swaps_total;
        self.last = Instant::now();
    }
}

pub struct App {
    session: Session,
    window_size: (u32, u32),

    window: Option<Arc<Window>>,
    gfx: Option<Gfx>,
    failure: Option<StartupError>,

    next_tick: Instant,
    frames: u64,
    stats: Option<DebugStats>,
}

impl App {
    pub fn new(session: Session, window_size: (u32, u32), debug: bool) -> Self {
        Self {
            session,
            window_size,
            window: None,
            gfx: None,
            failure: None,
            next_tick: Instant::now(),
            frames: 0,
            stats: debug.then(DebugStats::new),
        }
    }

    /// Call once the event loop has returned. Fails if startup did.
    pub fn finish(&mut self) -> Result<(), StartupError> {
        self.failure.take().map_or(Ok(()), Err)
    }

    fn fail(&mut self, el: &ActiveEventLoop, e: impl Into<StartupError>) {
        self.record_failure(e.into());
        el.exit();
    }

    fn record_failure(&mut self, e: StartupError) {
        log::error!("{e}");
        self.failure = Some(e);
    }

    fn tick_period() -> Duration {
        Duration::from_secs(1) / TARGET_FPS.max(1)
    }

    fn draw_current(&mut self) {
        let Some(gfx) = self.gfx.as_mut() else {
            return;
        };
        let lines = self.stats.as_ref().map_or(&[][..], |s| &s.lines[..]);
        let mut screen = Screen {
            gfx,
            debug_lines: lines,
            frames: &mut self.frames,
        };
        screen.present(&self.session.frame());
    }

    fn on_key(&mut self, el: &ActiveEventLoop, key: &Key) {
        match key {
            Key::Named(NamedKey::Escape) => el.exit(),
            Key::Named(NamedKey::Space) => {
                self.session.start();
            }
            Key::Named(NamedKey::ArrowRight) => {
                self.session.increase_delay();
                log::debug!("delay {}", self.session.delay().get());
            }
            Key::Named(NamedKey::ArrowLeft) => {
                self.session.decrease_delay();
                log::debug!("delay {}", self.session.delay().get());
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, el: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let (w, h) = self.window_size;
        let attrs = WindowAttributes::default()
            .with_title("colsort")
            .with_inner_size(PhysicalSize::new(w, h));

        let win = match el.create_window(attrs) {
            Ok(win) => Arc::new(win),
            Err(e) => return self.fail(el, e),
        };

        let size = win.inner_size();
        match block_on(Gfx::new(win.clone(), size.width, size.height)) {
            Ok(gfx) => self.gfx = Some(gfx),
            Err(e) => return self.fail(el, e),
        }

        let board = self.session.board();
        log::info!("showing a {}x{} image", board.width(), board.height());
        self.window = Some(win);
        self.next_tick = Instant::now();
    }

    fn window_event(&mut self, el: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => el.exit(),

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    self.on_key(el, &event.logical_key);
                }
            }

            WindowEvent::Resized(sz) => {
                if let Some(gfx) = &mut self.gfx {
                    gfx.resize(sz.width, sz.height);
                }
            }

            WindowEvent::RedrawRequested => self.draw_current(),

            _ => {}
        }
    }

    fn about_to_wait(&mut self, el: &ActiveEventLoop) {
        let now = Instant::now();
        if now < self.next_tick {
            el.set_control_flow(ControlFlow::WaitUntil(self.next_tick));
            return;
        }
        self.next_tick = now + Self::tick_period();

        if let Some(gfx) = self.gfx.as_mut() {
            let lines = self.stats.as_ref().map_or(&[][..], |s| &s.lines[..]);
            let mut screen = Screen {
                gfx,
                debug_lines: lines,
                frames: &mut self.frames,
            };
            self.session.tick(&mut screen);
            screen.present(&self.session.frame());
        }

        if let Some(stats) = self.stats.as_mut() {
            stats.frames += std::mem::take(&mut self.frames);
            stats.maybe_refresh(&self.session);
        }

        // A sort tick can run long; never schedule the next tick in the past.
        self.next_tick = self.next_tick.max(Instant::now());
        el.set_control_flow(ControlFlow::WaitUntil(self.next_tick));
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;
    use crate::{board::tests::tagged, machine::FrameDelay};

    fn app() -> App {
        let session = Session::new(tagged(8, 2), FrameDelay::default(), Some(3));
        App::new(session, (64, 48), false)
    }

    #[test]
    fn clean_run_finishes_ok() {
        assert!(app().finish().is_ok());
    }

    #[test]
    fn startup_failure_is_reported_once() {
        let mut a = app();
        a.record_failure(GfxError::NoFormat.into());

        let err = a.finish().unwrap_err();
        assert!(matches!(err, StartupError::Gfx(GfxError::NoFormat)));
        assert!(a.finish().is_ok());
    }

    #[test]
    fn startup_failure_surfaces_as_an_error() {
        let mut a = app();
        a.record_failure(GfxError::NoFormat.into());

        let msg = format!("{:#}", a.finish().context("starting up").unwrap_err());
        assert_eq!(msg, "starting up: surface reports no supported formats");
    }
}
