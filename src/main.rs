// src/main.rs
//
// Scrambles the columns of an image, then quicksorts them back into place,
// redrawing as columns move.
//
// Keys: Space starts a run, Left/Right change the sort delay, Escape quits.

use std::{path::PathBuf, str::FromStr};

use anyhow::{Context, Result};
use clap::Parser;
use winit::event_loop::EventLoop;

mod app;
mod board;
mod engine;
mod font;
mod gfx;
mod machine;
mod source;
mod tuning;

use machine::{FrameDelay, Session};

/// A `WIDTHxHEIGHT` pair from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Size {
    w: u32,
    h: u32,
}

impl FromStr for Size {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
        let num = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| format!("bad dimension {v:?}: {e}"))
        };
        Ok(Self {
            w: num(w)?,
            h: num(h)?,
        })
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Image whose columns get scrambled and sorted.
    #[arg(default_value = tuning::DEFAULT_IMAGE)]
    image: PathBuf,

    /// Use a generated WIDTHxHEIGHT hue sweep instead of an image file.
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    demo: Option<Size>,

    /// Initial sort delay in swaps per frame (1-32).
    #[arg(long, default_value_t = tuning::DELAY_MIN)]
    delay: u32,

    /// Seed for the scramble, for repeatable runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Initial window size.
    #[arg(long, value_name = "WIDTHxHEIGHT", default_value_t = Size { w: tuning::WINDOW_W, h: tuning::WINDOW_H })]
    window: Size,

    /// Show and log frame, swap, CPU and memory statistics.
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let board = match cli.demo {
        Some(Size { w, h }) => source::hue_columns(w, h).context("building demo image")?,
        None => source::load(&cli.image)
            .with_context(|| format!("loading {}", cli.image.display()))?,
    };

    let delay = FrameDelay::new(cli.delay);
    if delay.get() != cli.delay {
        log::warn!("delay {} clamped to {}", cli.delay, delay.get());
    }

    let session = Session::new(board, delay, cli.seed);
    let mut app = app::App::new(session, (cli.window.w, cli.window.h), cli.debug);

    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.run_app(&mut app).context("running event loop")?;

    app.finish().context("starting up")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use test_case::test_case;

    use super::*;

    #[test_case("800x450", 800, 450; "lowercase x")]
    #[test_case("64X32", 64, 32; "uppercase x")]
    #[test_case(" 3 x 7 ", 3, 7; "spaces")]
    fn parses_sizes(s: &str, w: u32, h: u32) {
        assert_eq!(s.parse::<Size>(), Ok(Size { w, h }));
    }

    #[test_case("800"; "no separator")]
    #[test_case("ax2"; "not a number")]
    #[test_case("-1x2"; "negative")]
    fn rejects_bad_sizes(s: &str) {
        assert!(s.parse::<Size>().is_err());
    }

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["colsort"]).unwrap();
        assert_eq!(cli.image, PathBuf::from(tuning::DEFAULT_IMAGE));
        assert_eq!(cli.delay, 1);
        assert_eq!(cli.window, Size { w: 800, h: 450 });
        assert!(cli.demo.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn cli_demo_and_seed() {
        let cli =
            Cli::try_parse_from(["colsort", "--demo", "320x200", "--seed", "9", "--delay", "40"])
                .unwrap();
        assert_eq!(cli.demo, Some(Size { w: 320, h: 200 }));
        assert_eq!(cli.seed, Some(9));
        assert_eq!(FrameDelay::new(cli.delay).get(), 32);
    }
}
