// src/tuning.rs
//
// This file is the CONTROL PANEL.
// Every number that shapes the visualization lives here: how long the
// scramble runs, how often frames are pushed while columns move, the window,
// the colors and where the text goes.

/// Full scramble passes run before the sort starts.
pub const MAX_SCRAMBLE: u32 = 25;

/// During the scramble a frame is presented once every this many swaps.
pub const SCRAMBLE_REDRAW_EVERY: u32 = 32;

/// Bounds for the user-adjustable sort delay (swaps per presented frame).
pub const DELAY_MIN: u32 = 1;
pub const DELAY_MAX: u32 = 32;

/// Driver ticks per second.
pub const TARGET_FPS: u32 = 60;

/// Window size used when `--window` is not given.
pub const WINDOW_W: u32 = 800;
pub const WINDOW_H: u32 = 450;

/// Image used when no path is given on the command line.
pub const DEFAULT_IMAGE: &str = "cronk.png";

#[derive(Clone, Copy, Debug)]
pub struct Palette {
    pub background: [u8; 4],
    pub delay_text: [u8; 4],
    pub status_text: [u8; 4],
    pub debug_text: [u8; 4],
}

pub const PALETTE: Palette = Palette {
    background: [245, 245, 245, 255], // raywhite
    delay_text: [0, 228, 48, 255],
    status_text: [0, 0, 0, 255],
    debug_text: [190, 33, 55, 255],
};

/// Where things go on screen, in window pixels.
#[derive(Clone, Copy, Debug)]
pub struct Layout {
    /// The image is centered, then lifted by this many pixels.
    pub image_lift: i32,
    /// Top-left of the delay readout.
    pub delay_at: (i32, i32),
    /// Left edge of the status line, and its distance from the bottom edge.
    pub status_left: i32,
    pub status_from_bottom: i32,
    /// Glyph scale for the delay and status lines.
    pub text_scale: i32,
    /// Glyph scale for debug lines.
    pub debug_scale: i32,
    /// Padding from the top-right corner for debug lines.
    pub debug_pad: i32,
}

pub const LAYOUT: Layout = Layout {
    image_lift: 40,
    delay_at: (120, 10),
    status_left: 20,
    status_from_bottom: 100,
    text_scale: 2,
    debug_scale: 2,
    debug_pad: 12,
};
