// Where the pixels come from: an image file, or a generated hue sweep.

use std::path::{Path, PathBuf};

use crate::board::{Board, Rgba};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("cannot load image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image {path} is empty ({width}x{height})")]
    Empty {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    #[error("demo size {width}x{height} must be non-zero")]
    EmptyDemo { width: u32, height: u32 },

    #[error(transparent)]
    Board(#[from] crate::board::BoardError),
}

/// Decode an image file into a board. The width becomes the number of
/// columns to sort.
pub fn load(path: &Path) -> Result<Board, SourceError> {
    let img = image::open(path)
        .map_err(|source| SourceError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();

    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(SourceError::Empty {
            path: path.to_path_buf(),
            width,
            height,
        });
    }

    let pixels: Vec<Rgba> = img.pixels().map(|p| p.0).collect();
    let board = Board::new(width as usize, height as usize, pixels)?;
    log::info!("loaded {} ({width}x{height})", path.display());
    Ok(board)
}

/// A generated image whose columns sweep once around the hue circle, darker
/// towards the bottom. Up to a few hundred columns wide, neighbouring columns
/// never share a color, so a misplaced column stands out. Much wider sweeps
/// run out of 8-bit steps and repeat colors.
pub fn hue_columns(width: u32, height: u32) -> Result<Board, SourceError> {
    if width == 0 || height == 0 {
        return Err(SourceError::EmptyDemo { width, height });
    }

    let (w, h) = (width as usize, height as usize);
    let mut pixels = Vec::with_capacity(w * h);
    for y in 0..h {
        let v = 1.0 - 0.6 * (y as f32 / h as f32);
        for x in 0..w {
            let rgb = hsv_to_rgb(x as f32 / w as f32, 0.85, v);
            pixels.push([rgb[0], rgb[1], rgb[2], 255]);
        }
    }
    Ok(Board::new(w, h, pixels)?)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let h = (h.fract() + 1.0).fract() * 6.0;
    let i = h.floor() as i32;
    let f = h - i as f32;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match i {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [
        (r * 255.0).round().clamp(0.0, 255.0) as u8,
        (g * 255.0).round().clamp(0.0, 255.0) as u8,
        (b * 255.0).round().clamp(0.0, 255.0) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn missing_file_is_an_image_error() {
        let err = load(Path::new("definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, SourceError::Image { .. }), "{err}");
        assert!(err.to_string().contains("here.png"));
    }

    #[test_case(120; "narrow")]
    #[test_case(300; "a few hundred")]
    fn hue_columns_neighbours_differ(w: u32) {
        let b = hue_columns(w, 4).unwrap();
        assert_eq!((b.width(), b.height()), (w as usize, 4));
        let top = b.row(0);
        for x in 1..top.len() {
            assert_ne!(top[x - 1], top[x], "columns {} and {x}", x - 1);
        }
    }

    #[test_case(0, 10; "no columns")]
    #[test_case(10, 0; "no rows")]
    fn hue_columns_rejects_empty(w: u32, h: u32) {
        assert!(matches!(
            hue_columns(w, h),
            Err(SourceError::EmptyDemo { .. })
        ));
    }

    #[test_case(0.0, [255, 0, 0]; "red")]
    #[test_case(1.0 / 3.0, [0, 255, 0]; "green")]
    #[test_case(2.0 / 3.0, [0, 0, 255]; "blue")]
    fn primary_hues(h: f32, rgb: [u8; 3]) {
        assert_eq!(hsv_to_rgb(h, 1.0, 1.0), rgb);
    }
}
