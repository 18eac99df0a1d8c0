// Tiny 5x7 bitmap font, drawn straight into an RGBA byte buffer.
// Lowercase is drawn as uppercase; unknown characters draw as blanks.

const GLYPH_W: i32 = 5;
const GLYPH_H: i32 = 7;
const ADVANCE: i32 = GLYPH_W + 1;
const LINE: i32 = GLYPH_H + 2;

// -----------------------------
// Glyphs
// -----------------------------

/// Each glyph is seven rows of five cells, `#` lit.
const GLYPHS: &[(char, [&str; 7])] = &[
    ('A', [".###.", "#...#", "#...#", "#####", "#...#", "#...#", "#...#"]),
    ('B', ["####.", "#...#", "#...#", "####.", "#...#", "#...#", "####."]),
    ('C', [".###.", "#...#", "#....", "#....", "#....", "#...#", ".###."]),
    ('D', ["####.", "#...#", "#...#", "#...#", "#...#", "#...#", "####."]),
    ('E', ["#####", "#....", "#....", "####.", "#....", "#....", "#####"]),
    ('F', ["#####", "#....", "#....", "####.", "#....", "#....", "#...."]),
    ('G', [".###.", "#...#", "#....", "#.###", "#...#", "#...#", ".###."]),
    ('H', ["#...#", "#...#", "#...#", "#####", "#...#", "#...#", "#...#"]),
    ('I', ["#####", "..#..", "..#..", "..#..", "..#..", "..#..", "#####"]),
    ('J', ["#####", "...#.", "...#.", "...#.", "#..#.", "#..#.", ".##.."]),
    ('K', ["#...#", "#..#.", "#.#..", "##...", "#.#..", "#..#.", "#...#"]),
    ('L', ["#....", "#....", "#....", "#....", "#....", "#....", "#####"]),
    ('M', ["#...#", "##.##", "#.#.#", "#.#.#", "#...#", "#...#", "#...#"]),
    ('N', ["#...#", "##..#", "#.#.#", "#..##", "#...#", "#...#", "#...#"]),
    ('O', [".###.", "#...#", "#...#", "#...#", "#...#", "#...#", ".###."]),
    ('P', ["####.", "#...#", "#...#", "####.", "#....", "#....", "#...."]),
    ('Q', [".###.", "#...#", "#...#", "#...#", "#.#.#", "#..#.", ".##.#"]),
    ('R', ["####.", "#...#", "#...#", "####.", "#.#..", "#..#.", "#...#"]),
    ('S', [".####", "#....", "#....", ".###.", "....#", "....#", "####."]),
    ('T', ["#####", "..#..", "..#..", "..#..", "..#..", "..#..", "..#.."]),
    ('U', ["#...#", "#...#", "#...#", "#...#", "#...#", "#...#", ".###."]),
    ('V', ["#...#", "#...#", "#...#", "#...#", "#...#", ".#.#.", "..#.."]),
    ('W', ["#...#", "#...#", "#...#", "#.#.#", "#.#.#", "#.#.#", ".#.#."]),
    ('X', ["#...#", "#...#", ".#.#.", "..#..", ".#.#.", "#...#", "#...#"]),
    ('Y', ["#...#", "#...#", ".#.#.", "..#..", "..#..", "..#..", "..#.."]),
    ('Z', ["#####", "....#", "...#.", "..#..", ".#...", "#....", "#####"]),
    ('0', [".###.", "#...#", "#..##", "#.#.#", "##..#", "#...#", ".###."]),
    ('1', ["..#..", ".##..", "..#..", "..#..", "..#..", "..#..", ".###."]),
    ('2', [".###.", "#...#", "....#", "...#.", "..#..", ".#...", "#####"]),
    ('3', ["####.", "....#", "....#", ".###.", "....#", "....#", "####."]),
    ('4', ["...#.", "..##.", ".#.#.", "#..#.", "#####", "...#.", "...#."]),
    ('5', ["#####", "#....", "#....", "####.", "....#", "....#", "####."]),
    ('6', [".###.", "#....", "#....", "####.", "#...#", "#...#", ".###."]),
    ('7', ["#####", "....#", "...#.", "..#..", ".#...", ".#...", ".#..."]),
    ('8', [".###.", "#...#", "#...#", ".###.", "#...#", "#...#", ".###."]),
    ('9', [".###.", "#...#", "#...#", ".####", "....#", "....#", ".###."]),
    (':', [".....", "..#..", "..#..", ".....", "..#..", "..#..", "....."]),
    ('.', [".....", ".....", ".....", ".....", ".....", "..#..", "..#.."]),
    (',', [".....", ".....", ".....", ".....", "..#..", "..#..", ".#..."]),
    ('(', ["...#.", "..#..", ".#...", ".#...", ".#...", "..#..", "...#."]),
    (')', [".#...", "..#..", "...#.", "...#.", "...#.", "..#..", ".#..."]),
    ('-', [".....", ".....", ".....", "#####", ".....", ".....", "....."]),
    ('%', ["##..#", "##.#.", "..#..", ".#...", "#.##.", "..##.", "....."]),
    ('/', ["....#", "...#.", "..#..", ".#...", "#....", ".....", "....."]),
];

fn glyph(c: char) -> [u8; 7] {
    let Some(&(_, rows)) = GLYPHS.iter().find(|(g, _)| *g == c) else {
        return [0; 7];
    };
    rows.map(|r| r.bytes().fold(0u8, |acc, b| (acc << 1) | u8::from(b == b'#')))
}

// -----------------------------
// Drawing
// -----------------------------

/// An RGBA8 image with a (possibly padded) row stride.
pub struct Canvas<'a> {
    pub bytes: &'a mut [u8],
    pub stride: usize,
    pub w: i32,
    pub h: i32,
}

impl Canvas<'_> {
    #[inline]
    fn put(&mut self, x: i32, y: i32, rgba: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.w || y >= self.h {
            return;
        }
        let off = y as usize * self.stride + x as usize * 4;
        if let Some(px) = self.bytes.get_mut(off..off + 4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Draw `text` with its top-left at (x, y). Text running off the right
    /// edge continues on the next line, at the same left margin.
    pub fn text(&mut self, x: i32, y: i32, text: &str, scale: i32, rgba: [u8; 4]) {
        let scale = scale.max(1);
        let (mut cx, mut cy) = (x, y);

        for ch in text.chars() {
            if cx + GLYPH_W * scale > self.w && cx > x {
                cx = x;
                cy += LINE * scale;
            }

            let rows = glyph(ch.to_ascii_uppercase());
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_W {
                    if (bits >> (GLYPH_W - 1 - col)) & 1 == 0 {
                        continue;
                    }
                    for sy in 0..scale {
                        for sx in 0..scale {
                            self.put(
                                cx + col * scale + sx,
                                cy + row as i32 * scale + sy,
                                rgba,
                            );
                        }
                    }
                }
            }

            cx += ADVANCE * scale;
        }
    }
}

pub fn text_width(text: &str, scale: i32) -> i32 {
    text.chars().count() as i32 * ADVANCE * scale.max(1)
}

pub fn line_height(scale: i32) -> i32 {
    LINE * scale.max(1)
}
