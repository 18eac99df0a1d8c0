// src/board.rs
//
// The model: a permutation of column labels and the image it scrambles.
// Column `c` on screen always shows the pixels that were originally at image
// column `order[c] - 1`. Both buffers only ever change together, via `swap`.

pub type Rgba = [u8; 4];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("pixel buffer holds {got} pixels, expected {width}x{height} = {expected}")]
    PixelCount {
        width: usize,
        height: usize,
        expected: usize,
        got: usize,
    },

    #[error("column {index} is out of range for a board of {width} columns")]
    ColumnOutOfRange { index: usize, width: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    order: Vec<u32>,
    pixels: Vec<Rgba>,
}

impl Board {
    /// Wrap a row-major RGBA image. The permutation starts as the identity
    /// `1..=width`.
    pub fn new(width: usize, height: usize, pixels: Vec<Rgba>) -> Result<Self, BoardError> {
        let expected = width * height;
        if pixels.len() != expected {
            return Err(BoardError::PixelCount {
                width,
                height,
                expected,
                got: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            order: (1..=width as u32).collect(),
            pixels,
        })
    }

    /// Columns, i.e. the permutation length N.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0
    }

    #[inline]
    pub fn order(&self) -> &[u32] {
        &self.order
    }

    #[inline]
    pub fn value(&self, col: usize) -> u32 {
        self.order[col]
    }

    /// One image row as currently arranged.
    #[inline]
    pub fn row(&self, y: usize) -> &[Rgba] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    pub fn is_sorted(&self) -> bool {
        self.order().iter().enumerate().all(|(i, &v)| v as usize == i + 1)
    }

    /// Exchange columns `i` and `j` in the permutation and in every pixel row.
    ///
    /// # Panics
    /// If either index is not below `width()`.
    pub fn swap(&mut self, i: usize, j: usize) {
        if let Err(e) = self.try_swap(i, j) {
            panic!("swap({i}, {j}): {e}");
        }
    }

    pub fn try_swap(&mut self, i: usize, j: usize) -> Result<(), BoardError> {
        for index in [i, j] {
            if index >= self.width {
                return Err(BoardError::ColumnOutOfRange {
                    index,
                    width: self.width,
                });
            }
        }
        if i == j {
            return Ok(());
        }

        self.order.swap(i, j);
        for row in self.pixels.chunks_exact_mut(self.width) {
            row.swap(i, j);
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use proptest::prelude::*;

    use super::*;

    /// Every pixel carries its original column in red and its row in green,
    /// so the mirror invariant can be checked exactly.
    pub(crate) fn tagged(width: usize, height: usize) -> Board {
        let mut px = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                px.push([x as u8, y as u8, (x >> 8) as u8, 255]);
            }
        }
        Board::new(width, height, px).unwrap()
    }

    /// Column `c` must show the pixels of original column `order[c] - 1`.
    pub(crate) fn assert_mirrored(b: &Board) {
        for y in 0..b.height() {
            for (c, px) in b.row(y).iter().enumerate() {
                let orig = b.value(c) as usize - 1;
                assert_eq!(
                    *px,
                    [orig as u8, y as u8, (orig >> 8) as u8, 255],
                    "column {c} row {y}"
                );
            }
        }
    }

    #[test]
    fn starts_as_identity() {
        let b = tagged(6, 3);
        assert_eq!(b.order(), &[1, 2, 3, 4, 5, 6]);
        assert!(b.is_sorted());
        assert_mirrored(&b);
    }

    #[test]
    fn rejects_wrong_pixel_count() {
        let err = Board::new(4, 2, vec![[0; 4]; 7]).unwrap_err();
        assert_eq!(
            err,
            BoardError::PixelCount {
                width: 4,
                height: 2,
                expected: 8,
                got: 7
            }
        );
    }

    #[test]
    fn swap_moves_whole_columns_including_last_row() {
        let mut b = tagged(4, 3);
        b.swap(0, 3);
        assert_eq!(b.order(), &[4, 2, 3, 1]);
        assert_eq!(b.row(2)[0], [3, 2, 0, 255]);
        assert_eq!(b.row(2)[3], [0, 2, 0, 255]);
        assert_mirrored(&b);
    }

    #[test]
    fn out_of_range_is_an_error() {
        let mut b = tagged(3, 2);
        assert_eq!(
            b.try_swap(1, 3),
            Err(BoardError::ColumnOutOfRange { index: 3, width: 3 })
        );
        assert_eq!(b, tagged(3, 2));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_swap_panics() {
        let mut b = tagged(3, 2);
        b.swap(5, 0);
    }

    #[test]
    fn empty_board_is_sorted() {
        let b = Board::new(0, 10, Vec::new()).unwrap();
        assert!(b.is_empty());
        assert!(b.is_sorted());
    }

    proptest! {
        #[test]
        fn double_swap_is_identity(w in 2usize..40, h in 1usize..6, i in 0usize..40, j in 0usize..40) {
            let (i, j) = (i % w, j % w);
            let mut b = tagged(w, h);
            b.swap(i, j);
            b.swap(i, j);
            prop_assert_eq!(b, tagged(w, h));
        }
    }
}
