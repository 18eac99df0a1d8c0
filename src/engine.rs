// src/engine.rs
//
// Scramble and sort. Both only touch the board through `Board::swap` and
// report every swap to `on_swap`, which is where redraw decisions happen.

use rand::Rng;

use crate::board::Board;

/// One shuffle pass: every column trades places with a uniformly chosen one.
pub fn scramble_pass<R, F>(board: &mut Board, rng: &mut R, on_swap: &mut F)
where
    R: Rng + ?Sized,
    F: FnMut(&Board),
{
    let n = board.width();
    for i in 0..n {
        let r = rng.random_range(0..n);
        board.swap(i, r);
        on_swap(board);
    }
}

/// Quicksort with the pivot taken from the right end of each range.
///
/// Ranges are kept on an explicit stack and visited in the same order a
/// recursive left-then-right implementation would.
pub fn quicksort<F>(board: &mut Board, on_swap: &mut F)
where
    F: FnMut(&Board),
{
    if board.width() < 2 {
        return;
    }

    let mut ranges = vec![(0usize, board.width() - 1)];
    while let Some((left, right)) = ranges.pop() {
        if right <= left {
            continue;
        }
        let p = partition(board, left, right, on_swap);
        // Right is pushed first so the left range is finished before it.
        if p + 1 < right {
            ranges.push((p + 1, right));
        }
        if p > left + 1 {
            ranges.push((left, p - 1));
        }
    }
}

/// Returns the final position of the pivot.
fn partition<F>(board: &mut Board, left: usize, right: usize, on_swap: &mut F) -> usize
where
    F: FnMut(&Board),
{
    let pivot = board.value(right);
    let mut lo = left;
    let mut hi = right;

    loop {
        // Stops at `right` at the latest: that slot holds the pivot.
        while board.value(lo) < pivot {
            lo += 1;
        }
        // May run past `left`, but never below column 0.
        while hi > 0 {
            hi -= 1;
            if board.value(hi) <= pivot {
                break;
            }
        }

        if lo >= hi {
            break;
        }
        board.swap(lo, hi);
        on_swap(board);
        lo += 1;
    }

    board.swap(lo, right);
    on_swap(board);
    lo
}
