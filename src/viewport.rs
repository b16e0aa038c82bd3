//! Sliding-window viewport over the target text.
//!
//! The tracker keeps the cursor, the current line, and a moving window of
//! `window_size` lines whose byte bounds are always drawn from the line
//! offsets (or the target length as the final sentinel). Only the span
//! between the bounds is ever handed to the renderer.

/// Span of the target currently eligible for rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderSpan {
    pub left_idx: usize,
    pub right_idx: usize,
    pub cursor: usize,
    pub window_start_line: usize,
}

#[derive(Clone, Debug)]
pub struct ViewportTracker {
    target_len: usize,
    line_offsets: Vec<usize>,
    window_size: usize,
    cursor: usize,
    current_line: usize,
    window_start_line: usize,
    left_idx: usize,
    right_idx: usize,
}

impl ViewportTracker {
    /// `line_offsets` must be sorted ascending and start at 0; the tracker
    /// treats `target_len` as the final conceptual boundary.
    pub fn new(target_len: usize, line_offsets: Vec<usize>, window_size: usize) -> Self {
        debug_assert!(window_size > 0, "window size must be positive");
        debug_assert_eq!(line_offsets.first().copied(), Some(0));

        let right_idx = if window_size < line_offsets.len() {
            line_offsets[window_size]
        } else {
            target_len
        };

        let tracker = Self {
            target_len,
            line_offsets,
            window_size,
            cursor: 0,
            current_line: 0,
            window_start_line: 0,
            left_idx: 0,
            right_idx,
        };
        tracker.check_bounds();
        tracker
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_line(&self) -> usize {
        self.current_line
    }

    pub fn line_offsets(&self) -> &[usize] {
        &self.line_offsets
    }

    pub fn span(&self) -> RenderSpan {
        RenderSpan {
            left_idx: self.left_idx,
            right_idx: self.right_idx,
            cursor: self.cursor,
            window_start_line: self.window_start_line,
        }
    }

    /// Moves the cursor forward one byte; a no-op once the cursor sits on
    /// the final byte (reaching the end is the caller's completion signal).
    pub fn advance(&mut self) {
        if self.cursor + 1 >= self.target_len {
            return;
        }
        self.cursor += 1;

        let next_line = self.current_line + 1;
        if next_line < self.line_offsets.len() && self.cursor == self.line_offsets[next_line] {
            self.current_line = next_line;
            self.window_start_line =
                (self.current_line / self.window_size) * self.window_size;

            if self.current_line % self.window_size == 0 {
                // entering a new window: old right bound becomes the left
                self.left_idx = self.right_idx;
                let bound = self.window_start_line + self.window_size;
                self.right_idx = if bound < self.line_offsets.len() {
                    self.line_offsets[bound]
                } else {
                    self.target_len
                };
            }
        }
        self.check_bounds();
    }

    /// Mirror of [`advance`]: moves the cursor back one byte, sliding the
    /// window backward when the cursor leaves its first line.
    ///
    /// [`advance`]: ViewportTracker::advance
    pub fn retreat(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;

        if self.current_line > 0 && self.cursor < self.line_offsets[self.current_line] {
            self.current_line -= 1;
            self.window_start_line =
                (self.current_line / self.window_size) * self.window_size;

            if self.current_line % self.window_size == self.window_size - 1 {
                // leaving the window backward: old left bound becomes the right
                self.right_idx = self.left_idx;
                self.left_idx = self.line_offsets[self.window_start_line];
            }
        }
        self.check_bounds();
    }

    fn check_bounds(&self) {
        debug_assert!(
            self.left_idx <= self.cursor
                && self.cursor <= self.right_idx
                && self.right_idx <= self.target_len,
            "viewport bounds out of order: left={} cursor={} right={} len={}",
            self.left_idx,
            self.cursor,
            self.right_idx,
            self.target_len,
        );
        debug_assert!(
            self.left_idx == 0 || self.line_offsets.contains(&self.left_idx),
            "left bound {} not a line offset",
            self.left_idx
        );
        debug_assert!(
            self.right_idx == self.target_len || self.line_offsets.contains(&self.right_idx),
            "right bound {} not a line offset",
            self.right_idx
        );
    }
}
