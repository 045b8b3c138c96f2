//! Selection and scroll-window bookkeeping for the resource table.

/// First row to draw so that `selected` is on screen.
///
/// Pure function of its inputs so it can be re-applied on every draw: the
/// row count may change between draws without any scroll event. The window
/// only moves as far as needed to keep the selection visible, and never
/// leaves blank space at the bottom while rows above are hidden.
pub fn scroll_window(selected: usize, len: usize, height: usize, previous_top: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let capacity = height.max(1);
    let selected = selected.min(len - 1);

    let mut top = previous_top;
    if selected < top {
        top = selected;
    } else {
        let last_visible = top.saturating_add(capacity - 1);
        if selected > last_visible {
            top = selected + 1 - capacity;
        }
    }

    let max_top = len.saturating_sub(capacity);
    top.min(max_top)
}

/// `0 <= top_row <= selected_row <= top_row + height - 1` whenever rows exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    selected_row: usize,
    top_row: usize,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_row(&self) -> usize {
        self.selected_row
    }

    pub fn top_row(&self) -> usize {
        self.top_row
    }

    /// Move up one row, wrapping to the last row. Returns whether the
    /// selection changed; tables with fewer than two rows never move.
    pub fn scroll_up(&mut self, len: usize) -> bool {
        if len <= 1 {
            return false;
        }
        self.selected_row = match self.selected_row {
            0 => len - 1,
            n => n.min(len) - 1,
        };
        true
    }

    /// Move down one row, wrapping to row 0.
    pub fn scroll_down(&mut self, len: usize) -> bool {
        if len <= 1 {
            return false;
        }
        self.selected_row = if self.selected_row + 1 >= len {
            0
        } else {
            self.selected_row + 1
        };
        true
    }

    /// Move up a page without wrapping.
    pub fn page_up(&mut self, len: usize, height: usize) -> bool {
        self.select(self.selected_row.saturating_sub(height.max(1)), len)
    }

    /// Move down a page without wrapping.
    pub fn page_down(&mut self, len: usize, height: usize) -> bool {
        self.select(self.selected_row.saturating_add(height.max(1)), len)
    }

    pub fn home(&mut self, len: usize) -> bool {
        self.select(0, len)
    }

    pub fn end(&mut self, len: usize) -> bool {
        self.select(len.saturating_sub(1), len)
    }

    fn select(&mut self, row: usize, len: usize) -> bool {
        let row = row.min(len.saturating_sub(1));
        let changed = row != self.selected_row;
        self.selected_row = row;
        changed
    }

    /// Pull the selection back into `[0, len - 1]` after the row list was
    /// replaced. Returns whether the selection moved.
    pub fn clamp(&mut self, len: usize) -> bool {
        let max = len.saturating_sub(1);
        if self.selected_row > max {
            self.selected_row = max;
            return true;
        }
        false
    }

    /// Re-establish the scroll-window invariant for a table of `height`
    /// visible rows.
    pub fn ensure_visible(&mut self, len: usize, height: usize) {
        self.clamp(len);
        self.top_row = scroll_window(self.selected_row, len, height, self.top_row);
    }
}
