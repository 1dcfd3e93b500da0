//! Caret positions: the offset → x table behind cursor placement and
//! click hit-testing.
//!
//! Entry `i` is the pen x immediately before character `i`; the last
//! entry is the pen x after the final character. The table is rebuilt
//! wholesale by every layout pass from the same pen positions the quads
//! were placed with.

use serde::Serialize;

/// Cumulative x-offsets for every insertion point of a line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PositionTable {
    origin_x: f32,
    positions: Vec<f32>,
}

impl PositionTable {
    /// Table for an empty line: one entry at the origin.
    pub fn empty(origin_x: f32) -> Self {
        Self {
            origin_x,
            positions: vec![origin_x],
        }
    }

    /// Wrap precomputed positions. `positions` should be non-decreasing.
    pub fn from_positions(origin_x: f32, positions: Vec<f32>) -> Self {
        Self { origin_x, positions }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.positions
    }

    /// Number of entries (characters + 1).
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of characters the table covers.
    pub fn char_count(&self) -> usize {
        self.positions.len().saturating_sub(1)
    }

    pub fn origin_x(&self) -> f32 {
        self.origin_x
    }

    /// Pen x after the last character.
    pub fn end_x(&self) -> f32 {
        self.positions.last().copied().unwrap_or(self.origin_x)
    }

    /// Total advance of the line.
    pub fn width(&self) -> f32 {
        self.end_x() - self.origin_x
    }

    /// Caret x for insertion offset `offset`. Offsets past the end clamp
    /// to the end of the line.
    pub fn cursor_x(&self, offset: usize) -> f32 {
        self.positions
            .get(offset)
            .or(self.positions.last())
            .copied()
            .unwrap_or(self.origin_x)
    }

    /// Insertion offset closest to `x`.
    ///
    /// Clicks left of the first entry map to 0 and clicks right of the
    /// last entry map to the end. A click exactly halfway between two
    /// entries resolves to the earlier one.
    pub fn hit_test(&self, x: f32) -> usize {
        let positions = &self.positions;
        if positions.is_empty() {
            return 0;
        }
        // First entry at or right of the click.
        let i = positions.partition_point(|&p| p < x);
        if i == 0 {
            return 0;
        }
        if i == positions.len() {
            return positions.len() - 1;
        }
        let before = x - positions[i - 1];
        let after = positions[i] - x;
        if after < before {
            i
        } else {
            i - 1
        }
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn hi() -> PositionTable {
        PositionTable::from_positions(0.0, vec![0.0, 10.0, 14.0])
    }

    #[test]
    fn test_empty_line() {
        let table = PositionTable::empty(5.0);
        assert_eq!(table.as_slice(), &[5.0]);
        assert_eq!(table.char_count(), 0);
        assert_eq!(table.cursor_x(0), 5.0);
        assert_eq!(table.cursor_x(3), 5.0);
        assert_eq!(table.hit_test(-100.0), 0);
        assert_eq!(table.hit_test(100.0), 0);
        assert_eq!(table.width(), 0.0);
    }

    #[test]
    fn test_truly_empty_table_uses_origin() {
        let table = PositionTable::from_positions(7.0, Vec::new());
        assert_eq!(table.cursor_x(0), 7.0);
        assert_eq!(table.end_x(), 7.0);
        assert_eq!(table.hit_test(3.0), 0);
    }

    #[test]
    fn test_click_nearest_boundary() {
        let table = hi();
        assert_eq!(table.hit_test(11.0), 1);
        assert_eq!(table.hit_test(13.0), 2);
        assert_eq!(table.hit_test(4.0), 0);
        assert_eq!(table.hit_test(6.0), 1);
    }

    #[test]
    fn test_click_clamps() {
        let table = hi();
        assert_eq!(table.hit_test(-3.0), 0);
        assert_eq!(table.hit_test(500.0), 2);
        assert_eq!(table.hit_test(f32::NAN), 0);
    }

    #[test]
    fn test_tie_prefers_earlier_offset() {
        let table = hi();
        assert_eq!(table.hit_test(5.0), 0);
        assert_eq!(table.hit_test(12.0), 1);
    }

    #[test]
    fn test_hit_test_inverts_positions() {
        let table = PositionTable::from_positions(
            3.0,
            vec![3.0, 9.5, 12.25, 20.0, 20.5, 31.0],
        );
        for (k, &x) in table.as_slice().iter().enumerate() {
            assert_eq!(table.hit_test(x), k, "x = {x}");
        }
    }

    #[test]
    fn test_cursor_x_clamps_past_end() {
        let table = hi();
        assert_eq!(table.cursor_x(0), 0.0);
        assert_eq!(table.cursor_x(1), 10.0);
        assert_eq!(table.cursor_x(2), 14.0);
        assert_eq!(table.cursor_x(99), 14.0);
    }

    #[test]
    fn test_width() {
        let table = PositionTable::from_positions(10.0, vec![10.0, 18.0, 25.0]);
        assert_eq!(table.width(), 15.0);
        assert_eq!(table.char_count(), 2);
        assert_eq!(table.len(), 3);
    }
}
