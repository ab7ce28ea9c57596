use std::fmt::Display;

use crate::geometry::{GeometryError, Point};

/// A rectangle of cells on an `n` by `n` face grid, given by two opposite
/// corners.
///
/// A block whose corners are ordered `start <= end` on both coordinates is a
/// kernel. Rotating a kernel with [`Block::rotate_preserve_original`] keeps
/// the corner order, so the number of rotations away from the kernel can be
/// read back from the block alone with [`Block::detect_n_rotations`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Block {
    pub start: Point,
    pub end: Point,
}

impl Block {
    #[must_use]
    pub const fn new(start: Point, end: Point) -> Self {
        Block { start, end }
    }

    #[must_use]
    pub const fn cell(p: Point) -> Self {
        Block { start: p, end: p }
    }

    /// The kernel-shaped copy of this block covering the same cells.
    #[must_use]
    pub fn normalize(self) -> Self {
        Block {
            start: Point::new(
                self.start.row.min(self.end.row),
                self.start.col.min(self.end.col),
            ),
            end: Point::new(
                self.start.row.max(self.end.row),
                self.start.col.max(self.end.col),
            ),
        }
    }

    #[must_use]
    pub fn rows(self) -> usize {
        self.start.row.abs_diff(self.end.row) + 1
    }

    #[must_use]
    pub fn cols(self) -> usize {
        self.start.col.abs_diff(self.end.col) + 1
    }

    #[must_use]
    pub fn size(self) -> usize {
        self.rows() * self.cols()
    }

    #[must_use]
    pub fn contains(self, p: Point) -> bool {
        let b = self.normalize();
        (b.start.row..=b.end.row).contains(&p.row) && (b.start.col..=b.end.col).contains(&p.col)
    }

    /// Rotates both corners `k` quarter turns clockwise without reordering
    /// them.
    #[must_use]
    pub const fn rotate_preserve_original(self, n: usize, k: usize) -> Self {
        Block {
            start: self.start.rotate_cw_n(n, k),
            end: self.end.rotate_cw_n(n, k),
        }
    }

    /// How many clockwise quarter turns separate a block with these corners
    /// from its kernel. Equal coordinates count as "not greater", which makes
    /// the answer total but ambiguous for one-row or one-column blocks.
    #[must_use]
    pub const fn detect_n_rotations(start: Point, end: Point) -> usize {
        match (start.row > end.row, start.col > end.col) {
            (false, false) => 0,
            (true, false) => 1,
            (true, true) => 2,
            (false, true) => 3,
        }
    }

    #[must_use]
    pub const fn n_rotations(self) -> usize {
        Self::detect_n_rotations(self.start, self.end)
    }

    /// The kernel this block was rotated from.
    #[must_use]
    pub const fn detect_original(self, n: usize) -> Self {
        self.rotate_preserve_original(n, 4 - self.n_rotations())
    }

    /// Cells of the block in the row-major order of its kernel, carried onto
    /// the block by the detected rotation.
    #[must_use]
    pub fn iterate_points(start: Point, end: Point, n: usize) -> Vec<Point> {
        let k = Self::detect_n_rotations(start, end);
        let kernel = Block { start, end }
            .rotate_preserve_original(n, 4 - k)
            .normalize();
        let (r0, r1) = (kernel.start.row, kernel.end.row);
        let (c0, c1) = (kernel.start.col, kernel.end.col);

        let mut out = Vec::with_capacity(kernel.size());
        match k {
            0 => {
                for row in r0..=r1 {
                    for col in c0..=c1 {
                        out.push(Point { row, col });
                    }
                }
            }
            1 => {
                for row in r0..=r1 {
                    for col in c0..=c1 {
                        out.push(Point {
                            row: n - 1 - col,
                            col: row,
                        });
                    }
                }
            }
            2 => {
                for row in r0..=r1 {
                    for col in c0..=c1 {
                        out.push(Point {
                            row: n - 1 - row,
                            col: n - 1 - col,
                        });
                    }
                }
            }
            _ => {
                for row in r0..=r1 {
                    for col in c0..=c1 {
                        out.push(Point {
                            row: col,
                            col: n - 1 - row,
                        });
                    }
                }
            }
        }
        out
    }

    #[must_use]
    pub fn points(self, n: usize) -> Vec<Point> {
        Self::iterate_points(self.start, self.end, n)
    }

    /// The cells of this block, ordered to line up with `order_by`'s kernel
    /// cells: entry `i` of the result is where kernel cell `i` of `order_by`
    /// lands on this block.
    ///
    /// # Errors
    ///
    /// Fails if no rotation of `order_by`'s kernel covers the same cells as
    /// this block.
    pub fn points_by(self, n: usize, order_by: Block) -> Result<Vec<Point>, GeometryError> {
        let kernel = order_by.detect_original(n).normalize();
        let target = self.normalize();
        // Blocks that map onto themselves under a half turn cover the same
        // cells for two rotations; matching the corners exactly picks one.
        let k = (0..4)
            .find(|&k| kernel.rotate_preserve_original(n, k) == self)
            .or_else(|| {
                (0..4).find(|&k| kernel.rotate_preserve_original(n, k).normalize() == target)
            })
            .ok_or_else(|| GeometryError::KernelMismatch {
                block: self.to_string(),
                order_by: order_by.to_string(),
            })?;

        Ok(kernel
            .points(n)
            .into_iter()
            .map(|p| p.rotate_cw_n(n, k))
            .collect())
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} -> {}]", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kernels(n: usize) -> impl Iterator<Item = Block> {
        (0..n).flat_map(move |r0| {
            (r0..n).flat_map(move |r1| {
                (0..n).flat_map(move |c0| {
                    (c0..n).map(move |c1| Block::new(Point::new(r0, c0), Point::new(r1, c1)))
                })
            })
        })
    }

    #[test]
    fn rotation_count_is_recoverable() {
        for n in 2..7 {
            for kernel in kernels(n).filter(|b| b.rows() > 1 && b.cols() > 1) {
                for k in 0..4 {
                    let rotated = kernel.rotate_preserve_original(n, k);
                    assert_eq!(rotated.n_rotations(), k, "{kernel} rotated {k} on {n}");
                    assert_eq!(rotated.detect_original(n), kernel);
                }
            }
        }
    }

    #[test]
    fn detect_original_round_trips_every_block() {
        for n in 1..6 {
            for kernel in kernels(n) {
                for k in 0..4 {
                    let block = kernel.rotate_preserve_original(n, k);
                    let original = block.detect_original(n);
                    assert_eq!(original, original.normalize());
                    assert_eq!(
                        original.rotate_preserve_original(n, block.n_rotations()),
                        block
                    );
                }
            }
        }
    }

    #[test]
    fn iterate_points_follows_the_kernel() {
        let n = 5;
        let kernel = Block::new(Point::new(0, 1), Point::new(1, 3));
        let kernel_points = kernel.points(n);
        assert_eq!(kernel_points.len(), 6);
        assert_eq!(kernel_points[0], Point::new(0, 1));
        assert_eq!(kernel_points[5], Point::new(1, 3));

        for k in 0..4 {
            let rotated = kernel.rotate_preserve_original(n, k);
            let points = rotated.points(n);
            assert_eq!(points.len(), kernel.size());
            for (p, q) in kernel_points.iter().zip(&points) {
                assert_eq!(p.rotate_cw_n(n, k), *q);
                assert!(rotated.contains(*q));
            }
        }
    }

    #[test]
    fn points_by_pairs_matching_kernel_cells() {
        let n = 6;
        for kernel in kernels(n).filter(|b| b.rows() > 1 && b.cols() > 1).step_by(7) {
            for a in 0..4 {
                for b in 0..4 {
                    let block_a = kernel.rotate_preserve_original(n, a);
                    let block_b = kernel.rotate_preserve_original(n, b);
                    let by_a = block_a.points_by(n, block_b).unwrap();
                    let by_b = block_b.points_by(n, block_b).unwrap();
                    assert_eq!(by_a.len(), kernel.size());
                    assert_eq!(by_b.len(), kernel.size());
                    for (pa, pb) in by_a.iter().zip(&by_b) {
                        assert_eq!(pb.rotate_cw_n(n, a + 4 - b), *pa);
                    }
                }
            }
        }
    }

    #[test]
    fn points_by_follows_corners_of_symmetric_rows() {
        let n = 5;
        let row = Block::new(Point::new(2, 1), Point::new(2, 3));
        let half_turn = row.rotate_preserve_original(n, 2);
        assert_eq!(half_turn.normalize(), row);
        assert_eq!(
            half_turn.points_by(n, row).unwrap(),
            vec![Point::new(2, 3), Point::new(2, 2), Point::new(2, 1)]
        );
        assert_eq!(row.points_by(n, row).unwrap(), row.points(n));
    }

    #[test]
    fn points_by_rejects_foreign_kernels() {
        let a = Block::new(Point::new(0, 0), Point::new(1, 2));
        let b = Block::new(Point::new(0, 0), Point::new(2, 2));
        assert!(matches!(
            a.points_by(4, b),
            Err(GeometryError::KernelMismatch { .. })
        ));
    }
}
