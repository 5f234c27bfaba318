//! Fast marching front over an occlusion mask.
//!
//! Known pixels start at arrival time 0. The narrow band (known pixels that
//! touch the hole) seeds a min-heap; popping the smallest arrival time
//! freezes a pixel and reaches its occluded 4-neighbors, whose arrival time
//! comes from the first-order eikonal update. Each occluded pixel is handed
//! to the fill callback exactly once, at the moment it is reached, so the
//! hole is filled from its boundary inward.

use std::{cmp::Ordering, collections::BinaryHeap};

use crate::types::Mask;

const UNREACHED: f32 = 1.0e6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelState {
    Known,
    Band,
    Inside,
}

#[derive(Debug, Clone, Copy)]
struct FrontEntry {
    time: f32,
    order: u64,
    index: usize,
}

impl PartialEq for FrontEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontEntry {}

impl PartialOrd for FrontEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontEntry {
    // Reversed so `BinaryHeap` pops the earliest arrival; ties go to insertion order.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.order.cmp(&self.order))
    }
}

pub(crate) struct MarchingFront {
    width: usize,
    height: usize,
    state: Vec<PixelState>,
    time: Vec<f32>,
    heap: BinaryHeap<FrontEntry>,
    pushed: u64,
}

impl MarchingFront {
    pub(crate) fn new(mask: &Mask) -> Self {
        let (width, height) = (mask.width() as usize, mask.height() as usize);
        let mut state = Vec::with_capacity(width * height);
        let mut time = Vec::with_capacity(width * height);
        for &value in mask.as_image().as_raw() {
            if value != 0 {
                state.push(PixelState::Inside);
                time.push(UNREACHED);
            } else {
                state.push(PixelState::Known);
                time.push(0.0);
            }
        }

        let mut front = Self {
            width,
            height,
            state,
            time,
            heap: BinaryHeap::new(),
            pushed: 0,
        };

        for y in 0..height {
            for x in 0..width {
                let index = y * width + x;
                if front.state[index] != PixelState::Known {
                    continue;
                }
                let touches_hole = front
                    .neighbors4(x, y)
                    .any(|(nx, ny)| front.state[ny * width + nx] == PixelState::Inside);
                if touches_hole {
                    front.state[index] = PixelState::Band;
                    front.push(index, 0.0);
                }
            }
        }
        front
    }

    pub(crate) fn width(&self) -> usize {
        self.width
    }

    pub(crate) fn height(&self) -> usize {
        self.height
    }

    /// True once the pixel holds a value: either known from the start or already filled.
    pub(crate) fn is_settled(&self, x: usize, y: usize) -> bool {
        self.state[y * self.width + x] != PixelState::Inside
    }

    pub(crate) fn time(&self, x: usize, y: usize) -> f32 {
        self.time[y * self.width + x]
    }

    /// Central-difference gradient of the arrival time, using settled neighbors only.
    pub(crate) fn time_gradient(&self, x: usize, y: usize) -> (f32, f32) {
        let t = self.time(x, y);
        let gx = self.axis_difference(t, (x > 0).then(|| (x - 1, y)), (x + 1 < self.width).then(|| (x + 1, y)));
        let gy = self.axis_difference(t, (y > 0).then(|| (x, y - 1)), (y + 1 < self.height).then(|| (x, y + 1)));
        (gx, gy)
    }

    fn axis_difference(&self, center: f32, before: Option<(usize, usize)>, after: Option<(usize, usize)>) -> f32 {
        let before = before.filter(|&(x, y)| self.is_settled(x, y)).map(|(x, y)| self.time(x, y));
        let after = after.filter(|&(x, y)| self.is_settled(x, y)).map(|(x, y)| self.time(x, y));
        match (before, after) {
            (Some(b), Some(a)) => (a - b) * 0.5,
            (None, Some(a)) => a - center,
            (Some(b), None) => center - b,
            (None, None) => 0.0,
        }
    }

    pub(crate) fn neighbors4(&self, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> + use<> {
        let (width, height) = (self.width, self.height);
        [
            (x.checked_sub(1), Some(y)),
            ((x + 1 < width).then_some(x + 1), Some(y)),
            (Some(x), y.checked_sub(1)),
            (Some(x), (y + 1 < height).then_some(y + 1)),
        ]
        .into_iter()
        .filter_map(|(nx, ny)| Some((nx?, ny?)))
    }

    /// Advance the front until every occluded pixel has been reached and filled.
    ///
    /// `fill` receives the front and the coordinates of a freshly reached pixel.
    /// At that point the pixel is already marked settled, so callers skip it
    /// explicitly when sampling its neighborhood.
    pub(crate) fn march<F>(&mut self, mut fill: F)
    where
        F: FnMut(&MarchingFront, usize, usize),
    {
        while let Some(entry) = self.heap.pop() {
            if self.state[entry.index] == PixelState::Known {
                continue;
            }
            self.state[entry.index] = PixelState::Known;

            let (x, y) = (entry.index % self.width, entry.index / self.width);
            let reached: Vec<(usize, usize)> = self
                .neighbors4(x, y)
                .filter(|&(nx, ny)| self.state[ny * self.width + nx] == PixelState::Inside)
                .collect();

            for (nx, ny) in reached {
                let index = ny * self.width + nx;
                let time = self.arrival_time(nx, ny);
                self.time[index] = time;
                self.state[index] = PixelState::Band;
                fill(&*self, nx, ny);
                self.push(index, time);
            }
        }
    }

    fn push(&mut self, index: usize, time: f32) {
        self.heap.push(FrontEntry {
            time,
            order: self.pushed,
            index,
        });
        self.pushed += 1;
    }

    fn arrival_time(&self, x: usize, y: usize) -> f32 {
        let up = y.checked_sub(1).map(|ny| (x, ny));
        let down = (y + 1 < self.height).then_some((x, y + 1));
        let left = x.checked_sub(1).map(|nx| (nx, y));
        let right = (x + 1 < self.width).then_some((x + 1, y));

        [(up, left), (up, right), (down, left), (down, right)]
            .into_iter()
            .map(|(vertical, horizontal)| self.solve(vertical, horizontal))
            .fold(UNREACHED, f32::min)
    }

    /// First-order eikonal solution from one vertical and one horizontal neighbor.
    fn solve(&self, first: Option<(usize, usize)>, second: Option<(usize, usize)>) -> f32 {
        let settled = |p: Option<(usize, usize)>| p.filter(|&(x, y)| self.is_settled(x, y)).map(|(x, y)| self.time(x, y));
        match (settled(first), settled(second)) {
            (Some(a), Some(b)) => {
                let diff = a - b;
                if diff.abs() >= 1.0 {
                    1.0 + a.min(b)
                } else {
                    (a + b + (2.0 - diff * diff).sqrt()) * 0.5
                }
            }
            (Some(a), None) | (None, Some(a)) => 1.0 + a,
            (None, None) => UNREACHED,
        }
    }
}
