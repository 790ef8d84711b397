//! Bounded pitch history for overlay rendering.

use std::collections::VecDeque;

use super::PitchPoint;

/// Time-ordered window of recent pitch points.
///
/// Points older than `retention_secs` behind the newest point are evicted on
/// every push.
#[derive(Debug, Clone)]
pub struct PitchHistory {
    retention_secs: f64,
    points: VecDeque<PitchPoint>,
}

impl PitchHistory {
    pub fn new(retention_secs: f64) -> Self {
        Self {
            retention_secs: retention_secs.max(0.0),
            points: VecDeque::new(),
        }
    }

    pub fn retention_secs(&self) -> f64 {
        self.retention_secs
    }

    /// Insert a point, keeping the history sorted by `t_sec`
    pub fn push(&mut self, point: PitchPoint) {
        match self.points.back() {
            Some(last) if point.t_sec < last.t_sec => {
                let index = self.points.partition_point(|p| p.t_sec <= point.t_sec);
                self.points.insert(index, point);
            }
            _ => self.points.push_back(point),
        }
        self.evict();
    }

    fn evict(&mut self) {
        let Some(newest) = self.points.back().map(|p| p.t_sec) else {
            return;
        };
        let cutoff = newest - self.retention_secs;
        while self.points.front().is_some_and(|p| p.t_sec < cutoff) {
            self.points.pop_front();
        }
    }

    /// Points with `start <= t_sec < end`
    pub fn range(&self, start: f64, end: f64) -> impl Iterator<Item = &PitchPoint> + '_ {
        let lo = self.points.partition_point(|p| p.t_sec < start);
        let hi = self.points.partition_point(|p| p.t_sec < end).max(lo);
        self.points.range(lo..hi)
    }

    pub fn latest(&self) -> Option<&PitchPoint> {
        self.points.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PitchPoint> + '_ {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}
