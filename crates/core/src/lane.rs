//! Lane allocation: which horizontal strip a new item may enter.

use danmaku_protocol::ItemKey;

/// Where and when a lane last admitted an item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Admission {
    /// The admitted item; only it moves `x`.
    pub item: ItemKey,
    pub time_ms: f64,
    /// Starts at the admission x and follows that item as it moves left.
    pub x: f64,
}

/// A lane is a horizontal strip of fixed height spanning the viewport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lane {
    pub last: Option<Admission>,
}

impl Lane {
    /// Whether an item `candidate_width` wide, entering at the right edge,
    /// can share this lane with the previous occupant.
    fn admits(
        &self,
        candidate_width: f64,
        viewport_width: f64,
        now_ms: f64,
        margin: f64,
        fallback_ms: f64,
    ) -> bool {
        let Some(last) = self.last else {
            return true;
        };
        last.x < viewport_width - candidate_width - margin || now_ms - last.time_ms > fallback_ms
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaneTable {
    lanes: Vec<Lane>,
    lane_height: f64,
    margin: f64,
    fallback_ms: f64,
}

impl LaneTable {
    pub fn new(lane_height: f64, margin: f64, fallback_ms: f64) -> Self {
        Self {
            lanes: Vec::new(),
            lane_height,
            margin,
            fallback_ms,
        }
    }

    /// Rebuild for a viewport of `height`: `floor(height / lane_height)`
    /// empty lanes. Unmeasurable heights give zero lanes.
    pub fn resize(&mut self, height: f64) {
        let count = if height.is_finite() && height > 0.0 && self.lane_height > 0.0 {
            (height / self.lane_height).floor() as usize
        } else {
            0
        };
        self.lanes = vec![Lane::default(); count];
    }

    /// Forget every admission, keeping the lane count.
    pub fn reset(&mut self) {
        self.lanes.fill(Lane::default());
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    /// Pick the first lane that can take an item of `candidate_width` and
    /// record `item` as that lane's newest occupant.
    ///
    /// Falls back to lane 0 when every lane is busy: a late overlap is
    /// better than a dropped comment.
    pub fn allocate(
        &mut self,
        item: ItemKey,
        candidate_width: f64,
        viewport_width: f64,
        now_ms: f64,
    ) -> usize {
        let (margin, fallback_ms) = (self.margin, self.fallback_ms);
        let idx = self
            .lanes
            .iter()
            .position(|lane| {
                lane.admits(candidate_width, viewport_width, now_ms, margin, fallback_ms)
            })
            .unwrap_or_else(|| {
                tracing::debug!(
                    lanes = self.lanes.len(),
                    candidate_width,
                    "all lanes busy, overlapping lane 0"
                );
                0
            });
        if let Some(lane) = self.lanes.get_mut(idx) {
            lane.last = Some(Admission {
                item,
                time_ms: now_ms,
                x: viewport_width,
            });
        }
        idx
    }

    /// Follow `item` as it moves. Ignored unless `item` is the newest
    /// occupant of `lane`, so older items cannot make a lane look free.
    pub fn track(&mut self, lane: usize, item: ItemKey, x: f64) {
        if let Some(Lane {
            last: Some(admission),
        }) = self.lanes.get_mut(lane)
            && admission.item == item
        {
            admission.x = x;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(height: f64) -> LaneTable {
        let mut t = LaneTable::new(50.0, 50.0, 3000.0);
        t.resize(height);
        t
    }

    #[test]
    fn lane_count_is_floor_of_height() {
        assert_eq!(table(200.0).len(), 4);
        assert_eq!(table(249.0).len(), 4);
        assert_eq!(table(49.0).len(), 0);
        assert_eq!(table(f64::NAN).len(), 0);
    }

    #[test]
    fn fills_lanes_in_order_then_overlaps_lane_zero() {
        let mut t = table(200.0);
        let picks: Vec<usize> = (0..5u32)
            .map(|i| t.allocate(ItemKey(u64::from(i)), 100.0, 800.0, f64::from(i) * 10.0))
            .collect();
        assert_eq!(picks, vec![0, 1, 2, 3, 0]);
    }

    #[test]
    fn lane_frees_once_previous_item_moved_far_enough() {
        let mut t = table(100.0);
        assert_eq!(t.allocate(ItemKey(0), 100.0, 800.0, 0.0), 0);
        // Needs last_x < 800 - 100 - 50 = 650.
        t.track(0, ItemKey(0), 650.0);
        assert_eq!(t.allocate(ItemKey(1), 100.0, 800.0, 10.0), 1);
        t.track(0, ItemKey(0), 649.0);
        assert_eq!(t.allocate(ItemKey(2), 100.0, 800.0, 20.0), 0);
    }

    #[test]
    fn wider_candidate_needs_more_room() {
        let mut t = table(100.0);
        t.allocate(ItemKey(0), 10.0, 800.0, 0.0);
        t.track(0, ItemKey(0), 600.0);
        // 600 < 800 - 300 - 50 = 450 is false.
        assert_eq!(t.allocate(ItemKey(1), 300.0, 800.0, 1.0), 1);
    }

    #[test]
    fn stalled_lane_reused_after_fallback() {
        let mut t = table(100.0);
        assert_eq!(t.allocate(ItemKey(0), 100.0, 800.0, 0.0), 0);
        assert_eq!(t.allocate(ItemKey(1), 100.0, 800.0, 10.0), 1);
        // Lane 0 never moved, but its admission is more than 3000ms old.
        assert_eq!(t.allocate(ItemKey(2), 100.0, 800.0, 3005.0), 0);
        assert_eq!(t.lanes()[0].last.map(|a| a.time_ms), Some(3005.0));
    }

    #[test]
    fn zero_lanes_always_answers_lane_zero() {
        let mut t = table(0.0);
        assert_eq!(t.allocate(ItemKey(0), 100.0, 800.0, 0.0), 0);
        t.track(0, ItemKey(0), 10.0);
        assert!(t.is_empty());
    }

    #[test]
    fn only_newest_occupant_moves_the_lane() {
        let mut t = table(100.0);
        assert_eq!(t.allocate(ItemKey(0), 100.0, 800.0, 0.0), 0);
        t.track(0, ItemKey(0), 100.0);
        assert_eq!(t.allocate(ItemKey(1), 100.0, 800.0, 10.0), 0);
        // Item 1 is held at the edge; the older item keeps moving.
        t.track(0, ItemKey(0), 90.0);
        assert_eq!(t.lanes()[0].last.map(|a| a.x), Some(800.0));
        assert_eq!(t.allocate(ItemKey(2), 100.0, 800.0, 20.0), 1);
    }

    #[test]
    fn reset_keeps_count() {
        let mut t = table(200.0);
        t.allocate(ItemKey(0), 100.0, 800.0, 0.0);
        t.reset();
        assert_eq!(t.len(), 4);
        assert!(t.lanes().iter().all(|l| l.last.is_none()));
    }
}
