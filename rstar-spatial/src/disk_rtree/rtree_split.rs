//! R* placement heuristics: subtree choice, node split and the selection of
//! entries for forced reinsertion.
//!
//! Everything here is pure: functions take entries by value or reference and
//! hand back new groupings. The engine decides what to do with the result.

use std::cmp::Ordering;

use super::rtree_types::ChildRef;
use crate::hyper_rectangle::HyperRectangle;
use crate::spatial_point::SpatialPoint;

/// Anything with an axis-aligned extent that a node can hold.
pub(crate) trait Bounded {
    fn lower(&self, axis: usize) -> f64;
    fn upper(&self, axis: usize) -> f64;
    fn envelope(&self) -> HyperRectangle;

    /// Squared distance between the centre of this entry and `center`.
    fn center_distance_sq(&self, center: &[f64]) -> f64 {
        center
            .iter()
            .enumerate()
            .map(|(axis, c)| {
                let mid = (self.lower(axis) + self.upper(axis)) / 2.0;
                (mid - c) * (mid - c)
            })
            .sum()
    }
}

impl Bounded for SpatialPoint {
    #[inline]
    fn lower(&self, axis: usize) -> f64 {
        self.coordinates()[axis]
    }

    #[inline]
    fn upper(&self, axis: usize) -> f64 {
        self.coordinates()[axis]
    }

    fn envelope(&self) -> HyperRectangle {
        self.mbr()
    }
}

impl Bounded for ChildRef {
    #[inline]
    fn lower(&self, axis: usize) -> f64 {
        self.mbr.min()[axis]
    }

    #[inline]
    fn upper(&self, axis: usize) -> f64 {
        self.mbr.max()[axis]
    }

    fn envelope(&self) -> HyperRectangle {
        self.mbr.clone()
    }
}

/// Which side of an entry's extent a sort looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bound {
    Lower,
    Upper,
}

/// Orders entries by one bound on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AxisOrder {
    pub axis: usize,
    pub bound: Bound,
}

impl AxisOrder {
    pub fn new(axis: usize, bound: Bound) -> Self {
        Self { axis, bound }
    }

    #[inline]
    fn key<T: Bounded>(&self, entry: &T) -> f64 {
        match self.bound {
            Bound::Lower => entry.lower(self.axis),
            Bound::Upper => entry.upper(self.axis),
        }
    }

    pub fn compare<T: Bounded>(&self, a: &T, b: &T) -> Ordering {
        self.key(a).total_cmp(&self.key(b))
    }

    /// Indices of `entries` in this order. The sort is stable, so equal keys
    /// keep their node order.
    fn sorted_indices<T: Bounded>(&self, entries: &[T]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..entries.len()).collect();
        order.sort_by(|&a, &b| self.compare(&entries[a], &entries[b]));
        order
    }
}

/// Running bounding boxes of a sorted entry sequence:
/// `prefix[i]` covers `order[..=i]`, `suffix[i]` covers `order[i..]`.
struct Sweep {
    prefix: Vec<HyperRectangle>,
    suffix: Vec<HyperRectangle>,
}

impl Sweep {
    fn new<T: Bounded>(entries: &[T], order: &[usize]) -> Self {
        let mut prefix: Vec<HyperRectangle> = Vec::with_capacity(order.len());
        for &idx in order {
            let next = match prefix.last() {
                Some(last) => last.merged(&entries[idx].envelope()),
                None => entries[idx].envelope(),
            };
            prefix.push(next);
        }

        let mut suffix: Vec<HyperRectangle> = Vec::with_capacity(order.len());
        for &idx in order.iter().rev() {
            let next = match suffix.last() {
                Some(last) => last.merged(&entries[idx].envelope()),
                None => entries[idx].envelope(),
            };
            suffix.push(next);
        }
        suffix.reverse();

        Self { prefix, suffix }
    }

    /// Bounding boxes of the two groups when the first holds `k` entries.
    fn groups(&self, k: usize) -> (&HyperRectangle, &HyperRectangle) {
        (&self.prefix[k - 1], &self.suffix[k])
    }
}

fn distribution_range(len: usize, min_fill: usize) -> std::ops::RangeInclusive<usize> {
    let min_fill = min_fill.max(1);
    min_fill..=len.saturating_sub(min_fill)
}

/// Splits an overflowing entry set in two with the R* split.
///
/// The split axis is the one whose distributions have the smallest summed
/// margin. On that axis the distribution with the least overlap between the
/// two groups wins, ties going to the smallest total volume. Both groups hold
/// at least `min_fill` entries.
pub(crate) fn split_entries<T: Bounded>(entries: Vec<T>, min_fill: usize) -> (Vec<T>, Vec<T>) {
    let len = entries.len();
    let range = distribution_range(len, min_fill);
    let Some(dimension) = entries.first().map(|e| e.envelope().dimension()) else {
        return (entries, Vec::new());
    };
    if range.is_empty() {
        // Too few entries for a legal distribution, halve them.
        let mut first = entries;
        let second = first.split_off(len / 2);
        return (first, second);
    }

    // Choose the split axis.
    let mut best_axis = 0;
    let mut best_margin = f64::INFINITY;
    for axis in 0..dimension {
        let mut margin = 0.0;
        for bound in [Bound::Lower, Bound::Upper] {
            let order = AxisOrder::new(axis, bound).sorted_indices(&entries);
            let sweep = Sweep::new(&entries, &order);
            for k in range.clone() {
                let (first, second) = sweep.groups(k);
                margin += first.margin() + second.margin();
            }
        }
        if margin < best_margin {
            best_margin = margin;
            best_axis = axis;
        }
    }

    // Choose the distribution on that axis.
    let mut best: Option<(Vec<usize>, usize)> = None;
    let mut best_overlap = f64::INFINITY;
    let mut best_volume = f64::INFINITY;
    for bound in [Bound::Lower, Bound::Upper] {
        let order = AxisOrder::new(best_axis, bound).sorted_indices(&entries);
        let sweep = Sweep::new(&entries, &order);
        let mut chosen_k = None;
        for k in range.clone() {
            let (first, second) = sweep.groups(k);
            let overlap = first.overlap(second);
            let volume = first.volume() + second.volume();
            if overlap < best_overlap || (overlap == best_overlap && volume < best_volume) {
                best_overlap = overlap;
                best_volume = volume;
                chosen_k = Some(k);
            }
        }
        if let Some(k) = chosen_k {
            best = Some((order, k));
        }
    }

    let (order, k) = match best {
        Some(best) => best,
        None => ((0..len).collect(), *range.start()),
    };

    let mut rank = vec![0usize; len];
    for (position, &idx) in order.iter().enumerate() {
        rank[idx] = position;
    }
    let mut ranked: Vec<(usize, T)> = entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| (rank[idx], entry))
        .collect();
    ranked.sort_by_key(|(position, _)| *position);

    let mut first: Vec<T> = Vec::with_capacity(k);
    let mut second: Vec<T> = Vec::with_capacity(len - k);
    for (position, entry) in ranked {
        if position < k {
            first.push(entry);
        } else {
            second.push(entry);
        }
    }
    (first, second)
}

fn compare_keys(a: &[f64], b: &[f64]) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Picks the child of an internal node that should receive `mbr`.
///
/// When the children are leaves the choice minimises the overlap growth with
/// the sibling MBRs after the volume growth; higher up overlap is ignored.
/// Remaining ties go to the smaller volume, then the smaller margin, then the
/// lower index.
pub(crate) fn choose_subtree(
    children: &[ChildRef],
    mbr: &HyperRectangle,
    children_are_leaves: bool,
) -> usize {
    let mut best_idx = 0;
    let mut best_key: Option<Vec<f64>> = None;

    for (i, child) in children.iter().enumerate() {
        let enlarged = child.mbr.merged(mbr);
        let enlargement = (enlarged.volume() - child.mbr.volume()).max(0.0);

        let mut key = Vec::with_capacity(4);
        key.push(enlargement);
        if children_are_leaves {
            let overlap_growth: f64 = children
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, sibling)| {
                    enlarged.overlap(&sibling.mbr) - child.mbr.overlap(&sibling.mbr)
                })
                .sum();
            key.push(overlap_growth);
        }
        key.push(child.mbr.volume());
        key.push(child.mbr.margin());

        let better = match &best_key {
            Some(best) => compare_keys(&key, best).is_lt(),
            None => true,
        };
        if better {
            best_idx = i;
            best_key = Some(key);
        }
    }
    best_idx
}

/// Number of entries forced out of an overflowing node of `capacity + 1`
/// entries, 0 when reinsertion is disabled.
pub(crate) fn reinsert_count(capacity: usize, min_fill: usize, fraction: f64) -> usize {
    if fraction <= 0.0 {
        return 0;
    }
    let overflowing = capacity + 1;
    let upper = overflowing.saturating_sub(min_fill).max(1);
    let count = (fraction * overflowing as f64).round() as usize;
    count.clamp(1, upper)
}

/// Removes the `count` entries whose centre lies farthest from `center`.
///
/// The remaining entries keep their order. The removed entries are returned
/// farthest first.
pub(crate) fn take_farthest<T: Bounded>(
    entries: &mut Vec<T>,
    center: &[f64],
    count: usize,
) -> Vec<T> {
    let count = count.min(entries.len());
    if count == 0 {
        return Vec::new();
    }

    let distances: Vec<f64> = entries
        .iter()
        .map(|entry| entry.center_distance_sq(center))
        .collect();
    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by(|&a, &b| distances[b].total_cmp(&distances[a]));

    let mut removal_rank: Vec<Option<usize>> = vec![None; entries.len()];
    for (rank, &idx) in order.iter().take(count).enumerate() {
        removal_rank[idx] = Some(rank);
    }

    let mut kept = Vec::with_capacity(entries.len() - count);
    let mut removed: Vec<(usize, T)> = Vec::with_capacity(count);
    for (idx, entry) in entries.drain(..).enumerate() {
        match removal_rank[idx] {
            Some(rank) => removed.push((rank, entry)),
            None => kept.push(entry),
        }
    }
    *entries = kept;

    removed.sort_by_key(|(rank, _)| *rank);
    removed.into_iter().map(|(_, entry)| entry).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(coords: &[f64], id: u64) -> SpatialPoint {
        SpatialPoint::new(coords.to_vec(), id).unwrap()
    }

    fn child(min: &[f64], max: &[f64], page_id: u64) -> ChildRef {
        ChildRef {
            mbr: HyperRectangle::new(min.to_vec(), max.to_vec()).unwrap(),
            page_id,
        }
    }

    fn envelope_of<T: Bounded>(entries: &[T]) -> HyperRectangle {
        let mut bbox = entries[0].envelope();
        for entry in &entries[1..] {
            bbox.expand(&entry.envelope());
        }
        bbox
    }

    #[test]
    fn test_axis_order_compares_selected_bound() {
        let a = child(&[0.0, 5.0], &[10.0, 6.0], 1);
        let b = child(&[1.0, 0.0], &[2.0, 9.0], 2);

        assert_eq!(AxisOrder::new(0, Bound::Lower).compare(&a, &b), Ordering::Less);
        assert_eq!(AxisOrder::new(0, Bound::Upper).compare(&a, &b), Ordering::Greater);
        assert_eq!(AxisOrder::new(1, Bound::Lower).compare(&a, &b), Ordering::Greater);
        assert_eq!(AxisOrder::new(1, Bound::Upper).compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_split_separates_two_clusters() {
        let ys = [0.0, 0.3, 0.1, 0.4, 0.2];
        let mut entries = Vec::new();
        for i in 0..5u64 {
            let x = i as f64 * 0.1;
            entries.push(point(&[x, ys[i as usize]], i));
            entries.push(point(&[100.0 + x, ys[i as usize]], 10 + i));
        }

        let (first, second) = split_entries(entries, 2);
        assert_eq!(first.len(), 5);
        assert_eq!(second.len(), 5);

        let left = envelope_of(&first);
        let right = envelope_of(&second);
        assert_eq!(left.overlap(&right), 0.0);
        assert!(left.max()[0] < 1.0);
        assert!(right.min()[0] >= 100.0);
    }

    #[test]
    fn test_split_picks_axis_with_smaller_margin() {
        // Spread along y, narrow along x
        let entries: Vec<_> = (0..6)
            .map(|i| point(&[(i % 2) as f64 * 0.01, i as f64 * 10.0], i))
            .collect();

        let (first, second) = split_entries(entries, 2);
        let top = envelope_of(&first);
        let bottom = envelope_of(&second);
        assert!(top.max()[1] < bottom.min()[1] || bottom.max()[1] < top.min()[1]);
    }

    #[test]
    fn test_split_keeps_every_entry_once_and_respects_min_fill() {
        let entries: Vec<_> = (0..11)
            .map(|i| {
                let x = (i * 7 % 11) as f64;
                let y = (i * 3 % 5) as f64;
                child(&[x, y], &[x + 1.5, y + 0.5], i)
            })
            .collect();
        let original = envelope_of(&entries);

        let (first, second) = split_entries(entries, 4);
        assert!(first.len() >= 4);
        assert!(second.len() >= 4);
        assert_eq!(first.len() + second.len(), 11);

        let mut ids: Vec<u64> = first.iter().chain(second.iter()).map(|c| c.page_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..11).collect::<Vec<_>>());

        let union = envelope_of(&first).merged(&envelope_of(&second));
        assert_eq!(union, original);
    }

    #[test]
    fn test_split_of_three_points_with_min_fill_one() {
        let entries = vec![
            point(&[0.0, 0.0], 1),
            point(&[5.0, 5.0], 2),
            point(&[10.0, 10.0], 3),
        ];
        let (first, second) = split_entries(entries, 1);
        assert!(!first.is_empty());
        assert!(!second.is_empty());
        assert_eq!(first.len() + second.len(), 3);
    }

    #[test]
    fn test_split_is_deterministic() {
        let make = || -> Vec<SpatialPoint> {
            (0..9)
                .map(|i| point(&[(i % 3) as f64, (i / 3) as f64], i))
                .collect()
        };
        assert_eq!(split_entries(make(), 3), split_entries(make(), 3));
    }

    #[test]
    fn test_choose_subtree_prefers_no_enlargement() {
        let children = vec![
            child(&[0.0, 0.0], &[10.0, 10.0], 1),
            child(&[20.0, 20.0], &[30.0, 30.0], 2),
        ];
        let target = HyperRectangle::from_point(&[25.0, 25.0]);
        assert_eq!(choose_subtree(&children, &target, true), 1);
        assert_eq!(choose_subtree(&children, &target, false), 1);
    }

    #[test]
    fn test_choose_subtree_breaks_enlargement_tie_by_volume() {
        // Both contain the point; the smaller one wins.
        let children = vec![
            child(&[0.0, 0.0], &[10.0, 10.0], 1),
            child(&[4.0, 4.0], &[6.0, 6.0], 2),
        ];
        let target = HyperRectangle::from_point(&[5.0, 5.0]);
        assert_eq!(choose_subtree(&children, &target, false), 1);
        assert_eq!(choose_subtree(&children, &target, true), 1);
    }

    #[test]
    fn test_choose_subtree_leaf_level_minimises_overlap_growth() {
        // Growing child 0 or child 1 costs the same volume, but only the
        // grown child 0 runs into child 2.
        let children = vec![
            child(&[0.0, 0.0], &[2.0, 2.0], 1),
            child(&[4.0, 0.0], &[6.0, 2.0], 2),
            child(&[2.5, -10.0], &[2.6, 1.0], 3),
        ];
        let target = HyperRectangle::from_point(&[3.0, 1.5]);

        assert_eq!(choose_subtree(&children, &target, true), 1);
        // Above the leaf level overlap is ignored and the index decides.
        assert_eq!(choose_subtree(&children, &target, false), 0);
    }

    #[test]
    fn test_choose_subtree_lowest_index_on_full_tie() {
        let children = vec![
            child(&[0.0, 0.0], &[1.0, 1.0], 1),
            child(&[0.0, 0.0], &[1.0, 1.0], 2),
        ];
        let target = HyperRectangle::from_point(&[0.5, 0.5]);
        assert_eq!(choose_subtree(&children, &target, true), 0);
        assert_eq!(choose_subtree(&children, &target, false), 0);
    }

    #[test]
    fn test_reinsert_count() {
        assert_eq!(reinsert_count(145, 58, 0.30), 44);
        assert_eq!(reinsert_count(145, 58, 0.0), 0);
        // Small nodes still reinsert at least one entry
        assert_eq!(reinsert_count(2, 1, 0.1), 1);
        // Never leave fewer than min fill behind
        assert_eq!(reinsert_count(4, 2, 0.5), 3);
    }

    #[test]
    fn test_take_farthest_orders_by_distance() {
        let mut entries = vec![
            point(&[0.0, 0.0], 1),
            point(&[9.0, 0.0], 2),
            point(&[1.0, 0.0], 3),
            point(&[-5.0, 0.0], 4),
        ];
        let removed = take_farthest(&mut entries, &[0.0, 0.0], 2);

        let removed_ids: Vec<_> = removed.iter().map(|p| p.object_id()).collect();
        assert_eq!(removed_ids, vec![2, 4]);

        let kept_ids: Vec<_> = entries.iter().map(|p| p.object_id()).collect();
        assert_eq!(kept_ids, vec![1, 3]);
    }

    #[test]
    fn test_take_farthest_uses_child_centres() {
        let mut entries = vec![
            child(&[0.0, 0.0], &[2.0, 2.0], 1),
            child(&[8.0, 8.0], &[10.0, 10.0], 2),
        ];
        let removed = take_farthest(&mut entries, &[1.0, 1.0], 1);
        assert_eq!(removed[0].page_id, 2);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_take_farthest_zero_is_noop() {
        let mut entries = vec![point(&[0.0], 1)];
        assert!(take_farthest(&mut entries, &[0.0], 0).is_empty());
        assert_eq!(entries.len(), 1);
    }
}
