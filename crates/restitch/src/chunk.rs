//! Partitioning staged segments into bounded merge groups.
//!
//! Handing thousands of files to one merge invocation risks argument
//! and open-file limits; grouping caps per-invocation resource use and
//! leaves the final pass a few dozen inputs at most.

use std::ops::Range;

/// Splits `total` staged segments into consecutive 0-based index
/// ranges of at most `size` entries each.
pub fn plan_chunks(total: usize, size: usize) -> Vec<Range<usize>> {
    if total == 0 || size == 0 {
        return Vec::new();
    }
    (0..total)
        .step_by(size)
        .map(|start| start..usize::min(start + size, total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(plan: &[Range<usize>]) -> Vec<usize> {
        plan.iter().map(|range| range.len()).collect()
    }

    #[test]
    fn one_hundred_thirty_segments_split_fifty_fifty_thirty() {
        let plan = plan_chunks(130, 50);
        assert_eq!(sizes(&plan), vec![50, 50, 30]);
        assert_eq!(plan[0], 0..50);
        assert_eq!(plan[2], 100..130);
    }

    #[test]
    fn exact_multiples_have_no_remainder_group() {
        assert_eq!(sizes(&plan_chunks(100, 50)), vec![50, 50]);
    }

    #[test]
    fn fewer_segments_than_the_group_size_stay_in_one_group() {
        assert_eq!(sizes(&plan_chunks(10, 50)), vec![10]);
    }

    #[test]
    fn degenerate_inputs_produce_no_groups() {
        assert!(plan_chunks(0, 50).is_empty());
        assert!(plan_chunks(10, 0).is_empty());
    }

    #[test]
    fn group_size_one_isolates_every_segment() {
        assert_eq!(sizes(&plan_chunks(3, 1)), vec![1, 1, 1]);
    }
}
