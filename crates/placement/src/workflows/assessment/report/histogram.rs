use serde::Serialize;

use crate::workflows::ids::TestId;

pub const BUCKET_COUNT: usize = 11;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistogramBucket {
    pub upper_bound: i64,
    pub percent: u8,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestReport {
    pub test_id: TestId,
    pub total_points: i64,
    pub threshold: u8,
    pub cutoff: i64,
    pub passed: usize,
    pub failed: usize,
    pub buckets: Vec<HistogramBucket>,
}

impl TestReport {
    /// Cutoff is `floor(threshold% * total_points)`; a score at the cutoff
    /// passes. Each score lands in the first bucket whose upper bound is at
    /// least the score. Bucket 10 is pinned to `total_points`, and anything
    /// above every bound is counted there so the buckets always sum to the
    /// number of scores.
    pub fn from_scores(test_id: TestId, total_points: i64, threshold: u8, scores: &[i64]) -> Self {
        let cutoff = cutoff(total_points, threshold);
        let passed = scores.iter().filter(|score| **score >= cutoff).count();

        let bounds = bucket_bounds(total_points);
        let mut counts = [0usize; BUCKET_COUNT];
        for score in scores {
            let index = bounds
                .iter()
                .position(|bound| *bound >= *score)
                .unwrap_or(BUCKET_COUNT - 1);
            counts[index] += 1;
        }

        let buckets = bounds
            .iter()
            .zip(counts)
            .enumerate()
            .map(|(index, (bound, count))| {
                let percent = (index * 10) as u8;
                HistogramBucket {
                    upper_bound: *bound,
                    percent,
                    label: format!("{bound} / {percent}%"),
                    count,
                }
            })
            .collect();

        Self {
            test_id,
            total_points,
            threshold,
            cutoff,
            passed,
            failed: scores.len() - passed,
            buckets,
        }
    }

    pub fn participants(&self) -> usize {
        self.passed + self.failed
    }
}

fn cutoff(total_points: i64, threshold: u8) -> i64 {
    (i64::from(threshold) * total_points).div_euclid(100)
}

fn bucket_bounds(total_points: i64) -> [i64; BUCKET_COUNT] {
    let width = total_points.div_euclid(10) + 1;
    let mut bounds = [0i64; BUCKET_COUNT];
    for (index, bound) in bounds.iter_mut().enumerate() {
        *bound = width * index as i64;
    }
    bounds[BUCKET_COUNT - 1] = total_points;
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_floors_percentage_of_total() {
        let report = TestReport::from_scores(TestId(1), 97, 60, &[58, 57]);
        assert_eq!(report.cutoff, 58);
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn bounds_follow_width_and_pin_last_bucket() {
        let report = TestReport::from_scores(TestId(1), 97, 50, &[]);
        let bounds: Vec<i64> = report.buckets.iter().map(|b| b.upper_bound).collect();
        assert_eq!(bounds, vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 97]);
        assert_eq!(report.buckets[10].label, "97 / 100%");
        assert_eq!(report.buckets[3].label, "30 / 30%");
    }

    #[test]
    fn scores_land_in_first_bucket_that_covers_them() {
        let report = TestReport::from_scores(TestId(1), 20, 50, &[0, 3, 3, 4, 20, 19]);
        // width 3: bounds 0,3,...,27 with the last pinned to 20, so 19 and 20
        // are both captured by the 21 bound before bucket 10 is reached
        let counts: Vec<usize> = report.buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 2, 1, 0, 0, 0, 0, 2, 0, 0, 0]);
    }

    #[test]
    fn out_of_range_scores_still_counted() {
        let report = TestReport::from_scores(TestId(1), 97, 100, &[120, -1]);
        let total: usize = report.buckets.iter().map(|b| b.count).sum();
        assert_eq!(total, 2);
        assert_eq!(report.buckets[0].count, 1);
        assert_eq!(report.buckets[10].count, 1);
    }

    #[test]
    fn low_totals_pin_last_bound_below_bucket_nine() {
        let report = TestReport::from_scores(TestId(1), 5, 60, &[0, 5, 6, 9, 10, 42]);
        let bounds: Vec<i64> = report.buckets.iter().map(|b| b.upper_bound).collect();
        assert_eq!(bounds, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 5]);
        let counts: Vec<usize> = report.buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 0, 0, 0, 0, 1, 1, 0, 0, 1, 2]);
        assert_eq!(report.buckets[10].label, "5 / 100%");
        assert_eq!(report.cutoff, 3);
    }
}
