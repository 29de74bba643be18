//! Title rating aggregation
//!
//! A title's rating is the arithmetic mean of its review scores truncated
//! toward zero, or `None` when it has no reviews. It is never stored; every
//! read recomputes it from the current set of reviews.

/// Rating from a full list of scores
pub fn of_scores(scores: &[i64]) -> Option<i64> {
    if scores.is_empty() {
        return None;
    }
    let sum: i64 = scores.iter().sum();
    // Integer division truncates toward zero
    Some(sum / scores.len() as i64)
}

/// Rating from the `AVG(score)` aggregate the store computes
///
/// SQL `AVG` over an empty set is NULL, which maps to no rating.
pub fn from_mean(mean: Option<f64>) -> Option<i64> {
    mean.map(|value| value.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_reviews_means_no_rating() {
        assert_eq!(of_scores(&[]), None);
        assert_eq!(from_mean(None), None);
    }

    #[test]
    fn test_mean_is_truncated() {
        assert_eq!(of_scores(&[10]), Some(10));
        assert_eq!(of_scores(&[1, 2]), Some(1));
        assert_eq!(of_scores(&[9, 10]), Some(9));
        assert_eq!(of_scores(&[5, 6, 6]), Some(5));
        assert_eq!(of_scores(&[1, 1, 1, 10]), Some(3));
    }

    #[test]
    fn test_aggregate_matches_list_computation() {
        let cases: [&[i64]; 5] = [&[1], &[3, 4], &[7, 8, 10], &[10, 10, 9, 1], &[2, 2, 2, 2, 3]];
        for scores in cases {
            let mean = scores.iter().sum::<i64>() as f64 / scores.len() as f64;
            assert_eq!(from_mean(Some(mean)), of_scores(scores), "scores {:?}", scores);
        }
    }
}
