use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Branch entity with per-star feedback counters.
///
/// The weighted average is derived from the counters, never stored.
#[derive(Debug, Clone, FromRow)]
pub struct Branch {
    pub id: i64,
    pub name: String,
    pub rating_1_count: i32,
    pub rating_2_count: i32,
    pub rating_3_count: i32,
    pub rating_4_count: i32,
    pub rating_5_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Branch {
    /// Weighted average rating; 0.0 when no feedback has been recorded.
    pub fn rating(&self) -> f64 {
        let counts = [
            self.rating_1_count,
            self.rating_2_count,
            self.rating_3_count,
            self.rating_4_count,
            self.rating_5_count,
        ];
        let total: i64 = counts.iter().map(|&c| c as i64).sum();
        if total == 0 {
            return 0.0;
        }
        let weighted: i64 = counts
            .iter()
            .enumerate()
            .map(|(i, &c)| (i as i64 + 1) * c as i64)
            .sum();
        weighted as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(counts: [i32; 5]) -> Branch {
        Branch {
            id: 1,
            name: "Main".to_string(),
            rating_1_count: counts[0],
            rating_2_count: counts[1],
            rating_3_count: counts[2],
            rating_4_count: counts[3],
            rating_5_count: counts[4],
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_rating_zero_when_no_feedback() {
        assert_eq!(branch([0, 0, 0, 0, 0]).rating(), 0.0);
    }

    #[test]
    fn test_rating_weighted_average() {
        // 1*1 + 5*3 = 16 over 4 votes
        let b = branch([1, 0, 0, 0, 3]);
        assert!((b.rating() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rating_all_fives() {
        assert_eq!(branch([0, 0, 0, 0, 7]).rating(), 5.0);
    }
}
