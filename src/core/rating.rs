use crate::models::Rating;

/// Aggregate rating of a profile: the mean over all ratings of the
/// per-rating component average, 0.0 when the profile has none.
pub fn total_rating(ratings: &[Rating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }

    let sum: f64 = ratings.iter().map(Rating::average).sum();
    sum / ratings.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(amability: u8, ponctuality: u8, reliability: u8, serious: u8) -> Rating {
        Rating {
            by: Some("famille dupont".to_string()),
            amability,
            ponctuality,
            reliability,
            serious,
        }
    }

    #[test]
    fn test_total_rating_empty() {
        assert_eq!(total_rating(&[]), 0.0);
    }

    #[test]
    fn test_total_rating_single() {
        let ratings = vec![rating(4, 4, 4, 4)];
        assert_eq!(total_rating(&ratings), 4.0);
    }

    #[test]
    fn test_total_rating_mean_of_averages() {
        // (5+5+5+5)/4 = 5.0 and (1+1+3+3)/4 = 2.0, mean 3.5
        let ratings = vec![rating(5, 5, 5, 5), rating(1, 1, 3, 3)];
        assert_eq!(total_rating(&ratings), 3.5);
    }
}
