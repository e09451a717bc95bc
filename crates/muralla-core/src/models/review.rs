use serde::{Deserialize, Serialize};

/// Reviews below this rating are hidden by the Apify-backed feed.
pub const MIN_POSITIVE_RATING: u8 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Review {
    pub author_name: String,
    pub rating: u8,
    #[serde(default)]
    pub text: String,
    /// Publication time, epoch seconds
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub profile_photo_url: String,
    #[serde(default)]
    pub relative_time_description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl Review {
    pub fn is_positive(&self) -> bool {
        !self.text.trim().is_empty() && self.rating >= MIN_POSITIVE_RATING
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ReviewsResponse {
    pub reviews: Vec<Review>,
    pub rating: f64,
    #[serde(rename = "totalReviews", default, skip_serializing_if = "Option::is_none")]
    pub total_reviews: Option<usize>,
}

/// Keep only reviews with text and a rating of at least four stars.
pub fn keep_positive(reviews: Vec<Review>) -> Vec<Review> {
    reviews.into_iter().filter(Review::is_positive).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: u8, text: &str) -> Review {
        Review {
            author_name: "Ana".to_string(),
            rating,
            text: text.to_string(),
            time: 0,
            profile_photo_url: String::new(),
            relative_time_description: String::new(),
            images: Vec::new(),
        }
    }

    #[test]
    fn test_keep_positive_by_rating() {
        let reviews = [5, 3, 4, 2, 5].iter().map(|r| review(*r, "rico")).collect();
        let kept: Vec<u8> = keep_positive(reviews).iter().map(|r| r.rating).collect();
        assert_eq!(kept, vec![5, 4, 5]);
    }

    #[test]
    fn test_keep_positive_requires_text() {
        let kept = keep_positive(vec![review(5, "   "), review(5, ""), review(4, "ok")]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text, "ok");
    }
}
