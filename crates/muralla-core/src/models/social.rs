use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One tile of the Instagram/TikTok feed mirror.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    pub id: String,
    /// Always routed through `/api/instagram-image`
    pub image: String,
    pub link: String,
    #[serde(default)]
    pub caption: String,
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default)]
    pub comments: Vec<Value>,
    #[serde(rename = "commentCount", default)]
    pub comment_count: u64,
    #[serde(rename = "likesCount", default, skip_serializing_if = "Option::is_none")]
    pub likes_count: Option<u64>,
}
