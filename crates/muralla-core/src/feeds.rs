//! Reshape scraper datasets into the site's feed contracts.
//!
//! Apify items are loosely shaped JSON whose fields vary between actor
//! versions, so every lookup accepts several spellings and falls back to
//! a sensible default instead of failing the whole feed.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};
use tracing::debug;

use crate::models::review::keep_positive;
use crate::models::{first_number, first_str, Review, ReviewsResponse, SocialPost};

/// Maximum number of tiles in a feed mirror
pub const MAX_FEED_POSTS: usize = 10;

/// Path of the image passthrough endpoint
pub const IMAGE_PROXY_PATH: &str = "/api/instagram-image";

/// Default TikTok account used to build video links
pub const TIKTOK_ACCOUNT: &str = "muralla.cafe";

/// Route a CDN image through the site's image proxy.
pub fn proxied_image_url(url: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(url.as_bytes()).collect();
    format!("{}?url={}", IMAGE_PROXY_PATH, encoded)
}

fn proxied_or_empty(url: Option<&str>) -> String {
    url.map(proxied_image_url).unwrap_or_default()
}

/// `YYYY-MM-DD` from an ISO string or an epoch-seconds number, else `today`.
fn post_date(value: Option<&Value>, today: NaiveDate) -> String {
    let parsed = match value {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc).date_naive())
            .ok(),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.date_naive()),
        _ => None,
    };
    parsed.unwrap_or(today).format("%Y-%m-%d").to_string()
}

/// Short code of the post a comment belongs to.
fn comment_post_id(comment: &Value) -> Option<String> {
    if let Some(code) = first_str(comment, &["postShortCode", "shortCode"]) {
        return Some(code.to_string());
    }
    let url = first_str(comment, &["url"])?;
    let rest = url.split("/p/").nth(1)?;
    rest.split('/').next().filter(|id| !id.is_empty()).map(str::to_string)
}

/// Group a comments dataset by post short code.
pub fn group_comments(items: &[Value]) -> HashMap<String, Vec<Value>> {
    let mut grouped: HashMap<String, Vec<Value>> = HashMap::new();
    for comment in items {
        let Some(post_id) = comment_post_id(comment) else {
            continue;
        };
        grouped.entry(post_id).or_default().push(json!({
            "id": comment.get("id").cloned().unwrap_or(Value::Null),
            "text": comment.get("text").cloned().unwrap_or(Value::Null),
            "username": comment.get("ownerUsername").cloned().unwrap_or(Value::Null),
            "timestamp": comment.get("timestamp").cloned().unwrap_or(Value::Null),
            "likesCount": comment.get("likesCount").and_then(Value::as_u64).unwrap_or(0),
        }));
    }
    debug!(posts = grouped.len(), "Grouped comments");
    grouped
}

fn array_field(value: &Value, keys: &[&str]) -> Vec<Value> {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(Value::as_array).filter(|a| !a.is_empty()))
        .cloned()
        .unwrap_or_default()
}

fn count_field(value: &Value, keys: &[&str], fallback: usize) -> u64 {
    first_number(value, keys)
        .map(|n| n.max(0.0) as u64)
        .unwrap_or(fallback as u64)
}

/// Build the Instagram mirror from a posts dataset and grouped comments.
///
/// Carousel posts (`type: "Sidecar"`) are expanded so every slide becomes
/// its own tile sharing the parent's link, caption and comments.
pub fn instagram_posts(
    items: &[Value],
    comments: &HashMap<String, Vec<Value>>,
    today: NaiveDate,
) -> Vec<SocialPost> {
    let mut posts = Vec::new();

    for (index, post) in items.iter().enumerate() {
        let short_code = first_str(post, &["shortCode"]);
        let date = post_date(post.get("timestamp"), today);
        let link = first_str(post, &["url"]).map(str::to_string).unwrap_or_else(|| {
            format!("https://www.instagram.com/p/{}/", short_code.unwrap_or_default())
        });
        let caption = first_str(post, &["caption"]).unwrap_or_default().to_string();

        let post_comments = short_code
            .and_then(|code| comments.get(code))
            .filter(|c| !c.is_empty())
            .cloned()
            .unwrap_or_else(|| array_field(post, &["latestComments", "comments"]));
        let comment_count = count_field(post, &["commentsCount"], post_comments.len());

        let children = post
            .get("childPosts")
            .and_then(Value::as_array)
            .filter(|children| !children.is_empty());
        let is_carousel = first_str(post, &["type"]) == Some("Sidecar");

        match children {
            Some(children) if is_carousel => {
                for (child_index, child) in children.iter().enumerate() {
                    posts.push(SocialPost {
                        id: format!("{}-{}", short_code.unwrap_or_default(), child_index),
                        image: proxied_or_empty(first_str(child, &["displayUrl", "url"])),
                        link: link.clone(),
                        caption: caption.clone(),
                        date: date.clone(),
                        platform: None,
                        comments: post_comments.clone(),
                        comment_count,
                        likes_count: None,
                    });
                }
            }
            _ => posts.push(SocialPost {
                id: short_code
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("post-{}", index)),
                image: proxied_or_empty(first_str(post, &["displayUrl", "thumbnailUrl", "url"])),
                link,
                caption,
                date,
                platform: None,
                comments: post_comments,
                comment_count,
                likes_count: None,
            }),
        }
    }

    posts.truncate(MAX_FEED_POSTS);
    posts
}

/// Build the TikTok mirror from a video dataset.
pub fn tiktok_posts(items: &[Value], today: NaiveDate) -> Vec<SocialPost> {
    let mut posts: Vec<SocialPost> = items
        .iter()
        .enumerate()
        .map(|(index, video)| {
            let id = video
                .get("id")
                .and_then(|id| match id {
                    Value::String(s) if !s.is_empty() => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                });

            let image = video
                .get("videoMeta")
                .and_then(|meta| first_str(meta, &["coverUrl", "dynamicCover"]))
                .or_else(|| video.get("authorMeta").and_then(|meta| first_str(meta, &["avatar"])))
                .or_else(|| video.get("covers").and_then(|covers| first_str(covers, &["default"])));

            let comments = array_field(video, &["comments"]);
            let comment_count = count_field(video, &["commentCount"], comments.len());

            SocialPost {
                link: first_str(video, &["webVideoUrl"])
                    .map(str::to_string)
                    .unwrap_or_else(|| {
                        format!(
                            "https://www.tiktok.com/@{}/video/{}",
                            TIKTOK_ACCOUNT,
                            id.as_deref().unwrap_or_default()
                        )
                    }),
                id: id.unwrap_or_else(|| format!("tiktok-{}", index)),
                image: proxied_or_empty(image),
                caption: first_str(video, &["text"]).unwrap_or_default().to_string(),
                date: post_date(video.get("createTimeISO"), today),
                platform: Some("tiktok".to_string()),
                comments,
                comment_count,
                likes_count: Some(count_field(video, &["diggCount", "likesCount"], 0)),
            }
        })
        .collect();

    posts.truncate(MAX_FEED_POSTS);
    posts
}

/// Convert a Google Maps scraper place into the reviews widget payload.
///
/// Only reviews with text and at least four stars are kept.
pub fn reviews_from_place(place: &Value, now: DateTime<Utc>) -> ReviewsResponse {
    let reviews = place
        .get("reviews")
        .and_then(Value::as_array)
        .map(|reviews| reviews.iter().map(|r| review_from_scrape(r, now)).collect())
        .unwrap_or_default();

    let reviews = keep_positive(reviews);
    ReviewsResponse {
        total_reviews: Some(reviews.len()),
        reviews,
        rating: first_number(place, &["totalScore"]).unwrap_or(0.0),
    }
}

fn review_from_scrape(review: &Value, now: DateTime<Utc>) -> Review {
    let time = first_str(review, &["publishAt"])
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.timestamp())
        .unwrap_or_else(|| now.timestamp());

    Review {
        author_name: first_str(review, &["name"]).unwrap_or_default().to_string(),
        rating: first_number(review, &["stars"])
            .map(|stars| stars.clamp(0.0, 5.0).round() as u8)
            .unwrap_or(0),
        text: first_str(review, &["text", "textTranslated"]).unwrap_or_default().to_string(),
        time,
        profile_photo_url: first_str(review, &["reviewerPhotoUrl", "reviewerUrl"])
            .unwrap_or_default()
            .to_string(),
        relative_time_description: first_str(review, &["publishedAtDate"])
            .unwrap_or_default()
            .to_string(),
        images: review
            .get("reviewImageUrls")
            .and_then(Value::as_array)
            .map(|urls| urls.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 2).unwrap()
    }

    #[test]
    fn test_proxied_image_url_encodes() {
        assert_eq!(
            proxied_image_url("https://scontent.cdninstagram.com/v/a.jpg?x=1&y=2"),
            "/api/instagram-image?url=https%3A%2F%2Fscontent.cdninstagram.com%2Fv%2Fa.jpg%3Fx%3D1%26y%3D2"
        );
    }

    #[test]
    fn test_regular_post() {
        let items = vec![json!({
            "shortCode": "Cx1",
            "displayUrl": "https://scontent.cdninstagram.com/a.jpg",
            "caption": "Hoy lasaña",
            "timestamp": "2025-10-20T15:00:00.000Z",
            "commentsCount": 7
        })];
        let posts = instagram_posts(&items, &HashMap::new(), today());
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "Cx1");
        assert_eq!(posts[0].link, "https://www.instagram.com/p/Cx1/");
        assert_eq!(posts[0].date, "2025-10-20");
        assert_eq!(posts[0].comment_count, 7);
        assert!(posts[0].image.starts_with("/api/instagram-image?url=https%3A%2F%2F"));
    }

    #[test]
    fn test_carousel_expansion() {
        let items = vec![json!({
            "shortCode": "Cx2",
            "type": "Sidecar",
            "url": "https://www.instagram.com/p/Cx2/",
            "timestamp": 1761955200,
            "childPosts": [
                {"displayUrl": "https://scontent.cdninstagram.com/1.jpg"},
                {"url": "https://scontent.cdninstagram.com/2.jpg"},
                {}
            ]
        })];
        let posts = instagram_posts(&items, &HashMap::new(), today());
        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["Cx2-0", "Cx2-1", "Cx2-2"]);
        assert!(posts.iter().all(|p| p.link == "https://www.instagram.com/p/Cx2/"));
        assert_eq!(posts[0].date, "2025-11-01");
        assert_eq!(posts[2].image, "");
    }

    #[test]
    fn test_feed_is_capped() {
        let items: Vec<Value> = (0..15).map(|i| json!({"shortCode": format!("p{i}")})).collect();
        assert_eq!(instagram_posts(&items, &HashMap::new(), today()).len(), MAX_FEED_POSTS);
    }

    #[test]
    fn test_comments_grouped_and_attached() {
        let comments = group_comments(&[
            json!({"id": "c1", "text": "rico", "ownerUsername": "ana", "postShortCode": "Cx1"}),
            json!({
                "id": "c2",
                "text": "wow",
                "ownerUsername": "beto",
                "url": "https://www.instagram.com/p/Cx1/c/2"
            }),
            json!({"id": "c3", "text": "sin post"}),
        ]);
        assert_eq!(comments.get("Cx1").map(Vec::len), Some(2));

        let posts = instagram_posts(&[json!({"shortCode": "Cx1"})], &comments, today());
        assert_eq!(posts[0].comment_count, 2);
        assert_eq!(posts[0].comments[1]["username"], "beto");
        assert_eq!(posts[0].comments[0]["likesCount"], 0);
    }

    #[test]
    fn test_tiktok_posts() {
        let items = vec![
            json!({
                "id": "735",
                "text": "Nuevo frapé",
                "createTimeISO": "2025-10-30T12:00:00.000Z",
                "videoMeta": {"coverUrl": "https://p16-sign.tiktokcdn.com/c.jpg"},
                "diggCount": 42,
                "commentCount": 3
            }),
            json!({"covers": {"default": "https://p16.tiktokcdn.com/d.jpg"}}),
        ];
        let posts = tiktok_posts(&items, today());
        assert_eq!(posts[0].link, "https://www.tiktok.com/@muralla.cafe/video/735");
        assert_eq!(posts[0].platform.as_deref(), Some("tiktok"));
        assert_eq!(posts[0].likes_count, Some(42));
        assert_eq!(posts[0].comment_count, 3);
        assert_eq!(posts[0].date, "2025-10-30");
        assert_eq!(posts[1].id, "tiktok-1");
        assert_eq!(posts[1].date, "2025-11-02");
        assert!(posts[1].image.contains("tiktokcdn.com"));
    }

    #[test]
    fn test_reviews_from_place_filters() {
        let place = json!({
            "title": "Muralla Café",
            "totalScore": 4.8,
            "reviews": [
                {"name": "A", "stars": 5, "text": "Excelente", "publishAt": "2025-10-01T10:00:00Z"},
                {"name": "B", "stars": 3, "text": "Bien"},
                {"name": "C", "stars": 4, "textTranslated": "Good coffee"},
                {"name": "D", "stars": 2, "text": "Lento"},
                {"name": "E", "stars": 5, "text": ""}
            ]
        });
        let now = Utc::now();
        let response = reviews_from_place(&place, now);
        let authors: Vec<&str> = response.reviews.iter().map(|r| r.author_name.as_str()).collect();
        assert_eq!(authors, vec!["A", "C"]);
        assert_eq!(response.total_reviews, Some(2));
        assert_eq!(response.rating, 4.8);
        assert_eq!(response.reviews[0].time, 1759312800);
        assert_eq!(response.reviews[1].time, now.timestamp());
    }
}
