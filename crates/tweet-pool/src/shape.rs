//! Normalized tweet and author records
//!
//! Turns the upstream's raw wire shapes into the records served over HTTP:
//! timestamps become epoch milliseconds, engagement counts stay nullable,
//! and every tweet gets a canonical permalink. The upstream's date strings
//! use one fixed format; a string that doesn't parse fails shaping, and
//! the session maps that to the generic unexpected-error outcome.

use chrono::DateTime;
use serde::Serialize;
use upstream::{RawMedia, RawTweet, UserProfile};

/// Upstream date format, e.g. "Tue Mar 21 20:50:14 +0000 2006".
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// A raw record that could not be normalized.
#[derive(Debug, thiserror::Error)]
#[error("malformed created_at {value:?}: {source}")]
pub struct ShapeError {
    value: String,
    source: chrono::ParseError,
}

/// Normalized author record, nested inside every tweet.
#[derive(Debug, Clone, Serialize)]
pub struct Author {
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub profile_image: Option<String>,
    pub followers_count: Option<u64>,
    pub verified: Option<bool>,
    pub description: Option<String>,
    pub website: Option<String>,
}

/// Engagement counts; any count the upstream omits serializes as null.
#[derive(Debug, Clone, Serialize)]
pub struct Engagement {
    pub views: Option<u64>,
    pub likes: Option<u64>,
    pub retweets: Option<u64>,
    pub replies: Option<u64>,
    pub quotes: Option<u64>,
}

/// One media attachment.
#[derive(Debug, Clone, Serialize)]
pub struct MediaItem {
    pub id: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub url: String,
    pub display_url: Option<String>,
}

/// Normalized tweet record.
#[derive(Debug, Clone, Serialize)]
pub struct Tweet {
    pub id: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub text: String,
    pub author: Author,
    pub engagement: Engagement,
    pub hashtags: Vec<String>,
    pub media: Vec<MediaItem>,
    pub is_editable: bool,
    pub edits_remaining: Option<u32>,
    /// Canonical permalink built from author handle and tweet id.
    pub url: String,
}

fn epoch_millis(raw: &str) -> Result<i64, ShapeError> {
    DateTime::parse_from_str(raw, CREATED_AT_FORMAT)
        .map(|dt| dt.timestamp_millis())
        .map_err(|source| ShapeError {
            value: raw.to_string(),
            source,
        })
}

/// Normalize a resolved user into an author record.
pub fn shape_user(user: &UserProfile) -> Result<Author, ShapeError> {
    Ok(Author {
        user_id: user.id.clone(),
        username: user.screen_name.clone(),
        display_name: user.name.clone(),
        created_at: epoch_millis(&user.created_at)?,
        profile_image: user.profile_image_url.clone(),
        followers_count: user.followers_count,
        verified: user.verified,
        description: user.description.clone(),
        website: user.url.clone(),
    })
}

/// Normalize one raw tweet.
pub fn shape_tweet(tweet: &RawTweet) -> Result<Tweet, ShapeError> {
    Ok(Tweet {
        id: tweet.id.clone(),
        created_at: epoch_millis(&tweet.created_at)?,
        text: tweet.text.clone(),
        author: shape_user(&tweet.user)?,
        engagement: Engagement {
            views: tweet.views,
            likes: tweet.favorite_count,
            retweets: tweet.retweet_count,
            replies: tweet.reply_count,
            quotes: tweet.quote_count,
        },
        hashtags: tweet.hashtags.clone(),
        media: tweet.media.iter().map(shape_media).collect(),
        is_editable: tweet
            .edit_control
            .as_ref()
            .is_some_and(|ec| ec.is_edit_eligible),
        edits_remaining: tweet.edit_control.as_ref().map(|ec| ec.edits_remaining),
        url: format!(
            "https://x.com/{}/status/{}",
            tweet.user.screen_name, tweet.id
        ),
    })
}

fn shape_media(media: &RawMedia) -> MediaItem {
    MediaItem {
        id: media.id.clone(),
        media_type: media.media_type.clone(),
        url: media.media_url.clone(),
        display_url: media.display_url.clone(),
    }
}
