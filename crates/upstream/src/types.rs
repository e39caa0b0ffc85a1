//! Wire types returned by the upstream capability
//!
//! These mirror what the protocol client hands back before any shaping:
//! raw timestamps are the upstream's fixed-format date strings
//! (`"%a %b %d %H:%M:%S %z %Y"`), engagement counts may be absent, and
//! cursors are opaque. The pool's shaping layer turns these into the
//! normalized records served over HTTP.

use serde::{Deserialize, Serialize};

/// A resolved user, as the upstream reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub screen_name: String,
    pub name: String,
    /// Upstream date string, e.g. "Tue Mar 21 20:50:14 +0000 2006".
    pub created_at: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub followers_count: Option<u64>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// One media attachment on a tweet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMedia {
    pub id: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub media_url: String,
    #[serde(default)]
    pub display_url: Option<String>,
}

/// Edit metadata; absent entirely on tweets without edit history support.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditControl {
    pub is_edit_eligible: bool,
    pub edits_remaining: u32,
}

/// One tweet as the upstream reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTweet {
    pub id: String,
    /// Upstream date string, same format as `UserProfile::created_at`.
    pub created_at: String,
    pub text: String,
    pub user: UserProfile,
    #[serde(default)]
    pub views: Option<u64>,
    #[serde(default)]
    pub favorite_count: Option<u64>,
    #[serde(default)]
    pub retweet_count: Option<u64>,
    #[serde(default)]
    pub reply_count: Option<u64>,
    #[serde(default)]
    pub quote_count: Option<u64>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub media: Vec<RawMedia>,
    #[serde(default)]
    pub edit_control: Option<EditControl>,
}

/// One page of a user's timeline with its pagination cursors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetPage {
    pub items: Vec<RawTweet>,
    #[serde(default)]
    pub previous_cursor: Option<String>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}
