//! Post comment records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One comment on a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub post_id: String,
    pub comment_id: Option<String>,
    /// Opaque id of the commenter.
    pub internal_profile_id: Option<String>,
    /// Public handle of the commenter (`/in/<handle>`).
    pub public_profile_id: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub num_likes: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    /// Email addresses mentioned in the comment text.
    pub emails: Vec<String>,
}
