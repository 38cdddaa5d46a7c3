//! Post comments, paged.

use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;
use serde_json::Value;

use super::{get_json, VOYAGER_API};
use crate::client::Transport;
use crate::error::FetchError;
use crate::json;
use crate::models::Comment;
use crate::utils::extract_emails;

pub const COMMENTS_PAGE_SIZE: usize = 100;

static PUBLIC_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/in/([^/?]+)").expect("valid regex"));

/// One page of comments plus the raw element count used to detect the end.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentPage {
    pub comments: Vec<Comment>,
    pub raw_count: usize,
}

pub struct CommentsFetcher;

impl CommentsFetcher {
    pub fn page_url(post_id: &str, start: usize) -> String {
        let activity = format!("urn%3Ali%3Aactivity%3A{}", post_id);
        format!(
            "{}/graphql?queryId=voyagerSocialDashComments.8cb29aedde780600a7ad17fc7ebb8277&queryName=SocialDashCommentsBySocialDetail&variables=(origins:List(),count:{},socialDetailUrn:urn%3Ali%3Afsd_socialDetail%3A%28{}%2C{}%2Curn%3Ali%3AhighlightedReply%3A-%29,sortOrder:REVERSE_CHRONOLOGICAL,start:{})",
            VOYAGER_API, COMMENTS_PAGE_SIZE, activity, activity, start
        )
    }

    pub async fn fetch_page(
        &self,
        transport: &dyn Transport,
        post_id: &str,
        start: usize,
    ) -> Result<CommentPage, FetchError> {
        let body = get_json(transport, &Self::page_url(post_id, start), "comments").await?;
        Ok(parse_comments(&body, post_id))
    }
}

pub(crate) fn parse_comments(body: &Value, post_id: &str) -> CommentPage {
    let elements = json::array_at(body, "data.socialDashCommentsBySocialDetail.elements");

    let comments = elements
        .iter()
        .map(|element| {
            let text = json::string_at(element, "commentary.text");
            Comment {
                post_id: post_id.to_string(),
                comment_id: json::str_at(element, "urn")
                    .and_then(|urn| urn.rsplit(',').next())
                    .map(|id| id.trim_end_matches(')').to_string()),
                internal_profile_id: json::string_at(element, "commenter.commenterProfileId"),
                public_profile_id: json::str_at(element, "commenter.navigationUrl")
                    .and_then(|url| PUBLIC_ID_RE.captures(url))
                    .map(|c| c[1].to_string()),
                name: json::string_at(element, "commenter.title.text"),
                emails: text.as_deref().map(extract_emails).unwrap_or_default(),
                text,
                num_likes: json::u64_at(element, "socialDetail.totalSocialActivityCounts.numLikes"),
                created_at: json::path(element, "createdAt")
                    .and_then(Value::as_i64)
                    .and_then(DateTime::from_timestamp_millis),
            }
        })
        .collect();

    CommentPage {
        comments,
        raw_count: elements.len(),
    }
}
