//! Profile top card.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use super::{get_json, require, Fragment, ResourceFetcher, VOYAGER_API};
use crate::client::Transport;
use crate::error::FetchError;
use crate::json;
use crate::models::{ConnectionState, Staff};

static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Profile URL for an opaque id or a public handle.
pub fn profile_url(member_identity: &str) -> String {
    format!(
        "{}/voyagerIdentityDashProfiles?count=1&decorationId=com.linkedin.voyager.dash.deco.identity.profile.TopCardComplete-138&memberIdentity={}&q=memberIdentity",
        VOYAGER_API,
        urlencoding::encode(member_identity)
    )
}

/// Fields filled from the profile top card.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePatch {
    /// Opaque id from the element's urn, used for public-handle lookups.
    pub id: Option<String>,
    pub urn: Option<String>,
    pub profile_id: Option<String>,
    pub profile_link: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub headline: Option<String>,
    pub followers: Option<u64>,
    pub connections: Option<u64>,
    pub mutual_connections: Option<u64>,
    pub connection_state: ConnectionState,
    pub location: Option<String>,
    pub company: Option<String>,
    pub school: Option<String>,
    pub influencer: Option<bool>,
    pub creator: Option<bool>,
    pub premium: Option<bool>,
    pub open_to_work: Option<bool>,
    pub is_hiring: Option<bool>,
    pub profile_photo: Option<String>,
    pub banner_photo: Option<String>,
}

impl ProfilePatch {
    pub fn apply(self, staff: &mut Staff) {
        fn set<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        if staff.id.is_empty() {
            if let Some(id) = self.id {
                staff.id = id;
            }
        }
        set(&mut staff.urn, self.urn);
        set(&mut staff.profile_id, self.profile_id);
        set(&mut staff.profile_link, self.profile_link);
        set(&mut staff.first_name, self.first_name);
        set(&mut staff.last_name, self.last_name);
        set(&mut staff.headline, self.headline);
        set(&mut staff.followers, self.followers);
        set(&mut staff.connections, self.connections);
        set(&mut staff.mutual_connections, self.mutual_connections);
        if self.connection_state != ConnectionState::Unknown {
            staff.connection_state = self.connection_state;
        }
        set(&mut staff.location, self.location);
        set(&mut staff.company, self.company);
        set(&mut staff.school, self.school);
        set(&mut staff.influencer, self.influencer);
        set(&mut staff.creator, self.creator);
        set(&mut staff.premium, self.premium);
        set(&mut staff.open_to_work, self.open_to_work);
        set(&mut staff.is_hiring, self.is_hiring);
        set(&mut staff.profile_photo, self.profile_photo);
        set(&mut staff.banner_photo, self.banner_photo);

        if staff.name.is_none() {
            let full = [staff.first_name.as_deref(), staff.last_name.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            if !full.is_empty() {
                staff.name = Some(full);
            }
        }
    }
}

/// Parse one profile element.
pub fn parse_profile(element: &Value) -> ProfilePatch {
    let profile_id = json::string_at(element, "publicIdentifier");
    let frame = json::str_at(element, "profilePicture.frameType");

    ProfilePatch {
        id: json::str_at(element, "entityUrn")
            .and_then(|urn| urn.strip_prefix("urn:li:fsd_profile:"))
            .map(str::to_string),
        urn: json::string_at(element, "objectUrn"),
        profile_link: profile_id
            .as_ref()
            .map(|id| format!("https://www.linkedin.com/in/{}", id)),
        profile_id,
        first_name: json::string_at(element, "firstName"),
        last_name: json::str_at(element, "lastName")
            .map(|last| last.split(',').next().unwrap_or(last).trim().to_string()),
        headline: json::string_at(element, "headline"),
        followers: json::u64_at(element, "followingState.followerCount"),
        connections: json::u64_at(element, "connections.paging.total"),
        mutual_connections: Some(mutual_connections(element)),
        connection_state: connection_state(element),
        location: json::string_at(element, "geoLocation.geo.defaultLocalizedName"),
        company: json::string_at(element, "profileTopPosition.elements.0.companyName"),
        school: json::string_at(element, "profileTopEducation.elements.0.schoolName")
            .or_else(|| json::string_at(element, "profileTopEducation.elements.0.school.name")),
        influencer: Some(json::bool_at(element, "influencer").unwrap_or(false)),
        creator: Some(json::bool_at(element, "creator").unwrap_or(false)),
        premium: Some(json::bool_at(element, "premium").unwrap_or(false)),
        open_to_work: frame.map(|f| f == "OPEN_TO_WORK"),
        is_hiring: frame.map(|f| f == "HIRING"),
        profile_photo: last_artifact_url(element, "profilePicture.displayImageReference.vectorImage"),
        banner_photo: last_artifact_url(element, "backgroundPicture.displayImageReference.vectorImage"),
    }
}

fn connection_state(element: &Value) -> ConnectionState {
    let Some(union) = json::path(element, "memberRelationship.memberRelationshipUnion") else {
        return ConnectionState::Unknown;
    };
    if json::path(union, "connection").is_some() {
        ConnectionState::Connected
    } else if json::path(union, "noConnection.invitationUnion.invitation").is_some() {
        ConnectionState::Pending
    } else if json::path(union, "noConnection").is_some() {
        ConnectionState::NotConnected
    } else {
        ConnectionState::Unknown
    }
}

/// "Jane and 12 other mutual connections" counts the named members too.
fn mutual_connections(element: &Value) -> u64 {
    let Some(text) = json::str_at(element, "profileInsight.elements.0.text.text") else {
        return 0;
    };
    match DIGITS_RE.find(text).and_then(|m| m.as_str().parse::<u64>().ok()) {
        Some(n) => n + 2,
        None if text.contains(" and ") => 2,
        None => 1,
    }
}

/// Highest-resolution artifact of a vector image.
fn last_artifact_url(element: &Value, path: &str) -> Option<String> {
    let image = json::path(element, path)?;
    let root = json::str_at(image, "rootUrl")?;
    let segment = json::array_at(image, "artifacts")
        .last()
        .and_then(|a| json::str_at(a, "fileIdentifyingUrlPathSegment"))?;
    Some(format!("{}{}", root, segment))
}

pub struct ProfileFetcher;

#[async_trait]
impl ResourceFetcher for ProfileFetcher {
    fn name(&self) -> &'static str {
        "profile"
    }

    async fn fetch(&self, transport: &dyn Transport, staff: &Staff) -> Result<Fragment, FetchError> {
        let body = get_json(transport, &profile_url(&staff.id), self.name()).await?;
        let element = require(&body, "elements.0")?;
        Ok(Fragment::Profile(Box::new(parse_profile(element))))
    }
}
