//! People search pages scoped to one company.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::Transport;
use crate::error::{Result, ScrapeError};
use crate::fetchers::VOYAGER_API;
use crate::json;
use crate::models::Staff;

/// Results per search page; the platform caps it here.
pub const PAGE_SIZE: usize = 50;

static PROFILE_URN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"urn:li:fsd_profile:([^,]+),SEARCH_SRP").expect("valid regex")
});

/// One parsed search page. `raw_count` counts every returned item,
/// including the null entities that never become rows.
#[derive(Debug, Default)]
pub struct PeoplePage {
    pub staff: Vec<Staff>,
    pub raw_count: usize,
}

/// Filters for one people search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeopleQuery {
    pub company_id: String,
    pub keywords: Option<String>,
    pub geo_id: Option<String>,
    /// Provenance label stamped on every returned row.
    pub search_term: String,
}

impl PeopleQuery {
    pub fn url(&self, offset: usize, count: usize) -> String {
        let keywords = self
            .keywords
            .as_deref()
            .map(|k| format!("keywords:{},", urlencoding::encode(k)))
            .unwrap_or_default();
        let geo = self
            .geo_id
            .as_deref()
            .map(|g| format!("(key:geoUrn,value:List({})),", g))
            .unwrap_or_default();

        format!(
            "{}/graphql?variables=(start:{},query:(flagshipSearchIntent:SEARCH_SRP,{}queryParameters:List((key:currentCompany,value:List({})),{}(key:resultType,value:List(PEOPLE))),includeFiltersInResponse:false),count:{})&queryId=voyagerSearchDashClusters.66adc6056cf4138949ca5dcb31bb1749",
            VOYAGER_API, offset, keywords, self.company_id, geo, count
        )
    }
}

/// Fetch one page. A 400 means the session cookies are stale and a 429
/// means the account is throttled; other failures yield an empty page.
pub async fn fetch_people_page(
    transport: &dyn Transport,
    query: &PeopleQuery,
    offset: usize,
    count: usize,
) -> Result<PeoplePage> {
    let response = transport.get(&query.url(offset, count), &[]).await?;
    debug!("People page offset {} -> {}", offset, response.status);

    match response.status {
        400 => return Err(ScrapeError::BadCookies),
        429 => return Err(ScrapeError::RateLimited),
        _ if !response.is_success() => {
            warn!(
                "Unexpected status {} for people page at offset {}: {}",
                response.status,
                offset,
                response.snippet()
            );
            return Ok(PeoplePage::default());
        }
        _ => {}
    }

    match response.json() {
        Ok(body) => Ok(parse_people(&body, &query.search_term)),
        Err(e) => {
            warn!("Failed to decode people page at offset {}: {}", offset, e);
            Ok(PeoplePage::default())
        }
    }
}

pub(crate) fn parse_people(body: &Value, search_term: &str) -> PeoplePage {
    let items: Vec<&Value> = json::array_at(body, "data.searchDashClustersByAll.elements")
        .iter()
        .flat_map(|cluster| json::array_at(cluster, "items"))
        .collect();

    let staff = items
        .iter()
        .copied()
        .filter_map(|item| json::path(item, "item.entityResult"))
        .filter(|entity| entity.is_object())
        .map(|entity| person_from_entity(entity, search_term))
        .collect();

    PeoplePage {
        staff,
        raw_count: items.len(),
    }
}

fn person_from_entity(entity: &Value, search_term: &str) -> Staff {
    let entity_urn = json::str_at(entity, "entityUrn");
    let id = entity_urn
        .and_then(|urn| PROFILE_URN_RE.captures(urn))
        .map(|c| c[1].to_string());

    let mut staff = Staff::new(
        id.clone().unwrap_or_default(),
        json::str_at(entity, "title.text").unwrap_or_default().trim(),
        search_term,
    );
    staff.headline = json::str_at(entity, "primarySubtitle.text")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    if id.is_none() {
        staff.urn = entity_urn.map(str::to_string);
    }
    staff
}
