//! Identity discovery: company and geo resolution, paged people search,
//! the account's connections and public-handle lookups.

mod company;
mod connections;
mod geo;
mod people;

pub use company::{company_search_url, company_url, resolve_company, search_company};
pub use connections::{
    connections_url, fetch_connections_page, CONNECTIONS_PAGE_SIZE, CONNECTIONS_TERM,
};
pub use geo::{geo_typeahead_url, resolve_geo};
pub use people::{fetch_people_page, PeoplePage, PeopleQuery, PAGE_SIZE};

use tracing::{debug, info, warn};

use crate::client::Transport;
use crate::error::{Result, ScrapeError};
use crate::fetchers::{parse_profile, profile_url, ProfilePatch};
use crate::json;
use crate::models::Staff;

/// The platform never returns more than this many results for one query.
pub const RESULT_CEILING: usize = 1000;

/// Identities to request for one query: min(staff count, max, 1000).
pub fn result_ceiling(staff_count: Option<u64>, max_results: usize) -> usize {
    let staff = staff_count
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
        .unwrap_or(usize::MAX);
    staff.min(max_results).min(RESULT_CEILING)
}

/// Items collected before a run ended, plus the error that ended it early.
#[derive(Debug, Default)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub error: Option<ScrapeError>,
}

impl<T> Paged<T> {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Walk people-search pages sequentially until `ceiling` is reached or a
/// page comes back with fewer raw items than requested. Pages already collected survive a failure.
pub async fn page_people(transport: &dyn Transport, query: &PeopleQuery, ceiling: usize) -> Paged<Staff> {
    let mut paged = Paged {
        items: Vec::new(),
        error: None,
    };
    let count = PAGE_SIZE.min(ceiling);

    let mut offset = 0;
    while offset < ceiling {
        debug!("Fetching people page at offset {}", offset);
        let page = match fetch_people_page(transport, query, offset, count).await {
            Ok(page) => page,
            Err(e) => {
                warn!("People search stopped at offset {}: {}", offset, e);
                paged.error = Some(e);
                break;
            }
        };

        let returned = page.raw_count;
        info!(
            "Found {} profiles at offset {} ({} total)",
            page.staff.len(),
            offset,
            paged.items.len() + page.staff.len()
        );
        paged.items.extend(page.staff);
        // Null entities still count toward the page; only a short raw page is last.
        if returned == 0 || returned < count {
            break;
        }
        offset += PAGE_SIZE;
    }

    paged.items.truncate(ceiling);
    paged
}

/// Walk the account's connection list, 40 at a time, up to `max`.
pub async fn page_connections(transport: &dyn Transport, max: usize) -> Paged<Staff> {
    let mut paged = Paged {
        items: Vec::new(),
        error: None,
    };

    let mut offset = 0;
    while paged.items.len() < max {
        match fetch_connections_page(transport, offset).await {
            Ok(page) if page.is_empty() => break,
            Ok(page) => {
                info!("Found {} connections at offset {}", page.len(), offset);
                paged.items.extend(page);
            }
            Err(e) => {
                warn!("Connections listing stopped at offset {}: {}", offset, e);
                paged.error = Some(e);
                break;
            }
        }
        offset += CONNECTIONS_PAGE_SIZE;
    }

    paged.items.truncate(max);
    paged
}

/// Resolve a public profile handle to its top card, which carries the
/// opaque id and member urn. `None` when the handle does not exist.
pub async fn lookup_public_id(transport: &dyn Transport, public_id: &str) -> Result<Option<ProfilePatch>> {
    let response = transport.get(&profile_url(public_id), &[]).await?;
    debug!("Looked up {} -> {}", public_id, response.status);
    if response.is_rate_limited() {
        return Err(ScrapeError::RateLimited);
    }
    if !response.is_success() {
        warn!("Failed to look up user {}: HTTP {}", public_id, response.status);
        return Ok(None);
    }

    let body = response.json()?;
    Ok(json::path(&body, "elements.0")
        .map(parse_profile)
        .filter(|patch| patch.id.is_some()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FakeTransport;
    use crate::client::ApiResponse;
    use serde_json::{json, Value};

    fn people_page(n: usize, start: usize) -> Value {
        let items: Vec<Value> = (0..n)
            .map(|i| {
                json!({"item": {"entityResult": {
                    "entityUrn": format!("urn:li:fsd_entityResultViewModel:(urn:li:fsd_profile:ID{},SEARCH_SRP,DEFAULT)", start + i),
                    "title": {"text": format!("Person {}", start + i)}
                }}})
            })
            .collect();
        json!({"data": {"searchDashClustersByAll": {"elements": [{"items": items}]}}})
    }

    fn offset_of(url: &str) -> usize {
        let rest = url.split("(start:").nth(1).unwrap();
        rest.split(',').next().unwrap().parse().unwrap()
    }

    fn query() -> PeopleQuery {
        PeopleQuery {
            company_id: "1234".into(),
            search_term: "acme".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_result_ceiling() {
        assert_eq!(result_ceiling(Some(1500), 1000), 1000);
        assert_eq!(result_ceiling(Some(1500), 5000), 1000);
        assert_eq!(result_ceiling(Some(120), 1000), 120);
        assert_eq!(result_ceiling(None, 300), 300);
    }

    #[tokio::test]
    async fn test_large_company_requests_twenty_pages() {
        let fake = FakeTransport::new().respond_with("voyagerSearchDashClusters.66adc", |req| {
            let start = offset_of(&req.url);
            ApiResponse::new(200, people_page(50, start).to_string())
        });

        let ceiling = result_ceiling(Some(1500), 1000);
        let paged = page_people(&fake, &query(), ceiling).await;

        let offsets: Vec<usize> = fake.requests().iter().map(|r| offset_of(&r.url)).collect();
        assert_eq!(offsets, (0..1000).step_by(50).collect::<Vec<_>>());
        assert_eq!(paged.items.len(), 1000);
        assert!(paged.is_complete());
    }

    #[tokio::test]
    async fn test_short_page_is_last() {
        let fake = FakeTransport::new().respond_with("voyagerSearchDashClusters.66adc", |req| {
            let start = offset_of(&req.url);
            let n = if start == 100 { 7 } else { 50 };
            ApiResponse::new(200, people_page(n, start).to_string())
        });

        let paged = page_people(&fake, &query(), 1000).await;
        assert_eq!(fake.requests().len(), 3);
        assert_eq!(paged.items.len(), 107);
    }

    #[tokio::test]
    async fn test_null_entity_does_not_end_paging() {
        let fake = FakeTransport::new().respond_with("voyagerSearchDashClusters.66adc", |req| {
            let start = offset_of(&req.url);
            let mut page = people_page(49, start);
            page["data"]["searchDashClustersByAll"]["elements"][0]["items"]
                .as_array_mut()
                .unwrap()
                .push(json!({"item": {"entityResult": null}}));
            ApiResponse::new(200, page.to_string())
        });

        let paged = page_people(&fake, &query(), 1000).await;
        assert_eq!(fake.requests().len(), 20);
        assert_eq!(paged.items.len(), 980);
        assert!(paged.is_complete());
    }

    #[tokio::test]
    async fn test_small_max_shrinks_page_size() {
        let fake = FakeTransport::new().respond_with("voyagerSearchDashClusters.66adc", |req| {
            ApiResponse::new(200, people_page(10, offset_of(&req.url)).to_string())
        });

        let paged = page_people(&fake, &query(), 10).await;
        assert_eq!(fake.requests().len(), 1);
        assert!(fake.requests()[0].url.contains("count:10)"));
        assert_eq!(paged.items.len(), 10);
    }

    #[tokio::test]
    async fn test_rate_limit_keeps_collected_pages() {
        let fake = FakeTransport::new().respond_seq(
            "voyagerSearchDashClusters.66adc",
            vec![
                ApiResponse::new(200, people_page(50, 0).to_string()),
                ApiResponse::new(429, ""),
            ],
        );

        let paged = page_people(&fake, &query(), 1000).await;
        assert_eq!(paged.items.len(), 50);
        assert!(matches!(paged.error, Some(ScrapeError::RateLimited)));
    }

    #[tokio::test]
    async fn test_stale_cookies() {
        let fake = FakeTransport::new().respond("voyagerSearchDashClusters.66adc", 400, json!({}));
        let paged = page_people(&fake, &query(), 1000).await;
        assert!(matches!(paged.error, Some(ScrapeError::BadCookies)));
    }

    #[tokio::test]
    async fn test_connections_until_empty() {
        let member = |i: usize| {
            json!({"connectedMemberResolutionResult": {
                "entityUrn": format!("urn:li:fsd_profile:C{}", i),
                "firstName": "Friend",
                "lastName": i.to_string()
            }})
        };
        let full: Vec<Value> = (0..40).map(member).collect();
        let fake = FakeTransport::new().respond_seq(
            "relationships/dash/connections",
            vec![
                ApiResponse::new(200, json!({"elements": full}).to_string()),
                ApiResponse::new(200, json!({"elements": [member(40)]}).to_string()),
                ApiResponse::new(200, json!({"elements": []}).to_string()),
            ],
        );

        let paged = page_connections(&fake, 1000).await;
        assert_eq!(paged.items.len(), 41);
        assert_eq!(fake.count("start=80"), 1);
    }

    #[tokio::test]
    async fn test_lookup_public_id() {
        let fake = FakeTransport::new().respond(
            "memberIdentity=ada-lovelace",
            200,
            json!({"elements": [{
                "entityUrn": "urn:li:fsd_profile:ACoAAB",
                "objectUrn": "urn:li:member:42",
                "publicIdentifier": "ada-lovelace"
            }]}),
        );

        let patch = lookup_public_id(&fake, "ada-lovelace").await.unwrap().unwrap();
        assert_eq!(patch.id.as_deref(), Some("ACoAAB"));
        assert_eq!(patch.urn.as_deref(), Some("urn:li:member:42"));
        assert!(lookup_public_id(&fake, "nobody").await.unwrap().is_none());
    }
}
