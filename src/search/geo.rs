use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::client::Transport;
use crate::error::{Result, ScrapeError};
use crate::fetchers::VOYAGER_API;
use crate::json;

static GEO_URN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"urn:li:geo:(.+)").expect("valid regex"));

pub fn geo_typeahead_url(location: &str) -> String {
    format!(
        "{}/graphql?queryId=voyagerSearchDashReusableTypeahead.57a4fa1dd92d3266ed968fdbab2d7bf5&queryName=SearchReusableTypeaheadByType&variables=(query:(showFullLastNameForConnections:false,typeaheadFilterQuery:(geoSearchTypes:List(MARKET_AREA,COUNTRY_REGION,ADMIN_DIVISION_1,CITY))),keywords:{},type:GEO,start:0)",
        VOYAGER_API,
        urlencoding::encode(location)
    )
}

/// Resolve a free-text location to a geo id via the typeahead endpoint.
/// The first suggestion wins.
pub async fn resolve_geo(transport: &dyn Transport, location: &str) -> Result<String> {
    let response = transport.get(&geo_typeahead_url(location), &[]).await?;
    debug!("Geo typeahead {} -> {}", location, response.status);
    if response.is_rate_limited() {
        return Err(ScrapeError::RateLimited);
    }
    if !response.is_success() {
        return Err(ScrapeError::GeoNotFound(location.to_string()));
    }

    let body = response
        .json()
        .map_err(|_| ScrapeError::GeoNotFound(location.to_string()))?;
    let geo_id = json::str_at(
        &body,
        "data.searchDashReusableTypeaheadByType.elements.0.trackingUrn",
    )
    .and_then(|urn| GEO_URN_RE.captures(urn))
    .map(|c| c[1].to_string())
    .ok_or_else(|| ScrapeError::GeoNotFound(location.to_string()))?;

    info!("Found location '{}' as geo id {}", location, geo_id);
    Ok(geo_id)
}
