//! The logged-in account's own 1st-degree connections.

use serde_json::Value;
use tracing::debug;

use crate::client::Transport;
use crate::error::{Result, ScrapeError};
use crate::fetchers::VOYAGER_API;
use crate::json;
use crate::models::{ConnectionState, Staff};

pub const CONNECTIONS_PAGE_SIZE: usize = 40;

/// Search term recorded on every row from the connections list.
pub const CONNECTIONS_TERM: &str = "connection";

pub fn connections_url(offset: usize) -> String {
    format!(
        "{}/relationships/dash/connections?decorationId=com.linkedin.voyager.dash.deco.web.mynetwork.ConnectionListWithProfile-16&count={}&q=search&sortType=RECENTLY_ADDED&start={}",
        VOYAGER_API, CONNECTIONS_PAGE_SIZE, offset
    )
}

pub async fn fetch_connections_page(transport: &dyn Transport, offset: usize) -> Result<Vec<Staff>> {
    let response = transport.get(&connections_url(offset), &[]).await?;
    debug!("Connections page offset {} -> {}", offset, response.status);
    match response.status {
        400 => Err(ScrapeError::BadCookies),
        429 => Err(ScrapeError::RateLimited),
        _ if !response.is_success() => Err(ScrapeError::UnexpectedResponse(format!(
            "connections page at offset {}: HTTP {}",
            offset, response.status
        ))),
        _ => Ok(parse_connections(&response.json()?)),
    }
}

pub(crate) fn parse_connections(body: &Value) -> Vec<Staff> {
    json::array_at(body, "elements")
        .iter()
        .filter_map(|element| {
            let member = json::path(element, "connectedMemberResolutionResult")?;
            let id = json::str_at(member, "entityUrn")?
                .strip_prefix("urn:li:fsd_profile:")?
                .to_string();

            let first = json::string_at(member, "firstName");
            let last = json::string_at(member, "lastName");
            let name = [first.as_deref(), last.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");

            let mut staff = Staff::new(id, name, CONNECTIONS_TERM);
            staff.first_name = first;
            staff.last_name = last;
            staff.headline = json::string_at(member, "headline");
            staff.profile_id = json::string_at(member, "publicIdentifier");
            staff.profile_link = staff
                .profile_id
                .as_ref()
                .map(|p| format!("https://www.linkedin.com/in/{}", p));
            staff.connection_state = ConnectionState::Connected;
            Some(staff)
        })
        .collect()
}
