use async_trait::async_trait;
use chrono::{DateTime, Month};
use serde_json::Value;

use super::{get_json, require, Fragment, ResourceFetcher, VOYAGER_API};
use crate::client::Transport;
use crate::error::FetchError;
use crate::json;
use crate::models::{ContactInfo, Staff};

/// Contact details; only visible for 1st-degree connections.
pub struct ContactInfoFetcher;

#[async_trait]
impl ResourceFetcher for ContactInfoFetcher {
    fn name(&self) -> &'static str {
        "contact_info"
    }

    async fn fetch(&self, transport: &dyn Transport, staff: &Staff) -> Result<Fragment, FetchError> {
        let url = format!(
            "{}/graphql?queryId=voyagerIdentityDashProfiles.13618f886ce95bf503079f49245fbd6f&queryName=ProfilesByMemberIdentity&variables=(memberIdentity:{},count:1)",
            VOYAGER_API, staff.id
        );
        let body = get_json(transport, &url, self.name()).await?;
        let element = require(&body, "data.identityDashProfilesByMemberIdentity.elements.0")?;
        Ok(Fragment::ContactInfo(parse_contact_info(element)))
    }
}

pub(crate) fn parse_contact_info(element: &Value) -> ContactInfo {
    let birthday = json::u64_at(element, "birthDateOn.month")
        .and_then(|m| Month::try_from(u8::try_from(m).ok()?).ok())
        .zip(json::u64_at(element, "birthDateOn.day"))
        .map(|(month, day)| format!("{} {}", month.name(), day));

    let created_at = json::path(
        element,
        "memberRelationship.memberRelationshipDataResolutionResult.connection.createdAt",
    )
    .and_then(Value::as_i64)
    .and_then(DateTime::from_timestamp_millis)
    .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string());

    ContactInfo {
        email_address: json::string_at(element, "emailAddress.emailAddress"),
        websites: json::array_at(element, "websites")
            .iter()
            .filter_map(|w| json::string_at(w, "url"))
            .collect(),
        phone_numbers: json::array_at(element, "phoneNumbers")
            .iter()
            .filter_map(|p| json::string_at(p, "phoneNumber.number"))
            .collect(),
        address: json::string_at(element, "address"),
        birthday,
        created_at,
    }
}
