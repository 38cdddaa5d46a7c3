use async_trait::async_trait;
use serde_json::Value;

use super::{get_json, require, Fragment, ResourceFetcher, VOYAGER_API};
use crate::client::Transport;
use crate::error::FetchError;
use crate::json;
use crate::models::Staff;

pub struct BioFetcher;

#[async_trait]
impl ResourceFetcher for BioFetcher {
    fn name(&self) -> &'static str {
        "bio"
    }

    async fn fetch(&self, transport: &dyn Transport, staff: &Staff) -> Result<Fragment, FetchError> {
        let url = format!(
            "{}/graphql?queryId=voyagerIdentityDashProfileCards.313097d3cf3cea5e20daffd8b5b635f2&queryName=ProfileTabInitialCards&variables=(count:50,profileUrn:urn%3Ali%3Afsd_profile%3A{})",
            VOYAGER_API, staff.id
        );
        let body = get_json(transport, &url, self.name()).await?;
        let cards = require(&body, "data.identityDashProfileCardsByInitialCards.elements")?;
        Ok(Fragment::Bio(parse_bio(cards)))
    }
}

/// Text of the ABOUT card, if the profile has one.
pub(crate) fn parse_bio(cards: &Value) -> Option<String> {
    cards
        .as_array()?
        .iter()
        .find(|card| json::str_at(card, "entityUrn").is_some_and(|urn| urn.contains(",ABOUT,")))
        .and_then(|card| json::string_at(card, "topComponents.1.components.textComponent.text.text"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_about_card() {
        let cards = json!([
            {"entityUrn": "urn:li:fsd_profileCard:(ACoAAB,EXPERIENCE,en_US)"},
            {"entityUrn": "urn:li:fsd_profileCard:(ACoAAB,ABOUT,en_US)", "topComponents": [
                {"components": {"headerComponent": {}}},
                {"components": {"textComponent": {"text": {"text": "Building things. ada@example.com"}}}}
            ]}
        ]);
        assert_eq!(parse_bio(&cards).as_deref(), Some("Building things. ada@example.com"));
    }

    #[test]
    fn test_no_about_card() {
        assert_eq!(parse_bio(&json!([{"entityUrn": "x,EDUCATION,y"}])), None);
    }
}
