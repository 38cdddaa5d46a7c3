use async_trait::async_trait;
use serde_json::Value;

use super::{
    get_json, paged_entities, require, section_url, Fragment, ResourceFetcher, LANGUAGES_QUERY_ID,
    SECTION_ELEMENTS,
};
use crate::client::Transport;
use crate::error::FetchError;
use crate::json;
use crate::models::Staff;

pub struct LanguagesFetcher;

#[async_trait]
impl ResourceFetcher for LanguagesFetcher {
    fn name(&self) -> &'static str {
        "languages"
    }

    async fn fetch(&self, transport: &dyn Transport, staff: &Staff) -> Result<Fragment, FetchError> {
        let url = section_url(LANGUAGES_QUERY_ID, "languages", &staff.id);
        let body = get_json(transport, &url, self.name()).await?;
        if !json::array_at(&body, "errors").is_empty() {
            return Err(FetchError::Unavailable("graphql errors".to_string()));
        }
        let section = require(&body, &format!("{}.0", SECTION_ELEMENTS))?;
        Ok(Fragment::Languages(parse_languages(section)))
    }
}

pub(crate) fn parse_languages(section: &Value) -> Vec<String> {
    paged_entities(section)
        .filter_map(|entity| json::string_at(entity, "titleV2.text.text"))
        .collect()
}
