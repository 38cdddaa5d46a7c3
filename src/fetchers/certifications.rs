use async_trait::async_trait;
use serde_json::Value;

use super::{
    get_json, paged_entities, require, section_url, Fragment, ResourceFetcher, SECTION_ELEMENTS,
    SECTION_QUERY_ID,
};
use crate::client::Transport;
use crate::error::FetchError;
use crate::json;
use crate::models::{Certification, Staff};

pub struct CertificationsFetcher;

#[async_trait]
impl ResourceFetcher for CertificationsFetcher {
    fn name(&self) -> &'static str {
        "certifications"
    }

    async fn fetch(&self, transport: &dyn Transport, staff: &Staff) -> Result<Fragment, FetchError> {
        let url = section_url(SECTION_QUERY_ID, "certifications", &staff.id);
        let body = get_json(transport, &url, self.name()).await?;
        let elements = require(&body, SECTION_ELEMENTS)?;
        let certs = match json::path(elements, "0") {
            Some(section) => parse_certifications(section),
            None => Vec::new(),
        };
        Ok(Fragment::Certifications(certs))
    }
}

pub(crate) fn parse_certifications(section: &Value) -> Vec<Certification> {
    paged_entities(section)
        .map(|entity| Certification {
            title: json::string_at(entity, "titleV2.text.text"),
            issuer: json::string_at(entity, "subtitle.text"),
            date_issued: json::str_at(entity, "caption.text").map(|t| t.replace("Issued ", "")),
            cert_id: json::str_at(entity, "metadata.text").map(|t| t.replace("Credential ID ", "")),
            cert_link: json::string_at(
                entity,
                "subComponents.components.0.components.actionComponent.action.navigationAction.actionTarget",
            ),
        })
        .collect()
}
