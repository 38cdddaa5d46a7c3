//! Per-identity sub-resource fetchers.
//!
//! Each fetcher issues one request and translates the nested response into
//! a [`Fragment`]. Fragments are applied to the [`Staff`] record after all
//! fetchers for that identity have finished, so no record is shared
//! mutably between concurrent fetches.

mod bio;
mod certifications;
mod comments;
mod contact_info;
mod experiences;
mod languages;
mod profile;
mod schools;
mod skills;

pub use bio::BioFetcher;
pub use certifications::CertificationsFetcher;
pub use comments::{CommentPage, CommentsFetcher, COMMENTS_PAGE_SIZE};
pub use contact_info::ContactInfoFetcher;
pub use experiences::ExperiencesFetcher;
pub use languages::LanguagesFetcher;
pub use profile::{parse_profile, profile_url, ProfileFetcher, ProfilePatch};
pub use schools::SchoolsFetcher;
pub use skills::SkillsFetcher;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::client::Transport;
use crate::error::FetchError;
use crate::json;
use crate::models::{Certification, ContactInfo, Experience, School, Skill, Staff};

/// Root of the Voyager REST and GraphQL API.
pub const VOYAGER_API: &str = "https://www.linkedin.com/voyager/api";

const SECTION_QUERY_ID: &str = "voyagerIdentityDashProfileComponents.277ba7d7b9afffb04683953cede751fb";
const LANGUAGES_QUERY_ID: &str = "voyagerIdentityDashProfileComponents.9117695ef207012719e3e0681c667e14";

/// Parsed result of one fetcher, applied onto a [`Staff`] record.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Profile(Box<ProfilePatch>),
    Skills(Vec<Skill>),
    Experiences(Vec<Experience>),
    Schools(Vec<School>),
    Certifications(Vec<Certification>),
    Languages(Vec<String>),
    Bio(Option<String>),
    ContactInfo(ContactInfo),
}

impl Fragment {
    pub fn apply(self, staff: &mut Staff) {
        match self {
            Fragment::Profile(patch) => patch.apply(staff),
            Fragment::Skills(skills) => staff.skills = Some(skills),
            Fragment::Experiences(experiences) => staff.experiences = Some(experiences),
            Fragment::Schools(schools) => staff.schools = Some(schools),
            Fragment::Certifications(certs) => staff.certifications = Some(certs),
            Fragment::Languages(languages) => staff.languages = Some(languages),
            Fragment::Bio(bio) => staff.bio = bio,
            Fragment::ContactInfo(info) => staff.contact_info = Some(info),
        }
    }
}

/// One sub-resource of an identity.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Short name for log lines.
    fn name(&self) -> &'static str;

    async fn fetch(&self, transport: &dyn Transport, staff: &Staff) -> Result<Fragment, FetchError>;
}

/// Fetchers run concurrently for every enriched identity.
pub fn standard_fetchers() -> Vec<Arc<dyn ResourceFetcher>> {
    vec![
        Arc::new(ProfileFetcher),
        Arc::new(SkillsFetcher),
        Arc::new(ExperiencesFetcher),
        Arc::new(CertificationsFetcher),
        Arc::new(SchoolsFetcher),
        Arc::new(BioFetcher),
        Arc::new(LanguagesFetcher),
    ]
}

/// GET `url` and triage the response.
pub(crate) async fn get_json(
    transport: &dyn Transport,
    url: &str,
    name: &str,
) -> Result<Value, FetchError> {
    let response = transport
        .get(url, &[])
        .await
        .map_err(|e| FetchError::Unavailable(e.to_string()))?;
    debug!("{}, status code - {}", name, response.status);
    response.into_json()
}

/// Required top-level value of an otherwise successful response.
pub(crate) fn require<'a>(body: &'a Value, path: &str) -> Result<&'a Value, FetchError> {
    json::path(body, path)
        .ok_or_else(|| FetchError::Unavailable(format!("missing {}", path)))
}

/// URL of one `ProfileComponentsBySectionType` section.
fn section_url(query_id: &str, section: &str, profile_id: &str) -> String {
    format!(
        "{}/graphql?queryId={}&queryName=ProfileComponentsBySectionType&variables=(tabIndex:0,sectionType:{},profileUrn:urn%3Ali%3Afsd_profile%3A{},count:50)",
        VOYAGER_API, query_id, section, profile_id
    )
}

const SECTION_ELEMENTS: &str = "data.identityDashProfileComponentsBySectionType.elements";

/// Entity components of the paged list in a section response.
fn paged_entities(section: &Value) -> impl Iterator<Item = &Value> {
    json::array_at(section, "components.pagedListComponent.components.elements")
        .iter()
        .filter_map(|e| json::path(e, "components.entityComponent"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConnectionState;

    #[test]
    fn test_fragments_apply_to_staff() {
        let mut staff = Staff::new("id", "Ada", "acme");
        Fragment::Languages(vec!["English".into()]).apply(&mut staff);
        Fragment::Bio(Some("hello".into())).apply(&mut staff);
        Fragment::Profile(Box::new(ProfilePatch {
            profile_id: Some("ada".into()),
            connection_state: ConnectionState::Connected,
            ..Default::default()
        }))
        .apply(&mut staff);

        assert_eq!(staff.languages, Some(vec!["English".to_string()]));
        assert_eq!(staff.bio.as_deref(), Some("hello"));
        assert_eq!(staff.profile_id.as_deref(), Some("ada"));
        assert_eq!(staff.connection_state, ConnectionState::Connected);
        assert_eq!(staff.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_section_url() {
        let url = section_url(SECTION_QUERY_ID, "skills", "ACoAAB");
        assert!(url.contains("sectionType:skills"));
        assert!(url.contains("urn%3Ali%3Afsd_profile%3AACoAAB"));
    }

    #[test]
    fn test_standard_fetchers_are_distinct() {
        let names: Vec<_> = standard_fetchers().iter().map(|f| f.name()).collect();
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(names.len(), unique.len());
        assert_eq!(names.len(), 7);
    }
}
