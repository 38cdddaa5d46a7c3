use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;

use super::{get_json, require, section_url, Fragment, ResourceFetcher, SECTION_ELEMENTS, SECTION_QUERY_ID};
use crate::client::Transport;
use crate::error::FetchError;
use crate::json;
use crate::models::{Skill, Staff};

const ENDORSEMENTS_SUFFIX: &str = " endorsements";

pub struct SkillsFetcher;

#[async_trait]
impl ResourceFetcher for SkillsFetcher {
    fn name(&self) -> &'static str {
        "skills"
    }

    async fn fetch(&self, transport: &dyn Transport, staff: &Staff) -> Result<Fragment, FetchError> {
        let url = section_url(SECTION_QUERY_ID, "skills", &staff.id);
        let body = get_json(transport, &url, self.name()).await?;
        let section = require(&body, &format!("{}.0", SECTION_ELEMENTS))?;
        Ok(Fragment::Skills(parse_skills(section)))
    }
}

/// Skills across every tab section, deduplicated by name.
pub(crate) fn parse_skills(section: &Value) -> Vec<Skill> {
    let mut seen = HashSet::new();
    let mut skills = Vec::new();

    for tab in json::array_at(section, "components.tabComponent.sections") {
        let entities = json::array_at(tab, "subComponent.components.pagedListComponent.components.elements")
            .iter()
            .filter_map(|e| json::path(e, "components.entityComponent"));

        for entity in entities {
            let Some(name) = json::str_at(entity, "titleV2.text.text") else {
                continue;
            };
            if !seen.insert(name.to_string()) {
                continue;
            }

            let insights: Vec<&str> = json::array_at(entity, "subComponents.components")
                .iter()
                .filter_map(|c| json::str_at(c, "components.insightComponent.text.text.text"))
                .collect();

            skills.push(Skill {
                name: name.to_string(),
                endorsements: insights.first().map_or(0, |text| endorsement_count(text)),
                passed_assessment: insights
                    .iter()
                    .any(|text| text.contains("Skill Assessment"))
                    .then_some(true),
            });
        }
    }

    skills
}

/// `"12 endorsements"` -> 12; anything else -> 0.
fn endorsement_count(text: &str) -> u32 {
    text.replace(ENDORSEMENTS_SUFFIX, "")
        .trim()
        .parse()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(name: &str, insight: Option<&str>) -> Value {
        let sub = match insight {
            Some(text) => json!({"components": [
                {"components": {"insightComponent": {"text": {"text": {"text": text}}}}}
            ]}),
            None => json!(null),
        };
        json!({"components": {"entityComponent": {
            "titleV2": {"text": {"text": name}},
            "subComponents": sub
        }}})
    }

    fn section(entities: Vec<Value>) -> Value {
        json!({"components": {"tabComponent": {"sections": [
            {"subComponent": {"components": {"pagedListComponent": {"components": {"elements": entities}}}}}
        ]}}})
    }

    #[test]
    fn test_parse_skills() {
        let skills = parse_skills(&section(vec![
            entity("Rust", Some("12 endorsements")),
            entity("Go", Some("Endorsed by 3 colleagues at Acme")),
            entity("SQL", None),
            entity("Rust", Some("99 endorsements")),
        ]));

        assert_eq!(skills.len(), 3);
        assert_eq!(skills[0].endorsements, 12);
        assert_eq!(skills[1].endorsements, 0);
        assert_eq!(skills[2].endorsements, 0);
    }

    #[test]
    fn test_missing_tab_component_is_empty() {
        assert!(parse_skills(&json!({"components": {"tabComponent": null}})).is_empty());
    }

    #[test]
    fn test_passed_assessment() {
        let skills = parse_skills(&section(vec![entity("Python", Some("Passed LinkedIn Skill Assessment"))]));
        assert_eq!(skills[0].passed_assessment, Some(true));
        assert_eq!(skills[0].endorsements, 0);
    }
}
