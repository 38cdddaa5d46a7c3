use async_trait::async_trait;
use serde_json::Value;

use super::{
    get_json, paged_entities, require, section_url, Fragment, ResourceFetcher, SECTION_ELEMENTS,
    SECTION_QUERY_ID,
};
use crate::client::Transport;
use crate::dates::{parse_duration, MIDDLE_DOT};
use crate::error::FetchError;
use crate::json;
use crate::models::{Experience, Staff};

const NESTED_ROLES: &str = "subComponents.components.0.components.pagedListComponent";

pub struct ExperiencesFetcher;

#[async_trait]
impl ResourceFetcher for ExperiencesFetcher {
    fn name(&self) -> &'static str {
        "experiences"
    }

    async fn fetch(&self, transport: &dyn Transport, staff: &Staff) -> Result<Fragment, FetchError> {
        let url = section_url(SECTION_QUERY_ID, "experience", &staff.id);
        let body = get_json(transport, &url, self.name()).await?;
        let section = require(&body, &format!("{}.0", SECTION_ELEMENTS))?;
        require(section, "components.pagedListComponent.components.elements")?;
        Ok(Fragment::Experiences(parse_experiences(section)))
    }
}

pub(crate) fn parse_experiences(section: &Value) -> Vec<Experience> {
    let mut experiences = Vec::new();
    for entity in paged_entities(section) {
        if json::path(entity, NESTED_ROLES).is_some() {
            experiences.extend(parse_grouped(entity));
        } else {
            experiences.push(parse_single(entity));
        }
    }
    experiences
}

/// One role: `subtitle` is `"Company · Full-time"`.
fn parse_single(entity: &Value) -> Experience {
    let mut company = json::string_at(entity, "subtitle.text");
    let mut emp_type = None;
    if let Some(subtitle) = company.clone() {
        let parts: Vec<&str> = subtitle.split(MIDDLE_DOT).collect();
        if let [name, .., kind] = parts.as_slice() {
            company = Some(name.trim().to_string());
            emp_type = Some(kind.trim().to_lowercase());
        }
    }

    with_dates(
        entity,
        Experience {
            title: json::string_at(entity, "titleV2.text.text"),
            company,
            emp_type,
            location: json::string_at(entity, "metadata.text"),
            ..Default::default()
        },
    )
}

/// Several roles at one employer: the employer is the outer title and each
/// nested entity's `subtitle` is the employment type.
fn parse_grouped(entity: &Value) -> Vec<Experience> {
    let company = json::string_at(entity, "titleV2.text.text");
    let Some(nested) = json::path(entity, NESTED_ROLES) else {
        return Vec::new();
    };

    json::array_at(nested, "components.elements")
        .iter()
        .filter_map(|e| json::path(e, "components.entityComponent"))
        .map(|role| {
            with_dates(
                role,
                Experience {
                    title: json::string_at(role, "titleV2.text.text"),
                    company: company.clone(),
                    emp_type: json::str_at(role, "subtitle.text").map(str::to_lowercase),
                    location: json::string_at(role, "metadata.text"),
                    ..Default::default()
                },
            )
        })
        .collect()
}

/// Fill dates from the caption. With a parsed range the duration is the
/// annotation after the middle dot, otherwise the raw caption.
fn with_dates(entity: &Value, mut experience: Experience) -> Experience {
    if let Some(caption) = json::str_at(entity, "caption.text") {
        let parsed = parse_duration(caption);
        experience.start_date = parsed.range.start;
        experience.end_date = parsed.range.end;
        experience.duration = if parsed.range.start.is_some() {
            parsed.annotation
        } else {
            Some(caption.to_string())
        };
    }
    experience
}
