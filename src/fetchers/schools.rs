use async_trait::async_trait;
use serde_json::Value;

use super::{
    get_json, paged_entities, require, section_url, Fragment, ResourceFetcher, SECTION_ELEMENTS,
    SECTION_QUERY_ID,
};
use crate::client::Transport;
use crate::dates::DateRange;
use crate::error::FetchError;
use crate::json;
use crate::models::{School, Staff};

pub struct SchoolsFetcher;

#[async_trait]
impl ResourceFetcher for SchoolsFetcher {
    fn name(&self) -> &'static str {
        "schools"
    }

    async fn fetch(&self, transport: &dyn Transport, staff: &Staff) -> Result<Fragment, FetchError> {
        let url = section_url(SECTION_QUERY_ID, "education", &staff.id);
        let body = get_json(transport, &url, self.name()).await?;
        let section = require(&body, &format!("{}.0", SECTION_ELEMENTS))?;
        require(section, "components.pagedListComponent.components.elements")?;
        Ok(Fragment::Schools(parse_schools(section)))
    }
}

pub(crate) fn parse_schools(section: &Value) -> Vec<School> {
    paged_entities(section)
        .map(|entity| {
            let range = json::str_at(entity, "caption.text")
                .map(DateRange::parse)
                .unwrap_or_default();
            School {
                start_date: range.start,
                end_date: range.end,
                school: json::string_at(entity, "titleV2.text.text"),
                degree: json::string_at(entity, "subtitle.text"),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_parse_schools() {
        let section = json!({"components": {"pagedListComponent": {"components": {"elements": [
            {"components": {"entityComponent": {
                "titleV2": {"text": {"text": "University of London"}},
                "subtitle": {"text": "BSc, Mathematics"},
                "caption": {"text": "2010 - 2013"}
            }}},
            {"components": {"entityComponent": {
                "titleV2": {"text": {"text": "Night School"}},
                "caption": null
            }}}
        ]}}}});

        let schools = parse_schools(&section);
        assert_eq!(schools.len(), 2);
        assert_eq!(schools[0].start_date, NaiveDate::from_ymd_opt(2010, 1, 1));
        assert_eq!(schools[0].end_date, NaiveDate::from_ymd_opt(2013, 1, 1));
        assert_eq!(schools[0].degree.as_deref(), Some("BSc, Mathematics"));
        assert_eq!(schools[1].start_date, None);
        assert_eq!(schools[1].degree, None);
    }
}
