//! Company lookup records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::json;

/// One company lookup result. Produced once, never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    /// The name or id the caller searched for.
    pub search_term: String,
    /// Numeric id from the tracking urn (`urn:li:company:<id>`).
    pub id: Option<String>,
    /// Universal name used in `/company/<name>` URLs.
    pub universal_name: Option<String>,
    pub name: Option<String>,
    pub staff_count: Option<u64>,
    pub company_type: Option<String>,
    pub industries: Vec<String>,
    pub headquarters_address: Option<String>,
    pub description: Option<String>,
    /// Company website, if listed.
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
}

impl Company {
    /// Parse one element of the `organization/companies` response.
    pub fn from_element(element: &Value, search_term: &str) -> Self {
        let id = json::str_at(element, "trackingInfo.objectUrn")
            .filter(|urn| urn.starts_with("urn:li:company:"))
            .and_then(|urn| urn.rsplit(':').next())
            .map(str::to_string);

        let universal_name = json::string_at(element, "universalName").or_else(|| {
            json::str_at(element, "url").and_then(company_slug_from_url)
        });

        let industries = json::array_at(element, "companyIndustries")
            .iter()
            .filter_map(|i| json::string_at(i, "localizedName"))
            .collect();

        let headquarters_address = json::path(element, "headquarter").map(|hq| {
            let line1 = json::str_at(hq, "line1").unwrap_or_default();
            let city = json::str_at(hq, "city").unwrap_or_default();
            let country = json::str_at(hq, "country").unwrap_or_default();
            let postal = json::str_at(hq, "postalCode").unwrap_or_default();
            format!("{}, {}, {} {}", line1, city, country, postal)
                .trim()
                .to_string()
        });

        Self {
            search_term: search_term.to_string(),
            id,
            universal_name,
            name: json::string_at(element, "name"),
            staff_count: json::u64_at(element, "staffCount"),
            company_type: json::string_at(element, "type"),
            industries,
            headquarters_address,
            description: json::string_at(element, "description"),
            website: json::string_at(element, "companyPageUrl"),
            logo_url: vector_image_url(element, "logo.image.com.linkedin.common.VectorImage"),
            banner_url: vector_image_url(
                element,
                "backgroundCoverPhoto.com.linkedin.common.VectorImage",
            ),
        }
    }
}

/// Extract `<slug>` from `https://www.linkedin.com/company/<slug>/...`.
pub fn company_slug_from_url(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    let mut segments = parsed.path_segments()?;
    segments.find(|s| *s == "company")?;
    segments
        .next()
        .filter(|slug| !slug.is_empty())
        .map(str::to_string)
}

/// Join a vector image's root URL with its first artifact.
///
/// The `com.linkedin.common.VectorImage` key contains dots, so the lookup
/// splits the prefix from that final key.
fn vector_image_url(element: &Value, dotted: &str) -> Option<String> {
    const KEY: &str = "com.linkedin.common.VectorImage";
    let prefix = dotted.strip_suffix(KEY)?.trim_end_matches('.');
    let image = json::path(element, prefix)?.get(KEY)?;
    let root = json::str_at(image, "rootUrl")?;
    let segment = json::str_at(image, "artifacts.0.fileIdentifyingUrlPathSegment")?;
    Some(format!("{}{}", root, segment))
}
