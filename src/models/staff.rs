//! Staff (identity) records and the value records attached to them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Display name the platform substitutes for restricted profiles.
pub const HIDDEN_PROFILE_NAME: &str = "LinkedIn Member";

/// Relationship between the logged-in account and an identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Not yet known (profile not fetched).
    #[default]
    Unknown,
    /// 1st-degree connection.
    Connected,
    /// Invitation sent, not yet accepted.
    Pending,
    NotConnected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "",
            Self::Connected => "yes",
            Self::Pending => "pending",
            Self::NotConnected => "no",
        }
    }

    /// Whether a connection request would be redundant.
    pub fn is_connected_or_pending(&self) -> bool {
        matches!(self, Self::Connected | Self::Pending)
    }
}

/// One discovered person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    /// Opaque platform id (`fsd_profile` id). Empty until resolved for manual lookups.
    pub id: String,
    /// Relationship urn, used as the key when the id is redacted.
    pub urn: Option<String>,
    /// Facet provenance, e.g. `"openai - engineer - London"`.
    pub search_term: String,
    pub name: Option<String>,
    pub headline: Option<String>,

    pub profile_id: Option<String>,
    pub profile_link: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub followers: Option<u64>,
    pub connections: Option<u64>,
    pub mutual_connections: Option<u64>,
    pub connection_state: ConnectionState,
    pub location: Option<String>,
    pub company: Option<String>,
    pub school: Option<String>,
    pub influencer: Option<bool>,
    pub creator: Option<bool>,
    pub premium: Option<bool>,
    pub open_to_work: Option<bool>,
    pub is_hiring: Option<bool>,
    pub profile_photo: Option<String>,
    pub banner_photo: Option<String>,

    pub skills: Option<Vec<Skill>>,
    pub experiences: Option<Vec<Experience>>,
    pub certifications: Option<Vec<Certification>>,
    pub schools: Option<Vec<School>>,
    pub languages: Option<Vec<String>>,
    /// Only populated for 1st-degree connections.
    pub contact_info: Option<ContactInfo>,
}

impl Staff {
    /// Create a record from a search hit.
    pub fn new(id: impl Into<String>, name: impl Into<String>, search_term: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            search_term: search_term.into(),
            ..Default::default()
        }
    }

    /// Create an unresolved record for a public profile handle.
    pub fn from_public_id(public_id: &str, search_term: &str) -> Self {
        Self {
            search_term: search_term.to_string(),
            profile_id: Some(public_id.to_string()),
            profile_link: Some(format!("https://www.linkedin.com/in/{}", public_id)),
            ..Default::default()
        }
    }

    /// Whether the platform redacted this identity.
    pub fn is_hidden(&self) -> bool {
        self.name.as_deref() == Some(HIDDEN_PROFILE_NAME)
    }

    /// Uniqueness key: the opaque id, or the urn when the id is redacted.
    pub fn key(&self) -> Option<&str> {
        if !self.id.is_empty() {
            Some(&self.id)
        } else {
            self.urn.as_deref()
        }
    }

    /// Profile urn used by the sub-resource endpoints.
    pub fn profile_urn(&self) -> String {
        format!("urn:li:fsd_profile:{}", self.id)
    }

    /// Title of the first open-ended experience, if any.
    pub fn current_position(&self) -> Option<&str> {
        self.experiences
            .as_deref()?
            .iter()
            .find(|e| e.start_date.is_some() && e.end_date.is_none())
            .and_then(|e| e.title.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    /// Annotation after the date range, e.g. `"2 yrs 3 mos"`.
    pub duration: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    /// Employment type, lowercased (`"full-time"`, `"contract"`).
    pub emp_type: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub school: Option<String>,
    pub degree: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub endorsements: u32,
    pub passed_assessment: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    pub title: Option<String>,
    pub issuer: Option<String>,
    pub date_issued: Option<String>,
    pub cert_id: Option<String>,
    pub cert_link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email_address: Option<String>,
    pub websites: Vec<String>,
    pub phone_numbers: Vec<String>,
    pub address: Option<String>,
    /// `"Month Day"`, year is never exposed.
    pub birthday: Option<String>,
    /// When the connection was made, `YYYY-MM-DD HH:MM:SS UTC`.
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_profile() {
        let hidden = Staff::new("abc", HIDDEN_PROFILE_NAME, "acme");
        assert!(hidden.is_hidden());
        assert!(!Staff::new("abc", "Ada Lovelace", "acme").is_hidden());
    }

    #[test]
    fn test_key_falls_back_to_urn() {
        let mut staff = Staff::new("", HIDDEN_PROFILE_NAME, "acme");
        assert_eq!(staff.key(), None);
        staff.urn = Some("urn:li:member:42".into());
        assert_eq!(staff.key(), Some("urn:li:member:42"));
        staff.id = "ACoAAB".into();
        assert_eq!(staff.key(), Some("ACoAAB"));
    }

    #[test]
    fn test_current_position() {
        let mut staff = Staff::new("id", "Ada", "acme");
        staff.experiences = Some(vec![
            Experience {
                title: Some("Engineer".into()),
                start_date: NaiveDate::from_ymd_opt(2020, 1, 1),
                ..Default::default()
            },
            Experience {
                title: Some("Intern".into()),
                start_date: NaiveDate::from_ymd_opt(2018, 1, 1),
                end_date: NaiveDate::from_ymd_opt(2019, 1, 1),
                ..Default::default()
            },
        ]);
        assert_eq!(staff.current_position(), Some("Engineer"));
    }

    #[test]
    fn test_connection_state_strings() {
        assert_eq!(ConnectionState::Connected.as_str(), "yes");
        assert_eq!(ConnectionState::Pending.as_str(), "pending");
        assert_eq!(ConnectionState::NotConnected.as_str(), "no");
        assert!(ConnectionState::Pending.is_connected_or_pending());
        assert!(!ConnectionState::Unknown.is_connected_or_pending());
    }
}
