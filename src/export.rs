//! Flat export rows and CSV / JSON writers.
//!
//! Nested lists (experiences, schools, skills, certifications, languages)
//! are JSON-encoded into single columns so every record is one row.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::models::{Comment, Company, Staff};
use crate::utils::extract_emails;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    /// Guess from a file extension, defaulting to CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Csv,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}', expected csv or json", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        })
    }
}

/// One staff record flattened for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaffRow {
    pub search_term: String,
    pub id: String,
    pub urn: Option<String>,
    pub profile_link: Option<String>,
    pub profile_id: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub location: Option<String>,
    pub headline: Option<String>,
    pub followers: Option<u64>,
    pub connections: Option<u64>,
    pub mutuals: Option<u64>,
    pub is_connection: &'static str,
    pub premium: Option<bool>,
    pub creator: Option<bool>,
    pub influencer: Option<bool>,
    pub open_to_work: Option<bool>,
    pub is_hiring: Option<bool>,
    pub current_position: Option<String>,
    pub company: Option<String>,
    pub school: Option<String>,
    pub bio: Option<String>,
    pub experiences: Option<String>,
    pub schools: Option<String>,
    pub skills: Option<String>,
    pub certifications: Option<String>,
    pub languages: Option<String>,
    pub emails_in_bio: Option<String>,
    pub profile_photo: Option<String>,
    pub banner_photo: Option<String>,
    pub connection_created_at: Option<String>,
    pub connection_email: Option<String>,
    pub connection_phone_numbers: Option<String>,
    pub connection_websites: Option<String>,
    pub connection_street_address: Option<String>,
    pub connection_birthday: Option<String>,
}

impl From<&Staff> for StaffRow {
    fn from(staff: &Staff) -> Self {
        let contact = staff.contact_info.as_ref();
        let emails_in_bio = staff
            .bio
            .as_deref()
            .map(extract_emails)
            .filter(|emails| !emails.is_empty())
            .map(|emails| emails.join(", "));

        Self {
            search_term: staff.search_term.clone(),
            id: staff.id.clone(),
            urn: staff.urn.clone(),
            profile_link: staff.profile_link.clone(),
            profile_id: staff.profile_id.clone(),
            name: staff.name.clone(),
            first_name: staff.first_name.clone(),
            last_name: staff.last_name.clone(),
            location: staff.location.clone(),
            headline: staff.headline.clone(),
            followers: staff.followers,
            connections: staff.connections,
            mutuals: staff.mutual_connections,
            is_connection: staff.connection_state.as_str(),
            premium: staff.premium,
            creator: staff.creator,
            influencer: staff.influencer,
            open_to_work: staff.open_to_work,
            is_hiring: staff.is_hiring,
            current_position: staff.current_position().map(str::to_string),
            company: staff.company.clone(),
            school: staff.school.clone(),
            bio: staff.bio.clone(),
            experiences: encode_list(staff.experiences.as_deref()),
            schools: encode_list(staff.schools.as_deref()),
            skills: encode_list(staff.skills.as_deref()),
            certifications: encode_list(staff.certifications.as_deref()),
            languages: encode_list(staff.languages.as_deref()),
            emails_in_bio,
            profile_photo: staff.profile_photo.clone(),
            banner_photo: staff.banner_photo.clone(),
            connection_created_at: contact.and_then(|c| c.created_at.clone()),
            connection_email: contact.and_then(|c| c.email_address.clone()),
            connection_phone_numbers: contact.and_then(|c| encode_list(Some(c.phone_numbers.as_slice()))),
            connection_websites: contact.and_then(|c| encode_list(Some(c.websites.as_slice()))),
            connection_street_address: contact.and_then(|c| c.address.clone()),
            connection_birthday: contact.and_then(|c| c.birthday.clone()),
        }
    }
}

/// JSON-encode a list column; empty and missing lists become null.
fn encode_list<T: Serialize>(items: Option<&[T]>) -> Option<String> {
    items
        .filter(|items| !items.is_empty())
        .and_then(|items| serde_json::to_string(items).ok())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyRow {
    pub search_term: String,
    pub id: Option<String>,
    pub universal_name: Option<String>,
    pub name: Option<String>,
    pub staff_count: Option<u64>,
    pub company_type: Option<String>,
    pub industries: Option<String>,
    pub headquarters_address: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
}

impl From<&Company> for CompanyRow {
    fn from(company: &Company) -> Self {
        Self {
            search_term: company.search_term.clone(),
            id: company.id.clone(),
            universal_name: company.universal_name.clone(),
            name: company.name.clone(),
            staff_count: company.staff_count,
            company_type: company.company_type.clone(),
            industries: (!company.industries.is_empty()).then(|| company.industries.join(", ")),
            headquarters_address: company.headquarters_address.clone(),
            description: company.description.clone(),
            website: company.website.clone(),
            logo_url: company.logo_url.clone(),
            banner_url: company.banner_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRow {
    pub post_id: String,
    pub comment_id: Option<String>,
    pub internal_profile_id: Option<String>,
    pub public_profile_id: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub num_likes: Option<u64>,
    pub created_at: Option<String>,
    pub emails: Option<String>,
}

impl From<&Comment> for CommentRow {
    fn from(comment: &Comment) -> Self {
        Self {
            post_id: comment.post_id.clone(),
            comment_id: comment.comment_id.clone(),
            internal_profile_id: comment.internal_profile_id.clone(),
            public_profile_id: comment.public_profile_id.clone(),
            name: comment.name.clone(),
            text: comment.text.clone(),
            num_likes: comment.num_likes,
            created_at: comment
                .created_at
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            emails: (!comment.emails.is_empty()).then(|| comment.emails.join(", ")),
        }
    }
}

/// Staff rows with visible identities first and hidden ones last.
pub fn staff_rows(staff: &[Staff]) -> Vec<StaffRow> {
    let (visible, hidden): (Vec<&Staff>, Vec<&Staff>) = staff.iter().partition(|s| !s.is_hidden());
    info!(
        "{} total, {} hidden, {} visible",
        staff.len(),
        hidden.len(),
        visible.len()
    );
    visible.into_iter().chain(hidden).map(StaffRow::from).collect()
}

pub fn write_csv<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write, T: Serialize>(mut writer: W, rows: &[T]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, rows)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub fn write_rows<W: Write, T: Serialize>(writer: W, format: OutputFormat, rows: &[T]) -> Result<()> {
    match format {
        OutputFormat::Csv => write_csv(writer, rows),
        OutputFormat::Json => write_json(writer, rows),
    }
}

/// Write rows to `path`, creating parent directories as needed.
pub fn write_file<T: Serialize>(path: &Path, format: OutputFormat, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    write_rows(BufWriter::new(file), format, rows)?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}
