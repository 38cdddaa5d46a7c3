//! Data models for staffscout.

mod comment;
mod company;
mod staff;

pub use comment::Comment;
pub use company::{company_slug_from_url, Company};
pub use staff::{
    Certification, ConnectionState, ContactInfo, Experience, School, Skill, Staff,
    HIDDEN_PROFILE_NAME,
};
