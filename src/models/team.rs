//! Team directory models: departments, members and their social links.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::validation;
use crate::errors::AppError;

/// A department grouping team members.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDepartment {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl NewDepartment {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::required("Department name", &self.name)?;
        validation::max_len("Department name", &self.name, 100)
    }
}

/// Social network a link points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    LinkedIn,
    Twitter,
    GitHub,
    Facebook,
    Instagram,
    Website,
    Email,
}

impl SocialPlatform {
    pub const ALL: [SocialPlatform; 7] = [
        SocialPlatform::LinkedIn,
        SocialPlatform::Twitter,
        SocialPlatform::GitHub,
        SocialPlatform::Facebook,
        SocialPlatform::Instagram,
        SocialPlatform::Website,
        SocialPlatform::Email,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SocialPlatform::LinkedIn => "linkedin",
            SocialPlatform::Twitter => "twitter",
            SocialPlatform::GitHub => "github",
            SocialPlatform::Facebook => "facebook",
            SocialPlatform::Instagram => "instagram",
            SocialPlatform::Website => "website",
            SocialPlatform::Email => "email",
        }
    }

    /// Human-readable label.
    pub fn display_name(&self) -> &'static str {
        match self {
            SocialPlatform::LinkedIn => "LinkedIn",
            SocialPlatform::Twitter => "Twitter",
            SocialPlatform::GitHub => "GitHub",
            SocialPlatform::Facebook => "Facebook",
            SocialPlatform::Instagram => "Instagram",
            SocialPlatform::Website => "Personal Website",
            SocialPlatform::Email => "Email",
        }
    }
}

impl std::str::FromStr for SocialPlatform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SocialPlatform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown social platform: {}", s)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocialLink {
    pub id: i64,
    pub platform: SocialPlatform,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSocialLink {
    pub platform: SocialPlatform,
    pub url: String,
}

/// A person listed in the team directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamMember {
    pub id: i64,
    pub name: String,
    pub job_title: String,
    pub department: Option<Department>,
    pub email: String,
    pub phone: String,
    pub photo_id: Option<i64>,
    /// Rich text, stored in database form
    pub bio: String,
    pub short_bio: String,
    pub years_experience: Option<u32>,
    /// Comma-separated list as entered by editors
    pub specialties: String,
    pub is_active: bool,
    pub is_featured: bool,
    pub sort_order: i32,
    pub start_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub social_links: Vec<SocialLink>,
}

impl TeamMember {
    pub fn specialty_list(&self) -> Vec<String> {
        specialty_list(&self.specialties)
    }

    pub fn department_id(&self) -> Option<i64> {
        self.department.as_ref().map(|d| d.id)
    }
}

/// Split a stored comma-separated specialties string into trimmed entries.
pub fn specialty_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|s| s.trim().to_string()).collect()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTeamMember {
    pub name: String,
    pub job_title: String,
    #[serde(default)]
    pub department_id: Option<i64>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub photo_id: Option<i64>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub short_bio: String,
    #[serde(default)]
    pub years_experience: Option<u32>,
    #[serde(default)]
    pub specialties: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub social_links: Vec<NewSocialLink>,
}

impl NewTeamMember {
    /// A member with only the required fields set and model defaults elsewhere.
    pub fn new(name: impl Into<String>, job_title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            job_title: job_title.into(),
            department_id: None,
            email: String::new(),
            phone: String::new(),
            photo_id: None,
            bio: String::new(),
            short_bio: String::new(),
            years_experience: None,
            specialties: String::new(),
            is_active: true,
            is_featured: false,
            sort_order: 0,
            start_date: None,
            social_links: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validation::required("Name", &self.name)?;
        validation::max_len("Name", &self.name, 200)?;
        validation::required("Job title", &self.job_title)?;
        validation::max_len("Job title", &self.job_title, 200)?;
        validation::optional_email("Email", &self.email)?;
        validation::max_len("Phone", &self.phone, 20)?;
        validation::max_len("Short bio", &self.short_bio, 500)?;
        for link in &self.social_links {
            validation::url("Social link URL", &link.url)?;
        }
        Ok(())
    }
}

/// Counters returned by the stats endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamStats {
    pub total_members: i64,
    pub active_members: i64,
    pub featured_members: i64,
    pub departments: i64,
    pub departments_with_members: i64,
}

/// Display options of a team page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamPage {
    #[serde(default)]
    pub intro: String,
    #[serde(default = "default_true")]
    pub show_departments: bool,
    #[serde(default = "default_true")]
    pub show_only_active: bool,
    #[serde(default)]
    pub show_only_featured: bool,
}
