//! Sample team data.
//!
//! Creates three departments and three members, skipping any that already
//! exist by name, so running it twice changes nothing.

use serde::Serialize;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{NewDepartment, NewTeamMember, TeamMember};

/// Outcome of a seeding run.
#[derive(Debug, Default, Serialize, PartialEq)]
pub struct SeedReport {
    pub departments_created: usize,
    pub members_created: usize,
    #[serde(skip)]
    pub created: Vec<TeamMember>,
}

struct SampleMember {
    name: &'static str,
    job_title: &'static str,
    department: &'static str,
    email: &'static str,
    short_bio: &'static str,
    years_experience: u32,
    specialties: &'static str,
    is_featured: bool,
}

const DEPARTMENTS: [(&str, &str); 3] = [
    ("Engineering", "Our technical team building amazing products"),
    ("Marketing", "Spreading the word about our awesome work"),
    ("Design", "Creating beautiful user experiences"),
];

const MEMBERS: [SampleMember; 3] = [
    SampleMember {
        name: "John Smith",
        job_title: "Senior Software Engineer",
        department: "Engineering",
        email: "john@example.com",
        short_bio: "Full-stack developer with 8 years of experience in Python and JavaScript.",
        years_experience: 8,
        specialties: "Python, Django, React, PostgreSQL",
        is_featured: true,
    },
    SampleMember {
        name: "Sarah Johnson",
        job_title: "Marketing Manager",
        department: "Marketing",
        email: "sarah@example.com",
        short_bio: "Digital marketing expert specializing in content strategy and SEO.",
        years_experience: 6,
        specialties: "SEO, Content Marketing, Social Media",
        is_featured: true,
    },
    SampleMember {
        name: "Mike Chen",
        job_title: "UX Designer",
        department: "Design",
        email: "mike@example.com",
        short_bio: "User experience designer passionate about creating intuitive interfaces.",
        years_experience: 5,
        specialties: "UI/UX Design, Figma, User Research",
        is_featured: false,
    },
];

/// Get-or-create the sample departments and members.
pub async fn seed_sample_team(repo: &Repository) -> Result<SeedReport, AppError> {
    let mut report = SeedReport::default();

    for (name, description) in DEPARTMENTS {
        if repo.find_department_by_name(name).await?.is_none() {
            repo.create_department(&NewDepartment {
                name: name.to_string(),
                description: description.to_string(),
            })
            .await?;
            report.departments_created += 1;
            tracing::info!("Created department: {}", name);
        }
    }

    for sample in &MEMBERS {
        if repo.find_team_member_by_name(sample.name).await?.is_some() {
            continue;
        }
        let department = repo.find_department_by_name(sample.department).await?;

        let mut request = NewTeamMember::new(sample.name, sample.job_title);
        request.department_id = department.map(|d| d.id);
        request.email = sample.email.to_string();
        request.short_bio = sample.short_bio.to_string();
        request.years_experience = Some(sample.years_experience);
        request.specialties = sample.specialties.to_string();
        request.is_featured = sample.is_featured;

        let member = repo.create_team_member(&request).await?;
        tracing::info!("Created team member: {}", member.name);
        report.members_created += 1;
        report.created.push(member);
    }

    tracing::info!(
        "Sample team seeded: {} departments and {} members created",
        report.departments_created,
        report.members_created
    );
    Ok(report)
}
