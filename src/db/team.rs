//! Team directory persistence: departments, members, social links, stats.

use std::collections::HashMap;

use sqlx::Row;

use super::repository::{format_date, format_datetime, now, parse_date, parse_datetime, Repository};
use crate::errors::AppError;
use crate::models::{
    Department, NewDepartment, NewTeamMember, SocialLink, SocialPlatform, TeamMember, TeamStats,
};

const MEMBER_COLUMNS: &str = "m.id, m.name, m.job_title, m.email, m.phone, m.photo_id, m.bio, \
    m.short_bio, m.years_experience, m.specialties, m.is_active, m.is_featured, m.sort_order, \
    m.start_date, m.created_at, m.updated_at, \
    d.id AS dept_id, d.name AS dept_name, d.description AS dept_description";

impl Repository {
    // ==================== DEPARTMENT OPERATIONS ====================

    /// List all departments in name order.
    pub async fn list_departments(&self) -> Result<Vec<Department>, AppError> {
        let rows = sqlx::query("SELECT id, name, description FROM departments ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(department_from_row).collect())
    }

    pub async fn get_department(&self, id: i64) -> Result<Option<Department>, AppError> {
        let row = sqlx::query("SELECT id, name, description FROM departments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(department_from_row))
    }

    pub async fn find_department_by_name(&self, name: &str) -> Result<Option<Department>, AppError> {
        let row = sqlx::query("SELECT id, name, description FROM departments WHERE name = ? ORDER BY id LIMIT 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(department_from_row))
    }

    pub async fn create_department(&self, request: &NewDepartment) -> Result<Department, AppError> {
        request.validate()?;

        let result = sqlx::query("INSERT INTO departments (name, description) VALUES (?, ?)")
            .bind(&request.name)
            .bind(&request.description)
            .execute(&self.pool)
            .await?;

        Ok(Department {
            id: result.last_insert_rowid(),
            name: request.name.clone(),
            description: request.description.clone(),
        })
    }

    /// Delete a department. Its members stay, with no department.
    pub async fn delete_department(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Department", id));
        }

        tracing::info!("Deleted department {}", id);
        Ok(())
    }

    // ==================== MEMBER OPERATIONS ====================

    /// List all members with department and social links inlined, in the
    /// default `(sort_order, name)` order.
    pub async fn list_team_members(&self) -> Result<Vec<TeamMember>, AppError> {
        let sql = format!(
            "SELECT {} FROM team_members m LEFT JOIN departments d ON d.id = m.department_id ORDER BY m.sort_order, m.name, m.id",
            MEMBER_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut links = self.social_links_by_member(None).await?;
        Ok(rows
            .iter()
            .map(|row| {
                let mut member = member_from_row(row);
                member.social_links = links.remove(&member.id).unwrap_or_default();
                member
            })
            .collect())
    }

    pub async fn get_team_member(&self, id: i64) -> Result<Option<TeamMember>, AppError> {
        let sql = format!(
            "SELECT {} FROM team_members m LEFT JOIN departments d ON d.id = m.department_id WHERE m.id = ?",
            MEMBER_COLUMNS
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut member = member_from_row(&row);
        member.social_links = self
            .social_links_by_member(Some(id))
            .await?
            .remove(&id)
            .unwrap_or_default();
        Ok(Some(member))
    }

    pub async fn find_team_member_by_name(&self, name: &str) -> Result<Option<TeamMember>, AppError> {
        let row = sqlx::query("SELECT id FROM team_members WHERE name = ? ORDER BY id LIMIT 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => self.get_team_member(row.get("id")).await,
            None => Ok(None),
        }
    }

    /// Create a member together with its social links.
    pub async fn create_team_member(&self, request: &NewTeamMember) -> Result<TeamMember, AppError> {
        request.validate()?;

        if let Some(department_id) = request.department_id {
            if self.get_department(department_id).await?.is_none() {
                return Err(AppError::Validation(format!(
                    "Department {} does not exist",
                    department_id
                )));
            }
        }

        let stamp = format_datetime(&now());
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO team_members (name, job_title, department_id, email, phone, photo_id, bio, short_bio, years_experience, specialties, is_active, is_featured, sort_order, start_date, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&request.name)
        .bind(&request.job_title)
        .bind(request.department_id)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(request.photo_id)
        .bind(&request.bio)
        .bind(&request.short_bio)
        .bind(request.years_experience.map(|y| y as i64))
        .bind(&request.specialties)
        .bind(request.is_active as i32)
        .bind(request.is_featured as i32)
        .bind(request.sort_order)
        .bind(request.start_date.as_ref().map(format_date))
        .bind(&stamp)
        .bind(&stamp)
        .execute(&mut *tx)
        .await?;

        let member_id = result.last_insert_rowid();

        for (position, link) in request.social_links.iter().enumerate() {
            sqlx::query(
                "INSERT INTO social_links (member_id, platform, url, sort_order) VALUES (?, ?, ?, ?)",
            )
            .bind(member_id)
            .bind(link.platform.as_str())
            .bind(&link.url)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_team_member(member_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Team member {} vanished", member_id)))
    }

    /// Social links grouped by member, optionally restricted to one member.
    async fn social_links_by_member(
        &self,
        member_id: Option<i64>,
    ) -> Result<HashMap<i64, Vec<SocialLink>>, AppError> {
        let rows = match member_id {
            Some(id) => {
                sqlx::query("SELECT id, member_id, platform, url FROM social_links WHERE member_id = ? ORDER BY sort_order, id")
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT id, member_id, platform, url FROM social_links ORDER BY member_id, sort_order, id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let mut grouped: HashMap<i64, Vec<SocialLink>> = HashMap::new();
        for row in rows {
            let platform: String = row.get("platform");
            let platform = match platform.parse::<SocialPlatform>() {
                Ok(p) => p,
                Err(_) => {
                    tracing::warn!("Skipping social link with unknown platform '{}'", platform);
                    continue;
                }
            };
            grouped
                .entry(row.get("member_id"))
                .or_default()
                .push(SocialLink {
                    id: row.get("id"),
                    platform,
                    url: row.get("url"),
                });
        }
        Ok(grouped)
    }

    // ==================== STATS ====================

    pub async fn team_stats(&self) -> Result<TeamStats, AppError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM team_members) AS total_members,
                (SELECT COUNT(*) FROM team_members WHERE is_active = 1) AS active_members,
                (SELECT COUNT(*) FROM team_members WHERE is_featured = 1) AS featured_members,
                (SELECT COUNT(*) FROM departments) AS departments,
                (SELECT COUNT(DISTINCT d.id) FROM departments d
                    JOIN team_members m ON m.department_id = d.id) AS departments_with_members
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(TeamStats {
            total_members: row.get("total_members"),
            active_members: row.get("active_members"),
            featured_members: row.get("featured_members"),
            departments: row.get("departments"),
            departments_with_members: row.get("departments_with_members"),
        })
    }
}

fn department_from_row(row: &sqlx::sqlite::SqliteRow) -> Department {
    Department {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
    }
}

fn member_from_row(row: &sqlx::sqlite::SqliteRow) -> TeamMember {
    let is_active: i32 = row.get("is_active");
    let is_featured: i32 = row.get("is_featured");
    let years_experience: Option<i64> = row.get("years_experience");
    let start_date: Option<String> = row.get("start_date");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");
    let dept_id: Option<i64> = row.get("dept_id");

    TeamMember {
        id: row.get("id"),
        name: row.get("name"),
        job_title: row.get("job_title"),
        department: dept_id.map(|id| Department {
            id,
            name: row.get("dept_name"),
            description: row.get("dept_description"),
        }),
        email: row.get("email"),
        phone: row.get("phone"),
        photo_id: row.get("photo_id"),
        bio: row.get("bio"),
        short_bio: row.get("short_bio"),
        years_experience: years_experience.map(|y| y as u32),
        specialties: row.get("specialties"),
        is_active: is_active != 0,
        is_featured: is_featured != 0,
        sort_order: row.get("sort_order"),
        start_date: start_date.as_deref().and_then(parse_date),
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
        social_links: Vec::new(),
    }
}
