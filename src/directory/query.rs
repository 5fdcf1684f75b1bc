//! Filter, search and ordering parameters of the member listing.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

use crate::errors::AppError;
use crate::models::{Department, TeamMember};

const KNOWN_PARAMS: [&str; 7] = [
    "department",
    "is_active",
    "is_featured",
    "search",
    "ordering",
    "page",
    "page_size",
];

/// Fields the listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    Name,
    JobTitle,
    SortOrder,
    StartDate,
}

impl FromStr for OrderField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(OrderField::Name),
            "job_title" => Ok(OrderField::JobTitle),
            "sort_order" => Ok(OrderField::SortOrder),
            "start_date" => Ok(OrderField::StartDate),
            other => Err(AppError::BadRequest(format!(
                "Cannot order by '{}'; choose from name, job_title, sort_order, start_date",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderKey {
    pub field: OrderField,
    pub descending: bool,
}

impl OrderKey {
    fn compare(&self, a: &TeamMember, b: &TeamMember) -> Ordering {
        let ord = match self.field {
            OrderField::Name => a.name.cmp(&b.name),
            OrderField::JobTitle => a.job_title.cmp(&b.job_title),
            OrderField::SortOrder => a.sort_order.cmp(&b.sort_order),
            // Missing dates first when ascending
            OrderField::StartDate => a.start_date.cmp(&b.start_date),
        };
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

const DEFAULT_ORDERING: [OrderKey; 2] = [
    OrderKey {
        field: OrderField::SortOrder,
        descending: false,
    },
    OrderKey {
        field: OrderField::Name,
        descending: false,
    },
];

/// Parsed member listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberQuery {
    pub department: Option<i64>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    /// Lowercased search terms; every one must match
    pub search_terms: Vec<String>,
    pub ordering: Vec<OrderKey>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl MemberQuery {
    /// Parse query parameters. `departments` is the set a `department`
    /// filter may name.
    pub fn from_params(params: &[(String, String)], departments: &[Department]) -> Result<Self, AppError> {
        let mut map: HashMap<&str, &str> = HashMap::new();
        for (key, value) in params {
            if !KNOWN_PARAMS.contains(&key.as_str()) {
                return Err(AppError::BadRequest(format!(
                    "Unknown query parameter '{}'",
                    key
                )));
            }
            map.insert(key, value);
        }

        let department = match map.get("department").map(|v| v.trim()) {
            None | Some("") => None,
            Some(raw) => {
                let id = raw
                    .parse::<i64>()
                    .ok()
                    .filter(|id| departments.iter().any(|d| d.id == *id))
                    .ok_or_else(|| {
                        AppError::BadRequest(format!(
                            "department: '{}' is not one of the available choices",
                            raw
                        ))
                    })?;
                Some(id)
            }
        };

        Ok(Self {
            department,
            is_active: parse_flag("is_active", map.get("is_active").copied())?,
            is_featured: parse_flag("is_featured", map.get("is_featured").copied())?,
            search_terms: map.get("search").map(|s| search_terms(s)).unwrap_or_default(),
            ordering: parse_ordering(map.get("ordering").copied())?,
            page: map.get("page").map(|s| s.to_string()),
            page_size: map.get("page_size").map(|s| s.to_string()),
        })
    }

    pub fn matches(&self, member: &TeamMember) -> bool {
        if let Some(dept) = self.department {
            if member.department_id() != Some(dept) {
                return false;
            }
        }
        if self.is_active.is_some_and(|flag| member.is_active != flag) {
            return false;
        }
        if self.is_featured.is_some_and(|flag| member.is_featured != flag) {
            return false;
        }
        if self.search_terms.is_empty() {
            return true;
        }

        let haystacks = [
            member.name.to_lowercase(),
            member.job_title.to_lowercase(),
            member.bio.to_lowercase(),
            member.specialties.to_lowercase(),
        ];
        self.search_terms
            .iter()
            .all(|term| haystacks.iter().any(|h| h.contains(term.as_str())))
    }

    /// Filter and order `members`.
    pub fn apply(&self, members: Vec<TeamMember>) -> Vec<TeamMember> {
        let mut kept: Vec<TeamMember> = members.into_iter().filter(|m| self.matches(m)).collect();
        kept.sort_by(|a, b| {
            self.ordering
                .iter()
                .fold(Ordering::Equal, |acc, key| acc.then_with(|| key.compare(a, b)))
                .then_with(|| a.id.cmp(&b.id))
        });
        kept
    }
}

/// Boolean query flag: `true`/`false`/`1`/`0`, any case; empty means unset.
pub fn parse_flag(name: &str, raw: Option<&str>) -> Result<Option<bool>, AppError> {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(other) => Err(AppError::BadRequest(format!(
            "{}: '{}' is not a valid boolean",
            name, other
        ))),
    }
}

/// Split on whitespace and commas, dropping empty pieces.
fn search_terms(raw: &str) -> Vec<String> {
    raw.replace('\0', "")
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn parse_ordering(raw: Option<&str>) -> Result<Vec<OrderKey>, AppError> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(DEFAULT_ORDERING.to_vec());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|term| {
            let (descending, name) = match term.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, term),
            };
            Ok(OrderKey {
                field: name.parse()?,
                descending,
            })
        })
        .collect()
}
