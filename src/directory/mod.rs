//! Team directory aggregation.
//!
//! Produces either a flat member list or per-department groups, narrowed by
//! the active and featured flags. Everything here is a pure function over
//! already loaded members; nothing is written back.

mod query;

pub use query::{parse_flag, MemberQuery};

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{Department, TeamMember, TeamPage};

/// Which members a directory view keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryOptions {
    pub only_active: bool,
    pub only_featured: bool,
}

impl DirectoryOptions {
    pub fn retains(&self, member: &TeamMember) -> bool {
        (!self.only_active || member.is_active) && (!self.only_featured || member.is_featured)
    }
}

impl From<&TeamPage> for DirectoryOptions {
    fn from(page: &TeamPage) -> Self {
        Self {
            only_active: page.show_only_active,
            only_featured: page.show_only_featured,
        }
    }
}

/// One department with its retained members.
#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentGroup {
    pub department: Department,
    pub members: Vec<TeamMember>,
}

/// Directory order: `sort_order`, then name, then id.
pub fn directory_order(a: &TeamMember, b: &TeamMember) -> Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Retained members in directory order.
pub fn members(opts: DirectoryOptions, all: &[TeamMember]) -> Vec<TeamMember> {
    let mut kept: Vec<TeamMember> = all.iter().filter(|m| opts.retains(m)).cloned().collect();
    kept.sort_by(directory_order);
    kept
}

/// Departments in name order, each with its retained members. Departments
/// left with no members are omitted.
pub fn departments(
    opts: DirectoryOptions,
    departments: &[Department],
    all: &[TeamMember],
) -> Vec<DepartmentGroup> {
    let mut ordered: Vec<&Department> = departments.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    let kept = members(opts, all);
    ordered
        .into_iter()
        .filter_map(|dept| {
            let group: Vec<TeamMember> = kept
                .iter()
                .filter(|m| m.department_id() == Some(dept.id))
                .cloned()
                .collect();
            (!group.is_empty()).then(|| DepartmentGroup {
                department: dept.clone(),
                members: group,
            })
        })
        .collect()
}
