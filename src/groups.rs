use std::collections::HashMap;

use crate::api::{ApiClient, Method};
use crate::error::{LedgerError, Result};
use crate::models::{Category, Group, NewGroup};

const CATEGORIES_PATH: &str = "/api/categories/list";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootCategory {
    Assets,
    Liabilities,
    Income,
    Expenses,
}

impl RootCategory {
    /// Display order of the group tree.
    pub const ALL: [RootCategory; 4] = [
        RootCategory::Assets,
        RootCategory::Liabilities,
        RootCategory::Expenses,
        RootCategory::Income,
    ];

    pub fn id(self) -> i64 {
        match self {
            RootCategory::Assets => 1,
            RootCategory::Liabilities => 2,
            RootCategory::Income => 3,
            RootCategory::Expenses => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RootCategory::Assets => "Assets",
            RootCategory::Liabilities => "Liabilities",
            RootCategory::Income => "Income",
            RootCategory::Expenses => "Expenses",
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Flatten the tree into `"Category/parent/child"` paths with their ids,
/// in depth-first order.
pub fn flatten_paths(groups: &[Group]) -> Vec<(String, i64)> {
    fn walk(node: &Group, prefix: &str, out: &mut Vec<(String, i64)>) {
        let current = if prefix.is_empty() {
            node.group_name.clone()
        } else {
            format!("{prefix}/{}", node.group_name)
        };
        let full = match node.category.as_deref() {
            Some(cat) if !cat.is_empty() => format!("{cat}/{current}"),
            _ => current.clone(),
        };
        out.push((full, node.group_id));
        for child in &node.children {
            walk(child, &current, out);
        }
    }

    let mut out = Vec::new();
    for group in groups {
        walk(group, "", &mut out);
    }
    out
}

pub fn resolve_path(groups: &[Group], path: &str) -> Result<i64> {
    flatten_paths(groups)
        .into_iter()
        .find(|(p, _)| p == path)
        .map(|(_, id)| id)
        .ok_or_else(|| LedgerError::validation("Invalid group selected."))
}

/// Map every group name in the tree to its category id.
pub fn category_by_group_name(groups: &[Group]) -> HashMap<String, Option<i64>> {
    fn walk(node: &Group, out: &mut HashMap<String, Option<i64>>) {
        out.insert(node.group_name.clone(), node.category_id);
        for child in &node.children {
            walk(child, out);
        }
    }

    let mut out = HashMap::new();
    for group in groups {
        walk(group, &mut out);
    }
    out
}

pub fn find(groups: &[Group], group_id: i64) -> Option<&Group> {
    for group in groups {
        if group.group_id == group_id {
            return Some(group);
        }
        if let Some(found) = find(&group.children, group_id) {
            return Some(found);
        }
    }
    None
}

/// Root category of the top-level group whose subtree holds `group_id`.
pub fn root_of(groups: &[Group], group_id: i64) -> Option<RootCategory> {
    groups
        .iter()
        .find(|top| find(std::slice::from_ref(*top), group_id).is_some())
        .and_then(|top| {
            top.category_id
                .and_then(RootCategory::from_id)
                .or_else(|| top.category.as_deref().and_then(RootCategory::from_name))
        })
}

pub fn check_deletable(group: &Group) -> Result<()> {
    if group.children.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::validation(
            "Cannot delete a group with children. Please remove the children first.",
        ))
    }
}

/// Top-level groups under each root category, in display order.
pub fn by_category(groups: &[Group]) -> Vec<(RootCategory, Vec<&Group>)> {
    RootCategory::ALL
        .into_iter()
        .map(|root| {
            let members = groups
                .iter()
                .filter(|g| g.category.as_deref() == Some(root.name()))
                .collect();
            (root, members)
        })
        .collect()
}

/// Build a create request. A parent of `None` (or 0) places the group
/// directly under its root category.
pub fn new_group(name: &str, parent_id: Option<i64>, category_id: i64) -> Result<NewGroup> {
    if name.trim().is_empty() {
        return Err(LedgerError::validation("Group name cannot be empty"));
    }
    Ok(NewGroup {
        name: name.to_string(),
        parent_id: parent_id.filter(|id| *id != 0),
        account_id: category_id,
    })
}

pub async fn fetch_categories(api: &ApiClient) -> Result<Vec<Category>> {
    api.call(Method::Get, CATEGORIES_PATH, None, "Failed to load categories")
        .await?
        .json()
}

/// Keep only the four fixed root categories.
pub fn root_categories(categories: Vec<Category>) -> Vec<Category> {
    categories
        .into_iter()
        .filter(|c| RootCategory::from_name(&c.name).is_some())
        .collect()
}
