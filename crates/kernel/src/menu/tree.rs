//! Nested menu tree assembled from flattened menu rows.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use uuid::Uuid;

use crate::models::MenuNode;

/// Tree node for whole-menu display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuTreeNode {
    pub id: Uuid,
    pub title: Option<String>,
    pub weight: Option<i32>,
    pub online: bool,
    pub children: Vec<MenuTreeNode>,
}

impl MenuTreeNode {
    /// Nest rows under their parents, keeping the row order among siblings.
    ///
    /// Rows whose parent is not part of the set are dropped together with
    /// their subtree.
    pub fn assemble(rows: Vec<MenuNode>) -> Vec<MenuTreeNode> {
        let present: HashSet<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut roots = Vec::new();
        let mut children: HashMap<Uuid, Vec<MenuNode>> = HashMap::new();

        for row in rows {
            match row.parent {
                None => roots.push(row),
                Some(parent) if present.contains(&parent) => {
                    children.entry(parent).or_default().push(row);
                }
                Some(_) => {}
            }
        }

        roots
            .into_iter()
            .map(|row| Self::attach(row, &mut children))
            .collect()
    }

    fn attach(row: MenuNode, children: &mut HashMap<Uuid, Vec<MenuNode>>) -> Self {
        let kids = children.remove(&row.id).unwrap_or_default();
        Self {
            id: row.id,
            title: row.title,
            weight: row.weight,
            online: row.online,
            children: kids
                .into_iter()
                .map(|child| Self::attach(child, children))
                .collect(),
        }
    }

    /// Number of nodes in this subtree, this one included.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(MenuTreeNode::size).sum::<usize>()
    }
}
