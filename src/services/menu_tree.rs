use std::collections::HashMap;

use serde::Serialize;

use crate::db::entities::menu;

/// Menu row with its resolved children. The `children` key is omitted from
/// the JSON for leaves, which is what the admin frontend expects.
#[derive(Debug, Clone, Serialize)]
pub struct MenuNode {
    #[serde(flatten)]
    pub menu: menu::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<MenuNode>>,
}

/// Assembles the tree under `root` from one flat result set, preserving the
/// input order within each level. Rows whose parent chain never reaches
/// `root` are dropped, so a dangling `parent_id` cannot leak nodes into the
/// output or send the recursion in circles.
pub fn build_tree(rows: &[menu::Model], root: i32) -> Vec<MenuNode> {
    let mut by_parent: HashMap<i32, Vec<&menu::Model>> = HashMap::new();
    for row in rows {
        by_parent.entry(row.parent_id).or_default().push(row);
    }
    attach(&by_parent, root)
}

fn attach(by_parent: &HashMap<i32, Vec<&menu::Model>>, parent_id: i32) -> Vec<MenuNode> {
    let Some(rows) = by_parent.get(&parent_id) else {
        return Vec::new();
    };
    rows.iter()
        .map(|row| {
            let children = attach(by_parent, row.id);
            MenuNode {
                menu: (*row).clone(),
                children: (!children.is_empty()).then_some(children),
            }
        })
        .collect()
}
