//! Region, category, sub-category sales tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::RowSet;
use crate::model::column;
use crate::table::{Cell, Table, ToTable};

/// A node of the sales tree; leaves are sub-categories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub name: String,
    pub sales: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    fn node(name: &str, sales: f64, children: Vec<HierarchyNode>) -> Self {
        Self {
            name: name.to_string(),
            sales,
            children,
        }
    }

    /// Leaf paths from this node's children down, with leaf sales.
    pub fn leaf_paths(&self) -> Vec<(Vec<&str>, f64)> {
        let mut out = Vec::new();
        for child in &self.children {
            child.collect_leaves(&mut Vec::new(), &mut out);
        }
        out
    }

    fn collect_leaves<'n>(&'n self, path: &mut Vec<&'n str>, out: &mut Vec<(Vec<&'n str>, f64)>) {
        path.push(&self.name);
        if self.children.is_empty() {
            out.push((path.clone(), self.sales));
        } else {
            for child in &self.children {
                child.collect_leaves(path, out);
            }
        }
        path.pop();
    }
}

impl ToTable for HierarchyNode {
    fn to_table(&self) -> Table {
        let mut table = Table::new([
            column::REGION,
            column::CATEGORY,
            column::SUB_CATEGORY,
            column::SALES,
        ]);
        for (path, sales) in self.leaf_paths() {
            let mut cells: Vec<Cell> = path.into_iter().map(Cell::from).collect();
            cells.push(sales.into());
            table.push(cells);
        }
        table
    }
}

type Tree<'a> = BTreeMap<&'a str, BTreeMap<&'a str, BTreeMap<&'a str, f64>>>;

/// Sum sales along Region → Category → Sub-Category under a root named `Total`.
pub fn sales_hierarchy(rows: &RowSet<'_>) -> HierarchyNode {
    let mut tree: Tree<'_> = BTreeMap::new();
    for row in rows.iter() {
        *tree
            .entry(row.region.as_str())
            .or_default()
            .entry(row.category.as_str())
            .or_default()
            .entry(row.sub_category.as_str())
            .or_insert(0.0) += row.sales;
    }

    let regions: Vec<_> = tree
        .into_iter()
        .map(|(region, categories)| {
            let categories: Vec<_> = categories
                .into_iter()
                .map(|(category, subs)| {
                    let leaves: Vec<_> = subs
                        .into_iter()
                        .map(|(sub, sales)| HierarchyNode::node(sub, sales, Vec::new()))
                        .collect();
                    HierarchyNode::node(category, sum(&leaves), leaves)
                })
                .collect();
            HierarchyNode::node(region, sum(&categories), categories)
        })
        .collect();

    HierarchyNode::node("Total", sum(&regions), regions)
}

fn sum(nodes: &[HierarchyNode]) -> f64 {
    nodes.iter().fold(0.0, |acc, n| acc + n.sales)
}
