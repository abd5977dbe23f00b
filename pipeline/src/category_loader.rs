//! Category bootstrap loader: a single GET against the upstream category
//! tree, schema validation, and a truncate-and-replace into the Category
//! store. Thin and fatal-on-first-error, mirroring the way the source's
//! loader exits the process rather than partially committing a tree.

use std::sync::Arc;

use common::entities::Category;
use common::validation::validate_category;
use crawler::{fetcher::Fetcher, request::Request};
use mongodb_connector::category_store::CategoryStore;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::constants::CATEGORY_TREE_URL;
use crate::errors::PipelineError;

#[derive(Debug, Deserialize)]
struct RawCategoryNode {
    id: i64,
    name: String,
    parent: Option<i64>,
    url: String,
    shard: Option<String>,
    query: Option<String>,
    #[serde(default)]
    childs: Vec<RawCategoryNode>,
    landing: Option<bool>,
}

/// Fetches the category tree, flattens it, validates every materialized
/// node, and replaces the Category collection wholesale.
pub async fn load_categories(
    fetcher: Arc<Fetcher>,
    store: &CategoryStore,
) -> Result<(), PipelineError> {
    let request = Request::builder().set_url(CATEGORY_TREE_URL).build();
    let response = fetcher.fetch(request).await?;

    let nodes: Vec<RawCategoryNode> = parse_tree(&response)?;
    let mut categories = Vec::new();

    for node in nodes {
        flatten(node, &mut categories)?;
    }

    info!(count = categories.len(), "flattened and validated category tree");
    store.replace_all(categories).await?;

    Ok(())
}

fn parse_tree(response: &Value) -> Result<Vec<RawCategoryNode>, PipelineError> {
    serde_json::from_value(response.clone()).map_err(|_| PipelineError::EmptyResponse {
        url: CATEGORY_TREE_URL.to_string(),
    })
}

/// Recurses into `node.childs` first, then materializes `node` itself iff it
/// carries a `landing` flag or a `parent` id, matching the upstream schema's
/// "landing pages and non-root nodes only" rule.
fn flatten(node: RawCategoryNode, out: &mut Vec<Category>) -> Result<(), PipelineError> {
    let childs = node.childs;

    for child in childs {
        flatten(child, out)?;
    }

    if node.landing.unwrap_or(false) || node.parent.is_some() {
        let category = Category {
            id: node.id,
            name: node.name,
            parent_id: node.parent,
            url: node.url,
            shard: node.shard,
            query: node.query,
        };

        validate_category(&category).map_err(|err| PipelineError::CategoryValidation {
            id: category.id,
            reason: err.to_string(),
        })?;

        out.push(category);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, parent: Option<i64>, landing: Option<bool>, childs: Vec<RawCategoryNode>) -> RawCategoryNode {
        RawCategoryNode {
            id,
            name: format!("node-{id}"),
            parent,
            url: "/catalog/test".to_string(),
            shard: Some("women/clothes".to_string()),
            query: None,
            childs,
            landing,
        }
    }

    #[test]
    fn root_node_without_parent_or_landing_is_dropped() {
        let mut out = Vec::new();
        flatten(node(1, None, None, vec![]), &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn child_nodes_materialize_before_their_parent() {
        let tree = node(1, None, None, vec![node(2, Some(1), None, vec![])]);
        let mut out = Vec::new();
        flatten(tree, &mut out).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 2);
    }

    #[test]
    fn landing_node_materializes_even_without_a_parent() {
        let mut out = Vec::new();
        flatten(node(1, None, Some(true), vec![]), &mut out).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 1);
    }

    #[test]
    fn invalid_node_fails_the_whole_load() {
        let mut bad = node(2, Some(1), None, vec![]);
        bad.url = "not-a-valid-url".to_string();

        let mut out = Vec::new();
        let result = flatten(bad, &mut out);

        assert!(matches!(result, Err(PipelineError::CategoryValidation { id: 2, .. })));
    }
}
