//! `{ "bolts": [...] }` dependency export and the analyzed basket order.

use serde::{Deserialize, Serialize};

use crate::analyze::{BoltDependencies, Triple};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoltEntry {
    pub bolt_id: String,
    pub color_id: i32,
    pub depth: i32,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub pawns: Vec<String>,
}

impl From<BoltDependencies> for BoltEntry {
    fn from(value: BoltDependencies) -> Self {
        Self {
            bolt_id: value.bolt_id,
            color_id: value.color_id,
            depth: value.depth,
            parents: value.parents,
            pawns: value.pawns,
        }
    }
}

impl From<BoltEntry> for BoltDependencies {
    fn from(value: BoltEntry) -> Self {
        Self {
            bolt_id: value.bolt_id,
            color_id: value.color_id,
            depth: value.depth,
            parents: value.parents,
            pawns: value.pawns,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoltsFile {
    #[serde(default)]
    pub bolts: Vec<BoltEntry>,
}

impl BoltsFile {
    #[must_use]
    pub fn from_dependencies(deps: Vec<BoltDependencies>) -> Self {
        Self {
            bolts: deps.into_iter().map(BoltEntry::from).collect(),
        }
    }

    #[must_use]
    pub fn into_dependencies(self) -> Vec<BoltDependencies> {
        self.bolts.into_iter().map(BoltDependencies::from).collect()
    }
}

/// One basket of the analyzed play order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketOrderEntry {
    pub color_id: i32,
    pub depth_sum: i64,
    pub bolt_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketOrderFile {
    pub order: Vec<BasketOrderEntry>,
    /// Bolts of colours that could not fill a basket.
    #[serde(default)]
    pub dropped: Vec<String>,
}

impl BasketOrderFile {
    #[must_use]
    pub fn new(triples: &[Triple], dropped: Vec<String>) -> Self {
        Self {
            order: triples
                .iter()
                .map(|t| BasketOrderEntry {
                    color_id: t.color_id,
                    depth_sum: t.depth_sum(),
                    bolt_ids: t.ids().map(str::to_owned).collect(),
                })
                .collect(),
            dropped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::parse_str;

    #[test]
    fn bolt_field_names_are_snake_case() {
        let file = BoltsFile {
            bolts: vec![BoltEntry {
                bolt_id: "Bolt_BoltPoint_3_B0C0".into(),
                color_id: 0,
                depth: 2,
                parents: vec!["a".into()],
                pawns: Vec::new(),
            }],
        };
        assert_eq!(
            serde_json::to_value(&file).unwrap(),
            serde_json::json!({
                "bolts": [
                    {"bolt_id": "Bolt_BoltPoint_3_B0C0", "color_id": 0, "depth": 2, "parents": ["a"], "pawns": []}
                ]
            })
        );
    }

    #[test]
    fn lists_default_to_empty() {
        let file: BoltsFile = parse_str(r#"{"bolts": [{"bolt_id": "b", "color_id": 1, "depth": 0}]}"#).unwrap();
        let deps = file.into_dependencies();
        assert!(deps[0].parents.is_empty() && deps[0].pawns.is_empty());
    }
}
