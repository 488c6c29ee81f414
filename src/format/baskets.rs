//! `{ "baskets": [...] }` assignment export.

use serde::{Deserialize, Serialize};

use crate::level::BasketPlan;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasketEntry {
    pub color_name: String,
    pub color_index: i32,
    pub basket_index: i32,
    #[serde(default)]
    pub bolt_point_ids: Vec<String>,
}

impl From<&BasketPlan> for BasketEntry {
    fn from(plan: &BasketPlan) -> Self {
        Self {
            color_name: plan.color_name.clone(),
            color_index: i32::try_from(plan.color_index).unwrap_or(i32::MAX),
            basket_index: i32::try_from(plan.basket_index).unwrap_or(i32::MAX),
            bolt_point_ids: plan.bolt_point_ids.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketsFile {
    #[serde(default)]
    pub baskets: Vec<BasketEntry>,
}

impl BasketsFile {
    #[must_use]
    pub fn from_plans(plans: &[BasketPlan]) -> Self {
        Self {
            baskets: plans.iter().map(BasketEntry::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basket_field_names_are_camel_case() {
        let plan = BasketPlan {
            color_name: "Color_1".into(),
            color_index: 1,
            basket_index: 4,
            bolt_point_ids: vec!["BoltPoint_2".into()],
        };
        let file = BasketsFile::from_plans(&[plan]);
        assert_eq!(
            serde_json::to_value(&file).unwrap(),
            serde_json::json!({
                "baskets": [
                    {"colorName": "Color_1", "colorIndex": 1, "basketIndex": 4, "boltPointIds": ["BoltPoint_2"]}
                ]
            })
        );
    }
}
