//! Protective equipment advisories
//!
//! Conditions expand to equipment through a fixed rule table. When several
//! conditions ask for the same item it appears once, at the highest
//! priority any of them gave it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::conditions::evaluate;
use crate::models::{Condition, ConditionKind, EquipmentItem, EquipmentRecommendation, ReadingSet};
use crate::types::Horizon;

/// Separator between reasons merged from equal-priority duplicates
pub const REASON_SEPARATOR: &str = "; ";

/// Equipment tuples `(item, reason, priority)` for a condition kind
pub fn equipment_for(kind: ConditionKind) -> &'static [(EquipmentItem, &'static str, u8)] {
    use EquipmentItem::*;

    match kind {
        ConditionKind::Thunderstorm => &[
            (InsulatedFootwear, "lightning risk", 5),
            (InsulatedGloves, "lightning risk", 4),
        ],
        ConditionKind::HighWindGust => &[
            (ChinStrapHelmet, "strong wind", 5),
            (SafetyGoggles, "flying debris", 4),
        ],
        ConditionKind::HighWind => &[
            (ChinStrapHelmet, "strong wind", 4),
            (WindproofJacket, "wind chill", 3),
        ],
        ConditionKind::HeavyRain => &[
            (RainSuit, "active rain", 5),
            (WaterproofBoots, "slippery ground", 4),
        ],
        ConditionKind::LowVisibility => &[
            (HiVisVest, "poor visibility", 5),
            (Flashlight, "poor visibility", 4),
        ],
        ConditionKind::Fog => &[(HiVisVest, "fog", 5), (Flashlight, "fog", 4)],
        ConditionKind::PoorAirQuality => &[(N95Mask, "poor air quality", 5)],
        ConditionKind::HighTemperature => &[
            (SunHat, "heat", 4),
            (UvProtectiveClothing, "heat", 4),
            (DrinkingWater, "heat stress", 4),
            (Sunglasses, "glare", 3),
        ],
        ConditionKind::HighUv => &[
            (Sunscreen, "UV exposure", 4),
            (SunHat, "UV exposure", 3),
            (Sunglasses, "UV exposure", 3),
        ],
        ConditionKind::LowTemperature => &[
            (WarmCoat, "cold", 5),
            (Gloves, "cold", 4),
            (WoolHat, "cold", 4),
        ],
    }
}

/// Ranked, deduplicated equipment for a set of active conditions.
///
/// Per item the highest priority wins and takes its reason with it. Equal
/// priorities keep the first reason and append the other distinct ones.
/// Items keep the position where they were first seen, then a stable sort
/// orders them by priority, highest first.
pub fn recommend(conditions: &[Condition]) -> Vec<EquipmentRecommendation> {
    let mut merged: Vec<EquipmentRecommendation> = Vec::new();
    let mut index: HashMap<EquipmentItem, usize> = HashMap::new();

    for condition in conditions {
        for &(item, reason, priority) in equipment_for(condition.kind) {
            let candidate = EquipmentRecommendation::new(item, reason, priority);
            match index.get(&item) {
                None => {
                    index.insert(item, merged.len());
                    merged.push(candidate);
                }
                Some(&slot) => merge_into(&mut merged[slot], candidate),
            }
        }
    }

    merged.sort_by(|a, b| b.priority.cmp(&a.priority));
    merged
}

fn merge_into(kept: &mut EquipmentRecommendation, candidate: EquipmentRecommendation) {
    if candidate.priority > kept.priority {
        kept.priority = candidate.priority;
        kept.reason = candidate.reason;
    } else if candidate.priority == kept.priority
        && !kept
            .reason
            .split(REASON_SEPARATOR)
            .any(|existing| existing == candidate.reason)
    {
        kept.reason.push_str(REASON_SEPARATOR);
        kept.reason.push_str(&candidate.reason);
    }
}

/// Conditions plus the equipment they call for
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Advisory {
    pub conditions: Vec<Condition>,
    pub equipment: Vec<EquipmentRecommendation>,
}

impl Advisory {
    pub fn from_conditions(conditions: Vec<Condition>) -> Self {
        let equipment = recommend(&conditions);
        Self {
            conditions,
            equipment,
        }
    }

    pub fn is_clear(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Evaluate and advise for one horizon of a reading set
pub fn advise(set: &ReadingSet, horizon: Horizon) -> Advisory {
    Advisory::from_conditions(evaluate(set, horizon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    fn condition(kind: ConditionKind) -> Condition {
        Condition {
            kind,
            severity: Severity::High,
            message: String::new(),
            triggers: Vec::new(),
        }
    }

    fn items(recommendations: &[EquipmentRecommendation]) -> Vec<EquipmentItem> {
        recommendations.iter().map(|r| r.item).collect()
    }

    #[test]
    fn test_no_conditions_no_equipment() {
        assert!(recommend(&[]).is_empty());
    }

    #[test]
    fn test_every_kind_has_equipment() {
        for kind in ConditionKind::ALL {
            assert!(!equipment_for(kind).is_empty(), "{}", kind);
            for (_, _, priority) in equipment_for(kind) {
                assert!((1..=5).contains(priority));
            }
        }
    }

    #[test]
    fn test_duplicate_item_keeps_highest_priority() {
        // high_wind gives the helmet priority 4, high_wind_gust gives it 5
        let result = recommend(&[
            condition(ConditionKind::HighWind),
            condition(ConditionKind::HighWindGust),
        ]);
        let helmets: Vec<_> = result
            .iter()
            .filter(|r| r.item == EquipmentItem::ChinStrapHelmet)
            .collect();
        assert_eq!(helmets.len(), 1);
        assert_eq!(helmets[0].priority, 5);
        assert_eq!(helmets[0].reason, "strong wind");
    }

    #[test]
    fn test_equal_priority_reasons_are_joined() {
        let result = recommend(&[
            condition(ConditionKind::Fog),
            condition(ConditionKind::LowVisibility),
        ]);
        assert_eq!(items(&result), vec![EquipmentItem::HiVisVest, EquipmentItem::Flashlight]);
        assert_eq!(result[0].reason, "fog; poor visibility");
        assert_eq!(result[1].reason, "fog; poor visibility");
    }

    #[test]
    fn test_same_reason_is_not_repeated() {
        let result = recommend(&[
            condition(ConditionKind::Fog),
            condition(ConditionKind::Fog),
        ]);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].reason, "fog");
    }

    #[test]
    fn test_sorted_by_priority_then_first_seen() {
        let result = recommend(&[
            condition(ConditionKind::HighTemperature),
            condition(ConditionKind::LowTemperature),
        ]);
        let priorities: Vec<u8> = result.iter().map(|r| r.priority).collect();
        assert!(priorities.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(
            items(&result),
            vec![
                EquipmentItem::WarmCoat,
                EquipmentItem::SunHat,
                EquipmentItem::UvProtectiveClothing,
                EquipmentItem::DrinkingWater,
                EquipmentItem::Gloves,
                EquipmentItem::WoolHat,
                EquipmentItem::Sunglasses,
            ]
        );
    }

    #[test]
    fn test_recommend_is_deterministic() {
        let conditions = vec![
            condition(ConditionKind::HeavyRain),
            condition(ConditionKind::HighUv),
            condition(ConditionKind::HighTemperature),
        ];
        assert_eq!(recommend(&conditions), recommend(&conditions));
    }
}
