//! Protective equipment models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity for a piece of protective equipment.
///
/// Advisories are deduplicated on this code, never on display text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentItem {
    InsulatedFootwear,
    InsulatedGloves,
    ChinStrapHelmet,
    SafetyGoggles,
    WindproofJacket,
    RainSuit,
    WaterproofBoots,
    HiVisVest,
    Flashlight,
    N95Mask,
    SunHat,
    UvProtectiveClothing,
    Sunglasses,
    DrinkingWater,
    Sunscreen,
    WarmCoat,
    Gloves,
    WoolHat,
}

impl EquipmentItem {
    pub fn display_name(&self) -> &'static str {
        match self {
            EquipmentItem::InsulatedFootwear => "Insulated footwear",
            EquipmentItem::InsulatedGloves => "Insulated gloves",
            EquipmentItem::ChinStrapHelmet => "Chin-strap helmet",
            EquipmentItem::SafetyGoggles => "Safety goggles",
            EquipmentItem::WindproofJacket => "Windproof jacket",
            EquipmentItem::RainSuit => "Rain suit",
            EquipmentItem::WaterproofBoots => "Waterproof boots",
            EquipmentItem::HiVisVest => "Hi-vis vest",
            EquipmentItem::Flashlight => "Flashlight",
            EquipmentItem::N95Mask => "N95 respirator mask",
            EquipmentItem::SunHat => "Sun hat",
            EquipmentItem::UvProtectiveClothing => "UV-protective clothing",
            EquipmentItem::Sunglasses => "Sunglasses",
            EquipmentItem::DrinkingWater => "Drinking water",
            EquipmentItem::Sunscreen => "Sunscreen",
            EquipmentItem::WarmCoat => "Warm coat",
            EquipmentItem::Gloves => "Gloves",
            EquipmentItem::WoolHat => "Wool hat",
        }
    }
}

impl fmt::Display for EquipmentItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One row of an advisory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EquipmentRecommendation {
    pub item: EquipmentItem,
    pub name: String,
    pub reason: String,
    /// 1 to 5, 5 being most urgent
    pub priority: u8,
}

impl EquipmentRecommendation {
    pub fn new(item: EquipmentItem, reason: &str, priority: u8) -> Self {
        Self {
            item,
            name: item.display_name().to_string(),
            reason: reason.to_string(),
            priority: priority.clamp(1, 5),
        }
    }
}
