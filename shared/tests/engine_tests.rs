//! Advisory engine tests
//!
//! End-to-end scenarios from reading to equipment list, plus properties of
//! the classifier, evaluator and advisory ranking.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::*;

fn site() -> GpsCoordinates {
    GpsCoordinates::new(Decimal::new(187883, 4), Decimal::new(989853, 4))
}

fn kinds(conditions: &[Condition]) -> Vec<ConditionKind> {
    conditions.iter().map(|c| c.kind).collect()
}

fn items(equipment: &[EquipmentRecommendation]) -> Vec<EquipmentItem> {
    equipment.iter().map(|e| e.item).collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[cfg(test)]
mod scenarios {
    use super::*;

    /// Hot, sunny, smoky afternoon
    #[test]
    fn test_scenario_heat_uv_and_smoke() {
        let mut reading = Reading {
            temperature_celsius: Some(36.0),
            wind_speed_kmh: Some(10.0),
            weather_code: Some(0),
            uv_index: Some(7.0),
            ..Default::default()
        };
        reading.air_quality.us_aqi = Some(180.0);
        let set = ReadingSet::new(site()).with_current(reading);

        let advisory = advise(&set, Horizon::Current);

        let mut fired = kinds(&advisory.conditions);
        fired.sort();
        let mut expected = vec![
            ConditionKind::HighTemperature,
            ConditionKind::HighUv,
            ConditionKind::PoorAirQuality,
        ];
        expected.sort();
        assert_eq!(fired, expected);

        let equipment = items(&advisory.equipment);
        assert!(equipment.contains(&EquipmentItem::SunHat));
        assert!(equipment.contains(&EquipmentItem::UvProtectiveClothing));
        assert!(equipment.contains(&EquipmentItem::N95Mask));
        assert_eq!(equipment[0], EquipmentItem::N95Mask);

        let priorities: Vec<u8> = advisory.equipment.iter().map(|e| e.priority).collect();
        assert!(priorities.windows(2).all(|w| w[0] >= w[1]));

        assert_eq!(classify_uv(Some(7.0)).band, UvBand::High);
        assert_eq!(classify_aqi(Some(180.0)).band, AqiBand::Unhealthy);
    }

    /// Stormy day in the seven-day forecast
    #[test]
    fn test_scenario_thunderstorm_day() {
        let mut day = DailyReading::empty(NaiveDate::from_ymd_opt(2026, 10, 21).unwrap());
        day.weather_code = Some(96);
        day.wind_speed_max_kmh = Some(45.0);
        day.precipitation_sum_mm = Some(8.0);
        let set = ReadingSet::new(site()).with_daily(vec![day]);

        let advisory = advise(&set, Horizon::Day(0));

        let mut fired = kinds(&advisory.conditions);
        fired.sort();
        let mut expected = vec![
            ConditionKind::Thunderstorm,
            ConditionKind::HighWindGust,
            ConditionKind::HeavyRain,
        ];
        expected.sort();
        assert_eq!(fired, expected);

        let equipment = items(&advisory.equipment);
        assert_eq!(equipment[0], EquipmentItem::InsulatedFootwear);
        assert!(equipment.contains(&EquipmentItem::ChinStrapHelmet));
        assert!(equipment.contains(&EquipmentItem::RainSuit));

        let position = |item| equipment.iter().position(|e| *e == item).unwrap();
        assert!(
            position(EquipmentItem::InsulatedFootwear) < position(EquipmentItem::ChinStrapHelmet)
        );
        assert!(position(EquipmentItem::InsulatedFootwear) < position(EquipmentItem::RainSuit));
    }

    /// Nothing known except a weather code outside the table
    #[test]
    fn test_scenario_unknown_code_and_no_data() {
        let reading = Reading {
            weather_code: Some(999),
            ..Default::default()
        };
        let set = ReadingSet::new(site()).with_current(reading);

        let advisory = advise(&set, Horizon::Current);

        assert!(advisory.conditions.is_empty());
        assert!(advisory.equipment.is_empty());
        assert!(advisory.is_clear());
        assert_eq!(describe_weather_code(999), UNDETERMINED);
        assert_eq!(classify_air_quality(&AirQuality::default()).band, AqiBand::Unknown);
        assert_eq!(classify_uv(None).band, UvBand::Unknown);
    }

    #[test]
    fn test_hi_vis_vest_appears_once_at_highest_priority() {
        let fog = Reading {
            weather_code: Some(45),
            visibility_km: Some(0.4),
            ..Default::default()
        };
        let set = ReadingSet::new(site()).with_current(fog);

        let advisory = advise(&set, Horizon::Current);
        let vests: Vec<_> = advisory
            .equipment
            .iter()
            .filter(|e| e.item == EquipmentItem::HiVisVest)
            .collect();

        assert_eq!(vests.len(), 1);
        assert_eq!(vests[0].priority, 5);
    }

    #[test]
    fn test_same_engine_for_every_horizon() {
        let windy = Reading {
            wind_gusts_kmh: Some(55.0),
            ..Default::default()
        };
        let hour = HourlyReading {
            timestamp: chrono::Utc::now(),
            reading: windy.clone(),
        };
        let set = ReadingSet::new(site())
            .with_current(windy)
            .with_hourly(vec![hour]);

        assert_eq!(
            advise(&set, Horizon::Current).equipment,
            advise(&set, Horizon::Hour(0)).equipment
        );
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn metric_strategy(max: f64) -> impl Strategy<Value = Option<f64>> {
        prop::option::of(0.0..max)
    }

    prop_compose! {
        fn reading_strategy()(
            temperature in prop::option::of(-20.0..50.0f64),
            wind in metric_strategy(120.0),
            gusts in metric_strategy(150.0),
            rain in metric_strategy(40.0),
            visibility in metric_strategy(20.0),
            uv in metric_strategy(14.0),
            code in prop::option::of(prop::sample::select(vec![0, 2, 45, 61, 65, 95, 99, 999])),
            aqi in metric_strategy(400.0),
        ) -> Reading {
            let mut reading = Reading {
                temperature_celsius: temperature,
                wind_speed_kmh: wind,
                wind_gusts_kmh: gusts,
                precipitation_mm: rain,
                visibility_km: visibility,
                uv_index: uv,
                weather_code: code,
                ..Default::default()
            };
            reading.air_quality.us_aqi = aqi;
            reading
        }
    }

    fn aqi_rank(band: AqiBand) -> u8 {
        match band {
            AqiBand::Good => 0,
            AqiBand::Moderate => 1,
            AqiBand::UnhealthyForSensitive => 2,
            AqiBand::Unhealthy => 3,
            AqiBand::VeryUnhealthy => 4,
            AqiBand::Hazardous => 5,
            AqiBand::Unknown => u8::MAX,
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// AQI bands never go down as the value goes up
        #[test]
        fn prop_aqi_band_is_monotonic(a in 0.0..600.0f64, b in 0.0..600.0f64) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                aqi_rank(classify_aqi(Some(low)).band) <= aqi_rank(classify_aqi(Some(high)).band)
            );
        }

        /// Any finite non-negative AQI gets a real band
        #[test]
        fn prop_aqi_always_classified(v in 0.0..1.0e6f64) {
            prop_assert_ne!(classify_aqi(Some(v)).band, AqiBand::Unknown);
            prop_assert!(classify_aqi(Some(v)).health_advice.is_some());
        }

        /// Any integer gets a description
        #[test]
        fn prop_weather_code_is_total(code in any::<i32>()) {
            prop_assert!(!describe_weather_code(code).is_empty());
        }

        /// Evaluating twice gives the same answer
        #[test]
        fn prop_evaluation_is_idempotent(reading in reading_strategy()) {
            prop_assert_eq!(evaluate_reading(&reading), evaluate_reading(&reading));
        }

        /// Each kind fires at most once per evaluation
        #[test]
        fn prop_kinds_are_unique(reading in reading_strategy()) {
            let mut fired = kinds(&evaluate_reading(&reading));
            let total = fired.len();
            fired.sort();
            fired.dedup();
            prop_assert_eq!(fired.len(), total);
        }

        /// Priorities never increase down the list, items never repeat
        #[test]
        fn prop_advisory_is_ranked_and_unique(reading in reading_strategy()) {
            let equipment = recommend(&evaluate_reading(&reading));
            prop_assert!(equipment.windows(2).all(|w| w[0].priority >= w[1].priority));

            let mut seen = std::collections::HashSet::new();
            for entry in &equipment {
                prop_assert!(seen.insert(entry.item));
                prop_assert!((1..=5).contains(&entry.priority));
            }
        }

        /// Every recommended item comes from some active condition
        #[test]
        fn prop_advisory_traces_back_to_conditions(reading in reading_strategy()) {
            let conditions = evaluate_reading(&reading);
            let equipment = recommend(&conditions);
            for entry in &equipment {
                let backed = conditions.iter().any(|c| {
                    equipment_for(c.kind).iter().any(|(item, _, _)| *item == entry.item)
                });
                prop_assert!(backed);
            }
        }
    }
}
