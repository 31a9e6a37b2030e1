// src/settlement/economy.rs
//! Труд, производство, потребление и голод
//!
//! Порядок вычислений фиксирован:
//! 1. рабочая сила из здорового населения (`labor_multiplier`)
//! 2. вычет учреждений (см. `institution::effective_labor_force`)
//! 3. производство из *оставшейся* рабочей силы, ограниченное инфраструктурой
//! 4. потребление и раздел уязвимого населения на голодающих и раненых
//!
//! Изоляция (`connection_friction`) везде только вычитается.

use std::collections::BTreeMap;

use rand::Rng;

use crate::config::{GenerationConstants, ResourceSettings, SettlementSettings, lookup};
use crate::error::GenerationError;
use crate::seeds::resource_seed;
use crate::weighted::{clamp01, rng_from_seed};

/// `clamp01(LABOR_BASE_RATE + age_ratio·LABOR_AGE_WEIGHT − friction·LABOR_FRICTION_WEIGHT)`
#[must_use]
pub fn labor_multiplier(age_ratio: f64, friction: f64, settings: &SettlementSettings) -> f64 {
    clamp01(
        settings.labor_base_rate + age_ratio * settings.labor_age_weight
            - friction * settings.labor_friction_weight,
    )
}

/// Рабочая сила — целая часть `healthy · multiplier`, никогда не больше `healthy`
#[must_use]
pub fn labor_force(healthy: u32, multiplier: f64) -> u32 {
    let force = (f64::from(healthy) * clamp01(multiplier)).floor() as u32;
    force.min(healthy)
}

/// Эффективность производства архетипа с поправкой на возраст и изоляцию
#[must_use]
pub fn production_efficiency(
    base_efficiency: f64,
    age_ratio: f64,
    friction: f64,
    settings: &SettlementSettings,
) -> f64 {
    clamp01(
        base_efficiency + age_ratio * settings.efficiency_age_weight
            - friction * settings.efficiency_friction_weight,
    )
}

/// Производственный потенциал одного ресурса.
///
/// `min(labor_cap · labor_output_rate · efficiency, capacity · infra_output_rate)` —
/// упирается в то, чего меньше: рук или инфраструктуры.
pub fn resource_output(
    resource: &str,
    capacity: u32,
    effective_labor: u32,
    efficiency: f64,
    settings: &ResourceSettings,
) -> Result<f64, GenerationError> {
    let share_cap = lookup(&settings.labor_share_cap, "resource.labor_share_cap", resource)?;
    let infra_rate = lookup(&settings.infra_output_rate, "resource.infra_output_rate", resource)?;
    let output_rate = lookup(&settings.labor_output_rate, "resource.labor_output_rate", resource)?;

    let labor_cap = f64::from(effective_labor) * share_cap;
    let infra_cap = f64::from(capacity) * infra_rate;
    let production = (labor_cap * output_rate * efficiency).min(infra_cap);

    Ok(production.max(0.0))
}

/// Спрос на ресурс: `base_population · per_capita_demand`
pub fn consumption_demand(
    resource: &str,
    base_population: u32,
    settings: &ResourceSettings,
) -> Result<f64, GenerationError> {
    let per_capita = lookup(&settings.per_capita_demand, "resource.per_capita_demand", resource)?;
    Ok((f64::from(base_population) * per_capita).max(0.0))
}

/// Ёмкость и начальный запас ресурса.
///
/// Вытягиваются из собственного потока ресурса, поэтому не зависят от порядка
/// объявления ресурсов.
pub fn draw_stock(
    settlement_seed: u64,
    settlement_type: &str,
    resource: &str,
    constants: &GenerationConstants,
) -> Result<(u32, f64), GenerationError> {
    let settings = &constants.resource;
    let ranges = lookup(&settings.capacity, "resource.capacity", settlement_type)?;
    let bounds = lookup(ranges, "resource.capacity", resource)?;

    let mut rng = rng_from_seed(resource_seed(settlement_seed, resource));
    let capacity = bounds
        .sample(&mut rng)
        .clamp(settings.capacity_limits.min, settings.capacity_limits.max);
    let fill: f64 = clamp01(rng.gen_range(settings.initial_fill.min..=settings.initial_fill.max));

    Ok((capacity, f64::from(capacity) * fill))
}

/// Раздел уязвимого населения (`base − healthy`) на голодающих и раненых
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthSplit {
    pub starving: u32,
    pub injured: u32,
}

/// Нехватка еды сверх порога восстановления переводит ограниченную долю уязвимых
/// в голодающих; остальные уязвимые — раненые. `starving + injured == base − healthy`.
#[must_use]
pub fn starvation_split(
    base_population: u32,
    healthy: u32,
    food_demand: f64,
    food_supply: f64,
    settings: &SettlementSettings,
) -> HealthSplit {
    let vulnerable = base_population.saturating_sub(healthy);

    let unmet = (food_demand - food_supply).max(0.0);
    let strain = if food_demand > 0.0 { unmet / food_demand } else { 0.0 };

    let fraction = if strain > settings.starvation_recovery_threshold {
        ((strain - settings.starvation_recovery_threshold) * settings.starvation_conversion_rate)
            .min(settings.starvation_max_fraction)
    } else {
        0.0
    };

    let starving = ((f64::from(vulnerable) * clamp01(fraction)).floor() as u32).min(vulnerable);

    HealthSplit {
        starving,
        injured: vulnerable - starving,
    }
}

/// Доля неудовлетворённого спроса по каждому ресурсу
#[must_use]
pub fn unmet_ratios(
    production: &BTreeMap<String, f64>,
    demand: &BTreeMap<String, f64>,
) -> Vec<f64> {
    demand
        .iter()
        .map(|(resource, &wanted)| {
            let supplied = production.get(resource).copied().unwrap_or(0.0);
            if wanted > 0.0 {
                clamp01((wanted - supplied).max(0.0) / wanted)
            } else {
                0.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friction_never_raises_labor_or_efficiency() {
        let settings = SettlementSettings::default();
        for age in [0.0, 0.3, 0.7, 1.0] {
            let mut previous_labor = f64::INFINITY;
            let mut previous_eff = f64::INFINITY;
            for step in 0..=10 {
                let friction = f64::from(step) / 10.0;
                let labor = labor_multiplier(age, friction, &settings);
                let eff = production_efficiency(0.55, age, friction, &settings);
                assert!(labor <= previous_labor);
                assert!(eff <= previous_eff);
                previous_labor = labor;
                previous_eff = eff;
            }
        }
    }

    #[test]
    fn labor_force_never_exceeds_healthy() {
        assert_eq!(labor_force(100, 0.75), 75);
        assert_eq!(labor_force(100, 1.5), 100);
        assert_eq!(labor_force(0, 1.0), 0);
    }

    #[test]
    fn production_is_bottlenecked_by_scarcer_input() {
        let settings = ResourceSettings::default();

        // мало рабочих: упор в труд (100·0.5·1.2·1.0 = 60)
        let labor_bound = resource_output("food", 10_000, 100, 1.0, &settings).unwrap();
        assert!((labor_bound - 60.0).abs() < 1e-9);

        // маленькая ёмкость: упор в инфраструктуру (10·1.0)
        let infra_bound = resource_output("food", 10, 100_000, 1.0, &settings).unwrap();
        assert!((infra_bound - 10.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_resource_is_a_configuration_error() {
        let settings = ResourceSettings::default();
        assert!(matches!(
            resource_output("oil", 10, 10, 1.0, &settings),
            Err(GenerationError::MissingConfig { .. })
        ));
        assert!(consumption_demand("oil", 10, &settings).is_err());
    }

    #[test]
    fn starvation_split_conserves_vulnerable_population() {
        let settings = SettlementSettings::default();
        for (demand, supply) in [(100.0, 100.0), (100.0, 50.0), (100.0, 0.0), (0.0, 0.0)] {
            let split = starvation_split(1000, 613, demand, supply, &settings);
            assert_eq!(split.starving + split.injured, 1000 - 613);
        }
    }

    #[test]
    fn no_starvation_below_recovery_threshold() {
        let settings = SettlementSettings::default();
        let split = starvation_split(500, 300, 100.0, 95.0, &settings);
        assert_eq!(split.starving, 0);
        assert_eq!(split.injured, 200);
    }

    #[test]
    fn famine_is_capped_at_max_fraction() {
        let settings = SettlementSettings::default();
        let split = starvation_split(1100, 100, 100.0, 0.0, &settings);
        assert_eq!(split.starving, 800);
        assert_eq!(split.injured, 200);
    }

    #[test]
    fn stock_stays_within_capacity() {
        let constants = GenerationConstants::default();
        for seed in 0..50 {
            let (capacity, current) = draw_stock(seed, "town", "water", &constants).unwrap();
            assert!(constants.resource.capacity["town"]["water"].contains(capacity));
            assert!(current >= 0.0 && current <= f64::from(capacity));
        }
    }

    #[test]
    fn stock_is_independent_of_other_resources() {
        let constants = GenerationConstants::default();
        let mut reordered = constants.clone();
        reordered.resource.types.reverse();
        assert_eq!(
            draw_stock(9, "village", "food", &constants).unwrap(),
            draw_stock(9, "village", "food", &reordered).unwrap()
        );
    }
}
