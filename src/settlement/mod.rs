// src/settlement/mod.rs
//! Генерация поселения
//!
//! Поселение выводится из собственного сида и контекста области (изоляция, стоимость
//! перемещения, опасность). Шаги идут строго по порядку, каждый использует результаты
//! предыдущих:
//!
//! 1. возраст и его доля в диапазоне (`age_ratio`)
//! 2. население, ограниченное возрастом (`pop_ratio`)
//! 3. изоляция `connection_friction = isolation · traversal_cost`
//! 4. архетип ([`archetype`])
//! 5. ёмкости ресурсов
//! 6. стабильность, здоровое население, мораль
//! 7. рабочая сила
//! 8. учреждения ([`institution`])
//! 9. вычет учреждений из рабочей силы
//! 10. производственный потенциал — только после шага 9
//! 11. спрос
//! 12. голодающие и раненые
//! 13. постройки ([`crate::structure`])
//!
//! Готовая запись больше не пересчитывается и не изменяется.

pub mod archetype;
pub mod economy;
pub mod institution;
pub mod pressure;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{GenerationConstants, lookup};
use crate::error::GenerationError;
use crate::structure::{Structure, StructureContext, generate_structures};
use crate::weighted::{clamp01, rng_from_seed};

use archetype::{ArchetypeDrivers, select_archetype};
use economy::HealthSplit;
pub use institution::Institution;
use institution::{InstitutionDrivers, effective_labor_force, generate_institutions};
use pressure::{PressureInputs, derive_pressures};

/// Контекст области, в которой стоит поселение
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaContext {
    pub isolation: f64,
    pub traversal_cost: f64,
    pub danger: f64,
}

impl AreaContext {
    /// Насколько поселение отрезано от мира: `isolation · traversal_cost`
    #[must_use]
    pub fn connection_friction(&self) -> f64 {
        clamp01(self.isolation * self.traversal_cost)
    }
}

/// Население поселения
///
/// # Гарантии
/// - `healthy + injured + starving == total`
/// - `available_labor <= healthy`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    pub total: u32,
    pub healthy: u32,
    pub injured: u32,
    pub starving: u32,
    pub morale: f64,
    /// Рабочая сила после вычета учреждений
    pub available_labor: u32,
}

/// Состояние одного ресурса
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub capacity: u32,
    /// Начальный запас, `0 <= current <= capacity`
    pub current: f64,
    pub production_capacity: f64,
    pub consumption_demand: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub id: u64,
    pub age: u32,
    #[serde(rename = "type")]
    pub settlement_type: String,
    pub connection_friction: f64,
    pub stability_factor: f64,
    pub population: Population,
    pub resources: BTreeMap<String, ResourceState>,
    pub pressures: BTreeMap<String, f64>,
    pub institutions: Vec<Institution>,
    pub structures: Vec<Structure>,
}

/// `clamp01(age_ratio·0.6 + (1 − friction)·0.4)`
#[must_use]
pub fn stability_factor(age_ratio: f64, friction: f64) -> f64 {
    clamp01(age_ratio * 0.6 + (1.0 - friction) * 0.4)
}

/// Генерирует поселение по сиду и контексту области
pub fn generate_settlement(
    seed: u64,
    area: &AreaContext,
    constants: &GenerationConstants,
) -> Result<Settlement, GenerationError> {
    let settings = &constants.settlement;
    let mut rng = rng_from_seed(seed);

    // === 1. Возраст ===
    let age = settings.age.sample(&mut rng);
    let age_ratio = settings.age.ratio(age);

    // === 2. Население, ограниченное возрастом ===
    let population_bounds = settings.population.widen();
    let pop_ceiling =
        population_bounds.min + age_ratio * (population_bounds.max - population_bounds.min);
    let base_population = settings
        .population
        .capped_at(pop_ceiling.floor() as u32)
        .sample(&mut rng);
    let pop_ratio = settings.population.ratio(base_population);

    // === 3. Изоляция ===
    let connection_friction = area.connection_friction();

    // === 4. Архетип ===
    let drivers = ArchetypeDrivers {
        age_ratio,
        pop_ratio,
        connection_friction,
    };
    let settlement_type = select_archetype(&drivers, settings, &mut rng)?.to_string();

    // === 5. Ёмкости ресурсов ===
    let mut stocks = Vec::with_capacity(constants.resource.types.len());
    for resource in &constants.resource.types {
        let (capacity, current) = economy::draw_stock(seed, &settlement_type, resource, constants)?;
        stocks.push((resource.as_str(), capacity, current));
    }

    // === 6. Стабильность и здоровье ===
    let stability = stability_factor(age_ratio, connection_friction);
    let healthy = ((f64::from(base_population) * stability).floor() as u32).min(base_population);
    let health_ratio = if base_population == 0 {
        0.0
    } else {
        f64::from(healthy) / f64::from(base_population)
    };
    let morale = clamp01(stability * 0.5 + health_ratio * 0.5);

    // === 7. Рабочая сила ===
    let multiplier = economy::labor_multiplier(age_ratio, connection_friction, settings);
    let labor_force = economy::labor_force(healthy, multiplier);

    // === 8. Учреждения ===
    let institution_drivers = InstitutionDrivers {
        age_ratio,
        pop_ratio,
        stability,
    };
    let institutions = generate_institutions(
        seed,
        &settlement_type,
        &institution_drivers,
        constants,
        &mut rng,
    )?;

    // === 9. Вычет учреждений — до производства ===
    let effective_labor =
        effective_labor_force(labor_force, &institutions, &constants.institution)?;

    // === 10–11. Производство и спрос ===
    let base_efficiency = lookup(
        &settings.base_efficiency,
        "settlement.base_efficiency",
        &settlement_type,
    )?;
    let efficiency =
        economy::production_efficiency(*base_efficiency, age_ratio, connection_friction, settings);

    let mut production = BTreeMap::new();
    let mut demand = BTreeMap::new();
    let mut resources = BTreeMap::new();
    for (resource, capacity, current) in stocks {
        let output = economy::resource_output(
            resource,
            capacity,
            effective_labor,
            efficiency,
            &constants.resource,
        )?;
        let wanted = economy::consumption_demand(resource, base_population, &constants.resource)?;

        production.insert(resource.to_string(), output);
        demand.insert(resource.to_string(), wanted);
        resources.insert(
            resource.to_string(),
            ResourceState {
                capacity,
                current,
                production_capacity: output,
                consumption_demand: wanted,
            },
        );
    }

    // === 12. Голод ===
    let food = constants.resource.food_resource.as_str();
    let food_demand = lookup(&demand, "resource.types", food)?;
    let food_supply = lookup(&production, "resource.types", food)?;
    let HealthSplit { starving, injured } =
        economy::starvation_split(base_population, healthy, *food_demand, *food_supply, settings);

    let starving_share = if base_population == 0 {
        0.0
    } else {
        f64::from(starving) / f64::from(base_population)
    };
    let unmet = economy::unmet_ratios(&production, &demand);
    let pressures = derive_pressures(
        &PressureInputs {
            morale,
            stability,
            starving_share,
            unmet_ratios: &unmet,
            institutions: &institutions,
        },
        &constants.pressure,
    )?;

    // === 13. Постройки ===
    let structures = generate_structures(
        seed,
        &StructureContext {
            settlement_type: &settlement_type,
            production: &production,
            age,
            danger: area.danger,
        },
        constants,
        &mut rng,
    )?;

    debug!(
        settlement = seed,
        kind = %settlement_type,
        population = base_population,
        institutions = institutions.len(),
        structures = structures.len(),
        "поселение сгенерировано"
    );

    Ok(Settlement {
        id: seed,
        age,
        settlement_type,
        connection_friction,
        stability_factor: stability,
        population: Population {
            total: base_population,
            healthy,
            injured,
            starving,
            morale,
            available_labor: effective_labor.min(healthy),
        },
        resources,
        pressures,
        institutions,
        structures,
    })
}
