// src/settlement/institution.rs
//! Учреждения поселения и их нагрузка на рабочую силу

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{GenerationConstants, InstitutionSettings, lookup};
use crate::error::GenerationError;
use crate::seeds::institution_seed;
use crate::weighted::{clamp01, rng_from_seed, weighted_choice_or_first};

const COUNT_AGE_WEIGHT: f64 = 0.3;
const COUNT_POP_WEIGHT: f64 = 0.4;
const COUNT_STABILITY_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institution {
    #[serde(rename = "type")]
    pub institution_type: String,
    pub condition: f64,
    pub power: f64,
    pub legitimacy: f64,
}

/// Состояние поселения, из которого выводятся учреждения
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstitutionDrivers {
    pub age_ratio: f64,
    pub pop_ratio: f64,
    pub stability: f64,
}

/// Количество учреждений растёт со смесью возраста, населения и стабильности
#[must_use]
pub fn institution_count(drivers: &InstitutionDrivers, settings: &InstitutionSettings) -> u32 {
    let score = clamp01(
        drivers.age_ratio * COUNT_AGE_WEIGHT
            + drivers.pop_ratio * COUNT_POP_WEIGHT
            + drivers.stability * COUNT_STABILITY_WEIGHT,
    );
    let count = (score * f64::from(settings.count.max)).round() as u32;
    count.clamp(settings.count.min, settings.count.max)
}

/// Генерирует учреждения поселения.
///
/// Тип каждого учреждения выбирается из таблицы склонностей архетипа тем же
/// кумулятивным броском, что и архетип (поток поселения). Состояние, власть и
/// легитимность — смеси базового значения учреждения со стабильностью и населением;
/// базовое значение берётся из собственного потока учреждения.
pub fn generate_institutions<R: Rng + ?Sized>(
    settlement_seed: u64,
    settlement_type: &str,
    drivers: &InstitutionDrivers,
    constants: &GenerationConstants,
    rng: &mut R,
) -> Result<Vec<Institution>, GenerationError> {
    let settings = &constants.institution;
    let bias = lookup(&settings.bias, "institution.bias", settlement_type)?;

    let candidates = settings
        .types
        .iter()
        .map(|kind| Ok((kind.as_str(), *lookup(bias, "institution.bias", kind)?)))
        .collect::<Result<Vec<_>, GenerationError>>()?;

    let count = institution_count(drivers, settings) as usize;
    let mut institutions = Vec::with_capacity(count);

    for index in 0..count {
        let kind = weighted_choice_or_first(&candidates, rng)
            .copied()
            .ok_or_else(|| GenerationError::missing("institution.types", "<any>"))?;
        institutions.push(build_institution(
            settlement_seed,
            kind,
            index,
            drivers,
            settings,
        )?);
    }

    Ok(institutions)
}

fn build_institution(
    settlement_seed: u64,
    kind: &str,
    index: usize,
    drivers: &InstitutionDrivers,
    settings: &InstitutionSettings,
) -> Result<Institution, GenerationError> {
    let base_power = lookup(&settings.base_power, "institution.base_power", kind)?;

    let mut rng = rng_from_seed(institution_seed(settlement_seed, kind, index));
    let base: f64 = rng.gen_range(0.0..=1.0);

    let condition = clamp01(base * 0.5 + drivers.stability * 0.5);
    let power = (base_power * (0.5 + base * 0.5) * (0.75 + drivers.pop_ratio * 0.5)).max(0.0);
    let legitimacy = clamp01(base * 0.3 + condition * 0.4 + drivers.stability * 0.3);

    Ok(Institution {
        institution_type: kind.to_string(),
        condition,
        power,
        legitimacy,
    })
}

/// Рабочая сила, оставшаяся после учреждений.
///
/// Нагрузка `Σ power · labor_cost_factor` ограничена долей `labor_cap_ratio` от
/// рабочей силы. Производство считается только от этого остатка.
pub fn effective_labor_force(
    labor_force: u32,
    institutions: &[Institution],
    settings: &InstitutionSettings,
) -> Result<u32, GenerationError> {
    let mut overhead = 0.0;
    for institution in institutions {
        let factor = lookup(
            &settings.labor_cost_factor,
            "institution.labor_cost_factor",
            &institution.institution_type,
        )?;
        overhead += institution.power * factor;
    }

    let cap = f64::from(labor_force) * clamp01(settings.labor_cap_ratio);
    let drawn = overhead.clamp(0.0, cap);
    let remaining = (f64::from(labor_force) - drawn).floor().max(0.0) as u32;

    Ok(remaining.min(labor_force))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weighted::rng_from_seed;

    fn drivers(age_ratio: f64, pop_ratio: f64, stability: f64) -> InstitutionDrivers {
        InstitutionDrivers {
            age_ratio,
            pop_ratio,
            stability,
        }
    }

    #[test]
    fn count_scales_with_blend_and_stays_bounded() {
        let settings = InstitutionSettings::default();
        assert_eq!(institution_count(&drivers(0.0, 0.0, 0.0), &settings), 0);
        assert_eq!(institution_count(&drivers(1.0, 1.0, 1.0), &settings), 6);
        assert_eq!(institution_count(&drivers(0.5, 0.5, 0.5), &settings), 3);
    }

    #[test]
    fn institutions_are_reproducible_and_in_range() {
        let constants = GenerationConstants::default();
        let d = drivers(0.9, 0.8, 0.7);

        let generate = || {
            generate_institutions(77, "city", &d, &constants, &mut rng_from_seed(1)).unwrap()
        };
        let first = generate();
        let second = generate();
        assert_eq!(first, second);
        assert!(!first.is_empty());

        for institution in &first {
            assert!(constants.institution.types.contains(&institution.institution_type));
            assert!((0.0..=1.0).contains(&institution.condition));
            assert!((0.0..=1.0).contains(&institution.legitimacy));
            assert!(institution.power >= 0.0);
        }
    }

    #[test]
    fn zero_bias_types_are_never_drawn() {
        let mut constants = GenerationConstants::default();
        let bias = constants.institution.bias.get_mut("town").unwrap();
        for (kind, weight) in bias.iter_mut() {
            *weight = if kind == "archive" { 1.0 } else { 0.0 };
        }

        let institutions = generate_institutions(
            3,
            "town",
            &drivers(1.0, 1.0, 1.0),
            &constants,
            &mut rng_from_seed(8),
        )
        .unwrap();
        assert!(institutions.iter().all(|i| i.institution_type == "archive"));
    }

    #[test]
    fn overhead_is_capped_and_never_negative() {
        let settings = InstitutionSettings::default();
        let heavy = vec![
            Institution {
                institution_type: "enforcement".to_string(),
                condition: 1.0,
                power: 100.0,
                legitimacy: 1.0,
            };
            3
        ];

        // 100 рабочих, предел 20% → остаётся 80
        assert_eq!(effective_labor_force(100, &heavy, &settings).unwrap(), 80);
        assert_eq!(effective_labor_force(0, &heavy, &settings).unwrap(), 0);
        assert_eq!(effective_labor_force(100, &[], &settings).unwrap(), 100);
    }

    #[test]
    fn light_overhead_is_subtracted_in_full() {
        let settings = InstitutionSettings::default();
        let archive = Institution {
            institution_type: "archive".to_string(),
            condition: 1.0,
            power: 1.0,
            legitimacy: 1.0,
        };
        // 1.0 · 4.0 работника
        assert_eq!(effective_labor_force(100, &[archive], &settings).unwrap(), 96);
    }
}
