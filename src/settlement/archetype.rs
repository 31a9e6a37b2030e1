// src/settlement/archetype.rs
//! Выбор архетипа поселения
//!
//! Вес каждого типа — замкнутая формула от трёх факторов: относительного возраста,
//! относительного населения и изоляции (`connection_friction`). Профиль типа говорит,
//! как каждый фактор входит в произведение (см. [`ArchetypeProfile`]):
//! - `hamlet` любит молодые, маленькие и отрезанные поселения
//! - `town` любит старые, крупные и связанные
//! - `city` — квадрат того же произведения, что и `town`

use rand::Rng;

use crate::config::{Affinity, ArchetypeProfile, SettlementSettings, lookup};
use crate::error::GenerationError;
use crate::weighted::weighted_choice_or_first;

/// Факторы, от которых зависит вес архетипа
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArchetypeDrivers {
    pub age_ratio: f64,
    pub pop_ratio: f64,
    pub connection_friction: f64,
}

fn axis(affinity: Affinity, value: f64) -> f64 {
    match affinity {
        Affinity::Favors => value,
        Affinity::Disfavors => 1.0 - value,
        Affinity::Neutral => 1.0,
    }
}

/// Неотрицательный вес одного архетипа
#[must_use]
pub fn archetype_weight(profile: &ArchetypeProfile, drivers: &ArchetypeDrivers) -> f64 {
    let product = axis(profile.age, drivers.age_ratio)
        * axis(profile.population, drivers.pop_ratio)
        * axis(profile.friction, drivers.connection_friction);
    let weight = profile.scale * product.max(0.0).powf(profile.exponent);

    if weight.is_finite() { weight.max(0.0) } else { 0.0 }
}

/// Веса всех объявленных типов в порядке объявления
pub fn archetype_weights<'a>(
    drivers: &ArchetypeDrivers,
    settings: &'a SettlementSettings,
) -> Result<Vec<(&'a str, f64)>, GenerationError> {
    settings
        .types
        .iter()
        .map(|kind| {
            let profile = lookup(&settings.archetypes, "settlement.archetypes", kind)?;
            Ok((kind.as_str(), archetype_weight(profile, drivers)))
        })
        .collect()
}

/// Выбирает архетип одним броском по кумулятивным весам.
///
/// Если все веса нулевые и бросок не разрешился, берётся первый объявленный тип.
pub fn select_archetype<'a, R: Rng + ?Sized>(
    drivers: &ArchetypeDrivers,
    settings: &'a SettlementSettings,
    rng: &mut R,
) -> Result<&'a str, GenerationError> {
    let weights = archetype_weights(drivers, settings)?;
    weighted_choice_or_first(&weights, rng)
        .copied()
        .ok_or_else(|| GenerationError::missing("settlement.types", "<any>"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weighted::rng_from_seed;

    fn drivers(age_ratio: f64, pop_ratio: f64, connection_friction: f64) -> ArchetypeDrivers {
        ArchetypeDrivers {
            age_ratio,
            pop_ratio,
            connection_friction,
        }
    }

    fn weight_of(settings: &SettlementSettings, kind: &str, d: &ArchetypeDrivers) -> f64 {
        archetype_weight(&settings.archetypes[kind], d)
    }

    #[test]
    fn hamlet_prefers_young_small_remote() {
        let settings = SettlementSettings::default();
        let remote = drivers(0.1, 0.1, 0.9);
        let central = drivers(0.9, 0.9, 0.1);

        assert!(weight_of(&settings, "hamlet", &remote) > weight_of(&settings, "hamlet", &central));
        assert!(weight_of(&settings, "town", &central) > weight_of(&settings, "town", &remote));
    }

    #[test]
    fn city_is_square_of_town_product() {
        let settings = SettlementSettings::default();
        let d = drivers(0.8, 0.7, 0.2);
        let town = weight_of(&settings, "town", &d);
        let city = weight_of(&settings, "city", &d);
        assert!((city - town * town).abs() < 1e-12);
    }

    #[test]
    fn weights_follow_declaration_order() {
        let settings = SettlementSettings::default();
        let weights = archetype_weights(&drivers(0.5, 0.5, 0.5), &settings).unwrap();
        let order: Vec<&str> = weights.iter().map(|(k, _)| *k).collect();
        assert_eq!(order, ["outpost", "hamlet", "village", "town", "city"]);
        assert!(weights.iter().all(|(_, w)| *w >= 0.0));
    }

    #[test]
    fn all_zero_weights_resolve_to_first_type() {
        let settings = SettlementSettings::default();
        // возраст, население и изоляция равны нулю: все произведения обнуляются
        let d = drivers(0.0, 0.0, 0.0);
        let weights = archetype_weights(&d, &settings).unwrap();
        assert!(weights.iter().all(|(_, w)| *w == 0.0));

        let mut rng = rng_from_seed(5);
        for _ in 0..20 {
            assert_eq!(select_archetype(&d, &settings, &mut rng).unwrap(), "outpost");
        }
    }

    #[test]
    fn missing_profile_is_a_configuration_error() {
        let mut settings = SettlementSettings::default();
        settings.types.push("ruins".to_string());

        let mut rng = rng_from_seed(1);
        let err = select_archetype(&drivers(0.5, 0.5, 0.5), &settings, &mut rng).unwrap_err();
        assert!(matches!(err, GenerationError::MissingConfig { ref key, .. } if key == "ruins"));
    }
}
