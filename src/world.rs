// src/world.rs
//! Сборка мира из одного сида
//!
//! `generate_world` — единственная точка, где генерация может прерваться ошибкой проверки:
//! собранный мир всегда проходит через [`crate::validate::validate_world`] перед возвратом.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::area::{Area, generate_area};
use crate::config::GenerationConstants;
use crate::error::GenerationError;
use crate::seeds::{area_seed, world_stream_seed};
use crate::validate::validate_world;
use crate::weighted::rng_from_seed;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub seed: i64,
    pub areas: Vec<Area>,
}

/// Генерирует и проверяет мир.
///
/// # Ошибки
/// - [`GenerationError::MissingConfig`] / [`GenerationError::InvalidBounds`] — таблица констант
///   несогласована; генерация не начинается
/// - [`GenerationError::Validation`] — собранный мир нарушает инварианты (полный список внутри)
///
/// # Пример
/// ```
/// use worldgen::{GenerationConstants, generate_world};
/// let constants = GenerationConstants::default();
/// let a = generate_world(42, &constants).unwrap();
/// let b = generate_world(42, &constants).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn generate_world(
    seed: i64,
    constants: &GenerationConstants,
) -> Result<World, GenerationError> {
    constants.check()?;

    let world = assemble_world(seed, constants)?;

    if let Err(err) = validate_world(&world, constants) {
        warn!(seed, violations = err.errors.len(), "мир не прошёл проверку");
        return Err(err.into());
    }

    info!(seed, areas = world.areas.len(), "мир сгенерирован");
    Ok(world)
}

/// Собирает мир без проверки.
///
/// Количество областей тянется из потока `world:<seed>`, область `i` получает сид
/// `area:<seed>:<i>`. Ветви независимы, поэтому с фичей `parallel` области строятся
/// параллельно, а результат побайтно совпадает с последовательным.
pub fn assemble_world(
    seed: i64,
    constants: &GenerationConstants,
) -> Result<World, GenerationError> {
    let mut rng = rng_from_seed(world_stream_seed(seed));
    let count = constants.world.areas.sample(&mut rng);

    let seeds: Vec<u64> = (0..count as usize).map(|index| area_seed(seed, index)).collect();

    #[cfg(feature = "parallel")]
    let areas = seeds
        .par_iter()
        .map(|&area| generate_area(area, constants))
        .collect::<Result<Vec<_>, _>>()?;

    #[cfg(not(feature = "parallel"))]
    let areas = seeds
        .iter()
        .map(|&area| generate_area(area, constants))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(World { seed, areas })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Bounds;

    #[test]
    fn area_count_is_bounded() {
        let constants = GenerationConstants::default();
        for seed in [-3, 0, 1, 42, 9_999] {
            let world = generate_world(seed, &constants).unwrap();
            let count = u32::try_from(world.areas.len()).unwrap();
            assert!(constants.world.areas.contains(count));
            assert_eq!(world.seed, seed);
        }
    }

    #[test]
    fn different_seeds_give_different_worlds() {
        let constants = GenerationConstants::default();
        let a = generate_world(1, &constants).unwrap();
        let b = generate_world(2, &constants).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn inconsistent_constants_abort_before_generation() {
        let mut constants = GenerationConstants::default();
        constants.institution.base_power.remove("civic");
        assert!(matches!(
            generate_world(42, &constants),
            Err(GenerationError::MissingConfig { .. })
        ));
    }

    #[test]
    fn narrowed_validation_bounds_surface_as_validation_error() {
        // генерация использует одни пределы, проверка — более узкие
        let constants = GenerationConstants::default();
        let world = assemble_world(7, &constants).unwrap();

        let mut strict = constants.clone();
        strict.world.areas = Bounds::new(100, 200);
        let err = validate_world(&world, &strict).unwrap_err();
        assert!(err.errors.iter().any(|e| e.starts_with("areas count")));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_assembly_matches_sequential() {
        use crate::snapshot::canonical_json;

        let constants = GenerationConstants::default();
        for seed in [-5, 0, 42, 1_000, i64::MAX] {
            let parallel = assemble_world(seed, &constants).unwrap();

            let mut rng = rng_from_seed(world_stream_seed(seed));
            let count = constants.world.areas.sample(&mut rng);
            let sequential = World {
                seed,
                areas: (0..count as usize)
                    .map(|index| generate_area(area_seed(seed, index), &constants))
                    .collect::<Result<_, _>>()
                    .unwrap(),
            };

            assert_eq!(
                canonical_json(&parallel).unwrap(),
                canonical_json(&sequential).unwrap()
            );
        }
    }
}
