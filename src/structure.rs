// src/structure.rs
//! Генерация построек и комнат
//!
//! Количество, типы и масштаб построек берутся из потока поселения, который передаётся
//! явно. Комнаты каждой постройки живут в собственных потоках (`room:<сид постройки>:<i>`).
//!
//! Состояние постройки не случайно: это износ от опасности области,
//! `condition = clamp(1 − danger · STRUCTURE_DANGER_CONDITION_WEIGHT)`.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::config::{Bounds, GenerationConstants, lookup};
use crate::error::GenerationError;
use crate::seeds::{room_seed, structure_seed};
use crate::weighted::rng_from_seed;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: u64,
    #[serde(rename = "type")]
    pub room_type: String,
    pub size: String,
    pub resource_bias: f64,
    pub danger_bias: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub id: u64,
    #[serde(rename = "type")]
    pub structure_type: String,
    pub condition: f64,
    pub scale: f64,
    pub rooms: Vec<Room>,
}

/// Данные поселения, от которых зависят его постройки
#[derive(Debug, Clone, Copy)]
pub struct StructureContext<'a> {
    pub settlement_type: &'a str,
    /// Производственный потенциал по ресурсам
    pub production: &'a BTreeMap<String, f64>,
    pub age: u32,
    pub danger: f64,
}

/// Генерирует постройки поселения.
///
/// Масштаб каждой постройки — доля производства её профильного ресурса плюс случайная
/// поправка, увеличенная для старых поселений и ограниченная `structure.scale`.
pub fn generate_structures<R: Rng + ?Sized>(
    settlement_seed: u64,
    context: &StructureContext<'_>,
    constants: &GenerationConstants,
    rng: &mut R,
) -> Result<Vec<Structure>, GenerationError> {
    let settings = &constants.structure;
    let range = lookup(&settings.count, "structure.count", context.settlement_type)?;
    let count = range
        .sample(rng)
        .clamp(settings.count_limits.min, settings.count_limits.max);

    let total_output: f64 = context.production.values().sum();
    let age_ratio = constants.settlement.age.ratio(context.age);

    let mut structures = Vec::with_capacity(count as usize);
    for index in 0..count as usize {
        let structure_type = settings
            .types
            .choose(rng)
            .ok_or_else(|| GenerationError::missing("structure.types", "<any>"))?;

        let resource = lookup(
            &settings.resource_affinity,
            "structure.resource_affinity",
            structure_type,
        )?;
        let potential = lookup(context.production, "settlement.production", resource)?;
        let share = if total_output > 0.0 {
            potential / total_output
        } else {
            0.0
        };

        let variance = if settings.scale_variance > 0.0 {
            rng.gen_range(-settings.scale_variance..=settings.scale_variance)
        } else {
            0.0
        };
        let scale = settings
            .scale
            .clamp((0.5 + share + variance) * (1.0 + age_ratio * settings.age_scale_weight));

        structures.push(generate_structure(
            structure_seed(settlement_seed, index),
            structure_type,
            scale,
            context.danger,
            constants,
        )?);
    }

    Ok(structures)
}

/// Строит одну постройку с комнатами.
///
/// Комнат `max(1, round(scale · ROOMS_PER_STRUCTURE_UNIT))`, в пределах `room.count`.
pub fn generate_structure(
    seed: u64,
    structure_type: &str,
    scale: f64,
    danger: f64,
    constants: &GenerationConstants,
) -> Result<Structure, GenerationError> {
    let settings = &constants.structure;

    let condition = settings
        .condition
        .clamp(1.0 - danger * settings.danger_condition_weight);

    let room_count = ((scale * settings.rooms_per_unit).round().max(1.0) as u32)
        .clamp(constants.room.count.min, constants.room.count.max);

    let rooms = (0..room_count as usize)
        .map(|index| generate_room(room_seed(seed, index), structure_type, danger, constants))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Structure {
        id: seed,
        structure_type: structure_type.to_string(),
        condition,
        scale,
        rooms,
    })
}

/// Генерирует комнату: тип из допустимых для постройки, размер и смещения — равномерно.
///
/// `danger_bias` тянется из `[danger_bias.min, danger]`, так что в опасных областях
/// и комнаты опаснее.
pub fn generate_room(
    seed: u64,
    structure_type: &str,
    danger: f64,
    constants: &GenerationConstants,
) -> Result<Room, GenerationError> {
    let settings = &constants.room;
    let mut rng = rng_from_seed(seed);

    let room_type = constants
        .room_types_for(structure_type)?
        .choose(&mut rng)
        .ok_or_else(|| GenerationError::missing("room.types_by_structure", structure_type))?
        .clone();
    let size = settings
        .sizes
        .choose(&mut rng)
        .ok_or_else(|| GenerationError::missing("room.sizes", "<any>"))?
        .clone();

    let resource_bias = settings.resource_bias.sample(&mut rng);
    let danger_ceiling = settings.danger_bias.clamp(danger);
    let danger_bias = Bounds::new(settings.danger_bias.min, danger_ceiling).sample(&mut rng);

    Ok(Room {
        id: seed,
        room_type,
        size,
        resource_bias,
        danger_bias,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weighted::rng_from_seed;

    fn production() -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("water".to_string(), 300.0),
            ("food".to_string(), 200.0),
            ("scrap".to_string(), 20.0),
        ])
    }

    #[test]
    fn condition_comes_from_danger_only() {
        let constants = GenerationConstants::default();
        for seed in 0..10 {
            let s = generate_structure(seed, "civic", 1.0, 0.5, &constants).unwrap();
            assert!((s.condition - 0.6).abs() < 1e-12);
        }
        let ruined = generate_structure(1, "civic", 1.0, 1.0, &constants).unwrap();
        assert!((ruined.condition - 0.2).abs() < 1e-12);
    }

    #[test]
    fn room_count_follows_scale_with_floor_of_one() {
        let constants = GenerationConstants::default();
        let tiny = generate_structure(1, "storage", 0.01, 0.0, &constants).unwrap();
        assert_eq!(tiny.rooms.len(), 1);

        let large = generate_structure(1, "storage", 2.0, 0.0, &constants).unwrap();
        assert_eq!(large.rooms.len(), 8);
    }

    #[test]
    fn rooms_use_legal_types_for_structure() {
        let constants = GenerationConstants::default();
        for kind in &constants.structure.types {
            let legal = constants.room_types_for(kind).unwrap();
            let s = generate_structure(42, kind, 3.0, 0.7, &constants).unwrap();
            for room in &s.rooms {
                assert!(legal.contains(&room.room_type));
                assert!(constants.room.sizes.contains(&room.size));
                assert!((0.0..=1.0).contains(&room.resource_bias));
                assert!(room.danger_bias >= 0.0 && room.danger_bias <= 0.7);
            }
        }
    }

    #[test]
    fn sibling_rooms_get_distinct_ids() {
        let constants = GenerationConstants::default();
        let s = generate_structure(9, "residential", 3.0, 0.1, &constants).unwrap();
        let mut ids: Vec<u64> = s.rooms.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), s.rooms.len());
    }

    #[test]
    fn structures_respect_type_bounds_and_scale() {
        let constants = GenerationConstants::default();
        let production = production();
        for seed in 0..50 {
            let context = StructureContext {
                settlement_type: "town",
                production: &production,
                age: 150,
                danger: 0.3,
            };
            let structures =
                generate_structures(seed, &context, &constants, &mut rng_from_seed(seed)).unwrap();

            let count = u32::try_from(structures.len()).unwrap();
            assert!(constants.structure.count["town"].contains(count));
            for s in &structures {
                assert!(constants.structure.scale.contains(s.scale));
                assert!(constants.room.count.contains(u32::try_from(s.rooms.len()).unwrap()));
            }
        }
    }

    #[test]
    fn unknown_structure_type_has_no_rooms_table() {
        let constants = GenerationConstants::default();
        assert!(matches!(
            generate_room(1, "temple", 0.0, &constants),
            Err(GenerationError::MissingConfig { .. })
        ));
    }
}
