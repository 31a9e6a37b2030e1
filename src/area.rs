// src/area.rs
//! Генерация области: стоимость перемещения, опасность, изоляция и поселения

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GenerationConstants;
use crate::error::GenerationError;
use crate::seeds::settlement_seed;
use crate::settlement::{AreaContext, Settlement, generate_settlement};
use crate::weighted::rng_from_seed;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: u64,
    pub seed: u64,
    pub traversal_cost: f64,
    pub danger_level: f64,
    pub isolation: f64,
    pub settlements: Vec<Settlement>,
}

impl Area {
    #[must_use]
    pub fn context(&self) -> AreaContext {
        AreaContext {
            isolation: self.isolation,
            traversal_cost: self.traversal_cost,
            danger: self.danger_level,
        }
    }
}

/// Генерирует область по сиду
///
/// Поселение `i` получает сид `settlement:<сид области>:<i>` и контекст области.
pub fn generate_area(seed: u64, constants: &GenerationConstants) -> Result<Area, GenerationError> {
    let settings = &constants.area;
    let mut rng = rng_from_seed(seed);

    let traversal_cost = settings.traversal_cost.sample(&mut rng);
    let danger_level = settings.danger.sample(&mut rng);
    let isolation = settings.isolation.sample(&mut rng);
    let count = settings.settlements.sample(&mut rng);

    let context = AreaContext {
        isolation,
        traversal_cost,
        danger: danger_level,
    };

    let settlements = (0..count as usize)
        .map(|index| generate_settlement(settlement_seed(seed, index), &context, constants))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        area = seed,
        settlements = settlements.len(),
        danger = danger_level,
        "область сгенерирована"
    );

    Ok(Area {
        id: seed,
        seed,
        traversal_cost,
        danger_level,
        isolation,
        settlements,
    })
}
