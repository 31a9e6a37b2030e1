// src/settlement/pressure.rs
//! Начальные давления поселения (без бросков, только из уже выведенного состояния)

use std::collections::BTreeMap;

use crate::config::PressureSettings;
use crate::error::GenerationError;
use crate::settlement::institution::Institution;
use crate::weighted::clamp01;

/// Всё, из чего складываются давления
#[derive(Debug, Clone, Copy)]
pub struct PressureInputs<'a> {
    pub morale: f64,
    pub stability: f64,
    /// Доля голодающих во всём населении
    pub starving_share: f64,
    /// Доля неудовлетворённого спроса по каждому ресурсу
    pub unmet_ratios: &'a [f64],
    pub institutions: &'a [Institution],
}

/// Давление для каждого объявленного типа, ограниченное `pressure.range`
pub fn derive_pressures(
    inputs: &PressureInputs<'_>,
    settings: &PressureSettings,
) -> Result<BTreeMap<String, f64>, GenerationError> {
    let scarcity = mean(inputs.unmet_ratios).unwrap_or(0.0);

    settings
        .types
        .iter()
        .map(|name| {
            let value = match name.as_str() {
                "scarcity" => scarcity,
                "unrest" => {
                    (1.0 - inputs.morale) * 0.5 + scarcity * 0.3 + inputs.starving_share * 0.2
                }
                "legitimacy" => {
                    let values: Vec<f64> =
                        inputs.institutions.iter().map(|i| i.legitimacy).collect();
                    mean(&values).unwrap_or(inputs.stability * 0.5)
                }
                other => return Err(GenerationError::missing("pressure model", other)),
            };
            Ok((name.clone(), settings.range.clamp(clamp01(value))))
        })
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
