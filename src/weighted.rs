// src/weighted.rs
//! Локальные потоки случайных чисел и взвешенный выбор
//!
//! Каждый вызов генератора создаёт собственный поток `ChaCha8Rng` из производного сида
//! и передаёт его явно. Глобального состояния случайности нет, поэтому порядок генерации
//! соседних ветвей не влияет на результат.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Поток случайных чисел одной сущности
pub type WorldRng = ChaCha8Rng;

#[must_use]
pub fn rng_from_seed(seed: u64) -> WorldRng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Ограничение значения отрезком `[0, 1]`
#[must_use]
pub fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Взвешенный выбор по кумулятивной сумме с одним броском.
///
/// Отрицательные веса считаются нулевыми. Веса нормализуются на их сумму; если сумма
/// нулевая, нормализация идёт на `1.0`, чтобы бросок всё равно разрешился. Побеждает
/// первый кандидат в порядке объявления, чья кумулятивная доля `>= броска`.
///
/// Возвращает `None`, если ни одна ветвь не сработала (все веса нулевые и бросок
/// больше нуля); вызывающая сторона сама решает, кого брать по умолчанию.
///
/// # Пример
/// ```
/// use worldgen::weighted::{rng_from_seed, weighted_choice};
/// let mut rng = rng_from_seed(7);
/// let candidates = [("a", 0.0), ("b", 3.0)];
/// let pick = weighted_choice(&candidates, &mut rng);
/// assert_eq!(pick, Some(&"b"));
/// ```
pub fn weighted_choice<'a, K, R>(candidates: &'a [(K, f64)], rng: &mut R) -> Option<&'a K>
where
    R: Rng + ?Sized,
{
    let total: f64 = candidates.iter().map(|(_, w)| w.max(0.0)).sum();
    let total = if total > 0.0 { total } else { 1.0 };

    let roll: f64 = rng.gen_range(0.0..1.0);
    let mut cumulative = 0.0;

    for (candidate, weight) in candidates {
        cumulative += weight.max(0.0) / total;
        if cumulative >= roll {
            return Some(candidate);
        }
    }
    None
}

/// Взвешенный выбор с откатом на первого объявленного кандидата
pub fn weighted_choice_or_first<'a, K, R>(candidates: &'a [(K, f64)], rng: &mut R) -> Option<&'a K>
where
    R: Rng + ?Sized,
{
    weighted_choice(candidates, rng).or_else(|| candidates.first().map(|(k, _)| k))
}
