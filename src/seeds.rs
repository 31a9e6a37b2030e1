// src/seeds.rs
//! Детерминированное расширение сида
//!
//! Вся процедурная вариативность мира происходит отсюда. Сид каждой сущности — односторонний
//! хэш (SHA-256) её ключа происхождения: `"<пространство>:<сид родителя>:<локальный индекс>"`.
//! Сиды соседних сущностей статистически независимы, хотя ключи имеют общий префикс,
//! а разделитель `:` исключает коллизии ключей, отличающихся только индексом.
//!
//! Модуль не хранит состояния: одинаковый ключ даёт одинаковый сид в любом процессе.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::error::GenerationError;

/// Разделитель частей ключа происхождения
pub const KEY_DELIMITER: char = ':';

/// Пространство имён ключа происхождения
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedNamespace {
    World,
    Area,
    Settlement,
    Structure,
    Room,
    Institution,
    Resource,
}

impl SeedNamespace {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SeedNamespace::World => "world",
            SeedNamespace::Area => "area",
            SeedNamespace::Settlement => "settlement",
            SeedNamespace::Structure => "structure",
            SeedNamespace::Room => "room",
            SeedNamespace::Institution => "institution",
            SeedNamespace::Resource => "resource",
        }
    }
}

impl fmt::Display for SeedNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Превращает ключ происхождения в стабильный 64-битный сид.
///
/// Сид — первые 8 байт SHA-256 от UTF-8 ключа, прочитанные как big-endian.
///
/// # Пример
/// ```
/// use worldgen::seeds::derive_seed;
/// assert_eq!(derive_seed("settlement:1:0"), derive_seed("settlement:1:0"));
/// assert_ne!(derive_seed("settlement:1:0"), derive_seed("settlement:1:1"));
/// ```
#[must_use]
pub fn derive_seed(lineage_key: &str) -> u64 {
    let digest = Sha256::digest(lineage_key.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

/// Собирает ключ происхождения `"<пространство>:<родитель>:<индекс>"`
#[must_use]
pub fn lineage_key(
    namespace: SeedNamespace,
    parent: impl fmt::Display,
    index: impl fmt::Display,
) -> String {
    format!("{namespace}{KEY_DELIMITER}{parent}{KEY_DELIMITER}{index}")
}

/// Сид дочерней сущности по сиду родителя и локальному индексу
#[must_use]
pub fn child_seed(namespace: SeedNamespace, parent: u64, index: usize) -> u64 {
    derive_seed(&lineage_key(namespace, parent, index))
}

/// Сид потока случайных чисел верхнего уровня: `"world:<root>"`
#[must_use]
pub fn world_stream_seed(root_seed: i64) -> u64 {
    derive_seed(&format!("{}{KEY_DELIMITER}{root_seed}", SeedNamespace::World))
}

#[must_use]
pub fn area_seed(root_seed: i64, index: usize) -> u64 {
    derive_seed(&lineage_key(SeedNamespace::Area, root_seed, index))
}

#[must_use]
pub fn settlement_seed(area_seed: u64, index: usize) -> u64 {
    child_seed(SeedNamespace::Settlement, area_seed, index)
}

#[must_use]
pub fn structure_seed(settlement_seed: u64, index: usize) -> u64 {
    child_seed(SeedNamespace::Structure, settlement_seed, index)
}

#[must_use]
pub fn room_seed(structure_seed: u64, index: usize) -> u64 {
    child_seed(SeedNamespace::Room, structure_seed, index)
}

/// `"institution:<сид поселения>:<тип>:<индекс>"` — тип входит в ключ,
/// чтобы учреждения разных типов на одном индексе не делили поток
#[must_use]
pub fn institution_seed(settlement_seed: u64, institution_type: &str, index: usize) -> u64 {
    derive_seed(&format!(
        "{}{KEY_DELIMITER}{settlement_seed}{KEY_DELIMITER}{institution_type}{KEY_DELIMITER}{index}",
        SeedNamespace::Institution
    ))
}

/// `"resource:<сид поселения>:<ресурс>"`
#[must_use]
pub fn resource_seed(settlement_seed: u64, resource: &str) -> u64 {
    derive_seed(&lineage_key(SeedNamespace::Resource, settlement_seed, resource))
}

/// Разбирает сид мира на границе системы.
///
/// Принимаются только целые числа (с необязательным знаком); всё остальное
/// отклоняется до начала генерации.
pub fn parse_world_seed(input: &str) -> Result<i64, GenerationError> {
    input
        .trim()
        .parse::<i64>()
        .map_err(|err| GenerationError::InvalidSeed {
            input: input.to_string(),
            reason: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_leading_sha256_digits() {
        // sha256("abc") = ba7816bf8f01cfea...
        assert_eq!(derive_seed("abc"), 0xba78_16bf_8f01_cfea);
    }

    #[test]
    fn lineage_keys_use_fixed_delimiter() {
        assert_eq!(lineage_key(SeedNamespace::Room, 17_u64, 3), "room:17:3");
        assert_eq!(
            lineage_key(SeedNamespace::Resource, 5_u64, "food"),
            "resource:5:food"
        );
    }

    #[test]
    fn siblings_and_namespaces_do_not_collide() {
        let parent = derive_seed("world:42");
        let a = settlement_seed(parent, 1);
        let b = settlement_seed(parent, 11);
        let c = structure_seed(parent, 1);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(
            institution_seed(parent, "civic", 0),
            institution_seed(parent, "archive", 0)
        );
    }

    #[test]
    fn negative_root_seeds_are_distinct() {
        assert_ne!(world_stream_seed(-1), world_stream_seed(1));
        assert_ne!(area_seed(-1, 0), area_seed(1, 0));
    }

    #[test]
    fn parses_integer_seeds_only() {
        assert_eq!(parse_world_seed("42").unwrap(), 42);
        assert_eq!(parse_world_seed(" -7 ").unwrap(), -7);
        assert!(matches!(
            parse_world_seed("4.2"),
            Err(GenerationError::InvalidSeed { .. })
        ));
        assert!(parse_world_seed("forty-two").is_err());
        assert!(parse_world_seed("").is_err());
    }
}
