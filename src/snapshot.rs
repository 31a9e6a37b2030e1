// src/snapshot.rs
//! Каноническая сериализация мира
//!
//! Канонический вид — JSON с рекурсивно отсортированными ключами и без лишних пробелов.
//! Два мира с одинаковым сидом дают побайтно одинаковый канонический вид и одинаковый хэш.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::world::World;

/// Дерево `serde_json::Value` с отсортированными ключами
pub fn to_value(world: &World) -> Result<Value, serde_json::Error> {
    serde_json::to_value(world).map(sort_keys)
}

/// Канонический JSON (сортировка ключей, разделители `,` и `:`)
pub fn canonical_json(world: &World) -> Result<String, serde_json::Error> {
    serde_json::to_string(&to_value(world)?)
}

/// Тот же канонический вид с отступами, для чтения человеком
pub fn pretty_json(world: &World) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&to_value(world)?)
}

/// SHA-256 канонического JSON в нижнем регистре hex
pub fn canonical_hash(world: &World) -> Result<String, serde_json::Error> {
    Ok(hash_hex(canonical_json(world)?.as_bytes()))
}

#[must_use]
pub fn hash_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// Не полагаемся на порядок Map в serde_json: с фичей preserve_order он бы сохранял порядок вставки.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys(value)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
