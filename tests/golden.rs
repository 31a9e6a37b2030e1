//! Снимок мира для сида 42 закреплён хэшем в `tests/fixtures/seed_42.sha256`.
//!
//! Любое изменение алгоритмов генерации, меняющее мир, ломает этот тест. Если изменение
//! намеренное, хэш в файле обновляется вместе с ним.

use std::fs;
use std::path::PathBuf;

use worldgen::snapshot::canonical_hash;
use worldgen::{GenerationConstants, generate_world};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("seed_42.sha256")
}

#[test]
fn seed_42_matches_golden_hash() {
    let path = fixture_path();
    let expected = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("fixture {} is unreadable: {err}", path.display()));

    let world = generate_world(42, &GenerationConstants::default()).unwrap();
    assert_eq!(
        canonical_hash(&world).unwrap(),
        expected.trim(),
        "world for seed 42 changed"
    );
}

#[test]
fn seed_42_shape_is_fixed() {
    let constants = GenerationConstants::default();

    for _ in 0..3 {
        let world = generate_world(42, &constants).unwrap();
        assert_eq!(world.areas.len(), 3);
        assert_eq!(world.areas[0].settlements.len(), 4);
        assert_eq!(world.areas[0].settlements[0].settlement_type, "village");
    }
}

#[test]
fn changed_rooms_per_unit_changes_the_hash() {
    let expected = fs::read_to_string(fixture_path()).unwrap();

    let mut constants = GenerationConstants::default();
    constants.structure.rooms_per_unit = 5.0;
    let world = generate_world(42, &constants).unwrap();

    assert_ne!(canonical_hash(&world).unwrap(), expected.trim());
}
