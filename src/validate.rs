// src/validate.rs
//! Проверка готового мира
//!
//! Проверка идёт по дереву `serde_json::Value`, а не по типизированным структурам: так она
//! принимает и повреждённые снимки (не то поле, не тот тип, пропущенный ключ) и не падает на них.
//! Все нарушения накапливаются в одном накопителе и возвращаются одним списком.
//!
//! Формат сообщений:
//! - `<путь> is missing.`
//! - `<путь> is not numeric.`
//! - `<путь> out of range [min, max]: значение`
//! - `<путь> count out of range [min, max]: количество`

use serde_json::{Map, Value};

use crate::config::{Bounds, GenerationConstants};
use crate::error::WorldValidationError;
use crate::snapshot;
use crate::world::World;

/// Проверяет сгенерированный мир против таблицы констант
pub fn validate_world(
    world: &World,
    constants: &GenerationConstants,
) -> Result<(), WorldValidationError> {
    match snapshot::to_value(world) {
        Ok(value) => validate_snapshot(&value, constants),
        Err(err) => Err(WorldValidationError {
            errors: vec![format!("world could not be serialized: {err}")],
        }),
    }
}

/// Проверяет произвольный JSON-снимок мира
///
/// # Пример
/// ```
/// use worldgen::{GenerationConstants, validate_snapshot};
/// let err = validate_snapshot(&serde_json::json!({"areas": []}), &GenerationConstants::default())
///     .unwrap_err();
/// assert!(err.errors.contains(&"seed is missing.".to_string()));
/// ```
pub fn validate_snapshot(
    snapshot: &Value,
    constants: &GenerationConstants,
) -> Result<(), WorldValidationError> {
    let mut validator = Validator::new(constants);
    validator.world(snapshot);
    validator.finish()
}

/// Накопитель нарушений
struct Validator<'c> {
    constants: &'c GenerationConstants,
    errors: Vec<String>,
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

impl<'c> Validator<'c> {
    fn new(constants: &'c GenerationConstants) -> Self {
        Self {
            constants,
            errors: Vec::new(),
        }
    }

    fn finish(self) -> Result<(), WorldValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(WorldValidationError {
                errors: self.errors,
            })
        }
    }

    fn report(&mut self, message: String) {
        self.errors.push(message);
    }

    // ---------- примитивы ----------

    fn object<'v>(&mut self, value: &'v Value, label: &str) -> Option<&'v Map<String, Value>> {
        let object = value.as_object();
        if object.is_none() {
            self.report(format!("{label} is not an object."));
        }
        object
    }

    fn field<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        path: &str,
        key: &str,
    ) -> Option<&'v Value> {
        let value = object.get(key);
        if value.is_none() {
            self.report(format!("{} is missing.", join(path, key)));
        }
        value
    }

    fn number(&mut self, object: &Map<String, Value>, path: &str, key: &str) -> Option<f64> {
        let value = self.field(object, path, key)?;
        let number = value.as_f64();
        if number.is_none() {
            self.report(format!("{} is not numeric.", join(path, key)));
        }
        number
    }

    fn range(
        &mut self,
        object: &Map<String, Value>,
        path: &str,
        key: &str,
        bounds: Bounds<f64>,
    ) -> Option<f64> {
        let value = self.number(object, path, key)?;
        if !bounds.contains(value) {
            self.report(format!(
                "{} out of range [{}, {}]: {value}",
                join(path, key),
                bounds.min,
                bounds.max
            ));
        }
        Some(value)
    }

    fn non_negative(&mut self, object: &Map<String, Value>, path: &str, key: &str) -> Option<f64> {
        let value = self.number(object, path, key)?;
        if value < 0.0 {
            self.report(format!("{} is negative: {value}", join(path, key)));
        }
        Some(value)
    }

    /// Неотрицательное целое в пределах `bounds`
    fn integer(
        &mut self,
        object: &Map<String, Value>,
        path: &str,
        key: &str,
        bounds: Bounds<u32>,
    ) -> Option<u64> {
        let value = self.field(object, path, key)?;
        let Some(integer) = value.as_u64() else {
            let label = join(path, key);
            if value.is_number() {
                self.report(format!("{label} is not a non-negative integer: {value}"));
            } else {
                self.report(format!("{label} is not numeric."));
            }
            return None;
        };
        if !u32::try_from(integer).is_ok_and(|v| bounds.contains(v)) {
            self.report(format!(
                "{} out of range [{}, {}]: {integer}",
                join(path, key),
                bounds.min,
                bounds.max
            ));
        }
        Some(integer)
    }

    fn member<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        path: &str,
        key: &str,
        allowed: &[String],
        what: &str,
    ) -> Option<&'v str> {
        let value = self.field(object, path, key)?;
        let label = join(path, key);
        let Some(name) = value.as_str() else {
            self.report(format!("{label} is not a string."));
            return None;
        };
        if !allowed.iter().any(|a| a == name) {
            self.report(format!("{label} is not a declared {what}: {name}"));
            return None;
        }
        Some(name)
    }

    fn array<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        path: &str,
        key: &str,
        count: Bounds<u32>,
    ) -> Option<&'v [Value]> {
        let value = self.field(object, path, key)?;
        let label = join(path, key);
        let Some(items) = value.as_array() else {
            self.report(format!("{label} is not an array."));
            return None;
        };
        let len = u32::try_from(items.len()).unwrap_or(u32::MAX);
        if !count.contains(len) {
            self.report(format!(
                "{label} count out of range [{}, {}]: {}",
                count.min,
                count.max,
                items.len()
            ));
        }
        Some(items)
    }

    // ---------- уровни дерева ----------

    fn world(&mut self, snapshot: &Value) {
        let Some(world) = self.object(snapshot, "world") else {
            return;
        };

        if let Some(seed) = self.field(world, "", "seed")
            && !(seed.is_i64() || seed.is_u64())
        {
            self.report(format!("seed is not an integer: {seed}"));
        }

        let count = self.constants.world.areas;
        if let Some(areas) = self.array(world, "", "areas", count) {
            for (index, area) in areas.iter().enumerate() {
                self.area(area, &format!("areas[{index}]"));
            }
        }
    }

    fn area(&mut self, value: &Value, path: &str) {
        let Some(area) = self.object(value, path) else {
            return;
        };
        let settings = &self.constants.area;
        let (traversal, danger, isolation, count) = (
            settings.traversal_cost,
            settings.danger,
            settings.isolation,
            settings.settlements,
        );

        self.field(area, path, "id");
        self.field(area, path, "seed");
        self.range(area, path, "traversal_cost", traversal);
        self.range(area, path, "danger_level", danger);
        self.range(area, path, "isolation", isolation);

        if let Some(settlements) = self.array(area, path, "settlements", count) {
            for (index, settlement) in settlements.iter().enumerate() {
                self.settlement(settlement, &format!("{path}.settlements[{index}]"));
            }
        }
    }

    fn settlement(&mut self, value: &Value, path: &str) {
        let Some(settlement) = self.object(value, path) else {
            return;
        };
        let constants = self.constants;
        let unit = Bounds::new(0.0, 1.0);

        self.field(settlement, path, "id");
        let settlement_type = self.member(
            settlement,
            path,
            "type",
            &constants.settlement.types,
            "settlement type",
        );
        self.integer(settlement, path, "age", constants.settlement.age);
        self.range(settlement, path, "connection_friction", unit);
        self.range(settlement, path, "stability_factor", unit);

        if let Some(population) = self.field(settlement, path, "population") {
            self.population(population, &join(path, "population"));
        }

        if let Some(resources) = self.field(settlement, path, "resources") {
            self.resources(resources, &join(path, "resources"));
        }

        if let Some(pressures) = self.field(settlement, path, "pressures") {
            self.pressures(pressures, &join(path, "pressures"));
        }

        if let Some(institutions) =
            self.array(settlement, path, "institutions", constants.institution.count)
        {
            for (index, institution) in institutions.iter().enumerate() {
                self.institution(institution, &format!("{path}.institutions[{index}]"));
            }
        }

        let structure_count = settlement_type
            .and_then(|kind| constants.structure.count.get(kind))
            .copied()
            .unwrap_or(constants.structure.count_limits);
        if let Some(structures) = self.array(settlement, path, "structures", structure_count) {
            for (index, structure) in structures.iter().enumerate() {
                self.structure(structure, &format!("{path}.structures[{index}]"));
            }
        }
    }

    fn population(&mut self, value: &Value, path: &str) {
        let Some(population) = self.object(value, path) else {
            return;
        };
        let bounds = self.constants.settlement.population;
        // доли населения могут быть нулевыми при любом минимуме
        let part = Bounds::new(0, bounds.max);

        let total = self.integer(population, path, "total", bounds);
        let healthy = self.integer(population, path, "healthy", part);
        let injured = self.integer(population, path, "injured", part);
        let starving = self.integer(population, path, "starving", part);
        let labor = self.integer(population, path, "available_labor", part);
        self.range(population, path, "morale", Bounds::new(0.0, 1.0));

        if let (Some(total), Some(healthy), Some(injured), Some(starving)) =
            (total, healthy, injured, starving)
        {
            let sum = healthy + injured + starving;
            if sum != total {
                self.report(format!(
                    "{path} does not add up: healthy + injured + starving = {sum}, total = {total}"
                ));
            }
        }
        if let (Some(labor), Some(healthy)) = (labor, healthy)
            && labor > healthy
        {
            self.report(format!(
                "{path}.available_labor exceeds healthy: {labor} > {healthy}"
            ));
        }
    }

    fn resources(&mut self, value: &Value, path: &str) {
        let Some(resources) = self.object(value, path) else {
            return;
        };
        let constants = self.constants;
        let settings = &constants.resource;

        for name in resources.keys() {
            if !settings.types.contains(name) {
                self.report(format!("{path}.{name} is not a declared resource."));
            }
        }

        for name in &settings.types {
            let Some(entry) = self.field(resources, path, name) else {
                continue;
            };
            let label = join(path, name);
            let Some(resource) = self.object(entry, &label) else {
                continue;
            };

            let capacity = self.integer(resource, &label, "capacity", settings.capacity_limits);
            let current = self.non_negative(resource, &label, "current");
            self.non_negative(resource, &label, "production_capacity");
            self.non_negative(resource, &label, "consumption_demand");

            if let (Some(capacity), Some(current)) = (capacity, current)
                && current > capacity as f64
            {
                self.report(format!(
                    "{label}.current exceeds capacity: {current} > {capacity}"
                ));
            }
        }
    }

    fn pressures(&mut self, value: &Value, path: &str) {
        let Some(pressures) = self.object(value, path) else {
            return;
        };
        let constants = self.constants;
        let settings = &constants.pressure;

        for name in pressures.keys() {
            if !settings.types.contains(name) {
                self.report(format!("{path}.{name} is not a declared pressure."));
            }
        }
        for name in &settings.types {
            self.range(pressures, path, name, settings.range);
        }
    }

    fn institution(&mut self, value: &Value, path: &str) {
        let Some(institution) = self.object(value, path) else {
            return;
        };
        let constants = self.constants;
        let unit = Bounds::new(0.0, 1.0);

        self.member(
            institution,
            path,
            "type",
            &constants.institution.types,
            "institution type",
        );
        self.range(institution, path, "condition", unit);
        self.non_negative(institution, path, "power");
        self.range(institution, path, "legitimacy", unit);
    }

    fn structure(&mut self, value: &Value, path: &str) {
        let Some(structure) = self.object(value, path) else {
            return;
        };
        let constants = self.constants;

        self.field(structure, path, "id");
        let structure_type = self.member(
            structure,
            path,
            "type",
            &constants.structure.types,
            "structure type",
        );
        self.range(structure, path, "condition", constants.structure.condition);
        if let Some(scale) = self.range(structure, path, "scale", constants.structure.scale)
            && scale <= 0.0
        {
            self.report(format!("{path}.scale is not positive: {scale}"));
        }

        let legal = structure_type.and_then(|kind| constants.room.types_by_structure.get(kind));
        if let Some(rooms) = self.array(structure, path, "rooms", constants.room.count) {
            for (index, room) in rooms.iter().enumerate() {
                self.room(room, &format!("{path}.rooms[{index}]"), legal.map(Vec::as_slice));
            }
        }
    }

    fn room(&mut self, value: &Value, path: &str, legal: Option<&[String]>) {
        let Some(room) = self.object(value, path) else {
            return;
        };
        let constants = self.constants;
        let settings = &constants.room;

        self.field(room, path, "id");
        match legal {
            Some(types) => {
                self.member(room, path, "type", types, "room type for this structure");
            }
            // тип постройки уже отмечен как неизвестный, здесь достаточно наличия поля
            None => {
                self.field(room, path, "type");
            }
        }
        self.member(room, path, "size", &settings.sizes, "room size");
        self.range(room, path, "resource_bias", settings.resource_bias);
        self.range(room, path, "danger_bias", settings.danger_bias);
    }
}
