// src/config.rs
//! Константы генерации мира
//!
//! Этот модуль определяет всю таблицу констант, управляющую детерминированной генерацией:
//! - Границы количества областей, поселений, учреждений, построек и комнат
//! - Перечисления допустимых типов (поселения, ресурсы, учреждения, давления, постройки, комнаты)
//! - Весовые таблицы архетипов и учреждений
//! - Коэффициенты труда, эффективности, производства и потребления
//!
//! Таблица внедряется в генераторы только для чтения и никогда не изменяется ими.
//! Все структуры поддерживают сериализацию в TOML/JSON: файл конфигурации может
//! переопределить любое подмножество полей, остальные берутся из значений по умолчанию.
//!
//! Все таблицы по типам — `BTreeMap`, поэтому порядок обхода и сериализации стабилен.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, GenerationError};

/// Замкнутый диапазон `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    #[must_use]
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// Проверяет, что `min <= max`
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.min <= self.max
    }

    #[must_use]
    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }
}

impl Bounds<f64> {
    /// Положение значения внутри диапазона, от `0.0` до `1.0`.
    ///
    /// Диапазон нулевой ширины даёт `1.0`, деления на ноль не бывает.
    ///
    /// # Пример
    /// ```
    /// use worldgen::config::Bounds;
    /// assert_eq!(Bounds::new(0.0, 10.0).ratio(5.0), 0.5);
    /// assert_eq!(Bounds::new(3.0, 3.0).ratio(3.0), 1.0);
    /// ```
    #[must_use]
    pub fn ratio(&self, value: f64) -> f64 {
        let width = self.max - self.min;
        if width <= 0.0 {
            return 1.0;
        }
        ((value - self.min) / width).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Равномерная выборка из `[min, max]`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.min..=self.max)
    }
}

impl Bounds<u32> {
    #[must_use]
    pub fn widen(&self) -> Bounds<f64> {
        Bounds::new(f64::from(self.min), f64::from(self.max))
    }

    /// То же, что `ratio` для вещественных диапазонов
    #[must_use]
    pub fn ratio(&self, value: u32) -> f64 {
        self.widen().ratio(f64::from(value))
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.min..=self.max)
    }

    /// Сужает диапазон сверху: `[min, max(min, ceiling)]`
    #[must_use]
    pub fn capped_at(&self, ceiling: u32) -> Self {
        Self::new(self.min, ceiling.clamp(self.min, self.max))
    }
}

/// Как ось (возраст, население, изоляция) влияет на вес архетипа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Affinity {
    /// Множитель `x`
    Favors,
    /// Множитель `1 - x`
    Disfavors,
    /// Множитель `1`
    Neutral,
}

/// Профиль веса архетипа поселения: `scale * (age · population · friction) ^ exponent`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeProfile {
    pub age: Affinity,
    pub population: Affinity,
    pub friction: Affinity,
    #[serde(default = "default_exponent")]
    pub exponent: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_exponent() -> f64 {
    1.0
}
fn default_scale() -> f64 {
    1.0
}

/// Масштаб мира
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Количество областей в мире (`WORLD_MIN_AREAS..=WORLD_MAX_AREAS`)
    pub areas: Bounds<u32>,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            areas: Bounds::new(1, 16),
        }
    }
}

/// Параметры областей
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaSettings {
    /// Количество поселений в области
    pub settlements: Bounds<u32>,
    /// Стоимость перемещения через область
    pub traversal_cost: Bounds<f64>,
    /// Уровень опасности
    pub danger: Bounds<f64>,
    /// Изолированность
    pub isolation: Bounds<f64>,
}

impl Default for AreaSettings {
    fn default() -> Self {
        Self {
            settlements: Bounds::new(0, 4),
            traversal_cost: Bounds::new(0.0, 1.0),
            danger: Bounds::new(0.0, 1.0),
            isolation: Bounds::new(0.0, 1.0),
        }
    }
}

/// Параметры поселений: возраст, население, архетипы, труд и голод
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementSettings {
    /// Допустимые типы поселений, в порядке объявления (он же порядок при выборе архетипа)
    pub types: Vec<String>,
    pub age: Bounds<u32>,
    pub population: Bounds<u32>,
    /// Профиль веса для каждого типа поселения
    pub archetypes: BTreeMap<String, ArchetypeProfile>,

    /// `LABOR_BASE_RATE`
    pub labor_base_rate: f64,
    /// `LABOR_AGE_WEIGHT`
    pub labor_age_weight: f64,
    /// `LABOR_FRICTION_WEIGHT` — всегда вычитается
    pub labor_friction_weight: f64,

    /// Базовая эффективность производства по типу поселения
    pub base_efficiency: BTreeMap<String, f64>,
    pub efficiency_age_weight: f64,
    /// Всегда вычитается
    pub efficiency_friction_weight: f64,

    /// Доля нехватки еды, которую поселение переносит без голода
    pub starvation_recovery_threshold: f64,
    /// Сколько уязвимого населения переходит в голодающих на единицу нехватки сверх порога
    pub starvation_conversion_rate: f64,
    /// Верхняя граница доли голодающих среди уязвимых
    pub starvation_max_fraction: f64,
}

impl Default for SettlementSettings {
    fn default() -> Self {
        use Affinity::{Disfavors, Favors, Neutral};

        let profile = |age, population, friction, exponent, scale| ArchetypeProfile {
            age,
            population,
            friction,
            exponent,
            scale,
        };

        Self {
            types: names(&["outpost", "hamlet", "village", "town", "city"]),
            age: Bounds::new(0, 300),
            population: Bounds::new(0, 5000),
            archetypes: BTreeMap::from([
                (
                    "outpost".to_string(),
                    profile(Disfavors, Neutral, Favors, 2.0, 1.0),
                ),
                (
                    "hamlet".to_string(),
                    profile(Disfavors, Disfavors, Favors, 1.0, 1.0),
                ),
                (
                    "village".to_string(),
                    profile(Favors, Disfavors, Neutral, 1.0, 0.8),
                ),
                (
                    "town".to_string(),
                    profile(Favors, Favors, Disfavors, 1.0, 1.0),
                ),
                (
                    "city".to_string(),
                    profile(Favors, Favors, Disfavors, 2.0, 1.0),
                ),
            ]),
            labor_base_rate: 0.6,
            labor_age_weight: 0.2,
            labor_friction_weight: 0.3,
            base_efficiency: table(&[
                ("outpost", 0.45),
                ("hamlet", 0.5),
                ("village", 0.55),
                ("town", 0.6),
                ("city", 0.65),
            ]),
            efficiency_age_weight: 0.25,
            efficiency_friction_weight: 0.35,
            starvation_recovery_threshold: 0.1,
            starvation_conversion_rate: 1.5,
            starvation_max_fraction: 0.8,
        }
    }
}

/// Параметры ресурсов
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSettings {
    pub types: Vec<String>,
    /// Глобальные пределы ёмкости (`RESOURCE_CAPACITY_MIN..=RESOURCE_CAPACITY_MAX`)
    pub capacity_limits: Bounds<u32>,
    /// Диапазон ёмкости: тип поселения → ресурс → `[min, max]`
    pub capacity: BTreeMap<String, BTreeMap<String, Bounds<u32>>>,
    /// Начальная заполненность запаса как доля ёмкости
    pub initial_fill: Bounds<f64>,
    /// `RESOURCE_LABOR_SHARE_CAP`: доля рабочей силы, доступная ресурсу
    pub labor_share_cap: BTreeMap<String, f64>,
    /// `RESOURCE_INFRA_OUTPUT_RATE`: выход на единицу ёмкости
    pub infra_output_rate: BTreeMap<String, f64>,
    /// Выход на одного работника
    pub labor_output_rate: BTreeMap<String, f64>,
    /// Потребление на душу населения
    pub per_capita_demand: BTreeMap<String, f64>,
    /// Ресурс, нехватка которого вызывает голод
    pub food_resource: String,
}

impl Default for ResourceSettings {
    fn default() -> Self {
        let base = [
            ("water", 200.0, 800.0),
            ("food", 150.0, 600.0),
            ("scrap", 20.0, 200.0),
        ];
        let size_factor = [
            ("outpost", 0.25),
            ("hamlet", 0.5),
            ("village", 1.0),
            ("town", 2.5),
            ("city", 6.0),
        ];

        let capacity = size_factor
            .iter()
            .map(|&(settlement, factor)| {
                let ranges = base
                    .iter()
                    .map(|&(resource, lo, hi)| {
                        let bounds = Bounds::new((lo * factor) as u32, (hi * factor) as u32);
                        (resource.to_string(), bounds)
                    })
                    .collect();
                (settlement.to_string(), ranges)
            })
            .collect();

        Self {
            types: names(&["water", "food", "scrap"]),
            capacity_limits: Bounds::new(0, 10_000),
            capacity,
            initial_fill: Bounds::new(0.3, 0.9),
            labor_share_cap: table(&[("water", 0.3), ("food", 0.5), ("scrap", 0.2)]),
            infra_output_rate: table(&[("water", 1.5), ("food", 1.0), ("scrap", 0.5)]),
            labor_output_rate: table(&[("water", 2.0), ("food", 1.2), ("scrap", 0.4)]),
            per_capita_demand: table(&[("water", 0.5), ("food", 0.35), ("scrap", 0.02)]),
            food_resource: "food".to_string(),
        }
    }
}

/// Параметры учреждений
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstitutionSettings {
    pub types: Vec<String>,
    /// `INSTITUTION_MIN..=INSTITUTION_MAX`
    pub count: Bounds<u32>,
    /// Склонность архетипа к типам учреждений: тип поселения → тип учреждения → вес
    pub bias: BTreeMap<String, BTreeMap<String, f64>>,
    /// `DEFAULT_INSTITUTION_POWER`
    pub base_power: BTreeMap<String, f64>,
    /// Работников на единицу власти учреждения
    pub labor_cost_factor: BTreeMap<String, f64>,
    /// `INSTITUTION_LABOR_CAP_RATIO`: максимум рабочей силы, уходящей на учреждения
    pub labor_cap_ratio: f64,
}

impl Default for InstitutionSettings {
    fn default() -> Self {
        let bias = |archive, enforcement, civic, religious| {
            table(&[
                ("archive", archive),
                ("enforcement", enforcement),
                ("civic", civic),
                ("religious", religious),
            ])
        };

        Self {
            types: names(&["archive", "enforcement", "civic", "religious"]),
            count: Bounds::new(0, 6),
            bias: BTreeMap::from([
                ("outpost".to_string(), bias(0.5, 2.0, 0.5, 1.0)),
                ("hamlet".to_string(), bias(0.5, 1.0, 1.0, 2.0)),
                ("village".to_string(), bias(1.0, 1.0, 1.5, 1.5)),
                ("town".to_string(), bias(1.5, 1.5, 2.0, 1.0)),
                ("city".to_string(), bias(2.0, 2.0, 2.0, 1.0)),
            ]),
            base_power: table(&[
                ("archive", 0.6),
                ("enforcement", 1.2),
                ("civic", 1.0),
                ("religious", 0.8),
            ]),
            labor_cost_factor: table(&[
                ("archive", 4.0),
                ("enforcement", 10.0),
                ("civic", 8.0),
                ("religious", 6.0),
            ]),
            labor_cap_ratio: 0.2,
        }
    }
}

/// Параметры давлений (unrest, scarcity, legitimacy)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PressureSettings {
    pub types: Vec<String>,
    pub range: Bounds<f64>,
}

impl Default for PressureSettings {
    fn default() -> Self {
        Self {
            types: names(&["unrest", "scarcity", "legitimacy"]),
            range: Bounds::new(0.0, 1.0),
        }
    }
}

/// Параметры построек
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureSettings {
    pub types: Vec<String>,
    /// Глобальные пределы количества построек (`STRUCTURE_MIN..=STRUCTURE_MAX`)
    pub count_limits: Bounds<u32>,
    /// Количество построек по типу поселения
    pub count: BTreeMap<String, Bounds<u32>>,
    /// Ресурс, производство которого определяет масштаб постройки данного типа
    pub resource_affinity: BTreeMap<String, String>,
    /// `STRUCTURE_CONDITION_MIN..=STRUCTURE_CONDITION_MAX`
    pub condition: Bounds<f64>,
    /// `STRUCTURE_DANGER_CONDITION_WEIGHT`
    pub danger_condition_weight: f64,
    pub scale: Bounds<f64>,
    /// Амплитуда случайной поправки масштаба `[-v, +v]`
    pub scale_variance: f64,
    /// Старые поселения строят крупнее
    pub age_scale_weight: f64,
    /// `ROOMS_PER_STRUCTURE_UNIT`
    pub rooms_per_unit: f64,
}

impl Default for StructureSettings {
    fn default() -> Self {
        Self {
            types: names(&["residential", "industrial", "civic", "storage"]),
            count_limits: Bounds::new(0, 12),
            count: BTreeMap::from([
                ("outpost".to_string(), Bounds::new(0, 2)),
                ("hamlet".to_string(), Bounds::new(1, 4)),
                ("village".to_string(), Bounds::new(2, 6)),
                ("town".to_string(), Bounds::new(4, 9)),
                ("city".to_string(), Bounds::new(6, 12)),
            ]),
            resource_affinity: BTreeMap::from([
                ("residential".to_string(), "water".to_string()),
                ("industrial".to_string(), "scrap".to_string()),
                ("civic".to_string(), "water".to_string()),
                ("storage".to_string(), "food".to_string()),
            ]),
            condition: Bounds::new(0.0, 1.0),
            danger_condition_weight: 0.8,
            scale: Bounds::new(0.25, 3.0),
            scale_variance: 0.25,
            age_scale_weight: 0.5,
            rooms_per_unit: 4.0,
        }
    }
}

/// Параметры комнат
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomSettings {
    /// `ROOM_MIN..=ROOM_MAX`
    pub count: Bounds<u32>,
    pub sizes: Vec<String>,
    /// `ROOM_TYPES_BY_STRUCTURE`
    pub types_by_structure: BTreeMap<String, Vec<String>>,
    pub resource_bias: Bounds<f64>,
    pub danger_bias: Bounds<f64>,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            count: Bounds::new(1, 20),
            sizes: names(&["tiny", "small", "medium", "large"]),
            types_by_structure: BTreeMap::from([
                (
                    "residential".to_string(),
                    names(&["living", "sleeping", "storage"]),
                ),
                ("industrial".to_string(), names(&["workshop", "storage"])),
                ("civic".to_string(), names(&["assembly", "office"])),
                ("storage".to_string(), names(&["storage"])),
            ]),
            resource_bias: Bounds::new(0.0, 1.0),
            danger_bias: Bounds::new(0.0, 1.0),
        }
    }
}

/// Полная таблица констант генерации
///
/// Единственный источник границ, весов и перечислений. Поддерживает загрузку из TOML-файлов.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConstants {
    pub world: WorldSettings,
    pub area: AreaSettings,
    pub settlement: SettlementSettings,
    pub resource: ResourceSettings,
    pub institution: InstitutionSettings,
    pub pressure: PressureSettings,
    pub structure: StructureSettings,
    pub room: RoomSettings,
}

impl GenerationConstants {
    /// Загружает переопределения констант из TOML-файла
    ///
    /// Поля, отсутствующие в файле, берутся из значений по умолчанию.
    ///
    /// # Пример
    /// ```toml
    /// # worldgen.toml
    /// [world]
    /// areas = { min = 2, max = 4 }
    ///
    /// [settlement]
    /// labor_base_rate = 0.5
    /// ```
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Проверяет согласованность таблицы до начала генерации
    ///
    /// Каждый объявленный тип должен иметь запись во всех таблицах, где он будет искаться,
    /// а каждый диапазон — `min <= max`. Диапазоны по типу поселения лежат внутри глобальных
    /// пределов. Рассинхронизация перечислений и таблиц — фатальна.
    pub fn check(&self) -> Result<(), GenerationError> {
        self.check_bounds()?;

        let settlement = &self.settlement;
        let resource = &self.resource;
        let institution = &self.institution;
        let structure = &self.structure;

        for kind in &settlement.types {
            lookup(&settlement.archetypes, "settlement.archetypes", kind)?;
            lookup(&settlement.base_efficiency, "settlement.base_efficiency", kind)?;

            let capacities = lookup(&resource.capacity, "resource.capacity", kind)?;
            for name in &resource.types {
                let bounds = lookup(capacities, "resource.capacity", name)?;
                check_within(
                    &format!("resource.capacity.{kind}.{name}"),
                    bounds,
                    &resource.capacity_limits,
                )?;
            }

            let bias = lookup(&institution.bias, "institution.bias", kind)?;
            for name in &institution.types {
                lookup(bias, "institution.bias", name)?;
            }

            let count = lookup(&structure.count, "structure.count", kind)?;
            check_within(
                &format!("structure.count.{kind}"),
                count,
                &structure.count_limits,
            )?;
        }

        for name in &resource.types {
            lookup(&resource.labor_share_cap, "resource.labor_share_cap", name)?;
            lookup(&resource.infra_output_rate, "resource.infra_output_rate", name)?;
            lookup(&resource.labor_output_rate, "resource.labor_output_rate", name)?;
            lookup(&resource.per_capita_demand, "resource.per_capita_demand", name)?;
        }
        if !resource.types.contains(&resource.food_resource) {
            return Err(GenerationError::missing("resource.types", &resource.food_resource));
        }

        for name in &institution.types {
            lookup(&institution.base_power, "institution.base_power", name)?;
            lookup(&institution.labor_cost_factor, "institution.labor_cost_factor", name)?;
        }

        for name in &structure.types {
            let affinity = lookup(
                &structure.resource_affinity,
                "structure.resource_affinity",
                name,
            )?;
            if !resource.types.contains(affinity) {
                return Err(GenerationError::missing("resource.types", affinity));
            }
            let rooms = lookup(&self.room.types_by_structure, "room.types_by_structure", name)?;
            if rooms.is_empty() {
                return Err(GenerationError::missing("room.types_by_structure", name));
            }
        }

        let may_build = settlement
            .types
            .iter()
            .any(|kind| structure.count.get(kind).is_some_and(|c| c.max > 0));
        if may_build && structure.types.is_empty() {
            return Err(GenerationError::missing("structure.types", "<any>"));
        }
        if may_build && self.room.sizes.is_empty() {
            return Err(GenerationError::missing("room.sizes", "<any>"));
        }
        if settlement.types.is_empty() && self.area.settlements.max > 0 {
            return Err(GenerationError::missing("settlement.types", "<any>"));
        }

        Ok(())
    }

    fn check_bounds(&self) -> Result<(), GenerationError> {
        check_ordered("world.areas", &self.world.areas)?;
        check_ordered("area.settlements", &self.area.settlements)?;
        check_ordered("area.traversal_cost", &self.area.traversal_cost)?;
        check_ordered("area.danger", &self.area.danger)?;
        check_ordered("area.isolation", &self.area.isolation)?;
        check_ordered("settlement.age", &self.settlement.age)?;
        check_ordered("settlement.population", &self.settlement.population)?;
        check_ordered("resource.capacity_limits", &self.resource.capacity_limits)?;
        check_ordered("resource.initial_fill", &self.resource.initial_fill)?;
        check_ordered("institution.count", &self.institution.count)?;
        check_ordered("pressure.range", &self.pressure.range)?;
        check_ordered("structure.count_limits", &self.structure.count_limits)?;
        check_ordered("structure.condition", &self.structure.condition)?;
        check_ordered("structure.scale", &self.structure.scale)?;
        check_ordered("room.count", &self.room.count)?;
        check_ordered("room.resource_bias", &self.room.resource_bias)?;
        check_ordered("room.danger_bias", &self.room.danger_bias)?;
        Ok(())
    }

    /// Допустимые типы комнат для типа постройки
    pub fn room_types_for(&self, structure_type: &str) -> Result<&[String], GenerationError> {
        lookup(
            &self.room.types_by_structure,
            "room.types_by_structure",
            structure_type,
        )
        .map(Vec::as_slice)
    }
}

/// Ищет ключ в таблице констант; отсутствие — ошибка согласованности конфигурации
pub fn lookup<'a, V>(
    table: &'a BTreeMap<String, V>,
    table_name: &'static str,
    key: &str,
) -> Result<&'a V, GenerationError> {
    table
        .get(key)
        .ok_or_else(|| GenerationError::missing(table_name, key))
}

fn check_ordered<T>(name: &str, bounds: &Bounds<T>) -> Result<(), GenerationError>
where
    T: PartialOrd + Copy + Into<f64>,
{
    let (min, max) = (bounds.min.into(), bounds.max.into());
    if bounds.is_ordered() && min.is_finite() && max.is_finite() {
        Ok(())
    } else {
        Err(GenerationError::InvalidBounds {
            name: name.to_string(),
            min,
            max,
        })
    }
}

/// Вложенный диапазон должен быть упорядочен и целиком лежать внутри `limits`
fn check_within<T>(
    name: &str,
    bounds: &Bounds<T>,
    limits: &Bounds<T>,
) -> Result<(), GenerationError>
where
    T: PartialOrd + Copy + Into<f64>,
{
    check_ordered(name, bounds)?;
    if limits.contains(bounds.min) && limits.contains(bounds.max) {
        Ok(())
    } else {
        Err(GenerationError::InvalidBounds {
            name: name.to_string(),
            min: bounds.min.into(),
            max: bounds.max.into(),
        })
    }
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn table(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries
        .iter()
        .map(|&(key, value)| (key.to_string(), value))
        .collect()
}
