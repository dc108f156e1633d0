//! Boot-time configuration
//!
//! Everything is optional in a config file; missing fields fall back to the
//! built-in defaults.

use std::path::Path;

use particle_physics::{
    default_force_rows, ConfigError, ForceMatrix, InteractionEngine, InteractionParams,
    TypeCatalog, TypeDefinition, World, INITIAL_SPEED, PARTICLE_COUNT, PARTICLE_RADIUS,
};
use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::store::SpawnSettings;

/// One entry of the type catalog as written in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeConfig {
    #[serde(default)]
    pub name: String,
    /// Packed `0xRRGGBB`
    pub color: u32,
    pub mass: f32,
}

impl TypeConfig {
    fn new(name: &str, color: u32, mass: f32) -> Self {
        Self {
            name: name.to_string(),
            color,
            mass,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub world: World,
    pub particle_count: usize,
    /// Scale of the random initial velocity per axis
    pub initial_speed: f32,
    pub particle_radius: f32,
    /// Fixed seed for reproducible runs; `None` seeds from the OS
    pub seed: Option<u64>,
    pub types: Vec<TypeConfig>,
    /// `force_matrix[i][j]`: pull of type `j` on type `i`
    pub force_matrix: Vec<Vec<f32>>,
    pub interaction: InteractionParams,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            world: World::default(),
            particle_count: PARTICLE_COUNT,
            initial_speed: INITIAL_SPEED,
            particle_radius: PARTICLE_RADIUS,
            seed: None,
            types: vec![
                TypeConfig::new("red", 0xff0000, 1.0),
                TypeConfig::new("green", 0x00ff00, 1.0),
                TypeConfig::new("blue", 0x00aaff, 4.0),
                TypeConfig::new("yellow", 0xfde910, 2.0),
                TypeConfig::new("purple", 0xba55d3, 3.0),
                TypeConfig::new("orange", 0xff8c00, 1.0),
            ],
            force_matrix: default_force_rows(),
            interaction: InteractionParams::default(),
        }
    }
}

/// Validated physics tables built from a [`SimulationConfig`].
#[derive(Debug, Clone)]
pub struct PhysicsSetup {
    pub world: World,
    pub catalog: TypeCatalog,
    pub engine: InteractionEngine,
    pub spawn: SpawnSettings,
}

impl SimulationConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, SimulationError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimulationError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| SimulationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Display name of a type, falling back to its index.
    pub fn type_name(&self, index: usize) -> String {
        match self.types.get(index) {
            Some(t) if !t.name.is_empty() => t.name.clone(),
            _ => format!("type {}", index),
        }
    }

    /// Validate every table and parameter.
    pub fn build(&self) -> Result<PhysicsSetup, ConfigError> {
        self.world.validate()?;

        if !(self.initial_speed.is_finite() && self.initial_speed >= 0.0) {
            return Err(ConfigError::InvalidParam {
                name: "initial_speed",
                reason: "must be finite and >= 0".to_string(),
            });
        }
        if !(self.particle_radius.is_finite() && self.particle_radius > 0.0) {
            return Err(ConfigError::InvalidParam {
                name: "particle_radius",
                reason: "must be > 0".to_string(),
            });
        }

        let catalog = TypeCatalog::new(
            self.types
                .iter()
                .map(|t| TypeDefinition::from_hex(t.color, t.mass))
                .collect(),
        )?;
        let matrix = ForceMatrix::new(&self.force_matrix, catalog.len())?;
        self.interaction.validate()?;

        Ok(PhysicsSetup {
            world: self.world,
            catalog,
            engine: InteractionEngine::new(matrix, self.interaction),
            spawn: SpawnSettings {
                initial_speed: self.initial_speed,
                radius: self.particle_radius,
            },
        })
    }
}
