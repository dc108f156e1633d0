//! Particle type definitions and the fixed catalog they live in

use crate::error::ConfigError;

/// Color and mass shared by every particle of one type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeDefinition {
    /// sRGB color, each channel in [0, 1]
    pub color: [f32; 3],
    pub mass: f32,
}

impl TypeDefinition {
    pub fn new(color: [f32; 3], mass: f32) -> Self {
        Self { color, mass }
    }

    /// Build from a packed `0xRRGGBB` color.
    pub fn from_hex(hex: u32, mass: f32) -> Self {
        Self {
            color: hex_to_rgb(hex),
            mass,
        }
    }
}

/// Unpack `0xRRGGBB` into normalized sRGB channels.
pub fn hex_to_rgb(hex: u32) -> [f32; 3] {
    let r = (hex >> 16) & 0xFF;
    let g = (hex >> 8) & 0xFF;
    let b = hex & 0xFF;
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
}

/// Immutable list of particle types, indexed by type id.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeCatalog {
    types: Vec<TypeDefinition>,
}

impl TypeCatalog {
    /// Validates that the catalog is non-empty and every mass is positive.
    pub fn new(types: Vec<TypeDefinition>) -> Result<Self, ConfigError> {
        if types.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        for (index, def) in types.iter().enumerate() {
            if !def.mass.is_finite() || def.mass <= 0.0 {
                return Err(ConfigError::InvalidMass {
                    index,
                    mass: def.mass,
                });
            }
        }

        Ok(Self { types })
    }

    /// Look up a type definition.
    ///
    /// # Panics
    /// If `type_index` is out of range. Indices are only ever produced by
    /// sampling within `0..len()`, so this is a programming error.
    pub fn lookup(&self, type_index: usize) -> &TypeDefinition {
        match self.types.get(type_index) {
            Some(def) => def,
            None => panic!(
                "particle type {} out of range for catalog of {} types",
                type_index,
                self.types.len()
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.iter()
    }
}

impl Default for TypeCatalog {
    /// Red, Green, Blue, Yellow, Purple, Orange
    fn default() -> Self {
        Self {
            types: vec![
                TypeDefinition::from_hex(0xff0000, 1.0),
                TypeDefinition::from_hex(0x00ff00, 1.0),
                TypeDefinition::from_hex(0x00aaff, 4.0),
                TypeDefinition::from_hex(0xfde910, 2.0),
                TypeDefinition::from_hex(0xba55d3, 3.0),
                TypeDefinition::from_hex(0xff8c00, 1.0),
            ],
        }
    }
}
