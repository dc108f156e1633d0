//! Asymmetric interaction coefficients between particle types

use crate::error::ConfigError;

/// Square table of signed coefficients, `coefficient(i, j)` being the pull
/// of a type-`j` particle on a type-`i` particle. Positive attracts,
/// negative repels. Stored row-major in a flat vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceMatrix {
    size: usize,
    coefficients: Vec<f32>,
}

impl ForceMatrix {
    /// Build from rows, requiring exactly `type_count` rows of `type_count`
    /// finite entries each. Short or long rows are rejected rather than padded.
    pub fn new(rows: &[Vec<f32>], type_count: usize) -> Result<Self, ConfigError> {
        if rows.len() != type_count {
            return Err(ConfigError::MatrixRowCount {
                rows: rows.len(),
                expected: type_count,
            });
        }

        let mut coefficients = Vec::with_capacity(type_count * type_count);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != type_count {
                return Err(ConfigError::MatrixRowLength {
                    row,
                    len: values.len(),
                    expected: type_count,
                });
            }
            for (col, &value) in values.iter().enumerate() {
                if !value.is_finite() {
                    return Err(ConfigError::NonFiniteCoefficient { row, col });
                }
                coefficients.push(value);
            }
        }

        Ok(Self {
            size: type_count,
            coefficients,
        })
    }

    /// All-zero matrix (no type-rule forces at all).
    pub fn zeros(type_count: usize) -> Self {
        Self {
            size: type_count,
            coefficients: vec![0.0; type_count * type_count],
        }
    }

    #[inline]
    pub fn coefficient(&self, source_type: usize, other_type: usize) -> f32 {
        assert!(
            source_type < self.size && other_type < self.size,
            "force matrix lookup ({}, {}) out of range for {} types",
            source_type,
            other_type,
            self.size
        );
        self.coefficients[source_type * self.size + other_type]
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn rows(&self) -> Vec<Vec<f32>> {
        self.coefficients
            .chunks(self.size.max(1))
            .map(|row| row.to_vec())
            .collect()
    }
}

/// The default six-type table (R, G, B, Y, P, O).
pub fn default_force_rows() -> Vec<Vec<f32>> {
    vec![
        //    R     G     B     Y     P      O
        vec![0.25, -0.8, -0.1, 0.1, -0.6, 0.0],
        vec![-0.7, 0.0, -0.7, -0.1, 0.1, -0.1],
        vec![0.6, -0.2, -0.1, 0.2, -0.2, 0.0],
        vec![0.6, 0.1, -0.2, 0.1, 0.3, 0.2],
        vec![0.6, 0.8, -0.5, -0.3, -0.05, -0.2],
        vec![0.1, 0.3, 0.0, -0.3, -0.2, -0.4],
    ]
}

impl Default for ForceMatrix {
    fn default() -> Self {
        let rows = default_force_rows();
        let size = rows.len();
        Self {
            size,
            coefficients: rows.into_iter().flatten().collect(),
        }
    }
}
