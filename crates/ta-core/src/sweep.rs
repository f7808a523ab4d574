//! Parameter sweep specification.
//!
//! A sweep names one indicator and a set of axes; the cartesian product of the
//! axis values yields one override list per parameter set. Turning an override
//! list into a typed parameter set is the caller's field mapping.

use serde::Deserialize;

use crate::config::ConfigError;
use crate::indicators::IndicatorKind;

/// A single axis in the parameter sweep.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepAxis {
    /// Parameter field name, e.g. "length" or "width".
    pub path: String,
    /// Values to test along this axis.
    pub values: Vec<f64>,
}

/// Full sweep specification (loaded from YAML).
#[derive(Debug, Clone, Deserialize)]
pub struct SweepSpec {
    pub indicator: IndicatorKind,
    #[serde(default)]
    pub axes: Vec<SweepAxis>,
}

impl SweepSpec {
    /// Number of parameter sets the sweep expands to.
    pub fn combination_count(&self) -> usize {
        self.axes.iter().map(|a| a.values.len()).product()
    }
}

/// Generate all combinations (cartesian product) from the sweep axes.
///
/// The first axis varies slowest. No axes yields a single empty override list.
pub fn generate_combinations(axes: &[SweepAxis]) -> Vec<Vec<(String, f64)>> {
    if axes.is_empty() {
        return vec![vec![]];
    }

    let mut result = Vec::new();
    let sub = generate_combinations(&axes[1..]);
    for val in &axes[0].values {
        for combo in &sub {
            let mut new_combo = vec![(axes[0].path.clone(), *val)];
            new_combo.extend(combo.iter().cloned());
            result.push(new_combo);
        }
    }
    result
}

/// Load a sweep specification from a YAML file.
pub fn load_sweep_spec(path: &str) -> Result<SweepSpec, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    parse_sweep_spec(&raw)
}

pub fn parse_sweep_spec(raw: &str) -> Result<SweepSpec, ConfigError> {
    Ok(serde_yaml::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_combinations_empty() {
        let combos = generate_combinations(&[]);
        assert_eq!(combos.len(), 1);
        assert!(combos[0].is_empty());
    }

    #[test]
    fn test_generate_combinations_two_axes() {
        let axes = vec![
            SweepAxis {
                path: "length".to_string(),
                values: vec![5.0, 10.0],
            },
            SweepAxis {
                path: "width".to_string(),
                values: vec![1.5, 2.0, 2.5],
            },
        ];
        let combos = generate_combinations(&axes);
        assert_eq!(combos.len(), 6);
        assert_eq!(combos[0], vec![("length".to_string(), 5.0), ("width".to_string(), 1.5)]);
        assert_eq!(combos[5], vec![("length".to_string(), 10.0), ("width".to_string(), 2.5)]);
    }

    #[test]
    fn test_axis_without_values_yields_nothing() {
        let axes = vec![SweepAxis {
            path: "length".to_string(),
            values: vec![],
        }];
        assert!(generate_combinations(&axes).is_empty());
    }

    #[test]
    fn test_sweep_spec_deserialization() {
        let yaml = r#"
indicator: bollinger
axes:
  - path: length
    values: [10, 20, 30]
  - path: width
    values: [2.0, 2.5]
"#;
        let spec = parse_sweep_spec(yaml).unwrap();
        assert_eq!(spec.indicator, IndicatorKind::Bollinger);
        assert_eq!(spec.axes.len(), 2);
        assert_eq!(spec.combination_count(), 6);
    }

    #[test]
    fn test_unknown_indicator_is_rejected() {
        let yaml = "indicator: macd\naxes: []\n";
        assert!(matches!(parse_sweep_spec(yaml), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_sweep_spec("/nonexistent/sweep.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
