//! Parameter sets and the explicit field mapping that builds them.
//!
//! A parameter set is never read off a live indicator object. The caller
//! supplies a field lookup (name -> value) and each set type pulls the fields
//! it knows; anything missing keeps its default.

use std::fmt;

use ta_core::candle::PriceField;

use crate::buffers::{BandParams, LengthParams, SourceParams};
use crate::device::DeviceRepr;
use crate::error::ParamError;

pub const DEFAULT_LENGTH: i32 = 14;
pub const DEFAULT_BAND_LENGTH: i32 = 20;
pub const DEFAULT_BAND_WIDTH: f32 = 2.0;

/// Caller-supplied field lookup.
pub type FieldMapper<'a> = dyn Fn(&str) -> Option<f64> + 'a;

pub trait ParameterSet: DeviceRepr + Default + fmt::Debug {
    /// Field names accepted by `from_fields`.
    const FIELDS: &'static [&'static str];

    /// Build from a caller-supplied field lookup.
    fn from_fields(fields: &FieldMapper<'_>) -> Result<Self, ParamError>;

    /// Raw (unclamped) window length.
    fn length(&self) -> i32;

    /// Build from sweep overrides. Later entries win; unknown names are rejected.
    fn from_overrides(overrides: &[(String, f64)]) -> Result<Self, ParamError> {
        if let Some((name, _)) = overrides
            .iter()
            .find(|(name, _)| !Self::FIELDS.contains(&name.as_str()))
        {
            return Err(ParamError::UnknownField {
                field: name.clone(),
                expected: Self::FIELDS.join(", "),
            });
        }
        Self::from_fields(&|name: &str| {
            overrides
                .iter()
                .rev()
                .find(|(k, _)| k == name)
                .map(|(_, v)| *v)
        })
    }

    /// True when the kernel will clamp this set's length.
    fn is_degenerate(&self) -> bool {
        self.length() < 1
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, ParamError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParamError::NotFinite { field, value })
    }
}

fn read_length(fields: &FieldMapper<'_>, default: i32) -> Result<i32, ParamError> {
    let Some(raw) = fields("length") else {
        return Ok(default);
    };
    let value = finite("length", raw)?.round();
    if value < i32::MIN as f64 || value > i32::MAX as f64 {
        return Err(ParamError::OutOfRange {
            field: "length",
            value: raw,
        });
    }
    Ok(value as i32)
}

fn read_source(fields: &FieldMapper<'_>) -> Result<u32, ParamError> {
    let Some(raw) = fields("source") else {
        return Ok(PriceField::default().code());
    };
    let value = finite("source", raw)?.round();
    if value < 0.0 || value > u32::MAX as f64 {
        return Err(ParamError::OutOfRange {
            field: "source",
            value: raw,
        });
    }
    Ok(value as u32)
}

// ---------------------------------------------------------------------------
// LengthParams
// ---------------------------------------------------------------------------

impl LengthParams {
    pub fn new(length: i32) -> Self {
        Self {
            length,
            _pad: [0; 3],
        }
    }
}

impl Default for LengthParams {
    fn default() -> Self {
        Self::new(DEFAULT_LENGTH)
    }
}

impl ParameterSet for LengthParams {
    const FIELDS: &'static [&'static str] = &["length"];

    fn from_fields(fields: &FieldMapper<'_>) -> Result<Self, ParamError> {
        Ok(Self::new(read_length(fields, DEFAULT_LENGTH)?))
    }

    fn length(&self) -> i32 {
        self.length
    }
}

// ---------------------------------------------------------------------------
// SourceParams
// ---------------------------------------------------------------------------

impl SourceParams {
    pub fn new(length: i32, source: PriceField) -> Self {
        Self {
            length,
            source: source.code(),
            _pad: [0; 2],
        }
    }

    pub fn source(&self) -> PriceField {
        PriceField::from_code(self.source)
    }
}

impl Default for SourceParams {
    fn default() -> Self {
        Self::new(DEFAULT_LENGTH, PriceField::Close)
    }
}

impl ParameterSet for SourceParams {
    const FIELDS: &'static [&'static str] = &["length", "source"];

    fn from_fields(fields: &FieldMapper<'_>) -> Result<Self, ParamError> {
        Ok(Self {
            length: read_length(fields, DEFAULT_LENGTH)?,
            source: read_source(fields)?,
            _pad: [0; 2],
        })
    }

    fn length(&self) -> i32 {
        self.length
    }
}

// ---------------------------------------------------------------------------
// BandParams
// ---------------------------------------------------------------------------

impl BandParams {
    pub fn new(length: i32, source: PriceField, width: f32) -> Self {
        Self {
            length,
            source: source.code(),
            width,
            _pad: 0,
        }
    }

    pub fn source(&self) -> PriceField {
        PriceField::from_code(self.source)
    }
}

impl Default for BandParams {
    fn default() -> Self {
        Self::new(DEFAULT_BAND_LENGTH, PriceField::Close, DEFAULT_BAND_WIDTH)
    }
}

impl ParameterSet for BandParams {
    const FIELDS: &'static [&'static str] = &["length", "source", "width"];

    fn from_fields(fields: &FieldMapper<'_>) -> Result<Self, ParamError> {
        let width = match fields("width") {
            Some(raw) => finite("width", raw)? as f32,
            None => DEFAULT_BAND_WIDTH,
        };
        Ok(Self {
            length: read_length(fields, DEFAULT_BAND_LENGTH)?,
            source: read_source(fields)?,
            width,
            _pad: 0,
        })
    }

    fn length(&self) -> i32 {
        self.length
    }
}
