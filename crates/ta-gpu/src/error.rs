use thiserror::Error;

/// Top-level batch failure. Any error aborts the whole batch; no partial cube
/// is ever returned.
#[derive(Debug, Error)]
pub enum CalcError {
    #[error("series collection is empty")]
    EmptySeries,
    #[error("parameter set collection is empty")]
    EmptyParameters,
    #[error("{label}={value} exceeds the 32-bit index range")]
    Overflow { label: &'static str, value: usize },
    #[error("result layout mismatch: {0}")]
    Layout(String),
    #[error(transparent)]
    Params(#[from] ParamError),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("device out of memory: requested {requested} bytes with {in_use} of {limit} in use")]
    OutOfMemory {
        requested: usize,
        in_use: usize,
        limit: usize,
    },
    #[error("invalid kernel launch: {0}")]
    InvalidLaunch(String),
    #[error("device readback failed: {0}")]
    Readback(String),
    #[error("device initialisation failed: {0}")]
    Init(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("unknown parameter field '{field}' (expected one of: {expected})")]
    UnknownField { field: String, expected: String },
    #[error("parameter '{field}' must be finite, got {value}")]
    NotFinite { field: &'static str, value: f64 },
    #[error("parameter '{field}'={value} is out of range")]
    OutOfRange { field: &'static str, value: f64 },
}
