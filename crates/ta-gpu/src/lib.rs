pub mod buffers;
pub mod calculator;
pub mod device;
pub mod error;
pub mod flatten;
pub mod grid;
pub mod kernels;
pub mod layout;
pub mod params;
pub mod parity;
pub mod precision;
pub mod synthetic;

pub use calculator::Calculator;
pub use device::{DeviceRuntime, HostDevice};
pub use error::{CalcError, DeviceError, ParamError};
pub use layout::ResultCube;
