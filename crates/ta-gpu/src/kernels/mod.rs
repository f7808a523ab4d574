//! Kernel bodies, grouped by algorithm family.

mod common;
pub mod cascade;
pub mod extremum;
pub mod moving;
pub mod wilder;
pub mod window;

pub use cascade::{Tema, Trix};
pub use extremum::Aroon;
pub use moving::{Sma, Smma};
pub use wilder::{Adx, Atr, Dmi, Rsi};
pub use window::{Bollinger, Donchian, WilliamsR};
