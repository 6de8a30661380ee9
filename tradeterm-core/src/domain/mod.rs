//! Domain types: bars, signal labels and horizon forecasts.

pub mod bar;
pub mod forecast;
pub mod signal;

pub use bar::{closes, is_strictly_ascending, Bar};
pub use forecast::{horizon_key, round2, HorizonForecast};
pub use signal::{SignalLabel, SignalResult};
