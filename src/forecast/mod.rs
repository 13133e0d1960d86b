//! Forecasting models for short univariate series.
//!
//! - [`grey`]: GM(1,1) grey model with posterior-variance diagnostics
//! - [`markov`]: finite discrete-time Markov chains
//! - [`arima`]: correlation-based manual ARIMA with walk-forward testing

pub mod arima;
pub mod grey;
pub mod markov;

pub use arima::{manual_arima_forecast, train_test_split, walk_forward, ArimaOrder, WalkForward};
pub use grey::{GreyDiagnostics, GreyGrade, GreyModel};
pub use markov::MarkovChain;
