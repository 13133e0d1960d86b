//! # u-modelkit
//!
//! Mathematical-modeling toolkit: evaluation, forecasting, regression,
//! probability and reliability models behind one consistent API.
//!
//! Every model is a pure function (or a small fitted struct) over slices
//! and `nalgebra` matrices. Reading spreadsheets, plotting and command-line
//! handling are left to the caller.
//!
//! ## Modules
//!
//! - [`special`]: gamma/beta/error functions, normal and Student-t helpers
//! - [`stats`]: descriptive statistics, autocorrelation, Chebyshev bounds
//! - [`random`]: seeded RNG and sampling helpers
//! - [`linalg`]: least squares, inversion, dominant eigenpair
//! - [`distributions`]: nine distributions with moments and quantiles
//! - [`reliability`]: series/parallel/voting systems, Pólya urns, networks
//! - [`evaluation`]: AHP, entropy weights, TOPSIS, grey relational, fuzzy
//! - [`forecast`]: GM(1,1), Markov chains, manual ARIMA
//! - [`regression`]: simple, multiple and nonlinear least squares
//! - [`estimation`]: grid MLE, grid Bayes, Gaussian-mixture EM
//! - [`monte_carlo`]: Monte-Carlo π
//! - [`config`]: TOML configuration with compiled defaults
//!
//! ## Conventions
//!
//! - Descriptive statistics return `Option`; models return
//!   [`Result`] with a [`ModelError`].
//! - Stochastic routines take `&mut impl rand::Rng`; seed them with
//!   [`random::create_rng`] for reproducible runs.
//! - Diagnostics go through `tracing`; no subscriber is installed here.

pub mod config;
pub mod distributions;
pub mod error;
pub mod estimation;
pub mod evaluation;
pub mod forecast;
pub mod linalg;
pub mod monte_carlo;
pub mod random;
pub mod regression;
pub mod reliability;
pub mod special;
pub mod stats;

pub use error::{ModelError, Result};
