//! Quantitative utilities for the market simulation.
//!
//! # Modules
//!
//! - [`rolling`] - Bounded rolling window (chartist price memory)
//! - [`stats`] - Statistical helpers (moments, returns, autocorrelation, Hurst exponent)
//! - [`risk`] - Return-based risk metrics (Sharpe ratio, drawdown)

pub mod risk;
pub mod rolling;
pub mod stats;

pub use rolling::RollingWindow;
