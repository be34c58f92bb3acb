//! Spreadsheet import and instant dual-mode search for a point-of-sale
//! product catalogue and party list.

pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;
pub mod storage;

pub use error::{PosSearchError, Result};
