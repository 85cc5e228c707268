//! Route modules for the dotsOCR gateway

pub mod health;
pub mod parse;
