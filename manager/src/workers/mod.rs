//! Background workers

pub mod ticker;
