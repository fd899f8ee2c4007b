//! Command implementations

pub mod bump;

pub mod doctor;

pub mod info;
