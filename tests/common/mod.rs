//! Common test utilities.
//!
//! In-memory stand-ins for the persistence and HTTP ports, plus record fixtures.
#![allow(dead_code)]

pub mod adapter;
pub mod fixtures;
pub mod repository;
