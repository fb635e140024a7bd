//! Core logic for the Puente accounting data layer.
//!
//! This crate contains pure logic with ZERO network dependencies.
//! Everything here runs before or after a remote call, never during one.
//!
//! # Modules
//!
//! - `ledger` - Double-entry validation of draft transactions
//! - `cache` - Session-scoped overlay cache and its key-value stores

pub mod cache;
pub mod ledger;
