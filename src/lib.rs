//! Box sizing for household moves.
//!
//! Turns a free-form request of item names and counts into catalog items,
//! estimates how much room they take once stackable items are piled up to
//! the height of each candidate box, and picks the smallest box that holds
//! them.

pub mod api;
pub mod catalog;
pub mod config;
pub mod estimator;
pub mod identifier;
pub mod inventory;
pub mod model;
pub mod selection;
pub mod selector;
pub mod types;
