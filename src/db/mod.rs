// src/db/mod.rs
// DOCUMENTATION: Database module organization
// PURPOSE: Re-export database components

pub mod competition_repository;
pub mod profile_repository;
pub mod trip_repository;

pub use competition_repository::*;
pub use profile_repository::*;
pub use trip_repository::*;
