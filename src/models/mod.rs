// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod competition;
pub mod photo;
pub mod profile;
pub mod social;
pub mod trip;

pub use competition::*;
pub use photo::*;
pub use profile::*;
pub use social::*;
pub use trip::*;
