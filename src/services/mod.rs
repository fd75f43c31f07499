// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod auth_client;
pub mod competition_service;
pub mod exif;
pub mod itinerary;
pub mod session;
pub mod social;
pub mod storage_client;
pub mod story_client;
pub mod trip_service;
pub mod video_client;

pub use auth_client::*;
pub use competition_service::*;
pub use session::*;
pub use storage_client::*;
pub use story_client::*;
pub use trip_service::*;
pub use video_client::*;
