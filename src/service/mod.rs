//! Services over the building registry and tenant schemas.

pub mod announcements;
pub mod buildings;
pub mod validation;

pub use announcements::{Announcement, AnnouncementExpiry, AnnouncementModel, AnnouncementService};
pub use buildings::{schema_from_code, BuildingService, CreateBuildingRequest, UpdateBuildingRequest};
