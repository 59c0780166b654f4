//! HTTP handlers for the building registry and tenant-scoped resources.

pub mod announcements;
pub mod buildings;
pub mod tenant;
