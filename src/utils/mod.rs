//! Utility modules shared by the pipeline collaborators.

pub mod date;
pub mod slug;
