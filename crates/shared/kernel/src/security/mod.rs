//! Security helpers shared by the server feature slices.

pub mod resource;
