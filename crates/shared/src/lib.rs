pub mod collection;
pub mod controller;
pub mod error;
pub mod link;
pub mod marker;
pub mod models;
pub mod note;
pub mod surface;
