pub mod classify_types;
pub mod photo_types;
