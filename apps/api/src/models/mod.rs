pub mod annotation;
pub mod asset;
pub mod catalog;
pub mod settings;
