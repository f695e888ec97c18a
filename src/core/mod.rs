pub mod errors;
pub mod paths;
pub mod settings;
