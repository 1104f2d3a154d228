pub mod errors;
pub mod path;
pub mod settings;
pub mod solc;
pub mod source_text;
