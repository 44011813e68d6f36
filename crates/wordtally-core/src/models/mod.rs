pub mod analytics;
pub mod file_record;
pub mod upload;

pub use analytics::*;
pub use file_record::*;
pub use upload::*;
