pub mod image_candidate;
pub mod intent;
pub mod raw_record;
pub mod source;

pub use image_candidate::*;
pub use intent::*;
pub use raw_record::*;
pub use source::*;
