pub mod diagnosis;
pub mod enums;
pub mod medical_image;
pub mod user;

pub use diagnosis::*;
pub use enums::*;
pub use medical_image::*;
pub use user::*;
