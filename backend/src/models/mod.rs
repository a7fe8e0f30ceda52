pub mod curriculum;
pub mod macros;
pub mod occurrence;
pub mod template;
pub mod time;

pub use curriculum::*;
pub use occurrence::*;
pub use template::*;
pub use time::*;
