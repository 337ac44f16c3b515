pub mod category;
pub mod histogram;
pub mod types;

pub use self::category::*;
pub use self::histogram::*;
pub use self::types::*;
