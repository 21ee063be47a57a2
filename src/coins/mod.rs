pub mod accounts;
pub use accounts::*;

pub mod address;
pub use address::*;

pub mod adjust;
pub use adjust::*;

pub mod amount;
pub use amount::*;

pub mod fraction;
pub use fraction::*;
