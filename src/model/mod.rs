//! Pure data structures shared by the stores and their collaborators.

pub mod address;
pub mod cart;
pub mod ids;
pub mod money;
pub mod order;
pub mod shipping;

pub use address::*;
pub use cart::*;
pub use ids::*;
pub use money::*;
pub use order::*;
pub use shipping::*;
