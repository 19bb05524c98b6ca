pub mod auctions;
pub mod bids;
pub mod core;
pub mod orders;
pub mod outcomes;
pub mod states;

pub use self::auctions::*;
pub use self::bids::*;
pub use self::core::*;
pub use self::orders::*;
pub use self::outcomes::*;
pub use self::states::*;
