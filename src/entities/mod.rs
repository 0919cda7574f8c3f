//! Entity type definitions
//!
//! - [`WishItem`] - Items on the wish list, created by hand or imported from CSV
//! - [`Bin`] - Physical storage bins, labelled with a QR code of their id

pub mod bin;
pub mod wish_item;

pub use bin::{Bin, BinType};
pub use wish_item::{WishItem, WishItemChanges};
