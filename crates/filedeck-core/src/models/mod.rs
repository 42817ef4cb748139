//! Value types shared across the browser.

mod item;
mod listing;
mod upload;

pub use item::*;
pub use listing::*;
pub use upload::*;
