//! Data structures shared across the storefront: catalog records, cart
//! lines and order records.

pub mod cart;
pub mod order;
pub mod product;

pub use cart::{CartLine, ProductSnapshot};
pub use order::{OrderLine, OrderRecord, OrderStatus, OrderView, OrderViewItem};
pub use product::{NewProduct, Product};
