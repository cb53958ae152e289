pub mod image;
pub mod item;
pub mod order;

pub use image::OrderImage;
pub use item::{CreateOrderItem, OrderItem};
pub use order::{CreateOrder, Order, OrderStatus};
