mod activity;
mod category;
mod image;
mod notification;
mod order;
mod transaction;
mod user;
mod voucher;

pub use activity::*;
pub use category::*;
pub use image::*;
pub use notification::*;
pub use order::*;
pub use transaction::*;
pub use user::*;
pub use voucher::*;
