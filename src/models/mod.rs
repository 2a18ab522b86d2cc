pub mod analytics;
pub mod response;
pub mod stock;
pub mod trade;
pub mod views;

pub use analytics::*;
pub use response::*;
pub use stock::*;
pub use trade::*;
pub use views::*;
