//! Order-domain rules for the drink shop.
//!
//! Everything here is pure: no I/O, no clock. The database and HTTP layers
//! call into these functions so the rules can be tested without Postgres.

pub mod code;
pub mod options;
pub mod phone;
pub mod status;
pub mod totals;

pub use code::{generate_code, CodeError, CodeSource, OrderCode, UuidCodeSource, CODE_SPACE};
pub use options::{parse_quantity, Ice, ItemOptions, QuantityChange, Size, Sweetness, Topping};
pub use phone::{validate_phone, PhoneError, PhoneRule};
pub use status::{OrderStatus, StatusMatchRule, FINISHED_LABEL, UNFINISHED_LABEL};
pub use totals::compute_totals;
