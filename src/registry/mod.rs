//! Registry module containing members, billing, calendar and portal logins

pub mod association;
pub mod billing;
pub mod calendar;
pub mod members;
pub mod users;

pub use association::*;
pub use billing::*;
pub use calendar::*;
pub use members::*;
pub use users::*;
