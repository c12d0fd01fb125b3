//! Ticket model: the immutable service request handed to the queue.

mod code;
mod types;

pub use code::{TicketCode, TicketCodeError, MAX_SEQUENCE};
pub use types::{PriorityClass, Ticket};
