//! # market_ticket
//!
//! Sends finished request configurations to ServiceNow. Production requests
//! become change requests; every other environment goes to an approval
//! table.

pub mod error;
pub mod request;
pub mod servicenow;

pub use error::{TicketError, TicketResult};
pub use request::{ApprovalRequest, TicketKind, TicketPayload, TicketReceipt};
pub use servicenow::{ServiceNowClient, TicketSink, DEFAULT_APPROVAL_TABLE, DEFAULT_CHANGE_TABLE};
