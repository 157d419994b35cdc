//! Domain model (ids, task messages, commands, reports, errors).

pub mod envelope;
pub mod errors;
pub mod ids;
pub mod outcome;
pub mod report;
pub mod task;

pub use self::envelope::Delivery;
pub use self::errors::{ConnectivityError, DispatchError, ErrorKind, TransportError, ValidationError};
pub use self::ids::{CorrelationId, DeliveryId};
pub use self::outcome::RequestOutcome;
pub use self::report::{Notification, NotifyOutcome, StatusReport};
pub use self::task::{
    CodeValue, DEFAULT_EXPECTED_CODE, HttpCommand, HttpTask, RequestBody, TaskMessage, Verb,
};
