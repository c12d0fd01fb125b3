pub mod config;
pub mod dispatch;
pub mod metrics;
pub mod queue;
pub mod registration;
pub mod ticket;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ServerConfig,
};
pub use dispatch::{
    CallTrigger, DispatchConfig, DispatchMachine, DispatchPhase, DispatchStatus, Dispatcher,
    QueueEvent,
};
pub use queue::{EntryState, QueueEntry, QueueError, QueueSnapshot, QueueStore};
pub use registration::{
    PatientForm, Registrar, Registration, RegistrationConfig, RegistrationError,
};
pub use ticket::{PriorityClass, Ticket, TicketCode, TicketCodeError};
