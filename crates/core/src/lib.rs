pub mod config;
pub mod domain;
pub mod errors;
pub mod scheduling;
pub mod speech;

pub use domain::calendar::{
    AppointmentDraft, BusyPeriod, CalendarEvent, CalendarEventId, EventStatus, NewCalendarEvent,
    UserId,
};
pub use domain::call::{CallRecord, CallRecordId, ExternalCallId, OrganizationId};
pub use domain::customer::{Customer, CustomerId, CustomerPatch, NewCustomer, PersonName};
pub use domain::provider_settings::{ExternalCalendarSettings, ProviderCredentials};
pub use domain::task::{NewTask, Task, TaskId, TaskPriority, TaskRequest, TaskStatus, TaskType};
pub use errors::{DomainError, InterfaceError};
pub use scheduling::{
    find_gaps, AvailabilitySlot, BusinessWindow, CalendarProvider, ProviderAvailability,
    ProviderBooking, ProviderError, SlotSpec,
};
pub use speech::FallbackPhrase;
