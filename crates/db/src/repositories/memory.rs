use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use frontdesk_core::domain::calendar::{
    CalendarEvent, CalendarEventId, EventStatus, NewCalendarEvent, UserId,
};
use frontdesk_core::domain::call::{CallRecord, CallRecordId, ExternalCallId, OrganizationId};
use frontdesk_core::domain::customer::{Customer, CustomerId, CustomerPatch, NewCustomer};
use frontdesk_core::domain::provider_settings::ExternalCalendarSettings;
use frontdesk_core::domain::task::{NewTask, Task, TaskId};

use super::{
    new_id, CalendarEventRepository, CallRecordRepository, CustomerRepository,
    OrganizationRepository, ProviderSettingsRepository, RepositoryError, TaskRepository,
};

#[derive(Default)]
pub struct InMemoryCallRecordRepository {
    records: RwLock<HashMap<String, CallRecord>>,
}

#[async_trait::async_trait]
impl CallRecordRepository for InMemoryCallRecordRepository {
    async fn find_by_external_id(
        &self,
        external_call_id: &ExternalCallId,
    ) -> Result<Option<CallRecord>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.values().find(|record| &record.external_call_id == external_call_id).cloned())
    }

    async fn link_customer(
        &self,
        id: &CallRecordId,
        customer_id: &CustomerId,
    ) -> Result<bool, RepositoryError> {
        let mut records = self.records.write().await;
        match records.get_mut(&id.0) {
            Some(record) if record.customer_id.is_none() => {
                record.customer_id = Some(customer_id.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn save(&self, mut record: CallRecord) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        if let Some(existing) = records.get(&record.id.0) {
            if existing.customer_id.is_some() {
                record.customer_id = existing.customer_id.clone();
            }
        }
        records.insert(record.id.0.clone(), record);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: RwLock<HashMap<String, Customer>>,
}

#[async_trait::async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let customers = self.customers.read().await;
        Ok(customers.get(&id.0).cloned())
    }

    async fn create(&self, customer: NewCustomer) -> Result<Customer, RepositoryError> {
        let now = Utc::now();
        let created = Customer {
            id: CustomerId(new_id("CUS")),
            organization_id: customer.organization_id,
            name: customer.name,
            first_name: customer.first_name,
            last_name: customer.last_name,
            email: customer.email,
            phone: customer.phone,
            status: customer.status,
            priority: customer.priority,
            country: customer.country,
            tags: customer.tags,
            created_at: now,
            updated_at: now,
        };
        let mut customers = self.customers.write().await;
        customers.insert(created.id.0.clone(), created.clone());
        Ok(created)
    }

    async fn apply_patch(
        &self,
        id: &CustomerId,
        patch: &CustomerPatch,
    ) -> Result<(), RepositoryError> {
        let mut customers = self.customers.write().await;
        let customer = customers
            .get_mut(&id.0)
            .ok_or_else(|| RepositoryError::NotFound(format!("customer {id}")))?;

        if let Some(name) = &patch.name {
            customer.name = name.full.clone();
            customer.first_name = Some(name.first.clone());
            customer.last_name = Some(name.last.clone()).filter(|last| !last.is_empty());
        }
        if let Some(email) = &patch.email {
            customer.email = Some(email.clone());
        }
        customer.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<Vec<Task>>,
}

#[async_trait::async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, task: NewTask) -> Result<Task, RepositoryError> {
        let created = Task {
            id: TaskId(new_id("TSK")),
            organization_id: task.organization_id,
            customer_id: task.customer_id,
            call_record_id: task.call_record_id,
            title: task.title,
            description: task.description,
            task_type: task.task_type,
            priority: task.priority,
            status: task.status,
            due_date: task.due_date,
            duration_minutes: task.duration_minutes,
            show_on_calendar: task.show_on_calendar,
            created_at: Utc::now(),
        };
        self.tasks.write().await.push(created.clone());
        Ok(created)
    }

    async fn list_for_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Task>, RepositoryError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().filter(|task| &task.organization_id == organization_id).cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryCalendarEventRepository {
    events: RwLock<Vec<CalendarEvent>>,
}

#[async_trait::async_trait]
impl CalendarEventRepository for InMemoryCalendarEventRepository {
    async fn create(&self, event: NewCalendarEvent) -> Result<CalendarEvent, RepositoryError> {
        let created = CalendarEvent {
            id: CalendarEventId(new_id("EVT")),
            organization_id: event.organization_id,
            user_id: event.user_id,
            customer_id: event.customer_id,
            title: event.title,
            event_type: event.event_type,
            start_time: event.start_time,
            end_time: event.end_time,
            status: event.status,
            attendee_name: event.attendee_name,
            attendee_email: event.attendee_email,
            attendee_phone: event.attendee_phone,
            external_booking_ref: event.external_booking_ref,
            color: event.color,
            is_recurring: event.is_recurring,
            attendees: event.attendees,
            reminders: event.reminders,
            metadata: event.metadata,
            created_at: Utc::now(),
        };
        self.events.write().await.push(created.clone());
        Ok(created)
    }

    async fn list_active_between(
        &self,
        organization_id: &OrganizationId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, RepositoryError> {
        let events = self.events.read().await;
        let mut active: Vec<CalendarEvent> = events
            .iter()
            .filter(|event| &event.organization_id == organization_id)
            .filter(|event| event.status != EventStatus::Cancelled)
            .filter(|event| event.start_time <= to && event.end_time > from)
            .cloned()
            .collect();
        active.sort_by_key(|event| event.start_time);
        Ok(active)
    }

    async fn list_for_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<CalendarEvent>, RepositoryError> {
        let events = self.events.read().await;
        let mut owned: Vec<CalendarEvent> =
            events.iter().filter(|event| &event.organization_id == organization_id).cloned().collect();
        owned.sort_by_key(|event| event.start_time);
        Ok(owned)
    }
}

#[derive(Default)]
pub struct InMemoryProviderSettingsRepository {
    settings: RwLock<HashMap<String, ExternalCalendarSettings>>,
}

#[async_trait::async_trait]
impl ProviderSettingsRepository for InMemoryProviderSettingsRepository {
    async fn find_for_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Option<ExternalCalendarSettings>, RepositoryError> {
        let settings = self.settings.read().await;
        Ok(settings.get(&organization_id.0).cloned())
    }

    async fn save(&self, settings: ExternalCalendarSettings) -> Result<(), RepositoryError> {
        let mut stored = self.settings.write().await;
        stored.insert(settings.organization_id.0.clone(), settings);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryOrganizationRepository {
    owners: RwLock<HashMap<String, UserId>>,
}

impl InMemoryOrganizationRepository {
    pub async fn set_owner(&self, organization_id: &OrganizationId, user_id: UserId) {
        self.owners.write().await.insert(organization_id.0.clone(), user_id);
    }
}

#[async_trait::async_trait]
impl OrganizationRepository for InMemoryOrganizationRepository {
    async fn find_owner(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Option<UserId>, RepositoryError> {
        let owners = self.owners.read().await;
        Ok(owners.get(&organization_id.0).cloned())
    }
}
