use chrono::Utc;
use tracing::{info, warn};

use frontdesk_core::domain::call::ExternalCallId;
use frontdesk_core::domain::task::TaskRequest;
use frontdesk_core::speech::{self, FallbackPhrase};

use super::args::CreateTaskArgs;
use super::context::require_call;
use super::VoiceState;

impl From<CreateTaskArgs> for TaskRequest {
    fn from(args: CreateTaskArgs) -> Self {
        Self {
            title: args.title,
            description: args.description,
            task_type: args.task_type,
            due_date: args.due_date,
            priority: args.priority,
        }
    }
}

pub async fn create_task(
    state: &VoiceState,
    call_id: &ExternalCallId,
    args: CreateTaskArgs,
) -> Result<String, FallbackPhrase> {
    let call = require_call(state, call_id, FallbackPhrase::TaskNoted).await?;
    let task = TaskRequest::from(args).normalize(
        call.organization_id.clone(),
        call.customer_id.clone(),
        Some(call.id.clone()),
        Utc::now(),
    );

    let created = state.tasks.create(task).await.map_err(|error| {
        warn!(
            event_name = "voice.task.create_failed",
            call_id = %call_id,
            organization_id = %call.organization_id,
            error = %error,
            "task insert failed"
        );
        FallbackPhrase::TaskNotSaved
    })?;

    info!(
        event_name = "voice.task.created",
        call_id = %call_id,
        organization_id = %call.organization_id,
        task_type = created.task_type.as_str(),
        due_date = %created.due_date,
        "task created from call"
    );
    Ok(speech::task_created(created.task_type, created.due_date))
}
