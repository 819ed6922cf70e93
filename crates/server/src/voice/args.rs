use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One decoded tool call. The function name selects the variant; `args` fill its struct.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolInvocation {
    SaveCustomerInfo(SaveCustomerInfoArgs),
    CreateTask(CreateTaskArgs),
    CheckAvailability(CheckAvailabilityArgs),
    BookAppointment(BookAppointmentArgs),
    Unknown(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SaveCustomerInfoArgs {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CreateTaskArgs {
    pub title: Option<String>,
    pub description: Option<String>,
    pub task_type: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CheckAvailabilityArgs {
    pub date: Option<String>,
    #[serde(deserialize_with = "lenient_minutes")]
    pub duration_minutes: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BookAppointmentArgs {
    pub title: Option<String>,
    pub start_time: Option<String>,
    #[serde(deserialize_with = "lenient_minutes")]
    pub duration_minutes: Option<u32>,
    pub attendee_name: Option<String>,
    pub attendee_email: Option<String>,
    pub attendee_phone: Option<String>,
}

impl ToolInvocation {
    /// A missing or `null` args value decodes as an empty object.
    pub fn decode(name: &str, args: Value) -> Result<Self, serde_json::Error> {
        let args = if args.is_null() { Value::Object(Default::default()) } else { args };
        Ok(match name {
            "save_customer_info" => Self::SaveCustomerInfo(serde_json::from_value(args)?),
            "create_task" => Self::CreateTask(serde_json::from_value(args)?),
            "check_availability" => Self::CheckAvailability(serde_json::from_value(args)?),
            "book_appointment" => Self::BookAppointment(serde_json::from_value(args)?),
            other => Self::Unknown(other.to_string()),
        })
    }

    pub fn function_name(&self) -> &str {
        match self {
            Self::SaveCustomerInfo(_) => "save_customer_info",
            Self::CreateTask(_) => "create_task",
            Self::CheckAvailability(_) => "check_availability",
            Self::BookAppointment(_) => "book_appointment",
            Self::Unknown(name) => name,
        }
    }
}

/// Accepts `30`, `30.0`, or `"30"`. Zero, negatives and anything unreadable mean "use the
/// default".
fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let minutes = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(minutes
        .filter(|minutes| minutes.is_finite() && *minutes >= 1.0 && *minutes <= f64::from(u32::MAX))
        .map(|minutes| minutes.round() as u32))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{BookAppointmentArgs, CheckAvailabilityArgs, ToolInvocation};

    #[test]
    fn known_names_select_their_argument_shape() {
        let invocation =
            ToolInvocation::decode("check_availability", json!({ "date": "2025-06-10" }))
                .expect("decode");

        assert_eq!(
            invocation,
            ToolInvocation::CheckAvailability(CheckAvailabilityArgs {
                date: Some("2025-06-10".to_string()),
                duration_minutes: None,
            })
        );
        assert_eq!(invocation.function_name(), "check_availability");
    }

    #[test]
    fn unknown_names_are_preserved() {
        let invocation = ToolInvocation::decode("transfer_call", json!({})).expect("decode");
        assert_eq!(invocation, ToolInvocation::Unknown("transfer_call".to_string()));
    }

    #[test]
    fn null_args_mean_empty_args() {
        let invocation = ToolInvocation::decode("create_task", serde_json::Value::Null).expect("decode");
        assert!(matches!(invocation, ToolInvocation::CreateTask(args) if args.title.is_none()));
    }

    #[test]
    fn duration_accepts_numbers_and_numeric_strings() {
        for (raw, expected) in [
            (json!(45), Some(45)),
            (json!(45.0), Some(45)),
            (json!("60"), Some(60)),
            (json!(0), None),
            (json!(-15), None),
            (json!("soon"), None),
            (json!(null), None),
        ] {
            let invocation = ToolInvocation::decode(
                "book_appointment",
                json!({ "start_time": "2025-06-10T14:00:00Z", "duration_minutes": raw }),
            )
            .expect("decode");
            let ToolInvocation::BookAppointment(BookAppointmentArgs { duration_minutes, .. }) =
                invocation
            else {
                panic!("expected book_appointment");
            };
            assert_eq!(duration_minutes, expected);
        }
    }

    #[test]
    fn wrongly_typed_fields_are_a_decode_error() {
        let result = ToolInvocation::decode("save_customer_info", json!({ "customer_name": 42 }));
        assert!(result.is_err());
        assert!(ToolInvocation::decode("create_task", json!("not an object")).is_err());
    }
}
