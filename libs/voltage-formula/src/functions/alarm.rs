//! Alarm plug-in functions

use super::{arg, Arity, FunctionPlugin};
use crate::error::EvalResult;
use crate::value::{Alarm, AlarmSeverity, Payload, Timestamp, Value};

pub(super) fn __force_link() {}

inventory::submit! {
    FunctionPlugin {
        name: "highestSeverity",
        category: "alarm",
        description: "Name of the highest alarm severity among the arguments",
        arguments: &["a"],
        arity: Arity::AtLeast(1),
        compute: highest_severity,
    }
}

inventory::submit! {
    FunctionPlugin {
        name: "majorAlarm",
        category: "alarm",
        description: "1 with a MAJOR alarm if the condition holds, else 0 without alarm",
        arguments: &["condition", "message"],
        arity: Arity::Fixed(2),
        compute: major_alarm,
    }
}

inventory::submit! {
    FunctionPlugin {
        name: "minorAlarm",
        category: "alarm",
        description: "1 with a MINOR alarm if the condition holds, else 0 without alarm",
        arguments: &["condition", "message"],
        arity: Arity::Fixed(2),
        compute: minor_alarm,
    }
}

fn highest_severity(args: &[Value]) -> EvalResult<Value> {
    arg("highestSeverity", args, 0)?;
    let alarm = Alarm::highest(args);
    Ok(Value::new(
        Payload::Text(alarm.severity.as_str().to_string()),
        alarm,
        Timestamp::latest_of(args),
    ))
}

fn major_alarm(args: &[Value]) -> EvalResult<Value> {
    alarm_if("majorAlarm", args, AlarmSeverity::Major)
}

fn minor_alarm(args: &[Value]) -> EvalResult<Value> {
    alarm_if("minorAlarm", args, AlarmSeverity::Minor)
}

fn alarm_if(function: &str, args: &[Value], severity: AlarmSeverity) -> EvalResult<Value> {
    let condition = arg(function, args, 0)?;
    let message = arg(function, args, 1)?.to_text();
    let (result, alarm) = if condition.is_true() {
        (1.0, Alarm::of(severity, message))
    } else {
        (0.0, Alarm::none())
    };
    Ok(Value::new(Payload::Scalar(result), alarm, condition.time))
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    fn text_with(severity: AlarmSeverity, status: &str) -> Value {
        Value::text("x").with_alarm(Alarm::of(severity, status))
    }

    #[test]
    fn test_highest_severity() {
        let args = [
            text_with(AlarmSeverity::None, "NONE"),
            text_with(AlarmSeverity::Minor, "LOLO"),
            text_with(AlarmSeverity::Major, "HIHI"),
        ];
        let result = highest_severity(&args).unwrap();
        assert_eq!(result.as_text(), Some("MAJOR"));
        assert_eq!(result.alarm.status, "HIHI");
    }

    #[test]
    fn test_major_alarm() {
        let raised = major_alarm(&[Value::number(1.0), Value::text("Too hot")]).unwrap();
        assert_eq!(raised.to_double(), 1.0);
        assert_eq!(raised.alarm, Alarm::of(AlarmSeverity::Major, "Too hot"));

        let quiet = major_alarm(&[Value::number(0.0), Value::text("Too hot")]).unwrap();
        assert_eq!(quiet.to_double(), 0.0);
        assert_eq!(quiet.alarm, Alarm::none());
    }

    #[test]
    fn test_minor_alarm() {
        let raised = minor_alarm(&[Value::number(2.0), Value::text("Low")]).unwrap();
        assert_eq!(raised.alarm.severity, AlarmSeverity::Minor);
    }
}
