//! Value model
//!
//! A [`Value`] is an immutable snapshot of a process value: a data payload
//! plus the quality metadata (alarm and timestamp) that has to travel with it
//! through every operator of a formula.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Alarm
// ============================================================================

/// Alarm severity, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmSeverity {
    #[default]
    None,
    Minor,
    Major,
    Invalid,
    Disconnected,
}

impl AlarmSeverity {
    /// Ranking used when combining alarms. Invalid and Disconnected rank equal.
    pub fn rank(self) -> u8 {
        match self {
            AlarmSeverity::None => 0,
            AlarmSeverity::Minor => 1,
            AlarmSeverity::Major => 2,
            AlarmSeverity::Invalid | AlarmSeverity::Disconnected => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmSeverity::None => "NONE",
            AlarmSeverity::Minor => "MINOR",
            AlarmSeverity::Major => "MAJOR",
            AlarmSeverity::Invalid => "INVALID",
            AlarmSeverity::Disconnected => "DISCONNECTED",
        }
    }
}

impl fmt::Display for AlarmSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alarm state: severity plus a status name (e.g. "HIHI", "LOLO")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Alarm {
    pub severity: AlarmSeverity,
    pub status: String,
}

impl Alarm {
    pub fn of(severity: AlarmSeverity, status: impl Into<String>) -> Self {
        Self {
            severity,
            status: status.into(),
        }
    }

    pub fn none() -> Self {
        Self::of(AlarmSeverity::None, "NONE")
    }

    pub fn disconnected() -> Self {
        Self::of(AlarmSeverity::Disconnected, "Disconnected")
    }

    /// The worse of two alarms; on equal rank the left one wins
    pub fn worst<'a>(&'a self, other: &'a Alarm) -> &'a Alarm {
        if other.severity.rank() > self.severity.rank() {
            other
        } else {
            self
        }
    }

    /// Highest alarm of a set of values (`Alarm::none()` for an empty set)
    pub fn highest<'a>(values: impl IntoIterator<Item = &'a Value>) -> Alarm {
        let mut result: Option<&Alarm> = None;
        for value in values {
            result = Some(match result {
                Some(alarm) => alarm.worst(&value.alarm),
                None => &value.alarm,
            });
        }
        result.cloned().unwrap_or_else(Alarm::none)
    }
}

impl Default for Alarm {
    fn default() -> Self {
        Self::none()
    }
}

// ============================================================================
// Timestamp
// ============================================================================

/// Timestamp as seconds plus nanoseconds since the Unix epoch
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Timestamp {
    pub secs: i64,
    pub nanos: u32,
}

impl Timestamp {
    pub fn new(secs: i64, nanos: u32) -> Self {
        Self { secs, nanos }
    }

    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// The later of two timestamps
    pub fn latest(self, other: Timestamp) -> Timestamp {
        self.max(other)
    }

    /// Latest timestamp of a set of values (`now` for an empty set)
    pub fn latest_of<'a>(values: impl IntoIterator<Item = &'a Value>) -> Timestamp {
        values
            .into_iter()
            .map(|v| v.time)
            .max()
            .unwrap_or_else(Timestamp::now)
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.secs, self.nanos)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            secs: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.9fZ")),
            None => write!(f, "{}.{:09}", self.secs, self.nanos),
        }
    }
}

// ============================================================================
// Payload
// ============================================================================

/// Pixel layout of an image payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Mono8,
    Mono16,
    Rgb8,
    Rgba8,
}

/// Statistics aggregate (e.g. archived data reduced to bins)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    pub average: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub count: u32,
}

/// Data carried by a [`Value`]
///
/// Equality treats NaN as equal to NaN, so a value read from an unbound
/// variable compares equal to itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    Scalar(f64),
    Text(String),
    Enum {
        index: i64,
        choices: Vec<String>,
    },
    Array {
        data: Vec<f64>,
        shape: Vec<usize>,
    },
    EnumArray {
        indexes: Vec<i64>,
        choices: Vec<String>,
    },
    Statistics(Statistics),
    Image {
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
    },
}

/// Numeric equality with NaN equal to NaN
fn same_number(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

fn same_numbers(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_number(*x, *y))
}

impl PartialEq for Statistics {
    fn eq(&self, other: &Self) -> bool {
        same_number(self.average, other.average)
            && same_number(self.std_dev, other.std_dev)
            && same_number(self.min, other.min)
            && same_number(self.max, other.max)
            && self.count == other.count
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Payload::Scalar(a), Payload::Scalar(b)) => same_number(*a, *b),
            (Payload::Text(a), Payload::Text(b)) => a == b,
            (
                Payload::Enum { index, choices },
                Payload::Enum {
                    index: other_index,
                    choices: other_choices,
                },
            ) => index == other_index && choices == other_choices,
            (
                Payload::Array { data, shape },
                Payload::Array {
                    data: other_data,
                    shape: other_shape,
                },
            ) => shape == other_shape && same_numbers(data, other_data),
            (
                Payload::EnumArray { indexes, choices },
                Payload::EnumArray {
                    indexes: other_indexes,
                    choices: other_choices,
                },
            ) => indexes == other_indexes && choices == other_choices,
            (Payload::Statistics(a), Payload::Statistics(b)) => a == b,
            (
                Payload::Image {
                    data,
                    width,
                    height,
                    format,
                },
                Payload::Image {
                    data: other_data,
                    width: other_width,
                    height: other_height,
                    format: other_format,
                },
            ) => {
                width == other_width
                    && height == other_height
                    && format == other_format
                    && data == other_data
            },
            _ => false,
        }
    }
}

fn enum_label(index: i64, choices: &[String]) -> String {
    usize::try_from(index)
        .ok()
        .and_then(|i| choices.get(i))
        .cloned()
        .unwrap_or_else(|| index.to_string())
}

// ============================================================================
// Value
// ============================================================================

/// Immutable snapshot of a computed or received quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub payload: Payload,
    pub alarm: Alarm,
    pub time: Timestamp,
}

impl Value {
    pub fn new(payload: Payload, alarm: Alarm, time: Timestamp) -> Self {
        Self {
            payload,
            alarm,
            time,
        }
    }

    /// Scalar without alarm, stamped now
    pub fn number(value: f64) -> Self {
        Self::new(Payload::Scalar(value), Alarm::none(), Timestamp::now())
    }

    /// Text without alarm, stamped now
    pub fn text(value: impl Into<String>) -> Self {
        Self::new(Payload::Text(value.into()), Alarm::none(), Timestamp::now())
    }

    /// One-dimensional numeric array without alarm, stamped now
    pub fn array(data: Vec<f64>) -> Self {
        let shape = vec![data.len()];
        Self::new(Payload::Array { data, shape }, Alarm::none(), Timestamp::now())
    }

    /// Result of an operation over `inputs`: worst alarm, latest timestamp
    pub fn derived<'a>(payload: Payload, inputs: impl IntoIterator<Item = &'a Value> + Clone) -> Self {
        Self {
            payload,
            alarm: Alarm::highest(inputs.clone()),
            time: Timestamp::latest_of(inputs),
        }
    }

    /// Scalar result of a binary operation
    pub fn combine(result: f64, left: &Value, right: &Value) -> Self {
        Self {
            payload: Payload::Scalar(result),
            alarm: left.alarm.worst(&right.alarm).clone(),
            time: left.time.latest(right.time),
        }
    }

    /// Same metadata, new payload
    pub fn with_payload(&self, payload: Payload) -> Self {
        Self {
            payload,
            alarm: self.alarm.clone(),
            time: self.time,
        }
    }

    pub fn with_alarm(mut self, alarm: Alarm) -> Self {
        self.alarm = alarm;
        self
    }

    pub fn with_time(mut self, time: Timestamp) -> Self {
        self.time = time;
        self
    }

    /// Numeric coercion used by arithmetic and comparison
    ///
    /// Never fails: anything without a numeric reading is NaN.
    pub fn to_double(&self) -> f64 {
        match &self.payload {
            Payload::Scalar(v) => *v,
            Payload::Enum { index, .. } => *index as f64,
            Payload::Statistics(stats) => stats.average,
            Payload::Array { data, .. } => data.first().copied().unwrap_or(f64::NAN),
            Payload::EnumArray { indexes, .. } => {
                indexes.first().map(|i| *i as f64).unwrap_or(f64::NAN)
            },
            Payload::Text(_) | Payload::Image { .. } => f64::NAN,
        }
    }

    /// Truth value: anything that does not coerce to 0.0 (NaN included)
    pub fn is_true(&self) -> bool {
        self.to_double() != 0.0
    }

    pub fn is_text(&self) -> bool {
        matches!(self.payload, Payload::Text(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Textual form used for concatenation and display
    pub fn to_text(&self) -> String {
        match &self.payload {
            Payload::Scalar(v) => v.to_string(),
            Payload::Text(s) => s.clone(),
            Payload::Enum { index, choices } => enum_label(*index, choices),
            Payload::Array { data, .. } => {
                let items: Vec<String> = data.iter().map(|v| v.to_string()).collect();
                format!("[{}]", items.join(", "))
            },
            Payload::EnumArray { indexes, choices } => {
                let items: Vec<String> = indexes.iter().map(|i| enum_label(*i, choices)).collect();
                format!("[{}]", items.join(", "))
            },
            Payload::Statistics(stats) => stats.average.to_string(),
            Payload::Image {
                width,
                height,
                format,
                ..
            } => format!("Image {}x{} {:?}", width, height, format),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())?;
        if self.alarm.severity != AlarmSeverity::None {
            write!(f, " {} {}", self.alarm.severity, self.alarm.status)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    fn at(value: f64, severity: AlarmSeverity, secs: i64) -> Value {
        Value::new(
            Payload::Scalar(value),
            Alarm::of(severity, severity.as_str()),
            Timestamp::new(secs, 0),
        )
    }

    #[test]
    fn test_to_double_coercion() {
        assert_eq!(Value::number(2.5).to_double(), 2.5);
        assert!(Value::text("3").to_double().is_nan());

        let e = Value::new(
            Payload::Enum {
                index: 2,
                choices: vec!["a".into(), "b".into(), "c".into()],
            },
            Alarm::none(),
            Timestamp::now(),
        );
        assert_eq!(e.to_double(), 2.0);

        assert_eq!(Value::array(vec![4.0, 5.0]).to_double(), 4.0);
        assert!(Value::array(vec![]).to_double().is_nan());

        let stats = Value::number(0.0).with_payload(Payload::Statistics(Statistics {
            average: 7.5,
            std_dev: 1.0,
            min: 5.0,
            max: 10.0,
            count: 4,
        }));
        assert_eq!(stats.to_double(), 7.5);

        let image = Value::number(0.0).with_payload(Payload::Image {
            data: vec![0; 4],
            width: 2,
            height: 2,
            format: PixelFormat::Mono8,
        });
        assert!(image.to_double().is_nan());
    }

    #[test]
    fn test_combine_metadata() {
        let a = at(1.0, AlarmSeverity::None, 10);
        let b = at(2.0, AlarmSeverity::Major, 20);

        let sum = Value::combine(3.0, &a, &b);
        assert_eq!(sum.alarm.severity, AlarmSeverity::Major);
        assert_eq!(sum.time, Timestamp::new(20, 0));

        let sum = Value::combine(3.0, &b, &a);
        assert_eq!(sum.alarm.severity, AlarmSeverity::Major);
        assert_eq!(sum.time, Timestamp::new(20, 0));
    }

    #[test]
    fn test_invalid_and_disconnected_rank_equal() {
        let invalid = at(1.0, AlarmSeverity::Invalid, 0);
        let disconnected = at(1.0, AlarmSeverity::Disconnected, 0);

        assert_eq!(
            invalid.alarm.worst(&disconnected.alarm).severity,
            AlarmSeverity::Invalid
        );
        assert_eq!(
            disconnected.alarm.worst(&invalid.alarm).severity,
            AlarmSeverity::Disconnected
        );
    }

    #[test]
    fn test_highest_alarm() {
        let values = [
            at(1.0, AlarmSeverity::Minor, 1),
            at(1.0, AlarmSeverity::Major, 3),
            at(1.0, AlarmSeverity::None, 2),
        ];
        assert_eq!(Alarm::highest(&values).severity, AlarmSeverity::Major);
        assert_eq!(Timestamp::latest_of(&values), Timestamp::new(3, 0));
        assert_eq!(Alarm::highest(std::iter::empty()), Alarm::none());
    }

    #[test]
    fn test_text_forms() {
        assert_eq!(Value::number(3.0).to_text(), "3");
        assert_eq!(Value::array(vec![1.0, 2.5]).to_text(), "[1, 2.5]");

        let e = Value::number(0.0).with_payload(Payload::Enum {
            index: 1,
            choices: vec!["Off".into(), "On".into()],
        });
        assert_eq!(e.to_text(), "On");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::number(0.0).is_true());
        assert!(Value::number(-1.0).is_true());
        assert!(Value::number(f64::NAN).is_true());
    }

    #[test]
    fn test_nan_payloads_compare_equal() {
        let unbound = at(f64::NAN, AlarmSeverity::Invalid, 5);
        assert_eq!(unbound, unbound.clone());
        assert_ne!(unbound, at(1.0, AlarmSeverity::Invalid, 5));
        let array = Value::array(vec![f64::NAN, 1.0]);
        assert_eq!(array.payload, array.clone().payload);
        assert_ne!(Payload::Scalar(1.0), Payload::Text("1".into()));
        assert_eq!(Payload::Scalar(0.0), Payload::Scalar(-0.0));
    }

    #[test]
    fn test_timestamp_display() {
        let ts = Timestamp::new(0, 5);
        assert_eq!(ts.to_string(), "1970-01-01T00:00:00.000000005Z");
    }

    #[test]
    fn test_value_serialization() {
        let value = at(1.5, AlarmSeverity::Minor, 42);
        let json = serde_json::to_string(&value).unwrap();
        assert!(json.contains("\"MINOR\""));
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
