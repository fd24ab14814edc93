//! Conversion between subscription records and Firestore REST documents.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::subscriptions::types::{
    NewSubscription, Subscription, SubscriptionStatus, SubscriptionUpdate,
};

/// A document as returned by the REST API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name, ending in the document ID.
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    /// Last path segment of the resource name.
    #[must_use]
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// One element of a `runQuery` response stream.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub document: Option<Document>,
}

pub fn string_value(value: &str) -> Value {
    json!({ "stringValue": value })
}

pub fn double_value(value: f64) -> Value {
    json!({ "doubleValue": value })
}

pub fn timestamp_value(value: DateTime<Utc>) -> Value {
    json!({ "timestampValue": value.to_rfc3339_opts(SecondsFormat::Micros, true) })
}

/// Encode every field of a new subscription.
pub fn encode_new(subscription: &NewSubscription) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("userId".into(), string_value(&subscription.user_id));
    fields.insert("planId".into(), string_value(&subscription.plan_id));
    fields.insert("status".into(), string_value(subscription.status.as_str()));
    fields.insert("startDate".into(), timestamp_value(subscription.start_date));
    fields.insert("endDate".into(), timestamp_value(subscription.end_date));
    fields.insert("paymentId".into(), string_value(&subscription.payment_id));
    fields.insert("amount".into(), double_value(subscription.amount));
    fields.insert("currency".into(), string_value(&subscription.currency));
    fields
}

/// Encode the set fields of an update, with the matching update-mask paths.
pub fn encode_update(update: &SubscriptionUpdate) -> (Map<String, Value>, Vec<String>) {
    let mut fields = Map::new();

    if let Some(plan_id) = &update.plan_id {
        fields.insert("planId".into(), string_value(plan_id));
    }
    if let Some(status) = update.status {
        fields.insert("status".into(), string_value(status.as_str()));
    }
    if let Some(start_date) = update.start_date {
        fields.insert("startDate".into(), timestamp_value(start_date));
    }
    if let Some(end_date) = update.end_date {
        fields.insert("endDate".into(), timestamp_value(end_date));
    }
    if let Some(payment_id) = &update.payment_id {
        fields.insert("paymentId".into(), string_value(payment_id));
    }
    if let Some(amount) = update.amount {
        fields.insert("amount".into(), double_value(amount));
    }
    if let Some(currency) = &update.currency {
        fields.insert("currency".into(), string_value(currency));
    }

    let mask = fields.keys().cloned().collect();
    (fields, mask)
}

/// Decode a stored document into a subscription.
///
/// # Errors
///
/// Returns a description of the first missing or mistyped field.
pub fn decode(document: &Document) -> Result<Subscription, String> {
    let fields = &document.fields;

    Ok(Subscription {
        id: document.id().to_string(),
        user_id: get_string(fields, "userId")?,
        plan_id: get_string(fields, "planId")?,
        status: SubscriptionStatus::parse(&get_string(fields, "status")?),
        start_date: get_timestamp(fields, "startDate")?,
        end_date: get_timestamp(fields, "endDate")?,
        payment_id: get_string(fields, "paymentId")?,
        amount: get_double(fields, "amount")?,
        currency: get_string(fields, "currency")?,
        created_at: get_timestamp(fields, "createdAt").ok().or(document.create_time),
        updated_at: get_timestamp(fields, "updatedAt").ok().or(document.update_time),
    })
}

fn field<'a>(fields: &'a Map<String, Value>, key: &str) -> Result<&'a Value, String> {
    fields.get(key).ok_or_else(|| format!("missing field `{key}`"))
}

fn get_string(fields: &Map<String, Value>, key: &str) -> Result<String, String> {
    field(fields, key)?
        .get("stringValue")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| format!("field `{key}` is not a string"))
}

fn get_double(fields: &Map<String, Value>, key: &str) -> Result<f64, String> {
    let value = field(fields, key)?;

    if let Some(d) = value.get("doubleValue").and_then(Value::as_f64) {
        return Ok(d);
    }
    // integerValue is transmitted as a decimal string
    value
        .get("integerValue")
        .and_then(|v| match v {
            Value::String(s) => s.parse::<i64>().ok(),
            other => other.as_i64(),
        })
        .map(|i| i as f64)
        .ok_or_else(|| format!("field `{key}` is not a number"))
}

fn get_timestamp(fields: &Map<String, Value>, key: &str) -> Result<DateTime<Utc>, String> {
    let raw = field(fields, key)?
        .get("timestampValue")
        .and_then(Value::as_str)
        .ok_or_else(|| format!("field `{key}` is not a timestamp"))?;

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("field `{key}`: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample() -> NewSubscription {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        NewSubscription {
            user_id: "u1".to_string(),
            plan_id: "premium".to_string(),
            status: SubscriptionStatus::Active,
            start_date: start,
            end_date: start + Duration::days(30),
            payment_id: "ch_123".to_string(),
            amount: 49.99,
            currency: "ZAR".to_string(),
        }
    }

    #[test]
    fn test_encode_new_wire_shape() {
        let fields = encode_new(&sample());

        assert_eq!(fields["userId"], json!({"stringValue": "u1"}));
        assert_eq!(fields["status"], json!({"stringValue": "active"}));
        assert_eq!(fields["amount"], json!({"doubleValue": 49.99}));
        assert_eq!(
            fields["startDate"],
            json!({"timestampValue": "2024-03-01T12:00:00.000000Z"})
        );
        assert!(!fields.contains_key("createdAt"));
    }

    #[test]
    fn test_decode_stored_document() {
        let mut fields = encode_new(&sample());
        fields.insert(
            "createdAt".into(),
            json!({"timestampValue": "2024-03-01T12:00:01.5Z"}),
        );
        let document = Document {
            name: "projects/p/databases/(default)/documents/subscriptions/abc123".to_string(),
            fields,
            create_time: None,
            update_time: None,
        };

        let sub = decode(&document).unwrap();
        assert_eq!(sub.id, "abc123");
        assert_eq!(sub.user_id, "u1");
        assert_eq!(sub.end_date - sub.start_date, Duration::days(30));
        assert!(sub.created_at.is_some());
        assert!(sub.updated_at.is_none());
    }

    #[test]
    fn test_decode_integer_amount() {
        let mut fields = encode_new(&sample());
        fields.insert("amount".into(), json!({"integerValue": "100"}));
        let document = Document {
            name: "x/subscriptions/id".to_string(),
            fields,
            create_time: None,
            update_time: None,
        };

        assert_eq!(decode(&document).unwrap().amount, 100.0);
    }

    #[test]
    fn test_decode_reports_missing_field() {
        let mut fields = encode_new(&sample());
        fields.remove("planId");
        let document = Document {
            name: "x/subscriptions/id".to_string(),
            fields,
            create_time: None,
            update_time: None,
        };

        assert_eq!(decode(&document).unwrap_err(), "missing field `planId`");
    }

    #[test]
    fn test_encode_update_mask() {
        let (fields, mask) = encode_update(&SubscriptionUpdate::status(SubscriptionStatus::Cancelled));
        assert_eq!(fields["status"], json!({"stringValue": "cancelled"}));
        assert_eq!(mask, vec!["status".to_string()]);
    }
}
