//! Response payloads of the Gizmo report endpoints.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewReport {
    /// ISO-like date-time, e.g. "2024-01-01T00:00:00".
    pub date_from: String,
    pub date_to: String,
    pub operators_statistics: Vec<OperatorStatistics>,
    /// "Xh Ym" text, despite the name.
    pub average_member_usage_period_minutes: String,
    pub average_guest_usage_period_minutes: String,
    pub average_utilization_percentage: f64,
    pub unique_members_logins: i64,
    pub unique_guests_logins: i64,
    pub member_counters: MemberCounters,
    pub utilization_chart: Vec<UtilizationEntry>,
    pub financial_chart: Vec<ChartEntry>,
    pub total_pay_in_out: f64,
    pub total_revenue: f64,
    pub average_revenue_per_member: f64,
    pub average_revenue_per_guest: f64,
    pub revenue_per_group: Vec<ChartEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorStatistics {
    pub operator_id: i64,
    pub operator_name: String,
    #[serde(deserialize_with = "integer_or_numeric_text")]
    pub minutes_worked: i64,
    pub hours_worked: String,
    #[serde(deserialize_with = "integer_or_numeric_text")]
    pub minutes_sold: i64,
    pub hours_sold: String,
    pub products_sold: i64,
    pub time_offers_sold: i64,
    pub bundles_sold: i64,
    pub voids: i64,
    pub register_transactions_total: f64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberCounters {
    pub new_members: i64,
    pub total_members: i64,
    pub banned_members: i64,
}

/// A point of a chart. For the financial chart `name` is a "M/d/yyyy" date,
/// for revenue per group it is the user group name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChartEntry {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationEntry {
    /// "M/d/yyyy" date.
    pub name: String,
    pub value: f64,
    pub total_seconds: i64,
    pub used_seconds: i64,
}

// some Gizmo versions send minute counters as strings
fn integer_or_numeric_text<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Integer(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Integer(value) => Ok(value),
        Raw::Text(text) => text.trim().parse().map_err(|_| {
            serde::de::Error::custom(format!("expected an integer, got \"{text}\""))
        }),
    }
}
