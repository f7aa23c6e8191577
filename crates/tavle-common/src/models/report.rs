use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive date range a report is scoped to. `start <= end` always holds;
/// construction is the only way to get one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl ReportPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            bail!("Period start {} is after end {}", start, end);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Body of `/api/employees/`; dates serialize as ISO `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeesRequest {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

impl From<&ReportPeriod> for EmployeesRequest {
    fn from(period: &ReportPeriod) -> Self {
        Self {
            period_start: period.start,
            period_end: period.end,
        }
    }
}

/// One report row. The backend owns the shape; the client treats it as an
/// opaque field-to-value mapping.
pub type EmployeeRecord = serde_json::Map<String, serde_json::Value>;

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_period_rejects_inverted_range() {
        assert!(ReportPeriod::new(date("2024-03-31"), date("2024-03-01")).is_err());
        assert!(ReportPeriod::new(date("2024-03-01"), date("2024-03-01")).is_ok());
    }

    #[test]
    fn test_employees_request_wire_format() {
        let period = ReportPeriod::new(date("2024-03-01"), date("2024-03-31")).unwrap();
        let body = serde_json::to_value(EmployeesRequest::from(&period)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"period_start": "2024-03-01", "period_end": "2024-03-31"})
        );
    }
}
