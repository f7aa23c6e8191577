use serde_json::Value;

use tavle_common::models::options::{OptionResponse, SetOptionRequest};
use tavle_common::models::report::{EmployeeRecord, EmployeesRequest, ReportPeriod};
use tavle_common::models::theme::{Theme, ThemePayload};

use crate::error::SessionError;
use crate::session::SessionManager;

pub const EMPLOYEES_PATH: &str = "/api/employees/";
pub const THEME_PATH: &str = "/api/theme/";
pub const OPTIONS_PATH: &str = "/api/options/";

/// Typed wrapper over the report API endpoints. Cheap to clone; all state
/// lives in the session manager.
#[derive(Clone)]
pub struct ReportClient {
    session: SessionManager,
}

impl ReportClient {
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Fetch the employee records for one period. Each apply issues one
    /// call carrying exactly that start/end pair.
    #[tracing::instrument(skip(self))]
    pub async fn employees(
        &self,
        period: &ReportPeriod,
    ) -> Result<Vec<EmployeeRecord>, SessionError> {
        let response = self
            .session
            .authorized_post(EMPLOYEES_PATH, &EmployeesRequest::from(period))
            .await?;
        response.parse().map_err(|e| {
            SessionError::request_failed(None, format!("Failed to parse employees response: {}", e))
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn theme(&self) -> Result<Theme, SessionError> {
        let response = self.session.authorized_get(THEME_PATH).await?;
        let payload: ThemePayload = response.parse().map_err(|e| {
            SessionError::request_failed(None, format!("Failed to parse theme response: {}", e))
        })?;
        Ok(payload.theme)
    }

    #[tracing::instrument(skip(self))]
    pub async fn set_theme(&self, theme: Theme) -> Result<(), SessionError> {
        self.session
            .authorized_post(THEME_PATH, &ThemePayload { theme })
            .await?;
        Ok(())
    }

    /// Fetch one preference value. A 404 means the key was never saved and
    /// comes back as `None`; every other failure propagates.
    #[tracing::instrument(skip(self))]
    pub async fn option(&self, key: &str) -> Result<Option<Value>, SessionError> {
        let path = format!("{}?key={}", OPTIONS_PATH, key);
        let response = match self.session.authorized_get(&path).await {
            Ok(response) => response,
            Err(SessionError::RequestFailed {
                status: Some(404), ..
            }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let parsed: OptionResponse = response.parse().map_err(|e| {
            SessionError::request_failed(None, format!("Failed to parse option response: {}", e))
        })?;
        Ok(Some(parsed.value))
    }

    /// Overwrite one preference value (full replace, not a patch).
    #[tracing::instrument(skip(self, value))]
    pub async fn set_option(&self, key: &str, value: Value) -> Result<(), SessionError> {
        self.session
            .authorized_post(
                OPTIONS_PATH,
                &SetOptionRequest {
                    key: key.to_string(),
                    value,
                },
            )
            .await?;
        Ok(())
    }
}
