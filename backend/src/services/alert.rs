//! Alert service: persisted hazard alerts per location

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{
    reconcile_alerts, Alert, AlertResolution, AlertStatus, Condition, ConditionKind, Severity,
};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Alert service for managing the alert lifecycle
#[derive(Clone)]
pub struct AlertService {
    db: PgPool,
}

/// Alert row as stored
#[derive(Debug, Clone, FromRow)]
pub struct AlertRow {
    pub id: Uuid,
    pub location_key: String,
    pub kind: String,
    pub severity: String,
    pub message: String,
    pub status: String,
    pub resolution: Option<String>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<AlertRow> for Alert {
    type Error = AppError;

    fn try_from(row: AlertRow) -> AppResult<Self> {
        let corrupt = |field: &str, value: &str| {
            AppError::Internal(format!("Alert {} has invalid {}: {}", row.id, field, value))
        };

        Ok(Alert {
            id: row.id,
            kind: ConditionKind::from_str(&row.kind).map_err(|_| corrupt("kind", &row.kind))?,
            severity: Severity::from_str(&row.severity)
                .map_err(|_| corrupt("severity", &row.severity))?,
            status: AlertStatus::from_str(&row.status)
                .map_err(|_| corrupt("status", &row.status))?,
            resolution: row
                .resolution
                .as_deref()
                .map(|r| AlertResolution::from_str(r).map_err(|_| corrupt("resolution", r)))
                .transpose()?,
            location_key: row.location_key.clone(),
            message: row.message.clone(),
            first_seen_at: row.first_seen_at,
            last_seen_at: row.last_seen_at,
            resolved_at: row.resolved_at,
        })
    }
}

/// Filter for listing alerts
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub status: Option<AlertStatus>,
    pub location_key: Option<String>,
}

/// What one evaluation changed
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlertSyncOutcome {
    pub opened: Vec<Alert>,
    pub refreshed: usize,
    pub cleared: Vec<Uuid>,
}

const ALERT_COLUMNS: &str = "id, location_key, kind, severity, message, status, resolution, \
                             first_seen_at, last_seen_at, resolved_at";

impl AlertService {
    /// Create a new AlertService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Bring the stored alerts of a location in line with an evaluation.
    ///
    /// New conditions open alerts, persisting ones are refreshed and alerts
    /// whose condition is gone are resolved as cleared.
    pub async fn sync_location(
        &self,
        location_key: &str,
        conditions: &[Condition],
    ) -> AppResult<AlertSyncOutcome> {
        let mut tx = self.db.begin().await?;

        let rows = sqlx::query_as::<_, AlertRow>(&format!(
            "SELECT {} FROM weather_alerts \
             WHERE location_key = $1 AND status = 'active' FOR UPDATE",
            ALERT_COLUMNS
        ))
        .bind(location_key)
        .fetch_all(&mut *tx)
        .await?;

        let existing = rows
            .into_iter()
            .map(Alert::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        let plan = reconcile_alerts(&existing, conditions);

        let now = Utc::now();
        let mut outcome = AlertSyncOutcome::default();

        for condition in &plan.open {
            let alert = Alert::open(location_key, condition, now);
            // Another evaluation may have opened it first
            let inserted = sqlx::query_as::<_, AlertRow>(&format!(
                r#"
                INSERT INTO weather_alerts (
                    id, location_key, kind, severity, message, status,
                    first_seen_at, last_seen_at
                )
                VALUES ($1, $2, $3, $4, $5, 'active', $6, $6)
                ON CONFLICT (location_key, kind) WHERE status = 'active' DO NOTHING
                RETURNING {}
                "#,
                ALERT_COLUMNS
            ))
            .bind(alert.id)
            .bind(&alert.location_key)
            .bind(alert.kind.as_str())
            .bind(alert.severity.as_str())
            .bind(&alert.message)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(row) = inserted {
                let alert = Alert::try_from(row)?;
                tracing::info!(
                    "Opened {} alert {} for {}",
                    alert.kind,
                    alert.id,
                    location_key
                );
                outcome.opened.push(alert);
            }
        }

        for (id, condition) in &plan.refresh {
            sqlx::query(
                r#"
                UPDATE weather_alerts
                SET severity = $2, message = $3, last_seen_at = $4
                WHERE id = $1 AND status = 'active'
                "#,
            )
            .bind(id)
            .bind(condition.severity.as_str())
            .bind(&condition.message)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            outcome.refreshed += 1;
        }

        for id in &plan.clear {
            let result = sqlx::query(
                r#"
                UPDATE weather_alerts
                SET status = 'resolved', resolution = $2, resolved_at = $3
                WHERE id = $1 AND status = 'active'
                "#,
            )
            .bind(id)
            .bind(AlertResolution::Cleared.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                tracing::info!("Cleared alert {} for {}", id, location_key);
                outcome.cleared.push(*id);
            }
        }

        tx.commit().await?;
        Ok(outcome)
    }

    /// Resolve an alert by hand
    pub async fn resolve_alert(&self, alert_id: Uuid) -> AppResult<Alert> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, AlertRow>(&format!(
            "SELECT {} FROM weather_alerts WHERE id = $1 FOR UPDATE",
            ALERT_COLUMNS
        ))
        .bind(alert_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Alert".to_string()))?;

        let mut alert = Alert::try_from(row)?;
        let now = Utc::now();
        alert
            .resolve(AlertResolution::Manual, now)
            .map_err(|e| AppError::InvalidStateTransition(e.to_string()))?;

        sqlx::query(
            r#"
            UPDATE weather_alerts
            SET status = 'resolved', resolution = $2, resolved_at = $3
            WHERE id = $1
            "#,
        )
        .bind(alert.id)
        .bind(AlertResolution::Manual.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!("Alert {} resolved manually", alert.id);
        Ok(alert)
    }

    pub async fn get_alert(&self, alert_id: Uuid) -> AppResult<Alert> {
        let row = sqlx::query_as::<_, AlertRow>(&format!(
            "SELECT {} FROM weather_alerts WHERE id = $1",
            ALERT_COLUMNS
        ))
        .bind(alert_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Alert".to_string()))?;

        Alert::try_from(row)
    }

    /// List alerts, most recently seen first
    pub async fn list_alerts(&self, filter: AlertFilter) -> AppResult<Vec<Alert>> {
        let rows = sqlx::query_as::<_, AlertRow>(&format!(
            r#"
            SELECT {} FROM weather_alerts
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR location_key = $2)
            ORDER BY last_seen_at DESC
            "#,
            ALERT_COLUMNS
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.location_key)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Alert::try_from).collect()
    }
}
