//! Persisted hazard alerts and their lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

use super::condition::{Condition, ConditionKind, Severity};

/// Alert status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Resolved => "resolved",
        }
    }
}

impl std::str::FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AlertStatus::Active),
            "resolved" => Ok(AlertStatus::Resolved),
            other => Err(format!("Unknown alert status: {}", other)),
        }
    }
}

/// Why an alert was resolved
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertResolution {
    /// The triggering metric dropped back below threshold
    Cleared,
    /// An operator closed it
    Manual,
}

impl AlertResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertResolution::Cleared => "cleared",
            AlertResolution::Manual => "manual",
        }
    }
}

impl std::str::FromStr for AlertResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cleared" => Ok(AlertResolution::Cleared),
            "manual" => Ok(AlertResolution::Manual),
            other => Err(format!("Unknown alert resolution: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlertTransitionError {
    #[error("Alert {0} is already resolved")]
    AlreadyResolved(Uuid),
}

/// A hazard occurrence at one location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub id: Uuid,
    pub location_key: String,
    pub kind: ConditionKind,
    pub severity: Severity,
    pub message: String,
    pub status: AlertStatus,
    pub resolution: Option<AlertResolution>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// Open a new alert for a condition that just became active
    pub fn open(location_key: &str, condition: &Condition, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            location_key: location_key.to_string(),
            kind: condition.kind,
            severity: condition.severity,
            message: condition.message.clone(),
            status: AlertStatus::Active,
            resolution: None,
            first_seen_at: at,
            last_seen_at: at,
            resolved_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }

    /// Record that the hazard is still present
    pub fn refresh(&mut self, condition: &Condition, at: DateTime<Utc>) {
        self.severity = condition.severity;
        self.message = condition.message.clone();
        self.last_seen_at = at;
    }

    /// Move to resolved. Allowed exactly once.
    pub fn resolve(
        &mut self,
        resolution: AlertResolution,
        at: DateTime<Utc>,
    ) -> Result<(), AlertTransitionError> {
        if !self.is_active() {
            return Err(AlertTransitionError::AlreadyResolved(self.id));
        }
        self.status = AlertStatus::Resolved;
        self.resolution = Some(resolution);
        self.resolved_at = Some(at);
        Ok(())
    }
}

/// What to do with stored alerts after an evaluation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertReconciliation {
    /// Conditions with no active alert yet
    pub open: Vec<Condition>,
    /// Active alerts whose condition is still present
    pub refresh: Vec<(Uuid, Condition)>,
    /// Active alerts whose condition is gone
    pub clear: Vec<Uuid>,
}

impl AlertReconciliation {
    pub fn is_noop(&self) -> bool {
        self.open.is_empty() && self.refresh.is_empty() && self.clear.is_empty()
    }
}

/// Compare the active alerts of one location with a fresh evaluation.
///
/// Resolved alerts in `existing` are ignored. A kind that is already active
/// is refreshed, never reopened, so reconciling the same conditions twice
/// opens nothing the second time.
pub fn reconcile_alerts(existing: &[Alert], conditions: &[Condition]) -> AlertReconciliation {
    let mut result = AlertReconciliation::default();
    let mut seen = HashSet::new();

    for condition in conditions {
        if !seen.insert(condition.kind) {
            continue;
        }
        match existing
            .iter()
            .find(|alert| alert.is_active() && alert.kind == condition.kind)
        {
            Some(alert) => result.refresh.push((alert.id, condition.clone())),
            None => result.open.push(condition.clone()),
        }
    }

    result.clear = existing
        .iter()
        .filter(|alert| alert.is_active() && !seen.contains(&alert.kind))
        .map(|alert| alert.id)
        .collect();

    result
}
