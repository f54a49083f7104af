//! Registry of user-facing alerts.

use {
    crate::session::Session,
    indexmap::IndexMap,
    serde::Serialize,
    std::{
        fmt::{self, Debug, Formatter},
        sync::{Arc, LazyLock, Mutex},
    },
    tokio::{sync::watch, task::JoinHandle},
};

#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, strum::Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum AlertPriority {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum AlertType {
    Error,
    Info,
    Feature,
}

pub type AlertAction = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub alert_type: AlertType,
    pub message: String,
    pub priority: AlertPriority,
    #[serde(skip)]
    pub action: Option<AlertAction>,
    pub action_label: Option<String>,
    /// Persistent alerts survive account changes.
    pub persistent: bool,
}

impl Alert {
    pub fn new(id: impl Into<String>, alert_type: AlertType, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            alert_type,
            message: message.into(),
            priority: AlertPriority::default(),
            action: None,
            action_label: None,
            persistent: true,
        }
    }

    pub fn with_priority(self, priority: AlertPriority) -> Self {
        Self { priority, ..self }
    }

    pub fn with_action(self, label: impl Into<String>, action: AlertAction) -> Self {
        Self {
            action: Some(action),
            action_label: Some(label.into()),
            ..self
        }
    }

    pub fn transient(self) -> Self {
        Self {
            persistent: false,
            ..self
        }
    }
}

impl Debug for Alert {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alert")
            .field("id", &self.id)
            .field("alert_type", &self.alert_type)
            .field("message", &self.message)
            .field("priority", &self.priority)
            .field("action", &self.action.as_ref().map(|_| "<action>"))
            .field("action_label", &self.action_label)
            .field("persistent", &self.persistent)
            .finish()
    }
}

/// Alerts keyed by id. Views list them by descending priority, alerts of
/// equal priority in the order they were first added.
pub struct AlertRegistry {
    alerts: Mutex<IndexMap<String, Alert>>,
    sender: watch::Sender<Vec<Alert>>,
}

static GLOBAL: LazyLock<AlertRegistry> = LazyLock::new(AlertRegistry::new);

impl Default for AlertRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertRegistry {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Vec::new());
        Self {
            alerts: Default::default(),
            sender,
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Adds an alert, or replaces the alert with the same id in place.
    pub fn add_alert(&self, alert: Alert) {
        tracing::debug!(id = %alert.id, priority = %alert.priority, "adding alert");
        self.mutate(|alerts| {
            alerts.insert(alert.id.clone(), alert);
        });
    }

    pub fn remove_alert(&self, id: &str) {
        self.mutate(|alerts| {
            alerts.shift_remove(id);
        });
    }

    pub fn remove_all(&self) {
        self.mutate(IndexMap::clear);
    }

    /// Removes all alerts not marked persistent.
    pub fn clear_transient(&self) {
        self.mutate(|alerts| alerts.retain(|_, alert| alert.persistent));
    }

    /// All alerts, highest priority first.
    pub fn alerts(&self) -> Vec<Alert> {
        sorted(&self.alerts.lock().unwrap())
    }

    /// The highest priority alert.
    pub fn current_alert(&self) -> Option<Alert> {
        self.alerts().into_iter().next()
    }

    /// Receives the ordered alert list after every change.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Alert>> {
        self.sender.subscribe()
    }

    fn mutate(&self, f: impl FnOnce(&mut IndexMap<String, Alert>)) {
        let mut alerts = self.alerts.lock().unwrap();
        f(&mut alerts);
        self.sender.send_replace(sorted(&alerts));
    }
}

fn sorted(alerts: &IndexMap<String, Alert>) -> Vec<Alert> {
    let mut sorted = alerts.values().cloned().collect::<Vec<_>>();
    // Stable, so equal priorities keep insertion order.
    sorted.sort_by(|a, b| b.priority.cmp(&a.priority));
    sorted
}

/// Clears transient alerts from `registry` whenever the session's account
/// changes.
pub fn spawn_transient_eviction(
    registry: &'static AlertRegistry,
    mut session: watch::Receiver<Session>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut account = session.borrow_and_update().account;
        while session.changed().await.is_ok() {
            let current = session.borrow_and_update().account;
            if current != account {
                tracing::debug!("account changed, clearing transient alerts");
                registry.clear_transient();
                account = current;
            }
        }
    })
}
