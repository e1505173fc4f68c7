// File: formflow/src/alert.rs
// Purpose: Outcome notifications broadcast to whatever renders them

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Name of the document-level signal alerts are published under
pub const ALERT_EVENT: &str = "form:alert";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Info,
    Success,
    Error,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::Info => write!(f, "info"),
            AlertKind::Success => write!(f, "success"),
            AlertKind::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>, kind: AlertKind) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
        }
    }
}

/// Fan-out of alerts to any number of subscribers
#[derive(Clone)]
pub struct AlertBus {
    tx: broadcast::Sender<Alert>,
}

impl AlertBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Alert> {
        self.tx.subscribe()
    }

    /// Publish an alert. Also logged, so it is visible with no subscriber.
    pub fn publish(&self, alert: Alert) {
        tracing::info!(
            event = ALERT_EVENT,
            kind = %alert.kind,
            title = %alert.title,
            "{}",
            alert.message
        );
        // No receivers is fine: rendering is optional
        let _ = self.tx.send(alert);
    }
}

impl Default for AlertBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_wire_shape() {
        let alert = Alert::new("成功", "表單提交成功！", AlertKind::Success);
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"title": "成功", "message": "表單提交成功！", "type": "success"})
        );
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let bus = AlertBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(Alert::new("錯誤", "duplicate", AlertKind::Error));

        assert_eq!(first.recv().await.unwrap().message, "duplicate");
        assert_eq!(second.recv().await.unwrap().kind, AlertKind::Error);
    }

    #[test]
    fn test_publish_without_subscribers() {
        AlertBus::default().publish(Alert::new("Info", "nobody listening", AlertKind::Info));
    }
}
