use rusqlite::params;

use crate::model::events::{AlertSubscription, SubscriptionType};

use super::{now_unix, EventStore};

impl EventStore {
    pub async fn subscribe(&self, chat_id: i64, sub_type: SubscriptionType, value: &str) -> Result<(), String> {
        let conn = self.get_write_connection()?;
        conn.execute(
            "INSERT OR IGNORE INTO alert_subscriptions (chat_id, sub_type, value, recorded_at) VALUES (?1, ?2, ?3, ?4)",
            params![chat_id, sub_type.as_str(), value, now_unix()],
        )
        .map_err(|e| format!("subscribe failed: {}", e))?;
        Ok(())
    }

    pub async fn unsubscribe(&self, chat_id: i64, sub_type: SubscriptionType, value: &str) -> Result<(), String> {
        let conn = self.get_write_connection()?;
        conn.execute(
            "DELETE FROM alert_subscriptions WHERE chat_id = ?1 AND sub_type = ?2 AND value = ?3",
            params![chat_id, sub_type.as_str(), value],
        )
        .map_err(|e| format!("unsubscribe failed: {}", e))?;
        Ok(())
    }

    pub async fn list_subscriptions(&self, chat_id: i64) -> Result<Vec<AlertSubscription>, String> {
        let conn = self.get_read_connection()?;
        let mut stmt = conn
            .prepare("SELECT id, chat_id, sub_type, value, recorded_at FROM alert_subscriptions WHERE chat_id = ?1")
            .map_err(|e| format!("list_subscriptions prepare failed: {}", e))?;
        let rows = stmt
            .query_map(params![chat_id], |row| {
                let sub_type: String = row.get(2)?;
                let recorded_at: f64 = row.get(4)?;
                Ok(AlertSubscription {
                    id: row.get::<_, Option<i64>>(0)?,
                    chat_id: row.get(1)?,
                    sub_type: SubscriptionType::from_str(&sub_type).unwrap_or(SubscriptionType::Deployer),
                    value: row.get(3)?,
                    recorded_at: chrono::DateTime::from_timestamp(recorded_at as i64, 0).unwrap_or_else(chrono::Utc::now),
                })
            })
            .map_err(|e| format!("list_subscriptions failed: {}", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("list_subscriptions row decode failed: {}", e))
    }

    /// All active subscriptions across every chat, consumed by the alert
    /// sweep (SPEC_FULL.md §4.8 "Alert sweep").
    pub async fn all_subscriptions(&self) -> Result<Vec<AlertSubscription>, String> {
        let conn = self.get_read_connection()?;
        let mut stmt = conn
            .prepare("SELECT id, chat_id, sub_type, value, recorded_at FROM alert_subscriptions")
            .map_err(|e| format!("all_subscriptions prepare failed: {}", e))?;
        let rows = stmt
            .query_map([], |row| {
                let sub_type: String = row.get(2)?;
                let recorded_at: f64 = row.get(4)?;
                Ok(AlertSubscription {
                    id: row.get::<_, Option<i64>>(0)?,
                    chat_id: row.get(1)?,
                    sub_type: SubscriptionType::from_str(&sub_type).unwrap_or(SubscriptionType::Deployer),
                    value: row.get(3)?,
                    recorded_at: chrono::DateTime::from_timestamp(recorded_at as i64, 0).unwrap_or_else(chrono::Utc::now),
                })
            })
            .map_err(|e| format!("all_subscriptions failed: {}", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("all_subscriptions row decode failed: {}", e))
    }
}
