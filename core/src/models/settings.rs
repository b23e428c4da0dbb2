use serde::{Deserialize, Serialize};

use super::Category;

/// Per-category and per-channel delivery toggles.
///
/// The master enable flag lives next to these in the notification state; it
/// short-circuits everything here when off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub price_alerts: bool,
    pub transaction_updates: bool,
    pub security_alerts: bool,
    pub liquidity_warnings: bool,
    pub system_updates: bool,
    /// Forwarded to the mail collaborator; nothing in this workspace sends email.
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub sound_enabled: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            price_alerts: true,
            transaction_updates: true,
            security_alerts: true,
            liquidity_warnings: true,
            system_updates: true,
            email_notifications: false,
            push_notifications: true,
            sound_enabled: true,
        }
    }
}

impl NotificationSettings {
    pub fn category_enabled(&self, category: Category) -> bool {
        match category {
            Category::Price => self.price_alerts,
            Category::Transaction => self.transaction_updates,
            Category::Security => self.security_alerts,
            Category::Liquidity => self.liquidity_warnings,
            Category::System => self.system_updates,
        }
    }

    /// Overwrites only the flags present in `patch`.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        let SettingsPatch {
            price_alerts,
            transaction_updates,
            security_alerts,
            liquidity_warnings,
            system_updates,
            email_notifications,
            push_notifications,
            sound_enabled,
        } = *patch;

        if let Some(v) = price_alerts {
            self.price_alerts = v;
        }
        if let Some(v) = transaction_updates {
            self.transaction_updates = v;
        }
        if let Some(v) = security_alerts {
            self.security_alerts = v;
        }
        if let Some(v) = liquidity_warnings {
            self.liquidity_warnings = v;
        }
        if let Some(v) = system_updates {
            self.system_updates = v;
        }
        if let Some(v) = email_notifications {
            self.email_notifications = v;
        }
        if let Some(v) = push_notifications {
            self.push_notifications = v;
        }
        if let Some(v) = sound_enabled {
            self.sound_enabled = v;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub price_alerts: Option<bool>,
    pub transaction_updates: Option<bool>,
    pub security_alerts: Option<bool>,
    pub liquidity_warnings: Option<bool>,
    pub system_updates: Option<bool>,
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    pub sound_enabled: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_every_category_but_not_email() {
        let s = NotificationSettings::default();
        assert!(Category::ALL.iter().all(|c| s.category_enabled(*c)));
        assert!(!s.email_notifications);
        assert!(s.push_notifications);
        assert!(s.sound_enabled);
    }

    #[test]
    fn patch_overwrites_only_present_flags() {
        let mut s = NotificationSettings::default();
        s.apply(&SettingsPatch {
            security_alerts: Some(false),
            sound_enabled: Some(false),
            ..Default::default()
        });

        assert!(!s.category_enabled(Category::Security));
        assert!(!s.sound_enabled);
        assert!(s.category_enabled(Category::Price));
        assert!(s.push_notifications);
    }

    #[test]
    fn patch_parses_partial_json() {
        let patch: SettingsPatch = serde_json::from_str(r#"{"priceAlerts": false}"#).unwrap();
        assert_eq!(patch.price_alerts, Some(false));
        assert_eq!(patch.sound_enabled, None);
    }
}
