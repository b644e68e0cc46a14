use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Synthetic device fingerprint presented on every login.
///
/// Generated once and persisted; a changing fingerprint looks like a new
/// phone to the platform and invites verification challenges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub app_version: String,
    pub version_code: String,
    pub os_version: u32,
    pub os_release: String,
    pub dpi: String,
    pub resolution: String,
    pub manufacturer: String,
    pub device: String,
    pub model: String,
    pub cpu: String,
    pub uuid: String,
    pub phone_id: String,
    pub device_id: String,
    pub advertising_id: String,
}

impl DeviceIdentity {
    /// Fixed hardware profile with freshly generated identifiers.
    pub fn generate() -> Self {
        let device_seed = Uuid::new_v4().simple().to_string();
        Self {
            app_version: "269.0.0.18.75".to_string(),
            version_code: "314665256".to_string(),
            os_version: 26,
            os_release: "8.0.0".to_string(),
            dpi: "480dpi".to_string(),
            resolution: "1080x1920".to_string(),
            manufacturer: "OnePlus".to_string(),
            device: "devitron".to_string(),
            model: "6T Dev".to_string(),
            cpu: "qcom".to_string(),
            uuid: Uuid::new_v4().to_string(),
            phone_id: Uuid::new_v4().to_string(),
            device_id: format!("android-{}", device_seed.chars().take(16).collect::<String>()),
            advertising_id: Uuid::new_v4().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DeviceIdentity;

    #[test]
    fn generated_identifiers_differ_between_calls() {
        let first = DeviceIdentity::generate();
        let second = DeviceIdentity::generate();
        assert_ne!(first.uuid, second.uuid);
        assert_ne!(first.device_id, second.device_id);
        assert_eq!(first.model, second.model);
        assert!(first.device_id.starts_with("android-"));
        assert_eq!(first.device_id.len(), "android-".len() + 16);
    }
}
