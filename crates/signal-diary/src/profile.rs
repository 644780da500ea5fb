//! The optional user profile and the store that owns it.
//!
//! The profile holds the contact details printed on reports and the key of
//! the user's carrier in the provider directory.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::providers::{self, ProviderInfo, Region, OTHER_PROVIDER};
use crate::storage::{RecordStore, PROFILE_KEY};

/// Contact details and carrier choice. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    /// Full name.
    pub name: String,
    /// Postal address, may span lines.
    pub address: String,
    /// Contact phone number.
    pub phone_number: String,
    /// Directory key, or `"other"` when `custom_provider` names the carrier.
    pub network_provider: String,
    /// Carrier name when it isn't in the directory.
    pub custom_provider: String,
    /// Region tag selecting labels and the directory slice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

impl UserProfile {
    /// Resolve the carrier to its contact record.
    ///
    /// `"other"` with a non-empty custom name yields a name-only record.
    /// Any other key is looked up in the directory, filtered by `region`
    /// when one is set. Unknown keys yield `None`.
    #[must_use]
    pub fn resolve_provider(&self) -> Option<ProviderInfo> {
        let key = self.network_provider.trim();
        if key.is_empty() {
            return None;
        }
        if key.eq_ignore_ascii_case(OTHER_PROVIDER) {
            let custom = self.custom_provider.trim();
            return (!custom.is_empty()).then(|| ProviderInfo::custom(custom));
        }
        providers::lookup(key, self.region).map(ProviderInfo::from)
    }

    /// Whether there is anything to print in a customer block.
    #[must_use]
    pub fn has_contact_details(&self) -> bool {
        [&self.name, &self.address, &self.phone_number]
            .iter()
            .any(|field| !field.trim().is_empty())
            || self.resolve_provider().is_some()
    }

    /// The region to render with, falling back to `default`.
    #[must_use]
    pub fn region_or(&self, default: Region) -> Region {
        self.region.unwrap_or(default)
    }
}

/// Owns the persisted [`UserProfile`].
#[derive(Debug)]
pub struct ProfileStore<P: RecordStore> {
    port: P,
}

impl<P: RecordStore> ProfileStore<P> {
    /// Create a store over `port`.
    pub fn new(port: P) -> Self {
        Self { port }
    }

    /// The saved profile, or an empty one if nothing usable is stored.
    ///
    /// # Errors
    ///
    /// Returns an error only if the medium cannot be read.
    pub fn get(&self) -> Result<UserProfile> {
        let Some(raw) = self.port.read(PROFILE_KEY)? else {
            return Ok(UserProfile::default());
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Ok(profile),
            Err(e) => {
                warn!(error = %e, "Persisted profile is malformed, using an empty profile");
                Ok(UserProfile::default())
            }
        }
    }

    /// Replace the saved profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be persisted.
    pub fn save(&self, profile: &UserProfile) -> Result<()> {
        let json = serde_json::to_string(profile)?;
        self.port.write(PROFILE_KEY, &json)?;
        debug!("Profile saved");
        Ok(())
    }

    /// Erase the saved profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be erased.
    pub fn clear(&self) -> Result<()> {
        self.port.remove(PROFILE_KEY)?;
        debug!("Profile cleared");
        Ok(())
    }

    /// Resolve the saved profile's carrier.
    ///
    /// # Errors
    ///
    /// Returns an error only if the medium cannot be read.
    pub fn resolve_provider(&self) -> Result<Option<ProviderInfo>> {
        Ok(self.get()?.resolve_provider())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn sample_profile() -> UserProfile {
        UserProfile {
            name: "Ada Byron".to_string(),
            address: "12 Mill Lane\nSpringfield".to_string(),
            phone_number: "555-0100".to_string(),
            network_provider: "verizon".to_string(),
            custom_provider: String::new(),
            region: None,
        }
    }

    #[test]
    fn test_get_without_saved_profile_is_default() {
        let port = MemoryStore::new();
        let store = ProfileStore::new(&port);
        assert_eq!(store.get().unwrap(), UserProfile::default());
    }

    #[test]
    fn test_save_get_round_trip() {
        let port = MemoryStore::new();
        let store = ProfileStore::new(&port);
        let profile = sample_profile();

        store.save(&profile).unwrap();
        assert_eq!(ProfileStore::new(&port).get().unwrap(), profile);
    }

    #[test]
    fn test_save_is_full_overwrite() {
        let port = MemoryStore::new();
        let store = ProfileStore::new(&port);
        store.save(&sample_profile()).unwrap();

        let replacement = UserProfile {
            name: "New Name".to_string(),
            ..UserProfile::default()
        };
        store.save(&replacement).unwrap();
        let loaded = store.get().unwrap();
        assert_eq!(loaded.name, "New Name");
        assert!(loaded.address.is_empty());
    }

    #[test]
    fn test_clear_removes_profile() {
        let port = MemoryStore::new();
        let store = ProfileStore::new(&port);
        store.save(&sample_profile()).unwrap();

        store.clear().unwrap();
        assert!(!port.contains(PROFILE_KEY));
        assert_eq!(store.get().unwrap(), UserProfile::default());
    }

    #[test]
    fn test_malformed_profile_is_default() {
        let port = MemoryStore::new();
        port.write(PROFILE_KEY, "[1, 2").unwrap();
        assert_eq!(ProfileStore::new(&port).get().unwrap(), UserProfile::default());
    }

    #[test]
    fn test_camel_case_shape_and_missing_fields() {
        let value = serde_json::to_value(sample_profile()).unwrap();
        assert_eq!(value["phoneNumber"], "555-0100");
        assert_eq!(value["networkProvider"], "verizon");

        let partial: UserProfile = serde_json::from_str(r#"{"name":"Ada"}"#).unwrap();
        assert_eq!(partial.name, "Ada");
        assert!(partial.phone_number.is_empty());
        assert!(partial.region.is_none());
    }

    #[test]
    fn test_resolve_directory_provider() {
        let info = sample_profile().resolve_provider().unwrap();
        assert_eq!(info.name, "Verizon");
        assert_eq!(info.support_email.as_deref(), Some("support@verizon.com"));
    }

    #[test]
    fn test_resolve_custom_provider() {
        let profile = UserProfile {
            network_provider: "other".to_string(),
            custom_provider: "  Village Mobile ".to_string(),
            ..UserProfile::default()
        };
        let info = profile.resolve_provider().unwrap();
        assert_eq!(info.name, "Village Mobile");
        assert!(info.support_email.is_none());
        assert!(info.support_phone.is_none());
    }

    #[test]
    fn test_resolve_other_without_name_is_none() {
        let profile = UserProfile {
            network_provider: "other".to_string(),
            ..UserProfile::default()
        };
        assert!(profile.resolve_provider().is_none());
    }

    #[test]
    fn test_resolve_unknown_or_wrong_region_is_none() {
        let unknown = UserProfile {
            network_provider: "carrier-pigeon".to_string(),
            ..UserProfile::default()
        };
        assert!(unknown.resolve_provider().is_none());

        let wrong_region = UserProfile {
            network_provider: "ee".to_string(),
            region: Some(Region::Us),
            ..UserProfile::default()
        };
        assert!(wrong_region.resolve_provider().is_none());

        let right_region = UserProfile {
            region: Some(Region::Gb),
            ..wrong_region
        };
        assert_eq!(right_region.resolve_provider().unwrap().name, "EE");
    }

    #[test]
    fn test_has_contact_details() {
        assert!(!UserProfile::default().has_contact_details());
        assert!(sample_profile().has_contact_details());

        let provider_only = UserProfile {
            network_provider: "att".to_string(),
            ..UserProfile::default()
        };
        assert!(provider_only.has_contact_details());

        let whitespace = UserProfile {
            name: "   ".to_string(),
            ..UserProfile::default()
        };
        assert!(!whitespace.has_contact_details());
    }
}
