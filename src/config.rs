/// What happens when a service that is already attached to a peripheral is mutated.
///
/// The policy is applied before the written value is validated: under `Reject` every
/// write to an attached service fails with `IllegalRebind`, and under `Ignore` every
/// such write is discarded, even one carrying an invalid value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttachedMutation {
    /// Fail the write with [`crate::error::ErrorKind::IllegalRebind`].
    #[default]
    Reject,
    /// Log a warning and leave the service unchanged.
    Ignore,
    /// Apply the write. The Bluetooth stack may or may not observe it.
    Allow,
}

/// Configuration of the [`crate::Bridge`] and the handles it constructs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BridgeConfig {
    attached_mutation: AttachedMutation,
    log_property_access: bool,
    short_uuid_strings: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            attached_mutation: AttachedMutation::Reject,
            log_property_access: false,
            short_uuid_strings: true,
        }
    }
}

impl BridgeConfig {
    /// Sets the policy for writes to a service after it has been attached to a peripheral.
    /// The default is [`AttachedMutation::Reject`].
    pub fn attached_mutation(mut self, policy: AttachedMutation) -> Self {
        self.attached_mutation = policy;
        self
    }

    /// Whether to log every script-side property write at the debug level.
    pub fn log_property_access(mut self, enabled: bool) -> Self {
        self.log_property_access = enabled;
        self
    }

    /// Whether the `uuid` getter returns 16-bit and 32-bit aliases in their short form (`"180D"`).
    /// When disabled, the full 128-bit form is always returned. Enabled by default.
    pub fn short_uuid_strings(mut self, enabled: bool) -> Self {
        self.short_uuid_strings = enabled;
        self
    }

    pub(crate) fn attached_mutation_policy(&self) -> AttachedMutation {
        self.attached_mutation
    }

    pub(crate) fn logs_property_access(&self) -> bool {
        self.log_property_access
    }

    pub(crate) fn uses_short_uuid_strings(&self) -> bool {
        self.short_uuid_strings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.attached_mutation_policy(), AttachedMutation::Reject);
        assert!(!config.logs_property_access());
        assert!(config.uses_short_uuid_strings());
    }

    #[test]
    fn chained_setters() {
        let config = BridgeConfig::default()
            .attached_mutation(AttachedMutation::Ignore)
            .log_property_access(true)
            .short_uuid_strings(false);
        assert_eq!(config.attached_mutation_policy(), AttachedMutation::Ignore);
        assert!(config.logs_property_access());
        assert!(!config.uses_short_uuid_strings());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_serialization() {
        let config = BridgeConfig::default().attached_mutation(AttachedMutation::Allow);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: BridgeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);

        let partial: BridgeConfig = serde_json::from_str(r#"{"log_property_access":true}"#).unwrap();
        assert_eq!(partial.attached_mutation_policy(), AttachedMutation::Reject);
        assert!(partial.logs_property_access());
    }
}
