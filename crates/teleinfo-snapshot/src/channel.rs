//! The two multiplexed channels and what each must report.

use std::fmt;

use teleinfo_frame::canonical_tag;
use teleinfo_transport::ChannelMode;

/// Hardware mode routing the consumption meter to the receiver.
pub const CONSUMPTION_MODE: ChannelMode = ChannelMode::new(0x11);

/// Hardware mode routing the production meter to the receiver.
pub const PRODUCTION_MODE: ChannelMode = ChannelMode::new(0x22);

/// Tags collected from the consumption meter, in publication order.
pub const CONSUMPTION_TAGS: &[&str] = &[
    "DATE", "PRM", "EASF01", "EASF02", "IRMS1", "URMS1", "SINSTS", "UMOY1", "NGTF", "NTARF",
    "MSG1", "SMAXSN", "SMAXSN1", "RELAIS", "PREF", "PCOUP",
];

/// Tags collected from the production meter, in publication order.
pub const PRODUCTION_TAGS: &[&str] = &[
    "DATE", "PRM", "EASF01", "EAIT", "IRMS1", "URMS1", "SINSTI", "SMAXIN", "SMAXIN1", "NGTF",
    "MSG1", "RELAIS", "PREF",
];

/// Instantaneous apparent power drawn. Never published empty.
pub const CONSUMPTION_POWER_TAG: &str = "SINSTS";

/// Which meter a channel carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Consumption,
    Production,
}

impl ChannelKind {
    /// Scheduling order.
    pub const ALL: [ChannelKind; 2] = [ChannelKind::Consumption, ChannelKind::Production];

    /// Value of the `TYPE` field in published records.
    pub fn label(self) -> &'static str {
        match self {
            ChannelKind::Consumption => "CONSOMMATION",
            ChannelKind::Production => "PRODUCTION",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChannelKind::Consumption => "consumption",
            ChannelKind::Production => "production",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything the scheduler needs to service one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelProfile {
    pub kind: ChannelKind,
    /// Hardware mode selecting this channel.
    pub mode: ChannelMode,
    /// Canonical tags a scan must collect, in publication order.
    pub required_tags: Vec<String>,
    /// Tag whose emptiness suppresses publication.
    pub critical_tag: Option<String>,
}

impl ChannelProfile {
    /// Consumption channel defaults.
    pub fn consumption() -> Self {
        Self {
            kind: ChannelKind::Consumption,
            mode: CONSUMPTION_MODE,
            required_tags: owned(CONSUMPTION_TAGS),
            critical_tag: Some(CONSUMPTION_POWER_TAG.to_string()),
        }
    }

    /// Production channel defaults.
    pub fn production() -> Self {
        Self {
            kind: ChannelKind::Production,
            mode: PRODUCTION_MODE,
            required_tags: owned(PRODUCTION_TAGS),
            critical_tag: None,
        }
    }

    /// Defaults for `kind`.
    pub fn for_kind(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Consumption => Self::consumption(),
            ChannelKind::Production => Self::production(),
        }
    }

    /// Override the hardware mode.
    pub fn with_mode(mut self, mode: ChannelMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the required tag set.
    ///
    /// Wire spellings are mapped to their canonical keys and duplicates
    /// dropped, keeping first-seen order.
    pub fn with_required_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut required: Vec<String> = Vec::new();
        for tag in tags {
            let tag = canonical_tag(tag.as_ref().trim());
            if !tag.is_empty() && !required.iter().any(|t| t == tag) {
                required.push(tag.to_string());
            }
        }
        self.required_tags = required;
        self
    }

    /// Override or clear the critical tag.
    pub fn with_critical_tag(mut self, tag: Option<&str>) -> Self {
        self.critical_tag = tag.map(|t| canonical_tag(t).to_string());
        self
    }
}

fn owned(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduling_order_is_consumption_first() {
        assert_eq!(
            ChannelKind::ALL,
            [ChannelKind::Consumption, ChannelKind::Production]
        );
    }

    #[test]
    fn default_profiles_use_distinct_modes() {
        let conso = ChannelProfile::consumption();
        let prod = ChannelProfile::production();
        assert_ne!(conso.mode, prod.mode);
        assert_eq!(conso.critical_tag.as_deref(), Some("SINSTS"));
        assert_eq!(prod.critical_tag, None);
    }

    #[test]
    fn default_tag_sets_are_canonical() {
        for tag in CONSUMPTION_TAGS.iter().chain(PRODUCTION_TAGS) {
            assert_eq!(canonical_tag(tag), *tag);
            assert!(!tag.contains('-'));
        }
    }

    #[test]
    fn custom_tags_are_canonicalised_and_deduplicated() {
        let profile = ChannelProfile::production().with_required_tags([
            "SINSTI",
            "SMAXIN-1",
            "SMAXIN1",
            " ",
        ]);
        assert_eq!(profile.required_tags, vec!["SINSTI", "SMAXIN1"]);
    }

    #[test]
    fn labels_match_published_type() {
        assert_eq!(ChannelKind::Consumption.label(), "CONSOMMATION");
        assert_eq!(ChannelKind::Production.label(), "PRODUCTION");
        assert_eq!(ChannelKind::Production.to_string(), "production");
    }
}
