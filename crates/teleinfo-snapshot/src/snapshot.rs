use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::channel::{ChannelKind, ChannelProfile};

/// Latest known values for one channel, keyed by canonical tag.
///
/// Seeded with every required tag mapped to an empty string and kept for
/// the life of the process. Field order is publication order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    kind: ChannelKind,
    fields: Vec<(String, String)>,
}

impl Snapshot {
    /// A snapshot with every tag unset.
    pub fn new(kind: ChannelKind, tags: &[String]) -> Self {
        Self {
            kind,
            fields: tags.iter().map(|t| (t.clone(), String::new())).collect(),
        }
    }

    pub fn for_profile(profile: &ChannelProfile) -> Self {
        Self::new(profile.kind, &profile.required_tags)
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Value for `tag`, or `None` if the tag is not tracked.
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| v.as_str())
    }

    /// Overwrite the value of a tracked tag. Returns `false` for tags this
    /// snapshot does not track.
    ///
    /// The previous value is discarded first; values never accumulate.
    pub fn replace(&mut self, tag: &str, value: &str) -> bool {
        match self.fields.iter_mut().find(|(t, _)| t == tag) {
            Some((_, slot)) => {
                slot.clear();
                slot.push_str(value);
                true
            }
            None => false,
        }
    }

    /// Whether `tag` is untracked or holds an empty value.
    pub fn is_blank(&self, tag: &str) -> bool {
        self.get(tag).map_or(true, str::is_empty)
    }

    /// Tag/value pairs in publication order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    /// Tracked tags still holding an empty value.
    pub fn blank_tags(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, v)| v.is_empty())
            .map(|(t, _)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Serialized as one flat object: `"TYPE"` first, then every tag.
impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("TYPE", self.kind.label())?;
        for (tag, value) in &self.fields {
            map.serialize_entry(tag, value)?;
        }
        map.end()
    }
}

/// Tags still awaited by the scan in progress.
///
/// Built fresh from the required set at the start of every scan and owned
/// by that scan alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingSet {
    pending: Vec<String>,
}

impl WorkingSet {
    pub fn new(required: &[String]) -> Self {
        Self {
            pending: required.to_vec(),
        }
    }

    /// Mark `tag` as collected. Returns whether it was still pending.
    pub fn resolve(&mut self, tag: &str) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t != tag);
        self.pending.len() != before
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.pending.iter().any(|t| t == tag)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn into_pending(self) -> Vec<String> {
        self.pending
    }
}
