//! Device-side paths.
//!
//! Devices address storage with `\`-separated paths whose first component is
//! a storage name such as `7: Saves`. [`DevicePath`] keeps the components
//! separately so the same value works against MTP and mounted trees.

use std::fmt;

/// A path on a device, stored as its components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DevicePath {
    components: Vec<String>,
}

impl DevicePath {
    /// Parses a path using either `\` or `/` as separator.
    ///
    /// Empty components are dropped, so `"a\\\\b/"` is `a\b`.
    pub fn new(path: &str) -> Self {
        let components = path
            .split(['\\', '/'])
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        Self { components }
    }

    /// Returns a new path with `segment` appended.
    ///
    /// `segment` may itself contain separators.
    pub fn join(&self, segment: &str) -> Self {
        let mut components = self.components.clone();
        components.extend(DevicePath::new(segment).components);
        Self { components }
    }

    /// Last component, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }

    /// Path without its last component, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.components.is_empty() {
            return None;
        }
        let mut components = self.components.clone();
        components.pop();
        Some(Self { components })
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }
}

impl fmt::Display for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("\\"))
    }
}

impl From<&str> for DevicePath {
    fn from(value: &str) -> Self {
        DevicePath::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_separators() {
        let a = DevicePath::new("7: Saves\\Installed games");
        let b = DevicePath::new("7: Saves/Installed games");
        assert_eq!(a, b);
        assert_eq!(a.components().count(), 2);
    }

    #[test]
    fn display_uses_backslash() {
        let p = DevicePath::new("7: Saves/Installed games").join("Game/alice");
        assert_eq!(p.to_string(), "7: Saves\\Installed games\\Game\\alice");
    }

    #[test]
    fn empty_components_dropped() {
        let p = DevicePath::new("\\a\\\\b/");
        assert_eq!(p.to_string(), "a\\b");
    }

    #[test]
    fn file_name_and_parent() {
        let p = DevicePath::new("4: Installed games/Zelda/0100ABC");
        assert_eq!(p.file_name(), Some("0100ABC"));
        assert_eq!(p.parent().unwrap().file_name(), Some("Zelda"));
        assert!(DevicePath::default().parent().is_none());
        assert!(DevicePath::default().is_root());
    }
}
