use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Immutable comment text. Cloning shares the allocation, so per-frame
/// `DrawText` commands copy a pointer rather than the string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SharedStr(Arc<str>);

impl SharedStr {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SharedStr {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for SharedStr {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl std::ops::Deref for SharedStr {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SharedStr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for SharedStr {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SharedStr {
    fn from(s: &str) -> Self {
        SharedStr(Arc::from(s))
    }
}

impl From<String> for SharedStr {
    fn from(s: String) -> Self {
        SharedStr(Arc::from(s))
    }
}

impl std::fmt::Display for SharedStr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// Written by hand so the `rc` serde feature stays off.
impl Serialize for SharedStr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SharedStr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Owned: comment text routinely carries escapes (quotes, \n, \uXXXX)
        // that cannot be borrowed from the input.
        String::deserialize(deserializer).map(SharedStr::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_allocation() {
        let text = SharedStr::from("前方高能");
        let frame = text.clone();
        assert_eq!(frame, "前方高能");
        assert_eq!(frame.as_str().as_ptr(), text.as_str().as_ptr());
    }

    #[test]
    fn deserializes_escaped_comment_text() {
        let s: SharedStr = serde_json::from_str(r#""say \"hi\"\n""#).expect("escaped text parses");
        assert_eq!(s, "say \"hi\"\n");
        assert_eq!(
            serde_json::to_string(&s).expect("text serializes"),
            r#""say \"hi\"\n""#
        );
    }

    #[test]
    fn set_lookup_by_str() {
        let mut seen = std::collections::HashSet::new();
        seen.insert(SharedStr::from("abc123"));
        assert!(seen.contains("abc123"));
    }
}
