use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner shared by every identifier kind.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Produce a `{prefix}_{n}` string that has never been interned before,
/// so generated ids cannot collide with ids restored from a saved scene.
fn fresh_name(prefix: &str) -> String {
    loop {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let candidate = format!("{prefix}_{n}");
        if !INTERNER.contains(&candidate) {
            return candidate;
        }
    }
}

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Spur);

        impl $name {
            /// Intern a string as an id, or return the existing one.
            pub fn intern(s: &str) -> Self {
                $name(INTERNER.get_or_intern(s))
            }

            /// Resolve back to a string slice.
            pub fn as_str(&self) -> &str {
                INTERNER.resolve(&self.0)
            }

            /// Generate a unique id with this kind's prefix.
            pub fn generate() -> Self {
                Self::intern(&fresh_name($prefix))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok($name::intern(&s))
            }
        }
    };
}

interned_id!(
    /// Stable identifier of a design token. Also keys its canvas node.
    TokenId,
    "token"
);

interned_id!(
    /// Identifier of a directed connection between two nodes.
    ConnectionId,
    "conn"
);

interned_id!(
    /// Identifier of a token group.
    GroupId,
    "group"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = TokenId::intern("color-primary");
        let b = TokenId::intern("color-primary");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "color-primary");
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("conn_"));
    }

    #[test]
    fn generated_ids_skip_already_interned_names() {
        // Reserve the next few candidates as if they came from a loaded scene.
        let next = COUNTER.load(Ordering::Relaxed);
        for n in next..next + 3 {
            GroupId::intern(&format!("group_{n}"));
        }
        let fresh = GroupId::generate();
        let taken: Vec<String> = (next..next + 3).map(|n| format!("group_{n}")).collect();
        assert!(!taken.iter().any(|t| t == fresh.as_str()));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = TokenId::intern("spacing-sm");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"spacing-sm\"");
        let back: TokenId = serde_json::from_str("\"spacing-sm\"").unwrap();
        assert_eq!(back, id);
    }
}
