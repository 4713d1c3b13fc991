use std::sync::RwLock;

use hashbrown::HashSet;
use once_cell::sync::Lazy;

static NAME_TABLE: Lazy<RwLock<HashSet<&'static str>>> = Lazy::new(Default::default);

/// An interned string handle. Two `Name`s constructed from equal strings
/// compare equal by pointer, so they are cheap to copy, hash and compare.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Name(&'static str);

impl Name {
    pub fn new(string: &str) -> Self {
        {
            let table = NAME_TABLE.read().unwrap();
            if let Some(&interned) = table.get(string) {
                return Name(interned);
            }
        }

        let mut table = NAME_TABLE.write().unwrap();
        // A racing writer may have inserted between the read and write locks.
        if let Some(&interned) = table.get(string) {
            return Name(interned);
        }

        let leaked: &'static str = Box::leak(string.to_owned().into_boxed_str());
        table.insert(leaked);
        Name(leaked)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl core::fmt::Debug for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Name({:?})", self.0)
    }
}

impl core::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl From<&str> for Name {
    fn from(string: &str) -> Self {
        Name::new(string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_strings_intern_to_the_same_pointer() {
        let a = Name::new("loop");
        let b = Name::new(&String::from("loop"));
        assert_eq!(a, b);
        assert!(std::ptr::eq(a.as_str(), b.as_str()));
    }

    #[test]
    fn distinct_strings_stay_distinct() {
        assert_ne!(Name::new("x"), Name::new("y"));
    }
}
