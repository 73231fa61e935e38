//! Expression type bitsets.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Set of runtime types an expression may take.
    ///
    /// The source language is dynamically typed; the compiler carries a set
    /// of possible types per expression instead of committing to a single
    /// one. `UNKNOWN` means "not yet resolved" and is never the final type of
    /// a fully resolved expression.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct TypeMask: u8 {
        const UNKNOWN = 1 << 0;
        const INT = 1 << 1;
        const STRING = 1 << 2;
        const FLOAT = 1 << 3;
        const NULL = 1 << 4;
        const BOOL = 1 << 5;
    }
}

impl TypeMask {
    /// Whether the mask still contains the unresolved marker.
    pub fn is_unresolved(self) -> bool {
        self.contains(TypeMask::UNKNOWN)
    }
}

impl Default for TypeMask {
    fn default() -> Self {
        TypeMask::UNKNOWN
    }
}

impl fmt::Display for TypeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, bit) in [
            ("unknown", TypeMask::UNKNOWN),
            ("int", TypeMask::INT),
            ("string", TypeMask::STRING),
            ("float", TypeMask::FLOAT),
            ("null", TypeMask::NULL),
            ("bool", TypeMask::BOOL),
        ] {
            if self.contains(bit) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{}", name)?;
                first = false;
            }
        }
        if first {
            write!(f, "none")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_and_intersection() {
        let mask = TypeMask::STRING | TypeMask::NULL;
        assert!(mask.intersects(TypeMask::STRING));
        assert!(!mask.intersects(TypeMask::INT | TypeMask::FLOAT));
    }

    #[test]
    fn test_default_is_unknown() {
        assert!(TypeMask::default().is_unresolved());
    }

    #[test]
    fn test_display() {
        assert_eq!((TypeMask::STRING | TypeMask::NULL).to_string(), "string|null");
        assert_eq!(TypeMask::INT.to_string(), "int");
    }
}
