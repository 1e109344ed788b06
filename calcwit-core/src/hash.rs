//! Name hashing for component name tables.
//!
//! Generated code addresses signals and sub-components by a 64-bit FNV-1a
//! hash of their local name, computed at compile time. The driver uses the
//! same function to locate main-component inputs by name.

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a hash of `name`.
pub fn fnv1a(name: &str) -> u64 {
    name.bytes().fold(FNV_OFFSET_BASIS, |h, b| {
        (h ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_vectors() {
        assert_eq!(fnv1a(""), 0xcbf29ce484222325);
        assert_eq!(fnv1a("a"), 0xaf63dc4c8601ec8c);
        assert_eq!(fnv1a("foobar"), 0x85944171f73967e8);
    }

    #[test]
    fn test_distinct_names() {
        assert_ne!(fnv1a("in"), fnv1a("out"));
    }
}
