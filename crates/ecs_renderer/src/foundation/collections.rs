//! Handle-based collections for backend resources

pub use slotmap::{DefaultKey, Key, KeyData, SlotMap};

/// Handle-based map using slot map for stable references
pub type HandleMap<T> = SlotMap<DefaultKey, T>;

/// Pack a slot map key into the opaque `u64` carried by backend handles
pub fn key_to_bits(key: DefaultKey) -> u64 {
    key.data().as_ffi()
}

/// Recover a slot map key from a backend handle
///
/// Stale or foreign values produce a key that simply misses on lookup.
pub fn key_from_bits(bits: u64) -> DefaultKey {
    KeyData::from_ffi(bits).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_round_trip_and_stale_keys_miss() {
        let mut map: HandleMap<&str> = HandleMap::new();
        let key = map.insert("program");
        let bits = key_to_bits(key);
        assert_eq!(map.get(key_from_bits(bits)), Some(&"program"));

        map.remove(key);
        map.insert("reused slot");
        assert!(map.get(key_from_bits(bits)).is_none());
    }
}
