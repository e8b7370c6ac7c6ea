use proptest::prelude::*;

use runoff_types::{ElectionId, Identity, Timestamp};

proptest! {
    /// Big-endian key bytes order exactly like the numeric ids.
    #[test]
    fn election_id_key_order(a in any::<u64>(), b in any::<u64>()) {
        let ka = ElectionId::new(a).to_be_bytes();
        let kb = ElectionId::new(b).to_be_bytes();
        prop_assert_eq!(ka.cmp(&kb), a.cmp(&b));
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in any::<u64>(), b in any::<u64>()) {
        prop_assert_eq!(Timestamp::new(a) <= Timestamp::new(b), a <= b);
    }

    /// The seconds until a shifted timestamp are the shift, when nothing saturates.
    #[test]
    fn timestamp_plus_then_secs_until(base in 0u64..1_000_000_000, offset in 0u64..1_000_000_000) {
        let t = Timestamp::new(base);
        prop_assert_eq!(t.plus_secs(offset).secs_until(t), offset);
    }

    /// Any non-empty printable token is a valid identity.
    #[test]
    fn printable_tokens_are_identities(raw in "[a-zA-Z0-9_:.-]{1,64}") {
        let identity = Identity::new(raw.clone()).unwrap();
        prop_assert_eq!(identity.as_str(), raw.as_str());
    }

    /// Identity survives a bincode roundtrip with validation re-applied.
    #[test]
    fn identity_bincode_roundtrip(raw in "[a-z0-9]{1,32}") {
        let identity = Identity::new(raw).unwrap();
        let encoded = bincode::serialize(&identity).unwrap();
        let decoded: Identity = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, identity);
    }
}
