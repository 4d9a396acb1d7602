//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing sequential ids with counters or amounts.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `u64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - Borsh encoding identical to a bare `u64` (little-endian, 8 bytes)
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_u64()`, `to_le_bytes()`
/// - `From<u64>` and `Into<u64>` implementations
///
/// # Example
///
/// ```rust
/// # use madma_core::define_id;
/// define_id!(DropId);
///
/// let id = DropId::new(7);
/// assert_eq!(id.to_le_bytes(), 7u64.to_le_bytes());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Default,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Create a new ID from a u64 value.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the underlying u64 value.
            #[must_use]
            pub const fn as_u64(&self) -> u64 {
                self.0
            }

            /// Little-endian bytes, as used in derived-address seeds.
            #[must_use]
            pub const fn to_le_bytes(&self) -> [u8; 8] {
                self.0.to_le_bytes()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl ::borsh::BorshSerialize for $name {
            fn serialize<W: ::std::io::Write>(&self, writer: &mut W) -> ::std::io::Result<()> {
                ::borsh::BorshSerialize::serialize(&self.0, writer)
            }
        }

        impl ::borsh::BorshDeserialize for $name {
            fn deserialize_reader<R: ::std::io::Read>(reader: &mut R) -> ::std::io::Result<Self> {
                Ok(Self(<u64 as ::borsh::BorshDeserialize>::deserialize_reader(reader)?))
            }
        }
    };
}

// Sequential id assigned from `Store.designs_count` at creation.
define_id!(DesignId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_design_id_borsh_matches_u64() {
        let id = DesignId::new(0x0102_0304);
        let encoded = borsh::to_vec(&id).unwrap();
        assert_eq!(encoded, borsh::to_vec(&0x0102_0304u64).unwrap());

        let decoded: DesignId = borsh::from_slice(&encoded).unwrap();
        assert_eq!(decoded, id);
    }

    #[test]
    fn test_design_id_display_and_conversions() {
        let id = DesignId::from(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(u64::from(id), 42);
        assert_eq!(id.to_le_bytes(), [42, 0, 0, 0, 0, 0, 0, 0]);
    }
}
