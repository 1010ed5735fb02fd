/// Uuid-backed identifier. Used for stable type tags that are written to disk.
#[macro_export]
macro_rules! id_type {
    ($name:ident) => {
        #[derive(
            Clone,
            Copy,
            PartialEq,
            Eq,
            Ord,
            PartialOrd,
            Debug,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[repr(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            pub fn unique() -> $name {
                $name(uuid::Uuid::new_v4())
            }
            pub const fn nil() -> $name {
                $name(uuid::Uuid::nil())
            }
            pub const fn from_u128(value: u128) -> $name {
                $name(uuid::Uuid::from_u128(value))
            }
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
            pub fn as_uuid(&self) -> uuid::Uuid {
                self.0
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> $name {
                $name(uuid)
            }
        }

        impl std::str::FromStr for $name {
            type Err = anyhow::Error;

            fn from_str(id: &str) -> Result<$name, Self::Err> {
                let uuid = uuid::Uuid::parse_str(id)?;
                Ok($name(uuid))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Default for $name {
            fn default() -> $name {
                $name::nil()
            }
        }
    };
}

/// Sequential `u64` identifier. Zero is reserved as the invalid sentinel, so
/// generators start handing out values at one.
#[macro_export]
macro_rules! seq_id_type {
    ($name:ident) => {
        #[derive(
            Clone,
            Copy,
            PartialEq,
            Eq,
            Ord,
            PartialOrd,
            Debug,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const INVALID: $name = $name(0);

            pub const fn new(value: u64) -> $name {
                $name(value)
            }
            pub fn is_valid(&self) -> bool {
                self.0 != 0
            }
            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> $name {
                $name(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "#{}", self.0)
            }
        }

        impl Default for $name {
            fn default() -> $name {
                $name::INVALID
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    id_type!(TestTypeId);
    seq_id_type!(TestSeqId);

    #[test]
    fn uuid_id_parses_and_prints() -> anyhow::Result<()> {
        let id = TestTypeId::from_str("d4d27137-5a14-437a-8bb5-b2f7be0941a2")?;
        assert_eq!(id.to_string(), "d4d27137-5a14-437a-8bb5-b2f7be0941a2");
        assert!(!id.is_nil());
        assert!(TestTypeId::default().is_nil());
        assert!(TestTypeId::from_str("not a uuid").is_err());

        Ok(())
    }

    #[test]
    fn seq_id_sentinel_and_order() {
        assert!(!TestSeqId::default().is_valid());
        assert_eq!(TestSeqId::default(), TestSeqId::INVALID);
        assert!(TestSeqId::new(1).is_valid());
        assert!(TestSeqId::new(1) < TestSeqId::new(2));
        assert_eq!(TestSeqId::new(7).to_string(), "#7");
        assert_eq!(serde_json::to_string(&TestSeqId::new(3)).unwrap(), "3");
    }
}
