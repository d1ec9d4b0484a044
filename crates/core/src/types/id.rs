//! Newtype IDs for type-safe entity references.
//!
//! Supabase rows are keyed by `UUID`, WooCommerce catalog entries by their
//! integer `databaseId`. The `define_id!` macro wraps either so that a cart id
//! can never be passed where an order id is expected.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around the given inner type with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `into_inner()`
/// - `From<Inner>` and `Into<Inner>` implementations
/// - `Display` and `FromStr` delegating to the inner type
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use impacto33_core::define_id;
/// define_id!(QuoteId, i32);
/// define_id!(InvoiceId, i32);
///
/// let quote_id = QuoteId::new(1);
/// let invoice_id = InvoiceId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: QuoteId = invoice_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $inner:ty) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Wrap a raw ID value.
            #[must_use]
            pub const fn new(id: $inner) -> Self {
                Self(id)
            }

            /// Get the underlying value.
            #[must_use]
            pub const fn into_inner(self) -> $inner {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = <$inner as ::core::str::FromStr>::Err;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.parse::<$inner>().map(Self)
            }
        }

        impl From<$inner> for $name {
            fn from(id: $inner) -> Self {
                Self(id)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <$inner as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <$inner as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <$inner as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <$inner as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

// Supabase-owned rows
define_id!(UserId, ::uuid::Uuid);
define_id!(CartId, ::uuid::Uuid);
define_id!(CartItemId, ::uuid::Uuid);
define_id!(OrderId, ::uuid::Uuid);
define_id!(OrderItemId, ::uuid::Uuid);
define_id!(SearchHistoryId, ::uuid::Uuid);

// WooCommerce catalog entries
define_id!(ProductId, i32);
define_id!(VariationId, i32);

impl ProductId {
    /// WooCommerce never issues non-positive database ids.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_id_parses_and_displays() {
        let raw = "6f1c2f0e-3d7a-4b7e-9a43-2f1f6c0b8d11";
        let id: UserId = raw.parse().unwrap();
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn test_product_id_validity() {
        assert!(ProductId::new(42).is_valid());
        assert!(!ProductId::new(0).is_valid());
        assert!(!ProductId::new(-3).is_valid());
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&ProductId::new(1234)).unwrap();
        assert_eq!(json, "1234");

        let parsed: VariationId = serde_json::from_str("77").unwrap();
        assert_eq!(parsed.into_inner(), 77);
    }
}
