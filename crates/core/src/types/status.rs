//! Status and classification enums persisted as text columns.
//!
//! Every enum round-trips through its `snake_case` database value via
//! [`as_str`](CartStatus::as_str) / [`FromStr`](std::str::FromStr) and carries a
//! Spanish `label()` for templates.

use serde::{Deserialize, Serialize};

/// Error returned when a stored or submitted value is not a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct UnknownVariant {
    /// Name of the enum being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => ($value:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Database / form value.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $value),+
                }
            }

            /// Human-readable Spanish label.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum! {
    /// Lifecycle of a shopping cart.
    ///
    /// A user has at most one `Active` cart at a time; the others are history.
    CartStatus, "cart status" {
        Active => ("active", "Activo"),
        ConvertedToOrder => ("converted_to_order", "Convertido en pedido"),
        Abandoned => ("abandoned", "Abandonado"),
        Cancelled => ("cancelled", "Cancelado"),
    }
}

text_enum! {
    /// Order processing status.
    OrderStatus, "order status" {
        Pending => ("pending", "Pendiente"),
        Processing => ("processing", "En proceso"),
        Completed => ("completed", "Completado"),
        Cancelled => ("cancelled", "Cancelado"),
        Refunded => ("refunded", "Reembolsado"),
    }
}

text_enum! {
    /// Kind of organisation answering the onboarding questionnaire.
    CompanyType, "company type" {
        Small => ("small", "Pequeña empresa"),
        Medium => ("medium", "Mediana o gran empresa"),
        Agency => ("agency", "Agencia"),
        Ngo => ("ngo", "ONG / Asociación"),
        Individual => ("individual", "Particular"),
    }
}

text_enum! {
    /// What the customer mainly uses merchandising for.
    MerchUsage, "merch usage" {
        Corporate => ("corporate", "Eventos corporativos"),
        Uniforms => ("uniforms", "Uniformes de trabajo"),
        Gifts => ("gifts", "Regalos a clientes"),
        Welcome => ("welcome", "Packs de bienvenida"),
        Ecommerce => ("ecommerce", "Venta en tienda online"),
    }
}

text_enum! {
    /// Typical order size declared during onboarding.
    OrderVolume, "order volume" {
        Small => ("small", "Menos de 100 unidades"),
        Medium => ("medium", "Entre 100 y 500 unidades"),
        Large => ("large", "Más de 500 unidades"),
    }
}

impl Default for CartStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl OrderStatus {
    /// Whether the order can still change state.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }
}

#[cfg(feature = "postgres")]
mod pg {
    use super::{CartStatus, CompanyType, MerchUsage, OrderStatus, OrderVolume};

    macro_rules! text_column {
        ($($name:ident),+) => {$(
            impl ::sqlx::Type<::sqlx::Postgres> for $name {
                fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                    <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
                }

                fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                    <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
                }
            }

            impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
                fn decode(
                    value: ::sqlx::postgres::PgValueRef<'r>,
                ) -> Result<Self, ::sqlx::error::BoxDynError> {
                    let s = <&str as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                    Ok(s.parse()?)
                }
            }

            impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
                fn encode_by_ref(
                    &self,
                    buf: &mut ::sqlx::postgres::PgArgumentBuffer,
                ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                    <&str as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
                }
            }
        )+};
    }

    text_column!(CartStatus, OrderStatus, CompanyType, MerchUsage, OrderVolume);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_status_roundtrip() {
        for status in CartStatus::ALL {
            assert_eq!(status.as_str().parse::<CartStatus>().unwrap(), *status);
        }
        assert_eq!(CartStatus::ConvertedToOrder.as_str(), "converted_to_order");
    }

    #[test]
    fn test_order_status_serde_matches_db_value() {
        let json = serde_json::to_string(&OrderStatus::Refunded).unwrap();
        assert_eq!(json, "\"refunded\"");
        assert!(OrderStatus::Processing.is_open());
        assert!(!OrderStatus::Completed.is_open());
    }

    #[test]
    fn test_unknown_variant_error() {
        let err = "enterprise".parse::<CompanyType>().unwrap_err();
        assert_eq!(err.to_string(), "invalid company type: enterprise");
    }

    #[test]
    fn test_onboarding_enums_cover_questionnaire() {
        assert_eq!(CompanyType::ALL.len(), 5);
        assert_eq!(MerchUsage::ALL.len(), 5);
        assert_eq!(OrderVolume::ALL.len(), 3);
        assert_eq!(MerchUsage::Welcome.label(), "Packs de bienvenida");
    }
}
