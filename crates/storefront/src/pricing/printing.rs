//! Printing methods and where they may be used.

use serde::Serialize;

use super::PricingFamily;

/// How a printing method is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricingType {
    /// Fixed cost for each print zone.
    FlatPerZone,
    /// Cost grows with the number of ink colours.
    ColorCount,
}

/// A printing technique offered by the workshop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PrintingMethod {
    #[serde(rename = "DTF")]
    Dtf,
    #[serde(rename = "SERIGRAFIA_1_COLOR")]
    Serigrafia1Color,
    #[serde(rename = "BORDADO")]
    Bordado,
    #[serde(rename = "DTF_UV")]
    DtfUv,
    #[serde(rename = "TAMPO_1_COLOR")]
    Tampo1Color,
    #[serde(rename = "SIN_IMPRESION")]
    SinImpresion,
}

impl PrintingMethod {
    pub const ALL: &'static [Self] = &[
        Self::Dtf,
        Self::Serigrafia1Color,
        Self::Bordado,
        Self::DtfUv,
        Self::Tampo1Color,
        Self::SinImpresion,
    ];

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Dtf => "DTF",
            Self::Serigrafia1Color => "SERIGRAFIA_1_COLOR",
            Self::Bordado => "BORDADO",
            Self::DtfUv => "DTF_UV",
            Self::Tampo1Color => "TAMPO_1_COLOR",
            Self::SinImpresion => "SIN_IMPRESION",
        }
    }

    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.id() == id)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dtf => "DTF Full Color",
            Self::Serigrafia1Color => "Serigrafía 1 color",
            Self::Bordado => "Bordado Textil",
            Self::DtfUv => "DTF UV",
            Self::Tampo1Color => "Tampografía 1 color",
            Self::SinImpresion => "Solo prenda, sin impresión",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Dtf => {
                "Impresión digital a todo color, ideal para logos con muchos detalles y gradientes."
            }
            Self::Serigrafia1Color => {
                "Serigrafía clásica, óptima para pedidos medios/grandes con diseños de 1 color."
            }
            Self::Bordado => "Bordado textil, ideal para prendas premium y acabados duraderos.",
            Self::DtfUv => {
                "Impresión DTF con curado UV, ideal para productos rígidos (tazas, botellas, etc.)."
            }
            Self::Tampo1Color => {
                "Tampografía clásica, óptima para volúmenes grandes en productos rígidos."
            }
            Self::SinImpresion => "Solo la prenda sin personalización.",
        }
    }

    #[must_use]
    pub const fn pricing_type(self) -> PricingType {
        match self {
            Self::Serigrafia1Color | Self::Tampo1Color => PricingType::ColorCount,
            Self::Dtf | Self::Bordado | Self::DtfUv | Self::SinImpresion => PricingType::FlatPerZone,
        }
    }

    /// Whether the method can be chosen on the site today.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Dtf)
    }
}

/// Methods available to a family and their minimum runs.
#[derive(Debug, Clone, Copy)]
pub struct FamilyPrintingConfig {
    pub methods: &'static [PrintingMethod],
    /// Subset of `methods` offered in the UI.
    pub active_in_ui: &'static [PrintingMethod],
    pub min_qty_by_method: &'static [(PrintingMethod, u32)],
}

impl FamilyPrintingConfig {
    /// Minimum run for a method; methods without a minimum accept 1 unit.
    #[must_use]
    pub fn min_quantity_for(&self, method: PrintingMethod) -> u32 {
        self.min_qty_by_method
            .iter()
            .find(|(m, _)| *m == method)
            .map_or(1, |(_, qty)| *qty)
    }

    #[must_use]
    pub fn is_active_in_ui(&self, method: PrintingMethod) -> bool {
        self.active_in_ui.contains(&method)
    }
}

const TEXTILE_METHODS: &[PrintingMethod] = &[
    PrintingMethod::Dtf,
    PrintingMethod::Serigrafia1Color,
    PrintingMethod::Bordado,
];
const RIGID_METHODS: &[PrintingMethod] = &[PrintingMethod::DtfUv, PrintingMethod::Tampo1Color];

impl PricingFamily {
    /// Printing methods configured for the family.
    #[must_use]
    pub const fn printing(self) -> FamilyPrintingConfig {
        use PrintingMethod::{Bordado, Dtf, DtfUv, Serigrafia1Color, Tampo1Color};

        match self {
            Self::Ropa => FamilyPrintingConfig {
                methods: TEXTILE_METHODS,
                active_in_ui: &[Dtf],
                min_qty_by_method: &[(Dtf, 25), (Serigrafia1Color, 50), (Bordado, 25)],
            },
            Self::Accesorios => FamilyPrintingConfig {
                methods: TEXTILE_METHODS,
                active_in_ui: &[Dtf],
                min_qty_by_method: &[(Dtf, 50), (Serigrafia1Color, 100), (Bordado, 50)],
            },
            Self::Hogar => FamilyPrintingConfig {
                methods: RIGID_METHODS,
                active_in_ui: &[],
                min_qty_by_method: &[(DtfUv, 20), (Tampo1Color, 100)],
            },
            Self::Papeleria => FamilyPrintingConfig {
                methods: RIGID_METHODS,
                active_in_ui: &[],
                min_qty_by_method: &[(DtfUv, 100), (Tampo1Color, 250)],
            },
            Self::Otros => FamilyPrintingConfig {
                methods: &[Dtf],
                active_in_ui: &[Dtf],
                min_qty_by_method: &[(Dtf, 10)],
            },
        }
    }
}

const DTF_SERIGRAFIA_PLAIN: &[PrintingMethod] = &[
    PrintingMethod::Dtf,
    PrintingMethod::Serigrafia1Color,
    PrintingMethod::SinImpresion,
];
const DTF_PLAIN: &[PrintingMethod] = &[PrintingMethod::Dtf, PrintingMethod::SinImpresion];

/// Categories that accept screen printing besides DTF.
const SERIGRAFIA_CATEGORIES: &[&str] = &[
    "t_shirts",
    "cam",
    "cam_w",
    "cat",
    "camisetas-manga-corta",
    "sp_tshi",
    "industrytshirts",
    "serviciostshirts",
    "highvistshirts",
    "pol_s",
    "pol_l",
    "swe",
    "hoodies",
    "cha",
    "chuba",
    "pan",
    "trousers",
    "mono",
    "chnd",
    "servicioschalecos",
    "highvischalecos",
    "gor",
    "hats",
    "travel_caps",
    "christmas_hats",
];

/// Methods allowed for a WooCommerce category. Everything not listed as
/// screen-printable takes DTF or no print.
#[must_use]
pub fn allowed_methods_for_category(slug: &str) -> &'static [PrintingMethod] {
    if SERIGRAFIA_CATEGORIES.contains(&slug) {
        DTF_SERIGRAFIA_PLAIN
    } else {
        DTF_PLAIN
    }
}

const ZONE_OVERRIDES: &[(&str, &[&str])] = &[
    ("camisetas-personalizadas", &["frontal", "espalda", "manga_izquierda", "manga_derecha"]),
    ("polos-personalizados", &["frontal", "espalda", "manga_izquierda", "manga_derecha"]),
    ("sudaderas-personalizadas", &["frontal", "espalda", "manga_izquierda", "manga_derecha"]),
    ("chaquetas-personalizadas", &["frontal", "espalda", "manga_izquierda", "manga_derecha"]),
    ("bolsas-personalizadas", &["frontal", "espalda"]),
    ("gorras-personalizadas", &["frontal", "espalda"]),
    ("llaveros-personalizados", &["frontal"]),
];

/// Zones configured specifically for a category, if any.
#[must_use]
pub fn allowed_zones_for_category(slug: &str) -> Option<&'static [&'static str]> {
    ZONE_OVERRIDES
        .iter()
        .find(|(s, _)| *s == slug)
        .map(|(_, zones)| *zones)
}

/// Spanish label of a print zone.
#[must_use]
pub fn zone_label(zone: &str) -> &str {
    match zone {
        "frontal" => "Frontal",
        "espalda" => "Espalda",
        "manga_izquierda" => "Manga izquierda",
        "manga_derecha" => "Manga derecha",
        "frente" => "Frente",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_dtf_is_active() {
        let active: Vec<_> = PrintingMethod::ALL.iter().filter(|m| m.is_active()).collect();
        assert_eq!(active, vec![&PrintingMethod::Dtf]);
    }

    #[test]
    fn test_pricing_types() {
        assert_eq!(PrintingMethod::Dtf.pricing_type(), PricingType::FlatPerZone);
        assert_eq!(PrintingMethod::Serigrafia1Color.pricing_type(), PricingType::ColorCount);
        assert_eq!(PrintingMethod::Tampo1Color.pricing_type(), PricingType::ColorCount);
        assert_eq!(PrintingMethod::SinImpresion.pricing_type(), PricingType::FlatPerZone);
    }

    #[test]
    fn test_family_min_quantities() {
        let ropa = PricingFamily::Ropa.printing();
        assert_eq!(ropa.min_quantity_for(PrintingMethod::Serigrafia1Color), 50);
        assert_eq!(ropa.min_quantity_for(PrintingMethod::DtfUv), 1);

        let hogar = PricingFamily::Hogar.printing();
        assert!(hogar.active_in_ui.is_empty());
        assert_eq!(hogar.min_quantity_for(PrintingMethod::Tampo1Color), 100);
    }

    #[test]
    fn test_active_methods_are_configured() {
        for family in PricingFamily::ALL {
            let config = family.printing();
            for method in config.active_in_ui {
                assert!(config.methods.contains(method));
            }
        }
    }

    #[test]
    fn test_allowed_methods_for_category() {
        assert!(allowed_methods_for_category("pol_s").contains(&PrintingMethod::Serigrafia1Color));
        assert_eq!(allowed_methods_for_category("mugs"), DTF_PLAIN);
        assert_eq!(allowed_methods_for_category(""), DTF_PLAIN);
    }

    #[test]
    fn test_zone_overrides() {
        assert_eq!(allowed_zones_for_category("llaveros-personalizados"), Some(&["frontal"][..]));
        assert_eq!(allowed_zones_for_category("gorras-personalizadas").map(<[_]>::len), Some(2));
        assert_eq!(allowed_zones_for_category("tazas-personalizadas"), None);
    }

    #[test]
    fn test_method_ids_round_trip() {
        for method in PrintingMethod::ALL {
            assert_eq!(PrintingMethod::from_id(method.id()), Some(*method));
        }
    }
}
