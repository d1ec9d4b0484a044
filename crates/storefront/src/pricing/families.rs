//! Pricing families and the WooCommerce category → family mapping.

use serde::Serialize;

use super::{PricingData, hundredths as h};

use self::PricingFamily::{Accesorios, Hogar, Papeleria, Ropa};

/// A group of categories sharing one pricing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingFamily {
    Ropa,
    Accesorios,
    Hogar,
    Papeleria,
    Otros,
}

const FOUR_ZONES: &[&str] = &["frontal", "espalda", "manga_izquierda", "manga_derecha"];

const ROPA: PricingData = PricingData {
    category_name: "Ropa Personalizada",
    min_quantity: 25,
    scale_factors: &[
        (25, h(516)),
        (50, h(369)),
        (100, h(247)),
        (250, h(185)),
        (500, h(132)),
        (1000, h(100)),
        (2000, h(89)),
    ],
    zone_costs: &[
        ("frontal", h(45)),
        ("espalda", h(40)),
        ("manga_izquierda", h(50)),
        ("manga_derecha", h(50)),
    ],
    allowed_zones: FOUR_ZONES,
    notes: "Precios DTF, IVA incluido. Personalización full color.",
};

const ACCESORIOS: PricingData = PricingData {
    category_name: "Accesorios Personalizados",
    min_quantity: 50,
    scale_factors: &[
        (50, h(450)),
        (100, h(300)),
        (250, h(200)),
        (500, h(150)),
        (1000, h(100)),
        (2000, h(90)),
    ],
    zone_costs: &[("frontal", h(60)), ("espalda", h(50))],
    allowed_zones: &["frontal", "espalda"],
    notes: "Precios DTF, IVA incluido. Cantidad mínima 50 unidades.",
};

const HOGAR: PricingData = PricingData {
    category_name: "Artículos para el Hogar",
    min_quantity: 20,
    scale_factors: &[
        (20, h(600)),
        (50, h(400)),
        (100, h(250)),
        (250, h(180)),
        (500, h(140)),
        (1000, h(100)),
        (2000, h(90)),
    ],
    zone_costs: &[("frontal", h(30))],
    allowed_zones: &["frontal"],
    notes: "Precios DTF, IVA incluido. Cantidad mínima 20 unidades.",
};

const PAPELERIA: PricingData = PricingData {
    category_name: "Papelería Personalizada",
    min_quantity: 100,
    scale_factors: &[
        (100, h(500)),
        (250, h(350)),
        (500, h(250)),
        (1000, h(150)),
        (2000, h(100)),
    ],
    zone_costs: &[("frente", h(20))],
    allowed_zones: &["frente"],
    notes: "Precios DTF, IVA incluido. Cantidad mínima 100 unidades.",
};

const OTROS: PricingData = PricingData {
    category_name: "Otros Productos",
    min_quantity: 10,
    scale_factors: &[
        (10, h(516)),
        (25, h(369)),
        (50, h(297)),
        (100, h(213)),
        (250, h(167)),
        (500, h(132)),
        (1000, h(100)),
        (2000, h(89)),
    ],
    zone_costs: &[
        ("frontal", h(50)),
        ("espalda", h(45)),
        ("manga_izquierda", h(50)),
        ("manga_derecha", h(50)),
    ],
    allowed_zones: FOUR_ZONES,
    notes: "Precios DTF por defecto, IVA incluido.",
};

/// Table used when a family id cannot be resolved at all.
pub const EMERGENCY_PRICING: PricingData = PricingData {
    category_name: "Emergency",
    min_quantity: 10,
    scale_factors: &[(1, h(100))],
    zone_costs: &[("frontal", h(50))],
    allowed_zones: &["frontal"],
    notes: "Emergency Fallback",
};

/// WooCommerce category slug → family. Unlisted slugs are `Otros`.
const CATEGORY_FAMILIES: &[(&str, PricingFamily)] = &[
    // Camisetas
    ("t_shirts", Ropa),
    ("cam", Ropa),
    ("cam_w", Ropa),
    ("cat", Ropa),
    ("camisetas-manga-corta", Ropa),
    ("sp_tshi", Ropa),
    ("industrytshirts", Ropa),
    ("serviciostshirts", Ropa),
    ("highvistshirts", Ropa),
    // Polos, sudaderas, chaquetas
    ("pol_s", Ropa),
    ("pol_l", Ropa),
    ("swe", Ropa),
    ("hoodies", Ropa),
    ("cha", Ropa),
    ("chuba", Ropa),
    ("coats", Ropa),
    ("w_coats", Ropa),
    ("subcoats", Ropa),
    ("raincoats", Ropa),
    ("windbreak", Ropa),
    ("pan", Ropa),
    ("trousers", Ropa),
    ("mono", Ropa),
    ("chnd", Ropa),
    // Vestuario laboral
    ("servicioschalecos", Ropa),
    ("highvischalecos", Ropa),
    ("sanitarybata", Ropa),
    ("foodindustrybata", Ropa),
    ("horecachaqueta", Ropa),
    ("horecacamisas", Ropa),
    ("horecadelantal", Ropa),
    ("sanitarycasaca", Ropa),
    ("sanitarygorro", Ropa),
    ("foodindustrygorro", Ropa),
    ("industryjackets", Ropa),
    ("servicioschaqutas", Ropa),
    ("highvischaquetas", Ropa),
    // Bolsas y mochilas
    ("bags", Accesorios),
    ("sub_bags", Accesorios),
    ("drawstring_bag", Accesorios),
    ("bags_coolers", Accesorios),
    ("bags_travel", Accesorios),
    ("waterproof_dry_bags", Accesorios),
    ("summer_cooler_bags", Accesorios),
    ("subbackpacks", Accesorios),
    ("backpacks", Accesorios),
    // Gorras, frío, viaje
    ("gor", Accesorios),
    ("hats", Accesorios),
    ("travel_caps", Accesorios),
    ("christmas_hats", Accesorios),
    ("gloves", Accesorios),
    ("neckwarmer", Accesorios),
    ("travel_accessories", Accesorios),
    ("travel_adaptors", Accesorios),
    ("sunglasses", Accesorios),
    ("subsunglasses", Accesorios),
    ("sunglasses_pouches", Accesorios),
    // Tecnología
    ("tech_accessories", Accesorios),
    ("wireless_charger", Accesorios),
    ("car_charger", Accesorios),
    ("chargers", Accesorios),
    ("earphones", Accesorios),
    ("headphones", Accesorios),
    ("speakers", Accesorios),
    ("mouse_pad", Accesorios),
    ("acc", Accesorios),
    ("sport_accessories", Accesorios),
    ("acc_outdoor", Accesorios),
    ("take_away", Accesorios),
    ("pets_accessories", Accesorios),
    // Tazas, botellas, hogar
    ("mugs", Hogar),
    ("submugs", Hogar),
    ("cup_warmer", Hogar),
    ("bottles", Hogar),
    ("bottles_thermos_flas", Hogar),
    ("glass_bottles", Hogar),
    ("thermos_flasks", Hogar),
    ("sports_bottles", Hogar),
    ("home_gifts", Hogar),
    ("kitchen", Hogar),
    ("home_cocktail", Hogar),
    ("decoration", Hogar),
    ("decoration_games", Hogar),
    ("decorations", Hogar),
    // Papelería
    ("ball_pens", Papeleria),
    ("notebooks", Papeleria),
    ("pencil_cases", Papeleria),
    ("diaries_calendars", Papeleria),
    ("writing", Papeleria),
    ("writing_office", Papeleria),
];

impl PricingFamily {
    pub const ALL: &'static [Self] = &[
        Self::Ropa,
        Self::Accesorios,
        Self::Hogar,
        Self::Papeleria,
        Self::Otros,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ropa => "ropa",
            Self::Accesorios => "accesorios",
            Self::Hogar => "hogar",
            Self::Papeleria => "papeleria",
            Self::Otros => "otros",
        }
    }

    /// Parse a family id as used in forms.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == id)
    }

    /// Family of a WooCommerce category slug; unknown or empty slugs are `Otros`.
    #[must_use]
    pub fn from_category_slug(slug: &str) -> Self {
        CATEGORY_FAMILIES
            .iter()
            .find(|(s, _)| *s == slug)
            .map_or(Self::Otros, |(_, family)| *family)
    }

    /// Family of a product: the first category that maps to a specific
    /// family wins, otherwise `Otros`.
    pub fn for_categories<'a>(slugs: impl IntoIterator<Item = &'a str>) -> Self {
        slugs
            .into_iter()
            .map(Self::from_category_slug)
            .find(|family| *family != Self::Otros)
            .unwrap_or(Self::Otros)
    }

    /// Pricing table of the family.
    #[must_use]
    pub const fn data(self) -> &'static PricingData {
        match self {
            Self::Ropa => &ROPA,
            Self::Accesorios => &ACCESORIOS,
            Self::Hogar => &HOGAR,
            Self::Papeleria => &PAPELERIA,
            Self::Otros => &OTROS,
        }
    }
}

/// Pricing table for a family id, falling back to [`EMERGENCY_PRICING`].
#[must_use]
pub fn pricing_data_for(family_id: &str) -> &'static PricingData {
    PricingFamily::from_id(family_id).map_or(&EMERGENCY_PRICING, PricingFamily::data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_mapping() {
        assert_eq!(PricingFamily::from_category_slug("t_shirts"), PricingFamily::Ropa);
        assert_eq!(PricingFamily::from_category_slug("bags"), PricingFamily::Accesorios);
        assert_eq!(PricingFamily::from_category_slug("mugs"), PricingFamily::Hogar);
        assert_eq!(PricingFamily::from_category_slug("ball_pens"), PricingFamily::Papeleria);
        assert_eq!(PricingFamily::from_category_slug("unknown"), PricingFamily::Otros);
        assert_eq!(PricingFamily::from_category_slug(""), PricingFamily::Otros);
    }

    #[test]
    fn test_product_family_skips_generic_categories() {
        let family = PricingFamily::for_categories(["novedades", "pol_s", "mugs"]);
        assert_eq!(family, PricingFamily::Ropa);
        assert_eq!(PricingFamily::for_categories([]), PricingFamily::Otros);
    }

    #[test]
    fn test_tables_are_sorted_and_start_at_minimum() {
        for family in PricingFamily::ALL {
            let data = family.data();
            assert!(data.scale_factors.windows(2).all(|w| w[0].0 < w[1].0));
            assert_eq!(data.scale_factors[0].0, data.min_quantity);
            for zone in data.allowed_zones {
                assert!(data.zone_costs.iter().any(|(z, _)| z == zone));
            }
        }
    }

    #[test]
    fn test_pricing_data_fallback() {
        assert_eq!(pricing_data_for("hogar").min_quantity, 20);
        assert_eq!(pricing_data_for("bogus"), &EMERGENCY_PRICING);
    }
}
