use clap::ValueEnum;

/// Collection 1 catalogs searchable through the inventory service.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dataset {
    #[default]
    #[value(name = "LANDSAT_TM_C1")]
    LandsatTmC1,
    #[value(name = "LANDSAT_ETM_C1")]
    LandsatEtmC1,
    #[value(name = "LANDSAT_MSS_C1")]
    LandsatMssC1,
    #[value(name = "LANDSAT_8_C1")]
    Landsat8C1,
}

impl Dataset {
    pub fn key(&self) -> &str {
        match self {
            Self::LandsatTmC1 => "LANDSAT_TM_C1",
            Self::LandsatEtmC1 => "LANDSAT_ETM_C1",
            Self::LandsatMssC1 => "LANDSAT_MSS_C1",
            Self::Landsat8C1 => "LANDSAT_8_C1",
        }
    }
}
