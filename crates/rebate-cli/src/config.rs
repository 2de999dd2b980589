use serde::{Deserialize, Serialize};
use tracing::debug;

use rebate_core::ingest::FieldAliases;
use rebate_core::summary::AggregationConfig;
use rebate_core::tiers::{TierSpec, TierTable};

use crate::input;

/// Optional settings file (`.json`, `.yaml`, `.yml`). Every section may be
/// omitted; command-line flags override what is loaded here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rebate tiers in table order, rebates as percentages
    #[serde(default)]
    pub tiers: Option<Vec<TierSpec>>,
    /// Column-name overrides per canonical field
    #[serde(default)]
    pub aliases: Option<FieldAliases>,
    #[serde(default)]
    pub aggregation: Option<AggregationConfig>,
}

impl EngineConfig {
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        match path {
            Some(p) => {
                let config: EngineConfig = input::file::read_structured(p)?;
                debug!(
                    path = p,
                    tiers = config.tiers.as_ref().map(Vec::len),
                    "loaded engine config"
                );
                Ok(config)
            }
            None => Ok(EngineConfig::default()),
        }
    }

    /// Tiers from `tiers_path` if given, else from the config file, else
    /// the default table.
    pub fn tier_table(&self, tiers_path: Option<&str>) -> Result<TierTable, Box<dyn std::error::Error>> {
        if let Some(path) = tiers_path {
            let specs: Vec<TierSpec> = input::file::read_structured(path)?;
            return Ok(TierTable::from_specs(&specs));
        }
        Ok(self
            .tiers
            .as_deref()
            .map(TierTable::from_specs)
            .unwrap_or_default())
    }

    pub fn aliases(&self) -> FieldAliases {
        self.aliases.clone().unwrap_or_default()
    }

    pub fn aggregation(&self) -> AggregationConfig {
        self.aggregation.clone().unwrap_or_default()
    }
}
