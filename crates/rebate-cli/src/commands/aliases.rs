use clap::Args;
use serde_json::{Map, Value};

use rebate_core::ingest::CanonicalField;

use crate::config::EngineConfig;

/// Arguments for listing accepted column names
#[derive(Args)]
pub struct AliasesArgs {
    /// Path to a JSON/YAML engine config
    #[arg(long)]
    pub config: Option<String>,
}

pub fn run_aliases(args: AliasesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let aliases = EngineConfig::load(args.config.as_deref())?.aliases();
    let mut result = Map::new();
    for field in CanonicalField::ALL {
        result.insert(field.to_string(), Value::from(aliases.aliases(field)));
    }
    Ok(serde_json::json!({ "result": result }))
}
