//! Implementation of the `proxen generate` command.

use std::path::Path;

use proxen_common::Tier;
use proxen_config::EngineConfig;
use proxen_engine::{GenerationEngine, TierPreference};
use proxen_synth::TargetDescription;

use crate::{GenerateArgs, GlobalArgs, Preference};

/// Runs `proxen generate`.
///
/// Every description is synthesized (or found in the cache), then each
/// materialized tier is saved. Returns exit code 1 if any description was
/// rejected.
pub fn run(args: &GenerateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let mut config = global.engine_config()?;
    apply_overrides(&mut config, args);

    let targets = read_targets(&args.targets)?;
    let engine = GenerationEngine::new(config);
    let preference = tier_preference(args.prefer);

    let mut failures = 0usize;
    for description in &targets {
        match engine.get_or_synthesize(description, preference) {
            Ok(handle) => {
                if !global.quiet {
                    println!(
                        "  {} -> {} ({})",
                        description.key(),
                        handle.name(),
                        handle.tier()
                    );
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("error: {}: {e}", description.key());
            }
        }
    }

    for tier in Tier::ALL {
        if engine.container(tier).is_none() {
            continue;
        }
        if let Some(path) = engine.save(Some(tier))? {
            if !global.quiet {
                println!("  saved {tier} image to {}", path.display());
            }
        }
    }

    if !global.quiet {
        let stats = engine.stats();
        println!(
            "{} target(s): {} synthesized, {} failed",
            targets.len(),
            stats.synthesized,
            failures
        );
    }

    Ok(if failures == 0 { 0 } else { 1 })
}

fn apply_overrides(config: &mut EngineConfig, args: &GenerateArgs) {
    if let Some(out) = &args.out {
        config.engine.persist = true;
        config.engine.directory = Some(out.clone());
    }
    if let Some(key) = &args.key {
        config.signing.key_file = Some(key.clone());
    }
}

fn tier_preference(prefer: Preference) -> TierPreference {
    match prefer {
        Preference::Standard => TierPreference::Standard,
        Preference::Elevated => TierPreference::Elevated,
        Preference::Auto => TierPreference::ElevatedIfPossible,
    }
}

/// Reads a JSON array of target descriptions.
fn read_targets(path: &Path) -> Result<Vec<TargetDescription>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let targets: Vec<TargetDescription> = serde_json::from_str(&content)
        .map_err(|e| format!("invalid target file {}: {e}", path.display()))?;
    Ok(targets)
}
