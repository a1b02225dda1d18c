//! Implementation of the `proxen verify` command.

use proxen_engine::GenerationEngine;

use crate::{GlobalArgs, VerifyArgs};

/// Runs `proxen verify`.
///
/// Loads the image into a fresh engine, checking the seal when a key is
/// available, and reports how many mappings were registered.
pub fn run(args: &VerifyArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let mut config = global.engine_config()?;
    if let Some(key) = &args.key {
        config.signing.key_file = Some(key.clone());
    }

    let engine = GenerationEngine::new(config);
    let registered = engine.load(&args.image)?;
    tracing::debug!(registered, "verify complete");
    if !global.quiet {
        println!(
            "{}: ok, {registered} mapping(s) registered",
            args.image.display()
        );
    }
    Ok(0)
}
