//! Implementation of the `proxen inspect` command.

use proxen_cache::{inspect_image, ImageSummary};

use crate::{GlobalArgs, InspectArgs, ReportFormat};

/// Runs `proxen inspect`.
pub fn run(args: &InspectArgs, _global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    if !args.image.exists() {
        return Err(format!("file not found: {}", args.image.display()).into());
    }
    let summary = inspect_image(&args.image)?;
    let report = match args.format {
        ReportFormat::Text => render_text(&summary),
        ReportFormat::Json => serde_json::to_string_pretty(&summary)?,
    };
    println!("{report}");
    Ok(0)
}

fn render_text(summary: &ImageSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("container: {} ({})\n", summary.container, summary.tier));
    out.push_str(&format!(
        "format:    v{}, written by proxen {}\n",
        summary.format_version, summary.engine_version
    ));
    out.push_str(&format!("checksum:  {}\n", summary.checksum));
    match &summary.sealed_by {
        Some(key_id) => out.push_str(&format!("sealed by: {key_id}\n")),
        None => out.push_str("sealed by: -\n"),
    }

    out.push_str(&format!("implementations ({}):\n", summary.implementations.len()));
    for name in &summary.implementations {
        out.push_str(&format!("  {name}\n"));
    }

    match &summary.mappings {
        Some(mappings) => {
            out.push_str(&format!("mappings ({}):\n", mappings.len()));
            for (key, implementation) in mappings {
                out.push_str(&format!("  {key} -> {implementation}\n"));
            }
        }
        None => out.push_str("mappings: none (image carries no signature metadata)\n"),
    }
    out.trim_end().to_string()
}
