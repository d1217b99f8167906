use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing::{error, info, warn};

use gemini_unblend::{
    default_output_path, logging, ProcessOptions, ProcessResult, WatermarkEngine,
    WatermarkVariant,
};

#[derive(Parser)]
#[command(
    name = "gemini-unblend",
    about = "Restore pixels under the visible Gemini watermark by reverse alpha blending",
    version,
    after_help = "Simple usage: gemini-unblend <image>  (writes <name>_cleaned.<ext>)\n\n\
                  The logo is assumed present; images are not checked for it first.\n\
                  Opacity maps bg_48.bin and bg_96.bin are read from --alpha-dir."
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_cleaned.{ext})
    #[arg(short, long)]
    output: Option<String>,

    /// Directory holding the bg_48.bin / bg_96.bin opacity maps
    #[arg(short, long, default_value = "alpha")]
    alpha_dir: PathBuf,

    /// Force 48x48 watermark size (for images <= 1024px)
    #[arg(long)]
    force_small: bool,

    /// Force 96x96 watermark size (for images > 1024px)
    #[arg(long)]
    force_large: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    if cli.force_small && cli.force_large {
        error!("Cannot specify both --force-small and --force-large");
        process::exit(1);
    }

    let force_variant = if cli.force_small {
        Some(WatermarkVariant::Small)
    } else if cli.force_large {
        Some(WatermarkVariant::Large)
    } else {
        None
    };

    let opts = ProcessOptions {
        force_variant,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let engine = match WatermarkEngine::from_dir(&cli.alpha_dir) {
        Ok(e) => e,
        Err(e) => {
            error!("Failed to load opacity maps from {}: {e}", cli.alpha_dir.display());
            process::exit(1);
        }
    };

    if engine.maps().get(WatermarkVariant::Small).is_none()
        && engine.maps().get(WatermarkVariant::Large).is_none()
    {
        error!("No opacity maps found in {}", cli.alpha_dir.display());
        process::exit(1);
    }

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        error!("Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    if let Some(variant) = opts.force_variant {
        warn!("Forcing the {variant} watermark for every image");
    }

    let results = if input_path.is_dir() {
        let Some(output_dir) = cli.output.as_ref().map(PathBuf::from) else {
            error!("Output directory is required for batch processing");
            eprintln!("Usage: gemini-unblend <input_dir> -o <output_dir>");
            process::exit(1);
        };
        engine.process_directory(input_path, &output_dir, &opts)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![engine.process_file(input_path, &output_path, &opts)]
    };

    let mut success_count = 0u32;
    let mut skip_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &opts);
        if r.skipped {
            skip_count += 1;
        } else if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if skip_count > 0 {
            eprint!(", Skipped: {skip_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }
    info!(success_count, skip_count, fail_count, "done");

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.skipped {
        if !opts.quiet {
            eprintln!("[SKIP] {filename}: {}", result.message);
        }
    } else if result.success {
        if !opts.quiet {
            match result.variant {
                Some(variant) => eprintln!("[OK] {filename} ({variant})"),
                None => eprintln!("[OK] {filename}"),
            }
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if opts.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
