// ============================================================================
// ParaFX CLI: headless batch processing via command-line arguments
// ============================================================================
//
// Usage examples:
//   parafx -i photo.png -t grayscale -t binary-threshold -o bw.png
//   parafx -i "shots/*.jpg" -t spectrum --output-dir spectra/ --format png
//   parafx -i photo.png -t smooth --sequential -v      (single-worker timing)
//   parafx -i photo.png -t negate -t gamma --undo 1 -o only_negated.png
//
// Each file gets its own edit session: transforms are applied in order, then
// `--undo` steps back through the history before the active image is saved.
// ============================================================================

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::LevelFilter;

use parafx::io::{SaveFormat, load_buffer, save_buffer_as};
use parafx::{EditSession, EngineConfig, Transform, Workers, logger};

/// ParaFX headless image processor.
#[derive(Parser, Debug)]
#[command(
    name = "parafx",
    about = "Row-parallel image transforms with undo/redo",
    long_about = "Apply pointwise maps, convolution filters and a frequency spectrum\n\
                  view to PNG, JPEG and BMP files using a configurable number of\n\
                  worker threads.\n\n\
                  Example:\n  \
                  parafx -i photo.png -t grayscale -t binary-threshold -o bw.png"
)]
pub struct CliArgs {
    /// Files or glob patterns such as "shots/*.jpg".
    #[arg(short, long, num_args = 1.., required_unless_present = "list")]
    pub input: Vec<String>,

    /// Transform to apply; repeat to chain (see --list).
    #[arg(short = 't', long = "op", value_name = "TRANSFORM")]
    pub ops: Vec<Transform>,

    /// Where to write the result when there is a single input.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Directory receiving one `<stem>.<ext>` per input.
    #[arg(long, value_name = "DIRECTORY")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, jpeg, bmp. Inferred from --output when omitted.
    #[arg(short, long, value_name = "EXT")]
    pub format: Option<String>,

    /// JPEG quality (1–100).
    #[arg(short, long, default_value_t = parafx::io::DEFAULT_JPEG_QUALITY, value_name = "1-100")]
    pub quality: u8,

    /// Worker threads per transform (1–16).
    #[arg(long, default_value_t = Workers::DEFAULT, value_name = "N")]
    pub threads: usize,

    /// Run every transform on a single worker (overrides --threads).
    #[arg(long)]
    pub sequential: bool,

    /// Seed for the noise transform.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Undo this many edits before saving.
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub undo: usize,

    /// Print per-transform timing and echo the log to stderr.
    #[arg(short, long)]
    pub verbose: bool,

    /// List available transforms and exit.
    #[arg(long)]
    pub list: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Process every input and report success only if all of them were written.
pub fn run(args: CliArgs) -> ExitCode {
    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    logger::init(level, args.verbose);

    if args.list {
        for t in Transform::ALL {
            println!("{:<18} {}", t.name(), t.label());
        }
        return ExitCode::SUCCESS;
    }

    let workers = if args.sequential {
        Workers::sequential()
    } else {
        match Workers::new(args.threads) {
            Ok(w) => w,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    };
    let mut config = EngineConfig::new(workers);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let inputs = resolve_inputs(&args.input);
    let batch = inputs.len() > 1;
    if inputs.is_empty() {
        eprintln!("error: nothing to process; no input matched.");
        return ExitCode::FAILURE;
    }
    if batch && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: --output names one file but {} inputs matched; use --output-dir instead.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let format = match parse_format(args.format.as_deref(), args.output.as_deref()) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("error: cannot create '{}': {}", dir.display(), e);
        return ExitCode::FAILURE;
    }
    // In batch mode every file goes into --output-dir.
    let explicit = if batch { None } else { args.output.as_deref() };
    let chatty = batch || args.verbose;

    let mut failed = 0usize;
    for (n, input) in inputs.iter().enumerate() {
        if chatty {
            println!("[{}/{}] {}", n + 1, inputs.len(), input.display());
        }
        let started = Instant::now();

        let result = build_output_path(input, explicit, args.output_dir.as_deref(), format)
            .ok_or_else(|| format!("no file name in '{}'", input.display()))
            .and_then(|output| {
                run_one(input, &output, &args, &config, format)
                    .map(|()| output)
                    .map_err(|e| e.to_string())
            });

        match result {
            Ok(output) if chatty => {
                println!("  → {} ({:.0}ms)", output.display(), started.elapsed().as_secs_f64() * 1000.0);
            }
            Ok(_) => {}
            Err(msg) => {
                log::error!("{}: {}", input.display(), msg);
                eprintln!("  error: {}", msg);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        log::warn!("{} of {} file(s) failed", failed, inputs.len());
    }

    if failed > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// One file: load, edit, optionally undo, save
// ============================================================================

fn run_one(
    input: &Path,
    output: &Path,
    args: &CliArgs,
    config: &EngineConfig,
    format: SaveFormat,
) -> parafx::Result<()> {
    let mut session = EditSession::new();
    session.load(load_buffer(input)?);

    for &op in &args.ops {
        if let Some(run) = session.apply_transform(op, config)?
            && args.verbose
        {
            println!("  {}", run);
        }
    }

    if args.undo > 0 {
        let taken = session.undo_to(args.undo);
        if taken < args.undo {
            log::warn!("only {} of {} undo step(s) available", taken, args.undo);
        }
        if args.verbose {
            println!("  undid {} step(s), now at '{}'", taken, session.active_label().unwrap_or("?"));
        }
    }

    if let Some(active) = session.active() {
        save_buffer_as(active, output, format, args.quality)?;
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Literal paths first, then glob matches; duplicates keep their first position.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut seen: Vec<PathBuf> = Vec::new();
    let mut push_unique = |p: PathBuf| {
        if !seen.contains(&p) {
            seen.push(p);
        }
    };

    for pattern in patterns {
        let literal = PathBuf::from(pattern);
        if literal.exists() {
            push_unique(literal);
            continue;
        }
        let matches: Vec<PathBuf> = match glob::glob(pattern) {
            Ok(paths) => paths.filter_map(|p| p.ok()).collect(),
            Err(e) => {
                log::warn!("skipping bad pattern '{}': {}", pattern, e);
                continue;
            }
        };
        if matches.is_empty() {
            log::warn!("'{}' did not match any file", pattern);
        }
        matches.into_iter().for_each(&mut push_unique);
    }

    seen
}

/// `--format` wins, then the `--output` extension, then PNG. Unknown names
/// and extensions are rejected.
fn parse_format(requested: Option<&str>, output: Option<&Path>) -> parafx::Result<SaveFormat> {
    match (requested, output) {
        (Some(name), _) => SaveFormat::from_name(name),
        (None, Some(path)) => SaveFormat::from_path(path),
        (None, None) => Ok(SaveFormat::Png),
    }
}

/// Where the result for `input` is written: the explicit `--output`, a file
/// named after the input inside `--output-dir`, or `<stem>_fx.<ext>` beside
/// the input.
fn build_output_path(
    input: &Path,
    explicit: Option<&Path>,
    into_dir: Option<&Path>,
    format: SaveFormat,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_owned());
    }
    let stem = input.file_stem()?.to_string_lossy();
    let ext = format.extension();
    Some(match into_dir {
        Some(dir) => dir.join(format!("{stem}.{ext}")),
        None => input
            .parent()
            .unwrap_or(Path::new("."))
            .join(format!("{stem}_fx.{ext}")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chained_ops() {
        let args = CliArgs::try_parse_from([
            "parafx", "-i", "a.png", "-t", "grayscale", "-t", "threshold", "--threads", "4",
        ])
        .unwrap();
        assert_eq!(args.ops, vec![Transform::Grayscale, Transform::BinaryThreshold]);
        assert_eq!(args.threads, 4);
        assert!(!args.sequential);
    }

    #[test]
    fn rejects_unknown_op() {
        assert!(CliArgs::try_parse_from(["parafx", "-i", "a.png", "-t", "sepia"]).is_err());
    }

    #[test]
    fn list_needs_no_input() {
        let args = CliArgs::try_parse_from(["parafx", "--list"]).unwrap();
        assert!(args.list);
        assert!(args.input.is_empty());
    }

    #[test]
    fn output_path_priority() {
        let input = Path::new("shots/cat.jpg");
        assert_eq!(
            build_output_path(input, Some(Path::new("x.bmp")), None, SaveFormat::Png),
            Some(PathBuf::from("x.bmp"))
        );
        assert_eq!(
            build_output_path(input, None, Some(Path::new("out")), SaveFormat::Png),
            Some(PathBuf::from("out/cat.png"))
        );
        assert_eq!(
            build_output_path(input, None, None, SaveFormat::Jpeg),
            Some(PathBuf::from("shots/cat_fx.jpg"))
        );
    }

    #[test]
    fn dotted_stem_keeps_its_dots() {
        let out = build_output_path(Path::new("a/cat.v2.png"), None, Some(Path::new("o")), SaveFormat::Bmp);
        assert_eq!(out, Some(PathBuf::from("o/cat.v2.bmp")));
    }

    #[test]
    fn inputs_are_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        std::fs::write(&a, b"").unwrap();
        let literal = a.to_string_lossy().into_owned();
        let pattern = dir.path().join("*.png").to_string_lossy().into_owned();

        let found = resolve_inputs(&[literal, pattern]);
        assert_eq!(found, vec![a]);
    }

    #[test]
    fn format_inference() {
        assert_eq!(parse_format(Some("JPEG"), None).unwrap(), SaveFormat::Jpeg);
        assert_eq!(parse_format(None, Some(Path::new("a.bmp"))).unwrap(), SaveFormat::Bmp);
        assert_eq!(parse_format(Some("png"), Some(Path::new("a.bmp"))).unwrap(), SaveFormat::Png);
        assert_eq!(parse_format(None, None).unwrap(), SaveFormat::Png);
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(matches!(
            parse_format(Some("tiff"), None),
            Err(parafx::EngineError::UnsupportedFormat(name)) if name == "tiff"
        ));
        assert!(parse_format(None, Some(Path::new("out.tif"))).is_err());
    }
}
