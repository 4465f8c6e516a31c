use anyhow::{Context, Result, bail};
use clap::Parser;
use dicom_deidentification::config::{ConfigError, Procedure};
use dicom_deidentification::config::uid_root::UidRoot;
use dicom_deidentification::upload::{DeidentifierPlugin, FileRegistry, UploadFile};
use dicom_deidentification::{Deidentifier, Session};
use env_logger::Builder;
use log::{Level, LevelFilter, info};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

const DICOM_MEDIA_TYPE: &str = "application/dicom";

/// De-identify DICOM files
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input file or directory
    #[arg(short, long, value_name = "INPUT_PATH")]
    input: PathBuf,

    /// Output directory
    #[arg(short, long, value_name = "OUTPUT_DIR")]
    output: PathBuf,

    /// De-identification procedure (JSON); without it, every element is kept
    #[arg(short, long, value_name = "PROCEDURE_FILE")]
    procedure: Option<PathBuf>,

    /// UID root for pseudonymized UIDs (default: '2.25')
    #[arg(short, long)]
    uid_root: Option<String>,

    /// Recursively look for files in input directory
    #[arg(short, long)]
    recursive: bool,

    /// Show more verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn load_procedure(path: Option<&Path>) -> Result<Procedure> {
    let Some(path) = path else {
        return Ok(Procedure::default());
    };

    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Procedure::from_reader(file).with_context(|| format!("failed to load {}", path.display()))
}

/// Collects the input files, each named by its path relative to the input directory.
fn collect_files(input_path: &Path, recurse: bool) -> Result<FileRegistry> {
    let mut registry = FileRegistry::new();

    if input_path.is_file() {
        let name = input_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| input_path.display().to_string());
        let data = fs::read(input_path)
            .with_context(|| format!("failed to read {}", input_path.display()))?;
        registry.add(UploadFile::new(
            input_path.display().to_string().as_str(),
            &name,
            DICOM_MEDIA_TYPE,
            data,
        ));
        return Ok(registry);
    }

    if !input_path.is_dir() {
        bail!("Input should either be a file or a directory");
    }

    let mut walk_dir = WalkDir::new(input_path).sort_by_file_name();
    if !recurse {
        walk_dir = walk_dir.max_depth(1);
    }

    for entry in walk_dir.into_iter().filter_map(Result::ok) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let name = path
            .strip_prefix(input_path)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned();
        let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        registry.add(UploadFile::new(
            path.display().to_string().as_str(),
            &name,
            DICOM_MEDIA_TYPE,
            data,
        ));
    }

    Ok(registry)
}

fn write_files(registry: &FileRegistry, output_path: &Path) -> Result<()> {
    for file in registry.iter() {
        let output_file_path = output_path.join(&file.name);

        // Create intermediate output file directories if they don't exist yet
        if let Some(parent_dir) = output_file_path.parent() {
            fs::create_dir_all(parent_dir)?;
        }

        File::create(&output_file_path)
            .and_then(|mut f| f.write_all(&file.data))
            .with_context(|| format!("failed to write {}", output_file_path.display()))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Error
    };

    let mut builder = Builder::from_default_env();
    builder
        .format(|buf, record| {
            let level = match record.level() {
                Level::Error => "Error",
                Level::Warn => "Warning",
                Level::Info => "Info",
                Level::Debug => "Debug",
                Level::Trace => "Trace",
            };
            writeln!(buf, "{}: {}", level, record.args())
        })
        .filter(None, log_level);
    builder.init();

    let procedure = load_procedure(args.procedure.as_deref())?;

    let session = match args.uid_root {
        Some(uid_root) => {
            let uid_root = uid_root.parse::<UidRoot>().map_err(ConfigError::from)?;
            Session::with_uid_root(uid_root)
        }
        None => Session::new(),
    };

    if args.output.exists() && !args.output.is_dir() {
        bail!("output path should be a directory");
    }

    let mut registry = collect_files(&args.input, args.recursive)?;
    let ids = registry.ids();
    info!("de-identifying {} file(s)", ids.len());

    let plugin = DeidentifierPlugin::new(Arc::new(Deidentifier::new(procedure)), Arc::new(session));
    let settled = plugin.prepare_upload(&mut registry, &ids);

    write_files(&registry, &args.output)?;

    let rejected = settled.iter().filter(|s| !s.is_fulfilled()).count();
    info!(
        "{} file(s) de-identified, {} rejected",
        settled.len() - rejected,
        rejected
    );
    if rejected > 0 {
        bail!("{} of {} file(s) could not be de-identified", rejected, settled.len());
    }

    Ok(())
}
