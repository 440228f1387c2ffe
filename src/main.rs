// Rusty AKP Reader: dumps Akai programs as JSON
//
// Walks every given .akp file (or every .akp file inside a given directory),
// decodes the program stored in its RIFF tree and prints all programs as one
// JSON array. A file that fails to decode is reported and skipped.
//
// Run it with:
//   cargo run -- ./programs/
//   cargo run -- --output programs.json brass.akp strings.akp
//   RUST_LOG=debug cargo run -- brass.akp     (shows every chunk visited)

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};

use rusty_akp_reader::{Program, Result, decode_file};

#[derive(Debug, Default)]
struct Options {
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    all_files: bool,
    compact: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_help();
            return Ok(());
        }
        Err(message) => {
            eprintln!("❌ {message}. Use --help for usage information.");
            process::exit(1);
        }
    };

    let files = collect_files(&options);
    if files.is_empty() {
        eprintln!("⚠️  No input files found.");
        return Ok(());
    }

    let programs = run_batch(&files);

    let json = if options.compact {
        serde_json::to_string(&programs)
    } else {
        serde_json::to_string_pretty(&programs)
    }
    .map_err(io::Error::from)?;

    match &options.output {
        Some(path) => {
            fs::write(path, json)?;
            eprintln!("-> Saved {} programs to {:?}", programs.len(), path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}

/// Returns `Ok(None)` when help was requested or nothing was given.
fn parse_args(args: &[String]) -> std::result::Result<Option<Options>, String> {
    let mut options = Options::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(None),
            "--all-files" => options.all_files = true,
            "--compact" => options.compact = true,
            "--output" | "-o" => {
                let path = iter.next().ok_or("Missing file path after --output")?;
                options.output = Some(PathBuf::from(path));
            }
            flag if flag.starts_with('-') => return Err(format!("Unknown option '{flag}'")),
            input => options.inputs.push(PathBuf::from(input)),
        }
    }

    if options.inputs.is_empty() {
        return Ok(None);
    }
    Ok(Some(options))
}

fn print_help() {
    println!("🎵 Rusty AKP Reader - Akai program decoder");
    println!();
    println!("USAGE:");
    println!("    rusty-akp-reader [OPTIONS] <INPUT>...");
    println!();
    println!("INPUT is an .akp file or a directory holding .akp files.");
    println!();
    println!("OPTIONS:");
    println!("    --output, -o <FILE>  Write the JSON to FILE instead of stdout");
    println!("    --all-files          Decode every file in a directory, not only *.akp");
    println!("    --compact            Emit single-line JSON");
    println!("    --help, -h           Show this help message");
    println!();
    println!("Set RUST_LOG=info or RUST_LOG=debug to trace the RIFF walk.");
}

fn is_program_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("akp"))
}

fn list_dir(dir: &Path, all_files: bool) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && (all_files || is_program_file(&path)) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// Expands directories into their files. A directory that cannot be listed
/// is reported and left out.
fn collect_files(options: &Options) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for input in &options.inputs {
        if input.is_dir() {
            match list_dir(input, options.all_files) {
                Ok(found) => {
                    info!("{} input files in {:?}", found.len(), input);
                    files.extend(found);
                }
                Err(err) => {
                    error!("cannot list {:?}: {err}", input);
                    eprintln!("❌ {}: {err}", input.display());
                }
            }
        } else {
            // Missing files surface as per-file errors during the batch.
            files.push(input.clone());
        }
    }

    files
}

fn run_batch(files: &[PathBuf]) -> Vec<Program> {
    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("🔄 [{bar:40.cyan/blue}] {pos:>3}/{len:3} files {msg}")
            .expect("static progress template")
            .progress_chars("█▉▊▋▌▍▎▏  "),
    );

    let mut programs = Vec::new();
    let mut failures = Vec::new();

    for path in files {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        progress.set_message(format!("Decoding {file_name}"));

        match decode_file(path) {
            Ok(decoded) => {
                for recovered in &decoded.report.recovered {
                    progress.println(format!("⚠️  {file_name}: {recovered}"));
                }
                progress.println(format!(
                    "✅ {} ({} keygroups)",
                    file_name,
                    decoded.program.keygroups.len()
                ));
                programs.push(decoded.program);
            }
            Err(err) => {
                error!("{err}");
                let cause = std::error::Error::source(&err)
                    .map(|source| source.to_string())
                    .unwrap_or_else(|| err.to_string());
                progress.println(format!("❌ {file_name}: {cause}"));
                failures.push(file_name);
            }
        }
        progress.inc(1);
    }

    progress.finish_with_message("done");

    eprintln!();
    eprintln!("📊 SUMMARY:");
    eprintln!("   ✅ Decoded: {}", programs.len());
    eprintln!("   ❌ Failed:  {}", failures.len());
    eprintln!("   📁 Total:   {}", files.len());

    programs
}
