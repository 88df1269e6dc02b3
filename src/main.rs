//! renamer: keep Python imports in step with module moves.
//!
//! `renamer analyze` compares a project's imports on two git branches and
//! writes the moved names to a mapping file; `renamer rename` applies such a
//! file to any number of projects.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use log::{Level, LevelFilter, info};
use std::path::PathBuf;

use cli::{Args, Commands};
use module_renamer::analyzer::{self, DiscoverOptions, Discovery};
use module_renamer::confirm::{ConfirmConflicts, Policy, Prompt};
use module_renamer::report::{self, BatchReport};
use module_renamer::rewriter::{self, RewriteOptions};
use module_renamer::snapshot::GitRepo;
use module_renamer::{mapping, scanner};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    match args.command {
        Commands::Analyze {
            project_path,
            compare_with,
            branch,
            output_file,
            yes,
            no,
            json,
            exclude,
        } => {
            let confirm: Box<dyn ConfirmConflicts> = if yes {
                Box::new(Policy::Proceed)
            } else if no {
                Box::new(Policy::Abort)
            } else {
                Box::new(Prompt)
            };
            cmd_analyze(
                project_path,
                DiscoverOptions {
                    origin: compare_with,
                    working: branch,
                    excludes: scanner::compile_excludes(&exclude)?,
                },
                output_file,
                confirm.as_ref(),
                json,
            )
        }
        Commands::Rename {
            paths,
            jobs,
            exclude,
            json,
        } => cmd_rename(paths, jobs, &exclude, json),
        Commands::Scan { paths, exclude } => cmd_scan(paths, &exclude),
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            let prefix = match record.level() {
                Level::Error => "error:".red().bold(),
                Level::Warn => "warn:".yellow().bold(),
                Level::Info => "info:".blue().bold(),
                Level::Debug | Level::Trace => format!("{}:", record.target()).dimmed(),
            };
            out.finish(format_args!("{} {}", prefix, message))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .context("Failed to initialize logging")
}

fn cmd_analyze(
    project_path: PathBuf,
    options: DiscoverOptions,
    output_file: PathBuf,
    confirm: &dyn ConfirmConflicts,
    json_output: bool,
) -> Result<()> {
    let repo = GitRepo::open(&project_path)
        .with_context(|| format!("{} is not inside a git repository", project_path.display()))?;

    let discovery = analyzer::discover(&repo, &options, confirm)?;

    eprintln!(
        "{} Generating the file {}",
        "info:".blue().bold(),
        output_file.display()
    );
    mapping::write(&output_file, &discovery.mapping)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&discovery)?);
    } else {
        print_discovery(&discovery);
    }

    Ok(())
}

fn cmd_rename(
    paths: Vec<PathBuf>,
    jobs: usize,
    exclude: &[String],
    json_output: bool,
) -> Result<()> {
    let (mapping_file, roots) = paths
        .split_last()
        .context("Expected at least one project path and a mapping file")?;

    let mapping = mapping::read(mapping_file)?;
    info!(
        "loaded {} rename(s) from {}",
        mapping.len(),
        mapping_file.display()
    );

    let options = RewriteOptions {
        jobs,
        excludes: scanner::compile_excludes(exclude)?,
    };
    let report = report::aggregate(rewriter::rewrite_tree(roots, &mapping, &options)?);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    report.into_result()?;
    Ok(())
}

fn cmd_scan(paths: Vec<PathBuf>, exclude: &[String]) -> Result<()> {
    let scan_paths = if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths
    };
    let files = scanner::collect_python_files(&scan_paths, &scanner::compile_excludes(exclude)?)?;

    println!("Would scan {} files:", files.len());
    for file in files {
        println!("  {}", file.display());
    }

    Ok(())
}

fn print_discovery(discovery: &Discovery) {
    let d = &discovery.diagnostics;
    info!(
        "origin '{}': {} files, {} imports; working '{}': {} files, {} imports",
        discovery.origin,
        d.origin_files,
        d.origin_imports,
        discovery.working,
        d.working_files,
        d.working_imports
    );

    if !discovery.conflicts.is_empty() {
        println!(
            "{} {} candidate(s) dropped because of conflicts on:",
            "warn:".yellow().bold(),
            d.dropped
        );
        for conflict in &discovery.conflicts {
            println!("  {}", conflict.dimmed());
        }
    }

    if discovery.mapping.is_empty() {
        println!(
            "{} No moved imports between '{}' and '{}'",
            "ok:".green().bold(),
            discovery.origin,
            discovery.working
        );
        return;
    }

    println!(
        "\n{} {} moved import(s):\n",
        "Found".yellow().bold(),
        discovery.mapping.len()
    );
    for rename in &discovery.mapping {
        println!("  {}", rename.old.red());
        println!("    {} {}", "->".green(), rename.new.green());
    }
}

fn print_report(report: &BatchReport) {
    for path in &report.rewritten {
        println!("{} {}", "Updated:".yellow().bold(), path.display());
    }

    for failure in report.failures.iter() {
        println!(
            "{} {} {}",
            "Failed:".red().bold(),
            failure.path.display(),
            format!("({})", failure.cause).dimmed()
        );
    }

    let summary = format!(
        "{} file(s) scanned, {} rewritten, {} unchanged, {} failed",
        report.files_scanned,
        report.rewritten.len(),
        report.unchanged,
        report.failures.len()
    );
    if report.is_success() {
        println!("{} {}", "ok:".green().bold(), summary);
    } else {
        println!("{} {}", "error:".red().bold(), summary);
    }
}
