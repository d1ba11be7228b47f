mod config_file;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use logger::{Logger, StdioLogger};
use unused_exports::{
    find_unused_exports, fix_unused_exports, UnusedExportsConfig, UnusedExportsJSONConfig,
};

use crate::config_file::find_config_file;

/// Find unused exports in a TypeScript project.
///
/// Options given here override the ones found in `.ts-prunerc`,
/// `.ts-prunerc.json` or the "ts-prune" key of package.json.
#[derive(Parser, Debug)]
#[command(name = "ts-prune", version)]
struct CliArgs {
    /// Path to the tsconfig.json of the project [default: tsconfig.json]
    #[arg(short, long)]
    project: Option<String>,
    /// Regex of file paths to leave out of the output
    #[arg(short, long)]
    ignore: Option<String>,
    /// Regex of file paths whose imports do not count as uses
    #[arg(short, long)]
    skip: Option<String>,
    /// Exit with an error status when anything is reported
    #[arg(short, long)]
    error: bool,
    /// Leave out exports that are used inside their own module
    #[arg(short, long, alias = "unusedInModule")]
    unused_in_module: bool,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
    /// Remove the `export` of unused symbols
    #[arg(long)]
    fix: bool,
    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,
    /// Print the JSON schema of the config file and exit
    #[arg(long, hide = true)]
    config_schema: bool,
}

impl CliArgs {
    // flags left off the command line must not override the config file
    fn to_json_config(&self) -> UnusedExportsJSONConfig {
        let flag = |set: bool| set.then_some(true);
        UnusedExportsJSONConfig {
            project: self.project.clone(),
            ignore: self.ignore.clone(),
            skip: self.skip.clone(),
            unused_in_module: flag(self.unused_in_module),
            error: flag(self.error),
            json: flag(self.json),
            fix: flag(self.fix),
        }
    }
}

fn run(logger: impl Logger + Sync, args: CliArgs) -> Result<ExitCode> {
    if args.config_schema {
        let schema = schemars::schema_for!(UnusedExportsJSONConfig);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(ExitCode::SUCCESS);
    }

    let cwd = std::env::current_dir()
        .and_then(std::fs::canonicalize)
        .context("failed to get the working directory")?;

    let file_config = match find_config_file(&cwd)? {
        Some(found) => {
            logger.log(format!("using config from {}", found.path.display()));
            found.config
        }
        None => UnusedExportsJSONConfig::default(),
    };
    let json_config = UnusedExportsJSONConfig::default()
        .merge(file_config)
        .merge(args.to_json_config());
    let config = UnusedExportsConfig::try_from(json_config)?;

    let start_time = std::time::Instant::now();
    let report = find_unused_exports(&logger, &config, &cwd)?;
    logger.log(format!(
        "found {} unused exports ({}ms)",
        report.count(),
        start_time.elapsed().as_millis()
    ));

    if config.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report);
    }

    if config.fix {
        let summary = fix_unused_exports(&logger, &report)?;
        logger.log(format!(
            "removed {} exports from {} files",
            summary.exports_removed, summary.files_changed
        ));
    }

    if config.error && !report.is_empty() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let stdio_logger = StdioLogger::with_verbosity(args.verbose);
    let logger = &stdio_logger;

    match run(logger, args) {
        Ok(code) => code,
        Err(err) => {
            logger.error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
