//! Command dispatch.
//!
//! `run` loads configuration and logging, then hands over to `execute`,
//! which does the actual work against any [`RasterEngine`].

pub mod args;
pub mod operation;
pub mod report;

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::batch;
use crate::config::{self, Config, ConfigLocation, Overrides};
use crate::engine::{NativeEngine, RasterEngine};
use crate::error::AppError;
use crate::external;
use crate::logging::{self, RunContext};

pub use args::{BatchOp, Cli, Command, ConfigAction};
pub use operation::Operation;

fn write_failed(e: std::io::Error) -> AppError {
    AppError::config("cannot write output").with_source(e)
}

fn print_output(out: &mut dyn Write, path: PathBuf) -> Result<(), AppError> {
    writeln!(out, "output: {}", path.display()).map_err(write_failed)
}

/// Entry point used by the binary.
pub fn run(cli: Cli, out: &mut dyn Write) -> Result<(), AppError> {
    let ctx = RunContext::new(cli.verbose, cli.quiet);
    let location = ConfigLocation::resolve(cli.config.as_deref());

    match &cli.command {
        Command::Version => {
            return writeln!(out, "image-cli {}", env!("CARGO_PKG_VERSION")).map_err(write_failed)
        }
        Command::Config {
            action: ConfigAction::Init { overwrite },
        } => {
            config::write_default(&location.path, *overwrite)?;
            return writeln!(out, "config written: {}", location.path.display())
                .map_err(write_failed);
        }
        _ => {}
    }

    let overrides = Overrides {
        conflict: cli.conflict,
        recursive: cli.recursive_override(),
    };
    let config = Config::load(&location, &overrides)?;
    logging::init_subscriber(&config.logging, ctx)?;
    debug!(config = %location.path.display(), "configuration loaded");

    execute(&cli, &config, &NativeEngine::new(), ctx, out)
}

/// Run a parsed command with an already loaded configuration.
pub fn execute(
    cli: &Cli,
    config: &Config,
    engine: &dyn RasterEngine,
    ctx: RunContext,
    out: &mut dyn Write,
) -> Result<(), AppError> {
    match &cli.command {
        Command::Convert(args) => {
            let operation = Operation::convert(&args.flags, config)?;
            print_output(out, operation.apply(engine, &args.input, &args.output)?)
        }
        Command::Compress(args) => {
            let operation = Operation::compress(&args.flags, config)?;
            let output = args.output.as_deref().unwrap_or(&config.base.output_dir);
            print_output(out, operation.apply(engine, &args.input, output)?)
        }
        Command::Resize(args) => {
            let operation = Operation::resize(&args.flags, config)?;
            print_output(out, operation.apply(engine, &args.input, &args.output)?)
        }
        Command::Rotate(args) => {
            let operation = Operation::rotate(&args.flags, config)?;
            print_output(out, operation.apply(engine, &args.input, &args.output)?)
        }
        Command::Watermark(args) => {
            let operation = Operation::watermark(&args.flags, config)?;
            print_output(out, operation.apply(engine, &args.input, &args.output)?)
        }
        Command::Batch { op } => run_batch(op, config, engine, ctx, out),
        Command::Formats(args) => {
            let table = report::format_table(
                engine,
                external::has_convert_tool(),
                args.from.as_deref(),
                args.to.as_deref(),
            );
            report::print_formats(out, &table, args.json)
        }
        Command::Info(args) => {
            let info = report::image_info(engine, &args.input)?;
            report::print_info(out, &info, args.json)
        }
        Command::Config {
            action: ConfigAction::Show,
        } => write!(out, "{}", config.to_yaml()?).map_err(write_failed),
        Command::Config {
            action: ConfigAction::Init { overwrite },
        } => {
            let location = ConfigLocation::resolve(cli.config.as_deref());
            config::write_default(&location.path, *overwrite)?;
            writeln!(out, "config written: {}", location.path.display()).map_err(write_failed)
        }
        Command::Version => {
            writeln!(out, "image-cli {}", env!("CARGO_PKG_VERSION")).map_err(write_failed)
        }
    }
}

fn run_batch(
    op: &BatchOp,
    config: &Config,
    engine: &dyn RasterEngine,
    ctx: RunContext,
    out: &mut dyn Write,
) -> Result<(), AppError> {
    let (target, operation) = match op {
        BatchOp::Convert { target, flags } => (target, Operation::convert(flags, config)?),
        BatchOp::Compress { target, flags } => (target, Operation::compress(flags, config)?),
        BatchOp::Resize { target, flags } => (target, Operation::resize(flags, config)?),
        BatchOp::Rotate { target, flags } => (target, Operation::rotate(flags, config)?),
        BatchOp::Watermark { target, flags } => (target, Operation::watermark(flags, config)?),
    };

    let collected = batch::collect(&target.pattern, config.base.recursive)?;
    let out_dir = target
        .output
        .clone()
        .unwrap_or_else(|| config.base.output_dir.clone());
    debug!(
        operation = operation.name(),
        files = collected.files.len(),
        output = %out_dir,
        "starting batch"
    );

    let report = batch::run(&collected, Path::new(&out_dir), ctx, out, |input, dir| {
        operation.apply(engine, input, dir)
    })?;
    report.into_result().map(|_| ())
}
