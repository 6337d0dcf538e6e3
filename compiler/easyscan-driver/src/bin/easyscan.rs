use clap::Parser;
use easyscan_driver::pipeline::{execute_extraction_pipeline, Casing, PipelineOptions};
use std::path::PathBuf;

#[derive(clap::Parser)]
#[command(version, about, long_about = None)]
struct AppArgs {
    /// Go files or package directories to extract declarations from.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Extract every struct and list declaration, not only those marked `easyscan:explicit`.
    #[arg(long, default_value = "false")]
    all_types: bool,

    /// The default casing of column names in generated scanners.
    #[arg(long, value_enum, default_value_t = Casing::Lower)]
    casing: Casing,

    /// Allow generated scanners to match columns in any order instead of by position.
    #[arg(long, default_value = "false")]
    any_order: bool,
}

impl From<&AppArgs> for PipelineOptions {
    fn from(args: &AppArgs) -> Self {
        Self {
            all_types: args.all_types,
            casing: args.casing,
            strict_order: !args.any_order,
        }
    }
}

fn main() -> miette::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = AppArgs::parse();
    let options = PipelineOptions::from(&args);
    let document = execute_extraction_pipeline(options, &args.inputs)?;
    println!("{}", document);
    Ok(())
}
