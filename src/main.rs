use anyhow::Result;
use clap::Parser;
use ext_icon_gen::icon_gen;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[clap(
    name = "ext-icon-gen",
    about = "Generate the browser extension toolbar icons (16/48/128 px PNG)"
)]
struct Args {
    /// Output directory for the generated PNG files.
    #[clap(short, long, value_name = "DIR", default_value = ".")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    icon_gen::generate_icons(&args.output)
}
