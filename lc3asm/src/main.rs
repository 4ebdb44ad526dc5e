use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use lc3asm::{
    assemble_file,
    constants::DEFAULT_TABLE_SIZE,
    listing::{Listing, Summary},
    output_path, Options,
};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Two-pass assembler for the LC-3", long_about = None)]
struct Args {
    /// Assembly source
    input: PathBuf,

    /// Output binary, defaults to the input with a .lc3 extension
    #[arg(short, long, value_name = "OUTFILE")]
    output: Option<PathBuf>,

    /// Print the symbol table, a listing and a summary
    #[arg(short, long)]
    verbose: bool,

    /// Symbol table bucket count
    #[arg(long, default_value_t = DEFAULT_TABLE_SIZE)]
    table_size: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let output = output_path(&args.input, args.output.as_deref())?;

    let options = Options {
        table_size: args.table_size,
    };
    let assembly = assemble_file(&args.input, &output, &options)?;

    if args.verbose {
        println!("{}", assembly.symbols);
        println!("{}", Listing::new(&assembly.operations));
        print!(
            "{}",
            Summary {
                output: &output,
                image: &assembly.image,
            }
        );
    }

    Ok(())
}
