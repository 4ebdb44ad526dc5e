use std::{
    io::BufRead,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use liblc3::Word;

use constants::DEFAULT_TABLE_SIZE;
use image::Image;
use operation::OperationList;
use pass_one::{FirstPass, PassOne};
use pass_two::pass_two;
use symbols::SymbolTable;
use tokenizer::Tokenizer;

pub mod constants;
pub mod directive;
pub mod error;
pub mod image;
pub mod listing;
pub mod operand;
pub mod operation;
pub mod pass_one;
pub mod pass_two;
pub mod symbols;
pub mod tokenizer;

#[derive(Debug, Clone)]
pub struct Options {
    /// Symbol table bucket count.
    pub table_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            table_size: DEFAULT_TABLE_SIZE,
        }
    }
}

/// Everything both passes produced, kept for reporting.
pub struct Assembly {
    pub symbols: SymbolTable,
    pub operations: OperationList,
    pub image: Image,
}

pub fn assemble<R: BufRead>(tokenizer: Tokenizer<R>, options: &Options) -> Result<Assembly> {
    let PassOne {
        mut operations,
        symbols,
        ..
    } = FirstPass::parse_lines(tokenizer, options.table_size).context("pass one")?;

    pass_two(&mut operations, &symbols).context("pass two")?;

    let image = Image::from_operations(&operations).context("emitting image")?;

    Ok(Assembly {
        symbols,
        operations,
        image,
    })
}

/// Assemble an LC-3 program from text into its header and content words.
///
/// # Errors
///
/// If there's an error in the assembly code
pub fn assemble_program(program_text: &str) -> Result<Vec<Word>> {
    let assembly = assemble(Tokenizer::from_text(program_text), &Options::default())?;
    Ok(assembly.image.to_words())
}

pub fn assemble_file(input: &Path, output: &Path, options: &Options) -> Result<Assembly> {
    let tokenizer = Tokenizer::open(input)?;
    let assembly = assemble(tokenizer, options)?;
    assembly
        .image
        .write_file(output)
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(assembly)
}

/// Default output path: the input with its extension swapped for `.lc3`.
pub fn bin_file_name(input: &Path) -> PathBuf {
    input.with_extension("lc3")
}

/// Where to write the image, refusing any path that is the source itself.
pub fn output_path(input: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| bin_file_name(input));
    ensure!(
        output != input,
        "output {} would overwrite the source",
        output.display()
    );
    Ok(output)
}
