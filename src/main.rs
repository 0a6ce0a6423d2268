use std::path::PathBuf;
use std::process::exit;

use clap::Parser;

use bcc::driver::{CompileOptions, Compiler, DriverError};

/// Command-line interface of the bC compiler.
#[derive(Parser, Debug)]
#[command(name = "bcc", version, about = "bC compiler targeting the TVM virtual machine")]
struct Cli {
    /// Input bC source file
    input: PathBuf,

    /// Output assembly file (default: input stem with .tm)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the abstract syntax tree after parsing
    #[arg(short = 'p')]
    print_ast: bool,

    /// Print the annotated syntax tree after semantic analysis
    #[arg(short = 'P')]
    print_annotated: bool,

    /// Annotate generated code with source line comments
    #[arg(short = 'l')]
    linenum_flag: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", err);
        exit(1);
    }
}

fn run() -> Result<(), DriverError> {
    let cli = Cli::parse();

    let source = std::fs::read_to_string(&cli.input)
        .map_err(|e| DriverError::Io(format!("cannot read '{}': {}", cli.input.display(), e)))?;

    let options = CompileOptions {
        print_ast: cli.print_ast,
        print_annotated: cli.print_annotated,
        linenum_flag: cli.linenum_flag,
    };
    let src_file = cli.input.display().to_string();
    let result = Compiler::new(options).compile(&source, &src_file);

    result.diagnostics.print_all();

    if let Some(assembly) = &result.assembly {
        let output = cli.output.unwrap_or_else(|| cli.input.with_extension("tm"));
        std::fs::write(&output, assembly)
            .map_err(|e| DriverError::Io(format!("cannot write '{}': {}", output.display(), e)))?;
    }

    println!("Number of warnings: {}", result.num_warnings());
    println!("Number of errors: {}", result.num_errors());

    if result.num_errors() > 0 {
        return Err(DriverError::CompilationFailed);
    }
    Ok(())
}
