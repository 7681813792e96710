mod args;
mod driver_error;

use args::Args;
use clap::Parser;
use driver_error::DriverError;
use mjc::*;

use std::fs;
use tracing::{info, Level};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn read_ast(args: &Args) -> Result<ast::Ast, DriverError> {
    if !args.input.exists() {
        return Err(DriverError::InputFileDoesNotExist(args.input.clone()));
    }
    let source = fs::read_to_string(&args.input)?;
    let ast: ast::Ast = serde_json::from_str(&source)?;
    ast.validate()?;
    Ok(ast)
}

fn validate(ast: &ast::Ast, args: &Args) -> Result<semantic_analysis::Analysis, DriverError> {
    let analysis = semantic_analysis::analyze(ast)?;
    if args.dump_scopes {
        print!("{}", analysis.scopes);
    }
    Ok(analysis)
}

fn emit(classes: &[codegen::JasminClass], args: &Args) -> Result<(), DriverError> {
    if args.stdout {
        for class in classes {
            println!("; {}", emission::class_file_name(class));
            print!("{class}");
        }
        return Ok(());
    }
    fs::create_dir_all(&args.output_dir)?;
    let written = emission::write_class_files(&args.output_dir, classes)?;
    info!(files = written.len(), dir = %args.output_dir.display(), "done");
    Ok(())
}

pub fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let ast = read_ast(&args)?;
    let analysis = validate(&ast, &args)?;
    if args.validate {
        return Ok(());
    }

    let classes = codegen::codegen(&ast, &analysis).map_err(DriverError::from)?;
    emit(&classes, &args)?;

    Ok(())
}
