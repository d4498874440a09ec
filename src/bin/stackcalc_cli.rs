use clap::{Parser, Subcommand};
use stackcalc::frontend::{Lexer, Parser as StatementParser};
use stackcalc::{Engine, Session};
use std::fs;
use std::path::Path;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every line of the file as a statement
    Run {
        /// The script to run
        file: String,
        /// Evaluate parse trees directly instead of compiling them
        #[arg(long)]
        tree_walk: bool,
    },
    /// Write the instruction listing of every statement to <file>.ops
    Compile {
        /// The script to compile
        file: String,
    },
    /// Write the parsed program to <file>.ast
    Parse {
        /// The script to parse
        file: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Run { file, tree_walk } => run(file, *tree_walk),
        Commands::Compile { file } => compile(file),
        Commands::Parse { file } => parse_to_ast(file),
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn read_source(file: &str) -> Result<String, String> {
    if !Path::new(file).exists() {
        return Err(format!("File '{}' not found", file));
    }
    fs::read_to_string(file).map_err(|e| format!("Failed to read file: {}", e))
}

fn run(file: &str, tree_walk: bool) -> Result<(), String> {
    let source = read_source(file)?;
    let engine = if tree_walk { Engine::TreeWalk } else { Engine::StackMachine };
    let mut session = Session::new(engine);
    let mut failures = 0;

    for (index, line) in source.lines().enumerate() {
        match session.execute(line) {
            Ok(Some(value)) => println!("{}", value),
            Ok(None) => {}
            Err(e) => {
                eprintln!("{}:{}: {}", file, index + 1, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} statement(s) failed", failures));
    }
    Ok(())
}

fn compile(file: &str) -> Result<(), String> {
    let source = read_source(file)?;
    let mut session = Session::new(Engine::StackMachine);
    let mut listing = String::new();

    for (index, line) in source.lines().enumerate() {
        let bytecode = session
            .compile(line)
            .map_err(|e| format!("{}:{}: {}", file, index + 1, e))?;
        if let Some(bytecode) = bytecode {
            listing.push_str(&format!("; {}\n{}", line.trim(), bytecode));
        }
    }

    let ops_file = format!("{}.ops", file);
    fs::write(&ops_file, listing).map_err(|e| format!("Failed to write listing: {}", e))?;
    println!("Listing written to: {}", ops_file);
    Ok(())
}

fn parse_to_ast(file: &str) -> Result<(), String> {
    let source = read_source(file)?;
    let tokens = Lexer::new(&source).lex().map_err(|e| format!("Lexing failed: {}", e))?;
    let ast = StatementParser::new(tokens)
        .parse()
        .map_err(|e| format!("Parsing failed: {}", e))?;
    let ast_file = format!("{}.ast", file);
    fs::write(&ast_file, format!("{}", ast)).map_err(|e| format!("Failed to write AST: {}", e))?;
    println!("AST written to: {}", ast_file);
    Ok(())
}
