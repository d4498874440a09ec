use clap::{Parser, ValueEnum};
use stackcalc::logging::{init_logger, CompilerLogLevel};
use stackcalc::{compiler_error, Engine, Session};
use std::io::{self, BufRead, Write};

#[derive(Parser)]
#[command(author, version, about = "Line-oriented calculator backed by a stack machine", long_about = None)]
struct Cli {
    /// Evaluation strategy
    #[arg(long, value_enum, default_value_t = EngineArg::Vm)]
    engine: EngineArg,
    /// Print the instruction listing of each statement before running it
    #[arg(long)]
    dump: bool,
    /// Most verbose level to log
    #[arg(long, value_enum, default_value_t = LogLevelArg::Warn)]
    log_level: LogLevelArg,
    /// Only log targets starting with this prefix (repeatable)
    #[arg(long = "log-module")]
    log_modules: Vec<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum EngineArg {
    Vm,
    Tree,
}

impl From<EngineArg> for Engine {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Vm => Engine::StackMachine,
            EngineArg::Tree => Engine::TreeWalk,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    Lexer,
    Parser,
    Codegen,
    Vm,
}

impl From<LogLevelArg> for CompilerLogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => CompilerLogLevel::Error,
            LogLevelArg::Warn => CompilerLogLevel::Warn,
            LogLevelArg::Info => CompilerLogLevel::Info,
            LogLevelArg::Debug => CompilerLogLevel::Debug,
            LogLevelArg::Trace => CompilerLogLevel::Trace,
            LogLevelArg::Lexer => CompilerLogLevel::Lexer,
            LogLevelArg::Parser => CompilerLogLevel::Parser,
            LogLevelArg::Codegen => CompilerLogLevel::CodeGen,
            LogLevelArg::Vm => CompilerLogLevel::Vm,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let modules = (!cli.log_modules.is_empty()).then(|| cli.log_modules.clone());
    if let Err(e) = init_logger(cli.log_level.into(), modules) {
        eprintln!("Error: failed to install logger: {}", e);
    }

    if let Err(e) = repl(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn repl(cli: &Cli) -> io::Result<()> {
    let mut session = Session::new(cli.engine.into());
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;

        if cli.dump && session.engine() == Engine::StackMachine {
            if let Ok(Some(bytecode)) = session.compile(&line) {
                write!(stdout, "{}", bytecode)?;
            }
        }

        match session.execute(&line) {
            Ok(Some(value)) => writeln!(stdout, "{}", value)?,
            Ok(None) => {}
            Err(e) => {
                compiler_error!("{:?}", e);
                eprintln!("Error: {}", e);
            }
        }
        stdout.flush()?;
    }
    Ok(())
}
