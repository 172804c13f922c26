use std::path::{Path, PathBuf};

use anyhow::Result;
use rustyline::{error::ReadlineError, Editor};
use structopt::StructOpt;

use nrdl::{execute, parse_program, validate, DataLoader, DataSet};

#[derive(Debug, StructOpt)]
#[structopt(name = "nrdl", about = "A non-recursive datalog query engine over CSV facts.")]
struct Opt {
    /// Query file to execute; starts a REPL when omitted.
    query: Option<PathBuf>,

    /// Directory containing one <relation>.csv file per fact.
    #[structopt(short, long, default_value = ".")]
    data: PathBuf,
}

fn run(code: &str, data: &Path) -> Result<(String, DataSet)> {
    let program = parse_program(code)?;
    validate(&program)?;

    let name = program
        .rules
        .last()
        .map(|rule| rule.name().to_owned())
        .unwrap_or_default();

    let mut loader = DataLoader::new(data);
    let result = execute(&program, &mut loader)?;
    Ok((name, result))
}

fn print_result(name: &str, result: &DataSet) {
    println!("Results \"{}\"", name);
    print!("{}", result);
}

fn repl(data: &Path) -> Result<()> {
    let mut editor = Editor::<()>::new();
    // Each line is one complete rule; the accumulated program re-runs
    // after every entry and a rejected line is dropped again.
    let mut buffer: Vec<String> = Vec::new();

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                editor.add_history_entry(line.as_str());
                buffer.push(line);

                match run(&buffer.join("\n"), data) {
                    Ok((name, result)) => print_result(&name, &result),
                    Err(e) => {
                        println!("Error: {}", e);
                        buffer.pop();
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {}", err);
                break;
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    match &opt.query {
        Some(path) => {
            let code = std::fs::read_to_string(path)?;
            let (name, result) = run(&code, &opt.data)?;
            print_result(&name, &result);
            Ok(())
        }
        None => repl(&opt.data),
    }
}
