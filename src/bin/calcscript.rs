//! `calcscript`: a small demonstration binary for the `calcscript`
//! library (`SPEC_FULL.md` §11.3). Not part of the embeddable core —
//! a host of it, exactly like the reference implementation's own
//! command-line test driver.

use std::io::{self, BufRead, Write};

use calcscript::{Parser as CalcParser, ParserError};

#[cfg(feature = "repl")]
use calcscript::cli::{should_show_banner, split_commands, Cli, ExecutionMode};
#[cfg(feature = "repl")]
use clap::Parser as ClapParser;
#[cfg(feature = "repl")]
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    ExecutableCommand,
};

const BANNER: &str = "calcscript — type an expression, or `quit` to exit";

fn main() -> io::Result<()> {
    #[cfg(feature = "repl")]
    {
        let cli = Cli::parse();
        let mut parser = CalcParser::new();
        parser.set_domain_checks(!cli.no_domain_checks);

        match cli.execution_mode() {
            ExecutionMode::Execute => {
                let commands = cli.execute.clone().unwrap();
                run_execute_mode(&mut parser, &commands, cli.no_color)
            }
            ExecutionMode::Script => {
                let path = cli.script.clone().unwrap();
                run_script_mode(&mut parser, &path, cli.no_color)
            }
            ExecutionMode::Interactive => {
                if should_show_banner(ExecutionMode::Interactive, cli.quiet) {
                    println!("{BANNER}");
                }
                run_interactive(&mut parser, cli.no_color)
            }
        }
    }

    #[cfg(not(feature = "repl"))]
    {
        let mut parser = CalcParser::new();
        println!("{BANNER}");
        run_interactive(&mut parser, false)
    }
}

#[cfg(feature = "repl")]
fn run_execute_mode(parser: &mut CalcParser, commands: &str, no_color: bool) -> io::Result<()> {
    for expr in split_commands(commands) {
        match evaluate(parser, expr) {
            Ok(results) => print_results(expr, &results, no_color)?,
            Err(e) => print_error(expr, &e, no_color)?,
        }
    }
    Ok(())
}

#[cfg(feature = "repl")]
fn run_script_mode(parser: &mut CalcParser, path: &str, no_color: bool) -> io::Result<()> {
    let contents = std::fs::read_to_string(path)?;
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match evaluate(parser, line) {
            Ok(results) => print_results(line, &results, no_color)?,
            Err(e) => print_error(line, &e, no_color)?,
        }
    }
    Ok(())
}

#[allow(unused_variables)]
fn run_interactive(parser: &mut CalcParser, no_color: bool) -> io::Result<()> {
    let ans = calcscript::var_cell(0.0);
    let _ = parser.define_var("ans", ans.clone());

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        match evaluate(parser, line) {
            Ok(results) => {
                if let Some(last) = results.last() {
                    ans.set(*last);
                }
                #[cfg(feature = "repl")]
                print_results(line, &results, no_color)?;
                #[cfg(not(feature = "repl"))]
                for r in &results {
                    println!("{r}");
                }
            }
            Err(e) => {
                #[cfg(feature = "repl")]
                print_error(line, &e, no_color)?;
                #[cfg(not(feature = "repl"))]
                eprintln!("error: {e}");
            }
        }
    }
    Ok(())
}

fn evaluate(parser: &mut CalcParser, expr: &str) -> Result<Vec<f64>, ParserError> {
    parser.set_expr(expr)?;
    parser.eval_multi()
}

#[cfg(feature = "repl")]
fn print_results(expr: &str, results: &[f64], no_color: bool) -> io::Result<()> {
    let text = results
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if no_color {
        println!("{text}");
        return Ok(());
    }
    let _ = expr;
    let mut out = io::stdout();
    out.execute(SetForegroundColor(Color::Green))?;
    out.execute(Print(format!("{text}\n")))?;
    out.execute(ResetColor)?;
    Ok(())
}

#[cfg(feature = "repl")]
fn print_error(expr: &str, err: &ParserError, no_color: bool) -> io::Result<()> {
    let text = format!("{expr}: {err}");
    if no_color {
        eprintln!("{text}");
        return Ok(());
    }
    let mut out = io::stderr();
    out.execute(SetForegroundColor(Color::Red))?;
    out.execute(Print(format!("{text}\n")))?;
    out.execute(ResetColor)?;
    Ok(())
}
