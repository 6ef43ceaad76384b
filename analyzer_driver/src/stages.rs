use std::{error::Error, fs};

use colored::Colorize;
use parse_tree::{ParseErr, Parser};
use semantic_analysis::analyze;
use shared_context::source_map::SourceMap;

use crate::ast_printer;

/// lex the program then exit without starting the other stages
pub fn lexer_stage(file_path: &str) -> Result<(), Box<dyn Error>> {
    let source = fs::read_to_string(file_path)?;
    let mut lexer = lexer::Lexer::new(&source);

    loop {
        match lexer.next() {
            Some(Ok(tok)) => println!(
                "matched string: {:?}, token type: {:?}",
                tok.lexeme, tok.token_type
            ),
            Some(Err(message)) => {
                println!("{}", format!("lex error: {}", message).red());
                break;
            }
            None => break,
        }
    }

    Ok(())
}

/// parse the program and pretty-print its `ParseNode` tree
pub fn dump_ast_stage(file_path: &str) -> Result<(), Box<dyn Error>> {
    let source = fs::read_to_string(file_path)?;
    let source_map = SourceMap::new(file_path, &source);
    let mut parser = Parser::new(&source);
    match parser.parse_program() {
        Ok(program) => ast_printer::print(&program),
        Err(err) => println!("{}", render_parse_err(&source_map, &err).red()),
    }

    Ok(())
}

/// parse then analyze the program, printing only the final symbol table
pub fn dump_symbols_stage(file_path: &str) -> Result<(), Box<dyn Error>> {
    let source = fs::read_to_string(file_path)?;
    let source_map = SourceMap::new(file_path, &source);
    let mut parser = Parser::new(&source);
    let program = match parser.parse_program() {
        Ok(program) => program,
        Err(err) => {
            println!("{}", render_parse_err(&source_map, &err).red());
            return Ok(());
        }
    };

    let output = analyze(&program);
    print_symbol_table(&output);

    Ok(())
}

/// parse then analyze the program, printing only the TAC listing
pub fn dump_tac_stage(file_path: &str) -> Result<(), Box<dyn Error>> {
    let source = fs::read_to_string(file_path)?;
    let source_map = SourceMap::new(file_path, &source);
    let mut parser = Parser::new(&source);
    let program = match parser.parse_program() {
        Ok(program) => program,
        Err(err) => {
            println!("{}", render_parse_err(&source_map, &err).red());
            return Ok(());
        }
    };

    let output = analyze(&program);
    for line in &output.intermediate_code {
        println!("{}", line);
    }

    Ok(())
}

/// the default pipeline: syntax errors, semantic errors, symbol table,
/// then the TAC listing, matching the driver's external return shape
pub fn run_full_pipeline(file_path: &str) -> Result<(), Box<dyn Error>> {
    let source = fs::read_to_string(file_path)?;
    let source_map = SourceMap::new(file_path, &source);
    let mut parser = Parser::new(&source);

    let program = match parser.parse_program() {
        Ok(program) => program,
        Err(err) => {
            println!("{}", render_parse_err(&source_map, &err).red());
            return Ok(());
        }
    };

    let output = analyze(&program);

    if output.diagnostics.is_empty() {
        println!("{}", "no semantic errors".green());
    } else {
        for diagnostic in &output.diagnostics {
            let span = source_map.span_for_line(diagnostic.line);
            print!("{}", source_map.format_message(diagnostic.message.clone(), span).red());
        }
    }

    println!("{}", "symbol table:".bold());
    print_symbol_table(&output);

    println!("{}", "intermediate code:".bold());
    for line in &output.intermediate_code {
        println!("{}", line);
    }

    Ok(())
}

/// Renders a syntax error through the `SourceMap`'s `file --> line:col`
/// caret diagram rather than the bare `"Error at line N: ..."` string.
fn render_parse_err(source_map: &SourceMap, err: &ParseErr) -> String {
    let span = source_map.span_for_line(err.line());
    source_map.format_message(err.message().to_string(), span)
}

fn print_symbol_table(output: &semantic_analysis::AnalysisOutput) {
    for symbol in &output.symbol_table {
        let qualifier = if symbol.is_const { "const" } else { "var" };
        println!("  {} {}: {}", qualifier, symbol.name, symbol.ty);
    }
}
