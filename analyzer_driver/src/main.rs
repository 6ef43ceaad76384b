mod ast_printer;
mod stages;

use clap::Parser;

#[derive(Parser)]
struct Cli {
    #[arg(long, group = "stage")]
    lex: bool,

    #[arg(long, group = "stage")]
    dump_ast: bool,

    #[arg(long, group = "stage")]
    dump_symbols: bool,

    #[arg(long, group = "stage")]
    dump_tac: bool,

    file_path: std::path::PathBuf,
}

fn main() {
    let arg = Cli::parse();
    let file_path = arg.file_path.to_string_lossy();

    let result = if arg.lex {
        stages::lexer_stage(&file_path)
    } else if arg.dump_ast {
        stages::dump_ast_stage(&file_path)
    } else if arg.dump_symbols {
        stages::dump_symbols_stage(&file_path)
    } else if arg.dump_tac {
        stages::dump_tac_stage(&file_path)
    } else {
        stages::run_full_pipeline(&file_path)
    };

    if let Err(err) = result {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
