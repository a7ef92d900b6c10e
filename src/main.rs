use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use tracing::{debug, info};

use gotmpl::{
    errors::errors::{Error, ErrorTip},
    get_line_at_position,
    lexer::lexer::{tokenize, LexOptions},
    parse, FuncMap, Mode,
};

#[derive(Parser)]
#[command(name = "gotmpl", about = "Parse a text template and print its trees", version)]
struct Cli {
    /// Template file to parse
    file: PathBuf,

    /// Template name (defaults to the file name)
    #[arg(short, long)]
    name: Option<String>,

    /// Left action delimiter
    #[arg(long, default_value = "")]
    left_delim: String,

    /// Right action delimiter
    #[arg(long, default_value = "")]
    right_delim: String,

    /// Comma separated names of the functions templates may call
    #[arg(short, long, value_delimiter = ',')]
    funcs: Vec<String>,

    /// Accept calls to functions not listed with --funcs
    #[arg(long)]
    skip_func_check: bool,

    /// Keep comments in the parsed trees
    #[arg(long)]
    parse_comments: bool,

    /// Print text nodes as quoted strings
    #[arg(short, long)]
    quote_text: bool,

    /// Print the token stream instead of the trees
    #[arg(long)]
    tokens: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let source = match read_to_string(&cli.file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error: failed to read {}: {}", cli.file.display(), err);
            return ExitCode::FAILURE;
        }
    };
    let name = cli.name.clone().unwrap_or_else(|| {
        cli.file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let mode = Mode {
        parse_comments: cli.parse_comments,
        skip_func_check: cli.skip_func_check,
    };

    let result = if cli.tokens {
        print_tokens(&cli, &name, &source, mode)
    } else {
        print_trees(&cli, &name, &source, mode)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            display_error(&err, &cli.file, &source);
            ExitCode::FAILURE
        }
    }
}

fn print_tokens(cli: &Cli, name: &str, source: &str, mode: Mode) -> Result<(), Error> {
    let options = LexOptions {
        emit_comment: mode.parse_comments,
        break_ok: !cli.funcs.iter().any(|f| f == "break"),
        continue_ok: !cli.funcs.iter().any(|f| f == "continue"),
    };
    let tokens = tokenize(name, source, &cli.left_delim, &cli.right_delim, options)?;
    debug!(count = tokens.len(), "tokenized");

    for token in tokens {
        println!("{}:{} {:?} {}", token.line, token.pos, token.kind, token);
    }
    Ok(())
}

fn print_trees(cli: &Cli, name: &str, source: &str, mode: Mode) -> Result<(), Error> {
    let funcs = [FuncMap::from_names(cli.funcs.iter().cloned())];
    let tree_set = parse(name, source, &cli.left_delim, &cli.right_delim, &funcs, mode)?;
    info!(trees = tree_set.len(), "parsed {}", name);

    let mut names: Vec<&String> = tree_set.keys().collect();
    names.sort();
    for tree_name in names {
        println!("{}: {}", tree_name, tree_set[tree_name].render(cli.quote_text));
    }
    Ok(())
}

fn display_error(error: &Error, file: &Path, source: &str) {
    /*
        Error: UndefinedFunction (add `x` to the function table)
        template: page.tmpl:3: function "x" not defined
        -> page.tmpl
           |
         3 | {{x}}
           | --^
    */

    if let ErrorTip::None = error.get_tip() {
        eprintln!("Error: {}", error.get_error_name());
    } else {
        eprintln!("Error: {} ({})", error.get_error_name(), error.get_tip());
    }
    eprintln!("{}", error);
    eprintln!("-> {}", file.display());

    let Some((line, line_text, line_pos)) = get_line_at_position(source, error.get_position().0) else {
        return;
    };

    let line_str = line.to_string();
    let padding = line_str.len() + 2;
    eprintln!("{:>padding$}", "|");

    let trimmed = line_text.trim_start_matches(' ');
    let removed_whitespace = line_text.len() - trimmed.len();
    eprintln!("{} | {}", line_str, trimmed.trim_end());

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;
    eprintln!("{:>padding$} {:->arrows$}", "|", "^");
}
