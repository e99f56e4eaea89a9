use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use hookrule::{
    arguments_to_json_string, parse_arguments, parse_rule, scan, validate_patterns, RuleError,
};

/// Compile webhook trigger rules and argument lists.
#[derive(Parser)]
#[command(name = "hookrule")]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a trigger rule expression.
    Rule(RuleArgs),
    /// Compile a comma-separated argument list.
    Args(ArgsArgs),
    /// Print the token stream of an expression.
    Tokens {
        /// Expression source text.
        expr: String,
    },
}

#[derive(Args)]
struct RuleArgs {
    /// Expression source text.
    expr: String,
    /// Indent JSON output.
    #[arg(long)]
    pretty: bool,
    /// Print the rule in expression syntax instead of JSON.
    #[arg(long, conflicts_with = "pretty")]
    text: bool,
    /// Fail when a regex pattern does not compile.
    #[arg(long)]
    check_patterns: bool,
}

#[derive(Args)]
struct ArgsArgs {
    /// Argument list source text.
    expr: String,
    /// Indent JSON output.
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<String, RuleError> {
    match command {
        Commands::Rule(args) => {
            let rule = parse_rule(&args.expr)?;
            if args.check_patterns {
                validate_patterns(&rule)?;
            }
            if args.text {
                Ok(rule.to_string())
            } else {
                rule.to_json_string(args.pretty)
            }
        }
        Commands::Args(args) => {
            let arguments = parse_arguments(&args.expr)?;
            arguments_to_json_string(&arguments, args.pretty)
        }
        Commands::Tokens { expr } => {
            let (tokens, errors) = scan(&expr);
            if let Some(err) = errors.into_iter().next() {
                return Err(err.into());
            }
            let lines: Vec<String> = tokens
                .iter()
                .map(|t| format!("{:?}\t{:?}", t.kind, t.text))
                .collect();
            Ok(lines.join("\n"))
        }
    }
}
