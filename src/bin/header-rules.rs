use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use response_header_manager::config::load_rules;
use response_header_manager::processing::ProcessorRegistry;
use response_header_manager::rules::{match_rule, resolve_headers, QueryParams, RuleSet};

#[derive(Parser)]
#[command(name = "header-rules")]
#[command(about = "Inspect response header rule files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a rules file and list its mappings
    Check {
        file: PathBuf,
    },
    /// Show which headers a request URI would receive
    Match {
        file: PathBuf,
        /// Request URI including an optional query string, e.g. /api/x?debug=true
        uri: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let file = match &cli.command {
        Commands::Check { file } | Commands::Match { file, .. } => file,
    };
    let rules = match load_rules(file, &ProcessorRegistry::new()) {
        Ok(rules) => rules,
        Err(e) => {
            eprintln!("{}: {e}", file.display());
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Check { .. } => print_summary(&rules),
        Commands::Match { uri, json, .. } => print_match(&rules, &uri, json),
    }
    ExitCode::SUCCESS
}

fn print_summary(rules: &RuleSet) {
    println!("{} mapping(s), later entries take precedence", rules.len());
    for (i, rule) in rules.iter().enumerate() {
        println!(
            "  #{:<3} {}  default: {}, conditional: {}, processor: {}",
            i + 1,
            rule.pattern(),
            rule.default_headers().map_or(0, <[_]>::len),
            rule.conditional_headers().len(),
            rule.processor_name(),
        );
    }
}

fn print_match(rules: &RuleSet, uri: &str, as_json: bool) {
    let (path, query) = match uri.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (uri, None),
    };
    let params = QueryParams::parse(query);

    let rule = match_rule(rules, path);
    let resolved = rule.and_then(|rule| resolve_headers(rule, &params));

    if as_json {
        let headers: Vec<_> = resolved
            .iter()
            .flat_map(|r| r.headers.iter())
            .map(|h| json!({ "name": h.name().as_str(), "value": String::from_utf8_lossy(h.value().as_bytes()) }))
            .collect();
        let output = json!({
            "path": path,
            "rule": rule.map(|r| r.pattern()),
            "selection": resolved.map(|r| r.selection.as_str()),
            "headers": headers,
        });
        println!("{output:#}");
        return;
    }

    match (rule, resolved) {
        (None, _) => println!("no rule matches {path}"),
        (Some(rule), None) => println!("rule `{}` matches but no header list applies", rule.pattern()),
        (Some(rule), Some(resolved)) => {
            println!("rule `{}` ({} headers)", rule.pattern(), resolved.selection.as_str());
            for header in resolved.headers {
                println!("  {header}");
            }
        }
    }
}
