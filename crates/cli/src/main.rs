use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use formwalk_definition::from_definition;
use formwalk_journey::{walk, FormModel, FormState, REFERENCE_NUMBER_KEY};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Form journey engine toolchain.
#[derive(Parser)]
#[command(name = "formwalk", version, about = "Form journey engine toolchain")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk a form definition against a state snapshot
    Walk {
        /// Path to the form definition JSON file
        definition: PathBuf,
        /// Path to the state snapshot JSON file
        #[arg(long)]
        state: PathBuf,
        /// Page path to walk toward (defaults to the last page)
        #[arg(long)]
        page: Option<String>,
        /// Optional submission payload JSON file for the target page
        #[arg(long)]
        payload: Option<PathBuf>,
    },

    /// Compile a form definition and report structural defects
    Check {
        /// Path to the form definition JSON file
        definition: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Walk {
            definition,
            state,
            page,
            payload,
        } => {
            cmd_walk(
                &definition,
                &state,
                page.as_deref(),
                payload.as_deref(),
                cli.output,
                cli.quiet,
            );
        }
        Commands::Check { definition } => {
            cmd_check(&definition, cli.output, cli.quiet);
        }
    }
}

fn cmd_walk(
    definition_path: &Path,
    state_path: &Path,
    page: Option<&str>,
    payload_path: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let model = load_model(definition_path, output, quiet);
    let state = load_state(state_path, output, quiet);
    let payload = payload_path.map(|p| load_state(p, output, quiet));

    let target = match page {
        Some(path) => path.to_string(),
        None => match model.pages.last() {
            Some(last) => last.path.clone(),
            None => unreachable!("compiled models have at least one page"),
        },
    };

    let context = match walk(&model, &target, &state, payload.as_ref()) {
        Ok(context) => context,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };

    match output {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "form": model.name,
                "referenceNumber": context.reference_number,
                "paths": context.paths,
                "relevantState": context.relevant_state,
                "errors": context.errors,
            });
            let pretty = serde_json::to_string_pretty(&report)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            if !quiet {
                println!("form: {}", model.name);
                println!("reference: {}", context.reference_number);
                println!("pages:");
                for path in &context.paths {
                    println!("  {}", path);
                }
            }
            if context.errors.is_empty() {
                if !quiet {
                    println!("no validation errors");
                }
            } else {
                for err in &context.errors {
                    println!("error [{}]: {}", err.path, err.text);
                }
            }
        }
    }

    if !context.errors.is_empty() {
        process::exit(2);
    }
}

fn cmd_check(definition_path: &Path, output: OutputFormat, quiet: bool) {
    let model = load_model(definition_path, output, quiet);

    match output {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "form": model.name,
                "pages": model.pages.len(),
                "conditions": model.registry.len(),
                "startPage": model.start_path,
            });
            let pretty = serde_json::to_string_pretty(&report)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            if !quiet {
                println!(
                    "ok: '{}' ({} pages, {} conditions, start {})",
                    model.name,
                    model.pages.len(),
                    model.registry.len(),
                    model.start_path
                );
            }
        }
    }
}

/// Read, parse, and compile a definition file, exiting on any failure.
fn load_model(path: &Path, output: OutputFormat, quiet: bool) -> FormModel {
    let src = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            report_error(
                &format!("error reading file '{}': {}", path.display(), e),
                output,
                quiet,
            );
            process::exit(1);
        }
    };

    let doc: serde_json::Value = match serde_json::from_str(&src) {
        Ok(v) => v,
        Err(e) => {
            report_error(
                &format!("error parsing JSON in '{}': {}", path.display(), e),
                output,
                quiet,
            );
            process::exit(1);
        }
    };

    let def = match from_definition(&doc) {
        Ok(def) => def,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };

    match FormModel::new(&def) {
        Ok(model) => model,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    }
}

/// Read a state or payload JSON object file, exiting on any failure.
fn load_state(path: &Path, output: OutputFormat, quiet: bool) -> FormState {
    let src = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            report_error(
                &format!("error reading file '{}': {}", path.display(), e),
                output,
                quiet,
            );
            process::exit(1);
        }
    };

    let doc: serde_json::Value = match serde_json::from_str(&src) {
        Ok(v) => v,
        Err(e) => {
            report_error(
                &format!("error parsing JSON in '{}': {}", path.display(), e),
                output,
                quiet,
            );
            process::exit(1);
        }
    };

    match doc {
        serde_json::Value::Object(map) => map.into_iter().collect(),
        _ => {
            report_error(
                &format!(
                    "'{}' must contain a JSON object keyed by field name (with '{}')",
                    path.display(),
                    REFERENCE_NUMBER_KEY
                ),
                output,
                quiet,
            );
            process::exit(1);
        }
    }
}

fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("error: {}", msg);
            }
        }
    }
}
