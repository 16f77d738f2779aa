use crate::app::command_catalog::FUNCTIONS;
use crate::app::command_dispatch::execute_function;
use crate::artifacts::ArtifactStore;
use crate::config::{load_settings, Settings};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Functions,
    Call,
    Config,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "functions" => CliVerb::Functions,
        "call" => CliVerb::Call,
        "config" => CliVerb::Config,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Usage: workflow-files <command>".to_string(),
        String::new(),
        "Commands:".to_string(),
        "  functions                            List callable functions".to_string(),
        "  call <function-id> [json-args]       Call a function and print the JSON response"
            .to_string(),
        "  config                               Print the effective settings".to_string(),
        "  help                                 Show this help".to_string(),
    ]
}

pub fn function_help_lines() -> Vec<String> {
    let mut defs: Vec<_> = FUNCTIONS.iter().collect();
    defs.sort_by(|a, b| a.function_id.cmp(b.function_id));
    defs.into_iter()
        .map(|def| {
            let mode = if def.read_only { "read" } else { "write" };
            format!("  {0:24} {1:6} {2}", def.function_id, mode, def.description)
        })
        .collect()
}

fn function_arg_lines() -> Vec<String> {
    let mut lines = Vec::new();
    for def in FUNCTIONS {
        lines.push(format!("{} ({})", def.function_id, def.description));
        for arg in def.args {
            let required = if arg.required { "required" } else { "optional" };
            lines.push(format!(
                "  {0:28} {1:8} {2:9} {3}",
                arg.name, arg.arg_type, required, arg.description
            ));
        }
    }
    lines
}

pub fn help_text() -> String {
    let mut lines = cli_help_lines();
    lines.push(String::new());
    lines.push("Functions:".to_string());
    lines.extend(function_help_lines());
    lines.join("\n")
}

/// Returns the text to print; `Err` output goes to stderr with a failing exit.
pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    if args.is_empty() {
        return Ok(help_text());
    }

    match parse_cli_verb(args[0].as_str()) {
        CliVerb::Help => Ok(help_text()),
        CliVerb::Functions => Ok(function_arg_lines().join("\n")),
        CliVerb::Config => {
            let settings = load_settings().map_err(|err| err.to_string())?;
            settings.to_yaml().map_err(|err| err.to_string())
        }
        CliVerb::Call => {
            let settings = load_settings().map_err(|err| err.to_string())?;
            cmd_call(settings, &args[1..])
        }
        CliVerb::Unknown => Err(format!("unknown command `{}`\n\n{}", args[0], help_text())),
    }
}

pub fn cmd_call(settings: Settings, args: &[String]) -> Result<String, String> {
    let Some(function_id) = args.first() else {
        return Err("usage: workflow-files call <function-id> [json-args]".to_string());
    };
    let call_args = match args.get(1) {
        Some(raw) => parse_call_args(raw)?,
        None => Map::new(),
    };
    if args.len() > 2 {
        return Err("usage: workflow-files call <function-id> [json-args]".to_string());
    }

    let store = ArtifactStore::new(settings);
    let response = execute_function(&store, function_id, &call_args);
    let rendered = serde_json::to_string_pretty(&response)
        .map_err(|err| format!("failed to encode response: {err}"))?;
    if response.success {
        Ok(rendered)
    } else {
        Err(rendered)
    }
}

fn parse_call_args(raw: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("function arguments must be a JSON object".to_string()),
        Err(err) => Err(format!("invalid JSON arguments: {err}")),
    }
}
