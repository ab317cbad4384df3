mod args;
mod display;
mod input;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use fieldwright_core::{
    ClassificationOutcome, ClassificationResult, FieldSet, SchemaClassifier, SchemaDescriptor,
    classify,
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{Level, info};

use args::{Cli, Command};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.max_level());
    info!("fieldwright v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Types => {
            display::print_types();
            Ok(ExitCode::SUCCESS)
        }
        Command::Classify { schema } => {
            print_json(&classify_file(&schema)?)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Format { fields, input } => {
            let set = load_field_set(&fields)?;
            let values = input::load_input(&input)?;
            let report = set.format_input(&values);
            info!(
                formatted = report.formatted_count,
                skipped = report.skipped_count,
                unknown = report.unknown.len(),
                "formatted input"
            );
            print_json(&report)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { fields, input } => {
            let set = load_field_set(&fields)?;
            let values = input::load_input(&input)?;
            let report = set.validate_input(&values);
            info!(valid = report.valid, errors = report.errors.len(), "validated input");
            print_json(&report)?;
            Ok(if report.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn init_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn load_field_set(path: &Path) -> anyhow::Result<FieldSet> {
    let descriptors = input::load_descriptors(path)?;
    let classifier = SchemaClassifier::new();
    Ok(FieldSet::from_descriptors(&classifier, &descriptors))
}

/// A descriptor array classifies field by field; anything else is one schema.
fn classify_file(path: &Path) -> anyhow::Result<Value> {
    let value = input::read_json(path)?;
    if value.is_array() || value.get("fields").is_some() {
        let descriptors = input::descriptors_from_value(value)
            .with_context(|| format!("reading fields from {}", path.display()))?;
        let set = FieldSet::from_descriptors(&SchemaClassifier::new(), &descriptors);
        let rows: Vec<Value> = set
            .iter()
            .map(|field| {
                let mut row = json!({
                    "id": field.key(),
                    "name": field.name(),
                    "required": field.required(),
                });
                let classification = classification_json(field.classification(), field.outcome());
                merge(&mut row, classification);
                row
            })
            .collect();
        return Ok(Value::Array(rows));
    }

    let schema = SchemaDescriptor::from(value);
    Ok(match classify(&schema) {
        Ok(result) => classification_json(result, &ClassificationOutcome::Classified),
        Err(e) => json!({ "outcome": "unsupported", "error": e.to_string() }),
    })
}

fn classification_json(
    result: ClassificationResult,
    outcome: &ClassificationOutcome,
) -> Value {
    let mut out = json!({ "field_type": result.field_type() });
    if let Some(item) = result.array_item_type() {
        out["array_item_type"] = json!(item);
    }
    match outcome {
        ClassificationOutcome::Classified => out["outcome"] = json!("classified"),
        ClassificationOutcome::Defaulted => out["outcome"] = json!("defaulted"),
        ClassificationOutcome::Fallback(reason) => {
            out["outcome"] = json!("fallback");
            out["reason"] = json!(reason.to_string());
        }
    }
    out
}

fn merge(target: &mut Value, extra: Value) {
    if let (Value::Object(target), Value::Object(extra)) = (target, extra) {
        target.extend(extra);
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
