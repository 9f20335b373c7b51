mod cli;

use anyhow::Context;
use indexmap::IndexMap;
use tagcheck::capability::ProviderDefaults;
use tagcheck::expression::{Expression, HclExpression};
use tagcheck::resolver::{ResolverOptions, VariableResolver};
use tagcheck::standard::TagStandard;
use tagcheck::validator::Validator;
use tagcheck::value::Value;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("TAGCHECK_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Resolve(resolve_cli) => resolve(resolve_cli),
        cli::Command::Validate(validate_cli) => validate(validate_cli),
        cli::Command::Init(init_cli) => init(init_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn resolve(cli: cli::ResolveCommand) -> anyhow::Result<()> {
    let resolver = load(&cli.input)?;

    let results = cli
        .references
        .iter()
        .map(|reference| (reference.clone(), resolver.resolve_reference(reference)))
        .collect::<IndexMap<_, _>>();

    output(&cli.output, &results)
}

pub fn validate(cli: cli::ValidateCommand) -> anyhow::Result<()> {
    let standard = TagStandard::load(&cli.standard)
        .with_context(|| format!("Unable to load tag standard {}", cli.standard.display()))?;
    let validator = Validator::new(standard).context("Invalid tag standard")?;

    let resolver = load(&cli.input)?;
    let validator = validator.with_resolver(&resolver);

    let (resources, diagnostics) = tagcheck::resources::extract(&resolver, &ProviderDefaults);
    for diagnostic in &diagnostics {
        eprintln!("{diagnostic}");
    }

    let results = validator.validate_batch(&resources);
    let report = tagcheck::report::create_report(results, cli.standard.display().to_string());

    output(&cli.output, &report)
}

pub fn init(cli: cli::InitCommand) -> anyhow::Result<()> {
    let yaml = TagStandard::example(cli.provider).to_yaml()?;

    match cli.output_file {
        Some(path) => {
            anyhow::ensure!(!path.exists(), "{} already exists", path.display());
            std::fs::write(&path, yaml)
                .with_context(|| format!("Unable to write {}", path.display()))?;
            tracing::info!(path=%path.display(), "written example tag standard");
        }
        None => print!("{yaml}"),
    }

    Ok(())
}

fn load(input: &cli::InputArgs) -> anyhow::Result<VariableResolver> {
    let mut options = ResolverOptions {
        values_files: input.var_files.clone(),
        ..Default::default()
    };
    for var in &input.vars {
        let (name, value) = parse_var(var)?;
        options.overrides.insert(name, value);
    }

    let mut resolver = VariableResolver::new(options);
    let diagnostics = resolver
        .load_from_directory(&input.dir)
        .with_context(|| format!("Unable to load {}", input.dir.display()))?;
    for diagnostic in &diagnostics {
        eprintln!("Skipped {diagnostic}");
    }

    anyhow::ensure!(resolver.documents().source_count() > 0, "No files loaded");

    Ok(resolver)
}

/// `NAME=VALUE`, the value as an hcl literal or a plain string
fn parse_var(var: &str) -> anyhow::Result<(String, Value)> {
    let (name, value) = var
        .split_once('=')
        .with_context(|| format!("Expected NAME=VALUE, got '{var}'"))?;
    anyhow::ensure!(!name.trim().is_empty(), "Variable name missing in '{var}'");

    let literal = HclExpression::parse(value)
        .ok()
        .and_then(|expression| expression.literal());

    Ok((
        name.trim().to_string(),
        literal.unwrap_or_else(|| Value::from(value)),
    ))
}

fn output(output: &cli::OutputArgs, value: &impl serde::Serialize) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), value)?,
    };

    Ok(())
}

/// developer utilities
///
/// A quick way to expose internal structures for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<()> {
    use cli::DevSubCommand::*;

    let resolver = load(&cli.input)?;

    match cli.command {
        Declarations => output(&cli.output, resolver.declarations()),
        Store => output(&cli.output, resolver.store()),
        Locals => output(&cli.output, resolver.resolved_locals()),
        Resources => {
            let (resources, _) = tagcheck::resources::extract(&resolver, &ProviderDefaults);
            output(&cli.output, &resources)
        }
    }
}
