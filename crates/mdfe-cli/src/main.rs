//! `mdfe` command-line tool
//!
//! Offline helpers around the manifest pipeline: INI generation, template
//! validation, response inspection and engine configuration rendering.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset, Local};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use mdfe_core::{ManifestAggregate, ManifestFieldValidator};
use mdfe_engine::response::{
    parse_distribution, parse_event, parse_query, parse_service_status, parse_submit,
};
use mdfe_engine::EngineConfig;
use mdfe_generator::{EventContext, EventIniGenerator, EventRequest, ManifestGenerator};
use mdfe_template::{ComparisonResult, MdfeIniValidator, TemplateProvider};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const RESPONSE_KINDS: [&str; 5] = ["submit", "query", "event", "status", "distribution"];

fn cli() -> Command {
    Command::new("mdfe")
        .version(env!("CARGO_PKG_VERSION"))
        .about("MDFe manifest tooling")
        .subcommand_required(true)
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON (filter with MDFE_LOG or RUST_LOG)"),
        )
        .subcommand(
            Command::new("generate")
                .about("Render a manifest JSON file as document INI")
                .arg(
                    Arg::new("manifest")
                        .long("manifest")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Manifest aggregate as JSON"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Seed for the cMDF filler"),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("event")
                .about("Render an event INI")
                .arg(Arg::new("code").long("code").required(true).help("Six-digit tpEvento"))
                .arg(Arg::new("uf").long("uf").required(true).help("Emitter UF"))
                .arg(Arg::new("cnpj").long("cnpj").required(true).help("Emitter CNPJ or CPF"))
                .arg(Arg::new("key").long("key").required(true).help("44-digit access key"))
                .arg(Arg::new("protocol").long("protocol").help("Authorization protocol"))
                .arg(Arg::new("at").long("at").help("Event timestamp, RFC 3339 (default: now)"))
                .arg(
                    Arg::new("sequence")
                        .long("sequence")
                        .default_value("1")
                        .value_parser(value_parser!(u32))
                        .help("nSeqEvento"),
                )
                .arg(
                    Arg::new("field")
                        .long("field")
                        .action(ArgAction::Append)
                        .help("Event field as name=value (repeatable)"),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("validate")
                .about("Compare a document INI with the template")
                .arg(
                    Arg::new("ini")
                        .long("ini")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Document INI file"),
                )
                .arg(
                    Arg::new("template")
                        .long("template")
                        .value_parser(value_parser!(PathBuf))
                        .help("Template file (default: embedded)"),
                ),
        )
        .subcommand(
            Command::new("parse-response")
                .about("Parse an engine response as JSON")
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .required(true)
                        .value_parser(RESPONSE_KINDS),
                )
                .arg(
                    Arg::new("file")
                        .long("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Render ACBrLib.ini from a TOML configuration")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("provision")
                        .long("provision")
                        .action(ArgAction::SetTrue)
                        .help("Create the output tree and write the file under base_path"),
                ),
        )
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .value_parser(value_parser!(PathBuf))
        .help("Write to file instead of stdout")
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env("MDFE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn emit(text: &str, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
        }
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

fn split_field(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => bail!("field '{raw}' is not name=value"),
    }
}

fn generate(args: &ArgMatches) -> Result<i32> {
    let path = args.get_one::<PathBuf>("manifest").context("missing --manifest")?;
    let manifest: ManifestAggregate = serde_json::from_str(&read(path)?)
        .with_context(|| format!("decoding manifest {}", path.display()))?;

    for error in ManifestFieldValidator::new().validate(&manifest) {
        tracing::warn!(%error, "manifest field check failed");
    }

    let generator = match args.get_one::<u64>("seed") {
        Some(seed) => ManifestGenerator::with_seed(*seed),
        None => ManifestGenerator::new(),
    };
    let ini = generator.generate(&manifest)?;
    emit(&ini, args.get_one::<PathBuf>("output"))?;
    Ok(0)
}

fn event(args: &ArgMatches) -> Result<i32> {
    let arg = |name: &str| args.get_one::<String>(name).cloned().unwrap_or_default();
    let context = EventContext {
        uf: arg("uf"),
        cnpj_cpf: arg("cnpj"),
        access_key: arg("key"),
        protocol: args.get_one::<String>("protocol").cloned(),
    };
    let occurred_at: DateTime<FixedOffset> = match args.get_one::<String>("at") {
        Some(text) => DateTime::parse_from_rfc3339(text).with_context(|| format!("--at '{text}'"))?,
        None => Local::now().fixed_offset(),
    };
    let sequence = args.get_one::<u32>("sequence").copied().unwrap_or(1);

    let mut request = EventRequest::new(arg("code"), context, occurred_at).with_sequence(sequence);
    for raw in args.get_many::<String>("field").into_iter().flatten() {
        let (name, value) = split_field(raw)?;
        request = request.with_field(name, value);
    }

    let ini = EventIniGenerator::new().generate(&request)?;
    emit(&ini, args.get_one::<PathBuf>("output"))?;
    Ok(0)
}

fn print_defects(result: &ComparisonResult) {
    for section in result.missing_sections() {
        println!("missing section  [{section}]");
    }
    for section in result.extra_sections() {
        println!("extra section    [{section}]");
    }
    let groups = [
        ("missing key", result.missing_keys()),
        ("extra key", result.extra_keys()),
        ("empty value", result.empty_values()),
        ("placeholder", result.placeholder_values()),
    ];
    for (label, defects) in groups {
        for (section, keys) in defects.iter() {
            println!("{label:<16} [{section}] {}", keys.join(", "));
        }
    }
}

fn validate(args: &ArgMatches) -> Result<i32> {
    let ini_path = args.get_one::<PathBuf>("ini").context("missing --ini")?;
    let validator = match args.get_one::<PathBuf>("template") {
        Some(path) => MdfeIniValidator::new(TemplateProvider::from_source(read(path)?)?),
        None => MdfeIniValidator::embedded()?,
    };

    let result = validator.compare_with_template(&read(ini_path)?)?;
    if result.is_match() {
        println!("ok: matches template");
        return Ok(0);
    }
    print_defects(&result);
    println!("{} defect(s)", result.defect_count());
    Ok(1)
}

fn parse_response(args: &ArgMatches) -> Result<i32> {
    let kind = args.get_one::<String>("kind").context("missing --kind")?;
    let path = args.get_one::<PathBuf>("file").context("missing --file")?;
    let raw = read(path)?;

    let json = match kind.as_str() {
        "submit" => serde_json::to_string_pretty(&parse_submit(&raw))?,
        "query" => serde_json::to_string_pretty(&parse_query(&raw))?,
        "event" => serde_json::to_string_pretty(&parse_event(&raw))?,
        "status" => serde_json::to_string_pretty(&parse_service_status(&raw))?,
        "distribution" => serde_json::to_string_pretty(&parse_distribution(&raw))?,
        other => bail!("unknown response kind '{other}'"),
    };
    println!("{json}");
    Ok(0)
}

fn config(args: &ArgMatches) -> Result<i32> {
    let path = args.get_one::<PathBuf>("config").context("missing --config")?;
    let config = EngineConfig::from_file(path)?;

    if args.get_flag("provision") {
        let written = config.provision()?;
        println!("{}", written.display());
    } else {
        print!("{}", config.to_ini()?.to_ini_string());
    }
    Ok(0)
}

fn run(matches: &ArgMatches) -> Result<i32> {
    match matches.subcommand() {
        Some(("generate", args)) => generate(args),
        Some(("event", args)) => event(args),
        Some(("validate", args)) => validate(args),
        Some(("parse-response", args)) => parse_response(args),
        Some(("config", args)) => config(args),
        _ => bail!("no subcommand given"),
    }
}

fn main() {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json"));

    match run(&matches) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    }
}
