use series_parity::parity::{
    ComputationResult, ParityContext, ParityHarness, ParityMode, ToleranceConfig,
};
use series_parity::structure::HierarchyNode;
use std::fs;
use std::path::{Path, PathBuf};

const USAGE: &str = "usage: parity_trace_tool verify --legacy <path> --canonical <path> [--mode strict|diagnostic] [--drift [--epsilon <f64>]] [--output <path>]\n       parity_trace_tool fingerprint --input <path>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandKind {
    Verify,
    Fingerprint,
}

#[derive(Debug)]
struct CliArgs {
    command: CommandKind,
    legacy: Option<PathBuf>,
    canonical: Option<PathBuf>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    mode: ParityMode,
    epsilon: Option<f64>,
    drift: bool,
}

fn main() {
    let _ = series_parity::telemetry::init_tracing_with_default_filter("warn");
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when verification ran but parity failed.
fn run() -> Result<bool, String> {
    let args = parse_args()?;
    match args.command {
        CommandKind::Verify => verify(&args),
        CommandKind::Fingerprint => {
            let input = args
                .input
                .as_deref()
                .ok_or_else(|| "missing --input".to_owned())?;
            let node = HierarchyNode::from_json_str(&read(input)?).map_err(|err| err.to_string())?;
            println!("{}", node.reference_value());
            Ok(true)
        }
    }
}

fn verify(args: &CliArgs) -> Result<bool, String> {
    let legacy_path = args
        .legacy
        .as_deref()
        .ok_or_else(|| "missing --legacy".to_owned())?;
    let canonical_path = args
        .canonical
        .as_deref()
        .ok_or_else(|| "missing --canonical".to_owned())?;

    let legacy = load_result(legacy_path)?;
    let canonical = load_result(canonical_path)?;

    let tolerance = tolerance_from_flags(args.drift, args.epsilon)?;
    let context = ParityContext::new(legacy.request.clone())
        .with_mode(args.mode)
        .with_tolerance(tolerance);
    let verdict = ParityHarness::new().compare(&context, &legacy, &canonical);
    let json = verdict
        .to_json_contract_v1_pretty()
        .map_err(|err| err.to_string())?;

    match &args.output {
        Some(path) => fs::write(path, format!("{json}\n"))
            .map_err(|err| format!("failed to write `{}`: {err}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(verdict.passed)
}

/// An epsilon only applies when drift is allowed, so it is rejected on its own.
fn tolerance_from_flags(drift: bool, epsilon: Option<f64>) -> Result<ToleranceConfig, String> {
    match (drift, epsilon) {
        (true, Some(epsilon)) => ToleranceConfig::with_drift(epsilon),
        (true, None) => ToleranceConfig::with_drift(series_parity::parity::DEFAULT_VALUE_EPSILON),
        (false, Some(_)) => {
            return Err(format!("--epsilon requires --drift; exact comparison ignores it\n{USAGE}"));
        }
        (false, None) => Ok(ToleranceConfig::exact()),
    }
    .map_err(|err| err.to_string())
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|err| format!("failed to read `{}`: {err}", path.display()))
}

fn load_result(path: &Path) -> Result<ComputationResult, String> {
    serde_json::from_str(&read(path)?)
        .map_err(|err| format!("invalid result json in `{}`: {err}", path.display()))
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    args.next()
        .ok_or_else(|| format!("missing value for {flag}"))
}

fn parse_args() -> Result<CliArgs, String> {
    let mut args = std::env::args().skip(1);
    let command = match args.next().as_deref() {
        Some("verify") => CommandKind::Verify,
        Some("fingerprint") => CommandKind::Fingerprint,
        _ => return Err(USAGE.to_owned()),
    };

    let mut parsed = CliArgs {
        command,
        legacy: None,
        canonical: None,
        input: None,
        output: None,
        mode: ParityMode::Strict,
        epsilon: None,
        drift: false,
    };

    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--legacy" => parsed.legacy = Some(PathBuf::from(next_value(&mut args, &flag)?)),
            "--canonical" => {
                parsed.canonical = Some(PathBuf::from(next_value(&mut args, &flag)?));
            }
            "--input" => parsed.input = Some(PathBuf::from(next_value(&mut args, &flag)?)),
            "--output" => parsed.output = Some(PathBuf::from(next_value(&mut args, &flag)?)),
            "--mode" => {
                parsed.mode = match next_value(&mut args, &flag)?.as_str() {
                    "strict" => ParityMode::Strict,
                    "diagnostic" => ParityMode::Diagnostic,
                    other => return Err(format!("unknown mode `{other}`")),
                };
            }
            "--epsilon" => {
                let raw = next_value(&mut args, &flag)?;
                parsed.epsilon = Some(
                    raw.parse::<f64>()
                        .map_err(|err| format!("invalid --epsilon `{raw}`: {err}"))?,
                );
            }
            "--drift" => parsed.drift = true,
            "--help" | "-h" => return Err(USAGE.to_owned()),
            other => return Err(format!("unknown flag `{other}`\n{USAGE}")),
        }
    }

    Ok(parsed)
}
