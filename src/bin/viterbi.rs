use std::env;
use std::process;

use hmm_viterbi::{DecoderBuilder, ModelDefinition, UnknownSymbolPolicy, ViterbiPath};
use serde::Serialize;

fn main() {
    let options = match Options::parse(env::args().skip(1)) {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("viterbi: {err}");
            Options::print_help();
            process::exit(2);
        }
    };

    if let Err(err) = run(&options) {
        eprintln!("viterbi: {err}");
        process::exit(1);
    }
}

fn run(options: &Options) -> hmm_viterbi::Result<()> {
    let model = ModelDefinition::from_path(&options.model_path)?.into_model()?;

    let result = if options.observations.is_empty() {
        None
    } else {
        let decoder = DecoderBuilder::new(&model)
            .unknown_symbols(options.policy)
            .build();
        Some(decoder.decode(&options.observations)?)
    };

    match options.format {
        OutputFormat::Text => {
            if options.describe {
                print!("{model}");
            }
            if let Some(best) = &result {
                println!("probability: {}", best.probability);
                println!("log2 probability: {}", best.log2_probability);
                println!("path: {}", best.path.join(" "));
            }
        }
        OutputFormat::Json => {
            let report = Report {
                model: options.describe.then(|| model.definition()),
                result: result.as_ref(),
            };
            println!("{}", report.to_json()?);
        }
    }
    Ok(())
}

/// Single JSON document written by `--format json`.
///
/// `model` is present with `--describe`, `result` when observations were
/// given. An impossible path has `"log2_probability": null`.
#[derive(Serialize)]
struct Report<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<ModelDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a ViterbiPath<String>>,
}

impl Report<'_> {
    fn to_json(&self) -> hmm_viterbi::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

struct Options {
    model_path: String,
    observations: Vec<String>,
    policy: UnknownSymbolPolicy,
    format: OutputFormat,
    describe: bool,
}

impl Options {
    fn parse<I, T>(mut args: I) -> Result<Self, String>
    where
        I: Iterator<Item = T>,
        T: Into<String>,
    {
        let mut model_path = None;
        let mut observations = Vec::new();
        let mut policy = UnknownSymbolPolicy::Strict;
        let mut format = OutputFormat::Text;
        let mut describe = false;

        while let Some(arg) = args.next() {
            let arg = arg.into();
            if arg == "--help" || arg == "-h" {
                Options::print_help();
                process::exit(0);
            } else if let Some(value) = arg.strip_prefix("--model=") {
                model_path = Some(value.to_string());
            } else if arg == "--model" {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value after --model".to_string())?;
                model_path = Some(value.into());
            } else if let Some(value) = arg.strip_prefix("--format=") {
                format = OutputFormat::from_str(value)?;
            } else if arg == "--format" {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value after --format".to_string())?
                    .into();
                format = OutputFormat::from_str(&value)?;
            } else if let Some(value) = arg.strip_prefix("--chars=") {
                observations.extend(value.chars().map(String::from));
            } else if arg == "--chars" {
                let value: String = args
                    .next()
                    .ok_or_else(|| "missing value after --chars".to_string())?
                    .into();
                observations.extend(value.chars().map(String::from));
            } else if arg == "--lenient" {
                policy = UnknownSymbolPolicy::Impossible;
            } else if arg == "--describe" {
                describe = true;
            } else if arg.starts_with("--") {
                return Err(format!("unrecognized argument '{arg}'"));
            } else {
                observations.push(arg);
            }
        }

        let model_path = model_path.ok_or_else(|| "--model is required".to_string())?;
        if observations.is_empty() && !describe {
            return Err("no observations given".to_string());
        }

        Ok(Self {
            model_path,
            observations,
            policy,
            format,
            describe,
        })
    }

    fn print_help() {
        println!(
            "\
Usage: viterbi --model <FILE> [options] [SYMBOL...]

Decode the most probable hidden state path for a sequence of symbols.

Options:
  --model <FILE>           JSON model definition (states, start, trans, emission)
  --chars <TEXT>           Use each character of TEXT as one observation
  --lenient                Treat symbols missing from a state's emission table as impossible
  --format <text|json>     Output format (default: text)
  --describe               Print the model before decoding
  -h, --help               Print this help message

JSON output is one object with a \"model\" key (with --describe) and a
\"result\" key (with observations). When no path is possible the result has
probability 0 and \"log2_probability\": null.

Examples:
  viterbi --model coin.json --chars HHTHHTTHTHT
  viterbi --model dna.json --format json G G C A C T G A A
"
        );
    }
}

#[derive(Copy, Clone)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn from_str(value: &str) -> Result<Self, String> {
        match value {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown format '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Options, String> {
        Options::parse(args.iter().copied())
    }

    #[test]
    fn chars_split_into_symbols() {
        let opts = parse(&["--model", "m.json", "--chars", "HHT"]).unwrap();
        assert_eq!(opts.model_path, "m.json");
        assert_eq!(opts.observations, vec!["H", "H", "T"]);
        assert_eq!(opts.policy, UnknownSymbolPolicy::Strict);
    }

    #[test]
    fn positional_symbols_and_flags() {
        let opts = parse(&["--model=m.json", "--lenient", "--format=json", "GC", "AT"]).unwrap();
        assert_eq!(opts.observations, vec!["GC", "AT"]);
        assert_eq!(opts.policy, UnknownSymbolPolicy::Impossible);
        assert!(matches!(opts.format, OutputFormat::Json));
    }

    const COIN: &str = r#"{
        "states": ["Fair", "Loaded"],
        "start": {"Fair": 0.9, "Loaded": 0.1},
        "trans": {"Fair": {"Fair": 1.0, "Loaded": 0.0},
                  "Loaded": {"Fair": 0.0, "Loaded": 1.0}},
        "emission": {"Fair": {"H": 0.5, "T": 0.5},
                     "Loaded": {"H": 1.0, "T": 0.0}}
    }"#;

    #[test]
    fn describe_and_decode_share_one_json_document() {
        let model = ModelDefinition::from_json(COIN).unwrap().into_model().unwrap();
        let best = model.viterbi(["H", "T"].map(String::from)).unwrap();
        let report = Report {
            model: Some(model.definition()),
            result: Some(&best),
        };
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["model"]["states"], serde_json::json!(["Fair", "Loaded"]));
        assert_eq!(value["result"]["path"], serde_json::json!(["Fair", "Fair"]));
    }

    #[test]
    fn impossible_path_reports_null_log2_probability() {
        let text = r#"{"states": ["A"], "start": {"A": 1.0}, "trans": {"A": {"A": 1.0}},
            "emission": {"A": {"H": 1.0, "T": 0.0}}}"#;
        let model = ModelDefinition::from_json(text).unwrap().into_model().unwrap();
        let best = model.viterbi(["H", "T"].map(String::from)).unwrap();
        assert_eq!(best.log2_probability, f64::NEG_INFINITY);
        let report = Report {
            model: None,
            result: Some(&best),
        };
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert!(value.get("model").is_none());
        assert_eq!(value["result"]["probability"], serde_json::json!(0.0));
        assert!(value["result"]["log2_probability"].is_null());
    }

    #[test]
    fn missing_model_or_observations_is_usage_error() {
        assert!(parse(&["--chars", "HH"]).is_err());
        assert!(parse(&["--model", "m.json"]).is_err());
        assert!(parse(&["--model", "m.json", "--describe"]).is_ok());
        assert!(parse(&["--model", "m.json", "--bogus", "H"]).is_err());
        assert!(parse(&["--model", "m.json", "--format", "csv", "H"]).is_err());
    }
}
