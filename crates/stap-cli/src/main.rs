use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use log::{error, info};
use stap_core::{AnalysisConfig, Domain, SolutionMode};
use stap_inp::Deck;

mod echo;
mod summary;

use summary::Summary;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Options {
    input: PathBuf,
    config: Option<PathBuf>,
    json: bool,
    echo: Option<PathBuf>,
}

fn usage() {
    eprintln!("usage: stap-cli check <input> [--config <file.json>] [--json] [--echo <out.txt>]");
}

fn parse_args(args: &[String]) -> Option<Options> {
    let (command, rest) = args.split_first()?;
    if command != "check" {
        return None;
    }
    let mut input = None;
    let mut config = None;
    let mut json = false;
    let mut echo = None;

    let mut it = rest.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(it.next()?)),
            "--echo" => echo = Some(PathBuf::from(it.next()?)),
            "--json" => json = true,
            flag if flag.starts_with("--") => return None,
            path if input.is_none() => input = Some(PathBuf::from(path)),
            _ => return None,
        }
    }
    Some(Options {
        input: input?,
        config,
        json,
        echo,
    })
}

fn run(options: &Options) -> stap_core::Result<Summary> {
    let config = match &options.config {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };
    let deck = Deck::parse_file(&options.input)?;

    let mut domain = Domain::new(config);
    domain.load(&deck)?;
    domain.number_equations()?;

    let mut reports = Vec::new();
    if domain.mode() == SolutionMode::DataCheck {
        info!("data check only: stopping after equation numbering");
    } else {
        domain.allocate_matrices()?;
        domain.assemble()?;
        for case in 1..=domain.load_cases().len() {
            reports.push(domain.assemble_force(case)?);
        }
    }

    if let Some(path) = &options.echo {
        let mut out = BufWriter::new(File::create(path)?);
        echo::write_echo(&domain, &mut out)?;
        out.flush()?;
        info!("wrote input echo to {}", path.display());
    }

    Ok(Summary::from_domain(&domain, &reports))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(options) = parse_args(&args) else {
        usage();
        return ExitCode::from(2);
    };

    let summary = match run(&options) {
        Ok(summary) => summary,
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            return ExitCode::from(1);
        }
    };

    if options.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("error: {err}");
                return ExitCode::from(1);
            }
        }
    } else {
        println!("{summary}");
    }
    ExitCode::SUCCESS
}
