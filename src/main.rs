use std::{
    env,
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
};

use anyhow::{Context, bail};
use log::info;
use tokio::{net::TcpListener, signal};

use house_price::{
    ArtifactStatus, ArtifactStore, Config, HouseQuery, InferencePipeline, LoadReport,
    PredictedPrice,
    service::{self, Service},
};

const USAGE: &str = "\
Usage: house-price [--config <path>] <command>

Commands:
  predict <total_sqft> <bath> <bhk> <location...>   predict the price of a house
  locations                                         list the known locations
  serve                                             answer JSON lines over TCP";

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let config_path = take_config_flag(&mut args)?;

    let config = Config::load(config_path.as_deref()).context("cannot load the configuration")?;
    let Some((mode, rest)) = args.split_first() else {
        eprintln!("{USAGE}");
        return Ok(ExitCode::FAILURE);
    };

    match mode.as_str() {
        "predict" => predict(&config, rest),
        "locations" => locations(&config),
        "serve" => serve(config).await,
        _ => {
            eprintln!("Unknown command: {mode}\n\n{USAGE}");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Removes `--config <path>` from `args`.
fn take_config_flag(args: &mut Vec<String>) -> anyhow::Result<Option<PathBuf>> {
    match args.iter().position(|arg| arg == "--config") {
        Some(i) if i + 1 < args.len() => {
            let path = args.remove(i + 1);
            args.remove(i);
            Ok(Some(PathBuf::from(path)))
        }
        Some(_) => bail!("--config expects a path\n\n{USAGE}"),
        None => Ok(None),
    }
}

/// Reads `<total_sqft> <bath> <bhk> <location...>`, a multi-word location is joined back.
fn parse_query(args: &[String]) -> anyhow::Result<HouseQuery> {
    let [total_sqft, bath, bhk, location @ ..] = args else {
        bail!("predict expects <total_sqft> <bath> <bhk> <location...>\n\n{USAGE}");
    };
    if location.is_empty() {
        bail!("predict expects a location\n\n{USAGE}");
    }

    Ok(HouseQuery::new(
        total_sqft.parse().context("total_sqft must be a number")?,
        bath.parse().context("bath must be an integer")?,
        bhk.parse().context("bhk must be an integer")?,
        location.join(" "),
    ))
}

/// Renders the outcome of a prediction, `Err` lines go to stderr with a failure exit code.
fn render(outcome: &house_price::Result<PredictedPrice>) -> Result<String, String> {
    match outcome {
        Ok(price) => Ok(format!("Price Predicted: {price}")),
        Err(e) => Err(format!("Error during prediction: {}", e.user_message())),
    }
}

fn predict(config: &Config, args: &[String]) -> anyhow::Result<ExitCode> {
    let query = parse_query(args)?;

    let store = ArtifactStore::new(config);
    let bundle = store.current();
    print_report(bundle.report());

    match render(&InferencePipeline::new().predict(&query, &bundle)) {
        Ok(line) => {
            println!("{line}");
            Ok(ExitCode::SUCCESS)
        }
        Err(line) => {
            eprintln!("{line}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn locations(config: &Config) -> anyhow::Result<ExitCode> {
    let store = ArtifactStore::new(config);
    let bundle = store.current();

    let Some(encoder) = bundle.encoder() else {
        print_report(bundle.report());
        return Ok(ExitCode::FAILURE);
    };

    for location in encoder.categories() {
        println!("{location}");
    }
    Ok(ExitCode::SUCCESS)
}

async fn serve(config: Config) -> anyhow::Result<ExitCode> {
    let store = Arc::new(ArtifactStore::new(&config));
    let service = Arc::new(Service::new(store, config.inference_timeout()));

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("cannot listen at {}", config.listen_addr))?;

    tokio::select! {
        ret = service::serve(listener, service) => {
            ret?;
        }
        _ = signal::ctrl_c() => {
            info!("received SIGINT, shutting down");
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &LoadReport) {
    for (name, status) in [
        ("Model", &report.model),
        ("Encoder", &report.encoder),
        ("Scaler", &report.scaler),
    ] {
        match status {
            ArtifactStatus::Loaded { .. } => eprintln!("{name} loaded successfully!"),
            ArtifactStatus::Unavailable { reason, .. } => eprintln!("{name} unavailable: {reason}"),
        }
    }
}
