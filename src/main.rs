//! Jsontape CLI

use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context};
use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::header::ACCEPT;
use hyper::Request;
use tracing_subscriber::EnvFilter;

use jsontape::client::ConfigKind;
use jsontape::config::{Config, DEFAULT_ACCEPT};
use jsontape::eligibility::Eligibility;
use jsontape::recording::SessionId;
use jsontape::transport::{HyperTransport, Transport};
use jsontape::Interceptor;

fn usage() -> ! {
    eprintln!("Jsontape v{}", env!("CARGO_PKG_VERSION"));
    eprintln!();
    eprintln!("Usage: jsontape <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  fetch <url> [--config <file>]   GET a URL and record its JSON response");
    eprintln!("  check <url> [accept]            Show whether a request would be recorded");
    process::exit(1);
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jsontape=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        usage();
    }

    let result = match args[1].as_str() {
        "fetch" => fetch(&args[2], config_path(&args[3..])).await,
        "check" => check(&args[2], args.get(3).map(String::as_str)),
        command => {
            eprintln!("Unknown command: {command}");
            eprintln!("Run 'jsontape' for usage information.");
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn config_path(rest: &[String]) -> Option<PathBuf> {
    match rest {
        [flag, path, ..] if flag == "--config" => Some(PathBuf::from(path)),
        [] => None,
        _ => usage(),
    }
}

async fn fetch(url: &str, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = match config_path {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };

    let interceptor = Interceptor::from_config(&config)?;
    let mut results = interceptor.registry().listen();
    let client = interceptor.client(
        ConfigKind::Ephemeral,
        HyperTransport::new(&config.client),
    );

    let request = Request::builder()
        .uri(url)
        .header(ACCEPT, config.accept.as_str())
        .body(Bytes::new())
        .with_context(|| format!("invalid url {url}"))?;

    let response = match client.send(request).await {
        Ok(response) => response,
        Err(e) => {
            if let Ok(result) = results.try_recv() {
                println!("{result}");
            }
            bail!(e);
        }
    };

    println!("Status: {}", response.status());
    let recorded = response.extensions().get::<SessionId>().copied();

    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| anyhow::anyhow!("reading body: {e}"))?
        .to_bytes();
    println!("Body: {} bytes", body.len());

    if recorded.is_some() {
        let result = results
            .recv()
            .await
            .context("recording result channel closed")?;
        println!("{result}");
    } else {
        println!("Not recorded: request is not eligible");
    }

    Ok(())
}

fn check(url: &str, accept: Option<&str>) -> anyhow::Result<()> {
    let request = Request::builder()
        .uri(url)
        .header(ACCEPT, accept.unwrap_or(DEFAULT_ACCEPT))
        .body(())
        .with_context(|| format!("invalid request for {url}"))?;

    if Eligibility::default().check(&request) {
        println!("eligible: {url} would be recorded");
    } else {
        println!("not eligible: {url} would pass through");
    }

    Ok(())
}
