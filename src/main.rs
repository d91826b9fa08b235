mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use firesize::args::ProcessArgs;
use firesize::{config, server};
use firesize_magick::{Pipeline, ToolRegistry};

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // CLI flags win over the config file
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting firesize");
    server::start_server(config).await
}

async fn process_url(
    url: String,
    size: Option<String>,
    format: Option<String>,
    gravity: Option<String>,
    quality: Option<u8>,
    output: &Path,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let mut args = ProcessArgs::new(url);
    if let Some(size) = size {
        args.apply_option(&size)?;
    }
    if let Some(format) = format {
        args.set_requested_format(&format)?;
    }
    if let Some(gravity) = gravity {
        args.set_gravity(&gravity)?;
    }
    if let Some(quality) = quality {
        args.apply_option(&format!("q_{quality}"))?;
    }

    let tools = ToolRegistry::discover(&config.tools);
    let pipeline = Pipeline::new(Arc::new(tools), config.pipeline);

    let processed = pipeline.process(&mut args).await?;
    tokio::fs::copy(processed.output(), output)
        .await
        .with_context(|| format!("Failed to write {:?}", output))?;
    processed.finish();

    println!("Output: {}", output.display());
    if let Some(format) = &args.format {
        println!("Format: {format}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "firesize=trace,firesize_magick=trace,tower_http=debug".to_string()
        } else {
            "firesize=debug,firesize_magick=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Process {
            url,
            size,
            format,
            gravity,
            quality,
            output,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(process_url(
                url,
                size,
                format,
                gravity,
                quality,
                &output,
                cli.config.as_deref(),
            ))
        }
        Commands::CheckTools { json } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            check_tools(&ToolRegistry::discover(&config.tools), json)
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("firesize {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn check_tools(tools: &ToolRegistry, json: bool) -> Result<()> {
    let infos = tools.check_all();

    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    println!("Checking external tools...\n");

    let mut all_ok = true;
    for tool in &infos {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ImageMagick to serve requests.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            firesize_core::config::Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!(
        "  Timeouts: probe {:?}, transform {:?}",
        config.pipeline.probe_timeout, config.pipeline.transform_timeout
    );
    println!("  Cleanup: {:?}", config.pipeline.cleanup);
    println!("  Coalesce failure: {:?}", config.pipeline.coalesce_failure);

    for warning in config.validate() {
        println!("  ! {warning}");
    }

    Ok(())
}
