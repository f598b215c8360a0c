mod cli;
mod printer;

use std::{
    io::{self, Write},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use is_terminal::IsTerminal;
use reqwest::Url;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use printer::TextPrinter;
use run_outputs::{
    config::Config,
    fetch::{Credentials, HttpFetcher, Remote},
    output::{OutputNode, PortView},
    run::RunOutputs,
};

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("{}=info,run_outputs=warn", env!("CARGO_CRATE_NAME")).into()
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    // Load config; CLI flags override it
    let mut cfg = Config::load();
    if let Some(t) = args.timeout {
        cfg.set("REQUEST_TIMEOUT", t.to_string());
    }
    if let Some(u) = &args.username {
        cfg.set("RUNOUT_USERNAME", u.as_str());
    }
    if let Some(p) = &args.password {
        cfg.set("RUNOUT_PASSWORD", p.as_str());
    }

    let raw_url = match args.output_url.clone().or_else(|| cfg.output_url()) {
        Some(u) => u,
        None => bail!("Provide OUTPUT_URL or set RUNOUT_OUTPUT_URL"),
    };
    let url = Url::parse(&raw_url).with_context(|| format!("invalid output URL: {}", raw_url))?;

    let fetcher = HttpFetcher::from_config(&cfg).context("failed to build HTTP client")?;
    let credentials: Option<Credentials> = cfg.credentials();
    if credentials.is_some() {
        info!("using basic authentication");
    }
    let outputs = RunOutputs::new(Remote::new(Arc::new(fetcher), credentials), url);

    let colored = !args.no_color && !cfg.get_bool("RUNOUT_NO_COLOR") && io::stdout().is_terminal();
    let color = if colored { cfg.get("DEFAULT_COLOR") } else { None };
    let printer = TextPrinter::new(color.as_deref());

    if args.tree {
        let preview = args.preview.then(|| cfg.preview_bytes());
        match args.port.as_deref() {
            Some(name) => print_tree(&printer, outputs.port(name)?, preview)?,
            None => {
                for port in outputs.ports()?.values() {
                    print_tree(&printer, port, preview)?;
                }
            }
        }
        return Ok(());
    }

    if let Some(name) = args.port.as_deref() {
        let port = outputs.port(name)?;
        let node = port
            .get_value(&args.coords)
            .with_context(|| format!("no value at {:?} in port '{}' (depth {})", args.coords, name, port.depth()))?;
        return write_value(node, &args);
    }

    // Default and --list-ports
    for port in outputs.ports()?.values() {
        printer.print_port_summary(port);
    }
    Ok(())
}

fn print_tree(printer: &TextPrinter, port: &PortView, preview: Option<u64>) -> Result<()> {
    printer.print(&port.to_string());
    let Some(n) = preview.filter(|n| *n > 0) else {
        return Ok(());
    };
    for (coords, node) in port.leaves() {
        match node {
            OutputNode::Data(leaf) => {
                let head = leaf.read(0, n - 1)?;
                println!("  {:?}: {}", coords, String::from_utf8_lossy(&head).escape_debug());
            }
            OutputNode::Error(_) => println!("  {:?}: <error>", coords),
            OutputNode::List(_) => {}
        }
    }
    Ok(())
}

fn write_value(node: &OutputNode, args: &cli::Cli) -> Result<()> {
    if let Some(err) = node.as_error() {
        let message = err.message().context("failed to fetch error message")?;
        bail!("value is an error:\n{}", message);
    }
    let leaf = node.as_data()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.stream {
        let n = leaf.write_to(&mut out).context("failed to stream value")?;
        info!(bytes = n, "streamed");
    } else if args.text {
        writeln!(out, "{}", leaf.read_text()?)?;
    } else if let Some((lo, hi)) = args.range {
        out.write_all(&leaf.read(lo, hi)?)?;
    } else {
        out.write_all(&leaf.read_all()?)?;
    }
    out.flush()?;
    Ok(())
}
