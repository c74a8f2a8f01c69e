//! Subcommand implementations.

use {
    anyhow::{Context, Result, ensure},
    console::style,
    edlink::{NativePort, SerialConfig, Session, discover_ports},
    std::path::Path,
};

use crate::Cli;

/// Upload command implementation.
pub(crate) fn cmd_upload(cli: &Cli, source: &Path, destination: &str) -> Result<()> {
    ensure!(
        source.is_file(),
        "source file {} does not exist",
        source.display()
    );

    let port_name = match &cli.port {
        Some(name) => name.clone(),
        None => {
            let detected = edlink::auto_detect_port()?;
            eprintln!(
                "{} auto-detected port {} ({:?})",
                style("ℹ").blue(),
                detected.info.name,
                detected.kind
            );
            detected.info.name
        },
    };

    if !cli.quiet {
        eprintln!(
            "{} opening connection on {} at {} baud",
            style("🔌").cyan(),
            port_name,
            cli.baud
        );
    }

    let config = SerialConfig::new(&port_name, cli.baud);
    let port = NativePort::open(&config)
        .with_context(|| format!("failed to open serial port {port_name}"))?;

    let mut session = Session::new(port, config).context("failed to configure serial port")?;
    session
        .upload(source, destination)
        .with_context(|| format!("failed to upload {} to {destination}", source.display()))?;

    if !cli.quiet {
        eprintln!("{} done!", style("✓").green());
    }
    Ok(())
}

/// List-ports command implementation.
pub(crate) fn cmd_list_ports(json: bool) -> Result<()> {
    let ports = discover_ports().context("failed to enumerate serial ports")?;

    if json {
        let entries: Vec<serde_json::Value> = ports
            .iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.info.name,
                    "kind": format!("{:?}", p.kind),
                    "vid": p.info.vid,
                    "pid": p.info.pid,
                    "manufacturer": p.info.manufacturer,
                    "product": p.info.product,
                    "serial_number": p.info.serial_number,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if ports.is_empty() {
        eprintln!("no serial ports found");
        return Ok(());
    }

    for p in &ports {
        let usb = match (p.info.vid, p.info.pid) {
            (Some(vid), Some(pid)) => format!("{vid:04x}:{pid:04x}"),
            _ => "-".to_string(),
        };
        println!(
            "{}\t{:?}\t{}\t{}",
            p.info.name,
            p.kind,
            usb,
            p.info.product.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
