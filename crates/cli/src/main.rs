//! razer-hid CLI: LED and resolution control for the Razer DeathAdder 2013.

mod backend;

use anyhow::{anyhow, bail, Context, Result};
use backend::{DryRunTransport, HidrawTransport, UsbTransport, UserspaceInterface};
use clap::{Parser, Subcommand, ValueEnum};
use razer_hid_core::comm::ErrorClass;
use razer_hid_core::config::{self, Backend, DriverConfig};
use razer_hid_core::device::{self, DeviceInfo, InterfaceInfo, InterfaceProtocol, MouseModel};
use razer_hid_core::driver::{self, Attachment, FeatureStatus};
use razer_hid_core::host::{Exposed, LocalRegistry};
use razer_hid_core::session::DeviceSession;
use razer_hid_core::transport::{ControlTransport, REQUEST_INDEX};
use razer_hid_core::{pids, RAZER_VID};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "razer-hid",
    version,
    about = "LED and resolution control for the Razer DeathAdder 2013"
)]
struct Cli {
    /// JSON config file (default: $RAZER_HID_CONFIG).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// How to reach the device; overrides the config file.
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendArg>,

    /// Print frames instead of sending them.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Hidraw,
    Usb,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Hidraw => Backend::Hidraw,
            BackendArg::Usb => Backend::Usb,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List connected supported Razer mice.
    ListDevices {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Switch an LED on or off.
    SetLed {
        /// LED: wheel, logo, a full LED name, or an index.
        led: String,
        /// on, off, 1 or 0.
        state: String,
    },
    /// Set sensor resolution (0-255).
    SetResolution {
        value: String,
    },
    /// Show the resolution attribute (the device cannot report it).
    GetResolution,
    /// Show what the mouse interface exposes.
    Status,
}

/// All interfaces of one device, attached.
struct Attached {
    host: LocalRegistry,
    interfaces: Vec<(UserspaceInterface, Attachment)>,
}

impl Attached {
    /// Session of the interface whose special functions came up.
    fn special_session(&self) -> Result<&DeviceSession> {
        for (iface, attachment) in &self.interfaces {
            match &attachment.features {
                FeatureStatus::Active => {
                    if let Some(session) = attachment.session() {
                        return Ok(session);
                    }
                }
                FeatureStatus::Failed(e) => {
                    bail!("special functions on interface {} failed: {e}", iface.number)
                }
                FeatureStatus::Unsupported => {}
            }
        }
        bail!("no interface of this device has special functions")
    }

    fn detach(self) {
        for (mut iface, attachment) in self.interfaces {
            driver::remove(&mut iface, attachment, &self.host);
        }
    }
}

fn open_transport(info: &DeviceInfo, config: &DriverConfig) -> Result<Arc<dyn ControlTransport>> {
    let transport: Arc<dyn ControlTransport> = match config.backend {
        Backend::Hidraw => Arc::new(HidrawTransport::open(
            info.vid,
            info.pid,
            REQUEST_INDEX as u8,
        )?),
        Backend::Usb => Arc::new(UsbTransport::open(
            info.vid,
            info.pid,
            config.control_timeout(),
        )?),
    };
    Ok(transport)
}

/// Interface layout of a DeathAdder 2013, used when previewing frames.
fn simulated_device() -> DeviceInfo {
    let protocols = [
        InterfaceProtocol::Mouse,
        InterfaceProtocol::Keyboard,
        InterfaceProtocol::Keyboard,
    ];
    DeviceInfo {
        model: MouseModel::DeathAdder2013,
        vid: RAZER_VID,
        pid: pids::DEATHADDER_2013,
        bus: 0,
        address: 0,
        interfaces: (0u8..)
            .zip(protocols)
            .map(|(number, protocol)| InterfaceInfo { number, protocol })
            .collect(),
    }
}

/// Attach every interface of `info` over one shared transport.
fn attach(
    info: &DeviceInfo,
    transport: Arc<dyn ControlTransport>,
    config: &DriverConfig,
) -> Result<Attached> {
    let host = LocalRegistry::new();
    let mut interfaces = Vec::new();
    for iface_info in &info.interfaces {
        let mut iface = UserspaceInterface::new(
            iface_info.number,
            info.pid,
            iface_info.protocol,
            Arc::clone(&transport),
        );
        let attachment = driver::probe(&mut iface, &host, config)
            .with_context(|| format!("attach interface {}", iface_info.number))?;
        interfaces.push((iface, attachment));
    }

    Ok(Attached { host, interfaces })
}

/// Attach every interface of the first supported device. A dry run attaches
/// a simulated device instead of enumerating the bus.
fn attach_first_supported(config: &DriverConfig, dry_run: bool) -> Result<Attached> {
    if dry_run {
        return attach(&simulated_device(), Arc::new(DryRunTransport), config);
    }
    let devices = device::discover_devices()?;
    let info = devices
        .first()
        .ok_or_else(|| anyhow!("No supported Razer mouse found"))?;
    let transport = open_transport(info, config)?;
    attach(info, transport, config)
}

fn parse_state(state: &str) -> Result<u8> {
    match state.to_lowercase().as_str() {
        "on" | "1" => Ok(1),
        "off" | "0" => Ok(0),
        other => bail!("unknown LED state '{other}'; use on, off, 1 or 0"),
    }
}

fn resolve_led(session: &DeviceSession, led: &str, prefix: &str) -> Result<usize> {
    let index = match led.parse::<usize>() {
        Ok(index) => Some(index).filter(|&i| session.has_indicator(i)),
        Err(_) => session
            .indicator_index(led)
            .or_else(|| session.indicator_index(&format!("{prefix}::{led}"))),
    };
    index.ok_or_else(|| {
        anyhow!(
            "unknown LED '{led}'; available: {}",
            session.indicator_names().join(", ")
        )
    })
}

/// Describe a core error the way a sysfs write would report it.
fn describe(e: razer_hid_core::error::Error) -> anyhow::Error {
    let class = ErrorClass::classify(&e);
    match class.hint() {
        Some(hint) => anyhow!("{e} (errno {}; {hint})", class.errno()),
        None => anyhow!("{e} (errno {})", class.errno()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.backend = backend.into();
    }

    match cli.command {
        Commands::ListDevices { json } => {
            let devices = device::discover_devices()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&devices)?);
            } else if devices.is_empty() {
                println!("No supported Razer mice found.");
            } else {
                for dev in &devices {
                    println!(
                        "{} (VID: 0x{:04X}, PID: 0x{:04X}, bus {:03} device {:03})",
                        dev.model.name(),
                        dev.vid,
                        dev.pid,
                        dev.bus,
                        dev.address
                    );
                    for iface in &dev.interfaces {
                        let special = if iface.protocol == InterfaceProtocol::Mouse {
                            " [LEDs, resolution]"
                        } else {
                            ""
                        };
                        println!("  interface {}: {}{special}", iface.number, iface.protocol);
                    }
                }
            }
        }
        Commands::SetLed { led, state } => {
            let value = parse_state(&state)?;
            let attached = attach_first_supported(&config, cli.dry_run)?;
            let result = attached.special_session().and_then(|session| {
                let index = resolve_led(session, &led, &config.led_prefix)?;
                session.apply_indicator(index, value).map_err(describe)?;
                Ok(index)
            });
            attached.detach();
            let index = result?;
            println!("LED {index} set to {}", if value == 1 { "on" } else { "off" });
        }
        Commands::SetResolution { value } => {
            let attached = attach_first_supported(&config, cli.dry_run)?;
            let result = attached
                .special_session()
                .and_then(|session| session.write_sensitivity(&value).map_err(describe));
            attached.detach();
            result?;
            println!("Resolution set to {}", value.trim());
        }
        Commands::GetResolution => {
            let attached = attach_first_supported(&config, cli.dry_run)?;
            let result = attached
                .special_session()
                .map(|session| session.read_sensitivity().unwrap_or_default());
            attached.detach();
            print!("{}", result?);
        }
        Commands::Status => {
            let attached = attach_first_supported(&config, cli.dry_run)?;
            for (iface, attachment) in &attached.interfaces {
                let status = match &attachment.features {
                    FeatureStatus::Active => "special functions active".to_string(),
                    FeatureStatus::Unsupported => "plain input".to_string(),
                    FeatureStatus::Failed(e) => format!("special functions failed: {e}"),
                };
                println!("interface {}: {status}", iface.number);
            }
            for (name, exposed) in attached.host.exposed() {
                match exposed {
                    Exposed::Indicator(info) => println!(
                        "  LED {name} (max brightness {}, write-only)",
                        info.max_brightness
                    ),
                    Exposed::Attribute(info) => {
                        println!("  attribute {name} (mode {:o})", info.mode)
                    }
                }
            }
            attached.detach();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview() -> Attached {
        let transport: Arc<dyn ControlTransport> = Arc::new(DryRunTransport);
        attach(&simulated_device(), transport, &DriverConfig::default()).unwrap()
    }

    #[test]
    fn led_states() {
        assert_eq!(parse_state("on").unwrap(), 1);
        assert_eq!(parse_state("OFF").unwrap(), 0);
        assert_eq!(parse_state("1").unwrap(), 1);
        assert!(parse_state("blink").is_err());
    }

    #[test]
    fn led_names_and_indices_resolve() {
        let attached = preview();
        let session = attached.special_session().unwrap();
        assert_eq!(resolve_led(session, "wheel", "led").unwrap(), 0);
        assert_eq!(resolve_led(session, "led::logo", "led").unwrap(), 1);
        assert_eq!(resolve_led(session, "1", "led").unwrap(), 1);
        attached.detach();
    }

    #[test]
    fn out_of_range_led_index_rejected() {
        let attached = preview();
        let session = attached.special_session().unwrap();
        let err = resolve_led(session, "5", "led").unwrap_err().to_string();
        assert!(err.contains("led::wheel, led::logo"), "{err}");
        assert!(resolve_led(session, "scroll", "led").is_err());
        attached.detach();
    }

    #[test]
    fn dry_run_attaches_without_hardware() {
        let attached = attach_first_supported(&DriverConfig::default(), true).unwrap();
        assert_eq!(attached.interfaces.len(), 3);
        assert!(matches!(attached.interfaces[0].1.features, FeatureStatus::Active));
        assert!(matches!(attached.interfaces[1].1.features, FeatureStatus::Unsupported));
        assert_eq!(attached.host.exposed().len(), 3);
        attached.detach();
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["razer-hid", "--dry-run", "set-led", "logo", "on"]).unwrap();
        assert!(cli.dry_run);
        assert!(matches!(cli.command, Commands::SetLed { .. }));

        let cli =
            Cli::try_parse_from(["razer-hid", "--backend", "usb", "set-resolution", "120"]).unwrap();
        assert!(matches!(cli.backend, Some(BackendArg::Usb)));
    }
}
