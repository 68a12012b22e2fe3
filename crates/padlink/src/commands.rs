use std::io::{self, Write};
use std::path::Path;

use colored::Colorize;
use padlink_devices::Backends;
use padlink_guid::{convert_with_hid, ControllerIdentity, HidStrings, SdlVersion};
use padlink_identity::{
    load_config, resolve_config, ConfigError, ControllerDescriptor, DeviceRegistry, Settings,
};
use padlink_mapping::{
    write_helper_output, Control, ControllerDatabaseSource, DatabaseError, InputElement, InputKind,
    LibrarySource,
};
use thiserror::Error;

use crate::cli::{Cli, Command};

#[derive(Debug, Error)]
pub(crate) enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("{0} is not a valid identity")]
    InvalidIdentity(String),
    #[error("unknown input kind {0}, expected button, axis or hat")]
    InvalidKind(String),
    #[error("unknown control {0}")]
    InvalidControl(String),
    #[error("{0} is not mapped, pass --control")]
    Unmapped(InputElement),
    #[error("no command given")]
    MissingCommand,
    #[error("unable to write output: {0}")]
    Io(#[from] io::Error),
}

pub(crate) fn run(cli: Cli) -> Result<(), CommandError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Some(library) = &cli.sdl2 {
        return helper(&mut out, library, cli.hints.clone());
    }

    let Some(command) = cli.command else {
        return Err(CommandError::MissingCommand);
    };
    match command {
        Command::Decode { guid } => decode(&mut out, &guid),
        Command::Convert {
            guid,
            name,
            version,
            manufacturer,
            product,
        } => {
            let hid = match (&manufacturer, &product) {
                (Some(manufacturer), Some(product)) => Some(HidStrings::new(manufacturer, product)),
                _ => None,
            };
            convert(&mut out, &guid, &name, version, hid)
        }
        Command::Devices { all } => {
            let registry = registry(cli.config.as_deref())?;
            devices(&registry, all);
            Ok(())
        }
        Command::Lookup { guid, name } => {
            let registry = registry(cli.config.as_deref())?;
            let identity = parse_identity(&guid)?;
            match registry.database().mapping_for(None, &identity, &name) {
                Some(mapping) => writeln!(out, "{mapping}")?,
                None => log::warn!("no mapping for {identity}"),
            }
            Ok(())
        }
        Command::Resolve {
            guid,
            kind,
            id,
            value,
            control,
        } => {
            let registry = registry(cli.config.as_deref())?;
            let identity = parse_identity(&guid)?;
            let kind = InputKind::from_name(&kind).ok_or(CommandError::InvalidKind(kind))?;
            let captured = InputElement { kind, id, value, inverted: false };
            resolve(&registry, identity, captured, control)
        }
    }
}

/// Runs the cross-bitness helper protocol: controllers of `library` as XML
/// on stdout.
fn helper(out: &mut impl Write, library: &Path, hints: Option<String>) -> Result<(), CommandError> {
    let source = LibrarySource::new(library.to_path_buf(), hints);
    let snapshot = source.load()?;
    out.write_all(write_helper_output(&snapshot)?.as_bytes())?;
    out.flush()?;
    Ok(())
}

fn registry(config: Option<&Path>) -> Result<DeviceRegistry, CommandError> {
    let settings = match resolve_config(config)? {
        Some(path) => {
            log::debug!("using config {}", path.display());
            load_config(&path)?
        }
        None => Settings::default(),
    };
    Ok(DeviceRegistry::new(settings, Backends::system()))
}

fn parse_identity(guid: &str) -> Result<ControllerIdentity, CommandError> {
    let identity = ControllerIdentity::from_platform_guid(guid).unwrap_or_else(|| ControllerIdentity::parse(guid));
    if identity.is_valid() {
        Ok(identity)
    } else {
        Err(CommandError::InvalidIdentity(guid.to_owned()))
    }
}

fn convert(
    out: &mut impl Write,
    guid: &str,
    name: &str,
    version: SdlVersion,
    hid: Option<HidStrings<'_>>,
) -> Result<(), CommandError> {
    let identity = parse_identity(guid)?;
    writeln!(out, "{}", convert_with_hid(&identity, name, version, hid))?;
    Ok(())
}

fn decode(out: &mut impl Write, guid: &str) -> Result<(), CommandError> {
    let identity = parse_identity(guid)?;
    let fields = identity.decode();
    writeln!(out, "identity  {identity}")?;
    writeln!(out, "bus       {:#06x}", fields.bus)?;
    writeln!(out, "crc       {:#06x}", fields.crc)?;
    writeln!(out, "vendor    {:#06x}", fields.vendor_id)?;
    writeln!(out, "product   {:#06x}", fields.product_id)?;
    writeln!(out, "version   {:#06x}", fields.version)?;
    writeln!(out, "driver    {:?}", fields.driver)?;
    writeln!(out, "subtype   {:#04x}", fields.subtype)?;
    if let Some(platform) = identity.to_platform_guid() {
        writeln!(out, "platform  {platform}")?;
    }
    Ok(())
}

fn devices(registry: &DeviceRegistry, all: bool) {
    let controllers = registry.controllers();
    if controllers.is_empty() {
        log::warn!("no controllers found");
    }
    for controller in controllers {
        let mapped = if registry.mapping_for(controller).is_some() {
            "mapped".green()
        } else {
            "unmapped".yellow()
        };
        log::info!("{controller} ({mapped})");
    }
    if !all {
        return;
    }

    for device in registry.legacy_devices() {
        log::info!(
            "legacy #{} {} {:04x}:{:04x} {} parent {}",
            device.index,
            device.name,
            device.vendor_id,
            device.product_id,
            device.instance_guid,
            device.parent_path
        );
    }
    for slot in registry.console_slots() {
        log::info!(
            "xinput slot {} {:04x}:{:04x} subtype {} ({:?})",
            slot.slot,
            slot.vendor_id(),
            slot.product_id(),
            slot.subtype(),
            slot.capabilities.tier
        );
    }
    for device in registry.hid_devices() {
        log::info!(
            "hid {:04x}:{:04x} {} {} {} parent {}",
            device.vendor_id,
            device.product_id,
            device.manufacturer,
            device.product,
            device.path,
            device.parent_path
        );
    }
    for device in registry.class_devices() {
        log::info!(
            "class {:04x}:{:04x} {} {} usb {}",
            device.vendor_id,
            device.product_id,
            device.description,
            device.instance_id,
            device.usb_parent.as_deref().unwrap_or("-")
        );
    }
}

fn resolve(
    registry: &DeviceRegistry,
    identity: ControllerIdentity,
    captured: InputElement,
    control: Option<String>,
) -> Result<(), CommandError> {
    let descriptor = match registry.find_controller(&identity) {
        Some(descriptor) => descriptor.clone(),
        None => {
            log::debug!("{identity} is not connected, using database mappings only");
            ControllerDescriptor {
                index: 0,
                name: String::new(),
                vendor_id: identity.vendor_id(),
                product_id: identity.product_id(),
                identity,
                instance_id: String::new(),
                path: String::new(),
                parent_path: String::new(),
                live: false,
            }
        }
    };

    let semantic = match control {
        Some(name) => Control::from_name(&name).ok_or(CommandError::InvalidControl(name))?,
        None => registry
            .mapping_for(&descriptor)
            .and_then(|mapping| mapping.find_input(&captured))
            .map(|binding| binding.control)
            .ok_or(CommandError::Unmapped(captured))?,
    };

    let resolution = registry.resolve(&descriptor, semantic, captured);
    if resolution.is_resolved() {
        log::info!("{resolution}");
    } else {
        log::warn!("{resolution}");
    }
    Ok(())
}
