use std::path::Path;

use padlink_guid::ControllerIdentity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::record::{InputElement, InputKind};
use crate::CaptureError;

/// A named input as the frontend recorded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedInput {
    pub name: String,
    pub element: InputElement,
}

/// Inputs recorded for one joystick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedDevice {
    pub name: String,
    pub identity: ControllerIdentity,
    pub inputs: Vec<CapturedInput>,
}

impl CapturedDevice {
    pub fn input(&self, name: &str) -> Option<&InputElement> {
        self.inputs
            .iter()
            .find(|input| input.name.eq_ignore_ascii_case(name))
            .map(|input| &input.element)
    }
}

/// Joystick input configurations captured by the frontend:
///
/// ```xml
/// <inputList>
///   <inputConfig type="joystick" deviceName="..." deviceGUID="...">
///     <input name="a" type="button" id="0" value="1"/>
///   </inputConfig>
/// </inputList>
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputCaptureSet {
    pub devices: Vec<CapturedDevice>,
}

fn xml_err(e: impl std::fmt::Display) -> CaptureError {
    CaptureError::Xml(e.to_string())
}

fn attributes(element: &BytesStart<'_>) -> Result<Vec<(Vec<u8>, String)>, CaptureError> {
    element
        .attributes()
        .with_checks(false)
        .map(|attr| {
            let attr = attr.map_err(xml_err)?;
            let value = attr.unescape_value().map_err(xml_err)?.into_owned();
            Ok((attr.key.as_ref().to_vec(), value))
        })
        .collect()
}

fn attr<'a>(attrs: &'a [(Vec<u8>, String)], key: &[u8]) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k.as_slice() == key)
        .map(|(_, v)| v.as_str())
}

fn read_device(element: &BytesStart<'_>) -> Result<Option<CapturedDevice>, CaptureError> {
    let attrs = attributes(element)?;
    if attr(&attrs, b"type") != Some("joystick") {
        return Ok(None);
    }
    Ok(Some(CapturedDevice {
        name: attr(&attrs, b"deviceName").unwrap_or_default().to_owned(),
        identity: ControllerIdentity::parse(attr(&attrs, b"deviceGUID").unwrap_or_default()),
        inputs: Vec::new(),
    }))
}

fn read_input(element: &BytesStart<'_>) -> Result<Option<CapturedInput>, CaptureError> {
    let attrs = attributes(element)?;
    let (Some(name), Some(kind), Some(id), Some(value)) = (
        attr(&attrs, b"name"),
        attr(&attrs, b"type").and_then(InputKind::from_name),
        attr(&attrs, b"id"),
        attr(&attrs, b"value"),
    ) else {
        return Ok(None);
    };
    // Keyboard-style entries carry negative ids.
    let Ok(id) = id.trim().parse::<u32>() else {
        return Ok(None);
    };
    let value = value.trim().parse::<i32>().map_err(xml_err)?;
    Ok(Some(CapturedInput {
        name: name.to_owned(),
        element: InputElement { kind, id, value, inverted: false },
    }))
}

impl InputCaptureSet {
    pub fn parse(xml: &str) -> Result<Self, CaptureError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        let mut set = Self::default();
        let mut current: Option<CapturedDevice> = None;

        loop {
            match reader.read_event_into(&mut buf).map_err(xml_err)? {
                Event::Start(element) if element.name().as_ref() == b"inputConfig" => {
                    current = read_device(&element)?;
                }
                Event::Empty(element) => match element.name().as_ref() {
                    b"inputConfig" => {
                        if let Some(device) = read_device(&element)? {
                            set.devices.push(device);
                        }
                    }
                    b"input" => {
                        if let (Some(device), Some(input)) = (current.as_mut(), read_input(&element)?) {
                            device.inputs.push(input);
                        }
                    }
                    _ => {}
                },
                Event::End(element) if element.name().as_ref() == b"inputConfig" => {
                    if let Some(device) = current.take() {
                        set.devices.push(device);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        Ok(set)
    }

    pub fn load(path: &Path) -> Result<Self, CaptureError> {
        let xml = std::fs::read_to_string(path).map_err(|source| CaptureError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&xml)
    }

    pub fn device(&self, identity: &ControllerIdentity) -> Option<&CapturedDevice> {
        self.devices.iter().find(|device| device.identity == *identity)
    }
}
