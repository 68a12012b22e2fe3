use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use padlink_guid::{ControllerIdentity, SdlVersion};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use super::{ControllerDatabaseSource, LiveController, LiveSnapshot};
use crate::DatabaseError;

pub const DEFAULT_HELPER_TIMEOUT: Duration = Duration::from_secs(10);

const REAP_POLL: Duration = Duration::from_millis(10);

/// Runs a helper build of the other word size that loads the library and
/// prints the controller list as XML:
/// `<helper> -sdl2 "<library>" -hints "<hints>"`.
#[derive(Debug, Clone)]
pub struct HelperSource {
    helper: PathBuf,
    library: PathBuf,
    hints: Option<String>,
    timeout: Duration,
}

impl HelperSource {
    pub fn new(helper: PathBuf, library: PathBuf, hints: Option<String>, timeout: Duration) -> Self {
        Self { helper, library, hints, timeout }
    }

    fn run(&self) -> Result<String, DatabaseError> {
        let helper_err = |reason: String| DatabaseError::Helper {
            path: self.helper.clone(),
            reason,
        };

        let mut child = Command::new(&self.helper)
            .arg("-sdl2")
            .arg(&self.library)
            .arg("-hints")
            .arg(self.hints.as_deref().unwrap_or_default())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| helper_err(e.to_string()))?;

        let deadline = Instant::now() + self.timeout;
        let Some(mut stdout) = child.stdout.take() else {
            kill(&mut child, &self.helper);
            return Err(helper_err("stdout is not captured".into()));
        };

        let (tx, rx) = crossbeam_channel::bounded(1);
        std::thread::spawn(move || {
            let mut output = String::new();
            let result = stdout.read_to_string(&mut output).map(|_| output);
            // The receiver is gone once the helper timed out.
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(output)) => {
                reap(&mut child, &self.helper, deadline);
                Ok(output)
            }
            Ok(Err(e)) => {
                kill(&mut child, &self.helper);
                Err(helper_err(e.to_string()))
            }
            Err(_) => {
                kill(&mut child, &self.helper);
                Err(DatabaseError::HelperTimeout(self.timeout))
            }
        }
    }
}

/// Waits for the helper to exit until `deadline`, then kills it. A helper
/// that closed its stdout but keeps running never blocks past the deadline.
fn reap(child: &mut Child, helper: &Path, deadline: Instant) {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    log::warn!("helper {} exited with {status}", helper.display());
                }
                return;
            }
            Ok(None) if Instant::now() >= deadline => {
                log::warn!("helper {} kept running after its output, killing it", helper.display());
                kill(child, helper);
                return;
            }
            Ok(None) => std::thread::sleep(REAP_POLL),
            Err(e) => {
                log::warn!("unable to poll helper {}: {e}", helper.display());
                kill(child, helper);
                return;
            }
        }
    }
}

fn kill(child: &mut Child, helper: &Path) {
    if let Err(e) = child.kill() {
        log::warn!("unable to kill helper {}: {e}", helper.display());
    }
    if let Err(e) = child.wait() {
        log::warn!("unable to reap helper {}: {e}", helper.display());
    }
}

impl ControllerDatabaseSource for HelperSource {
    fn name(&self) -> &'static str {
        "helper"
    }

    fn load(&self) -> Result<LiveSnapshot, DatabaseError> {
        let output = self.run()?;
        parse_helper_output(&output)
    }
}

fn xml_err(e: impl std::fmt::Display) -> DatabaseError {
    DatabaseError::Xml(e.to_string())
}

fn read_mapping(element: &BytesStart<'_>, position: usize) -> Result<LiveController, DatabaseError> {
    let mut controller = LiveController {
        index: position,
        name: String::new(),
        path: String::new(),
        identity: ControllerIdentity::parse(""),
        mapping: None,
    };
    let mut has_guid = false;
    for attr in element.attributes().with_checks(false) {
        let attr = attr.map_err(xml_err)?;
        let value = attr.unescape_value().map_err(xml_err)?;
        match attr.key.as_ref() {
            b"index" => {
                controller.index = value.trim().parse().map_err(xml_err)?;
            }
            b"path" => controller.path = value.into_owned(),
            b"guid" => {
                controller.identity = ControllerIdentity::parse(value.trim());
                has_guid = true;
            }
            b"name" => controller.name = value.into_owned(),
            b"mapping" if !value.is_empty() => controller.mapping = Some(value.into_owned()),
            _ => {}
        }
    }
    if !has_guid {
        return Err(DatabaseError::Xml("mapping without guid".into()));
    }
    Ok(controller)
}

/// Parses the helper's stdout.
pub fn parse_helper_output(xml: &str) -> Result<LiveSnapshot, DatabaseError> {
    if xml.trim().is_empty() {
        return Err(DatabaseError::EmptyHelperOutput);
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut snapshot = LiveSnapshot::default();
    let mut seen_root = false;

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Start(element) | Event::Empty(element) => match element.name().as_ref() {
                b"mappings" => {
                    seen_root = true;
                    for attr in element.attributes().with_checks(false) {
                        let attr = attr.map_err(xml_err)?;
                        if attr.key.as_ref() == b"version" {
                            let value = attr.unescape_value().map_err(xml_err)?;
                            snapshot.version = value.parse().unwrap_or_default();
                        }
                    }
                }
                b"mapping" if seen_root => {
                    let position = snapshot.controllers.len();
                    snapshot.controllers.push(read_mapping(&element, position)?);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(DatabaseError::Xml("missing <mappings> element".into()));
    }
    Ok(snapshot)
}

/// Formats a snapshot the way [`parse_helper_output`] reads it.
pub fn write_helper_output(snapshot: &LiveSnapshot) -> Result<String, DatabaseError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let version = snapshot.version.to_string();
    let mut root = BytesStart::new("mappings");
    if snapshot.version != SdlVersion::Unknown {
        root.push_attribute(("version", version.as_str()));
    }
    writer.write_event(Event::Start(root)).map_err(xml_err)?;

    for controller in &snapshot.controllers {
        let index = controller.index.to_string();
        let guid = controller.identity.to_string();
        let mut element = BytesStart::new("mapping");
        element.push_attribute(("index", index.as_str()));
        element.push_attribute(("path", controller.path.as_str()));
        element.push_attribute(("guid", guid.as_str()));
        element.push_attribute(("name", controller.name.as_str()));
        if let Some(mapping) = &controller.mapping {
            element.push_attribute(("mapping", mapping.as_str()));
        }
        writer.write_event(Event::Empty(element)).map_err(xml_err)?;
    }

    writer.write_event(Event::End(BytesEnd::new("mappings"))).map_err(xml_err)?;
    String::from_utf8(writer.into_inner()).map_err(xml_err)
}
