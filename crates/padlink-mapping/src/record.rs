use std::fmt;
use std::str::FromStr;

use padlink_guid::ControllerIdentity;
use smallvec::SmallVec;

use crate::control::Control;
use crate::MappingError;

/// Kind of a native input element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Button,
    Axis,
    Hat,
}

impl InputKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "button" => InputKind::Button,
            "axis" => InputKind::Axis,
            "hat" => InputKind::Hat,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            InputKind::Button => "button",
            InputKind::Axis => "axis",
            InputKind::Hat => "hat",
        }
    }
}

/// A native input code: button index, axis index with polarity, or hat
/// index with direction mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputElement {
    pub kind: InputKind,
    pub id: u32,
    /// `1` for buttons, `1`/`-1` for axes, the direction mask for hats.
    pub value: i32,
    /// Axis reads reversed (`~` suffix).
    pub inverted: bool,
}

impl InputElement {
    pub fn button(id: u32) -> Self {
        Self { kind: InputKind::Button, id, value: 1, inverted: false }
    }

    pub fn axis(id: u32, value: i32) -> Self {
        Self { kind: InputKind::Axis, id, value, inverted: false }
    }

    pub fn hat(id: u32, value: i32) -> Self {
        Self { kind: InputKind::Hat, id, value, inverted: false }
    }

    /// Same element with the axis polarity flipped.
    pub fn with_inverted_value(self) -> Self {
        Self { value: -self.value, ..self }
    }

    /// Kind, id and value, ignoring the inversion flag.
    pub fn code(&self) -> (InputKind, u32, i32) {
        (self.kind, self.id, self.value)
    }
}

impl fmt::Display for InputElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.kind.name(), self.id, self.value)
    }
}

/// One `control:code` pair of a mapping record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub control: Control,
    pub input: InputElement,
    /// The code carried an explicit `+`/`-` sign.
    pub signed_input: bool,
}

impl Binding {
    fn parse(control: &str, code: &str) -> Option<Self> {
        let control = Control::from_name(control)?;
        let (input, signed_input) = parse_code(code)?;
        Some(Self { control, input, signed_input })
    }
}

fn parse_code(code: &str) -> Option<(InputElement, bool)> {
    let (sign, rest) = match code.as_bytes().first()? {
        b'+' => (Some(1), &code[1..]),
        b'-' => (Some(-1), &code[1..]),
        _ => (None, code),
    };
    let kind = rest.get(..1)?;
    let body = rest.get(1..)?;
    match (kind, sign) {
        ("b", None) => Some((InputElement::button(body.parse().ok()?), false)),
        ("a", _) => {
            let (body, inverted) = match body.strip_suffix('~') {
                Some(body) => (body, true),
                None => (body, false),
            };
            let mut input = InputElement::axis(body.parse().ok()?, sign.unwrap_or(1));
            input.inverted = inverted;
            Some((input, sign.is_some()))
        }
        ("h", None) => {
            let (hat, mask) = body.split_once('.')?;
            Some((InputElement::hat(hat.parse().ok()?, mask.parse().ok()?), false))
        }
        _ => None,
    }
}

fn write_code(f: &mut fmt::Formatter<'_>, binding: &Binding) -> fmt::Result {
    let input = &binding.input;
    match input.kind {
        InputKind::Button => write!(f, "b{}", input.id),
        InputKind::Hat => write!(f, "h{}.{}", input.id, input.value),
        InputKind::Axis => {
            if binding.signed_input {
                f.write_str(if input.value < 0 { "-" } else { "+" })?;
            }
            write!(f, "a{}", input.id)?;
            if input.inverted {
                f.write_str("~")?;
            }
            Ok(())
        }
    }
}

/// A parsed line of the controller database:
/// `identity,name,control:code,...,platform:Windows,`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerMapping {
    pub identity: ControllerIdentity,
    pub name: String,
    pub bindings: SmallVec<[Binding; 24]>,
    /// Non-control fields (`platform`, `hint`, ...) in record order.
    pub extras: Vec<(String, String)>,
}

impl ControllerMapping {
    /// Parses one record. Tokens that are neither a known control nor a
    /// `key:value` field are skipped.
    pub fn parse(line: &str) -> Result<Self, MappingError> {
        let mut fields = line.trim().split(',');
        let identity = match fields.next().map(str::trim) {
            Some(id) if !id.is_empty() => ControllerIdentity::parse(id),
            _ => return Err(MappingError::MissingIdentity),
        };
        let name = fields
            .next()
            .map(str::trim)
            .ok_or_else(|| MappingError::MissingName(identity.to_string()))?
            .to_owned();

        let mut bindings = SmallVec::new();
        let mut extras = Vec::new();
        for field in fields.map(str::trim).filter(|f| !f.is_empty()) {
            let Some((key, value)) = field.split_once(':') else {
                log::debug!("skipping token {field:?} in mapping for {name}");
                continue;
            };
            if let Some(binding) = Binding::parse(key, value) {
                bindings.push(binding);
            } else if Control::from_name(key).is_some() {
                log::debug!("skipping malformed code {field:?} in mapping for {name}");
            } else {
                extras.push((key.to_owned(), value.to_owned()));
            }
        }

        Ok(Self { identity, name, bindings, extras })
    }

    /// The `platform:` field, if present.
    pub fn platform(&self) -> Option<&str> {
        self.extras
            .iter()
            .find(|(key, _)| key == "platform")
            .map(|(_, value)| value.as_str())
    }

    /// Binding whose native code is exactly `input` (kind, id and value).
    pub fn find_input(&self, input: &InputElement) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.input.code() == input.code())
    }

    pub fn binding_for(&self, control: Control) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.control == control)
    }

    /// Whether any control is wired to a native axis.
    pub fn has_axis_bindings(&self) -> bool {
        self.bindings.iter().any(|b| b.input.kind == InputKind::Axis)
    }

    /// Same mapping under another identity.
    pub fn with_identity(&self, identity: ControllerIdentity) -> Self {
        Self { identity, ..self.clone() }
    }
}

impl FromStr for ControllerMapping {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ControllerMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},", self.identity, self.name)?;
        for binding in &self.bindings {
            write!(f, "{}:", binding.control)?;
            write_code(f, binding)?;
            f.write_str(",")?;
        }
        for (key, value) in &self.extras {
            write!(f, "{key}:{value},")?;
        }
        Ok(())
    }
}
