use std::fmt;

use padlink_mapping::{Binding, Control, ControllerMapping, InputElement, InputKind};

use crate::console::ConsoleCode;

/// Which step of the fallback chain produced a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    /// The axis matched with its polarity flipped.
    InvertedAxis,
    /// Digital-only mapping; the D-pad binding was taken by name.
    DPadFallback,
}

/// Outcome of resolving one captured input of a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub semantic: Control,
    pub captured: InputElement,
    pub binding: Option<Binding>,
    pub matched_by: Option<MatchKind>,
    /// Code the legacy polling API reports for the input.
    pub legacy: InputElement,
    pub console: Option<ConsoleCode>,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        self.binding.is_some()
    }

    /// The matched control, or the requested one when nothing matched.
    pub fn control(&self) -> Control {
        self.binding.map_or(self.semantic, |b| b.control)
    }

    /// The database input element, or the captured code when nothing matched.
    pub fn input(&self) -> InputElement {
        self.binding.map_or(self.captured, |b| b.input)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- {}", self.control(), self.input())?;
        if let Some(kind) = self.matched_by {
            write!(f, " ({kind:?})")?;
        }
        write!(f, ", legacy {}", self.legacy)?;
        if let Some(console) = self.console {
            write!(f, ", console {console}")?;
        }
        Ok(())
    }
}

/// Finds the binding of `captured` in `mapping`.
///
/// Tries the exact code, then an axis with flipped polarity, then for a
/// mapping without any axis binding the D-pad binding named by `semantic`.
/// A miss is logged and yields `None`.
pub fn resolve_binding(
    mapping: Option<&ControllerMapping>,
    semantic: Control,
    captured: InputElement,
) -> Option<(Binding, MatchKind)> {
    let Some(mapping) = mapping else {
        log::warn!("no mapping to resolve {semantic} from {captured}");
        return None;
    };

    if let Some(binding) = mapping.find_input(&captured) {
        return Some((*binding, MatchKind::Exact));
    }

    if captured.kind == InputKind::Axis {
        if let Some(binding) = mapping.find_input(&captured.with_inverted_value()) {
            return Some((*binding, MatchKind::InvertedAxis));
        }
    }

    if !mapping.has_axis_bindings() && is_dpad(semantic) {
        if let Some(binding) = mapping.binding_for(semantic) {
            return Some((*binding, MatchKind::DPadFallback));
        }
    }

    log::warn!("unable to resolve {semantic} from {captured} with mapping {mapping}");
    None
}

fn is_dpad(control: Control) -> bool {
    matches!(control, Control::Button(button) if button.is_dpad())
}
