use ahash::AHashMap;
use padlink_guid::{ControllerIdentity, WrappedDriver};

use crate::capture::InputCaptureSet;
use crate::record::{InputElement, InputKind};

type Code = (InputKind, u32, i32);

/// Translates native codes captured through a raw HID driver into the codes
/// the legacy API reports for the same physical input.
#[derive(Debug, Clone, Default)]
pub struct HidToLegacyTranslator {
    by_device: AHashMap<(u16, u16), AHashMap<Code, InputElement>>,
}

impl HidToLegacyTranslator {
    /// For each raw HID capture, pairs its inputs with the same-named
    /// inputs of every legacy capture sharing its vendor and product id.
    /// Only codes that differ are recorded.
    pub fn build(captures: &InputCaptureSet) -> Self {
        let mut by_device: AHashMap<(u16, u16), AHashMap<Code, InputElement>> = AHashMap::new();

        let raw = captures.devices.iter().filter(|d| d.identity.driver().is_raw_hid());
        for hid in raw {
            let ids = (hid.identity.vendor_id(), hid.identity.product_id());
            let legacy = captures.devices.iter().filter(|d| {
                d.identity.driver() == WrappedDriver::Legacy
                    && (d.identity.vendor_id(), d.identity.product_id()) == ids
            });
            for legacy in legacy {
                for input in &hid.inputs {
                    let Some(target) = legacy.input(&input.name) else {
                        continue;
                    };
                    if target.code() != input.element.code() {
                        by_device.entry(ids).or_default().insert(input.element.code(), *target);
                    }
                }
            }
        }

        Self { by_device }
    }

    /// Legacy code for `input` on the device with `identity`; `input`
    /// itself when nothing is recorded. Only identities of a raw HID driver
    /// carry native codes, anything else already reports legacy codes.
    pub fn translate(&self, identity: &ControllerIdentity, input: InputElement) -> InputElement {
        if !identity.driver().is_raw_hid() {
            return input;
        }
        self.by_device
            .get(&(identity.vendor_id(), identity.product_id()))
            .and_then(|table| table.get(&input.code()))
            .copied()
            .unwrap_or(input)
    }

    pub fn is_empty(&self) -> bool {
        self.by_device.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::tests::CAPTURES;

    fn translator() -> HidToLegacyTranslator {
        HidToLegacyTranslator::build(&InputCaptureSet::parse(CAPTURES).expect("captures"))
    }

    #[test]
    fn records_only_differing_codes() {
        let translator = translator();
        let id = ControllerIdentity::parse("030000004c050000cc09000000007200");
        assert_eq!(translator.translate(&id, InputElement::button(0)), InputElement::button(1));
        assert_eq!(translator.translate(&id, InputElement::button(1)), InputElement::button(2));
        assert_eq!(translator.translate(&id, InputElement::hat(0, 1)), InputElement::hat(0, 1));
        assert_eq!(translator.translate(&id, InputElement::axis(1, -1)), InputElement::axis(1, -1));
    }

    #[test]
    fn unknown_devices_and_codes_pass_through() {
        let translator = translator();
        let other = ControllerIdentity::parse("030000005e0400008e02000000000000");
        assert_eq!(translator.translate(&other, InputElement::button(0)), InputElement::button(0));
        let id = ControllerIdentity::parse("030000004c050000cc09000000007200");
        assert_eq!(translator.translate(&id, InputElement::button(9)), InputElement::button(9));
    }

    #[test]
    fn legacy_identity_of_captured_device_is_not_translated() {
        let translator = translator();
        let legacy = ControllerIdentity::parse("030000004c050000cc09000000000000");
        assert_eq!(translator.translate(&legacy, InputElement::button(0)), InputElement::button(0));
        assert_eq!(translator.translate(&legacy, InputElement::button(1)), InputElement::button(1));
    }

    #[test]
    fn empty_captures_build_empty_translator() {
        assert!(HidToLegacyTranslator::build(&InputCaptureSet::default()).is_empty());
    }
}
