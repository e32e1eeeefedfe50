//! Parsing the sense command's XML reply into an on/off state.
//!
//! The CCU's XML-API answers a state query with a document like
//!
//! ```xml
//! <state>
//!   <datapoint ise_id="1235" value="true" valuetype="2" timestamp="1700000000"/>
//! </state>
//! ```
//!
//! Only the first `datapoint` directly below the root is consulted.

use crate::error::BridgeError;

/// How the raw `value` attribute is turned into a boolean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StateCoercion {
    /// `1`, `true` or `on` (ASCII case-insensitive, surrounding whitespace
    /// ignored) is on; everything else is off.
    #[default]
    Strict,
    /// Any non-empty value is on, including `"0"` and `"false"`. Matches the
    /// behaviour of the first plugin release.
    NonEmpty,
}

impl StateCoercion {
    pub fn coerce(self, raw: Option<&str>) -> bool {
        let Some(raw) = raw else {
            return false;
        };
        match self {
            StateCoercion::Strict => {
                let v = raw.trim();
                v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("on")
            }
            StateCoercion::NonEmpty => !raw.is_empty(),
        }
    }
}

/// Extract the `value` attribute of the first root-level `datapoint` element.
///
/// Returns `Ok(None)` when the element exists but carries no `value`.
pub fn datapoint_value(xml: &str) -> Result<Option<String>, BridgeError> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(xml, options).map_err(|e| BridgeError::Xml {
        detail: e.to_string(),
    })?;

    // Only an unqualified `datapoint` counts; `<ns:datapoint>` does not.
    let datapoint = doc
        .root_element()
        .children()
        .find(|n| {
            n.is_element()
                && n.tag_name().namespace().is_none()
                && n.tag_name().name() == "datapoint"
        })
        .ok_or(BridgeError::MissingDatapoint)?;

    Ok(datapoint.attribute("value").map(str::to_string))
}
