//! Placeholder values per value representation.

use dicom_core::value::{DataSetSequence, Value};
use dicom_core::{Length, PrimitiveValue, Tag, VR};
use dicom_object::InMemDicomObject;
use dicom_object::mem::InMemFragment;
use std::str::FromStr;

use crate::actions::errors::ActionError;

pub type ElementValue = Value<InMemDicomObject, InMemFragment>;

const DUMMY_UID: &str = "1.2.3.4.5.6.7.8.9.0.1.2.3.4.5.6.7.8.9.0";

/// Returns the dummy value for the given value representation.
///
/// Textual representations get a fixed placeholder string, numeric ones a zero of the
/// right width and signedness, binary ones a single zero item and sequences an empty
/// sequence.
pub fn dummy_value(vr: VR) -> ElementValue {
    let primitive = match vr {
        VR::AE => PrimitiveValue::from("DUMMY_AE"),
        VR::AS => PrimitiveValue::from("030Y"),
        VR::AT => PrimitiveValue::Tags([Tag(0x0000, 0x0000)].into_iter().collect()),
        VR::CS => PrimitiveValue::from("DUMMY"),
        VR::DA => PrimitiveValue::from("20000101"),
        VR::DS => PrimitiveValue::from("0.0"),
        VR::DT => PrimitiveValue::from("20000101120000.000000"),
        VR::FL => PrimitiveValue::from(0.0_f32),
        VR::FD => PrimitiveValue::from(0.0_f64),
        VR::IS => PrimitiveValue::from("0"),
        VR::LO => PrimitiveValue::from("DUMMY_LONG_STRING"),
        VR::LT => PrimitiveValue::from("DUMMY LONG TEXT"),
        VR::OB | VR::UN => PrimitiveValue::U8([0x00].into_iter().collect()),
        VR::OD => PrimitiveValue::F64([0.0].into_iter().collect()),
        VR::OF => PrimitiveValue::F32([0.0].into_iter().collect()),
        VR::OL => PrimitiveValue::U32([0x0000_0000].into_iter().collect()),
        VR::OV => PrimitiveValue::U64([0].into_iter().collect()),
        VR::OW => PrimitiveValue::U16([0x0000].into_iter().collect()),
        VR::PN => PrimitiveValue::from("DUMMY^PATIENT^^^"),
        VR::SH => PrimitiveValue::from("DUMMY"),
        VR::SL => PrimitiveValue::from(0_i32),
        VR::SQ => {
            return Value::Sequence(DataSetSequence::new(
                Vec::<InMemDicomObject>::new(),
                Length::UNDEFINED,
            ));
        }
        VR::SS => PrimitiveValue::from(0_i16),
        VR::ST => PrimitiveValue::from("DUMMY SHORT TEXT"),
        VR::SV => PrimitiveValue::from(0_i64),
        VR::TM => PrimitiveValue::from("120000.000000"),
        VR::UC => PrimitiveValue::from("DUMMY UNLIMITED CHARACTERS"),
        VR::UI => PrimitiveValue::from(DUMMY_UID),
        VR::UL => PrimitiveValue::from(0_u32),
        VR::UR => PrimitiveValue::from("http://dummy.example.com"),
        VR::US => PrimitiveValue::from(0_u16),
        VR::UT => PrimitiveValue::from("DUMMY UNLIMITED TEXT"),
        VR::UV => PrimitiveValue::from(0_u64),
    };
    Value::Primitive(primitive)
}

/// Returns the dummy value for a textual value representation code such as `"LO"`.
///
/// Fails with [`ActionError::UnsupportedRepresentation`] for codes that are not a
/// known value representation.
pub fn dummy_value_for_code(code: &str) -> Result<ElementValue, ActionError> {
    let vr = VR::from_str(code)
        .map_err(|_| ActionError::UnsupportedRepresentation(code.to_string()))?;
    Ok(dummy_value(vr))
}

/// Whether values of this representation are character strings, i.e. can hold an
/// identifier string.
pub(crate) fn is_textual(vr: VR) -> bool {
    matches!(
        vr,
        VR::AE
            | VR::AS
            | VR::CS
            | VR::DA
            | VR::DS
            | VR::DT
            | VR::IS
            | VR::LO
            | VR::LT
            | VR::PN
            | VR::SH
            | VR::ST
            | VR::TM
            | VR::UC
            | VR::UI
            | VR::UR
            | VR::UT
    )
}
