//! The icon-layout enum from the blueprint header's first field (spec
//! GLOSSARY, §6).

use crate::errors::BlueprintError;

/// How 0–5 icons are arranged on a blueprint's thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum IconLayout {
    None = 0,
    NoIcon = 1,
    OneIcon = 10,
    OneIconSmall = 11,
    TwoIcon46 = 20,
    TwoIcon53 = 21,
    TwoIcon59 = 22,
    TwoIcon57 = 23,
    TwoIcon51 = 24,
    ThreeIcon813 = 30,
    ThreeIcon279 = 31,
    ThreeIcon573 = 32,
    ThreeIcon591 = 33,
    FourIcon7913 = 40,
    FourIcon8462 = 41,
    FiveIcon57913 = 50,
    FiveIconPenta = 51,
}

impl TryFrom<i32> for IconLayout {
    type Error = BlueprintError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => IconLayout::None,
            1 => IconLayout::NoIcon,
            10 => IconLayout::OneIcon,
            11 => IconLayout::OneIconSmall,
            20 => IconLayout::TwoIcon46,
            21 => IconLayout::TwoIcon53,
            22 => IconLayout::TwoIcon59,
            23 => IconLayout::TwoIcon57,
            24 => IconLayout::TwoIcon51,
            30 => IconLayout::ThreeIcon813,
            31 => IconLayout::ThreeIcon279,
            32 => IconLayout::ThreeIcon573,
            33 => IconLayout::ThreeIcon591,
            40 => IconLayout::FourIcon7913,
            41 => IconLayout::FourIcon8462,
            50 => IconLayout::FiveIcon57913,
            51 => IconLayout::FiveIconPenta,
            other => {
                return Err(BlueprintError::EnvelopeSyntax(format!(
                    "unrecognized icon layout code {other}"
                )));
            }
        })
    }
}

impl From<IconLayout> for i32 {
    fn from(value: IconLayout) -> Self {
        value as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_named_value() {
        for code in [
            0, 1, 10, 11, 20, 21, 22, 23, 24, 30, 31, 32, 33, 40, 41, 50, 51,
        ] {
            let layout = IconLayout::try_from(code).unwrap();
            assert_eq!(i32::from(layout), code);
        }
    }

    #[test]
    fn unrecognized_code_is_envelope_syntax() {
        assert!(matches!(
            IconLayout::try_from(99),
            Err(BlueprintError::EnvelopeSyntax(_))
        ));
    }
}
