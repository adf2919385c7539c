use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ScoringError;

macro_rules! phone_inventory {
    ($($variant:ident => $label:literal),+ $(,)?) => {
        /// Context-independent phone of the acoustic model's inventory.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum PhoneSymbol {
            $($variant),+
        }

        impl PhoneSymbol {
            /// Whole inventory in canonical (alphabetical) order.
            pub const ALL: &'static [PhoneSymbol] = &[$(PhoneSymbol::$variant),+];

            /// Label as the acoustic model spells it.
            pub fn label(self) -> &'static str {
                match self {
                    $(PhoneSymbol::$variant => $label),+
                }
            }
        }
    };
}

phone_inventory! {
    Aa => "AA", Ae => "AE", Ah => "AH", Ao => "AO", Aw => "AW", Ay => "AY",
    B => "B", Ch => "CH", D => "D", Dh => "DH", Eh => "EH", Er => "ER",
    Ey => "EY", F => "F", G => "G", Hh => "HH", Ih => "IH", Iy => "IY",
    Jh => "JH", K => "K", L => "L", M => "M", N => "N", Ng => "NG",
    Ow => "OW", Oy => "OY", P => "P", R => "R", S => "S", Sh => "SH",
    Sil => "SIL", T => "T", Th => "TH", Uh => "UH", Uw => "UW", V => "V",
    W => "W", Y => "Y", Z => "Z", Zh => "ZH",
}

impl PhoneSymbol {
    pub fn is_silence(self) -> bool {
        self == PhoneSymbol::Sil
    }

    /// Lower-case stem used for recogniser grammar tokens.
    pub fn token_stem(self) -> String {
        self.label().to_ascii_lowercase()
    }
}

impl Display for PhoneSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PhoneSymbol {
    type Err = ScoringError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        PhoneSymbol::ALL
            .iter()
            .copied()
            .find(|phone| phone.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ScoringError::alignment(format!("unknown phone label \"{raw}\"")))
    }
}

impl TryFrom<String> for PhoneSymbol {
    type Error = ScoringError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<PhoneSymbol> for String {
    fn from(phone: PhoneSymbol) -> Self {
        phone.label().to_string()
    }
}
