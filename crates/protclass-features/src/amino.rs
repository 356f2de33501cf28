use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Column order of AAindex1 value blocks.
pub const AAINDEX_ORDER: [char; 20] = [
    'A', 'R', 'N', 'D', 'C', 'Q', 'E', 'G', 'H', 'I', 'L', 'K', 'M', 'F', 'P', 'S', 'T', 'W',
    'Y', 'V',
];

/// The twenty standard amino acids by three-letter code.
#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum AminoAcid {
    ALA, ARG, ASN, ASP, CYS,
    GLN, GLU, GLY, HIS, ILE,
    LEU, LYS, MET, PHE, PRO,
    SER, THR, TRP, TYR, VAL,
}

impl AminoAcid {
    #[rustfmt::skip]
    pub const fn code1(&self) -> char {
        match self {
            Self::ALA => 'A', Self::ARG => 'R', Self::ASN => 'N', Self::ASP => 'D',
            Self::CYS => 'C', Self::GLN => 'Q', Self::GLU => 'E', Self::GLY => 'G',
            Self::HIS => 'H', Self::ILE => 'I', Self::LEU => 'L', Self::LYS => 'K',
            Self::MET => 'M', Self::PHE => 'F', Self::PRO => 'P', Self::SER => 'S',
            Self::THR => 'T', Self::TRP => 'W', Self::TYR => 'Y', Self::VAL => 'V',
        }
    }

    /// Parse a three-letter code, ignoring surrounding whitespace and case.
    pub fn from_code3(code: &str) -> Option<Self> {
        code.trim().parse().ok()
    }

    pub fn from_code1(code: char) -> Option<Self> {
        let code = code.to_ascii_uppercase();
        AminoAcid::iter().find(|aa| aa.code1() == code)
    }

    /// Position in [`AAINDEX_ORDER`].
    pub fn aaindex_position(&self) -> usize {
        let c = self.code1();
        AAINDEX_ORDER
            .iter()
            .position(|&o| o == c)
            .unwrap_or_default()
    }
}
