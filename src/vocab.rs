//! Fixed command vocabularies of the automation language.
//!
//! Four disjoint sets of upper-case command names, built once and looked up
//! by exact match:
//!
//! | Set | Use |
//! |-----|-----|
//! | [`ACTION_COMMANDS`] | Ordinary statements (`START`, `SLUT`, `ATN`, ...) |
//! | [`LOGIC_COMMANDS`] | Logic-block keywords (`OMM`, `FAL`, `DAA`, `SLT`, ...) |
//! | [`PREFIX_COMMANDS`] | Valid only as the left part of `PREFIX_SUFFIX` |
//! | [`CONDITION_COMMANDS`] | Condition tests (`QST`, `EXT`, `VTN`, ...) |

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

pub static ACTION_COMMANDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "START", "INTIME", "INTRSIG", "DESSIG", "TRINF", "RPS", "SIG", "STN", "DGN", "HTR", "KVR",
        "ALT", "NRM", "TBN", "TDN", "TRN", "TVN", "STO", "SLUT", "ATI", "ATR", "ATE", "ASV", "ADL",
        "ANO", "AOK", "KLF", "TRH", "TRF", "VRK", "UTL", "SIS", "SIL", "SIU", "PSS", "SAT", "SAU",
        "VXH", "VXV", "VXL", "VXC", "VXS", "VXF", "VFT", "VST", "VSF", "VSL", "VSC", "VFF", "ASS",
        "ASN", "LAT", "LAU", "LOT", "LOU", "VVH", "VVU", "VVQ", "VVD", "VVT", "VVF", "RES", "NOR",
        "ABC", "LEA", "LEB", "TOT", "PAR", "TLS", "TLF", "BTV", "TNB", "TNR", "TNV", "TND", "TNX",
        "ATN", "HOP",
    ]
    .into_iter()
    .collect()
});

pub static LOGIC_COMMANDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["OMM", "FAL", "VAN", "NAR", "ELR", "UTF", "ANS", "DAA", "SLT"]
        .into_iter()
        .collect()
});

pub static PREFIX_COMMANDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "START", "SIG", "STN", "DGN", "HTR", "KVR", "ALT", "TBN", "TDN", "BTK", "VKP", "RAK", "TLS",
        "TLF", "TSF", "TSS", "BTV", "TOP", "NSI",
    ]
    .into_iter()
    .collect()
});

pub static CONDITION_COMMANDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "QST", "QMI", "QEQ", "QNT", "QAV", "QAE", "QAT", "QRT", "QDA", "QTB", "QTE", "QTS", "QTT",
        "QMB", "QEM", "QMS", "QME", "QSK", "QSS", "QSH", "QSE", "QSA", "QSM", "QLB", "QLF", "QLI",
        "QLU", "QLL", "QLO", "QLN", "QLS", "QSB", "QSF", "QSP", "QES", "QVH", "QVV", "QVL", "QVE",
        "QDN", "EXT", "EXF", "EXN", "EXM", "EXP", "EXH", "EXL", "VTN", "VTS", "VTM", "VTL", "VTP",
    ]
    .into_iter()
    .collect()
});

/// The four statements that open a logic block (closed by `SLT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicKind {
    Omm,
    Fal,
    Van,
    Nar,
}

impl LogicKind {
    /// Parse an already upper-cased command token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "OMM" => Some(Self::Omm),
            "FAL" => Some(Self::Fal),
            "VAN" => Some(Self::Van),
            "NAR" => Some(Self::Nar),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Omm => "OMM",
            Self::Fal => "FAL",
            Self::Van => "VAN",
            Self::Nar => "NAR",
        }
    }
}

impl fmt::Display for LogicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True if `token` is a compound `PREFIX_SUFFIX` whose prefix is in
/// [`PREFIX_COMMANDS`]. The suffix may be empty.
pub fn is_prefix_token(token: &str) -> bool {
    match token.split_once('_') {
        Some((prefix, _)) => PREFIX_COMMANDS.contains(prefix),
        None => false,
    }
}

/// True if `token` is a member of any vocabulary or a valid compound token.
pub fn is_known_token(token: &str) -> bool {
    is_prefix_token(token)
        || ACTION_COMMANDS.contains(token)
        || LOGIC_COMMANDS.contains(token)
        || CONDITION_COMMANDS.contains(token)
}
