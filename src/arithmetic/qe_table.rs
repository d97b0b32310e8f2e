//! Probability estimation table for the MQ-coder.
//!
//! JBIG2 Spec: ITU-T T.88 (ISO/IEC 14492), Annex E, Table E.1 - Qe values
//! and probability estimation process. The same table drives the JPEG 2000
//! MQ-coder (ITU-T T.800 Table C.2).

/// Number of probability estimation states.
pub const STATE_COUNT: usize = 47;

/// One row of the probability estimation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QeEntry {
    /// Probability estimate of the less probable symbol
    pub qe: u32,
    /// Next state after coding an MPS
    pub nmps: u8,
    /// Next state after coding an LPS
    pub nlps: u8,
    /// Whether coding an LPS in this state exchanges the MPS sense
    pub switch: bool,
}

const fn e(qe: u32, nmps: u8, nlps: u8, switch: u8) -> QeEntry {
    QeEntry {
        qe,
        nmps,
        nlps,
        switch: switch == 1,
    }
}

/// Table E.1, indexed by state.
#[rustfmt::skip]
pub const QE_TABLE: [QeEntry; STATE_COUNT] = [
    e(0x5601,  1,  1, 1),
    e(0x3401,  2,  6, 0),
    e(0x1801,  3,  9, 0),
    e(0x0AC1,  4, 12, 0),
    e(0x0521,  5, 29, 0),
    e(0x0221, 38, 33, 0),
    e(0x5601,  7,  6, 1),
    e(0x5401,  8, 14, 0),
    e(0x4801,  9, 14, 0),
    e(0x3801, 10, 14, 0),
    e(0x3001, 11, 17, 0),
    e(0x2401, 12, 18, 0),
    e(0x1C01, 13, 20, 0),
    e(0x1601, 29, 21, 0),
    e(0x5601, 15, 14, 1),
    e(0x5401, 16, 14, 0),
    e(0x5101, 17, 15, 0),
    e(0x4801, 18, 16, 0),
    e(0x3801, 19, 17, 0),
    e(0x3401, 20, 18, 0),
    e(0x3001, 21, 19, 0),
    e(0x2801, 22, 19, 0),
    e(0x2401, 23, 20, 0),
    e(0x2201, 24, 21, 0),
    e(0x1C01, 25, 22, 0),
    e(0x1801, 26, 23, 0),
    e(0x1601, 27, 24, 0),
    e(0x1401, 28, 25, 0),
    e(0x1201, 29, 26, 0),
    e(0x1101, 30, 27, 0),
    e(0x0AC1, 31, 28, 0),
    e(0x09C1, 32, 29, 0),
    e(0x08A1, 33, 30, 0),
    e(0x0521, 34, 31, 0),
    e(0x0441, 35, 32, 0),
    e(0x02A1, 36, 33, 0),
    e(0x0221, 37, 34, 0),
    e(0x0141, 38, 35, 0),
    e(0x0111, 39, 36, 0),
    e(0x0085, 40, 37, 0),
    e(0x0049, 41, 38, 0),
    e(0x0025, 42, 39, 0),
    e(0x0015, 43, 40, 0),
    e(0x0009, 44, 41, 0),
    e(0x0005, 45, 42, 0),
    e(0x0001, 45, 43, 0),
    // Terminal state used by the encoder flush; never adapts
    e(0x5601, 46, 46, 0),
];
