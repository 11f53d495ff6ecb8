//! # Steel Bill
//!
//! Collects one entry per distinct bar specification drawn for an element and
//! numbers them with marks.
//!
//! Recording the same specification twice keeps a single entry: the record
//! itself is deduplicated, its quantity is not summed. Marks are always the
//! contiguous sequence `1..=N` in first-seen order.
//!
//! ```rust
//! use rebar_core::bill::{SteelBill, SteelGrade};
//!
//! let mut bill = SteelBill::new();
//! assert_eq!(bill.record("B-1", 20, 2, 4076, SteelGrade::B500SP), 1);
//! assert_eq!(bill.record("B-1", 12, 3, 3895, SteelGrade::B500SP), 2);
//! assert_eq!(bill.record("B-1", 20, 2, 4076, SteelGrade::B500SP), 1);
//! assert_eq!(bill.len(), 2);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Reinforcing steel grade
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SteelGrade {
    /// Ribbed bar, class C ductility (main bars)
    B500SP,
    /// Ribbed bar, class A ductility (stirrups)
    B500A,
    /// Ribbed bar, class B ductility
    B500B,
    /// Any other designation
    Other(String),
}

impl SteelGrade {
    /// Designation as printed in the schedule header
    pub fn designation(&self) -> &str {
        match self {
            SteelGrade::B500SP => "B500SP",
            SteelGrade::B500A => "B500A",
            SteelGrade::B500B => "B500B",
            SteelGrade::Other(name) => name,
        }
    }
}

impl fmt::Display for SteelGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.designation())
    }
}

impl FromStr for SteelGrade {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_uppercase().as_str() {
            "B500SP" => SteelGrade::B500SP,
            "B500A" => SteelGrade::B500A,
            "B500B" => SteelGrade::B500B,
            _ => SteelGrade::Other(s.trim().to_string()),
        })
    }
}

/// One bar specification of the bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SteelBillEntry {
    pub element_name: String,
    /// Sequential mark, 1-based
    pub mark: u32,
    pub diameter_mm: u32,
    /// Bars per element
    pub quantity: u32,
    /// Unrolled length of one bar
    pub length_mm: u32,
    pub grade: SteelGrade,
}

impl SteelBillEntry {
    /// Everything but the mark
    fn same_specification(&self, other: &SteelBillEntry) -> bool {
        self.element_name == other.element_name
            && self.diameter_mm == other.diameter_mm
            && self.quantity == other.quantity
            && self.length_mm == other.length_mm
            && self.grade == other.grade
    }
}

/// Ordered, deduplicated bill of reinforcement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SteelBill {
    entries: Vec<SteelBillEntry>,
}

impl SteelBill {
    pub fn new() -> Self {
        SteelBill::default()
    }

    /// Record a bar specification and return its mark.
    ///
    /// A specification equal in every field to an existing entry is not
    /// added again; the existing mark is returned.
    pub fn record(
        &mut self,
        element_name: impl Into<String>,
        diameter_mm: u32,
        quantity: u32,
        length_mm: u32,
        grade: SteelGrade,
    ) -> u32 {
        let candidate = SteelBillEntry {
            element_name: element_name.into(),
            mark: 0,
            diameter_mm,
            quantity,
            length_mm,
            grade,
        };
        self.insert(candidate)
    }

    /// Merge another bill; entries keep this bill's marks first.
    pub fn extend(&mut self, other: &SteelBill) {
        for entry in &other.entries {
            self.insert(entry.clone());
        }
    }

    fn insert(&mut self, mut candidate: SteelBillEntry) -> u32 {
        if let Some(existing) = self.entries.iter().find(|e| e.same_specification(&candidate)) {
            log::debug!("bill: {} ø{} already recorded as mark {}", existing.element_name, existing.diameter_mm, existing.mark);
            return existing.mark;
        }
        candidate.mark = self.entries.len() as u32 + 1;
        log::debug!(
            "bill: mark {} = {} x ø{} L={} mm {}",
            candidate.mark,
            candidate.quantity,
            candidate.diameter_mm,
            candidate.length_mm,
            candidate.grade
        );
        let mark = candidate.mark;
        self.entries.push(candidate);
        self.renumber();
        mark
    }

    /// Keep marks contiguous in insertion order
    fn renumber(&mut self) {
        for (index, entry) in self.entries.iter_mut().enumerate() {
            entry.mark = index as u32 + 1;
        }
    }

    pub fn entries(&self) -> &[SteelBillEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry carrying the given mark
    pub fn by_mark(&self, mark: u32) -> Option<&SteelBillEntry> {
        self.entries.iter().find(|e| e.mark == mark)
    }
}
