//! Attendance ledger: per-identity present/absent record for one run.
//!
//! Populated from the roster at startup and mutated only by
//! [`AttendanceLedger::mark_present`]; an identity never returns to absent
//! within a run. Exported as a flat two-column table.

use crate::roster::Roster;
use std::io::{self, Write};
use std::path::Path;

const EXPORT_HEADER: &str = "Student ID, Attendance";

#[derive(Debug, Clone)]
struct LedgerEntry {
    identity: String,
    present: bool,
}

/// Present/absent record, one entry per enrolled identity, in enrollment
/// order.
#[derive(Debug, Default)]
pub struct AttendanceLedger {
    entries: Vec<LedgerEntry>,
}

impl AttendanceLedger {
    /// Initialize every enrolled identity as absent, preserving roster
    /// order. The ledger and the roster hold exactly the same identities.
    pub fn from_roster(roster: &Roster) -> Self {
        Self {
            entries: roster
                .identities()
                .map(|identity| LedgerEntry {
                    identity: identity.to_string(),
                    present: false,
                })
                .collect(),
        }
    }

    /// Flip an identity to present. Idempotent: marking an already-present
    /// identity changes nothing. Unknown identities are ignored.
    ///
    /// Returns `true` only when the identity transitioned absent to present.
    pub fn mark_present(&mut self, identity: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.identity == identity) {
            Some(entry) if !entry.present => {
                entry.present = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_present(&self, identity: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|e| e.identity == identity)
            .map(|e| e.present)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn present_count(&self) -> usize {
        self.entries.iter().filter(|e| e.present).count()
    }

    /// (identity, present) pairs in enrollment order.
    pub fn snapshot(&self) -> Vec<(String, bool)> {
        self.entries
            .iter()
            .map(|e| (e.identity.clone(), e.present))
            .collect()
    }

    /// Write the export table: a header line, then one row per identity in
    /// enrollment order. N entries produce N+1 lines.
    pub fn write_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "{EXPORT_HEADER}")?;
        for entry in &self.entries {
            let state = if entry.present { "Present" } else { "Absent" };
            writeln!(out, "{},{state}", entry.identity)?;
        }
        Ok(())
    }

    /// Export to a file, replacing any previous snapshot at that path.
    pub fn save_csv(&self, path: &Path) -> io::Result<()> {
        let file = std::fs::File::create(path)?;
        let mut out = io::BufWriter::new(file);
        self.write_csv(&mut out)?;
        out.flush()?;
        tracing::info!(
            path = %path.display(),
            present = self.present_count(),
            total = self.len(),
            "attendance exported"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Signature;

    fn roster(identities: &[&str]) -> Roster {
        let mut roster = Roster::new();
        for id in identities {
            roster.enroll(*id, Signature::default());
        }
        roster
    }

    #[test]
    fn test_initialized_absent_in_roster_order() {
        let ledger = AttendanceLedger::from_roster(&roster(&["A001", "A002", "B001"]));
        assert_eq!(
            ledger.snapshot(),
            vec![
                ("A001".to_string(), false),
                ("A002".to_string(), false),
                ("B001".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_mark_present_is_idempotent() {
        let mut ledger = AttendanceLedger::from_roster(&roster(&["A001", "A002"]));
        assert!(ledger.mark_present("A001"));
        let snapshot = ledger.snapshot();
        assert!(!ledger.mark_present("A001"));
        assert_eq!(ledger.snapshot(), snapshot);
    }

    #[test]
    fn test_present_is_monotonic() {
        let mut ledger = AttendanceLedger::from_roster(&roster(&["A001"]));
        ledger.mark_present("A001");
        ledger.mark_present("A001");
        assert_eq!(ledger.is_present("A001"), Some(true));
        assert_eq!(ledger.present_count(), 1);
    }

    #[test]
    fn test_unknown_identity_ignored() {
        let mut ledger = AttendanceLedger::from_roster(&roster(&["A001"]));
        assert!(!ledger.mark_present("nobody"));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.is_present("nobody"), None);
    }

    #[test]
    fn test_csv_shape() {
        let mut ledger = AttendanceLedger::from_roster(&roster(&["A001", "A002", "A003"]));
        ledger.mark_present("A002");

        let mut buf = Vec::new();
        ledger.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Student ID, Attendance");
        assert_eq!(lines[1], "A001,Absent");
        assert_eq!(lines[2], "A002,Present");
        assert_eq!(lines[3], "A003,Absent");
    }

    #[test]
    fn test_csv_round_trip() {
        let mut ledger = AttendanceLedger::from_roster(&roster(&["A001", "A002", "B001"]));
        ledger.mark_present("B001");

        let mut buf = Vec::new();
        ledger.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let parsed: Vec<(String, bool)> = text
            .lines()
            .skip(1)
            .map(|line| {
                let (id, state) = line.split_once(',').unwrap();
                (id.to_string(), state == "Present")
            })
            .collect();

        assert_eq!(parsed, ledger.snapshot());
    }

    #[test]
    fn test_save_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attendance.csv");

        let mut ledger = AttendanceLedger::from_roster(&roster(&["A001"]));
        ledger.mark_present("A001");
        ledger.save_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Student ID, Attendance\nA001,Present\n");
    }
}
