//! Tabular import of participants, prizes and winners
//!
//! The spreadsheet codec is external: it hands over one `TabularRow`
//! (header → cell text) per sheet row. Headers are matched against a list
//! of aliases, so both the English and the Chinese column titles of the
//! event templates are accepted.
//!
//! Rows that cannot be used are skipped with a warning; the import goes on.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pd_core::{Participant, ParticipantId, Prize, PrizeId, Winner, WinnerId};

use crate::WinnerRow;

// ============ Column Aliases ============

const NAME: &[&str] = &["姓名", "name"];
const DEPARTMENT: &[&str] = &["部門", "department"];
const TITLE: &[&str] = &["職稱", "title"];

const PRIZE_NAME: &[&str] = &["獎項名稱", "prize", "prize_name", "name"];
const QUANTITY: &[&str] = &["數量", "總數量", "quantity"];
const EXCLUDE_WINNERS: &[&str] = &["排除已中獎者", "exclude_winners"];

const WINNER_ID: &[&str] = &["中獎ID", "winner_id", "id"];
const WINNER_PRIZE_ID: &[&str] = &["獎項ID", "prize_id"];
const WINNER_PRIZE_NAME: &[&str] = &["獎項名稱", "prize_name", "prize"];
const WINNER_PARTICIPANT_ID: &[&str] = &["得獎者ID", "參與者ID", "participant_id"];
const WINNER_PARTICIPANT_NAME: &[&str] = &["得獎者姓名", "姓名", "participant_name", "name"];
const DRAWN_AT: &[&str] = &["中獎時間", "drawn_at"];
const CONFIRMED: &[&str] = &["已確認", "confirmed"];

// ============ Rows ============

/// One spreadsheet row: header → trimmed cell text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabularRow(BTreeMap<String, String>);

impl TabularRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, header: impl Into<String>, cell: impl Into<String>) {
        self.0.insert(header.into().trim().to_string(), cell.into());
    }

    /// First non-blank cell under any of `aliases`
    pub fn get(&self, aliases: &[&str]) -> Option<&str> {
        aliases
            .iter()
            .filter_map(|alias| self.0.get(*alias))
            .map(|cell| cell.trim())
            .find(|cell| !cell.is_empty())
    }

    fn text(&self, aliases: &[&str]) -> String {
        self.get(aliases).unwrap_or_default().to_string()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TabularRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (header, cell) in iter {
            row.insert(header, cell);
        }
        row
    }
}

fn parse_flag(cell: &str) -> Option<bool> {
    match cell.to_lowercase().as_str() {
        "是" | "true" | "yes" | "y" | "1" => Some(true),
        "否" | "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

// ============ Report ============

/// How an import went as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportOutcome {
    /// Every row imported
    Complete,
    /// Some rows imported, some skipped
    Partial,
    /// Nothing imported; the session was left unchanged
    Failed,
}

/// Entities parsed from a sheet plus what was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport<T> {
    pub entities: Vec<T>,
    pub total_rows: usize,
    pub skipped_rows: usize,
    pub warnings: Vec<String>,
}

impl<T> ImportReport<T> {
    fn new(total_rows: usize) -> Self {
        Self {
            entities: Vec::new(),
            total_rows,
            skipped_rows: 0,
            warnings: Vec::new(),
        }
    }

    fn skip(&mut self, warning: String) {
        log::warn!("Import: {}", warning);
        self.skipped_rows += 1;
        self.warnings.push(warning);
    }

    pub fn outcome(&self) -> ImportOutcome {
        if self.entities.is_empty() {
            ImportOutcome::Failed
        } else if self.skipped_rows > 0 {
            ImportOutcome::Partial
        } else {
            ImportOutcome::Complete
        }
    }
}

// ============ Participants & Prizes ============

/// Participants from a sheet. Rows without a name are skipped.
pub fn parse_participants(rows: &[TabularRow]) -> ImportReport<Participant> {
    let mut report = ImportReport::new(rows.len());
    for (index, row) in rows.iter().enumerate() {
        match Participant::new(&row.text(NAME), &row.text(DEPARTMENT), &row.text(TITLE)) {
            Some(participant) => report.entities.push(participant),
            None => report.skip(format!("Row {}: missing participant name", index + 1)),
        }
    }
    report
}

/// Leading digits of a cell: `"3"`, `"3.0"` and `"3 units"` all read 3
fn leading_integer(cell: &str) -> Option<u32> {
    let cell = cell.trim_start();
    let cell = cell.strip_prefix('+').unwrap_or(cell);
    let end = cell
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(cell.len(), |(i, _)| i);
    cell[..end].parse().ok()
}

/// Prizes from a sheet, in row order. Quantity is the cell's leading
/// integer and defaults to 1 when missing or not positive.
pub fn parse_prizes(rows: &[TabularRow]) -> ImportReport<Prize> {
    let mut report = ImportReport::new(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let quantity = row
            .get(QUANTITY)
            .and_then(leading_integer)
            .filter(|q| *q > 0)
            .unwrap_or(1);
        let exclude = row.get(EXCLUDE_WINNERS).and_then(parse_flag).unwrap_or(true);
        let order = report.entities.len();
        match Prize::new(&row.text(PRIZE_NAME), quantity, exclude, order) {
            Some(prize) => report.entities.push(prize),
            None => report.skip(format!("Row {}: missing prize name", index + 1)),
        }
    }
    report
}

// ============ Winners ============

/// Winner rows from a sheet. Cells that are present but unparsable are
/// treated as missing.
pub fn parse_winner_rows(rows: &[TabularRow]) -> Vec<WinnerRow> {
    rows.iter()
        .map(|row| WinnerRow {
            id: row.get(WINNER_ID).map(WinnerId::from),
            prize_id: row.get(WINNER_PRIZE_ID).map(PrizeId::from),
            prize_name: row.text(WINNER_PRIZE_NAME),
            participant_id: row.get(WINNER_PARTICIPANT_ID).map(ParticipantId::from),
            participant_name: row.text(WINNER_PARTICIPANT_NAME),
            department: row.text(DEPARTMENT),
            title: row.text(TITLE),
            drawn_at: row
                .get(DRAWN_AT)
                .and_then(|cell| DateTime::parse_from_rfc3339(cell).ok())
                .map(|t| t.with_timezone(&Utc)),
            confirmed: row.get(CONFIRMED).and_then(parse_flag).unwrap_or(true),
        })
        .collect()
}

/// Match winner rows against the given participants and prizes.
///
/// Prizes resolve by id, else by unique name. Participants resolve by id,
/// else by name, narrowed by department when the name is shared. Rows that
/// match nothing or more than one entity, repeat a winner id, or would
/// overfill their prize are skipped with a warning.
pub fn resolve_winners(
    rows: &[WinnerRow],
    participants: &[Participant],
    prizes: &[Prize],
) -> ImportReport<Winner> {
    let mut report = ImportReport::new(rows.len());
    let mut seen_ids: HashSet<WinnerId> = HashSet::new();
    let mut taken: HashMap<PrizeId, u32> = HashMap::new();

    for (index, row) in rows.iter().enumerate() {
        let line = index + 1;

        let prize = match find_prize(row, prizes) {
            Ok(prize) => prize,
            Err(reason) => {
                report.skip(format!("Row {line}: {reason}"));
                continue;
            }
        };
        let participant = match find_participant(row, participants) {
            Ok(participant) => participant,
            Err(reason) => {
                report.skip(format!("Row {line}: {reason}"));
                continue;
            }
        };

        let id = row.id.clone().unwrap_or_else(WinnerId::generate);
        if seen_ids.contains(&id) {
            report.skip(format!("Row {line}: duplicate winner id {id}"));
            continue;
        }

        let used = taken.entry(prize.id.clone()).or_insert(0);
        if *used >= prize.quantity {
            report.skip(format!(
                "Row {line}: prize '{}' already has {} winner(s)",
                prize.name, prize.quantity
            ));
            continue;
        }
        *used += 1;
        seen_ids.insert(id.clone());

        // Winner keeps the department/title it was recorded with
        let mut snapshot = participant.clone();
        if !row.department.is_empty() {
            snapshot.department = row.department.clone();
        }
        if !row.title.is_empty() {
            snapshot.title = row.title.clone();
        }
        snapshot.has_won = true;

        report.entities.push(Winner {
            id,
            participant: snapshot,
            prize: prize.clone(),
            drawn_at: row.drawn_at.unwrap_or_else(Utc::now),
            confirmed: row.confirmed,
        });
    }

    report
}

fn find_prize<'a>(row: &WinnerRow, prizes: &'a [Prize]) -> Result<&'a Prize, String> {
    if let Some(id) = &row.prize_id {
        if let Some(prize) = prizes.iter().find(|p| &p.id == id) {
            return Ok(prize);
        }
    }
    let matches: Vec<&Prize> = prizes.iter().filter(|p| p.name == row.prize_name).collect();
    match matches.as_slice() {
        [prize] => Ok(*prize),
        [] => Err(format!("unknown prize '{}'", row.prize_name)),
        _ => Err(format!(
            "prize name '{}' is ambiguous ({} matches)",
            row.prize_name,
            matches.len()
        )),
    }
}

fn find_participant<'a>(
    row: &WinnerRow,
    participants: &'a [Participant],
) -> Result<&'a Participant, String> {
    if let Some(id) = &row.participant_id {
        if let Some(participant) = participants.iter().find(|p| &p.id == id) {
            return Ok(participant);
        }
    }
    let mut matches: Vec<&Participant> = participants
        .iter()
        .filter(|p| p.name == row.participant_name)
        .collect();
    if matches.len() > 1 && !row.department.is_empty() {
        matches.retain(|p| p.department == row.department);
    }
    match matches.as_slice() {
        [participant] => Ok(*participant),
        [] => Err(format!("unknown participant '{}'", row.participant_name)),
        _ => Err(format!(
            "participant name '{}' is ambiguous ({} matches)",
            row.participant_name,
            matches.len()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, &str)]) -> TabularRow {
        cells.iter().copied().collect()
    }

    #[test]
    fn test_row_aliases() {
        let r = row(&[("姓名", " Ada "), ("department", "R&D"), ("title", "")]);
        assert_eq!(r.get(NAME), Some("Ada"));
        assert_eq!(r.get(DEPARTMENT), Some("R&D"));
        assert_eq!(r.get(TITLE), None);
    }

    #[test]
    fn test_participants_skip_blank_names() {
        let rows = vec![
            row(&[("name", "Ada"), ("部門", "R&D"), ("職稱", "Engineer")]),
            row(&[("name", "  "), ("department", "Ops")]),
            row(&[("姓名", "Grace")]),
        ];
        let report = parse_participants(&rows);
        assert_eq!(report.entities.len(), 2);
        assert_eq!(report.entities[0].department, "R&D");
        assert_eq!(report.skipped_rows, 1);
        assert_eq!(report.outcome(), ImportOutcome::Partial);
    }

    #[test]
    fn test_prize_quantity_defaults() {
        let rows = vec![
            row(&[("獎項名稱", "Laptop"), ("數量", "3")]),
            row(&[("prize", "Mug"), ("quantity", "lots")]),
            row(&[("name", "Pen"), ("quantity", "0"), ("exclude_winners", "否")]),
        ];
        let report = parse_prizes(&rows);
        assert_eq!(report.outcome(), ImportOutcome::Complete);
        let quantities: Vec<u32> = report.entities.iter().map(|p| p.quantity).collect();
        assert_eq!(quantities, vec![3, 1, 1]);
        let orders: Vec<usize> = report.entities.iter().map(|p| p.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert!(report.entities[0].exclude_winners);
        assert!(!report.entities[2].exclude_winners);
    }

    #[test]
    fn test_prize_quantity_reads_leading_integer() {
        let rows = vec![
            row(&[("prize", "Laptop"), ("quantity", "3.0")]),
            row(&[("prize", "Mug"), ("quantity", "12 units")]),
            row(&[("prize", "Pen"), ("quantity", " +2")]),
            row(&[("prize", "Hat"), ("quantity", "-4")]),
            row(&[("prize", "Car"), ("quantity", "99999999999")]),
        ];
        let report = parse_prizes(&rows);
        let quantities: Vec<u32> = report.entities.iter().map(|p| p.quantity).collect();
        assert_eq!(quantities, vec![3, 12, 2, 1, 1]);

        assert_eq!(leading_integer("7"), Some(7));
        assert_eq!(leading_integer("x7"), None);
        assert_eq!(leading_integer(""), None);
    }

    #[test]
    fn test_empty_sheet_fails() {
        let report = parse_participants(&[]);
        assert_eq!(report.outcome(), ImportOutcome::Failed);
    }

    #[test]
    fn test_resolve_by_name_and_department() {
        let participants = vec![
            Participant::new("Lee", "Sales", "Rep").unwrap(),
            Participant::new("Lee", "Ops", "Lead").unwrap(),
        ];
        let prizes = vec![Prize::new("Laptop", 2, true, 0).unwrap()];

        let rows = parse_winner_rows(&[
            row(&[("prize", "Laptop"), ("name", "Lee"), ("department", "Ops")]),
            row(&[("prize", "Laptop"), ("name", "Lee")]),
        ]);
        let report = resolve_winners(&rows, &participants, &prizes);

        assert_eq!(report.entities.len(), 1);
        assert_eq!(report.entities[0].participant.id, participants[1].id);
        assert!(report.entities[0].participant.has_won);
        assert_eq!(report.skipped_rows, 1);
        assert!(report.warnings[0].contains("ambiguous"));
    }

    #[test]
    fn test_resolve_skips_duplicates_and_overfill() {
        let participants = vec![
            Participant::new("Ada", "R&D", "").unwrap(),
            Participant::new("Grace", "R&D", "").unwrap(),
        ];
        let prizes = vec![Prize::new("Mug", 1, true, 0).unwrap()];

        let rows = parse_winner_rows(&[
            row(&[("id", "w1"), ("prize", "Mug"), ("name", "Ada")]),
            row(&[("id", "w1"), ("prize", "Mug"), ("name", "Grace")]),
            row(&[("id", "w2"), ("prize", "Mug"), ("name", "Grace")]),
        ]);
        let report = resolve_winners(&rows, &participants, &prizes);

        assert_eq!(report.entities.len(), 1);
        assert_eq!(report.skipped_rows, 2);
        assert!(report.warnings[0].contains("duplicate"));
        assert!(report.warnings[1].contains("already has"));
    }

    #[test]
    fn test_resolve_prefers_ids() {
        let participants = vec![Participant::new("Ada", "R&D", "").unwrap()];
        let prizes = vec![Prize::new("Mug", 1, true, 0).unwrap()];
        let rows = parse_winner_rows(&[row(&[
            ("得獎者ID", participants[0].id.as_str()),
            ("得獎者姓名", "Renamed"),
            ("獎項ID", prizes[0].id.as_str()),
            ("獎項名稱", "Old name"),
            ("中獎時間", "2026-01-05T09:30:00Z"),
            ("已確認", "是"),
        ])]);
        let report = resolve_winners(&rows, &participants, &prizes);
        assert_eq!(report.outcome(), ImportOutcome::Complete);
        assert_eq!(report.entities[0].drawn_at.to_rfc3339(), "2026-01-05T09:30:00+00:00");
        assert!(report.entities[0].confirmed);
    }
}
