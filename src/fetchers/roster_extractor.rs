use anyhow::{Result, anyhow};
use scraper::{ElementRef, Selector};
use std::collections::HashSet;

use crate::config::settings::RosterSelectors;
use crate::domain::PlayerEntry;
use crate::errors::ExtractionFailure;
use crate::navigation::RenderedState;

/// Turns a rendered bracket page into a validated roster.
///
/// Holds only compiled selectors; nothing carries over between calls.
pub struct RosterExtractor {
    row: Selector,
    rank: Selector,
    player_id: Selector,
    display_name: Selector,
    real_name: Selector,
    wave: Selector,
}

impl RosterExtractor {
    pub fn new(selectors: &RosterSelectors) -> Result<Self> {
        Ok(Self {
            row: compile(&selectors.row)?,
            rank: compile(&selectors.rank)?,
            player_id: compile(&selectors.player_id)?,
            display_name: compile(&selectors.display_name)?,
            real_name: compile(&selectors.real_name)?,
            wave: compile(&selectors.wave)?,
        })
    }

    /// Extract exactly `expected_size` players, rank-ascending
    pub fn extract(
        &self,
        state: &RenderedState,
        expected_size: usize,
    ) -> Result<Vec<PlayerEntry>, ExtractionFailure> {
        let document = state.document();
        let rows: Vec<ElementRef> = document.select(&self.row).collect();

        check_row_count(rows.len(), expected_size)?;

        let mut players = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| self.parse_row(row, idx))
            .collect::<Result<Vec<_>, _>>()?;

        check_uniqueness(&players)?;
        players.sort_by_key(|p| p.rank);
        Ok(players)
    }

    /// Whether the page already yields a full, valid roster
    pub fn is_ready(&self, state: &RenderedState, expected_size: usize) -> bool {
        self.extract(state, expected_size).is_ok()
    }

    // --- Row Parsing ---

    fn parse_row(&self, row: &ElementRef, idx: usize) -> Result<PlayerEntry, ExtractionFailure> {
        let row_number = idx + 1;

        let player_id = cell_text(row, &self.player_id)
            .filter(|s| !s.is_empty())
            .ok_or(ExtractionFailure::MissingField {
                row: row_number,
                field: "player_id",
            })?;

        let wave_text = cell_text(row, &self.wave)
            .filter(|s| !s.is_empty())
            .ok_or(ExtractionFailure::MissingField {
                row: row_number,
                field: "wave",
            })?;
        let wave = parse_number(&wave_text).ok_or_else(|| ExtractionFailure::NonNumeric {
            row: row_number,
            field: "wave",
            value: wave_text.clone(),
        })?;

        // Rows without a rank cell are ranked by display position
        let rank = match cell_text(row, &self.rank).filter(|s| !s.is_empty()) {
            Some(text) => parse_rank(&text).ok_or(ExtractionFailure::NonNumeric {
                row: row_number,
                field: "rank",
                value: text,
            })?,
            None => row_number as u32,
        };

        let display_name = cell_text(row, &self.display_name)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| player_id.clone());
        let real_name = cell_text(row, &self.real_name).unwrap_or_default();

        Ok(PlayerEntry {
            player_id,
            display_name,
            real_name,
            wave,
            rank,
        })
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("Invalid selector {:?}: {:?}", selector, e))
}

fn check_row_count(found: usize, expected: usize) -> Result<(), ExtractionFailure> {
    if found < expected {
        return Err(ExtractionFailure::Incomplete { found, expected });
    }
    if found > expected {
        return Err(ExtractionFailure::Oversized { found, expected });
    }
    Ok(())
}

fn check_uniqueness(players: &[PlayerEntry]) -> Result<(), ExtractionFailure> {
    let mut ranks = HashSet::new();
    let mut ids = HashSet::new();

    for player in players {
        if !ranks.insert(player.rank) {
            return Err(ExtractionFailure::DuplicateRank { rank: player.rank });
        }
        if !ids.insert(player.player_id.as_str()) {
            return Err(ExtractionFailure::DuplicatePlayer {
                player_id: player.player_id.clone(),
            });
        }
    }
    Ok(())
}

fn cell_text(row: &ElementRef, selector: &Selector) -> Option<String> {
    row.select(selector)
        .next()
        .map(|cell| cell.text().collect::<String>().trim().to_string())
}

/// Accepts thousands separators ("1,234") and surrounding whitespace
fn parse_number(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' ' | '\u{a0}'))
        .collect();
    digits.parse().ok()
}

/// Accepts "#3" or "3." as well as a bare number; rank 0 is invalid
fn parse_rank(text: &str) -> Option<u32> {
    let trimmed = text.trim_start_matches('#').trim_end_matches('.');
    parse_number(trimmed).filter(|rank| *rank > 0)
}
