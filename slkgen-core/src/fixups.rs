//! Per-kind corrections applied to a row before it is committed.
//!
//! The editor rejects rows that lack some columns, and the balance table
//! carries legacy column pairs that have to agree. Rules run in a fixed
//! order so later rules see cells inserted by earlier ones.

use crate::catalog::SlkKind;
use crate::row::{SlkCell, UnitRow, EMPTY_TEXT, UNSET_TEXT};

pub const ABILITIES_ABIL_LIST: u32 = 4;

pub const BALANCE_LEVEL: u32 = 5;
pub const BALANCE_IS_BUILDING: u32 = 6;
pub const BALANCE_HP: u32 = 23;
pub const BALANCE_REAL_HP: u32 = 24;
pub const BALANCE_MANA: u32 = 27;
pub const BALANCE_REAL_MANA: u32 = 28;
pub const BALANCE_DEF: u32 = 31;
pub const BALANCE_REAL_DEF: u32 = 33;
pub const BALANCE_AGI_PLUS: u32 = 47;
pub const BALANCE_ABIL_TEST: u32 = 48;

/// `(source, mirror, offset)`: the mirror copies the source value and is
/// placed `offset` cells after it. X32 sits between def and realdef.
const BALANCE_MIRRORS: [(u32, u32, usize); 3] = [
    (BALANCE_HP, BALANCE_REAL_HP, 1),
    (BALANCE_DEF, BALANCE_REAL_DEF, 2),
    (BALANCE_MANA, BALANCE_REAL_MANA, 1),
];

pub fn apply(kind: SlkKind, row: &mut UnitRow) {
    match kind {
        SlkKind::Abilities => fix_abilities(row),
        SlkKind::Balance => fix_balance(row),
        _ => {}
    }
}

fn fix_abilities(row: &mut UnitRow) {
    if !row.contains(ABILITIES_ABIL_LIST) {
        row.push(SlkCell::text(ABILITIES_ABIL_LIST, EMPTY_TEXT));
    }
}

fn fix_balance(row: &mut UnitRow) {
    ensure_after(
        row,
        SlkCell::raw(BALANCE_IS_BUILDING, "FALSE"),
        BALANCE_LEVEL,
    );

    for (source, mirror, offset) in BALANCE_MIRRORS {
        if row.contains(mirror) {
            continue;
        }
        if let Some(cell) = row.get(source).map(|c| c.copied_to(mirror)) {
            row.insert_after(source, offset, cell);
        }
    }

    ensure_after(
        row,
        SlkCell::text(BALANCE_ABIL_TEST, UNSET_TEXT),
        BALANCE_AGI_PLUS,
    );
}

/// Inserts `cell` right after `anchor` unless its column is already set.
/// Nothing happens when the anchor is absent.
fn ensure_after(row: &mut UnitRow, cell: SlkCell, anchor: u32) {
    if !row.contains(cell.column) {
        row.insert_after(anchor, 1, cell);
    }
}
