//! Revision lifecycle rules.
//!
//! A topic's revisions are kept in insertion order (oldest first). Exactly one
//! surviving revision carries `latest = true`: the one with the greatest
//! timestamp, ties going to the most recently inserted. The in-memory store
//! applies these rules directly; the SQLite store expresses the same ordering in
//! SQL; views mirror them on their newest-first projections.

use crate::models::{Memo, MemoId};

/// Timestamp for a revision created at `now`, never older than the current latest.
pub fn next_timestamp(revisions: &[Memo], now: i64) -> i64 {
    revisions
        .iter()
        .map(|m| m.timestamp)
        .max()
        .map_or(now, |newest| newest.max(now))
}

/// Index of the revision that must carry the `latest` flag.
pub fn latest_index(revisions: &[Memo]) -> Option<usize> {
    revisions
        .iter()
        .enumerate()
        .max_by_key(|(idx, m)| (m.timestamp, *idx))
        .map(|(idx, _)| idx)
}

/// The revision that carries (or should carry) the `latest` flag.
pub fn latest_of(revisions: &[Memo]) -> Option<&Memo> {
    latest_index(revisions).map(|idx| &revisions[idx])
}

/// Re-establish the single-latest invariant.
pub fn promote_latest(revisions: &mut [Memo]) {
    let winner = latest_index(revisions);
    for (idx, memo) in revisions.iter_mut().enumerate() {
        memo.latest = Some(idx) == winner;
    }
}

/// Append a freshly created revision, making it the only latest one.
pub fn append_revision(revisions: &mut Vec<Memo>, mut memo: Memo) -> Memo {
    for existing in revisions.iter_mut() {
        existing.latest = false;
    }
    memo.latest = true;
    revisions.push(memo.clone());
    memo
}

/// Remove a revision and re-promote; returns the number of remaining revisions.
///
/// An unknown id leaves the revisions untouched.
pub fn remove_revision(revisions: &mut Vec<Memo>, id: &MemoId) -> usize {
    revisions.retain(|m| &m.id != id);
    promote_latest(revisions);
    revisions.len()
}

/// Copy of the revisions ordered newest first (history order).
pub fn newest_first(revisions: &[Memo]) -> Vec<Memo> {
    let mut ordered: Vec<(usize, &Memo)> = revisions.iter().enumerate().collect();
    ordered.sort_by(|(ia, a), (ib, b)| (b.timestamp, ib).cmp(&(a.timestamp, ia)));
    ordered.into_iter().map(|(_, m)| m.clone()).collect()
}

/// Verify the single-latest invariant, describing the first violation found.
pub fn check_latest_invariant(revisions: &[Memo]) -> Result<(), String> {
    if revisions.is_empty() {
        return Ok(());
    }
    let flagged: Vec<&Memo> = revisions.iter().filter(|m| m.latest).collect();
    if flagged.len() != 1 {
        return Err(format!(
            "expected exactly one latest revision, found {}",
            flagged.len()
        ));
    }
    let newest = revisions.iter().map(|m| m.timestamp).max().unwrap_or(0);
    if flagged[0].timestamp != newest {
        return Err(format!(
            "latest revision {} has timestamp {}, newest is {}",
            flagged[0].id, flagged[0].timestamp, newest
        ));
    }
    Ok(())
}

/// Mirror a store-side create on a newest-first projection of the same topic.
pub fn mirror_created(history: &mut Vec<Memo>, memo: &Memo) {
    if history.iter().any(|m| m.id == memo.id) {
        return;
    }
    for existing in history.iter_mut() {
        existing.latest = false;
    }
    let mut created = memo.clone();
    created.latest = true;
    history.insert(0, created);
}

/// Mirror a store-side delete on a newest-first projection; returns what remains.
pub fn mirror_deleted(history: &mut Vec<Memo>, id: &MemoId) -> usize {
    history.retain(|m| &m.id != id);
    for (idx, memo) in history.iter_mut().enumerate() {
        memo.latest = idx == 0;
    }
    history.len()
}
