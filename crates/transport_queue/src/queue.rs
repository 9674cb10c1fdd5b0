//! Position bookkeeping for the entries of a single station.
//!
//! Waiting entries hold the positions `1..=N` without gaps or duplicates. Every
//! other status holds no position. The functions here work on the station's
//! full list of entries and report which of them they touched, so callers only
//! write back what changed.

use std::cmp::Ordering;

use chrono::{DateTime, Local};
use itertools::Itertools;
use model::{
    queue::{MoveDirection, QueueEntry, QueueSnapshot, QueueStatus},
    station::Station,
    WithId,
};
use utility::id::Id;

use crate::{RequestError, RequestResult};

fn queue_order(a: &WithId<QueueEntry>, b: &WithId<QueueEntry>) -> Ordering {
    // entries without a position go last, in arrival order
    let position = |entry: &WithId<QueueEntry>| entry.content.position.unwrap_or(u32::MAX);
    position(a)
        .cmp(&position(b))
        .then_with(|| a.content.arrival_time.cmp(&b.content.arrival_time))
        .then_with(|| a.id.raw_ref::<str>().cmp(b.id.raw_ref::<str>()))
}

/// Waiting entries in queue order.
pub fn waiting(entries: &[WithId<QueueEntry>]) -> Vec<&WithId<QueueEntry>> {
    entries
        .iter()
        .filter(|entry| entry.content.status == QueueStatus::Waiting)
        .sorted_by(|a, b| queue_order(a, b))
        .collect()
}

pub fn waiting_count(entries: &[WithId<QueueEntry>]) -> usize {
    entries
        .iter()
        .filter(|entry| entry.content.status == QueueStatus::Waiting)
        .count()
}

/// Position for an entry appended to the tail.
pub fn next_position(entries: &[WithId<QueueEntry>]) -> u32 {
    entries
        .iter()
        .filter(|entry| entry.content.status == QueueStatus::Waiting)
        .filter_map(|entry| entry.content.position)
        .max()
        .unwrap_or(0)
        + 1
}

/// Renumbers the waiting entries to `1..=N`, keeping their order, and clears
/// the position of everything else. Returns the indices of modified entries.
pub fn close_gaps(entries: &mut [WithId<QueueEntry>]) -> Vec<usize> {
    let order = (0..entries.len())
        .filter(|&i| entries[i].content.status == QueueStatus::Waiting)
        .sorted_by(|&a, &b| queue_order(&entries[a], &entries[b]))
        .collect::<Vec<_>>();

    let mut changed = vec![];
    for (rank, index) in order.into_iter().enumerate() {
        let position = Some(rank as u32 + 1);
        if entries[index].content.position != position {
            entries[index].content.position = position;
            changed.push(index);
        }
    }
    for (index, entry) in entries.iter_mut().enumerate() {
        if entry.content.status != QueueStatus::Waiting && entry.content.position.is_some()
        {
            entry.content.position = None;
            changed.push(index);
        }
    }
    changed
}

/// Swaps a waiting entry with its neighbour in the given direction. Returns the
/// indices of both swapped entries.
pub fn swap(
    entries: &mut [WithId<QueueEntry>],
    id: &Id<QueueEntry>,
    direction: MoveDirection,
) -> RequestResult<(usize, usize)> {
    let index = entries
        .iter()
        .position(|entry| entry.id == *id)
        .ok_or_else(|| RequestError::not_found("The queue entry does not exist."))?;
    let status = entries[index].content.status;
    let position = match (status, entries[index].content.position) {
        (QueueStatus::Waiting, Some(position)) => position,
        _ => {
            return Err(RequestError::InvalidMove(format!(
                "Only waiting vehicles can be moved, this one is `{}`.",
                status
            )))
        }
    };
    let neighbour_position = match direction {
        MoveDirection::Up if position > 1 => position - 1,
        MoveDirection::Up => {
            return Err(RequestError::InvalidMove(
                "The vehicle is already first in the queue.".to_owned(),
            ))
        }
        MoveDirection::Down => position + 1,
    };
    let neighbour = entries
        .iter()
        .position(|entry| {
            entry.content.status == QueueStatus::Waiting
                && entry.content.position == Some(neighbour_position)
        })
        .ok_or_else(|| {
            RequestError::InvalidMove("The vehicle is already last in the queue.".to_owned())
        })?;

    entries[index].content.position = Some(neighbour_position);
    entries[neighbour].content.position = Some(position);
    Ok((index, neighbour))
}

/// Whether the waiting positions form `1..=N` and nothing else holds one.
pub fn is_dense(entries: &[WithId<QueueEntry>]) -> bool {
    let mut positions = entries
        .iter()
        .filter(|entry| entry.content.status == QueueStatus::Waiting)
        .map(|entry| entry.content.position)
        .collect::<Vec<_>>();
    positions.sort();
    let waiting_ok = positions
        .iter()
        .enumerate()
        .all(|(rank, position)| *position == Some(rank as u32 + 1));
    let others_ok = entries
        .iter()
        .filter(|entry| entry.content.status != QueueStatus::Waiting)
        .all(|entry| entry.content.position.is_none());
    waiting_ok && others_ok
}

/// Partitions the non-archived entries of a station for display. Completed
/// entries are limited to those that ended on the local day of `now`.
pub fn snapshot(
    station: WithId<Station>,
    entries: Vec<WithId<QueueEntry>>,
    now: DateTime<Local>,
) -> QueueSnapshot {
    let today = now.date_naive();
    let mut waiting = vec![];
    let mut special = vec![];
    let mut loading = vec![];
    let mut completed = vec![];
    for entry in entries.into_iter().filter(|entry| !entry.content.archived) {
        match entry.content.status {
            QueueStatus::Waiting => waiting.push(entry),
            QueueStatus::Special => special.push(entry),
            QueueStatus::Loading => loading.push(entry),
            QueueStatus::Loaded | QueueStatus::KnockedOff => {
                if entry
                    .content
                    .terminal_time()
                    .is_some_and(|time| time.date_naive() == today)
                {
                    completed.push(entry)
                }
            }
        }
    }
    waiting.sort_by(queue_order);
    special.sort_by_key(|entry| entry.content.special_request_time);
    loading.sort_by_key(|entry| entry.content.loading_start_time);
    completed.sort_by_key(|entry| std::cmp::Reverse(entry.content.terminal_time()));
    QueueSnapshot {
        station,
        waiting,
        special,
        loading,
        completed,
        generated_at: now,
    }
}
