// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! How a stage splits its work into groups and when each group can start.
//!
//! A stage with `G` groups fed by an upstream stage with `U` groups releases
//! group `i` once upstream group `min(ceil((i + 1) * U / G), U) - 1` has
//! finished. When the counts match this is simply upstream group `i`.

use daolite_engine::invalid_config;
use daolite_engine::timing::TimingArray;
use daolite_engine::types::{LatencyResult, require_non_zero};

/// Upper limit on the number of groups in one stage.
pub const MAX_GROUPS: usize = 1 << 20;

/// Check a group count is non-zero and no more than [`MAX_GROUPS`].
pub fn require_group_count(what: &str, groups: usize) -> LatencyResult<usize> {
    require_non_zero(what, groups)?;
    if groups > MAX_GROUPS {
        return invalid_config!("{what} must be at most {MAX_GROUPS}, got {groups}");
    }
    Ok(groups)
}

/// Index of the upstream group whose finish releases group `index`.
#[must_use]
pub fn ready_index(index: usize, groups: usize, upstream_groups: usize) -> usize {
    ((index + 1) * upstream_groups)
        .div_ceil(groups)
        .clamp(1, upstream_groups)
        - 1
}

/// Time at which group `index` of `groups` has its input available.
#[must_use]
pub fn ready_time(upstream: Option<&TimingArray>, index: usize, groups: usize) -> f64 {
    match upstream {
        Some(upstream) if !upstream.is_empty() => {
            upstream[ready_index(index, groups, upstream.len())].finish
        }
        _ => 0.0,
    }
}

/// Time at which the whole upstream frame is available.
#[must_use]
pub fn frame_ready(upstream: Option<&TimingArray>) -> f64 {
    upstream.and_then(TimingArray::last_finish).unwrap_or(0.0)
}

/// Number of upstream groups, treating no upstream as a single group.
#[must_use]
pub fn upstream_groups(upstream: Option<&TimingArray>) -> usize {
    upstream.map_or(1, |u| u.len().max(1))
}

/// Decide how many groups a stage processes.
///
/// An agenda fixes the count to its length (and must agree with an explicit
/// `group`). Otherwise `group` is used, falling back to `default`.
pub fn group_count(
    component: &str,
    group: Option<usize>,
    agenda: Option<&[usize]>,
    default: usize,
) -> LatencyResult<usize> {
    let groups = match (agenda, group) {
        (Some(agenda), Some(group)) if agenda.len() != group => {
            return invalid_config!(
                "{component}: agenda has {} entries but group is {group}",
                agenda.len()
            );
        }
        (Some(agenda), _) => agenda.len(),
        (None, Some(group)) => group,
        (None, None) => default,
    };
    require_group_count(&format!("{component}: group"), groups)
}

/// Size of each group when `total` items are shared evenly between `groups`
/// groups and `workers` parallel workers.
///
/// A product of `groups` and `workers` beyond `usize::MAX` leaves at most
/// one item per group, which saturating gives exactly.
#[must_use]
pub fn uniform_group_size(total: usize, groups: usize, workers: usize) -> usize {
    total.div_ceil(groups.saturating_mul(workers))
}

/// Size of group `index` taken from an agenda and shared between `workers`.
#[must_use]
pub fn agenda_group_size(agenda: &[usize], index: usize, workers: usize) -> usize {
    agenda[index].div_ceil(workers)
}

/// Build a centroider agenda from the packet each camera pixel arrives in.
///
/// `packet_map[p]` is the packet holding pixel `p` and each entry of
/// `subapertures` lists the pixels of one subaperture. A subaperture is
/// ready with the last packet that carries one of its pixels, so entry `k`
/// of the result counts the subapertures completed by packet `k`.
pub fn centroid_agenda<S>(packet_map: &[usize], subapertures: &[S]) -> LatencyResult<Vec<usize>>
where
    S: AsRef<[usize]>,
{
    let Some(&last_packet) = packet_map.iter().max() else {
        return invalid_config!("Centroid agenda: packet map is empty");
    };
    let packets = require_group_count(
        "Centroid agenda: packet count",
        last_packet.saturating_add(1),
    )?;

    let mut agenda = vec![0; packets];
    for (index, pixels) in subapertures.iter().enumerate() {
        let mut ready = 0;
        for &pixel in pixels.as_ref() {
            match packet_map.get(pixel) {
                Some(&packet) => ready = ready.max(packet),
                None => {
                    return invalid_config!(
                        "Centroid agenda: subaperture {index} uses pixel {pixel} but the packet map covers {} pixels",
                        packet_map.len()
                    );
                }
            }
        }
        agenda[ready] += 1;
    }
    Ok(agenda)
}

/// Like [`centroid_agenda`] but every pixel of every subaperture is
/// measured on its own, as for intensity sensing.
pub fn centroid_intensity_agenda<S>(
    packet_map: &[usize],
    subapertures: &[S],
) -> LatencyResult<Vec<usize>>
where
    S: AsRef<[usize]>,
{
    let pixels: Vec<[usize; 1]> = subapertures
        .iter()
        .flat_map(|s| s.as_ref().iter().map(|&p| [p]))
        .collect();
    centroid_agenda(packet_map, &pixels)
}

/// Lay out `groups` groups back-to-back behind their upstream input.
///
/// `first_ready` can hold the first group back further than its upstream
/// input. `duration` gives the time taken by each group.
pub fn schedule<F>(
    upstream: Option<&TimingArray>,
    groups: usize,
    first_ready: f64,
    mut duration: F,
) -> TimingArray
where
    F: FnMut(usize) -> f64,
{
    let mut timing = TimingArray::with_capacity(groups);
    for i in 0..groups {
        let mut ready = ready_time(upstream, i, groups);
        if i == 0 {
            ready = ready.max(first_ready);
        }
        timing.push_after(ready, duration(i));
    }
    timing
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn ready_index_mapping() {
        // Matching counts
        for i in 0..4 {
            assert_eq!(ready_index(i, 4, 4), i);
        }
        // More downstream groups than upstream
        assert_eq!(ready_index(0, 4, 1), 0);
        assert_eq!(ready_index(3, 4, 1), 0);
        assert_eq!(ready_index(0, 4, 2), 0);
        assert_eq!(ready_index(1, 4, 2), 0);
        assert_eq!(ready_index(2, 4, 2), 1);
        assert_eq!(ready_index(3, 4, 2), 1);
        // Fewer downstream groups than upstream
        assert_eq!(ready_index(0, 2, 4), 1);
        assert_eq!(ready_index(1, 2, 4), 3);
        assert_eq!(ready_index(0, 1, 5), 4);
    }

    #[test]
    fn counts() {
        assert_eq!(group_count("c", None, None, 50).unwrap(), 50);
        assert_eq!(group_count("c", Some(4), None, 50).unwrap(), 4);
        assert_eq!(group_count("c", None, Some(&[1, 2, 3]), 50).unwrap(), 3);
        assert_eq!(group_count("c", Some(3), Some(&[1, 2, 3]), 50).unwrap(), 3);
        assert!(group_count("c", Some(2), Some(&[1, 2, 3]), 50).is_err());
        assert!(group_count("c", Some(0), None, 50).is_err());
        assert!(group_count("c", None, Some(&[]), 50).is_err());
        assert_eq!(group_count("c", Some(MAX_GROUPS), None, 50).unwrap(), MAX_GROUPS);
        assert_eq!(
            group_count("c", Some(usize::MAX), None, 50)
                .unwrap_err()
                .to_string(),
            format!(
                "Error: Invalid configuration: c: group must be at most {MAX_GROUPS}, got {}",
                usize::MAX
            )
        );
    }

    #[test]
    fn sizes() {
        assert_eq!(uniform_group_size(100, 4, 1), 25);
        assert_eq!(uniform_group_size(101, 4, 1), 26);
        assert_eq!(uniform_group_size(100, 4, 3), 9);
        assert_eq!(uniform_group_size(100, MAX_GROUPS, usize::MAX), 1);
        assert_eq!(uniform_group_size(0, MAX_GROUPS, usize::MAX), 0);
        assert_eq!(agenda_group_size(&[10, 0], 0, 4), 3);
        assert_eq!(agenda_group_size(&[10, 0], 1, 4), 0);
    }

    #[test]
    fn agenda_from_packets() {
        // Eight pixels sent two per packet.
        let packet_map = [0, 0, 1, 1, 2, 2, 3, 3];
        let subapertures: [Vec<usize>; 3] = [vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![0, 7]];
        let agenda = centroid_agenda(&packet_map, &subapertures).unwrap();
        assert_eq!(agenda, vec![0, 1, 0, 2]);
        assert_eq!(agenda.iter().sum::<usize>(), subapertures.len());

        let agenda = centroid_intensity_agenda(&packet_map, &subapertures).unwrap();
        assert_eq!(agenda, vec![3, 2, 2, 3]);
    }

    #[test]
    fn agenda_drives_the_group_count() {
        let packet_map = [0, 1, 2];
        let agenda = centroid_agenda(&packet_map, &[[0_usize], [2]]).unwrap();
        assert_eq!(group_count("c", None, Some(&agenda), 50).unwrap(), 3);
    }

    #[test]
    fn agenda_errors() {
        let err = centroid_agenda(&[0, 1], &[vec![0_usize, 5]]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: Invalid configuration: Centroid agenda: subaperture 0 uses pixel 5 \
             but the packet map covers 2 pixels"
        );
        assert!(centroid_agenda::<Vec<usize>>(&[], &[]).is_err());
        assert!(centroid_agenda(&[usize::MAX], &[[0_usize]]).is_err());
    }

    #[test]
    fn schedule_waits_for_upstream() {
        let upstream = TimingArray::from_rows(&[(0.0, 10.0), (10.0, 20.0)]).unwrap();
        let timing = schedule(Some(&upstream), 2, 0.0, |_| 15.0);
        assert_eq!(timing.starts(), vec![10.0, 25.0]);
        assert_eq!(timing.finishes(), vec![25.0, 40.0]);

        let timing = schedule(Some(&upstream), 2, 0.0, |_| 1.0);
        assert_eq!(timing.starts(), vec![10.0, 20.0]);

        let timing = schedule(None, 3, 0.0, |i| i as f64);
        assert_eq!(timing.finishes(), vec![0.0, 1.0, 3.0]);

        let timing = schedule(Some(&upstream), 2, 20.0, |_| 1.0);
        assert_relative_eq!(timing[0].start, 20.0);
    }
}
