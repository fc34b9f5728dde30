//! Pure selection helpers over the service and wait sets.
//
//  No clocks, no mutation; the engine applies what these pick.

use crate::types::{ServiceEntry, WaitEntry};

/// Index of the highest-priority waiter. Ties go to the earliest entry,
/// since the wait set is kept in arrival order.
pub fn highest_priority_waiter(wait: &[WaitEntry]) -> Option<usize> {
    let mut best: Option<usize> = None;
    let mut best_prio = 0u8;

    for (i, w) in wait.iter().enumerate() {
        let p = w.fan_speed.priority();
        if p > best_prio {
            best_prio = p;
            best = Some(i);
        }
    }

    best
}

/// Index of the eviction candidate for priority preemption: lowest fan
/// speed first, then the smallest `start_time` (longest-serving) among the
/// tied lows.
pub fn lowest_priority_service(service: &[ServiceEntry]) -> Option<usize> {
    let min_prio = service.iter().map(|e| e.fan_speed.priority()).min()?;

    service
        .iter()
        .enumerate()
        .filter(|(_, e)| e.fan_speed.priority() == min_prio)
        .min_by_key(|(_, e)| e.start_time)
        .map(|(i, _)| i)
}

/// Index of the longest-serving entry regardless of priority; the victim
/// for time-slice rotation.
pub fn longest_serving(service: &[ServiceEntry]) -> Option<usize> {
    service
        .iter()
        .enumerate()
        .min_by_key(|(_, e)| e.start_time)
        .map(|(i, _)| i)
}
