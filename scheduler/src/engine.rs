//! The service/wait-set engine for the central plant.
//!
//! Responsibilities:
//! - Admit requests into the bounded service set and queue the overflow.
//! - Preempt on strict priority whenever the sets change (`rebalance`).
//! - Rotate equal-priority requests on expired wait budgets (`tick`).
//! - Report every membership change as a [`SchedulerEvent`].
//!
//! Non-responsibilities:
//! - Mutating room state (the owner applies the events).
//! - Deciding *when* a room wants service (façade and driver do that).
//!
//! Invariants maintained:
//! - The service set never exceeds `service_slots`.
//! - A room id appears in at most one set, at most once.
//! - A free slot is never left open while a waiter exists.

use room::model::FanSpeed;

use crate::policy::{highest_priority_waiter, longest_serving, lowest_priority_service};
use crate::types::{SchedulerConfig, SchedulerEvent, ServiceEntry, WaitEntry};

pub struct AcScheduler {
    cfg: SchedulerConfig,
    service: Vec<ServiceEntry>,
    wait: Vec<WaitEntry>,
}

impl AcScheduler {
    pub fn new(cfg: SchedulerConfig) -> Self {
        Self {
            cfg,
            service: Vec::new(),
            wait: Vec::new(),
        }
    }

    pub fn service_entries(&self) -> &[ServiceEntry] {
        &self.service
    }

    pub fn wait_entries(&self) -> &[WaitEntry] {
        &self.wait
    }

    pub fn is_serving(&self, room_id: &str) -> bool {
        self.service.iter().any(|e| e.room_id == room_id)
    }

    pub fn is_waiting(&self, room_id: &str) -> bool {
        self.wait.iter().any(|w| w.room_id == room_id)
    }

    /// Handle a service request for `room_id` at `fan_speed`.
    ///
    /// An id already in either set only has its speed updated in place
    /// (`start_time` and `wait_budget` are preserved); a new id is admitted
    /// directly when a slot is free, otherwise queued with a fresh budget.
    /// Rebalances in all cases, so a speed raise can preempt immediately.
    pub fn request(&mut self, room_id: &str, fan_speed: FanSpeed, now: u64) -> Vec<SchedulerEvent> {
        let mut events = Vec::new();

        let known = if let Some(e) = self.service.iter_mut().find(|e| e.room_id == room_id) {
            e.fan_speed = fan_speed;
            true
        } else if let Some(w) = self.wait.iter_mut().find(|w| w.room_id == room_id) {
            w.fan_speed = fan_speed;
            true
        } else {
            false
        };

        if !known {
            if self.service.len() < self.cfg.service_slots {
                self.enter_service(room_id.to_string(), fan_speed, now, &mut events);
            } else {
                self.enter_wait(room_id.to_string(), fan_speed, &mut events);
            }
        }

        self.rebalance(now, &mut events);
        events
    }

    /// Remove `room_id` from whichever set holds it, then rebalance.
    /// Unknown ids are a no-op, so release is idempotent.
    pub fn release(&mut self, room_id: &str, now: u64) -> Vec<SchedulerEvent> {
        let mut events = Vec::new();

        let before = self.service.len() + self.wait.len();
        self.service.retain(|e| e.room_id != room_id);
        self.wait.retain(|w| w.room_id != room_id);

        if self.service.len() + self.wait.len() != before {
            events.push(SchedulerEvent::Released {
                room_id: room_id.to_string(),
            });
        }

        self.rebalance(now, &mut events);
        events
    }

    /// Age every wait budget by one second and apply time-slice rotations.
    ///
    /// An expired waiter displaces the longest-serving room when its
    /// priority is at least the victim's; otherwise its budget refreshes
    /// and it keeps waiting. This is the round-robin among equal-priority
    /// requests.
    pub fn tick(&mut self, now: u64) -> Vec<SchedulerEvent> {
        let mut events = Vec::new();

        for w in &mut self.wait {
            w.wait_budget = w.wait_budget.saturating_sub(1);
        }

        let expired: Vec<String> = self
            .wait
            .iter()
            .filter(|w| w.wait_budget == 0)
            .map(|w| w.room_id.clone())
            .collect();

        for room_id in expired {
            // An earlier rotation in this pass may already have promoted it.
            let Some(wi) = self.wait.iter().position(|w| w.room_id == room_id) else {
                continue;
            };
            let Some(vi) = longest_serving(&self.service) else {
                continue;
            };

            if self.service[vi].fan_speed.priority() <= self.wait[wi].fan_speed.priority() {
                let waiter = self.wait.remove(wi);
                self.preempt(vi, waiter.room_id, waiter.fan_speed, now, &mut events);
            } else {
                self.wait[wi].wait_budget = self.cfg.wait_budget;
            }
        }

        events
    }

    /// Fill free slots from the wait set, then evict strictly
    /// lower-priority service entries while a higher-priority waiter exists.
    fn rebalance(&mut self, now: u64, events: &mut Vec<SchedulerEvent>) {
        while self.service.len() < self.cfg.service_slots && !self.wait.is_empty() {
            let Some(wi) = highest_priority_waiter(&self.wait) else {
                break;
            };
            let waiter = self.wait.remove(wi);
            self.enter_service(waiter.room_id, waiter.fan_speed, now, events);
        }

        while self.service.len() >= self.cfg.service_slots && !self.wait.is_empty() {
            let Some(wi) = highest_priority_waiter(&self.wait) else {
                break;
            };
            let Some(vi) = lowest_priority_service(&self.service) else {
                break;
            };

            if self.wait[wi].fan_speed.priority() > self.service[vi].fan_speed.priority() {
                let waiter = self.wait.remove(wi);
                self.preempt(vi, waiter.room_id, waiter.fan_speed, now, events);
            } else {
                break;
            }
        }
    }

    fn preempt(
        &mut self,
        victim_idx: usize,
        room_id: String,
        fan_speed: FanSpeed,
        now: u64,
        events: &mut Vec<SchedulerEvent>,
    ) {
        let victim = self.service.remove(victim_idx);
        self.enter_wait(victim.room_id, victim.fan_speed, events);
        self.enter_service(room_id, fan_speed, now, events);
    }

    fn enter_service(
        &mut self,
        room_id: String,
        fan_speed: FanSpeed,
        now: u64,
        events: &mut Vec<SchedulerEvent>,
    ) {
        self.service.push(ServiceEntry {
            room_id: room_id.clone(),
            fan_speed,
            start_time: now,
        });
        events.push(SchedulerEvent::EnteredService { room_id });
    }

    fn enter_wait(&mut self, room_id: String, fan_speed: FanSpeed, events: &mut Vec<SchedulerEvent>) {
        if self.wait.iter().any(|w| w.room_id == room_id) {
            return;
        }
        self.wait.push(WaitEntry {
            room_id: room_id.clone(),
            fan_speed,
            wait_budget: self.cfg.wait_budget,
        });
        events.push(SchedulerEvent::EnteredWait { room_id });
    }
}
