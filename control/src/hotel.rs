//! The control-plane core: rooms + scheduler + persistence port.
//!
//! Responsibilities:
//! - Own every mutable piece of plant state and keep it consistent.
//! - Validate and route façade commands (check-in/out, AC control).
//! - Run one simulation step in the strict per-tick order.
//! - Apply scheduler events to rooms; the scheduler itself never sees one.
//!
//! All mutation happens through either a command or `step`; the owner
//! serializes the two entry points behind one `Arc<Mutex<Hotel>>` shared
//! with the driver task.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use common::logger::TraceId;
use room::model::{Room, Tenant};
use room::rates::REACTIVATE_DELTA;
use scheduler::engine::AcScheduler;
use scheduler::types::{SchedulerConfig, SchedulerEvent};
use store::HotelStore;
use store::model::{CheckInRecord, RoomStateRow};

use crate::command::{CheckInRequest, ControlCommand};
use crate::config::PlantConfig;
use crate::error::ControlError;
use crate::layout;
use crate::view::{AcDetail, BillSummary, FloorView, RoomStatus, RoomSummary};

pub struct Hotel {
    rooms: BTreeMap<String, Room>,
    scheduler: AcScheduler,
    store: Arc<dyn HotelStore>,
    /// Logical clock in simulated seconds, advanced once per step.
    clock: u64,
}

impl Hotel {
    /// Build the standard inventory and restore durable state from the
    /// store. Restored powered-on rooms are not re-requested here; the
    /// first tick's auto-reactivation re-admits any that drifted.
    pub async fn restore(cfg: &PlantConfig, store: Arc<dyn HotelStore>) -> anyhow::Result<Self> {
        let mut inventory = layout::standard_rooms();
        layout::apply_demo_profile(&mut inventory);

        let mut rooms = BTreeMap::new();
        for room in inventory {
            rooms.insert(room.id.clone(), room);
        }

        for rec in store.active_check_ins().await? {
            if let Some(room) = rooms.get_mut(&rec.room_id) {
                room.is_free = false;
                room.stay_days = rec.stay_days;
                room.tenant = Some(Tenant {
                    id: rec.tenant_id,
                    name: rec.tenant_name,
                    phone: rec.tenant_phone,
                });
            }
        }

        for row in store.load_room_states().await? {
            if let Some(room) = rooms.get_mut(&row.room_id) {
                room.power_on = row.power_on;
                room.fan_speed = row.fan_speed;
                room.target_temp = row.target_temp;
                room.current_temp = row.current_temp;
                room.total_fee = row.total_fee;
                room.duration = row.duration;
            }
        }

        Ok(Self {
            rooms,
            scheduler: AcScheduler::new(SchedulerConfig {
                service_slots: cfg.service_slots,
                wait_budget: cfg.wait_budget,
            }),
            store,
            clock: 0,
        })
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn scheduler(&self) -> &AcScheduler {
        &self.scheduler
    }

    /// Register a guest. The room need not be free; a fresh check-in
    /// simply replaces the previous stay, as the store retires the old
    /// active row.
    #[instrument(skip(self, req), fields(room_id = %req.room_id, trace_id = %TraceId::new()))]
    pub async fn check_in(&mut self, req: CheckInRequest) -> Result<(), ControlError> {
        if req.tenant_id.is_empty() || req.tenant_name.is_empty() {
            return Err(ControlError::InvalidArgument(
                "tenant id and name are required".into(),
            ));
        }

        let room = self
            .rooms
            .get_mut(&req.room_id)
            .ok_or_else(|| ControlError::UnknownRoom(req.room_id.clone()))?;

        room.is_free = false;
        room.stay_days = req.stay_days;
        room.tenant = Some(Tenant {
            id: req.tenant_id.clone(),
            name: req.tenant_name.clone(),
            phone: req.tenant_phone.clone(),
        });

        let rec = CheckInRecord {
            room_id: req.room_id,
            tenant_id: req.tenant_id,
            tenant_name: req.tenant_name,
            tenant_phone: req.tenant_phone,
            check_in_time: Utc::now(),
            stay_days: req.stay_days,
        };
        if let Err(e) = self.store.add_check_in(&rec).await {
            warn!(error = %e, room_id = %rec.room_id, "check-in record not persisted");
        }

        info!(room_id = %rec.room_id, tenant = %rec.tenant_name, "guest checked in");
        Ok(())
    }

    /// Hard cancellation: power off, leave the scheduler, close any open
    /// session, clear tenant state, and flush a final snapshot.
    #[instrument(skip(self), fields(trace_id = %TraceId::new()))]
    pub async fn check_out(&mut self, room_id: &str) -> Result<(), ControlError> {
        if !self.rooms.contains_key(room_id) {
            return Err(ControlError::UnknownRoom(room_id.to_string()));
        }

        let now = Utc::now();
        let events = self.scheduler.release(room_id, self.clock);
        self.apply_events(events);

        let Some(room) = self.rooms.get_mut(room_id) else {
            return Err(ControlError::UnknownRoom(room_id.to_string()));
        };
        room.power_on = false;
        room.is_active = false;
        let closed = room.close_session(now, self.clock);
        room.is_free = true;
        room.tenant = None;
        room.stay_days = 0;
        let snapshot = RoomStateRow::from(&*room);

        if let Some(rec) = closed {
            if let Err(e) = self.store.log_ac_session(&rec).await {
                warn!(error = %e, room_id, "final ac session not persisted");
            }
        }
        if let Err(e) = self.store.mark_checked_out(room_id, now).await {
            warn!(error = %e, room_id, "check-out record not persisted");
        }
        if let Err(e) = self.store.upsert_room_state(&snapshot).await {
            warn!(error = %e, room_id, "room state snapshot not persisted");
        }

        info!(room_id, "guest checked out");
        Ok(())
    }

    /// Apply a control command: the power edge first, then the target,
    /// then the fan speed. Snapshots the room afterwards.
    #[instrument(skip(self, cmd), fields(room_id = %room_id, trace_id = %TraceId::new()))]
    pub async fn control(
        &mut self,
        room_id: &str,
        cmd: ControlCommand,
    ) -> Result<RoomStatus, ControlError> {
        {
            let room = self
                .rooms
                .get(room_id)
                .ok_or_else(|| ControlError::UnknownRoom(room_id.to_string()))?;
            if room.is_free {
                return Err(ControlError::RoomNotOccupied(room_id.to_string()));
            }
        }
        if let Some(target) = cmd.target_temp {
            if !target.is_finite() {
                return Err(ControlError::InvalidArgument(format!(
                    "target temperature {target} is not a number"
                )));
            }
        }

        let now = Utc::now();

        if let Some(on) = cmd.power_on {
            self.set_power(room_id, on, now).await;
        }
        if let Some(target) = cmd.target_temp {
            self.set_target(room_id, target);
        }
        if let Some(speed) = cmd.fan_speed {
            self.set_speed(room_id, speed, now).await;
        }

        if let Some(room) = self.rooms.get(room_id) {
            let snapshot = RoomStateRow::from(room);
            if let Err(e) = self.store.upsert_room_state(&snapshot).await {
                warn!(error = %e, room_id, "room state snapshot not persisted");
            }
        }

        self.status(room_id)
    }

    async fn set_power(&mut self, room_id: &str, on: bool, now: DateTime<Utc>) {
        let clock = self.clock;
        let (closed, days_update, speed) = {
            let Some(room) = self.rooms.get_mut(room_id) else {
                return;
            };

            let was_on = room.power_on;
            let mut closed = None;
            let mut days_update = None;

            // A manual on->off cycle bills one night and ends the open
            // billing segment.
            if was_on && !on {
                room.stay_days += 1;
                days_update = Some(room.stay_days);
                closed = room.close_session(now, clock);
            }

            room.power_on = on;
            if on && !was_on {
                room.open_session(now, clock);
            }

            (closed, days_update, room.fan_speed)
        };

        info!(room_id, power_on = on, "power switched");

        if on {
            let events = self.scheduler.request(room_id, speed, clock);
            self.apply_events(events);
        } else {
            let events = self.scheduler.release(room_id, clock);
            self.apply_events(events);
            if let Some(room) = self.rooms.get_mut(room_id) {
                room.is_active = false;
            }
        }

        if let Some(days) = days_update {
            if let Err(e) = self.store.update_stay_days(room_id, days).await {
                warn!(error = %e, room_id, "stay-day update not persisted");
            }
        }
        if let Some(rec) = closed {
            if let Err(e) = self.store.log_ac_session(&rec).await {
                warn!(error = %e, room_id, "ac session not persisted");
            }
        }
    }

    fn set_target(&mut self, room_id: &str, target: f64) {
        let clock = self.clock;
        let request = {
            let Some(room) = self.rooms.get_mut(room_id) else {
                return;
            };
            room.target_temp = target;
            (room.power_on
                && !room.is_active
                && room.delta_from_target().abs() > REACTIVATE_DELTA)
                .then_some(room.fan_speed)
        };

        info!(room_id, target_temp = target, "target changed");

        if let Some(speed) = request {
            let events = self.scheduler.request(room_id, speed, clock);
            self.apply_events(events);
        }
    }

    async fn set_speed(&mut self, room_id: &str, speed: room::model::FanSpeed, now: DateTime<Utc>) {
        let clock = self.clock;
        let (closed, power_on) = {
            let Some(room) = self.rooms.get_mut(room_id) else {
                return;
            };

            // The old speed's segment ends here; the next one opens at the
            // same instant. Closing happens before the speed flips so the
            // record carries the speed it was billed at.
            let mut closed = None;
            if room.power_on && room.fan_speed != speed {
                if let Some(rec) = room.close_session(now, clock) {
                    closed = Some(rec);
                    room.open_session(now, clock);
                }
            }
            room.fan_speed = speed;
            (closed, room.power_on)
        };

        info!(room_id, fan_speed = %speed, "fan speed changed");

        if power_on {
            let events = self.scheduler.request(room_id, speed, clock);
            self.apply_events(events);
        }

        if let Some(rec) = closed {
            if let Err(e) = self.store.log_ac_session(&rec).await {
                warn!(error = %e, room_id, "ac session not persisted");
            }
        }
    }

    pub fn status(&self, room_id: &str) -> Result<RoomStatus, ControlError> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| ControlError::UnknownRoom(room_id.to_string()))?;
        Ok(RoomStatus::from_room(room, self.scheduler.is_waiting(room_id)))
    }

    pub fn list_floors(&self) -> Vec<FloorView> {
        let mut floors: Vec<FloorView> = Vec::new();

        for room in self.rooms.values() {
            let summary = RoomSummary {
                room_id: room.id.clone(),
                room_type: room.room_type.clone(),
                nightly_price: room.nightly_price,
                deposit: room.deposit,
                is_free: room.is_free,
            };
            match floors.last_mut() {
                Some(floor) if floor.level == room.floor => floor.rooms.push(summary),
                _ => floors.push(FloorView {
                    level: room.floor,
                    rooms: vec![summary],
                }),
            }
        }

        floors
    }

    /// Stay and AC charges for the current guest.
    pub fn bill(&self, room_id: &str) -> Result<BillSummary, ControlError> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| ControlError::UnknownRoom(room_id.to_string()))?;
        if room.is_free {
            return Err(ControlError::RoomNotOccupied(room_id.to_string()));
        }

        Ok(BillSummary {
            room_id: room.id.clone(),
            room_type: room.room_type.clone(),
            stay_days: room.stay_days,
            stay_fee: room.nightly_price * f64::from(room.stay_days),
            ac_fee: room.total_fee,
            ac_minutes: room.duration / 60,
        })
    }

    /// Dispatch statistics plus the persisted session log, the data behind
    /// the detailed AC bill export.
    pub async fn ac_detail(&self, room_id: &str) -> Result<AcDetail, ControlError> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| ControlError::UnknownRoom(room_id.to_string()))?;

        let sessions = match self.store.sessions_for_room(room_id).await {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(error = %e, room_id, "session log unavailable");
                Vec::new()
            }
        };

        Ok(AcDetail {
            room_id: room.id.clone(),
            total_fee: room.total_fee,
            dispatch_count: room.dispatch_count,
            speed_stats: room.speed_stats.clone(),
            sessions: sessions.into_iter().map(Into::into).collect(),
        })
    }

    /// Advance the plant by one simulated second.
    ///
    /// Order inside the step: age wait budgets, then per room in ascending
    /// id order auto-reactivate, release on target reached, integrate, and
    /// repair any scheduler membership a power-off left behind. The order
    /// guarantees a room reaching its target this tick accrues no further
    /// fee, and a newly idle room regains service no earlier than the next
    /// tick.
    pub fn step(&mut self) {
        self.clock += 1;
        let now = self.clock;

        let events = self.scheduler.tick(now);
        self.apply_events(events);

        let ids: Vec<String> = self.rooms.keys().cloned().collect();
        for id in ids {
            let wants_service = {
                let Some(room) = self.rooms.get(&id) else {
                    continue;
                };
                room.power_on
                    && !room.is_active
                    && !self.scheduler.is_waiting(&id)
                    && room.delta_from_target().abs() > REACTIVATE_DELTA
            };
            if wants_service {
                if let Some(speed) = self.rooms.get(&id).map(|r| r.fan_speed) {
                    let events = self.scheduler.request(&id, speed, now);
                    self.apply_events(events);
                }
            }

            let reached = self
                .rooms
                .get(&id)
                .is_some_and(|r| r.is_active && r.target_reached());
            if reached {
                let events = self.scheduler.release(&id, now);
                self.apply_events(events);
                if let Some(room) = self.rooms.get_mut(&id) {
                    room.is_active = false;
                }
                info!(room_id = %id, "target reached, slot released");
            }

            if let Some(room) = self.rooms.get_mut(&id) {
                room.tick();
            }

            let off_but_scheduled = self.rooms.get(&id).is_some_and(|r| !r.power_on)
                && (self.scheduler.is_serving(&id) || self.scheduler.is_waiting(&id));
            if off_but_scheduled {
                warn!(room_id = %id, "powered-off room still scheduled, repairing");
                let events = self.scheduler.release(&id, now);
                self.apply_events(events);
                if let Some(room) = self.rooms.get_mut(&id) {
                    room.is_active = false;
                }
            }
        }
    }

    /// Persist a snapshot for every room that has been used. Called on the
    /// periodic cadence and at teardown.
    pub async fn flush_snapshots(&self) {
        for room in self.rooms.values() {
            if room.power_on || room.total_fee > 0.0 {
                let snapshot = RoomStateRow::from(room);
                if let Err(e) = self.store.upsert_room_state(&snapshot).await {
                    warn!(error = %e, room_id = %snapshot.room_id, "room state snapshot not persisted");
                }
            }
        }
    }

    fn apply_events(&mut self, events: Vec<SchedulerEvent>) {
        for event in events {
            match event {
                SchedulerEvent::EnteredService { room_id } => {
                    if let Some(room) = self.rooms.get_mut(&room_id) {
                        room.is_active = true;
                    }
                    info!(room_id = %room_id, "room starts service");
                }
                SchedulerEvent::EnteredWait { room_id } => {
                    if let Some(room) = self.rooms.get_mut(&room_id) {
                        room.is_active = false;
                        room.dispatch_count += 1;
                    }
                    info!(room_id = %room_id, "room enters wait set");
                }
                SchedulerEvent::Released { room_id } => {
                    if let Some(room) = self.rooms.get_mut(&room_id) {
                        room.is_active = false;
                    }
                }
            }
        }
    }
}
