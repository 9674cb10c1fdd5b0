use chrono::{DateTime, Local, NaiveDate};
use itertools::Itertools;
use model::{
    coordinator::{CoordinatorProfile, CoordinatorRegistration},
    notification::{Notification, NotificationKind},
    queue::{
        normalize_vehicle_number, DriverQueueStatus, MoveDirection, NewQueueEntry,
        QueueEntry, QueueSnapshot, QueueStatus,
    },
    station::{NewStation, Station, StationPatch},
    stats::DailyStats,
    user::{Role, Session},
    WithId,
};
use utility::{id::Id, let_also::LetAlso};

use crate::{
    database::{
        CoordinatorRepo, Database, DatabaseError, DatabaseOperations, DatabaseTransaction,
        NotificationRepo, QueueRepo, StationRepo,
    },
    dispatch::{self, Action, Relation},
    not_found_to_none, queue, stats, RequestError, RequestResult,
};

/// How many notifications a driver gets to see.
pub const NOTIFICATION_LIMIT: u32 = 50;

/// Largest station or vehicle capacity. Capacities are stored as signed
/// 32 bit integers.
pub const MAX_CAPACITY: u32 = i32::MAX as u32;

/// Entry point for every queue operation. Each call receives the acting
/// [`Session`] and re-checks its authority against the database.
#[derive(Debug, Clone)]
pub struct Client<D>
where
    D: Database + Send + Sync + Sized + 'static,
{
    id: String,
    pub database: D,
}

impl<D> Client<D>
where
    D: Database,
{
    pub(crate) fn new<S>(id: S, database: D) -> Self
    where
        S: Into<String>,
    {
        Self {
            id: id.into(),
            database,
        }
    }

    pub fn name(&self) -> &str {
        &self.id
    }
}

async fn coordinator_profile<T: DatabaseOperations>(
    tx: &mut T,
    session: &Session,
) -> RequestResult<Option<WithId<CoordinatorProfile>>> {
    if !session.is_coordinator() {
        return Ok(None);
    }
    not_found_to_none(
        tx.coordinator_by_user(&session.user)
            .await
            .map_err(RequestError::from),
    )
}

async fn administers<T: DatabaseOperations>(
    tx: &mut T,
    session: &Session,
    station: &Id<Station>,
) -> RequestResult<bool> {
    Ok(coordinator_profile(tx, session)
        .await?
        .is_some_and(|profile| profile.content.administers(station)))
}

async fn require_coordinator_of<T: DatabaseOperations>(
    tx: &mut T,
    session: &Session,
    station: &Id<Station>,
) -> RequestResult<()> {
    if administers(tx, session, station).await? {
        Ok(())
    } else {
        Err(RequestError::unauthorized(
            "You are not a coordinator of this station.",
        ))
    }
}

fn entry_index(
    entries: &[WithId<QueueEntry>],
    id: &Id<QueueEntry>,
) -> RequestResult<usize> {
    entries
        .iter()
        .position(|entry| entry.id == *id)
        .ok_or_else(|| {
            RequestError::not_found("The queue entry does not exist at this station.")
        })
}

async fn write_back<T: DatabaseOperations>(
    tx: &mut T,
    entries: &[WithId<QueueEntry>],
    changed: &[usize],
) -> RequestResult<()> {
    for &index in changed.iter().unique() {
        tx.update_entry(&entries[index]).await?;
    }
    Ok(())
}

fn notification_text(kind: NotificationKind, entry: &QueueEntry, station: &Station) -> String {
    let vehicle = &entry.vehicle_number;
    let station = &station.name;
    match kind {
        NotificationKind::PositionChanged => format!(
            "Your vehicle {} is now number {} in the queue at {}.",
            vehicle,
            entry.position.unwrap_or_default(),
            station
        ),
        NotificationKind::LoadingStarted => {
            format!("Your vehicle {} can start loading at {}.", vehicle, station)
        }
        NotificationKind::Loaded => {
            format!("Your vehicle {} was marked loaded at {}.", vehicle, station)
        }
        NotificationKind::KnockedOff => format!(
            "Your vehicle {} was knocked off at {}: {}",
            vehicle,
            station,
            entry.knock_off_reason.as_deref().unwrap_or_default()
        ),
        NotificationKind::SpecialGranted => format!(
            "Special service was granted to your vehicle {} at {}.",
            vehicle, station
        ),
        NotificationKind::Removed => format!(
            "Your vehicle {} was removed from the queue at {}.",
            vehicle, station
        ),
    }
}

/// Tells the owner of `entry` about a change, unless the owner made it.
async fn notify<T: DatabaseOperations>(
    tx: &mut T,
    actor: &Session,
    entry: &WithId<QueueEntry>,
    kind: NotificationKind,
    station: &Station,
    now: DateTime<Local>,
) -> RequestResult<()> {
    let recipient = match &entry.content.owner {
        Some(owner) if *owner != actor.user => owner.clone(),
        _ => return Ok(()),
    };
    tx.push_notification(WithId::new(
        Id::generate(),
        Notification {
            recipient,
            station_id: Some(entry.content.station_id.clone()),
            entry_id: Some(entry.id.clone()),
            kind,
            message: notification_text(kind, &entry.content, station),
            created_at: now,
        },
    ))
    .await?;
    Ok(())
}

/// Notifies the owners of waiting entries whose position changed.
async fn notify_moved<T: DatabaseOperations>(
    tx: &mut T,
    actor: &Session,
    entries: &[WithId<QueueEntry>],
    changed: &[usize],
    station: &Station,
    now: DateTime<Local>,
) -> RequestResult<()> {
    for &index in changed.iter().unique() {
        let entry = &entries[index];
        if entry.content.status == QueueStatus::Waiting {
            notify(tx, actor, entry, NotificationKind::PositionChanged, station, now).await?;
        }
    }
    Ok(())
}

fn notification_kind(action: &Action) -> NotificationKind {
    match action {
        Action::StartLoading => NotificationKind::LoadingStarted,
        Action::MarkLoaded => NotificationKind::Loaded,
        Action::KnockOff { .. } => NotificationKind::KnockedOff,
        Action::RequestSpecial => NotificationKind::SpecialGranted,
    }
}

fn validate_station(name: Option<&str>, capacity: Option<u32>) -> RequestResult<()> {
    if name.is_some_and(|name| name.trim().is_empty()) {
        return Err(RequestError::invalid("A station needs a name."));
    }
    match capacity {
        Some(0) => Err(RequestError::invalid(
            "A station needs at least one waiting bay.",
        )),
        Some(capacity) if capacity > MAX_CAPACITY => Err(RequestError::invalid(format!(
            "A station can have at most {} waiting bays.",
            MAX_CAPACITY
        ))),
        _ => Ok(()),
    }
}

fn validate_new_entry(entry: &NewQueueEntry) -> RequestResult<()> {
    if normalize_vehicle_number(&entry.vehicle_number).is_empty() {
        return Err(RequestError::invalid("The vehicle number is missing."));
    }
    if entry.capacity == 0 {
        return Err(RequestError::invalid(
            "The vehicle capacity must be at least one.",
        ));
    }
    if entry.capacity > MAX_CAPACITY {
        return Err(RequestError::invalid(format!(
            "The vehicle capacity can be at most {}.",
            MAX_CAPACITY
        )));
    }
    match entry.status {
        None | Some(QueueStatus::Waiting) => Ok(()),
        Some(status) => Err(RequestError::invalid(format!(
            "New entries start out `waiting`, not `{}`.",
            status
        ))),
    }
}

// stations
impl<D> Client<D>
where
    D: Database,
{
    pub async fn register_station(
        &self,
        session: &Session,
        station: NewStation,
    ) -> RequestResult<WithId<Station>> {
        if !session.is_coordinator() {
            return Err(RequestError::unauthorized(
                "Only coordinators can register stations.",
            ));
        }
        validate_station(Some(&station.name), Some(station.capacity))?;

        let mut tx = self.database.transaction().await?;
        let mut profile = coordinator_profile(&mut tx, session).await?.ok_or_else(|| {
            RequestError::unauthorized("Register as a coordinator before adding stations.")
        })?;
        let station = tx
            .insert_station(WithId::new(
                Id::generate(),
                Station {
                    name: station.name.trim().to_owned(),
                    address: station.address,
                    city: station.city,
                    capacity: station.capacity,
                    operating_hours: station.operating_hours.unwrap_or_default(),
                    is_active: true,
                    created_at: Local::now(),
                },
            ))
            .await?;
        profile.content.stations.push(station.id.clone());
        tx.update_coordinator(&profile).await?;
        tx.commit().await?;

        log::info!(
            "{}: coordinator {} registered station {} ({})",
            self.id,
            session.user,
            station.content.name,
            station.id
        );
        Ok(station)
    }

    pub async fn update_station(
        &self,
        session: &Session,
        id: &Id<Station>,
        patch: StationPatch,
    ) -> RequestResult<WithId<Station>> {
        validate_station(patch.name.as_deref(), patch.capacity)?;

        let mut tx = self.database.transaction().await?;
        let mut station = tx.lock_station(id).await?;
        require_coordinator_of(&mut tx, session, id).await?;
        let entries = tx.get_station_entries(id).await?;

        if let Some(capacity) = patch.capacity {
            let waiting = queue::waiting_count(&entries);
            if (capacity as usize) < waiting {
                return Err(RequestError::invalid(format!(
                    "{} vehicles are waiting, the capacity can not be lowered to {}.",
                    waiting, capacity
                )));
            }
        }
        if patch.is_active == Some(false) && station.content.is_active {
            ensure_idle(&entries)?;
        }

        patch.apply(&mut station.content);
        let station = tx.update_station(station).await?;
        tx.commit().await?;
        log::info!("{}: station {} updated", self.id, station.id);
        Ok(station)
    }

    pub async fn deactivate_station(
        &self,
        session: &Session,
        id: &Id<Station>,
    ) -> RequestResult<WithId<Station>> {
        let mut tx = self.database.transaction().await?;
        let mut station = tx.lock_station(id).await?;
        require_coordinator_of(&mut tx, session, id).await?;
        if !station.content.is_active {
            return Ok(station);
        }
        ensure_idle(&tx.get_station_entries(id).await?)?;

        station.content.is_active = false;
        let station = tx.update_station(station).await?;
        tx.commit().await?;
        log::info!("{}: station {} deactivated", self.id, station.id);
        Ok(station)
    }

    pub async fn get_station(&self, id: &Id<Station>) -> RequestResult<WithId<Station>> {
        Ok(self.database.auto().get_station(id).await?)
    }

    /// Active stations. Coordinators also see deactivated ones.
    pub async fn get_stations(
        &self,
        session: Option<&Session>,
    ) -> RequestResult<Vec<WithId<Station>>> {
        let include_inactive = session.is_some_and(Session::is_coordinator);
        self.database
            .auto()
            .get_stations()
            .await?
            .into_iter()
            .filter(|station| include_inactive || station.content.is_active)
            .collect::<Vec<_>>()
            .let_owned(Ok)
    }
}

fn ensure_idle(entries: &[WithId<QueueEntry>]) -> RequestResult<()> {
    let active = entries
        .iter()
        .filter(|entry| entry.content.status.is_active())
        .count();
    if active > 0 {
        Err(RequestError::StationBusy { active })
    } else {
        Ok(())
    }
}

// coordinators
impl<D> Client<D>
where
    D: Database,
{
    pub async fn register_coordinator(
        &self,
        session: &Session,
        registration: CoordinatorRegistration,
    ) -> RequestResult<WithId<CoordinatorProfile>> {
        if session.role != Role::Coordinator {
            return Err(RequestError::unauthorized(
                "Only coordinator accounts can register as coordinators.",
            ));
        }
        let already = || RequestError::invalid("You are already registered as a coordinator.");

        let mut tx = self.database.transaction().await?;
        if coordinator_profile(&mut tx, session).await?.is_some() {
            return Err(already());
        }
        let profile = tx
            .insert_coordinator(WithId::new(
                Id::generate(),
                CoordinatorProfile {
                    user: session.user.clone(),
                    stations: vec![],
                    specializations: registration.specializations,
                    working_hours: registration.working_hours,
                    rating: 0.0,
                    experience: registration.experience,
                    created_at: Local::now(),
                },
            ))
            .await
            .map_err(|why| match why {
                DatabaseError::Conflict(_) => already(),
                other => other.into(),
            })?;
        tx.commit().await?;
        log::info!("{}: user {} registered as coordinator", self.id, session.user);
        Ok(profile)
    }

    pub async fn coordinator_profile(
        &self,
        session: &Session,
    ) -> RequestResult<WithId<CoordinatorProfile>> {
        coordinator_profile(&mut self.database.auto(), session)
            .await?
            .ok_or_else(|| RequestError::not_found("You have no coordinator profile."))
    }
}

// queue
impl<D> Client<D>
where
    D: Database,
{
    /// A coordinator adds a vehicle to the tail of one of their queues.
    pub async fn enqueue(
        &self,
        session: &Session,
        station_id: &Id<Station>,
        entry: NewQueueEntry,
    ) -> RequestResult<WithId<QueueEntry>> {
        self.insert_into_queue(session, station_id, entry, None)
            .await
    }

    /// A driver joins the tail of a queue with their own vehicle.
    pub async fn join_queue(
        &self,
        session: &Session,
        station_id: &Id<Station>,
        entry: NewQueueEntry,
    ) -> RequestResult<WithId<QueueEntry>> {
        if session.role != Role::Driver {
            return Err(RequestError::unauthorized("Only drivers can join a queue."));
        }
        self.insert_into_queue(session, station_id, entry, Some(session.user.clone()))
            .await
    }

    async fn insert_into_queue(
        &self,
        session: &Session,
        station_id: &Id<Station>,
        data: NewQueueEntry,
        owner: Option<Id<model::user::User>>,
    ) -> RequestResult<WithId<QueueEntry>> {
        validate_new_entry(&data)?;
        let now = Local::now();
        let vehicle_number = normalize_vehicle_number(&data.vehicle_number);

        let mut tx = self.database.transaction().await?;
        let station = tx.lock_station(station_id).await?;
        if owner.is_none() {
            require_coordinator_of(&mut tx, session, station_id).await?;
        }
        if !station.content.is_active {
            return Err(RequestError::StationInactive);
        }

        let entries = tx.get_station_entries(station_id).await?;
        if entries.iter().any(|entry| {
            entry.content.status.is_active() && entry.content.is_same_vehicle(&vehicle_number)
        }) {
            return Err(RequestError::DuplicateActiveEntry { vehicle_number });
        }
        if queue::waiting_count(&entries) >= station.content.capacity as usize {
            return Err(RequestError::StationFull {
                capacity: station.content.capacity,
            });
        }

        let entry = QueueEntry {
            station_id: station_id.clone(),
            owner,
            operator_name: data.operator_name,
            vehicle_number: vehicle_number.clone(),
            route: data.route,
            destination: data.destination,
            capacity: data.capacity,
            service_type: data.service_type,
            status: QueueStatus::Waiting,
            position: Some(queue::next_position(&entries)),
            arrival_time: data.arrival_time.unwrap_or(now),
            loading_start_time: None,
            loading_end_time: None,
            departure_time: None,
            knock_off_time: None,
            knock_off_reason: None,
            special_request: data.special_request,
            special_request_time: data.special_request.then_some(now),
            contact_number: data.contact_number,
            archived: false,
        };
        let entry = tx
            .insert_entry(WithId::new(Id::generate(), entry))
            .await
            .map_err(|why| match why {
                DatabaseError::Conflict(_) => RequestError::DuplicateActiveEntry {
                    vehicle_number: vehicle_number.clone(),
                },
                other => other.into(),
            })?;
        tx.commit().await?;

        log::info!(
            "{}: {} queued at station {} as number {}",
            self.id,
            entry.content.vehicle_number,
            station_id,
            entry.content.position.unwrap_or_default()
        );
        Ok(entry)
    }

    /// Swaps a waiting entry with its neighbour and returns the new waiting
    /// order.
    pub async fn reorder(
        &self,
        session: &Session,
        station_id: &Id<Station>,
        entry_id: &Id<QueueEntry>,
        direction: MoveDirection,
    ) -> RequestResult<Vec<WithId<QueueEntry>>> {
        let now = Local::now();
        let mut tx = self.database.transaction().await?;
        let station = tx.lock_station(station_id).await?;
        require_coordinator_of(&mut tx, session, station_id).await?;

        let mut entries = tx.get_station_entries(station_id).await?;
        let (moved, neighbour) = queue::swap(&mut entries, entry_id, direction)?;
        let changed = [moved, neighbour];
        write_back(&mut tx, &entries, &changed).await?;
        notify_moved(&mut tx, session, &entries, &changed, &station.content, now).await?;
        tx.commit().await?;

        log::debug!("{}: moved {} {:?}", self.id, entry_id, direction);
        Ok(queue::waiting(&entries).into_iter().cloned().collect())
    }

    /// Deletes a non-terminal entry and closes the gap it leaves. Allowed for
    /// the owning driver and the coordinators of the station.
    pub async fn remove(
        &self,
        session: &Session,
        station_id: &Id<Station>,
        entry_id: &Id<QueueEntry>,
    ) -> RequestResult<()> {
        let now = Local::now();
        let mut tx = self.database.transaction().await?;
        let station = tx.lock_station(station_id).await?;
        let mut entries = tx.get_station_entries(station_id).await?;
        let index = entry_index(&entries, entry_id)?;

        let owner = entries[index].content.is_owned_by(&session.user);
        if !owner && !administers(&mut tx, session, station_id).await? {
            return Err(RequestError::unauthorized(
                "You may only remove your own vehicle from the queue.",
            ));
        }
        let status = entries[index].content.status;
        if status.is_terminal() {
            return Err(RequestError::IllegalTransition {
                from: status,
                attempted: "removed".to_owned(),
            });
        }

        let removed = entries.remove(index);
        tx.delete_entry(&removed.id).await?;
        let changed = queue::close_gaps(&mut entries);
        write_back(&mut tx, &entries, &changed).await?;
        notify(
            &mut tx,
            session,
            &removed,
            NotificationKind::Removed,
            &station.content,
            now,
        )
        .await?;
        notify_moved(&mut tx, session, &entries, &changed, &station.content, now).await?;
        tx.commit().await?;

        log::info!(
            "{}: {} left the queue at station {}",
            self.id,
            removed.content.vehicle_number,
            station_id
        );
        Ok(())
    }

    /// Applies a dispatch action to an entry and keeps the positions of the
    /// remaining waiting entries dense.
    pub async fn transition(
        &self,
        session: &Session,
        station_id: &Id<Station>,
        entry_id: &Id<QueueEntry>,
        action: Action,
    ) -> RequestResult<WithId<QueueEntry>> {
        let now = Local::now();
        let mut tx = self.database.transaction().await?;
        let station = tx.lock_station(station_id).await?;
        let mut entries = tx.get_station_entries(station_id).await?;
        let index = entry_index(&entries, entry_id)?;

        let relation = Relation {
            coordinator: administers(&mut tx, session, station_id).await?,
            owner: entries[index].content.is_owned_by(&session.user),
        };
        let kind = notification_kind(&action);
        let name = action.name();
        dispatch::apply(&mut entries[index].content, action, relation, now)?;

        let mut changed = queue::close_gaps(&mut entries);
        changed.push(index);
        write_back(&mut tx, &entries, &changed).await?;
        notify(&mut tx, session, &entries[index], kind, &station.content, now).await?;
        changed.retain(|&other| other != index);
        notify_moved(&mut tx, session, &entries, &changed, &station.content, now).await?;
        tx.commit().await?;

        log::info!(
            "{}: {} {} at station {}, now {}",
            self.id,
            name,
            entries[index].content.vehicle_number,
            station_id,
            entries[index].content.status
        );
        Ok(entries.swap_remove(index))
    }

    pub async fn start_loading(
        &self,
        session: &Session,
        station_id: &Id<Station>,
        entry_id: &Id<QueueEntry>,
    ) -> RequestResult<WithId<QueueEntry>> {
        self.transition(session, station_id, entry_id, Action::StartLoading)
            .await
    }

    pub async fn mark_loaded(
        &self,
        session: &Session,
        station_id: &Id<Station>,
        entry_id: &Id<QueueEntry>,
    ) -> RequestResult<WithId<QueueEntry>> {
        self.transition(session, station_id, entry_id, Action::MarkLoaded)
            .await
    }

    pub async fn knock_off<S: Into<String>>(
        &self,
        session: &Session,
        station_id: &Id<Station>,
        entry_id: &Id<QueueEntry>,
        reason: S,
    ) -> RequestResult<WithId<QueueEntry>> {
        let action = Action::KnockOff {
            reason: reason.into(),
        };
        self.transition(session, station_id, entry_id, action).await
    }

    pub async fn request_special(
        &self,
        session: &Session,
        station_id: &Id<Station>,
        entry_id: &Id<QueueEntry>,
    ) -> RequestResult<WithId<QueueEntry>> {
        self.transition(session, station_id, entry_id, Action::RequestSpecial)
            .await
    }

    pub async fn snapshot(
        &self,
        session: &Session,
        station_id: &Id<Station>,
    ) -> RequestResult<QueueSnapshot> {
        let mut tx = self.database.transaction().await?;
        let station = tx.get_station(station_id).await?;
        require_coordinator_of(&mut tx, session, station_id).await?;
        let entries = tx.get_station_entries(station_id).await?;
        tx.commit().await?;
        Ok(queue::snapshot(station, entries, Local::now()))
    }

    /// The snapshot as one list: waiting, special, loading, completed.
    pub async fn station_queue(
        &self,
        session: &Session,
        station_id: &Id<Station>,
    ) -> RequestResult<Vec<WithId<QueueEntry>>> {
        Ok(self.snapshot(session, station_id).await?.into_entries())
    }

    pub async fn station_stats(
        &self,
        session: &Session,
        station_id: &Id<Station>,
        date: Option<NaiveDate>,
    ) -> RequestResult<DailyStats> {
        let date = date.unwrap_or_else(|| Local::now().date_naive());
        let mut tx = self.database.transaction().await?;
        tx.get_station(station_id).await?;
        require_coordinator_of(&mut tx, session, station_id).await?;
        let history = tx
            .get_station_history(station_id, &stats::day_range(date))
            .await?;
        tx.commit().await?;
        Ok(stats::daily_stats(date, &history))
    }

    /// Marks every entry which ended before `cutoff` as archived.
    pub async fn archive(&self, cutoff: DateTime<Local>) -> RequestResult<u64> {
        let archived = self.database.auto().archive_entries(cutoff).await?;
        if archived > 0 {
            log::info!("{}: archived {} queue entries", self.id, archived);
        }
        Ok(archived)
    }
}

// drivers
impl<D> Client<D>
where
    D: Database,
{
    /// The single active entry of a driver, optionally at a given station.
    async fn driver_entry(
        &self,
        session: &Session,
        station: Option<&Id<Station>>,
    ) -> RequestResult<WithId<QueueEntry>> {
        let mut active = self
            .database
            .auto()
            .get_owner_entries(&session.user)
            .await?
            .into_iter()
            .filter(|entry| entry.content.status.is_active())
            .filter(|entry| station.map_or(true, |station| entry.content.station_id == *station))
            .collect::<Vec<_>>();
        match active.len() {
            0 => Err(RequestError::not_found("You have no active queue entry.")),
            1 => Ok(active.remove(0)),
            _ => Err(RequestError::invalid(
                "You have several active queue entries, name the station.",
            )),
        }
    }

    pub async fn leave_queue(
        &self,
        session: &Session,
        station: Option<&Id<Station>>,
    ) -> RequestResult<()> {
        let entry = self.driver_entry(session, station).await?;
        self.remove(session, &entry.content.station_id, &entry.id)
            .await
    }

    pub async fn driver_request_special(
        &self,
        session: &Session,
        station: Option<&Id<Station>>,
    ) -> RequestResult<WithId<QueueEntry>> {
        let entry = self.driver_entry(session, station).await?;
        self.request_special(session, &entry.content.station_id, &entry.id)
            .await
    }

    pub async fn queue_status(
        &self,
        session: &Session,
    ) -> RequestResult<Vec<DriverQueueStatus>> {
        let now = Local::now();
        let mut auto = self.database.auto();
        let owned = auto.get_owner_entries(&session.user).await?;

        let mut statuses = vec![];
        for entry in owned
            .into_iter()
            .filter(|entry| entry.content.status.is_active())
        {
            let station = auto.get_station(&entry.content.station_id).await?;
            let station_entries = auto.get_station_entries(&station.id).await?;
            let waiting = queue::waiting(&station_entries);
            let vehicles_ahead = (entry.content.status == QueueStatus::Waiting).then(|| {
                waiting
                    .iter()
                    .take_while(|other| other.id != entry.id)
                    .count() as u32
            });
            statuses.push(DriverQueueStatus {
                station_name: station.content.name.clone(),
                station_open: station.content.is_open_at(&now),
                queue_length: waiting.len() as u32,
                vehicles_ahead,
                entry,
            });
        }
        Ok(statuses)
    }

    pub async fn today_stats(&self, session: &Session) -> RequestResult<DailyStats> {
        let today = Local::now().date_naive();
        let owned = self
            .database
            .auto()
            .get_owner_entries(&session.user)
            .await?;
        Ok(stats::daily_stats(today, &owned))
    }

    pub async fn notifications(
        &self,
        session: &Session,
    ) -> RequestResult<Vec<WithId<Notification>>> {
        Ok(self
            .database
            .auto()
            .get_notifications(&session.user, NOTIFICATION_LIMIT)
            .await?)
    }
}
