#![allow(dead_code)]

use model::{
    coordinator::CoordinatorRegistration,
    queue::{NewQueueEntry, QueueEntry, ServiceType},
    station::{NewStation, Station},
    user::Session,
    WithId,
};
use transport_queue::{client::Client, memory::MemoryDatabase, server::Server};
use utility::id::Id;

pub struct Fixture {
    pub client: Client<MemoryDatabase>,
    pub coordinator: Session,
    pub station: Id<Station>,
}

pub fn vehicle(number: &str) -> NewQueueEntry {
    NewQueueEntry {
        operator_name: format!("Operator {}", number),
        vehicle_number: number.to_owned(),
        route: "Gaborone - Tlokweng".to_owned(),
        destination: "Tlokweng".to_owned(),
        capacity: 15,
        service_type: ServiceType::Combi,
        contact_number: None,
        arrival_time: None,
        status: None,
        special_request: false,
    }
}

pub fn station(name: &str, capacity: u32) -> NewStation {
    NewStation {
        name: name.to_owned(),
        address: "Main Mall".to_owned(),
        city: "Gaborone".to_owned(),
        capacity,
        operating_hours: None,
    }
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_capacity(20).await
    }

    pub async fn with_capacity(capacity: u32) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let server = Server::new(MemoryDatabase::new());
        let client = server.client("test");
        let coordinator = Session::coordinator("coordinator-1");
        client
            .register_coordinator(&coordinator, CoordinatorRegistration::default())
            .await
            .unwrap();
        let station = client
            .register_station(&coordinator, station("Main Rank", capacity))
            .await
            .unwrap()
            .id;
        Self {
            client,
            coordinator,
            station,
        }
    }

    pub async fn add(&self, number: &str) -> WithId<QueueEntry> {
        self.client
            .enqueue(&self.coordinator, &self.station, vehicle(number))
            .await
            .unwrap()
    }

    pub async fn join(&self, driver: &Session, number: &str) -> WithId<QueueEntry> {
        self.client
            .join_queue(driver, &self.station, vehicle(number))
            .await
            .unwrap()
    }

    /// Vehicle numbers and positions of the waiting partition.
    pub async fn waiting(&self) -> Vec<(String, u32)> {
        self.client
            .snapshot(&self.coordinator, &self.station)
            .await
            .unwrap()
            .waiting
            .into_iter()
            .map(|entry| {
                (
                    entry.content.vehicle_number,
                    entry.content.position.unwrap_or_default(),
                )
            })
            .collect()
    }
}

pub fn positions(list: &[(&str, u32)]) -> Vec<(String, u32)> {
    list.iter()
        .map(|(number, position)| (number.to_string(), *position))
        .collect()
}
