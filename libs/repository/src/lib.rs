use event::EventRepository;

pub mod event;

#[derive(Clone, Debug, Default)]
pub struct Repository {
    pub event: EventRepository,
}

pub fn init_repository() -> Repository {
    Repository {
        event: EventRepository::new(),
    }
}
