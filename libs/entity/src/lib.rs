pub mod event;

pub mod prelude {
    pub use crate::event::{
        Action as EventAction, Event as EventEntity, Timestamp,
    };
}
