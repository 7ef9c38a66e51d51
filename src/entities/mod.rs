pub mod activity;

pub use self::activity::{Activity, ActivityId, ListParameters, UpdatableActivity};
