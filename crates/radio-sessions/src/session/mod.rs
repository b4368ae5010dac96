mod captions;
mod delivery;
mod playlist;
mod radio_session;
mod settings;
mod signal;
mod status;

pub use captions::{format_duration, track_caption};
pub use delivery::*;
pub use radio_session::*;
pub use settings::*;

use crate::filter::TrackFilter;
use crate::provider::TrackProvider;
use crate::traits::Notifier;
use std::sync::Arc;

/// Collaborators shared by every session of a process.
#[derive(Clone)]
pub struct SessionDeps {
    pub provider: Arc<TrackProvider>,
    pub notifier: Arc<dyn Notifier>,
    pub filter: Arc<dyn TrackFilter>,
    pub settings: Arc<RadioSettings>,
}
