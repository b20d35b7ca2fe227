// Attachment upload helper: validation, selection, drop-zone tracking and
// sequential batch upload with aggregated progress.
// Pure logic only; HTTP lives in files_client.

pub mod controller;
pub mod drop_zone;
pub mod format;
pub mod notify;
pub mod policy;
pub mod progress;
pub mod selection;
pub mod validator;

pub use controller::UploadController;
pub use notify::{NotificationSink, TracingSink};
pub use policy::PolicyPreset;
